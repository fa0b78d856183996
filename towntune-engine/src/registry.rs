//! Group registration with lookup-or-create semantics
//!
//! The registry is the only state shared between command handling and the
//! reconciler. The map itself sits behind a short-lived lock that is never
//! held across an await; each entry carries its own async mutex so a slow
//! backend call on one group never blocks access to another.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use towntune_clock::Region;

use crate::model::{GroupId, PlaybackState, SharedPlaybackState};

/// Thread-safe map from group to its playback state
#[derive(Clone, Default)]
pub struct GroupRegistry {
    groups: Arc<RwLock<HashMap<GroupId, SharedPlaybackState>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the group's state, creating an empty one on first use
    ///
    /// Idempotent: every call for the same group returns the same shared
    /// instance until the group is removed. `region` is only used when the
    /// entry is created.
    pub fn get_or_create(&self, group_id: &GroupId, region: Region) -> SharedPlaybackState {
        // Fast path under the read lock
        if let Some(existing) = self.groups.read().get(group_id) {
            return Arc::clone(existing);
        }

        let mut groups = self.groups.write();
        let state = groups.entry(group_id.clone()).or_insert_with(|| {
            tracing::debug!("Registering group {} ({})", group_id, region);
            Arc::new(Mutex::new(PlaybackState::new(group_id.clone(), region)))
        });
        Arc::clone(state)
    }

    pub fn get(&self, group_id: &GroupId) -> Option<SharedPlaybackState> {
        self.groups.read().get(group_id).cloned()
    }

    pub fn contains(&self, group_id: &GroupId) -> bool {
        self.groups.read().contains_key(group_id)
    }

    /// Remove a group, returning its state if it was registered
    pub fn remove(&self, group_id: &GroupId) -> Option<SharedPlaybackState> {
        let removed = self.groups.write().remove(group_id);
        if removed.is_some() {
            tracing::debug!("Unregistered group {}", group_id);
        }
        removed
    }

    /// Remove the group only if it still maps to `state`
    ///
    /// Returns `false` when the group is absent or has been re-registered
    /// with a different instance.
    pub fn remove_entry(&self, group_id: &GroupId, state: &SharedPlaybackState) -> bool {
        let mut groups = self.groups.write();
        match groups.get(group_id) {
            Some(current) if Arc::ptr_eq(current, state) => {
                groups.remove(group_id);
                tracing::debug!("Unregistered group {}", group_id);
                true
            }
            _ => false,
        }
    }

    /// Point-in-time copy of every entry
    pub fn snapshot(&self) -> Vec<(GroupId, SharedPlaybackState)> {
        self.groups
            .read()
            .iter()
            .map(|(id, state)| (id.clone(), Arc::clone(state)))
            .collect()
    }

    /// Visit every entry of a snapshot; the map is not locked while visiting
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&GroupId, &SharedPlaybackState),
    {
        for (group_id, state) in self.snapshot() {
            visitor(&group_id, &state);
        }
    }

    /// Registered group IDs in sorted order
    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

impl std::fmt::Debug for GroupRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupRegistry")
            .field("groups", &self.group_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let registry = GroupRegistry::new();
        let group = GroupId::new("g1");

        let first = registry.get_or_create(&group, Region::UsEast);
        let second = registry.get_or_create(&group, Region::Sydney);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_region_is_set_on_creation_only() {
        let registry = GroupRegistry::new();
        let group = GroupId::new("g1");

        registry.get_or_create(&group, Region::UsEast);
        let state = registry.get_or_create(&group, Region::Sydney);
        assert_eq!(state.lock().await.region(), Region::UsEast);
    }

    #[test]
    fn test_remove() {
        let registry = GroupRegistry::new();
        let group = GroupId::new("g1");

        assert!(registry.remove(&group).is_none());

        registry.get_or_create(&group, Region::UsEast);
        assert!(registry.contains(&group));
        assert!(registry.remove(&group).is_some());
        assert!(!registry.contains(&group));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_recreate_after_remove_gives_fresh_state() {
        let registry = GroupRegistry::new();
        let group = GroupId::new("g1");

        let before = registry.get_or_create(&group, Region::UsEast);
        registry.remove(&group);
        let after = registry.get_or_create(&group, Region::UsEast);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_remove_entry_only_removes_same_instance() {
        let registry = GroupRegistry::new();
        let group = GroupId::new("g1");

        let stale = registry.get_or_create(&group, Region::UsEast);
        registry.remove(&group);
        let fresh = registry.get_or_create(&group, Region::UsEast);

        assert!(!registry.remove_entry(&group, &stale));
        assert!(registry.contains(&group));
        assert!(registry.remove_entry(&group, &fresh));
        assert!(registry.is_empty());
        assert!(!registry.remove_entry(&group, &fresh));
    }

    #[test]
    fn test_snapshot_and_for_each() {
        let registry = GroupRegistry::new();
        for id in ["b", "a", "c"] {
            registry.get_or_create(&GroupId::new(id), Region::EuWest);
        }

        assert_eq!(registry.snapshot().len(), 3);
        assert_eq!(
            registry.group_ids(),
            vec![GroupId::new("a"), GroupId::new("b"), GroupId::new("c")]
        );

        let mut visited = Vec::new();
        registry.for_each(|id, _| visited.push(id.clone()));
        visited.sort();
        assert_eq!(visited.len(), 3);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_removal() {
        let registry = GroupRegistry::new();
        registry.get_or_create(&GroupId::new("g1"), Region::EuWest);

        let snapshot = registry.snapshot();
        registry.remove(&GroupId::new("g1"));
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create() {
        let registry = GroupRegistry::new();
        let group = GroupId::new("g1");

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let registry = registry.clone();
                let group = group.clone();
                tokio::spawn(async move { registry.get_or_create(&group, Region::UsEast) })
            })
            .collect();

        let states: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for state in &states {
            assert!(Arc::ptr_eq(state, &states[0]));
        }
        assert_eq!(registry.len(), 1);
    }
}
