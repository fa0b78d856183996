//! Desired-hour strategy: a clock, the offset resolver, and a global override

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::hour::Hour;
use crate::offset::OffsetResolver;
use crate::region::Region;

/// Source of the current UTC instant
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Jump to a new instant
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }

    /// Move forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Decides which hour every group should currently be hearing
///
/// The desired hour is the test override when one is set, otherwise the local
/// hour of the group's region according to the injected clock.
pub struct HourSchedule {
    clock: Arc<dyn Clock>,
    resolver: OffsetResolver,
    override_hour: RwLock<Option<Hour>>,
}

impl HourSchedule {
    /// Schedule driven by `clock` and the built-in zone table
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_resolver(clock, OffsetResolver::new())
    }

    /// Schedule driven by the system clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    pub fn with_resolver(clock: Arc<dyn Clock>, resolver: OffsetResolver) -> Self {
        Self {
            clock,
            resolver,
            override_hour: RwLock::new(None),
        }
    }

    /// The hour a group in `region` should be playing right now
    pub fn desired_hour(&self, region: Region) -> Hour {
        match *self.override_hour.read() {
            Some(hour) => hour,
            None => self.local_hour(region),
        }
    }

    /// Same as [`desired_hour`](Self::desired_hour) for a raw region label
    pub fn desired_hour_for_label(&self, region: &str) -> Result<Hour> {
        Ok(self.desired_hour(region.parse()?))
    }

    /// Real local hour in `region`, ignoring any override
    pub fn local_hour(&self, region: Region) -> Hour {
        self.resolver.local_hour(region, self.clock.now())
    }

    /// Set or clear the override, returning the previous value
    pub fn set_override(&self, hour: Option<Hour>) -> Option<Hour> {
        let previous = std::mem::replace(&mut *self.override_hour.write(), hour);
        match hour {
            Some(hour) => tracing::info!("Test hour override set to {} (was {:?})", hour, previous),
            None => tracing::info!("Test hour override cleared (was {:?})", previous),
        }
        previous
    }

    pub fn override_hour(&self) -> Option<Hour> {
        *self.override_hour.read()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn resolver(&self) -> &OffsetResolver {
        &self.resolver
    }
}

impl fmt::Debug for HourSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HourSchedule")
            .field("clock", &self.clock)
            .field("override_hour", &self.override_hour())
            .finish()
    }
}
