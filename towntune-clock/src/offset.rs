//! Region to UTC offset resolution

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use crate::dst::{zone_for_offset, CanonicalZone, CANONICAL_ZONES};
use crate::error::Result;
use crate::hour::Hour;
use crate::region::Region;

/// Full breakdown of how a region's offset was derived
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOffset {
    pub region: Region,
    pub base_offset: i32,
    /// Zone consulted for DST, `None` when no zone shares the base offset
    pub zone: Option<&'static str>,
    pub dst_active: bool,
    pub offset: i32,
}

/// Maps regions to their current UTC offset, daylight-saving included
#[derive(Debug, Clone, Copy)]
pub struct OffsetResolver {
    zones: &'static [CanonicalZone],
}

impl Default for OffsetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl OffsetResolver {
    /// Resolver backed by the built-in canonical zone table
    pub fn new() -> Self {
        Self {
            zones: CANONICAL_ZONES,
        }
    }

    /// Resolver backed by a custom zone table
    pub fn with_zones(zones: &'static [CanonicalZone]) -> Self {
        Self { zones }
    }

    /// Resolve a region label such as `us-east`
    pub fn offset_for_region(&self, region: &str, now: DateTime<Utc>) -> Result<i32> {
        let region: Region = region.parse()?;
        Ok(self.offset_for(region, now))
    }

    /// Current offset in hours for a known region
    pub fn offset_for(&self, region: Region, now: DateTime<Utc>) -> i32 {
        self.resolve(region, now).offset
    }

    /// Local hour in `region` at the UTC instant `now`
    pub fn local_hour(&self, region: Region, now: DateTime<Utc>) -> Hour {
        let offset = self.offset_for(region, now);
        Hour::wrapping(i64::from(now.hour()) + i64::from(offset))
    }

    /// Offset along with the zone and DST decision that produced it
    pub fn resolve(&self, region: Region, now: DateTime<Utc>) -> ResolvedOffset {
        let base_offset = region.base_offset();
        let zone = zone_for_offset(self.zones, base_offset);
        let dst_active = zone
            .map(|zone| zone.rule.is_active(now, zone.base_offset))
            .unwrap_or(false);

        ResolvedOffset {
            region,
            base_offset,
            zone: zone.map(|zone| zone.name),
            dst_active,
            offset: base_offset + i32::from(dst_active),
        }
    }
}
