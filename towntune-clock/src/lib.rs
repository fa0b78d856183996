//! # towntune-clock
//!
//! Works out which hour a chat group should be hearing.
//!
//! Groups only report a coarse voice region (`us-east`, `sydney`, ...). Each
//! region has a base UTC offset; daylight-saving time is inferred from a
//! canonical zone sharing that offset. [`HourSchedule`] combines that with an
//! injectable [`Clock`] and an optional process-wide test override.
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use towntune_clock::{FixedClock, HourSchedule, Region};
//!
//! let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 19, 0, 0).unwrap()));
//! let schedule = HourSchedule::new(clock);
//! assert_eq!(schedule.desired_hour(Region::UsEast).get(), 14);
//! ```

pub mod dst;
pub mod error;
pub mod hour;
pub mod offset;
pub mod region;
pub mod schedule;

pub use dst::{
    representative_zone, zone_for_offset, CanonicalZone, DstRule, CANONICAL_ZONES,
    ZONE_TABLE_VERSION,
};
pub use error::{ClockError, Result};
pub use hour::Hour;
pub use offset::{OffsetResolver, ResolvedOffset};
pub use region::{Region, REGION_TABLE_VERSION};
pub use schedule::{Clock, FixedClock, HourSchedule, SystemClock};
