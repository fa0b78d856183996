//! Daylight-saving rules and the canonical zone table
//!
//! Regions only carry a base offset, so DST is inferred from a representative
//! zone that shares that offset. The zone list is explicit and ordered; the
//! first match for an offset wins.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Utc, Weekday};
use serde::Serialize;

/// Version of the canonical zone table below. Bump when an entry changes.
pub const ZONE_TABLE_VERSION: u32 = 1;

/// When a zone observes daylight-saving time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DstRule {
    /// No daylight-saving time
    None,
    /// Second Sunday of March 02:00 local until first Sunday of November 02:00 local
    NorthAmerica,
    /// Last Sunday of March 01:00 UTC until last Sunday of October 01:00 UTC
    EuropeanUnion,
    /// First Sunday of October 02:00 local until first Sunday of April 03:00 local
    SouthEastAustralia,
}

impl DstRule {
    /// Whether the rule has daylight-saving in effect at `now`
    ///
    /// `base_offset` is the zone's standard offset in hours, needed to place
    /// rules that switch at a local wall-clock time. Returns `false` when a
    /// transition date cannot be built.
    pub fn is_active(&self, now: DateTime<Utc>, base_offset: i32) -> bool {
        let active = match self {
            DstRule::None => Some(false),
            DstRule::NorthAmerica => north_america(now, base_offset),
            DstRule::EuropeanUnion => european_union(now),
            DstRule::SouthEastAustralia => south_east_australia(now, base_offset),
        };
        active.unwrap_or(false)
    }
}

/// A named timezone standing in for every region with the same base offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanonicalZone {
    pub name: &'static str,
    pub base_offset: i32,
    pub rule: DstRule,
}

/// Canonical zones ordered by base offset
pub const CANONICAL_ZONES: &[CanonicalZone] = &[
    CanonicalZone { name: "America/Los_Angeles", base_offset: -8, rule: DstRule::NorthAmerica },
    CanonicalZone { name: "America/Chicago", base_offset: -6, rule: DstRule::NorthAmerica },
    CanonicalZone { name: "America/New_York", base_offset: -5, rule: DstRule::NorthAmerica },
    CanonicalZone { name: "America/Sao_Paulo", base_offset: -3, rule: DstRule::None },
    CanonicalZone { name: "Europe/London", base_offset: 0, rule: DstRule::EuropeanUnion },
    CanonicalZone { name: "Europe/Paris", base_offset: 1, rule: DstRule::EuropeanUnion },
    CanonicalZone { name: "Europe/Helsinki", base_offset: 2, rule: DstRule::EuropeanUnion },
    CanonicalZone { name: "Asia/Singapore", base_offset: 8, rule: DstRule::None },
    CanonicalZone { name: "Australia/Sydney", base_offset: 10, rule: DstRule::SouthEastAustralia },
];

/// First zone in `zones` sharing `base_offset`, if any
pub fn zone_for_offset(
    zones: &'static [CanonicalZone],
    base_offset: i32,
) -> Option<&'static CanonicalZone> {
    zones.iter().find(|zone| zone.base_offset == base_offset)
}

/// First built-in canonical zone sharing `base_offset`, if any
pub fn representative_zone(base_offset: i32) -> Option<&'static CanonicalZone> {
    zone_for_offset(CANONICAL_ZONES, base_offset)
}

fn north_america(now: DateTime<Utc>, base_offset: i32) -> Option<bool> {
    let start = wall_clock_to_utc(nth_sunday(now.year(), 3, 2)?, 2, base_offset)?;
    let end = wall_clock_to_utc(nth_sunday(now.year(), 11, 1)?, 2, base_offset + 1)?;
    Some(start <= now && now < end)
}

fn european_union(now: DateTime<Utc>) -> Option<bool> {
    let start = wall_clock_to_utc(last_sunday(now.year(), 3)?, 1, 0)?;
    let end = wall_clock_to_utc(last_sunday(now.year(), 10)?, 1, 0)?;
    Some(start <= now && now < end)
}

// Southern hemisphere: the DST window wraps the new year.
fn south_east_australia(now: DateTime<Utc>, base_offset: i32) -> Option<bool> {
    let end = wall_clock_to_utc(nth_sunday(now.year(), 4, 1)?, 3, base_offset + 1)?;
    let start = wall_clock_to_utc(nth_sunday(now.year(), 10, 1)?, 2, base_offset)?;
    Some(now < end || start <= now)
}

fn nth_sunday(year: i32, month: u32, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, n)
}

fn last_sunday(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = first_of_next.pred_opt()?;
    let back = last.weekday().num_days_from_sunday();
    last.checked_sub_days(Days::new(u64::from(back)))
}

/// UTC instant of `hour:00` on `date` in a zone `offset` hours ahead of UTC
fn wall_clock_to_utc(date: NaiveDate, hour: u32, offset: i32) -> Option<DateTime<Utc>> {
    let local = date.and_hms_opt(hour, 0, 0)?;
    let utc = local.checked_sub_signed(Duration::hours(i64::from(offset)))?;
    Some(Utc.from_utc_datetime(&utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_last_sunday() {
        assert_eq!(last_sunday(2024, 3), NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(last_sunday(2024, 10), NaiveDate::from_ymd_opt(2024, 10, 27));
        assert_eq!(last_sunday(2023, 12), NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[rstest]
    // 2024: starts 10 March 07:00 UTC, ends 3 November 06:00 UTC for UTC-5
    #[case("2024-03-10T06:59:59Z", false)]
    #[case("2024-03-10T07:00:00Z", true)]
    #[case("2024-07-04T12:00:00Z", true)]
    #[case("2024-11-03T05:59:59Z", true)]
    #[case("2024-11-03T06:00:00Z", false)]
    #[case("2024-12-25T12:00:00Z", false)]
    fn test_north_america_eastern(#[case] at: &str, #[case] expected: bool) {
        assert_eq!(DstRule::NorthAmerica.is_active(utc(at), -5), expected);
    }

    #[rstest]
    // 2024: 31 March 01:00 UTC until 27 October 01:00 UTC
    #[case("2024-03-31T00:59:59Z", false)]
    #[case("2024-03-31T01:00:00Z", true)]
    #[case("2024-10-27T00:59:59Z", true)]
    #[case("2024-10-27T01:00:00Z", false)]
    fn test_european_union(#[case] at: &str, #[case] expected: bool) {
        assert_eq!(DstRule::EuropeanUnion.is_active(utc(at), 1), expected);
    }

    #[rstest]
    // 2024: ends 7 April 03:00 AEDT (6 April 16:00 UTC), starts 6 October 02:00 AEST (5 October 16:00 UTC)
    #[case("2024-01-15T00:00:00Z", true)]
    #[case("2024-04-06T15:59:59Z", true)]
    #[case("2024-04-06T16:00:00Z", false)]
    #[case("2024-07-01T00:00:00Z", false)]
    #[case("2024-10-05T15:59:59Z", false)]
    #[case("2024-10-05T16:00:00Z", true)]
    #[case("2024-12-31T23:00:00Z", true)]
    fn test_south_east_australia(#[case] at: &str, #[case] expected: bool) {
        assert_eq!(DstRule::SouthEastAustralia.is_active(utc(at), 10), expected);
    }

    #[test]
    fn test_no_rule_is_never_active() {
        assert!(!DstRule::None.is_active(utc("2024-07-01T00:00:00Z"), 8));
        assert!(!DstRule::None.is_active(utc("2024-01-01T00:00:00Z"), -3));
    }

    #[test]
    fn test_representative_zone_is_first_match() {
        assert_eq!(representative_zone(-5).unwrap().name, "America/New_York");
        assert_eq!(representative_zone(10).unwrap().name, "Australia/Sydney");
        assert!(representative_zone(5).is_none());
    }

    #[test]
    fn test_canonical_zones_are_ordered_by_offset() {
        assert!(CANONICAL_ZONES
            .windows(2)
            .all(|pair| pair[0].base_offset <= pair[1].base_offset));
    }
}
