//! Region table rendering for `towntune regions` and `towntune hour`

use chrono::{DateTime, Utc};
use serde::Serialize;
use towntune_clock::{OffsetResolver, Region};

/// One line of the region table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionRow {
    pub region: Region,
    pub base_offset: i32,
    pub zone: Option<&'static str>,
    pub dst_active: bool,
    pub offset: i32,
    pub local_hour: u8,
    pub label: String,
}

impl RegionRow {
    pub fn resolve(resolver: &OffsetResolver, region: Region, now: DateTime<Utc>) -> Self {
        let resolved = resolver.resolve(region, now);
        let hour = resolver.local_hour(region, now);
        Self {
            region,
            base_offset: resolved.base_offset,
            zone: resolved.zone,
            dst_active: resolved.dst_active,
            offset: resolved.offset,
            local_hour: hour.get(),
            label: hour.twelve_hour_label(),
        }
    }
}

/// Every known region, in table order
pub fn rows(now: DateTime<Utc>) -> Vec<RegionRow> {
    let resolver = OffsetResolver::new();
    Region::ALL
        .iter()
        .map(|region| RegionRow::resolve(&resolver, *region, now))
        .collect()
}

pub fn format_offset(offset: i32) -> String {
    format!("UTC{:+}", offset)
}

/// Plain-text table, one region per line
pub fn render_table(rows: &[RegionRow]) -> String {
    let mut out = format!(
        "{:<14} {:<7} {:<20} {:<4} {:<7} {}\n",
        "REGION", "BASE", "ZONE", "DST", "OFFSET", "HOUR"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<14} {:<7} {:<20} {:<4} {:<7} {}\n",
            row.region.label(),
            format_offset(row.base_offset),
            row.zone.unwrap_or("-"),
            if row.dst_active { "yes" } else { "no" },
            format_offset(row.offset),
            row.label
        ));
    }
    out
}
