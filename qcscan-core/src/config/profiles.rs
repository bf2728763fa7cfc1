//! Built-in threshold profiles, content filters and the known tag list.
//!
//! Values are on the 10-bit scale QCTools reports for broadcast-range video.

use super::FilterEntry;
use crate::processing::profile::Comparison;
use std::collections::BTreeMap;

/// Every metric tag a normalized video frame can carry.
pub const KNOWN_TAGS: &[&str] = &[
    "YMIN", "YLOW", "YAVG", "YHIGH", "YMAX",
    "UMIN", "ULOW", "UAVG", "UHIGH", "UMAX",
    "VMIN", "VLOW", "VAVG", "VHIGH", "VMAX",
    "SATMIN", "SATLOW", "SATAVG", "SATHIGH", "SATMAX",
    "HUEMED", "HUEAVG",
    "YDIF", "UDIF", "VDIF",
    "TOUT", "VREP", "BRNG",
    "mse.y", "mse.u", "mse.v", "mse_avg",
    "psnr.y", "psnr.u", "psnr.v", "psnr_avg",
];

#[must_use]
pub fn is_known_tag(tag: &str) -> bool {
    KNOWN_TAGS.contains(&tag)
}

fn profile(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(tag, value)| ((*tag).to_string(), *value)).collect()
}

fn filter(entries: &[(&str, f64, Comparison)]) -> BTreeMap<String, FilterEntry> {
    entries
        .iter()
        .map(|(tag, threshold, op)| {
            ((*tag).to_string(), FilterEntry { threshold: *threshold, op: *op })
        })
        .collect()
}

/// Profiles available without a configuration file.
pub fn builtin_profiles() -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut profiles = BTreeMap::new();
    profiles.insert(
        "default".to_string(),
        profile(&[
            ("YLOW", 64.0), ("YHIGH", 940.0),
            ("ULOW", 64.0), ("UHIGH", 960.0),
            ("VLOW", 64.0), ("VHIGH", 960.0),
            ("SATMAX", 181.02), ("TOUT", 0.009), ("VREP", 0.03),
        ]),
    );
    profiles.insert(
        "highTolerance".to_string(),
        profile(&[
            ("YLOW", 40.0), ("YMAX", 1000.0),
            ("UMIN", 40.0), ("UMAX", 1000.0),
            ("VMIN", 40.0), ("VMAX", 1000.0),
            ("SATMAX", 236.0), ("TOUT", 0.069), ("VREP", 0.03),
        ]),
    );
    profiles.insert(
        "midTolerance".to_string(),
        profile(&[
            ("YLOW", 50.0), ("YMAX", 980.0),
            ("UMIN", 50.0), ("UMAX", 980.0),
            ("VMIN", 50.0), ("VMAX", 980.0),
            ("SATMAX", 213.0), ("TOUT", 0.039), ("VREP", 0.03),
        ]),
    );
    profiles.insert(
        "lowTolerance".to_string(),
        profile(&[
            ("YLOW", 64.0), ("YMAX", 940.0),
            ("UMIN", 64.0), ("UMAX", 960.0),
            ("VMIN", 64.0), ("VMAX", 960.0),
            ("SATMAX", 181.02), ("TOUT", 0.005), ("VREP", 0.03),
        ]),
    );
    profiles
}

/// Content filters available without a configuration file.
pub fn builtin_content_filters() -> BTreeMap<String, BTreeMap<String, FilterEntry>> {
    let mut filters = BTreeMap::new();
    filters.insert(
        "allBlack".to_string(),
        filter(&[
            ("YMAX", 300.0, Comparison::Below),
            ("YHIGH", 115.0, Comparison::Below),
            ("YLOW", 97.0, Comparison::Below),
            ("YMIN", 6.5, Comparison::Below),
        ]),
    );
    filters.insert(
        "static".to_string(),
        filter(&[
            ("YDIF", 2.0, Comparison::Below),
            ("UDIF", 1.0, Comparison::Below),
            ("VDIF", 1.0, Comparison::Below),
        ]),
    );
    filters
}
