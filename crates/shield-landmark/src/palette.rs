//! Region attribute table consumed by renderers
//!
//! The engine never looks at colors; this table is the single place a
//! renderer maps landmark regions to their on-screen attributes.

use shield_core::{Feature, Region};

/// Display attributes of a feature group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionStyle {
    pub feature: Feature,
    /// Hex color, `#rrggbb`
    pub color: &'static str,
    pub label: &'static str,
}

/// Legend in display order
pub const LEGEND: [RegionStyle; 5] = [
    RegionStyle {
        feature: Feature::Jaw,
        color: "#22c55e",
        label: "Jaw",
    },
    RegionStyle {
        feature: Feature::Eyebrow,
        color: "#3b82f6",
        label: "Eyebrow",
    },
    RegionStyle {
        feature: Feature::Eye,
        color: "#a855f7",
        label: "Eye",
    },
    RegionStyle {
        feature: Feature::Nose,
        color: "#f59e0b",
        label: "Nose",
    },
    RegionStyle {
        feature: Feature::Mouth,
        color: "#ec4899",
        label: "Mouth",
    },
];

/// Style for a region
pub fn style_for(region: Region) -> RegionStyle {
    let feature = region.feature();
    LEGEND
        .into_iter()
        .find(|style| style.feature == feature)
        .unwrap_or(LEGEND[0])
}

/// Hue (degrees) of point `index` in the shielded view
///
/// Points are spread evenly around the color wheel once the defense is
/// active.
pub fn obfuscation_hue(index: usize, len: usize) -> f64 {
    if len == 0 {
        return 0.0;
    }
    (index as f64 * 360.0 / len as f64) % 360.0
}
