//! Landmark data model
//!
//! Points live in percentage space (0-100 on both axes). The base
//! coordinates are fixed at generation time; only the current position
//! moves when a snapshot is perturbed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Anatomical region of a landmark
///
/// Declaration order is the order regions appear in a landmark set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Jaw,
    LeftEyebrow,
    RightEyebrow,
    LeftEye,
    RightEye,
    Nose,
    MouthOuter,
    MouthInner,
}

impl Region {
    /// All regions in declared order
    pub const ALL: [Region; 8] = [
        Region::Jaw,
        Region::LeftEyebrow,
        Region::RightEyebrow,
        Region::LeftEye,
        Region::RightEye,
        Region::Nose,
        Region::MouthOuter,
        Region::MouthInner,
    ];

    /// Coarse feature group used for legends and colors
    pub fn feature(self) -> Feature {
        match self {
            Region::Jaw => Feature::Jaw,
            Region::LeftEyebrow | Region::RightEyebrow => Feature::Eyebrow,
            Region::LeftEye | Region::RightEye => Feature::Eye,
            Region::Nose => Feature::Nose,
            Region::MouthOuter | Region::MouthInner => Feature::Mouth,
        }
    }
}

/// Feature group shared by left/right and inner/outer regions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Jaw,
    Eyebrow,
    Eye,
    Nose,
    Mouth,
}

/// A single synthetic landmark
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// Current horizontal position (percent)
    pub x: f64,
    /// Current vertical position (percent)
    pub y: f64,
    /// Reference horizontal position
    pub base_x: f64,
    /// Reference vertical position
    pub base_y: f64,
    pub region: Region,
}

impl LandmarkPoint {
    /// Point resting at its base position
    pub fn at_rest(x: f64, y: f64, region: Region) -> Self {
        Self {
            x,
            y,
            base_x: x,
            base_y: y,
            region,
        }
    }

    /// Copy of this point moved to `(x, y)`, base untouched
    pub fn displaced(&self, x: f64, y: f64) -> Self {
        Self { x, y, ..*self }
    }

    /// Largest per-axis distance from the base position
    pub fn displacement(&self) -> f64 {
        (self.x - self.base_x).abs().max((self.y - self.base_y).abs())
    }
}

/// Contiguous run of same-region points
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionRun {
    pub region: Region,
    pub start: usize,
    pub len: usize,
}

/// Immutable, ordered snapshot of landmark points
///
/// Snapshots share their storage when cloned. Producing a new position set
/// always allocates a new snapshot, so a holder of an older one never sees
/// it change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Arc<[LandmarkPoint]>,
}

impl LandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self {
            points: points.into(),
        }
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LandmarkPoint> {
        self.points.iter()
    }

    /// Whether two handles point at the very same snapshot
    pub fn same_snapshot(&self, other: &LandmarkSet) -> bool {
        Arc::ptr_eq(&self.points, &other.points)
    }

    /// Contiguous same-region runs, in order
    pub fn runs(&self) -> Vec<RegionRun> {
        let mut runs: Vec<RegionRun> = Vec::new();
        for (index, point) in self.points.iter().enumerate() {
            match runs.last_mut() {
                Some(run) if run.region == point.region => run.len += 1,
                _ => runs.push(RegionRun {
                    region: point.region,
                    start: index,
                    len: 1,
                }),
            }
        }
        runs
    }

    /// Number of points tagged with `region`
    pub fn region_count(&self, region: Region) -> usize {
        self.points.iter().filter(|p| p.region == region).count()
    }

    /// Index pairs of consecutive points that are visually connected
    pub fn connections(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.points
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0].region == pair[1].region)
            .map(|(index, _)| (index, index + 1))
    }

    /// The first `count` points, as shown during progressive reveal
    pub fn revealed(&self, count: usize) -> &[LandmarkPoint] {
        &self.points[..count.min(self.points.len())]
    }
}

impl FromIterator<LandmarkPoint> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = LandmarkPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a LandmarkSet {
    type Item = &'a LandmarkPoint;
    type IntoIter = std::slice::Iter<'a, LandmarkPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
