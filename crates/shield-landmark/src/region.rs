//! Region tables and the landmark generator
//!
//! A region table lists, in declared region order, how many points each
//! region contributes and along which curve. Generation is a pure function
//! of the table: the same table always yields a bit-identical set.

use std::f64::consts::PI;

use shield_core::{LandmarkPoint, LandmarkSet, Region, ShieldError, ShieldResult};

/// Parametric curve a region's points are sampled from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    /// Elliptic arc: `θ_i = start + sweep * i / (n - 1)`
    Arc {
        center: (f64, f64),
        radii: (f64, f64),
        start: f64,
        sweep: f64,
    },
    /// Straight run: `p_i = origin + i * step`
    Line { origin: (f64, f64), step: (f64, f64) },
    /// Row-major grid: `p_i = origin + (i % columns, i / columns) * spacing`
    Grid {
        origin: (f64, f64),
        columns: usize,
        spacing: (f64, f64),
    },
}

impl Curve {
    /// Lower arc (opening upwards) from `π` sweeping back to `0`
    pub fn lower_arc(center: (f64, f64), radii: (f64, f64)) -> Self {
        Curve::Arc {
            center,
            radii,
            start: PI,
            sweep: -PI,
        }
    }

    /// Upper arc from `π` to `2π`
    pub fn upper_arc(center: (f64, f64), radii: (f64, f64)) -> Self {
        Curve::Arc {
            center,
            radii,
            start: PI,
            sweep: PI,
        }
    }

    /// Closed ellipse; first and last samples coincide
    pub fn ellipse(center: (f64, f64), radii: (f64, f64)) -> Self {
        Curve::Arc {
            center,
            radii,
            start: 0.0,
            sweep: 2.0 * PI,
        }
    }

    /// Sample `index` out of `count` points
    pub fn sample(&self, index: usize, count: usize) -> (f64, f64) {
        match *self {
            Curve::Arc {
                center,
                radii,
                start,
                sweep,
            } => {
                let t = if count > 1 {
                    index as f64 / (count - 1) as f64
                } else {
                    0.0
                };
                let angle = start + sweep * t;
                (
                    center.0 + angle.cos() * radii.0,
                    center.1 + angle.sin() * radii.1,
                )
            }
            Curve::Line { origin, step } => (
                origin.0 + index as f64 * step.0,
                origin.1 + index as f64 * step.1,
            ),
            Curve::Grid {
                origin,
                columns,
                spacing,
            } => (
                origin.0 + (index % columns) as f64 * spacing.0,
                origin.1 + (index / columns) as f64 * spacing.1,
            ),
        }
    }

    fn parameters(&self) -> Vec<f64> {
        match *self {
            Curve::Arc {
                center,
                radii,
                start,
                sweep,
            } => vec![center.0, center.1, radii.0, radii.1, start, sweep],
            Curve::Line { origin, step } => vec![origin.0, origin.1, step.0, step.1],
            Curve::Grid {
                origin, spacing, ..
            } => vec![origin.0, origin.1, spacing.0, spacing.1],
        }
    }
}

/// One row of a region table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSpec {
    pub region: Region,
    pub count: usize,
    pub curve: Curve,
}

impl RegionSpec {
    pub fn new(region: Region, count: usize, curve: Curve) -> Self {
        Self {
            region,
            count,
            curve,
        }
    }
}

/// Validated region table
///
/// Several consecutive rows may share a region; their points then form
/// one connected run.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTable {
    specs: Vec<RegionSpec>,
}

impl RegionTable {
    /// Validate and build a table
    pub fn new(specs: Vec<RegionSpec>) -> ShieldResult<Self> {
        for (index, spec) in specs.iter().enumerate() {
            if let Some(previous) = index.checked_sub(1).map(|i| &specs[i]) {
                if spec.region < previous.region {
                    return Err(ShieldError::InvalidRegionTable(format!(
                        "row {index}: {:?} declared after {:?}",
                        spec.region, previous.region
                    )));
                }
            }
            if spec.curve.parameters().iter().any(|v| !v.is_finite()) {
                return Err(ShieldError::InvalidRegionTable(format!(
                    "row {index}: non-finite curve parameter for {:?}",
                    spec.region
                )));
            }
            if let Curve::Grid { columns: 0, .. } = spec.curve {
                return Err(ShieldError::InvalidRegionTable(format!(
                    "row {index}: grid with zero columns"
                )));
            }
        }
        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[RegionSpec] {
        &self.specs
    }

    /// Total number of points the table produces
    pub fn point_count(&self) -> usize {
        self.specs.iter().map(|s| s.count).sum()
    }

    /// Points the table assigns to `region`
    pub fn count_for(&self, region: Region) -> usize {
        self.specs
            .iter()
            .filter(|s| s.region == region)
            .map(|s| s.count)
            .sum()
    }

    pub fn generate(&self) -> LandmarkSet {
        generate(self)
    }
}

/// Generate the landmark set described by `table`
pub fn generate(table: &RegionTable) -> LandmarkSet {
    let mut points = Vec::with_capacity(table.point_count());
    for spec in &table.specs {
        for index in 0..spec.count {
            let (x, y) = spec.curve.sample(index, spec.count);
            points.push(LandmarkPoint::at_rest(x, y, spec.region));
        }
    }
    LandmarkSet::new(points)
}
