//! Face layouts - the two fixed region tables of the demonstration
//!
//! This is NOT facial recognition data. Both layouts are synthetic
//! 68-point faces in percentage space: the calibration layout follows the
//! classic 68-point grouping, the obfuscation layout trades mouth and nose
//! detail for denser eyes.

use shield_core::Region;

use crate::{Curve, RegionSpec, RegionTable};

/// Points in either face layout
pub const FACE_POINT_COUNT: usize = 68;

fn line(origin: (f64, f64), step: (f64, f64)) -> Curve {
    Curve::Line { origin, step }
}

fn build(specs: Vec<RegionSpec>) -> RegionTable {
    match RegionTable::new(specs) {
        Ok(table) => table,
        // Both layouts are constants in declared order.
        Err(err) => unreachable!("built-in face layout rejected: {err}"),
    }
}

/// Layout used while calibrating
pub fn calibration_table() -> RegionTable {
    build(vec![
        RegionSpec::new(Region::Jaw, 17, Curve::lower_arc((50.0, 25.0), (35.0, 45.0))),
        RegionSpec::new(Region::LeftEyebrow, 5, line((30.0, 32.0), (3.0, 0.0))),
        RegionSpec::new(Region::RightEyebrow, 5, line((58.0, 32.0), (3.0, 0.0))),
        RegionSpec::new(Region::LeftEye, 6, Curve::ellipse((35.0, 40.0), (4.0, 2.0))),
        RegionSpec::new(Region::RightEye, 6, Curve::ellipse((65.0, 40.0), (4.0, 2.0))),
        // Bridge, then base
        RegionSpec::new(Region::Nose, 4, line((50.0, 42.0), (0.0, 4.0))),
        RegionSpec::new(Region::Nose, 5, line((44.0, 54.0), (3.0, 0.0))),
        RegionSpec::new(Region::MouthOuter, 12, Curve::upper_arc((50.0, 62.0), (12.0, 6.0))),
        RegionSpec::new(Region::MouthInner, 8, Curve::upper_arc((50.0, 62.0), (10.0, 4.0))),
    ])
}

/// Layout perturbed by the obfuscation stage
pub fn obfuscation_table() -> RegionTable {
    build(vec![
        RegionSpec::new(Region::Jaw, 17, Curve::lower_arc((50.0, 30.0), (30.0, 38.0))),
        RegionSpec::new(Region::LeftEyebrow, 5, line((30.0, 35.0), (4.0, 0.0))),
        RegionSpec::new(Region::RightEyebrow, 5, line((50.0, 35.0), (4.0, 0.0))),
        RegionSpec::new(Region::LeftEye, 12, Curve::ellipse((35.0, 42.0), (4.0, 2.0))),
        RegionSpec::new(Region::RightEye, 12, Curve::ellipse((65.0, 42.0), (4.0, 2.0))),
        RegionSpec::new(
            Region::Nose,
            9,
            Curve::Grid {
                origin: (48.0, 48.0),
                columns: 3,
                spacing: (2.0, 3.0),
            },
        ),
        RegionSpec::new(Region::MouthOuter, 8, Curve::upper_arc((50.0, 65.0), (10.0, 5.0))),
    ])
}
