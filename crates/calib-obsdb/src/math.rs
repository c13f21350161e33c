use nalgebra::{Point2, Point3};

pub type Real = f64;

pub type Pt2 = Point2<Real>;
pub type Pt3 = Point3<Real>;

/// Identifier of one camera (or other sensor) in the rig.
pub type CameraId = usize;
