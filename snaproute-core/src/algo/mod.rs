pub mod isocurve;

pub use isocurve::{
    Isocurve, IsocurveResponse, bulk_isocurves, calculate_isocurve, reachable_geometry,
};
