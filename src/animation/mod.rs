//! Frame-domain animation primitives: clamped ramps and damped springs.

pub mod ease;
pub mod spring;
