// Domain layer: core models and ports. No transport concerns live here.

pub mod model;
pub mod ports;
