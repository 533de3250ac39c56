// src/render/mod.rs
pub mod builders;

pub use builders::{AeegSeriesBuilder, AeegSeriesData, Gain, PolylineBuilder, PolylineData};
