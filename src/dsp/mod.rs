// src/dsp/mod.rs
pub mod aeeg;
pub mod filter;
pub mod histogram;
pub mod pyramid;

pub use aeeg::{AeegChannel, AeegOutput};
pub use filter::{Biquad, FilterVariant, SosCascade, SosCoefficients};
pub use histogram::GsHistogram;
pub use pyramid::{LodPyramid, MinMaxPair};
