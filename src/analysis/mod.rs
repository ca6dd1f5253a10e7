//! Spectrum analysis.

pub mod bands;

pub use bands::{analyze, Band, BandIntensities};
