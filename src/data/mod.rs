// Data: recorded characterization samples
// Raw CSV captures are loaded (or synthesized), split into tests, smoothed and
// prepared into slow/fast storage.

pub mod sample;
pub mod loader;
pub mod filter;
pub mod synthetic;

pub use sample::{RawSample, Sample, Storage, TestBoundaries, prepare};
