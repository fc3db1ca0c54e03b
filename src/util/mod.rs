//! Internal utilities.
//!
//! Kept dependency-free so that scheduling decisions stay deterministic.

pub mod det_rng;

pub use det_rng::DetRng;
