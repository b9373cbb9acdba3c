//! Session and practice-space tracking: fatigue, confusions, coverage.

pub mod confusion;
pub mod coverage;
pub mod fatigue;

pub use coverage::{coverage_matrix, CoverageCell, CoverageMatrix};
pub use fatigue::{FatigueMonitor, FatigueSignals};
