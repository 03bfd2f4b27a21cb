//! cdcwatch engine - Drift comparison
//!
//! This crate implements the comparison between the source schema and what
//! the CDC layer believes it is capturing:
//! - Table presence and primary key checks
//! - Column-level drift (added, removed, nullability, type)
//! - Staleness of the CDC-recorded schema
//! - Folding connector warnings into the issue stream

pub mod drift_detector;

pub use drift_detector::{DriftEngine, classify_warning};
