//! Credit risk scoring service library.
//!
//! The `scoring` module holds the actual design content: the immutable
//! rubric, the weighted scoring engine, the risk classifier, and the
//! assessment lifecycle. Everything else is the ambient plumbing the
//! HTTP service needs to boot.

pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
