//! s3gate library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `s3gate` is used as a binary (main.rs).

pub mod cli;
pub mod context;
pub mod guardian;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod scenario;
