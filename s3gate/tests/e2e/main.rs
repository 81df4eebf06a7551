//! E2E integration tests for s3gate.
//!
//! These tests drive complete orchestration runs against a scripted
//! command runner and a fake `PATH`, so no container runtime is needed.
//!
//! # Test Structure
//!
//! - `helpers/` -- Shared test utilities (scripted runner, config, fake tools)
//! - `scenarios/` -- Test files organized by flow
//!
//! # Running
//!
//! ```bash
//! cargo test -p s3gate --test e2e
//! ```

#![cfg(unix)]

mod scenarios;
