//! E2E test scenarios.

mod failures;
mod guardian;
mod matrix_flow;
mod preflight;
mod shutdown;
