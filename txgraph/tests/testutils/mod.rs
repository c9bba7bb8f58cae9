//! Test utilities for txgraph integration tests
//!
//! - TestFixture: coordinator over an in-memory store with a recording listener
//! - FlakyStore: store wrapper that injects commit conflicts

#![allow(dead_code)]

pub mod flaky_store;
pub mod test_fixture;

/// Route log output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
