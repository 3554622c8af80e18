//! Speaking clock library exports for testing

pub mod console;
pub mod core;
pub mod speech;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
