//! Shared test utilities for the swe-common workspace.
//!
//! This crate provides:
//! - Sample component schemas and encodings ([`fixtures`])
//! - Hand-built wire byte and text generators ([`generators`])
//! - Temporary document helpers for file based tests ([`paths`])
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in integration tests:
//!
//! ```ignore
//! use test_utils::{fixtures, WireBuilder};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use generators::*;
pub use paths::*;

#[doc(hidden)]
pub use swe_common as __swe_common;

/// Approximate floating-point equality assertion.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        if (left - right).abs() > epsilon {
            panic!(
                "assertion failed: `{:?}` is not within {:?} of `{:?}`",
                left, epsilon, right
            );
        }
    }};
}

/// Assert that a block holds exactly the given values, atom by atom.
///
/// ```ignore
/// assert_block_values!(block, [Value::Int(3), Value::Double(1.0)]);
/// ```
#[macro_export]
macro_rules! assert_block_values {
    ($block:expr, [$($value:expr),* $(,)?]) => {{
        let expected: Vec<$crate::__swe_common::Value> = vec![$($value),*];
        assert_eq!($block.values(), expected, "block values differ");
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }
}
