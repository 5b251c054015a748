//! Shared test utilities for the covjson workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic result-tree generators
//! - Parameter catalogs and documents used as fixtures
//! - Approximate-equality assertions for decoded values
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
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{date_param_tree, fixtures};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for element-wise approximate equality of two float slices.
///
/// NaN only matches NaN.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_values_approx_eq;
///
/// assert_values_approx_eq!(&[1.0001, f64::NAN], &[1.0, f64::NAN], 0.001);
/// ```
#[macro_export]
macro_rules! assert_values_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &[f64] = $left;
        let right: &[f64] = $right;
        assert_eq!(left.len(), right.len(), "length mismatch: {:?} vs {:?}", left, right);
        for (l, r) in left.iter().zip(right.iter()) {
            if l.is_nan() || r.is_nan() {
                assert!(l.is_nan() && r.is_nan(), "NaN mismatch: {:?} vs {:?}", left, right);
            } else {
                $crate::assert_approx_eq!(*l, *r, $epsilon);
            }
        }
    }};
}
