//! Orientation mathematics

pub mod orientation;

pub use orientation::{EulerAngles, Quaternion};
