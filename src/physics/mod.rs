//! Physics module - joint geometry and landmark smoothing
//!
//! Re-exports only. All logic in submodules.

mod angles;
mod bank;
mod kalman;
mod one_euro;
mod smoother;

pub use angles::{parallelism_difference, segment_angle_horizontal, vertex_angle_3d};
pub use bank::{LandmarkFilter, SmoothingConfig, SmoothingMethod};
pub use kalman::{Damping, KalmanFilter, KalmanParams};
pub use one_euro::{OneEuroFilter, OneEuroParams, OneEuroSmoother};
pub use smoother::{LandmarkSmoother, SmootherConfig};
