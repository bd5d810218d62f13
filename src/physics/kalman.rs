//! Kalman Filter for landmark position smoothing
//!
//! State vector: [x, y, z, vx, vy, vz, ax, ay, az]ᵀ (9 elements)
//! Constant-acceleration model, one prediction per frame (dt = 1).

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

/// 9-element state vector type
type State = SVector<f32, 9>;
/// 9x9 matrix type
type Matrix9 = SMatrix<f32, 9, 9>;
/// 3x9 matrix type (observation)
type Matrix3x9 = SMatrix<f32, 3, 9>;
/// 9x3 matrix type (Kalman gain)
type Matrix9x3 = SMatrix<f32, 9, 3>;
/// 3x3 matrix type
type Matrix3 = SMatrix<f32, 3, 3>;
/// 3-element vector type
type Vector3 = SVector<f32, 3>;

/// Noise scalars, named after the `{"R": .., "Q": ..}` block of exercise configs
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KalmanParams {
    /// Measurement noise (higher = trust the detector less, smoother output)
    #[serde(rename = "R", default = "default_measurement_noise")]
    pub measurement_noise: f32,
    /// Process noise (higher = trust the motion model less, more responsive)
    #[serde(rename = "Q", default = "default_process_noise")]
    pub process_noise: f32,
}

fn default_measurement_noise() -> f32 {
    5.0
}

fn default_process_noise() -> f32 {
    0.1
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            measurement_noise: default_measurement_noise(),
            process_noise: default_process_noise(),
        }
    }
}

/// Multipliers applied to velocity and acceleration after every prediction
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Damping {
    pub velocity: f32,
    pub acceleration: f32,
}

impl Damping {
    /// Torso and legs: mild decay
    pub const BODY: Damping = Damping { velocity: 0.98, acceleration: 0.95 };
    /// Wrists and fingers: strong decay to stop overshoot while occluded
    pub const EXTREMITY: Damping = Damping { velocity: 0.90, acceleration: 0.80 };
}

/// Kalman filter for one 3D landmark
///
/// Implements 9-state predictor with position, velocity, and acceleration.
#[derive(Clone, Debug)]
pub struct KalmanFilter {
    /// State: [x, y, z, vx, vy, vz, ax, ay, az]
    state: State,

    /// State covariance matrix (uncertainty)
    covariance: Matrix9,

    /// Process noise (how much we trust physics model)
    process_noise: Matrix9,

    /// Measurement noise covariance
    measurement_noise: Matrix3,
}

impl KalmanFilter {
    /// Create a filter at rest at `position`
    pub fn new(position: (f32, f32, f32), params: KalmanParams) -> Self {
        let mut state = State::zeros();
        state[0] = position.0;
        state[1] = position.1;
        state[2] = position.2;

        Self {
            state,
            covariance: Matrix9::identity(),
            process_noise: Matrix9::identity() * params.process_noise,
            measurement_noise: Matrix3::identity() * params.measurement_noise,
        }
    }

    /// Build transition matrix F for dt = 1
    ///
    /// ```text
    /// | I  I  ½I |
    /// | 0  I  I  |
    /// | 0  0  I  |
    /// ```
    fn transition_matrix() -> Matrix9 {
        let mut f = Matrix9::identity();
        for axis in 0..3 {
            f[(axis, axis + 3)] = 1.0;
            f[(axis, axis + 6)] = 0.5;
            f[(axis + 3, axis + 6)] = 1.0;
        }
        f
    }

    /// Observation matrix H (we only measure x, y, z)
    fn observation_matrix() -> Matrix3x9 {
        let mut h = Matrix3x9::zeros();
        for axis in 0..3 {
            h[(axis, axis)] = 1.0;
        }
        h
    }

    /// Predict step - called once per frame
    ///
    /// Uses physics model: x += v + 0.5*a, v += a
    pub fn predict(&mut self, damping: Damping) {
        let f = Self::transition_matrix();

        // State prediction: x = F * x
        self.state = f * self.state;

        // Covariance prediction: P = F * P * Fᵀ + Q
        self.covariance = f * self.covariance * f.transpose() + self.process_noise;

        // Decay motion to prevent drift while the landmark is occluded
        for axis in 0..3 {
            self.state[axis + 3] *= damping.velocity;
            self.state[axis + 6] *= damping.acceleration;
        }
    }

    /// Update step - corrects prediction with a trusted measurement
    pub fn update(&mut self, measured: (f32, f32, f32)) {
        let h = Self::observation_matrix();
        let z = Vector3::new(measured.0, measured.1, measured.2);

        // Innovation: y = z - H * x
        let innovation = z - h * self.state;

        // Innovation covariance: S = H * P * Hᵀ + R
        let s = h * self.covariance * h.transpose() + self.measurement_noise;

        // Kalman gain: K = P * Hᵀ * S⁻¹
        let s_inv = s.try_inverse().unwrap_or_else(Matrix3::identity);
        let k: Matrix9x3 = self.covariance * h.transpose() * s_inv;

        // State update: x = x + K * y
        self.state += k * innovation;

        // Covariance update: P = (I - K * H) * P
        self.covariance = (Matrix9::identity() - k * h) * self.covariance;
    }

    /// Current position estimate
    pub fn position(&self) -> (f32, f32, f32) {
        (self.state[0], self.state[1], self.state[2])
    }

    /// Estimated velocity (normalized units per frame)
    pub fn velocity(&self) -> (f32, f32, f32) {
        (self.state[3], self.state[4], self.state[5])
    }

    /// Estimated acceleration
    pub fn acceleration(&self) -> (f32, f32, f32) {
        (self.state[6], self.state[7], self.state[8])
    }

    /// Overwrite the motion half of the state, leaving position untouched
    pub fn set_motion(&mut self, velocity: (f32, f32, f32), acceleration: (f32, f32, f32)) {
        self.state[3] = velocity.0;
        self.state[4] = velocity.1;
        self.state[5] = velocity.2;
        self.state[6] = acceleration.0;
        self.state[7] = acceleration.1;
        self.state[8] = acceleration.2;
    }
}
