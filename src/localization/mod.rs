// Localization algorithms module

pub mod ekf;
pub mod ekf_cv;
pub mod kalman;

pub use ekf::{Ekf2D, EkfParams};
pub use ekf_cv::{EkfCv, EkfCvParams};
pub use kalman::{check_health, condition_covariance, KalmanState};
