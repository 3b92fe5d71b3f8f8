// Path Tracking algorithms module

pub mod pure_pursuit;

pub use pure_pursuit::{PurePursuit, PurePursuitConfig};
