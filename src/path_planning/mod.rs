// Path Planning algorithms module

pub mod a_star;
pub mod line_of_sight;
pub mod rrt;

pub use a_star::{AStarConfig, AStarPlanner};
pub use line_of_sight::{bresenham, line_of_sight, simplify_backward, simplify_forward};
pub use rrt::{RrtConfig, RrtPlanner};
