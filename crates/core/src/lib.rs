#![forbid(unsafe_code)]

pub mod error;
pub mod goals;
pub mod model;
pub mod progress;
pub mod streaks;
pub mod time;

pub use error::Error;
pub use goals::{GoalProgress, compute_goal_progress};
pub use progress::{BookProgress, classify_status, percentage, recompute};
pub use streaks::{DailyTotal, StreakSummary, compute_streaks};
pub use time::Clock;
