#![forbid(unsafe_code)]

pub mod book_service;
pub mod dashboard_service;
pub mod error;
pub mod goal_service;
pub mod profile_service;
pub mod session_service;

pub use tracker_core::Clock;

pub use book_service::BookService;
pub use dashboard_service::{
    ActiveGoalProgress, DASHBOARD_RECENT_DAYS, DashboardService, DashboardSummary,
    STREAK_WINDOW_DAYS,
};
pub use error::{
    BookServiceError, DashboardError, GoalServiceError, ProfileServiceError, SessionServiceError,
};
pub use goal_service::GoalService;
pub use profile_service::ProfileService;
pub use session_service::SessionService;
