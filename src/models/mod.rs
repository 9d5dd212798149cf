pub mod attendance_filter;
pub mod attendance_log;
pub mod event;
pub mod export;
pub mod session;
