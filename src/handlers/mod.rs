pub mod attendance;
pub mod webhook;
