// Template context structures for Askama templates.

mod attendance;

pub use attendance::*;
