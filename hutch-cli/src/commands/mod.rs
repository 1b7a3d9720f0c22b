pub mod add;
pub mod list;
pub mod logs;
pub mod rm;
pub mod start;
pub mod stop;
