pub mod config;
pub mod guard;
pub mod logging;
pub mod retry;
