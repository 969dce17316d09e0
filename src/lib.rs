//! watchdog: website scan orchestration engine and command line front end

pub mod app;
pub mod core;
pub mod notifications;
pub mod scanner;
pub mod storage;
