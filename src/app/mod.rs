//! Application module: the `watchdog` command line front end

pub mod cli;
pub mod progress;
pub mod startup;
pub mod summary;
