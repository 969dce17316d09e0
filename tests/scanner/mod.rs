//! Scanner integration test modules

pub mod lifecycle;
pub mod persistence;
