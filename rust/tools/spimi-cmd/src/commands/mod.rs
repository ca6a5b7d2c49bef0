//! Command implementations for spimi-cmd

pub mod build;
pub mod inspect;
