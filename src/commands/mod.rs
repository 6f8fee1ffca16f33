//! Top-level commands

pub mod mirror;
