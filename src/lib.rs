//! Drive Simulation Library
//!
//! A discrete-time 2D vehicle simulation with pluggable physics models,
//! polygon collision checking and a synchronous topic bus, plus the levels
//! and run driver that exercise it headless.

pub mod config;
pub mod levels;
pub mod simulation;
