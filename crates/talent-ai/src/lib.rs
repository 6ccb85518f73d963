//! Recruiting pipeline orchestration.
//!
//! Candidates are sourced from pluggable repositories, scored by the screening engine,
//! contacted through a message dispatch adapter, and their replies are classified and routed
//! to follow-up actions. Every stage runs through the same orchestrator so errors, audit
//! messages, and timing are collected uniformly.

pub mod clock;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
