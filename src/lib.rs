//! Carepath - Support Plan Cycle Management
//!
//! This crate implements the recurring individual-support-plan cycle for
//! welfare-service recipients: an ordered five-step progression per cycle,
//! automatic cycle rollover on terminal-step completion, and deadline
//! reminder windows delivered to an external calendar.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
