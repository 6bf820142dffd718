//! Subsync - Subscription Lifecycle Reconciliation Engine
//!
//! Keeps an internal subscription record consistent with a billing provider's
//! asynchronous, at-least-once, out-of-order webhook stream, while exposing
//! deterministic state transitions to the rest of the system.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
