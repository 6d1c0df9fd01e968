//! Live broadcast relay and quiz-wagering coordinator.
//!
//! This library provides a WebSocket server that relays annotated video
//! frames from a single broadcaster to many viewers, fans out chat messages,
//! and runs a synchronized elimination-style betting game on top of the
//! broadcast.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// shared library
pub mod common;
