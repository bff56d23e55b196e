//! Sprint Tracker - sprint counters and card workflow automation for Trello boards.
//!
//! - [`models`]: counters, host entities and transition outcomes
//! - [`board`]: host capabilities (Trello REST, in-memory board, prompts, clipboard)
//! - [`engine`]: counter store, field and list lookup, point accrual and transitions
//! - [`db`]: SQLite plugin-data store for running outside the host
//! - [`api`]: HTTP API for the power-up frontend
//! - [`config`]: environment configuration

pub mod api;
pub mod board;
pub mod config;
pub mod db;
pub mod engine;
pub mod models;

pub use engine::SprintEngine;
pub use models::{Transition, TransitionOutcome, WorkspaceCounters};
