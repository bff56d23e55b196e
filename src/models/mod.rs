//! Domain models for the sprint tracker.
//!
//! # Core Concepts
//!
//! ## Board State
//!
//! - [`WorkspaceCounters`]: sprint number, next branch number and points done,
//!   stored once per board in the host's plugin data.
//!
//! ## Host Entities
//!
//! These belong to the host platform; the engine only reads them and issues
//! mutation requests:
//!
//! - [`Workspace`], [`Collection`], [`Card`], [`Member`]
//! - [`AttributeDefinition`] and [`AttributeValue`]: custom fields and their
//!   per-card values.
//!
//! ## Ephemeral Values
//!
//! - [`TransitionOutcome`]: what a user action did, reported once and dropped.

mod attribute;
mod board;
mod counters;
mod outcome;

pub use attribute::*;
pub use board::*;
pub use counters::*;
pub use outcome::*;
