//! Rules engine for an N x N sliding-tile merge puzzle.
//!
//! The crate is synchronous and presentation-free: it owns the board, the
//! per-line collapse/merge pipeline, score accounting, and the win/loss
//! checks. Callers feed it directions and drain the [`events::GameEvent`]s
//! it emits; animation, input capture, and scheduling live elsewhere.

pub mod engine;
pub mod events;
