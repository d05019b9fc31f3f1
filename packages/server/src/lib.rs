//! Idobata chat broker library.
//!
//! A room-scoped message relay: each client holds one WebSocket connection
//! to the broker, which tracks room membership, fans chat events out to the
//! right subset of connections, keeps a short replayable history per room,
//! and coalesces typing signals into presence snapshots.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
