//! Script hook tables: ordered callbacks run at fixed points in the tick.

/// Hook entries, callback signatures, and list operations.
pub mod hooks;
