//! The per-tick driver and its time sources.

/// Clock abstractions for live loops and deterministic replay.
pub mod clock;
/// The frame scheduler: the per-tick protocol and its output.
pub mod frame;
