//! Scene objects, the arena-owned scene graph, and transform values.

/// The arena-owned scene: object store, name registry, hierarchy operations.
pub mod graph;
/// Scene objects, payloads, and script-visible property values.
pub mod object;
/// The affine transform value type.
pub mod transform;
