pub use kurbo::{Affine, Point, Vec2};

/// Scheduler time in seconds, supplied by the caller on every tick.
pub type Seconds = f64;

/// Stable handle to a scene object.
///
/// A handle is a slot index plus a generation counter. Destroying an object
/// bumps its slot's generation, so a stale handle can never alias a later
/// object that reuses the slot; lookups with a stale handle fail with
/// [`UnknownObject`](crate::SaccadeError::UnknownObject).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ObjectId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ObjectId {
    /// Slot index, for diagnostics only.
    pub fn index(self) -> u32 {
        self.index
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj#{}.{}", self.index, self.generation)
    }
}

/// Handle for a registered script hook, unique per engine instance.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct HookId(pub u64);

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
