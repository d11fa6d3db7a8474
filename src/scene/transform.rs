use crate::foundation::core::{Affine, Vec2};

/// Local affine state of a scene object: translation, rotation, non-uniform scale.
///
/// Rotation is degrees at the API boundary and radians in storage. Translation
/// is in scene units; the core is unit-agnostic (the reference domain uses
/// degrees of visual angle).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    /// Translation in scene units.
    pub translate: Vec2,
    /// Rotation about Z in radians. Prefer [`Transform::rotation_deg`] and
    /// [`Transform::set_rotation_deg`] at the API boundary.
    pub rotation_rad: f64,
    /// Non-uniform scale factors for X and Y.
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            rotation_rad: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Rotation in degrees.
    pub fn rotation_deg(&self) -> f64 {
        self.rotation_rad.to_degrees()
    }

    /// Set the rotation from degrees.
    pub fn set_rotation_deg(&mut self, deg: f64) {
        self.rotation_rad = deg.to_radians();
    }

    /// Affine matrix for this transform: translate, then rotate, then scale.
    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.translate)
            * Affine::rotate(self.rotation_rad)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }

    /// Standard affine composition: `world = parent ∘ local`.
    pub fn compose(parent: Affine, local: &Transform) -> Affine {
        parent * local.to_affine()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/transform.rs"]
mod tests;
