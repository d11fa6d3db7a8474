use std::collections::BTreeMap;

use crate::animation::binding::AnimBinding;
use crate::animation::custom::CustomBinding;
use crate::foundation::core::{ObjectId, Vec2};
use crate::scene::transform::Transform;
use crate::script::hooks::{HookEntry, PreHookFn};

/// Opaque renderable content carried by a scene object.
///
/// Concrete asset subtypes (polygon, image, video, SVG, skeletal rig,
/// physics-linked body, procedural shader surface) live behind this trait.
/// The core never inspects the payload; it only drives the object's
/// transform, visibility, priority, and animation slots. Renderers downcast
/// via [`Payload::as_any`].
pub trait Payload: std::fmt::Debug {
    /// Short identifier of the concrete content kind.
    fn kind(&self) -> &'static str;

    /// Upcast for content-specific renderer handling.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Placeholder payload for grouping nodes and purely scripted objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPayload;

impl Payload for NullPayload {
    fn kind(&self) -> &'static str {
        "null"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Script-visible property value. Never interpreted by the core itself.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Boolean flag.
    Bool(bool),
    /// Scalar.
    F64(f64),
    /// Text.
    Str(String),
    /// 2D vector.
    Vec2(Vec2),
    /// Arbitrary structured value.
    Json(serde_json::Value),
}

/// A renderable or grouping node owned by the scene arena.
///
/// Objects are created through [`Scene`](crate::scene::graph::Scene) factory
/// calls and addressed by [`ObjectId`] handles; a metagroup is an object whose
/// `children` list is present.
pub struct SceneObject {
    pub(crate) id: ObjectId,
    pub(crate) name: Option<String>,
    /// Local transform, composed under the parent chain at draw time.
    pub local: Transform,
    /// Invisible objects are excluded from the draw list but still receive
    /// animation and script updates when their group slot is dynamic.
    pub visible: bool,
    /// Draw-order key, ascending. Ties resolve by insertion order, stably.
    pub(crate) priority: f64,
    pub(crate) parent: Option<ObjectId>,
    /// `Some` iff this object is a metagroup.
    pub(crate) children: Option<Vec<ObjectId>>,
    pub(crate) binding: Option<AnimBinding>,
    pub(crate) custom: Option<CustomBinding>,
    /// Open per-object state for scripts.
    pub properties: BTreeMap<String, PropValue>,
    pub(crate) payload: Box<dyn Payload>,
    pub(crate) pre_hooks: Vec<HookEntry<PreHookFn>>,
    /// Set while this object's callbacks are checked out for invocation;
    /// destroy is rejected with `DanglingReference` while pinned.
    pub(crate) pinned: bool,
}

impl SceneObject {
    pub(crate) fn new(id: ObjectId, group: bool, payload: Box<dyn Payload>) -> Self {
        Self {
            id,
            name: None,
            local: Transform::identity(),
            visible: true,
            priority: 0.0,
            parent: None,
            children: if group { Some(Vec::new()) } else { None },
            binding: None,
            custom: None,
            properties: BTreeMap::new(),
            payload,
            pre_hooks: Vec::new(),
            pinned: false,
        }
    }

    /// This object's handle.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Human label, if one is currently bound to this object.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Draw-order key.
    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// Owning metagroup, or `None` for top-level objects.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Whether this object is a metagroup.
    pub fn is_group(&self) -> bool {
        self.children.is_some()
    }

    /// Ordered children of a metagroup; empty for non-groups.
    pub fn children(&self) -> &[ObjectId] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// The parametric animation binding, if any.
    pub fn animation(&self) -> Option<&AnimBinding> {
        self.binding.as_ref()
    }

    /// The custom callback binding, if any.
    pub fn custom_animation(&self) -> Option<&CustomBinding> {
        self.custom.as_ref()
    }

    /// The opaque renderable content.
    pub fn payload(&self) -> &dyn Payload {
        self.payload.as_ref()
    }

    /// Mutable access to the opaque renderable content.
    pub fn payload_mut(&mut self) -> &mut dyn Payload {
        self.payload.as_mut()
    }
}

impl std::fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneObject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.payload.kind())
            .field("group", &self.is_group())
            .field("visible", &self.visible)
            .field("priority", &self.priority)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/object.rs"]
mod tests;
