//! Live/Frozen patch duality.
//!
//! Implemented as a sum type rather than a class hierarchy: the shared
//! operations (`key`, `geometry`, `name`, `attribute`) live on the outer
//! [`Patch`] enum, while mutation (`set_attribute`) is only reachable
//! through [`LivePatch`], which removes the need for a runtime
//! `is_frozen()` check on every hot-path attribute read.

use std::collections::HashMap;
use std::sync::Arc;

use crate::geokey::GeoKey;
use crate::geometry::Geometry;
use crate::value::Value;

/// A patch whose attribute map is exclusively owned and mutable by the
/// current timestep.
#[derive(Debug, Clone)]
pub struct LivePatch {
    key: Option<GeoKey>,
    geometry: Option<Geometry>,
    name: String,
    attributes: HashMap<String, Value>,
}

impl LivePatch {
    pub fn new(key: Option<GeoKey>, geometry: Option<Geometry>, name: impl Into<String>) -> Self {
        Self {
            key,
            geometry,
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn key(&self) -> Option<GeoKey> {
        self.key
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    /// Only reachable on the live variant: frozen patches are immutable.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Deep-copies the attribute map into an immutable snapshot. The
    /// original live patch continues to exist and can keep mutating.
    /// Idempotent over value equality: freezing the same contents twice
    /// yields equal (though not pointer-identical) [`FrozenPatch`]es.
    pub fn freeze(&self) -> FrozenPatch {
        FrozenPatch {
            key: self.key,
            geometry: self.geometry.clone(),
            name: self.name.clone(),
            attributes: Arc::new(self.attributes.clone()),
        }
    }
}

/// An immutable, shareable snapshot of a patch's state at freeze time.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenPatch {
    key: Option<GeoKey>,
    geometry: Option<Geometry>,
    name: String,
    attributes: Arc<HashMap<String, Value>>,
}

impl FrozenPatch {
    pub fn key(&self) -> Option<GeoKey> {
        self.key
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }
}

impl PartialEq for LivePatch {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.geometry == other.geometry
            && self.name == other.name
            && self.attributes == other.attributes
    }
}

/// Either a mutable, exclusively-owned live patch or an immutable, shared
/// frozen snapshot. Callers can use `is_frozen()` to assert invariants in
/// debug builds; it is not meant to gate hot-path logic.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Live(LivePatch),
    Frozen(FrozenPatch),
}

impl Patch {
    pub fn is_frozen(&self) -> bool {
        matches!(self, Patch::Frozen(_))
    }

    pub fn key(&self) -> Option<GeoKey> {
        match self {
            Patch::Live(p) => p.key(),
            Patch::Frozen(p) => p.key(),
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            Patch::Live(p) => p.geometry(),
            Patch::Frozen(p) => p.geometry(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Patch::Live(p) => p.name(),
            Patch::Frozen(p) => p.name(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        match self {
            Patch::Live(p) => p.attribute(name),
            Patch::Frozen(p) => p.attribute(name),
        }
    }
}

impl From<LivePatch> for Patch {
    fn from(p: LivePatch) -> Self {
        Patch::Live(p)
    }
}

impl From<FrozenPatch> for Patch {
    fn from(p: FrozenPatch) -> Self {
        Patch::Frozen(p)
    }
}
