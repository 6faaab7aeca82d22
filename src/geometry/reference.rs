use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{GmlError, Result};

use super::Geometry;

/// The kind of object an `xlink:href` is expected to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Point,
    LineString,
    Polygon,
    Curve,
    Ring,
    Surface,
    Solid,
    Geometry,
}

impl ReferenceKind {
    pub fn name(self) -> &'static str {
        match self {
            ReferenceKind::Point => "Point",
            ReferenceKind::LineString => "LineString",
            ReferenceKind::Polygon => "Polygon",
            ReferenceKind::Curve => "Curve",
            ReferenceKind::Ring => "Ring",
            ReferenceKind::Surface => "Surface",
            ReferenceKind::Solid => "Solid",
            ReferenceKind::Geometry => "Geometry",
        }
    }
}

/// Lazily resolved `xlink:href` to another geometry of the same document.
///
/// Clones share the resolution slot, so filling it once through the
/// [`IdContext`](crate::registry::IdContext) makes the target visible to every
/// copy of the reference.
#[derive(Clone)]
pub struct GeometryReference {
    href: String,
    kind: ReferenceKind,
    target: Arc<OnceLock<Geometry>>,
}

impl GeometryReference {
    pub fn new(href: impl Into<String>, kind: ReferenceKind) -> Self {
        GeometryReference {
            href: href.into(),
            kind,
            target: Arc::new(OnceLock::new()),
        }
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    /// Fragment identifier for document-local references (`#id` → `id`).
    pub fn local_id(&self) -> Option<&str> {
        self.href.strip_prefix('#')
    }

    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    /// Fills the resolution slot. Returns false if it was already filled.
    pub fn resolve_to(&self, geometry: Geometry) -> bool {
        self.target.set(geometry).is_ok()
    }

    /// The referenced geometry, or `UnresolvedReference` while the slot is empty.
    pub fn target(&self) -> Result<&Geometry> {
        self.target
            .get()
            .ok_or_else(|| GmlError::UnresolvedReference(self.href.clone()))
    }

    /// True when both references share one resolution slot.
    pub fn same_slot(&self, other: &GeometryReference) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }

    /// Address of the shared resolution slot, equal for all clones.
    pub(crate) fn slot_key(&self) -> usize {
        Arc::as_ptr(&self.target) as usize
    }
}

// Targets may reference back into their owner, so neither Debug nor PartialEq
// descend into the slot.
impl fmt::Debug for GeometryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryReference")
            .field("href", &self.href)
            .field("kind", &self.kind)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl PartialEq for GeometryReference {
    fn eq(&self, other: &Self) -> bool {
        self.href == other.href && self.kind == other.kind
    }
}
