//! Per-document registry of identified objects and pending `xlink:href`s.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::error::{GmlError, Result};
use crate::geometry::{Geometry, GeometryReference, VisitReferences};

/// Identifier → object map plus the references waiting for resolution.
///
/// One context belongs to exactly one parse. References resolve to whatever
/// object is registered under their target id, regardless of which appears
/// first in the document.
#[derive(Debug, Default)]
pub struct IdContext {
    objects: IndexMap<String, Geometry>,
    references: Vec<GeometryReference>,
}

impl IdContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an identified object. Anonymous objects are ignored.
    pub fn add_object(&mut self, geometry: &Geometry) -> Result<()> {
        let Some(id) = geometry.id() else {
            return Ok(());
        };
        if self.objects.contains_key(id.as_str()) {
            return Err(GmlError::DuplicateId(id.to_string()));
        }
        debug!(id = id.as_str(), kind = geometry.kind_name(), "registered geometry");
        self.objects.insert(id.to_string(), geometry.clone());
        Ok(())
    }

    pub fn add_reference(&mut self, reference: GeometryReference) {
        debug!(href = reference.href(), kind = reference.kind().name(), "pending reference");
        self.references.push(reference);
    }

    pub fn get_object(&self, id: &str) -> Option<&Geometry> {
        self.objects.get(id)
    }

    pub fn objects(&self) -> impl Iterator<Item = (&str, &Geometry)> {
        self.objects.iter().map(|(id, g)| (id.as_str(), g))
    }

    pub fn references(&self) -> &[GeometryReference] {
        &self.references
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Resolves every pending local reference against the registered objects.
    ///
    /// Returns the hrefs that could not be resolved; those references stay
    /// empty and fail only when dereferenced. A reference whose target
    /// contains that same reference, directly or through references resolved
    /// before it, is left unresolved as well.
    pub fn resolve_references(&self) -> Vec<String> {
        let mut unresolved = Vec::new();
        for reference in &self.references {
            if reference.is_resolved() {
                continue;
            }
            let target = reference.local_id().and_then(|id| self.objects.get(id));
            match target {
                Some(geometry) if reaches(geometry, reference) => {
                    warn!(href = reference.href(), "geometry reference contains itself, left unresolved");
                    unresolved.push(reference.href().to_string());
                }
                Some(geometry) => {
                    reference.resolve_to(geometry.clone());
                }
                None => {
                    warn!(href = reference.href(), "dangling geometry reference");
                    unresolved.push(reference.href().to_string());
                }
            }
        }
        debug!(
            total = self.references.len(),
            unresolved = unresolved.len(),
            "resolved geometry references"
        );
        unresolved
    }
}

/// True if `reference` is held by `geometry` itself or by any target reachable
/// through references resolved so far.
fn reaches(geometry: &Geometry, reference: &GeometryReference) -> bool {
    let mut pending = vec![geometry.clone()];
    let mut seen = IndexSet::new();
    let mut found = false;
    while let Some(next) = pending.pop() {
        next.visit_references(&mut |r| {
            if r.same_slot(reference) {
                found = true;
            } else if seen.insert(r.slot_key()) {
                if let Ok(target) = r.target() {
                    pending.push(target.clone());
                }
            }
        });
        if found {
            return true;
        }
    }
    false
}
