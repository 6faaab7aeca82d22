//! Streaming GML geometry readers.
//!
//! Every `parse_*` routine expects the cursor on the opening tag of its
//! element and leaves it on the matching closing tag. Identified objects are
//! registered in the caller's [`IdContext`]; `xlink:href`s become pending
//! references there.

use std::io::BufRead;

use tracing::debug;

use crate::crs::{Crs, CrsResolver, WellKnownCrs};
use crate::error::{GmlError, Result};
use crate::geometry::{Geometry, GeometryKind, GeometryReference, Member};
use crate::registry::IdContext;
use crate::version::{GmlVersion, XLINK_NS};
use crate::xml::XmlStream;

mod gml2;
mod gml3;
mod patches;
pub mod primitives;
mod segments;

pub struct GeometryReader<'a, R: BufRead> {
    pub(crate) xml: &'a mut XmlStream<R>,
    pub(crate) ctx: &'a mut IdContext,
    pub(crate) version: GmlVersion,
    pub(crate) ns: &'static str,
    pub(crate) resolver: &'a dyn CrsResolver,
}

impl<'a, R: BufRead> GeometryReader<'a, R> {
    pub fn new(xml: &'a mut XmlStream<R>, ctx: &'a mut IdContext, version: GmlVersion) -> Self {
        GeometryReader {
            xml,
            ctx,
            version,
            ns: version.namespace(),
            resolver: &WellKnownCrs,
        }
    }

    /// Replaces the resolver used to infer coordinate dimensions from CRS names.
    pub fn with_resolver(mut self, resolver: &'a dyn CrsResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn version(&self) -> GmlVersion {
        self.version
    }

    /// Parses the geometry element at the cursor.
    ///
    /// # Arguments
    /// * `default_crs` - CRS inherited from an enclosing element, used when
    ///   the geometry carries no `srsName` of its own
    ///
    /// # Returns
    /// The parsed geometry, with the cursor left on its end tag. References
    /// are registered but not resolved; call
    /// [`IdContext::resolve_references`] once the document is read.
    pub fn read(&mut self, default_crs: Option<&Crs>) -> Result<Geometry> {
        debug!(
            element = self.xml.local_name(),
            version = self.version.as_str(),
            "reading geometry"
        );
        if self.version.is_gml2() {
            self.parse_gml2_geometry(default_crs)
        } else {
            self.parse_geometry(default_crs)
        }
    }

    pub(crate) fn href(&self) -> Option<String> {
        self.xml.attribute_ns(XLINK_NS, "href").map(str::to_string)
    }

    /// Registers an identified object and hands it back.
    pub(crate) fn register<T: GeometryKind>(&mut self, value: T) -> Result<T> {
        let geometry = value.clone().into_geometry();
        self.ctx.add_object(&geometry)?;
        Ok(value)
    }

    /// Reads a property element holding either an `xlink:href` or exactly one
    /// inline object.
    ///
    /// Precondition: cursor on the property's start tag. Postcondition: cursor
    /// on its end tag.
    pub(crate) fn parse_member<T, F>(&mut self, crs: Option<&Crs>, parse_inline: F) -> Result<Member<T>>
    where
        T: GeometryKind,
        F: FnOnce(&mut Self, Option<&Crs>) -> Result<T>,
    {
        let property = self.xml.local_name().to_string();
        let ns = self.xml.namespace().to_string();
        if let Some(href) = self.href() {
            debug!(property = property.as_str(), href = href.as_str(), "found xlink reference");
            let reference = GeometryReference::new(href, T::EXPECTED);
            self.ctx.add_reference(reference.clone());
            self.xml.next_tag()?;
            if !self.xml.is_end() {
                return Err(GmlError::format(
                    property,
                    "a property with xlink:href must not have inline content",
                ));
            }
            self.xml.require_end(&ns, &property)?;
            return Ok(Member::Reference(reference));
        }

        self.xml.next_tag()?;
        if !self.xml.is_start() {
            return Err(GmlError::format(
                property,
                "property must contain an inline geometry or an xlink:href",
            ));
        }
        let value = parse_inline(self, crs)?;
        self.xml.next_tag()?;
        self.xml.require_end(&ns, &property)?;
        Ok(Member::Inline(value))
    }

    pub(crate) fn unexpected(&self, expected: &str) -> GmlError {
        let found = if self.xml.namespace() == self.ns {
            self.xml.local_name().to_string()
        } else {
            format!("{{{}}}{}", self.xml.namespace(), self.xml.local_name())
        };
        GmlError::format(found, format!("not a valid substitution for '{}'", expected))
    }

    /// Asserts that the cursor is on a start tag in the GML namespace.
    pub(crate) fn require_gml_start(&self, expected: &str) -> Result<()> {
        if !self.xml.is_start() || self.xml.namespace() != self.ns {
            return Err(self.unexpected(expected));
        }
        Ok(())
    }
}

/// Parses a complete document whose root element is a geometry and resolves
/// its references.
///
/// # Arguments
/// * `source` - Buffered XML input, positioned before the root element
/// * `version` - GML version of the document; selects the namespace and the
///   GML 2 or GML 3 grammar
///
/// # Returns
/// The root geometry and the registry of every identified object and
/// `xlink:href` found in the document. Dangling or cyclic references stay
/// unresolved and only fail when dereferenced.
pub fn read_geometry_from<R: BufRead>(source: R, version: GmlVersion) -> Result<(Geometry, IdContext)> {
    let mut xml = XmlStream::new(source);
    xml.next_tag()?;
    let mut ctx = IdContext::new();
    let geometry = GeometryReader::new(&mut xml, &mut ctx, version).read(None)?;
    let unresolved = ctx.resolve_references();
    if !unresolved.is_empty() {
        debug!(count = unresolved.len(), "document has unresolved references");
    }
    Ok((geometry, ctx))
}

/// [`read_geometry_from`] for an in-memory document.
pub fn read_geometry(xml: &str, version: GmlVersion) -> Result<(Geometry, IdContext)> {
    read_geometry_from(xml.as_bytes(), version)
}
