//! Reading and writing GML 2 and GML 3 geometries.
//!
//! The reader pulls geometry elements from a namespace-aware [`XmlStream`]
//! into the [`Geometry`] model, registering identified objects and pending
//! `xlink:href`s in an [`IdContext`]. The writers encode the model back into
//! any supported GML version, sharing repeated objects by reference.

pub mod crs;
pub mod error;
pub mod geometry;
pub mod reader;
pub mod registry;
pub mod version;
pub mod writer;
pub mod xml;

pub use crs::{CoordinateTransformer, Crs, CrsResolver, Relabel, WellKnownCrs};
pub use error::{GmlError, Result};
pub use geometry::{Geometry, GeometryId, Member};
pub use reader::{read_geometry, read_geometry_from, GeometryReader};
pub use registry::IdContext;
pub use version::GmlVersion;
pub use writer::{write_geometry_to_string, CoordinateFormatter, ExportedIds, GeometryWriter, WriterOptions};
pub use xml::{XmlSink, XmlStream};
