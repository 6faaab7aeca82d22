use thiserror::Error;

/// Errors raised while reading or writing GML geometries.
///
/// Every failure abandons the current parse or export session; nothing is
/// recovered internally.
#[derive(Debug, Error)]
pub enum GmlError {
    /// Malformed or unexpected content.
    #[error("invalid GML in <{element}>: {reason}")]
    Format { element: String, reason: String },
    #[error("unknown coordinate reference system '{0}'")]
    UnknownCrs(String),
    #[error("cannot transform from '{source_crs}' to '{target_crs}': {reason}")]
    Transformation {
        source_crs: String,
        target_crs: String,
        reason: String,
    },
    #[error("{kind} cannot be encoded as GML {version}")]
    UnsupportedVersion { kind: String, version: String },
    #[error("{0} is not a simple-features geometry")]
    UnsupportedGeometry(String),
    #[error("reference '{0}' has not been resolved")]
    UnresolvedReference(String),
    #[error("reference '{href}' expects {expected} but points to {found}")]
    ReferenceMismatch {
        href: String,
        expected: String,
        found: String,
    },
    #[error("'{0}' is not a valid geometry identifier")]
    InvalidIdentifier(String),
    #[error("identifier '{0}' is used by more than one object")]
    DuplicateId(String),
    #[error("XML error: {0}")]
    Xml(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GmlError {
    pub fn format(element: impl Into<String>, reason: impl Into<String>) -> Self {
        GmlError::Format {
            element: element.into(),
            reason: reason.into(),
        }
    }
}

impl From<quick_xml::Error> for GmlError {
    fn from(err: quick_xml::Error) -> Self {
        GmlError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for GmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        GmlError::Xml(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GmlError>;
