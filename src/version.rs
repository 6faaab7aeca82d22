use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GmlError;

pub const GML_NS: &str = "http://www.opengis.net/gml";
pub const GML32_NS: &str = "http://www.opengis.net/gml/3.2";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// GML schema generations understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GmlVersion {
    #[serde(rename = "2.1")]
    Gml21,
    #[serde(rename = "3.0")]
    Gml30,
    #[serde(rename = "3.1")]
    Gml31,
    #[serde(rename = "3.2")]
    Gml32,
}

impl GmlVersion {
    pub fn namespace(self) -> &'static str {
        match self {
            GmlVersion::Gml32 => GML32_NS,
            _ => GML_NS,
        }
    }

    pub fn is_gml2(self) -> bool {
        self == GmlVersion::Gml21
    }

    /// Attribute carrying object identifiers (`gid` or `gml:id`).
    pub fn id_attribute(self) -> &'static str {
        if self.is_gml2() {
            "gid"
        } else {
            "id"
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GmlVersion::Gml21 => "2.1",
            GmlVersion::Gml30 => "3.0",
            GmlVersion::Gml31 => "3.1",
            GmlVersion::Gml32 => "3.2",
        }
    }
}

impl fmt::Display for GmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GmlVersion {
    type Err = GmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2" | "2.1" | "2.1.2" => Ok(GmlVersion::Gml21),
            "3.0" | "3.0.0" | "3.0.1" => Ok(GmlVersion::Gml30),
            "3" | "3.1" | "3.1.1" => Ok(GmlVersion::Gml31),
            "3.2" | "3.2.1" => Ok(GmlVersion::Gml32),
            other => Err(GmlError::UnsupportedVersion {
                kind: "document".to_string(),
                version: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!("2.1.2".parse::<GmlVersion>().unwrap(), GmlVersion::Gml21);
        assert_eq!("3.2".parse::<GmlVersion>().unwrap(), GmlVersion::Gml32);
        assert!("4.0".parse::<GmlVersion>().is_err());
    }

    #[test]
    fn test_namespace_per_version() {
        assert_eq!(GmlVersion::Gml31.namespace(), GML_NS);
        assert_eq!(GmlVersion::Gml21.namespace(), GML_NS);
        assert_eq!(GmlVersion::Gml32.namespace(), GML32_NS);
    }
}
