use std::fmt;

/// A value with its unit of measure, kept exactly as read (no conversion).
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub value: f64,
    pub uom: String,
}

impl Measure {
    pub fn new(value: f64, uom: impl Into<String>) -> Self {
        Measure {
            value,
            uom: uom.into(),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.uom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Forward,
    Reversed,
}

impl Orientation {
    pub fn as_sign(self) -> &'static str {
        match self {
            Orientation::Forward => "+",
            Orientation::Reversed => "-",
        }
    }
}
