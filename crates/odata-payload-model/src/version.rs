//! Ordered OData protocol version.

use serde::{Deserialize, Serialize};

/// Wire-protocol version level a payload must satisfy.
///
/// Versions combine via [`ProtocolVersion::raise_to`] and never decrease.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum ProtocolVersion {
    /// No version requirement established yet.
    #[default]
    Unspecified,
    /// OData V1.
    V1,
    /// OData V2.
    V2,
    /// OData V3.
    V3,
    /// OData V4.
    V4,
}

impl ProtocolVersion {
    /// Raises this version to at least `minimum`; never decreases.
    pub fn raise_to(self, minimum: ProtocolVersion) -> ProtocolVersion {
        self.max(minimum)
    }

    /// Parses a `DataServiceVersion`-style header value (`"2.0"`).
    pub fn from_header(value: &str) -> Option<ProtocolVersion> {
        match value.trim() {
            "1.0" => Some(ProtocolVersion::V1),
            "2.0" => Some(ProtocolVersion::V2),
            "3.0" => Some(ProtocolVersion::V3),
            "4.0" => Some(ProtocolVersion::V4),
            _ => None,
        }
    }

    /// Renders the header form of this version, when specified.
    pub fn as_header(&self) -> Option<&'static str> {
        match self {
            ProtocolVersion::Unspecified => None,
            ProtocolVersion::V1 => Some("1.0"),
            ProtocolVersion::V2 => Some("2.0"),
            ProtocolVersion::V3 => Some("3.0"),
            ProtocolVersion::V4 => Some("4.0"),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for version ordering.

    use super::*;

    #[test]
    fn raise_to_never_decreases() {
        let version = ProtocolVersion::V3;
        assert_eq!(version.raise_to(ProtocolVersion::V1), ProtocolVersion::V3);
        assert_eq!(version.raise_to(ProtocolVersion::V4), ProtocolVersion::V4);
        assert!(ProtocolVersion::Unspecified < ProtocolVersion::V1);
    }
}
