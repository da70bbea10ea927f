//! Parsing of `ResourceType/id` literal references.

use std::fmt;
use std::str::FromStr;

use crate::error::{ClinicalError, Result};

/// A parsed literal reference such as `Patient/123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralReference {
    pub resource_type: String,
    pub id: String,
}

impl LiteralReference {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Parse and additionally require the given resource type.
    pub fn parse_typed(reference: &str, expected: &str) -> Result<Self> {
        let parsed: Self = reference.parse()?;
        if parsed.resource_type != expected {
            return Err(ClinicalError::InvalidReference(reference.to_string()));
        }
        Ok(parsed)
    }
}

impl FromStr for LiteralReference {
    type Err = ClinicalError;

    fn from_str(reference: &str) -> Result<Self> {
        let parts: Vec<&str> = reference.split('/').collect();
        match parts.as_slice() {
            [resource_type, id] if !resource_type.is_empty() && !id.is_empty() => {
                Ok(Self::new(*resource_type, *id))
            }
            _ => Err(ClinicalError::InvalidReference(reference.to_string())),
        }
    }
}

impl fmt::Display for LiteralReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// Extract the bare id from a `Type/id` reference.
pub fn id_from_reference(reference: &str) -> Result<String> {
    reference.parse::<LiteralReference>().map(|r| r.id)
}
