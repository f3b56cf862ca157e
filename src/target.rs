//! Identifies the real-world object a value is about.
//!
//! The algebra treats a `TargetSpecification` as an opaque key: it is only
//! ever compared and hashed.
use crate::value::ValueError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The kind of object a computation target refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetType {
    PortfolioNode,
    Position,
    Trade,
    Security,
    /// A target with no backing object, such as a currency or a curve name.
    Primitive,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetType::PortfolioNode => "PORTFOLIO_NODE",
            TargetType::Position => "POSITION",
            TargetType::Trade => "TRADE",
            TargetType::Security => "SECURITY",
            TargetType::Primitive => "PRIMITIVE",
        })
    }
}

/// A scheme-qualified identifier, optionally versioned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawUniqueId")]
pub struct UniqueId {
    scheme: Arc<str>,
    value: Arc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<Arc<str>>,
}

impl UniqueId {
    pub fn of(scheme: impl Into<Arc<str>>, value: impl Into<Arc<str>>) -> Result<Self, ValueError> {
        let (scheme, value) = (scheme.into(), value.into());
        if scheme.is_empty() {
            return Err(ValueError::InvalidTarget("identifier scheme must not be empty".into()));
        }
        if value.is_empty() {
            return Err(ValueError::InvalidTarget("identifier value must not be empty".into()));
        }
        Ok(Self { scheme, value, version: None })
    }

    pub fn with_version(mut self, version: impl Into<Arc<str>>) -> Result<Self, ValueError> {
        let version = version.into();
        if version.is_empty() {
            return Err(ValueError::InvalidTarget("identifier version must not be empty".into()));
        }
        self.version = Some(version);
        Ok(self)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.scheme, self.value)?;
        if let Some(version) = &self.version {
            write!(f, "~{}", version)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawUniqueId {
    scheme: Arc<str>,
    value: Arc<str>,
    #[serde(default)]
    version: Option<Arc<str>>,
}

impl TryFrom<RawUniqueId> for UniqueId {
    type Error = ValueError;

    fn try_from(raw: RawUniqueId) -> Result<Self, Self::Error> {
        let id = UniqueId::of(raw.scheme, raw.value)?;
        match raw.version {
            Some(version) => id.with_version(version),
            None => Ok(id),
        }
    }
}

/// What a value is about: a target type plus the identifier of the object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetSpecification {
    target_type: TargetType,
    id: UniqueId,
}

impl TargetSpecification {
    pub fn new(target_type: TargetType, id: UniqueId) -> Self {
        Self { target_type, id }
    }

    /// Shorthand for a target whose identifier is built from `scheme` and `value`.
    pub fn of(
        target_type: TargetType,
        scheme: impl Into<Arc<str>>,
        value: impl Into<Arc<str>>,
    ) -> Result<Self, ValueError> {
        Ok(Self::new(target_type, UniqueId::of(scheme, value)?))
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    pub fn id(&self) -> &UniqueId {
        &self.id
    }
}

impl fmt::Display for TargetSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.target_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = TargetSpecification::of(TargetType::Security, "BBG", "AAPL US Equity").unwrap();
        let b = TargetSpecification::of(TargetType::Security, "BBG", "AAPL US Equity").unwrap();
        let c = TargetSpecification::of(TargetType::Position, "BBG", "AAPL US Equity").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "SECURITY[BBG~AAPL US Equity]");
    }

    #[test]
    fn test_empty_identifier_parts_are_rejected() {
        assert!(matches!(UniqueId::of("", "x"), Err(ValueError::InvalidTarget(_))));
        assert!(matches!(UniqueId::of("s", ""), Err(ValueError::InvalidTarget(_))));
        let id = UniqueId::of("s", "x").unwrap();
        assert!(id.clone().with_version("").is_err());
        assert_eq!(id.with_version("3").unwrap().to_string(), "s~x~3");
    }

    #[test]
    fn test_deserialization_validates_identifier() {
        let json = r#"{"target_type":"Primitive","id":{"scheme":"CurrencyISO","value":"USD"}}"#;
        let target: TargetSpecification = serde_json::from_str(json).unwrap();
        assert_eq!(target.id().value(), "USD");
        let bad = r#"{"target_type":"Primitive","id":{"scheme":"","value":"USD"}}"#;
        assert!(serde_json::from_str::<TargetSpecification>(bad).is_err());
    }
}
