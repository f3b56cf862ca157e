//! Defines `ValueRequirement`, the declarative ask for a value.
use super::error::ValueError;
use super::properties::ValueProperties;
use super::specification::ValueSpecification;
use crate::target::TargetSpecification;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A request for a named value on a target, subject to property constraints.
///
/// Immutable once created. A function declares the requirements it needs as
/// inputs; the graph builder then matches them against the specifications
/// other functions can produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRequirement")]
pub struct ValueRequirement {
    value_name: Arc<str>,
    target: TargetSpecification,
    constraints: ValueProperties,
}

impl ValueRequirement {
    /// A requirement with no constraints.
    pub fn new(value_name: impl Into<Arc<str>>, target: TargetSpecification) -> Result<Self, ValueError> {
        Self::with_constraints(value_name, target, ValueProperties::empty())
    }

    pub fn with_constraints(
        value_name: impl Into<Arc<str>>,
        target: TargetSpecification,
        constraints: ValueProperties,
    ) -> Result<Self, ValueError> {
        let value_name = value_name.into();
        if value_name.is_empty() {
            return Err(ValueError::EmptyValueName);
        }
        Ok(Self::from_parts(value_name, target, constraints))
    }

    /// Assembles a requirement from parts already known to be valid.
    pub(crate) fn from_parts(
        value_name: Arc<str>,
        target: TargetSpecification,
        constraints: ValueProperties,
    ) -> Self {
        Self { value_name, target, constraints }
    }

    pub fn value_name(&self) -> &str {
        &self.value_name
    }

    pub(crate) fn value_name_arc(&self) -> &Arc<str> {
        &self.value_name
    }

    pub fn target(&self) -> &TargetSpecification {
        &self.target
    }

    pub fn constraints(&self) -> &ValueProperties {
        &self.constraints
    }

    /// Tests whether `specification` can be used to satisfy this requirement.
    ///
    /// The value names and targets must be equal and the specification's
    /// properties must satisfy the constraints.
    pub fn is_satisfied_by(&self, specification: &ValueSpecification) -> bool {
        self.matches_name(specification)
            && self.target == *specification.target()
            && self.constraints.is_satisfied_by(specification.properties())
    }

    /// Value names are usually interned, making the pointer check the common path.
    pub(crate) fn matches_name(&self, specification: &ValueSpecification) -> bool {
        let theirs = specification.value_name_arc();
        Arc::ptr_eq(&self.value_name, theirs) || self.value_name == *theirs
    }

    /// Reads the single value a constraint pins down.
    ///
    /// Returns `Ok(None)` if the name is unconstrained. Fails if the
    /// constraint is a wildcard or still lists several alternatives.
    pub fn get_constraint(&self, name: &str) -> Result<Option<&str>, ValueError> {
        let Some(constraint) = self.constraints.get(name) else {
            return Ok(None);
        };
        if constraint.is_wildcard() {
            return Err(ValueError::WildcardProperty { name: name.to_string() });
        }
        match constraint.single_value() {
            Some(value) => Ok(Some(value)),
            None => Err(ValueError::MultiValuedProperty {
                name: name.to_string(),
                count: constraint.values().len(),
            }),
        }
    }
}

impl PartialEq for ValueRequirement {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.value_name, &other.value_name) || self.value_name == other.value_name)
            && self.target == other.target
            && self.constraints == other.constraints
    }
}

impl Eq for ValueRequirement {}

impl std::hash::Hash for ValueRequirement {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value_name.hash(state);
        self.target.hash(state);
        self.constraints.hash(state);
    }
}

impl fmt::Display for ValueRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueReq[{}, {}, {}]", self.value_name, self.target, self.constraints)
    }
}

#[derive(Deserialize)]
struct RawRequirement {
    value_name: Arc<str>,
    target: TargetSpecification,
    #[serde(default)]
    constraints: ValueProperties,
}

impl TryFrom<RawRequirement> for ValueRequirement {
    type Error = ValueError;

    fn try_from(raw: RawRequirement) -> Result<Self, Self::Error> {
        Self::with_constraints(raw.value_name, raw.target, raw.constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetType;
    use crate::value::names::{CURRENCY, FUNCTION, SURFACE};
    use rstest::rstest;

    fn target() -> TargetSpecification {
        TargetSpecification::of(TargetType::Security, "Test", "S1").unwrap()
    }

    fn requirement(constraints: ValueProperties) -> ValueRequirement {
        ValueRequirement::with_constraints("PresentValue", target(), constraints).unwrap()
    }

    #[test]
    fn test_empty_value_name_is_rejected() {
        assert_eq!(ValueRequirement::new("", target()).unwrap_err(), ValueError::EmptyValueName);
    }

    #[test]
    fn test_constraints_default_to_empty() {
        let req = ValueRequirement::new("PresentValue", target()).unwrap();
        assert!(req.constraints().ptr_eq(&ValueProperties::empty()));
    }

    #[rstest]
    #[case(ValueProperties::builder().with(CURRENCY, "USD"), Ok(Some("USD")))]
    #[case(ValueProperties::builder(), Ok(None))]
    #[case(ValueProperties::builder().with_any(CURRENCY), Err(ValueError::WildcardProperty { name: CURRENCY.into() }))]
    #[case(
        ValueProperties::builder().with(CURRENCY, "USD").with(CURRENCY, "EUR"),
        Err(ValueError::MultiValuedProperty { name: CURRENCY.into(), count: 2 })
    )]
    fn test_get_constraint(
        #[case] builder: crate::value::ValuePropertiesBuilder,
        #[case] expected: Result<Option<&str>, ValueError>,
    ) {
        let req = requirement(builder.build().unwrap());
        assert_eq!(req.get_constraint(CURRENCY), expected);
    }

    #[test]
    fn test_satisfaction_requires_matching_name_and_target() {
        let props = ValueProperties::builder().with(FUNCTION, "f").build().unwrap();
        let spec = ValueSpecification::new("PresentValue", target(), props.clone()).unwrap();
        assert!(requirement(ValueProperties::empty()).is_satisfied_by(&spec));

        let other_name = ValueRequirement::new("Delta", target()).unwrap();
        assert!(!other_name.is_satisfied_by(&spec));

        let elsewhere = TargetSpecification::of(TargetType::Security, "Test", "S2").unwrap();
        let other_target = ValueRequirement::new("PresentValue", elsewhere).unwrap();
        assert!(!other_target.is_satisfied_by(&spec));
    }

    #[test]
    fn test_optional_absence() {
        let spec = ValueSpecification::new(
            "PresentValue",
            target(),
            ValueProperties::builder().with(FUNCTION, "f").build().unwrap(),
        )
        .unwrap();
        let optional = requirement(ValueProperties::builder().with_optional(SURFACE).build().unwrap());
        assert!(optional.is_satisfied_by(&spec));
        let mandatory = requirement(ValueProperties::builder().with_any(SURFACE).build().unwrap());
        assert!(!mandatory.is_satisfied_by(&spec));
    }

    #[test]
    fn test_display() {
        let req = requirement(ValueProperties::builder().with(CURRENCY, "USD").build().unwrap());
        assert_eq!(req.to_string(), "ValueReq[PresentValue, SECURITY[Test~S1], {Currency=USD}]");
    }
}
