//! Defines `ValueSpecification`, the concrete description of a value a
//! function produces.
use super::error::ValueError;
use super::names;
use super::properties::ValueProperties;
use super::requirement::ValueRequirement;
use crate::target::TargetSpecification;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An immutable description of an actual value: its name, its target and the
/// properties it was computed with.
///
/// Specifications are shared as cache keys and as graph-edge metadata, so the
/// fields live behind a single `Arc`; cloning never copies them. Equality and
/// hashing are structural.
///
/// The properties always carry a single, non-optional [`names::FUNCTION`]
/// value identifying the producer.
#[derive(Clone, Deserialize)]
#[serde(try_from = "RawSpecification")]
pub struct ValueSpecification {
    inner: Arc<SpecificationInner>,
}

#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
struct SpecificationInner {
    value_name: Arc<str>,
    target: TargetSpecification,
    properties: ValueProperties,
}

impl ValueSpecification {
    /// A specification declared directly by a function for one of its outputs.
    pub fn new(
        value_name: impl Into<Arc<str>>,
        target: TargetSpecification,
        properties: ValueProperties,
    ) -> Result<Self, ValueError> {
        let value_name = value_name.into();
        if value_name.is_empty() {
            return Err(ValueError::EmptyValueName);
        }
        check_function(&properties)?;
        Ok(Self::from_parts(value_name, target, properties))
    }

    /// A specification with `function_id` and, if given, `currency` added to
    /// `properties`.
    pub fn with_function(
        value_name: impl Into<Arc<str>>,
        target: TargetSpecification,
        function_id: &str,
        currency: Option<&str>,
        properties: Option<&ValueProperties>,
    ) -> Result<Self, ValueError> {
        let mut builder = properties.map_or_else(ValueProperties::builder, ValueProperties::copy);
        if let Some(currency) = currency {
            builder = builder.without(names::CURRENCY).with(names::CURRENCY, currency);
        }
        let properties = builder
            .without(names::FUNCTION)
            .with(names::FUNCTION, function_id)
            .build()?;
        Self::new(value_name, target, properties)
    }

    /// A specification satisfying `requirement`, produced by `function_id`.
    ///
    /// The requirement's constraints are copied verbatim with `FUNCTION`
    /// overwritten. Wildcards in the requirement stay wildcards: the function
    /// is declaring it can produce "any", and the graph builder must resolve
    /// them further downstream. [`ValueProperties::is_ground`] reports them.
    pub fn for_requirement(requirement: &ValueRequirement, function_id: &str) -> Result<Self, ValueError> {
        let properties = requirement
            .constraints()
            .copy()
            .without(names::FUNCTION)
            .with(names::FUNCTION, function_id)
            .build()?;
        check_function(&properties)?;
        Ok(Self::from_parts(
            requirement.value_name_arc().clone(),
            requirement.target().clone(),
            properties,
        ))
    }

    /// A specification for `requirement` with caller-chosen properties.
    ///
    /// The properties must already satisfy the requirement; this is checked in
    /// debug builds only.
    pub fn satisfying(requirement: &ValueRequirement, properties: ValueProperties) -> Result<Self, ValueError> {
        check_function(&properties)?;
        debug_assert!(requirement.constraints().is_satisfied_by(&properties));
        Ok(Self::from_parts(
            requirement.value_name_arc().clone(),
            requirement.target().clone(),
            properties,
        ))
    }

    fn from_parts(value_name: Arc<str>, target: TargetSpecification, properties: ValueProperties) -> Self {
        Self { inner: Arc::new(SpecificationInner { value_name, target, properties }) }
    }

    pub fn value_name(&self) -> &str {
        &self.inner.value_name
    }

    pub(crate) fn value_name_arc(&self) -> &Arc<str> {
        &self.inner.value_name
    }

    pub fn target(&self) -> &TargetSpecification {
        &self.inner.target
    }

    pub fn properties(&self) -> &ValueProperties {
        &self.inner.properties
    }

    /// The identifier of the function that produces this value.
    pub fn function_id(&self) -> &str {
        // Checked at construction.
        self.inner
            .properties
            .get(names::FUNCTION)
            .and_then(|c| c.single_value())
            .unwrap_or_default()
    }

    /// Reads a single property value.
    ///
    /// Returns `Ok(None)` if the property is absent and fails if it is a
    /// wildcard. A multi-valued property yields its first value in sorted order.
    pub fn get_property(&self, name: &str) -> Result<Option<&str>, ValueError> {
        match self.inner.properties.get(name) {
            None => Ok(None),
            Some(c) if c.is_wildcard() => Err(ValueError::WildcardProperty { name: name.to_string() }),
            Some(c) => Ok(c.values().first().map(|v| &**v)),
        }
    }

    /// The loosest requirement this specification satisfies.
    pub fn to_requirement(&self) -> ValueRequirement {
        ValueRequirement::from_parts(
            self.inner.value_name.clone(),
            self.inner.target.clone(),
            self.inner.properties.clone(),
        )
    }

    /// Narrows the properties to match a tighter requirement.
    ///
    /// Only the properties take part; value name and target are kept as they
    /// are. Returns `self` (the same shared instance) if the requirement adds
    /// nothing, and `None` if the properties cannot be composed.
    pub fn compose(&self, requirement: &ValueRequirement) -> Option<ValueSpecification> {
        let old = &self.inner.properties;
        let new = old.compose(requirement.constraints())?;
        if new.ptr_eq(old) {
            return Some(self.clone());
        }
        Some(Self::from_parts(self.inner.value_name.clone(), self.inner.target.clone(), new))
    }

    /// True if both handles share the same underlying instance.
    #[inline]
    pub fn ptr_eq(&self, other: &ValueSpecification) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn check_function(properties: &ValueProperties) -> Result<(), ValueError> {
    let Some(function) = properties.get(names::FUNCTION) else {
        return Err(ValueError::MissingFunction { name: names::FUNCTION });
    };
    if function.is_optional() || function.single_value().is_none() {
        return Err(ValueError::InvalidFunction { name: names::FUNCTION, found: function.to_string() });
    }
    Ok(())
}

impl PartialEq for ValueSpecification {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (&*self.inner, &*other.inner);
        (Arc::ptr_eq(&a.value_name, &b.value_name) || a.value_name == b.value_name)
            && a.target == b.target
            && a.properties == b.properties
    }
}

impl Eq for ValueSpecification {}

impl Hash for ValueSpecification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl fmt::Debug for ValueSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSpecification")
            .field("value_name", &self.inner.value_name)
            .field("target", &self.inner.target)
            .field("properties", &self.inner.properties)
            .finish()
    }
}

impl fmt::Display for ValueSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ValueSpec[{}, {}, {}]",
            self.inner.value_name, self.inner.target, self.inner.properties
        )
    }
}

impl Serialize for ValueSpecification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

#[derive(Deserialize)]
struct RawSpecification {
    value_name: Arc<str>,
    target: TargetSpecification,
    properties: ValueProperties,
}

impl TryFrom<RawSpecification> for ValueSpecification {
    type Error = ValueError;

    fn try_from(raw: RawSpecification) -> Result<Self, Self::Error> {
        Self::new(raw.value_name, raw.target, raw.properties)
    }
}
