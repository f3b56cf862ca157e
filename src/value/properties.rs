//! The property algebra: an immutable, name-ordered set of constraints with
//! a satisfaction predicate and a composition (meet) operator.
//!
//! A `ValueProperties` is a handle onto shared, immutable storage. Cloning it
//! is a reference-count bump, and two handles that came from the same build
//! compare equal without walking their contents. Equality and hashing are
//! otherwise structural, so independently built but identical property sets
//! are interchangeable as cache keys.
use super::constraint::PropertyConstraint;
use super::error::ValueError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

type Entries = BTreeMap<Arc<str>, PropertyConstraint>;

static EMPTY: Lazy<ValueProperties> = Lazy::new(|| ValueProperties { entries: Arc::new(Entries::new()) });

#[derive(Clone, Deserialize)]
#[serde(try_from = "Entries")]
pub struct ValueProperties {
    entries: Arc<Entries>,
}

impl ValueProperties {
    /// The canonical empty property set. Every call returns the same instance.
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    pub fn builder() -> ValuePropertiesBuilder {
        ValuePropertiesBuilder::default()
    }

    /// A builder seeded with these properties.
    pub fn copy(&self) -> ValuePropertiesBuilder {
        ValuePropertiesBuilder { entries: (*self.entries).clone(), error: None }
    }

    fn from_entries(entries: Entries) -> Self {
        if entries.is_empty() {
            return Self::empty();
        }
        Self { entries: Arc::new(entries) }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyConstraint> {
        self.entries.get(name)
    }

    /// The values of a named property: `None` if absent, empty for a wildcard.
    pub fn values(&self, name: &str) -> Option<&[Arc<str>]> {
        self.entries.get(name).map(PropertyConstraint::values)
    }

    pub fn is_optional(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(PropertyConstraint::is_optional)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| &**k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyConstraint)> {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }

    /// True when every property holds exactly one concrete value.
    pub fn is_ground(&self) -> bool {
        self.entries.values().all(|c| c.single_value().is_some())
    }

    /// True if both handles share the same underlying storage.
    #[inline]
    pub fn ptr_eq(&self, other: &ValueProperties) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Tests whether `properties` satisfies these properties used as constraints.
    ///
    /// Every constrained name must be present in `properties` unless marked
    /// optional. A wildcard accepts any present value; a finite constraint
    /// requires each of the other side's values to be one it lists. Names that
    /// only appear in `properties` are unconstrained.
    pub fn is_satisfied_by(&self, properties: &ValueProperties) -> bool {
        if self.ptr_eq(properties) {
            return true;
        }
        self.entries
            .iter()
            .all(|(name, constraint)| constraint.is_satisfied_by(properties.entries.get(name)))
    }

    /// Composes these properties with the constraints `other`, producing the
    /// tightest properties implied by both.
    ///
    /// - a name only in `self` is kept;
    /// - a name only in `other` is added if finite, dropped if a wildcard;
    /// - a name in both takes the meet of the two constraints.
    ///
    /// Returns `None` if any meet is empty. If nothing changes the result is
    /// `self` (the same handle), so callers can detect "no change" with
    /// [`ValueProperties::ptr_eq`].
    pub fn compose(&self, other: &ValueProperties) -> Option<ValueProperties> {
        if self.ptr_eq(other) || other.is_empty() {
            return Some(self.clone());
        }
        // Copied on the first change only.
        let mut composed: Option<Entries> = None;
        for (name, theirs) in other.entries.iter() {
            let replacement = match self.entries.get(name) {
                None if theirs.is_wildcard() => continue,
                None => theirs.clone(),
                Some(ours) => {
                    let meet = ours.meet(theirs)?;
                    if meet == *ours {
                        continue;
                    }
                    meet
                }
            };
            composed
                .get_or_insert_with(|| (*self.entries).clone())
                .insert(name.clone(), replacement);
        }
        Some(match composed {
            Some(entries) => Self::from_entries(entries),
            None => self.clone(),
        })
    }
}

impl Default for ValueProperties {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for ValueProperties {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.entries == other.entries
    }
}

impl Eq for ValueProperties {}

impl Hash for ValueProperties {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.hash(state);
    }
}

impl fmt::Debug for ValueProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl fmt::Display for ValueProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, constraint)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, constraint)?;
        }
        f.write_str("}")
    }
}

impl Serialize for ValueProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl TryFrom<Entries> for ValueProperties {
    type Error = ValueError;

    fn try_from(entries: Entries) -> Result<Self, Self::Error> {
        if entries.keys().any(|name| name.is_empty()) {
            return Err(ValueError::EmptyPropertyName);
        }
        Ok(Self::from_entries(entries))
    }
}

/// Accumulates constraints for a new `ValueProperties`.
///
/// The first invalid argument is remembered and reported by [`build`](Self::build),
/// so calls can be chained freely.
#[derive(Debug, Clone, Default)]
pub struct ValuePropertiesBuilder {
    entries: Entries,
    error: Option<ValueError>,
}

impl ValuePropertiesBuilder {
    /// Adds `value` to the acceptable values of `name`. Has no effect if `name`
    /// is already a wildcard.
    pub fn with(mut self, name: impl Into<Arc<str>>, value: impl Into<Arc<str>>) -> Self {
        let (name, value) = (name.into(), value.into());
        if !self.check_name(&name) {
            return self;
        }
        if value.is_empty() {
            self.fail(ValueError::EmptyPropertyValue { name: name.to_string() });
            return self;
        }
        match self.entries.get_mut(&name) {
            Some(existing) => existing.insert(value),
            None => {
                self.entries.insert(name, PropertyConstraint::single(value));
            }
        }
        self
    }

    /// Adds several acceptable values for `name`; at least one is required.
    pub fn with_values<I, V>(mut self, name: impl Into<Arc<str>>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<str>>,
    {
        let name = name.into();
        let mut any = false;
        for value in values {
            any = true;
            self = self.with(name.clone(), value);
        }
        if !any && self.check_name(&name) {
            self.fail(ValueError::EmptyPropertyValue { name: name.to_string() });
        }
        self
    }

    /// Makes `name` a wildcard, discarding any values already given for it.
    pub fn with_any(mut self, name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        if !self.check_name(&name) {
            return self;
        }
        let optional = self.entries.get(&name).is_some_and(PropertyConstraint::is_optional);
        self.entries
            .insert(name, PropertyConstraint::wildcard().with_optional(optional));
        self
    }

    /// Marks `name` optional. An unknown name becomes an optional wildcard.
    pub fn with_optional(mut self, name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        if !self.check_name(&name) {
            return self;
        }
        self.entries
            .entry(name)
            .or_insert_with(PropertyConstraint::wildcard)
            .set_optional();
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.entries.remove(name);
        self
    }

    pub fn build(self) -> Result<ValueProperties, ValueError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(ValueProperties::from_entries(self.entries)),
        }
    }

    fn check_name(&mut self, name: &str) -> bool {
        if name.is_empty() {
            self.fail(ValueError::EmptyPropertyName);
            return false;
        }
        true
    }

    fn fail(&mut self, err: ValueError) {
        self.error.get_or_insert(err);
    }
}
