//! Defines `PropertyConstraint`, the per-name rule of the property algebra.
use super::error::ValueError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Sorted, deduplicated storage for the values of a constraint.
///
/// Inline capacity of two: ground properties hold exactly one value and
/// requirement constraints rarely list more than a couple of alternatives.
pub(crate) type ValueSet = SmallVec<[Arc<str>; 2]>;

/// One named constraint: a finite set of acceptable values, or a wildcard.
///
/// The `optional` flag is independent of the value set. It only changes the
/// outcome of satisfaction when the other side lacks the property entirely.
///
/// Invariant: a wildcard holds no values, a non-wildcard holds at least one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawConstraint", into = "RawConstraint")]
pub struct PropertyConstraint {
    values: ValueSet,
    wildcard: bool,
    optional: bool,
}

impl PropertyConstraint {
    /// A constraint accepting any value.
    pub fn wildcard() -> Self {
        Self { values: SmallVec::new(), wildcard: true, optional: false }
    }

    /// A constraint accepting exactly one value.
    pub fn single(value: impl Into<Arc<str>>) -> Self {
        let mut values = SmallVec::new();
        values.push(value.into());
        Self { values, wildcard: false, optional: false }
    }

    /// A constraint accepting any of `values`. Returns `None` for an empty set,
    /// which would otherwise accept nothing.
    pub fn of<I, V>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<str>>,
    {
        let mut constraint = Self { values: SmallVec::new(), wildcard: false, optional: false };
        for value in values {
            constraint.insert(value.into());
        }
        if constraint.values.is_empty() {
            None
        } else {
            Some(constraint)
        }
    }

    /// Returns this constraint with the optional flag set as given.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// The accepted values in sorted order; empty for a wildcard.
    #[inline]
    pub fn values(&self) -> &[Arc<str>] {
        &self.values
    }

    /// The value of a finite singleton constraint.
    pub fn single_value(&self) -> Option<&str> {
        match self.values.as_slice() {
            [only] => Some(&**only),
            _ => None,
        }
    }

    /// True if `value` is acceptable under this constraint.
    pub fn accepts(&self, value: &str) -> bool {
        self.wildcard || self.position(value).is_ok()
    }

    /// Satisfaction of this (requirement-side) constraint by the matching
    /// property of a specification, `None` when the specification lacks it.
    pub fn is_satisfied_by(&self, property: Option<&PropertyConstraint>) -> bool {
        match property {
            None => self.optional,
            Some(_) if self.wildcard => true,
            Some(property) => {
                !property.wildcard && property.values.iter().all(|v| self.position(v).is_ok())
            }
        }
    }

    /// The tightest constraint implied by both `self` and `other`.
    ///
    /// A wildcard yields to a finite set; two finite sets intersect. Returns
    /// `None` when the intersection is empty.
    pub fn meet(&self, other: &PropertyConstraint) -> Option<PropertyConstraint> {
        let optional = self.optional && other.optional;
        let values = match (self.wildcard, other.wildcard) {
            (true, true) => return Some(Self::wildcard().with_optional(optional)),
            (true, false) => other.values.clone(),
            (false, true) => self.values.clone(),
            (false, false) => intersect(&self.values, &other.values),
        };
        if values.is_empty() {
            None
        } else {
            Some(Self { values, wildcard: false, optional })
        }
    }

    /// Adds a value, keeping the set sorted. A wildcard absorbs new values.
    pub(crate) fn insert(&mut self, value: Arc<str>) {
        if self.wildcard {
            return;
        }
        if let Err(idx) = self.position(&value) {
            self.values.insert(idx, value);
        }
    }

    pub(crate) fn set_optional(&mut self) {
        self.optional = true;
    }

    fn position(&self, value: &str) -> Result<usize, usize> {
        self.values.binary_search_by(|probe| (**probe).cmp(value))
    }
}

/// Merge-walk intersection of two sorted value sets.
fn intersect(left: &[Arc<str>], right: &[Arc<str>]) -> ValueSet {
    let mut out = ValueSet::new();
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(left[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    out
}

impl fmt::Display for PropertyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wildcard {
            f.write_str("*")?;
        } else if let Some(value) = self.single_value() {
            f.write_str(value)?;
        } else {
            let joined: Vec<&str> = self.values.iter().map(|v| &**v).collect();
            write!(f, "[{}]", joined.join(", "))?;
        }
        if self.optional {
            f.write_str("?")?;
        }
        Ok(())
    }
}

// --- Serde boundary: deserialized constraints are re-validated ---

fn is_false(flag: &bool) -> bool {
    !*flag
}

#[derive(Serialize, Deserialize)]
struct RawConstraint {
    #[serde(default)]
    values: ValueSet,
    #[serde(default, skip_serializing_if = "is_false")]
    wildcard: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    optional: bool,
}

impl TryFrom<RawConstraint> for PropertyConstraint {
    type Error = ValueError;

    fn try_from(raw: RawConstraint) -> Result<Self, Self::Error> {
        if raw.values.iter().any(|v| v.is_empty()) {
            return Err(ValueError::MalformedConstraint("empty value".into()));
        }
        let constraint = if raw.wildcard {
            if !raw.values.is_empty() {
                return Err(ValueError::MalformedConstraint(format!(
                    "{} values alongside a wildcard",
                    raw.values.len()
                )));
            }
            Self::wildcard()
        } else {
            Self::of(raw.values)
                .ok_or_else(|| ValueError::MalformedConstraint("no values and no wildcard".into()))?
        };
        Ok(constraint.with_optional(raw.optional))
    }
}

impl From<PropertyConstraint> for RawConstraint {
    fn from(constraint: PropertyConstraint) -> Self {
        Self {
            values: constraint.values,
            wildcard: constraint.wildcard,
            optional: constraint.optional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set(values: &[&str]) -> PropertyConstraint {
        PropertyConstraint::of(values.iter().copied()).unwrap()
    }

    #[test]
    fn test_values_are_sorted_and_deduplicated() {
        let c = set(&["USD", "EUR", "USD", "GBP"]);
        let values: Vec<&str> = c.values().iter().map(|v| &**v).collect();
        assert_eq!(values, vec!["EUR", "GBP", "USD"]);
        assert!(PropertyConstraint::of(Vec::<&str>::new()).is_none());
    }

    #[test]
    fn test_wildcard_absorbs_inserted_values() {
        let mut c = PropertyConstraint::wildcard();
        c.insert(Arc::from("USD"));
        assert!(c.is_wildcard());
        assert!(c.values().is_empty());
    }

    #[rstest]
    #[case(&["USD"], &["USD", "EUR"], Some(&["USD"][..]))]
    #[case(&["EUR", "GBP", "USD"], &["GBP", "JPY", "USD"], Some(&["GBP", "USD"][..]))]
    #[case(&["EUR", "GBP"], &["USD"], None)]
    fn test_meet_of_finite_sets(#[case] a: &[&str], #[case] b: &[&str], #[case] expected: Option<&[&str]>) {
        let meet = set(a).meet(&set(b));
        assert_eq!(meet, expected.map(set));
    }

    #[test]
    fn test_meet_wildcard_yields_to_finite() {
        let finite = set(&["USD"]);
        assert_eq!(PropertyConstraint::wildcard().meet(&finite), Some(finite.clone()));
        assert_eq!(finite.meet(&PropertyConstraint::wildcard()), Some(finite));
        let both = PropertyConstraint::wildcard().meet(&PropertyConstraint::wildcard());
        assert_eq!(both, Some(PropertyConstraint::wildcard()));
    }

    #[test]
    fn test_meet_is_optional_only_if_both_are() {
        let optional = set(&["USD"]).with_optional(true);
        let required = set(&["USD"]);
        assert!(!optional.meet(&required).unwrap().is_optional());
        assert!(optional.meet(&optional).unwrap().is_optional());
    }

    #[rstest]
    #[case(PropertyConstraint::wildcard(), Some(set(&["USD"])), true)]
    #[case(PropertyConstraint::wildcard(), None, false)]
    #[case(PropertyConstraint::wildcard().with_optional(true), None, true)]
    #[case(set(&["EUR", "GBP"]), Some(set(&["USD"])), false)]
    #[case(set(&["EUR", "USD"]), Some(set(&["USD"])), true)]
    #[case(set(&["USD"]), Some(PropertyConstraint::wildcard()), false)]
    #[case(set(&["USD"]), None, false)]
    fn test_satisfaction(
        #[case] requirement: PropertyConstraint,
        #[case] property: Option<PropertyConstraint>,
        #[case] expected: bool,
    ) {
        assert_eq!(requirement.is_satisfied_by(property.as_ref()), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(set(&["USD"]).to_string(), "USD");
        assert_eq!(set(&["USD", "EUR"]).to_string(), "[EUR, USD]");
        assert_eq!(PropertyConstraint::wildcard().with_optional(true).to_string(), "*?");
    }

    #[test]
    fn test_deserialization_rejects_malformed_constraints() {
        let ok: PropertyConstraint = serde_json::from_str(r#"{"values":["USD"]}"#).unwrap();
        assert_eq!(ok, set(&["USD"]));
        assert!(serde_json::from_str::<PropertyConstraint>(r#"{"values":[]}"#).is_err());
        assert!(serde_json::from_str::<PropertyConstraint>(r#"{"values":["USD"],"wildcard":true}"#).is_err());
        assert!(serde_json::from_str::<PropertyConstraint>(r#"{"values":[""]}"#).is_err());
    }
}
