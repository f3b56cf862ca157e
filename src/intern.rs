//! A concurrent interning table for value names, function identifiers and
//! property sets.
//!
//! The engine owns one `Interner` per process and hands it to every worker.
//! Interned strings and property sets compare by pointer on the fast path,
//! which keeps structural equality cheap when specifications are used as
//! cache keys millions of times per cycle. Interning is an optimization only:
//! uninterned values compare equal to interned ones.
//!
//! Insertion is safe from any number of threads. Entries are never removed
//! while the table is shared; [`Interner::clear`] needs exclusive access and is
//! meant to run between computation cycles.
use crate::target::TargetSpecification;
use crate::value::{ValueError, ValueProperties, ValueRequirement, ValueSpecification};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InternerStats {
    pub strings: usize,
    pub properties: usize,
}

#[derive(Debug, Default)]
pub struct Interner {
    strings: DashMap<Arc<str>, ()>,
    properties: DashMap<ValueProperties, ()>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical shared copy of `s`.
    pub fn intern_str(&self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(s) {
            return existing.key().clone();
        }
        // Another thread may win the race; `entry` settles on a single copy.
        let entry = self.strings.entry(Arc::from(s)).or_insert(());
        entry.key().clone()
    }

    /// Returns the canonical shared instance structurally equal to `properties`.
    pub fn intern_properties(&self, properties: ValueProperties) -> ValueProperties {
        if properties.is_empty() {
            return ValueProperties::empty();
        }
        if let Some(existing) = self.properties.get(&properties) {
            return existing.key().clone();
        }
        let entry = self.properties.entry(properties).or_insert(());
        entry.key().clone()
    }

    /// Builds a requirement with an interned value name and constraints.
    pub fn requirement(
        &self,
        value_name: &str,
        target: TargetSpecification,
        constraints: ValueProperties,
    ) -> Result<ValueRequirement, ValueError> {
        ValueRequirement::with_constraints(self.intern_str(value_name), target, self.intern_properties(constraints))
    }

    /// Builds a specification with an interned value name and properties.
    pub fn specification(
        &self,
        value_name: &str,
        target: TargetSpecification,
        properties: ValueProperties,
    ) -> Result<ValueSpecification, ValueError> {
        ValueSpecification::new(self.intern_str(value_name), target, self.intern_properties(properties))
    }

    pub fn stats(&self) -> InternerStats {
        InternerStats {
            strings: self.strings.len(),
            properties: self.properties.len(),
        }
    }

    /// Drops every interned entry. Values handed out earlier stay valid; they
    /// simply stop sharing storage with values interned afterwards.
    pub fn clear(&mut self) {
        let before = self.stats();
        self.strings.clear();
        self.properties.clear();
        debug!(strings = before.strings, properties = before.properties, "cleared interner");
    }
}
