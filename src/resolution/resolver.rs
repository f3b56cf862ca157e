//! The resolution contract used by the dependency-graph builder.
//!
//! For each requirement the builder holds a pool of candidate specifications
//! (the declared outputs of functions that might produce it). Resolution keeps
//! the candidates that satisfy the requirement and composes each with it,
//! yielding the exact specifications that become cache keys and published
//! outputs. Finding nothing is an ordinary outcome: the builder backtracks and
//! tries other functions.
use super::config::ResolutionConfig;
use crate::target::TargetSpecification;
use crate::value::{ValueRequirement, ValueSpecification};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Decides whether a value produced on one target can stand in for a value
/// requested on another.
pub trait TargetResolver: Send + Sync {
    fn resolves(&self, requested: &TargetSpecification, produced: &TargetSpecification) -> bool;
}

/// Targets resolve only to themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTargetResolver;

impl TargetResolver for ExactTargetResolver {
    #[inline]
    fn resolves(&self, requested: &TargetSpecification, produced: &TargetSpecification) -> bool {
        requested == produced
    }
}

/// The outcome of resolving one requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub requirement: ValueRequirement,
    pub specifications: Vec<ValueSpecification>,
}

impl Resolution {
    pub fn is_satisfied(&self) -> bool {
        !self.specifications.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolver<T = ExactTargetResolver> {
    config: ResolutionConfig,
    targets: T,
}

impl Resolver<ExactTargetResolver> {
    pub fn new(config: ResolutionConfig) -> Self {
        Self { config, targets: ExactTargetResolver }
    }
}

impl<T: TargetResolver> Resolver<T> {
    pub fn with_target_resolver(config: ResolutionConfig, targets: T) -> Self {
        Self { config, targets }
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    /// Satisfaction with target matching delegated to the target resolver.
    pub fn matches(&self, requirement: &ValueRequirement, candidate: &ValueSpecification) -> bool {
        requirement.matches_name(candidate)
            && self.targets.resolves(requirement.target(), candidate.target())
            && requirement.constraints().is_satisfied_by(candidate.properties())
    }

    /// Returns the composed specification for every candidate that satisfies
    /// `requirement`, in candidate order.
    pub fn resolve(
        &self,
        requirement: &ValueRequirement,
        candidates: &[ValueSpecification],
    ) -> Vec<ValueSpecification> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for candidate in candidates {
            if !self.matches(requirement, candidate) {
                continue;
            }
            let Some(composed) = candidate.compose(requirement) else {
                trace!(%requirement, %candidate, "candidate satisfied but not composable");
                continue;
            };
            if self.config.deduplicate && !seen.insert(composed.clone()) {
                continue;
            }
            resolved.push(composed);
        }
        debug!(
            %requirement,
            candidates = candidates.len(),
            resolved = resolved.len(),
            "resolved requirement"
        );
        resolved
    }

    /// Resolves independent requirements against a shared candidate pool.
    ///
    /// Results are in requirement order whether or not the batch ran in
    /// parallel.
    pub fn resolve_all(
        &self,
        requirements: &[ValueRequirement],
        candidates: &[ValueSpecification],
    ) -> Vec<Resolution> {
        let resolve_one = |requirement: &ValueRequirement| Resolution {
            requirement: requirement.clone(),
            specifications: self.resolve(requirement, candidates),
        };
        if self.config.parallel && requirements.len() >= self.config.parallel_threshold {
            debug!(requirements = requirements.len(), "resolving batch in parallel");
            requirements.par_iter().map(resolve_one).collect()
        } else {
            requirements.iter().map(resolve_one).collect()
        }
    }
}
