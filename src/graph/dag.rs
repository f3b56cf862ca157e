//! dag.rs
//! The dependency graph assembled from resolved specifications.
//!
//! Nodes are published values, deduplicated structurally. An edge runs from an
//! input value to the value computed from it and carries the requirement that
//! the input was resolved against.

use super::error::GraphError;
use crate::resolution::{Resolver, TargetResolver};
use crate::value::{ValueRequirement, ValueSpecification};
use petgraph::algo::toposort;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: StableDiGraph<ValueSpecification, ValueRequirement>,
    index: HashMap<ValueSpecification, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.graph.node_count() }

    pub fn is_empty(&self) -> bool { self.graph.node_count() == 0 }

    pub fn contains(&self, value: &ValueSpecification) -> bool { self.index.contains_key(value) }

    /// Adds a value, returning the existing node if an equal one is present.
    pub fn add_value(&mut self, value: ValueSpecification) -> NodeIndex {
        if let Some(&idx) = self.index.get(&value) {
            return idx;
        }
        let idx = self.graph.add_node(value.clone());
        self.index.insert(value, idx);
        idx
    }

    /// Records that `consumer` is computed from `input`, which was resolved
    /// against `requirement`. Both values are added if missing.
    ///
    /// Targets must match exactly; use
    /// [`add_resolved_dependency`](Self::add_resolved_dependency) for inputs
    /// found through another target resolver.
    pub fn add_dependency(
        &mut self,
        consumer: &ValueSpecification,
        requirement: ValueRequirement,
        input: &ValueSpecification,
    ) -> Result<(), GraphError> {
        let satisfied = requirement.is_satisfied_by(input);
        self.link(consumer, requirement, input, satisfied)
    }

    /// Like [`add_dependency`](Self::add_dependency), with the input checked
    /// the way `resolver` matched it.
    pub fn add_resolved_dependency<T: TargetResolver>(
        &mut self,
        resolver: &Resolver<T>,
        consumer: &ValueSpecification,
        requirement: ValueRequirement,
        input: &ValueSpecification,
    ) -> Result<(), GraphError> {
        let satisfied = resolver.matches(&requirement, input);
        self.link(consumer, requirement, input, satisfied)
    }

    fn link(
        &mut self,
        consumer: &ValueSpecification,
        requirement: ValueRequirement,
        input: &ValueSpecification,
        satisfied: bool,
    ) -> Result<(), GraphError> {
        if !satisfied {
            return Err(GraphError::Unsatisfied {
                requirement: requirement.to_string(),
                input: input.to_string(),
            });
        }
        let from = self.add_value(input.clone());
        let to = self.add_value(consumer.clone());
        self.graph.add_edge(from, to, requirement);
        Ok(())
    }

    /// The direct inputs of `value` with the requirements they satisfied.
    pub fn inputs_of(
        &self,
        value: &ValueSpecification,
    ) -> Result<Vec<(&ValueRequirement, &ValueSpecification)>, GraphError> {
        let idx = self.node(value)?;
        Ok(self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| (edge.weight(), &self.graph[edge.source()]))
            .collect())
    }

    /// Every value `start` transitively depends on, including `start` itself.
    pub fn upstream_from(&self, start: &[ValueSpecification]) -> Result<HashSet<&ValueSpecification>, GraphError> {
        let mut queue = start.iter().map(|v| self.node(v)).collect::<Result<VecDeque<_>, _>>()?;
        let mut visited = HashSet::new();

        while let Some(idx) = queue.pop_front() {
            if visited.insert(idx) {
                queue.extend(self.graph.neighbors_directed(idx, Direction::Incoming));
            }
        }
        Ok(visited.into_iter().map(|idx| &self.graph[idx]).collect())
    }

    /// Values nothing else in the graph consumes.
    pub fn terminal_outputs(&self) -> Vec<&ValueSpecification> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph.neighbors_directed(idx, Direction::Outgoing).next().is_none())
            .map(|idx| &self.graph[idx])
            .collect()
    }

    /// Values ordered so every input precedes the values computed from it.
    pub fn topological_order(&self) -> Result<Vec<&ValueSpecification>, GraphError> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order.into_iter().map(|idx| &self.graph[idx]).collect()),
            Err(cycle) => {
                let value = self.graph[cycle.node_id()].to_string();
                debug!(%value, "cycle detected in dependency graph");
                Err(GraphError::Cycle { value })
            }
        }
    }

    fn node(&self, value: &ValueSpecification) -> Result<NodeIndex, GraphError> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| GraphError::UnknownValue(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::ResolutionConfig;
    use crate::target::{TargetSpecification, TargetType};
    use crate::value::names::{CURRENCY, CURVE, FUNCTION};
    use crate::value::ValueProperties;

    fn target() -> TargetSpecification {
        TargetSpecification::of(TargetType::Primitive, "CurrencyISO", "USD").unwrap()
    }

    fn value(name: &str, function: &str) -> ValueSpecification {
        let props = ValueProperties::builder()
            .with(CURRENCY, "USD")
            .with(CURVE, "Discounting")
            .with(FUNCTION, function)
            .build()
            .unwrap();
        ValueSpecification::new(name, target(), props).unwrap()
    }

    fn wants(name: &str) -> ValueRequirement {
        let constraints = ValueProperties::builder().with(CURVE, "Discounting").build().unwrap();
        ValueRequirement::with_constraints(name, target(), constraints).unwrap()
    }

    fn sample() -> (DependencyGraph, ValueSpecification, ValueSpecification, ValueSpecification) {
        let curve = value("YieldCurve", "CurveFn");
        let vol = value("VolatilitySurface", "SurfaceFn");
        let pv = value("PresentValue", "BlackFn");
        let mut graph = DependencyGraph::new();
        graph.add_dependency(&vol, wants("YieldCurve"), &curve).unwrap();
        graph.add_dependency(&pv, wants("YieldCurve"), &curve).unwrap();
        graph.add_dependency(&pv, wants("VolatilitySurface"), &vol).unwrap();
        (graph, curve, vol, pv)
    }

    #[test]
    fn test_values_are_deduplicated() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_value(value("YieldCurve", "CurveFn"));
        let b = graph.add_value(value("YieldCurve", "CurveFn"));
        assert_eq!(a, b);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_topological_order_puts_inputs_first() {
        let (graph, curve, vol, pv) = sample();
        let order = graph.topological_order().unwrap();
        let pos = |v: &ValueSpecification| order.iter().position(|o| *o == v).unwrap();
        assert!(pos(&curve) < pos(&vol));
        assert!(pos(&vol) < pos(&pv));
        assert_eq!(graph.terminal_outputs(), vec![&pv]);
    }

    #[test]
    fn test_inputs_and_upstream() {
        let (graph, curve, vol, pv) = sample();
        let inputs = graph.inputs_of(&pv).unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs.iter().any(|(_, v)| **v == curve));
        assert!(graph.inputs_of(&curve).unwrap().is_empty());

        let upstream = graph.upstream_from(&[vol.clone()]).unwrap();
        assert_eq!(upstream.len(), 2);
        assert!(upstream.contains(&curve) && upstream.contains(&vol));

        let stranger = value("Delta", "DeltaFn");
        assert!(matches!(graph.inputs_of(&stranger), Err(GraphError::UnknownValue(_))));
    }

    #[test]
    fn test_unsatisfied_dependency_is_rejected() {
        let mut graph = DependencyGraph::new();
        let pv = value("PresentValue", "BlackFn");
        let curve = value("YieldCurve", "CurveFn");
        let err = graph.add_dependency(&pv, wants("Forward"), &curve).unwrap_err();
        assert!(matches!(err, GraphError::Unsatisfied { .. }));
        assert!(graph.is_empty());
    }

    struct SameType;

    impl TargetResolver for SameType {
        fn resolves(&self, requested: &TargetSpecification, produced: &TargetSpecification) -> bool {
            requested.target_type() == produced.target_type()
        }
    }

    #[test]
    fn test_dependency_resolved_on_another_target_is_accepted() {
        let resolver = Resolver::with_target_resolver(ResolutionConfig::default(), SameType);
        let elsewhere = TargetSpecification::of(TargetType::Primitive, "CurrencyISO", "EUR").unwrap();
        let req = ValueRequirement::with_constraints(
            "YieldCurve",
            elsewhere,
            ValueProperties::builder().with(CURVE, "Discounting").build().unwrap(),
        )
        .unwrap();
        let curve = value("YieldCurve", "CurveFn");
        let resolved = resolver.resolve(&req, &[curve.clone()]);
        assert_eq!(resolved.len(), 1);

        let pv = value("PresentValue", "BlackFn");
        let mut graph = DependencyGraph::new();
        assert!(matches!(
            graph.add_dependency(&pv, req.clone(), &resolved[0]),
            Err(GraphError::Unsatisfied { .. })
        ));
        graph.add_resolved_dependency(&resolver, &pv, req, &resolved[0]).unwrap();
        assert_eq!(graph.inputs_of(&pv).unwrap().len(), 1);
        assert!(graph.contains(&curve));

        let stranger = Resolver::new(ResolutionConfig::default());
        let other = value("Delta", "DeltaFn");
        assert!(graph.add_resolved_dependency(&stranger, &pv, wants("YieldCurve"), &other).is_err());
    }

    #[test]
    fn test_cycle_is_reported() {
        let (mut graph, curve, _, pv) = sample();
        graph.add_dependency(&curve, wants("PresentValue"), &pv).unwrap();
        assert!(matches!(graph.topological_order(), Err(GraphError::Cycle { .. })));
    }
}
