use crate::graph::DependencyGraph;
use crate::value::ValueSpecification;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// Renders the tree of values `target` was computed from.
///
/// Each value is printed once; later occurrences point back to the level where
/// it was first shown.
pub fn format_trace(graph: &DependencyGraph, target: &ValueSpecification) -> String {
    let mut tracer = Tracer {
        graph,
        visited_at_level: HashMap::new(),
        output: String::new(),
    };

    if graph.contains(target) {
        let _ = writeln!(
            tracer.output,
            "AUDIT TRACE for '{}' on {}:",
            target.value_name(),
            target.target()
        );
        let _ = writeln!(tracer.output, "--------------------------------------------------");
        tracer.trace_value(target, 1, "");
    } else {
        let _ = writeln!(tracer.output, "Error: value not in graph {}", target);
    }
    tracer.output
}

struct Tracer<'a> {
    graph: &'a DependencyGraph,
    visited_at_level: HashMap<&'a ValueSpecification, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_value(&mut self, value: &'a ValueSpecification, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(value) {
            let _ = writeln!(self.output, "{}-> (Ref to L{}) {}", prefix, first_seen, value.value_name());
            return;
        }
        self.visited_at_level.insert(value, level);

        let _ = writeln!(
            self.output,
            "{}[L{}] {} via {} {}",
            prefix,
            level,
            value.value_name(),
            value.function_id(),
            value.properties()
        );

        let mut inputs: Vec<&'a ValueSpecification> = match self.graph.inputs_of(value) {
            Ok(inputs) => inputs.into_iter().map(|(_, input)| input).collect(),
            Err(_) => Vec::new(),
        };
        let mut seen = HashSet::new();
        inputs.retain(|input| seen.insert(*input));
        inputs.sort_by(|a, b| {
            (a.value_name(), a.function_id()).cmp(&(b.value_name(), b.function_id()))
        });

        let stem = build_child_stem(prefix);
        for (i, &input) in inputs.iter().enumerate() {
            let connector = if i == inputs.len() - 1 { "`-- " } else { "|-- " };
            self.trace_value(input, level + 1, &format!("{}{}", stem, connector));
        }
    }
}

fn build_child_stem(current_prefix: &str) -> String {
    current_prefix.replace("`-- ", "    ").replace("|-- ", "|   ")
}
