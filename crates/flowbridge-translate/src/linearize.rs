//! Graph to sequence linearization.
//!
//! Flattens an arbitrary node graph into a strictly sequential module chain:
//!
//! 1. The start step is the first declared step nobody connects into.  A graph
//!    without one (every step sits on a cycle) starts from the first declared
//!    step instead, with a warning.
//! 2. Breadth-first traversal over outgoing connections, ports in map order
//!    and targets in list order.  Each step is visited once; connections to
//!    steps that do not exist are ignored.
//! 3. Steps the traversal never reached are appended in declaration order,
//!    with a warning.
//!
//! Branches and merges are therefore serialized; the sequential platform has
//! no way to express them.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::debug;

use flowbridge_core::registry::GENERIC_MODULE_TYPE;
use flowbridge_core::{
    BridgeError, GraphProcess, GraphStep, LayoutConfig, Module, Result, ServiceRegistry,
    split_params,
};

/// Modules produced from a graph, plus anything worth telling the caller.
#[derive(Debug, Clone, Default)]
pub struct Linearized {
    pub modules: Vec<Module>,
    pub warnings: Vec<String>,
}

/// Converts graph-form steps into a sequential module chain.
#[derive(Debug, Clone)]
pub struct Linearizer {
    registry: Arc<ServiceRegistry>,
    layout: LayoutConfig,
}

impl Linearizer {
    pub fn new(registry: Arc<ServiceRegistry>, layout: LayoutConfig) -> Self {
        Self { registry, layout }
    }

    /// Execution order of `process`'s steps.
    ///
    /// Fails only when two steps share an id.
    pub fn execution_order<'a>(
        &self,
        process: &'a GraphProcess,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<&'a GraphStep>> {
        let mut by_id: HashMap<&str, &GraphStep> = HashMap::with_capacity(process.nodes.len());
        for step in &process.nodes {
            if by_id.insert(step.id.as_str(), step).is_some() {
                return Err(BridgeError::DuplicateStepId {
                    process: process.name.clone(),
                    id: step.id.clone(),
                });
            }
        }

        let Some(first) = process.nodes.first() else {
            return Ok(Vec::new());
        };

        let targeted = process.connections.targeted();
        let start = match process.nodes.iter().find(|s| !targeted.contains(s.id.as_str())) {
            Some(step) => step,
            None => {
                warnings.push(format!(
                    "process `{}` has no start step (every step has an incoming connection); \
                     starting from `{}` in declaration order",
                    process.name, first.name
                ));
                first
            }
        };

        let mut order: Vec<&GraphStep> = Vec::with_capacity(process.nodes.len());
        let mut visited: HashSet<&str> = HashSet::with_capacity(process.nodes.len());
        let mut queue: VecDeque<&GraphStep> = VecDeque::from([start]);
        visited.insert(start.id.as_str());

        while let Some(step) = queue.pop_front() {
            order.push(step);
            for target in process.connections.targets(&step.id) {
                let Some(&next) = by_id.get(target) else {
                    debug!(source = %step.id, target, "skipping connection to missing step");
                    continue;
                };
                if visited.insert(next.id.as_str()) {
                    queue.push_back(next);
                }
            }
        }

        let unreachable: Vec<&GraphStep> = process
            .nodes
            .iter()
            .filter(|s| !visited.contains(s.id.as_str()))
            .collect();
        if !unreachable.is_empty() {
            warnings.push(format!(
                "{} step(s) unreachable from `{}` appended in declaration order",
                unreachable.len(),
                start.name
            ));
            order.extend(unreachable);
        }

        Ok(order)
    }

    /// Convert `process`'s steps into densely numbered modules.
    pub fn linearize(&self, process: &GraphProcess) -> Result<Linearized> {
        let mut warnings = Vec::new();
        let order = self.execution_order(process, &mut warnings)?;

        let mut modules: Vec<Module> = Vec::with_capacity(order.len());
        for (index, step) in order.into_iter().enumerate() {
            let module_type = match self.registry.module_type_for_graph_type(&step.step_type) {
                Some(t) => t.to_owned(),
                None => {
                    warnings.push(format!(
                        "step `{}` has unmapped type `{}`; using generic HTTP module",
                        step.name, step.step_type
                    ));
                    GENERIC_MODULE_TYPE.to_owned()
                }
            };

            let (x, y) = match (step.position, modules.last().and_then(Module::designer)) {
                (Some(p), _) => (p.x, p.y),
                (None, Some(prev)) => (prev.x + self.layout.spacing, prev.y),
                (None, None) => (self.layout.origin_x, self.layout.baseline_y),
            };

            let (parameters, mapper) = split_params(&step.parameters);
            let id = u32::try_from(index + 1)
                .map_err(|_| BridgeError::Internal("too many steps to number".into()))?;

            let mut module = Module::new(id, module_type).with_designer(x, y);
            module.version = step.major_version();
            module.parameters = parameters;
            module.mapper = mapper;
            module.set_name(step.name.clone());

            debug!(
                step = %step.id,
                module_id = id,
                module_type = %module.module,
                "linearized step"
            );
            modules.push(module);
        }

        Ok(Linearized { modules, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowbridge_core::params_from_json;
    use serde_json::json;

    fn linearizer() -> Linearizer {
        Linearizer::new(Arc::new(ServiceRegistry::builtin()), LayoutConfig::default())
    }

    fn step(id: &str, step_type: &str) -> GraphStep {
        GraphStep::new(id, id.to_uppercase(), format!("n8n-nodes-base.{step_type}"))
    }

    fn names(linearized: &Linearized) -> Vec<String> {
        linearized.modules.iter().map(Module::display_name).collect()
    }

    #[test]
    fn follows_connections_not_declaration_order() {
        let mut process = GraphProcess::new("p");
        process.nodes = vec![step("c", "slack"), step("a", "webhook"), step("b", "gmail")];
        process.connections.link("a", "b");
        process.connections.link("b", "c");

        let out = linearizer().linearize(&process).unwrap();
        assert_eq!(names(&out), ["A", "B", "C"]);
        assert_eq!(out.modules.iter().map(|m| m.id).collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(out.modules[0].module, "webhook");
        assert_eq!(out.modules[2].module, "slack.slack");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn branches_are_serialized_breadth_first() {
        let mut process = GraphProcess::new("fan-out");
        process.nodes = vec![
            step("t", "webhook"),
            step("x", "slack"),
            step("y", "gmail"),
            step("z", "notion"),
        ];
        process.connections.link("t", "x");
        process.connections.link("t", "y");
        process.connections.link("x", "z");

        let out = linearizer().linearize(&process).unwrap();
        assert_eq!(names(&out), ["T", "X", "Y", "Z"]);
    }

    #[test]
    fn cycle_falls_back_to_declaration_order() {
        let mut process = GraphProcess::new("loop");
        process.nodes = vec![step("a", "slack"), step("b", "gmail")];
        process.connections.link("a", "b");
        process.connections.link("b", "a");

        let out = linearizer().linearize(&process).unwrap();
        assert_eq!(names(&out), ["A", "B"]);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("no start step"));
    }

    #[test]
    fn unreachable_steps_are_appended_with_warning() {
        let mut process = GraphProcess::new("islands");
        process.nodes = vec![step("a", "webhook"), step("b", "slack"), step("lonely", "notion")];
        process.connections.link("a", "b");
        process.connections.link("a", "ghost");

        let out = linearizer().linearize(&process).unwrap();
        assert_eq!(names(&out), ["A", "B", "LONELY"]);
        assert_eq!(out.warnings, ["1 step(s) unreachable from `A` appended in declaration order"]);
    }

    #[test]
    fn designer_positions() {
        let mut process = GraphProcess::new("layout");
        process.nodes = vec![
            step("a", "webhook"),
            step("b", "slack").with_position(900.0, 120.0),
            step("c", "gmail"),
        ];
        process.connections.link("a", "b");
        process.connections.link("b", "c");

        let out = linearizer().linearize(&process).unwrap();
        let xy: Vec<(f64, f64)> = out
            .modules
            .iter()
            .map(|m| {
                let d = m.designer().unwrap();
                (d.x, d.y)
            })
            .collect();
        assert_eq!(xy, [(250.0, 300.0), (900.0, 120.0), (1150.0, 120.0)]);
    }

    #[test]
    fn parameters_are_split() {
        let mut process = GraphProcess::new("params");
        process.nodes = vec![step("s", "slack").with_parameters(params_from_json(json!({
            "channel": "#ops",
            "text": "{{$json.summary}}"
        })))];

        let out = linearizer().linearize(&process).unwrap();
        let module = &out.modules[0];
        assert!(module.parameters.contains_key("channel"));
        assert!(module.mapper.contains_key("text"));
    }

    #[test]
    fn fractional_node_version_keeps_major_part() {
        let mut http = step("h", "httpRequest");
        http.type_version = serde_json::Number::from_f64(4.2).unwrap();
        let mut process = GraphProcess::new("versions");
        process.nodes = vec![http];

        let out = linearizer().linearize(&process).unwrap();
        assert_eq!(out.modules[0].version, 4);
    }

    #[test]
    fn unmapped_type_warns_and_uses_http() {
        let mut process = GraphProcess::new("odd");
        process.nodes = vec![step("f", "ftp")];

        let out = linearizer().linearize(&process).unwrap();
        assert_eq!(out.modules[0].module, "http");
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("n8n-nodes-base.ftp"));
    }

    #[test]
    fn duplicate_ids_are_fatal() {
        let mut process = GraphProcess::new("dup");
        process.nodes = vec![step("a", "slack"), step("a", "gmail")];

        let err = linearizer().linearize(&process).unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateStepId { ref id, .. } if id == "a"));
    }

    #[test]
    fn empty_graph_yields_no_modules() {
        let out = linearizer().linearize(&GraphProcess::new("empty")).unwrap();
        assert!(out.modules.is_empty());
        assert!(out.warnings.is_empty());
    }
}
