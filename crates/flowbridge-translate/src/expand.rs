//! Sequence to graph expansion.
//!
//! Every module becomes a node with a fresh identifier, wired to its
//! successor through one `main` connection.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use flowbridge_core::registry::GENERIC_GRAPH_TYPE;
use flowbridge_core::{
    BridgeError, Connections, GraphStep, LayoutConfig, Position, Result, SequentialProcess,
    ServiceRegistry, merge_params,
};

/// Nodes and connections produced from a module chain.
#[derive(Debug, Clone, Default)]
pub struct Expanded {
    pub nodes: Vec<GraphStep>,
    pub connections: Connections,
    pub warnings: Vec<String>,
}

/// Converts a sequential module chain into graph-form steps.
#[derive(Debug, Clone)]
pub struct Expander {
    registry: Arc<ServiceRegistry>,
    layout: LayoutConfig,
}

impl Expander {
    pub fn new(registry: Arc<ServiceRegistry>, layout: LayoutConfig) -> Self {
        Self { registry, layout }
    }

    pub fn expand(&self, process: &SequentialProcess) -> Result<Expanded> {
        let flow = process.modules();

        // Module id -> generated node id, only valid for this pass.
        let mut node_ids: HashMap<u32, String> = HashMap::with_capacity(flow.len());
        for module in flow {
            if node_ids.insert(module.id, Uuid::now_v7().to_string()).is_some() {
                return Err(BridgeError::DuplicateModuleId {
                    process: process.name.clone(),
                    id: module.id,
                });
            }
        }

        let mut out = Expanded::default();
        for (index, module) in flow.iter().enumerate() {
            let step_type = match self.registry.graph_type_for_module_type(&module.module) {
                Some(t) => t.to_owned(),
                None => {
                    out.warnings.push(format!(
                        "module {} has unmapped type `{}`; using generic HTTP node",
                        module.id, module.module
                    ));
                    GENERIC_GRAPH_TYPE.to_owned()
                }
            };

            let position = match module.designer() {
                Some(d) => Position::new(d.x, d.y),
                None => Position::new(self.layout.spacing * index as f64, self.layout.baseline_y),
            };

            let id = node_ids
                .get(&module.id)
                .cloned()
                .ok_or_else(|| BridgeError::Internal(format!("module {} lost its node id", module.id)))?;

            let mut node = GraphStep::new(id, module.display_name(), step_type)
                .with_parameters(merge_params(&module.parameters, &module.mapper));
            node.type_version = module.version.into();
            node.position = Some(position);

            debug!(module_id = module.id, node = %node.id, step_type = %node.step_type, "expanded module");
            out.nodes.push(node);
        }

        for pair in out.nodes.windows(2) {
            out.connections.link(&pair[0].id, &pair[1].id);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowbridge_core::{Module, ParamValue, params_from_json};
    use serde_json::json;

    fn expander() -> Expander {
        Expander::new(Arc::new(ServiceRegistry::builtin()), LayoutConfig::default())
    }

    fn process(modules: Vec<Module>) -> SequentialProcess {
        let mut p = SequentialProcess::new("seq");
        p.blueprint.flow = modules;
        p
    }

    #[test]
    fn chains_adjacent_modules() {
        let p = process(vec![
            Module::new(1, "webhook"),
            Module::new(2, "google.sheets"),
            Module::new(3, "slack.slack"),
        ]);
        let out = expander().expand(&p).unwrap();

        assert_eq!(out.nodes.len(), 3);
        assert_eq!(out.connections.edge_count(), 2);
        assert_eq!(
            out.connections.targets(&out.nodes[0].id).collect::<Vec<_>>(),
            [out.nodes[1].id.as_str()]
        );
        assert!(out.connections.outputs(&out.nodes[2].id).is_none());
        assert_eq!(out.nodes[1].step_type, "n8n-nodes-base.googleSheets");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn names_and_positions() {
        let mut labelled = Module::new(2, "slack.slack").with_designer(10.0, 20.0);
        labelled.set_name("Ping ops");
        let p = process(vec![Module::new(1, "google.gmail"), labelled]);
        let out = expander().expand(&p).unwrap();

        assert_eq!(out.nodes[0].name, "Gmail");
        assert_eq!(out.nodes[0].position, Some(Position::new(0.0, 300.0)));
        assert_eq!(out.nodes[1].name, "Ping ops");
        assert_eq!(out.nodes[1].position, Some(Position::new(10.0, 20.0)));
    }

    #[test]
    fn mapper_wins_on_merge() {
        let mut module = Module::new(1, "slack.slack");
        module.parameters = params_from_json(json!({"channel": "#a", "text": "static"}));
        module.mapper = params_from_json(json!({"text": "{{1.body}}"}));
        let out = expander().expand(&process(vec![module])).unwrap();

        let params = &out.nodes[0].parameters;
        assert_eq!(params["channel"], ParamValue::from("#a"));
        assert_eq!(params["text"], ParamValue::from("{{1.body}}"));
    }

    #[test]
    fn fresh_node_ids() {
        let p = process(vec![Module::new(1, "http"), Module::new(2, "http")]);
        let first = expander().expand(&p).unwrap();
        let second = expander().expand(&p).unwrap();
        assert_ne!(first.nodes[0].id, first.nodes[1].id);
        assert_ne!(first.nodes[0].id, second.nodes[0].id);
    }

    #[test]
    fn unmapped_module_warns() {
        let out = expander().expand(&process(vec![Module::new(1, "ftp")])).unwrap();
        assert_eq!(out.nodes[0].step_type, GENERIC_GRAPH_TYPE);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn duplicate_module_ids_are_fatal() {
        let p = process(vec![Module::new(4, "http"), Module::new(4, "slack.slack")]);
        let err = expander().expand(&p).unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateModuleId { id: 4, .. }));
    }

    #[test]
    fn empty_flow() {
        let out = expander().expand(&process(Vec::new())).unwrap();
        assert!(out.nodes.is_empty());
        assert!(out.connections.is_empty());
    }
}
