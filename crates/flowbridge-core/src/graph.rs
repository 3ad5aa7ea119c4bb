//! Graph-form processes.
//!
//! A graph-form process is a bag of nodes plus a connection map keyed by the
//! source node id: `source -> port -> [targets]`.  Declaration order of the
//! nodes carries no execution meaning; only the connections do.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::value::Params;

/// The only output port type either platform produces.
pub const MAIN_PORT: &str = "main";

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Canvas coordinates.  Serialized as a two-element `[x, y]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Position {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position> for [f64; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

fn default_type_version() -> Number {
    Number::from(1)
}

/// A single node of a graph-form process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStep {
    /// Identifier, unique within the process.
    pub id: String,
    /// Display name shown on the canvas.
    pub name: String,
    /// Platform node type (e.g. `n8n-nodes-base.slack`).
    #[serde(rename = "type")]
    pub step_type: String,
    /// Kept exactly as given; node versions may be fractional (`4.2`).
    #[serde(default = "default_type_version")]
    pub type_version: Number,
    /// Canvas position; purely cosmetic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default)]
    pub parameters: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Params>,
}

impl GraphStep {
    /// Create a step with version 1, no position and no parameters.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        step_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            step_type: step_type.into(),
            type_version: default_type_version(),
            position: None,
            parameters: Params::new(),
            credentials: None,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn with_parameters(mut self, parameters: Params) -> Self {
        self.parameters = parameters;
        self
    }

    /// Whole-number part of the type version, at least 1.
    pub fn major_version(&self) -> u32 {
        self.type_version
            .as_f64()
            .map_or(1, |v| v.trunc().max(1.0) as u32)
    }
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// One edge: the target node, the port type and the target input index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub node: String,
    #[serde(rename = "type")]
    pub port: String,
    pub index: u32,
}

impl Connection {
    /// An edge into input 0 over the `main` port.
    pub fn main(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: MAIN_PORT.to_owned(),
            index: 0,
        }
    }
}

/// The connection map of a graph-form process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Connections(IndexMap<String, IndexMap<String, Vec<Connection>>>);

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|ports| ports.values().all(Vec::is_empty))
    }

    /// Total number of edges across all sources and ports.
    pub fn edge_count(&self) -> usize {
        self.0
            .values()
            .flat_map(|ports| ports.values())
            .map(Vec::len)
            .sum()
    }

    /// The output ports of `source`, in declaration order.
    pub fn outputs(&self, source: &str) -> Option<&IndexMap<String, Vec<Connection>>> {
        self.0.get(source)
    }

    /// All targets of `source`, ports flattened in port-then-target order.
    pub fn targets<'a>(&'a self, source: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .get(source)
            .into_iter()
            .flat_map(|ports| ports.values())
            .flatten()
            .map(|c| c.node.as_str())
    }

    /// Every node id that appears as the target of at least one edge.
    pub fn targeted(&self) -> HashSet<&str> {
        self.0
            .values()
            .flat_map(|ports| ports.values())
            .flatten()
            .map(|c| c.node.as_str())
            .collect()
    }

    /// Iterate `(source, connection)` pairs in map order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &Connection)> {
        self.0.iter().flat_map(|(source, ports)| {
            ports
                .values()
                .flatten()
                .map(move |c| (source.as_str(), c))
        })
    }

    /// Add a `main` edge from `source` to `target` unless it already exists.
    pub fn link(&mut self, source: &str, target: &str) {
        let links = self
            .0
            .entry(source.to_owned())
            .or_default()
            .entry(MAIN_PORT.to_owned())
            .or_default();
        if !links.iter().any(|c| c.node == target) {
            links.push(Connection::main(target));
        }
    }

    /// Point every edge `source -> old` at `new` instead.
    ///
    /// Returns whether any edge was rewritten.
    pub fn redirect(&mut self, source: &str, old: &str, new: &str) -> bool {
        let Some(ports) = self.0.get_mut(source) else {
            return false;
        };
        let mut changed = false;
        for links in ports.values_mut() {
            for link in links.iter_mut().filter(|c| c.node == old) {
                link.node = new.to_owned();
                changed = true;
            }
        }
        changed
    }

    /// Splice `node` in between `before` and `after`.
    ///
    /// An existing `before -> after` edge is rerouted through `node`; missing
    /// neighbours simply produce the single remaining edge.
    pub fn splice(&mut self, before: Option<&str>, node: &str, after: Option<&str>) {
        match (before, after) {
            (Some(b), Some(a)) => {
                if !self.redirect(b, a, node) {
                    self.link(b, node);
                }
                self.link(node, a);
            }
            (Some(b), None) => self.link(b, node),
            (None, Some(a)) => self.link(node, a),
            (None, None) => {}
        }
    }

    /// Remove `node`, connecting each of its predecessors straight to each of
    /// its successors.
    ///
    /// A node without successors leaves its predecessors' edges dropped; a
    /// node without predecessors just loses its outgoing edges.
    pub fn bypass(&mut self, node: &str) {
        let mut successors: Vec<String> = Vec::new();
        for target in self.targets(node) {
            if target != node && !successors.iter().any(|s| s == target) {
                successors.push(target.to_owned());
            }
        }

        self.0.shift_remove(node);

        for (source, ports) in self.0.iter_mut() {
            for links in ports.values_mut() {
                if !links.iter().any(|c| c.node == node) {
                    continue;
                }
                let mut rebuilt: Vec<Connection> = Vec::with_capacity(links.len());
                for link in links.drain(..) {
                    if link.node != node {
                        rebuilt.push(link);
                        continue;
                    }
                    for succ in &successors {
                        if succ != source && !rebuilt.iter().any(|c| &c.node == succ) {
                            rebuilt.push(Connection {
                                node: succ.clone(),
                                port: link.port.clone(),
                                index: link.index,
                            });
                        }
                    }
                }
                *links = rebuilt;
            }
        }

        self.prune();
    }

    /// Drop empty port lists and sources without ports.
    fn prune(&mut self) {
        for ports in self.0.values_mut() {
            ports.retain(|_, links| !links.is_empty());
        }
        self.0.retain(|_, ports| !ports.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// A complete graph-form process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphProcess {
    /// Remote identifier, when the process was fetched from the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub nodes: Vec<GraphStep>,
    #[serde(default)]
    pub connections: Connections,
    #[serde(default)]
    pub settings: Params,
    #[serde(default)]
    pub static_data: Params,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl GraphProcess {
    /// An inactive process with no steps.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn step(&self, id: &str) -> Option<&GraphStep> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(ids: &[&str]) -> Connections {
        let mut c = Connections::new();
        for pair in ids.windows(2) {
            c.link(pair[0], pair[1]);
        }
        c
    }

    #[test]
    fn link_is_idempotent() {
        let mut c = Connections::new();
        c.link("a", "b");
        c.link("a", "b");
        assert_eq!(c.edge_count(), 1);
        assert_eq!(c.targets("a").collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn splice_reroutes_existing_edge() {
        let mut c = chain(&["a", "b"]);
        c.splice(Some("a"), "x", Some("b"));
        assert_eq!(c.targets("a").collect::<Vec<_>>(), ["x"]);
        assert_eq!(c.targets("x").collect::<Vec<_>>(), ["b"]);
        assert_eq!(c.edge_count(), 2);
    }

    #[test]
    fn bypass_middle_bridges_neighbours() {
        let mut c = chain(&["a", "b", "c"]);
        c.bypass("b");
        assert_eq!(c.edge_count(), 1);
        assert_eq!(c.targets("a").collect::<Vec<_>>(), ["c"]);
    }

    #[test]
    fn bypass_ends_leave_no_dangling_edges() {
        let mut head = chain(&["a", "b", "c"]);
        head.bypass("a");
        assert_eq!(head.edge_count(), 1);
        assert!(head.outputs("a").is_none());

        let mut tail = chain(&["a", "b", "c"]);
        tail.bypass("c");
        assert_eq!(tail.edge_count(), 1);
        assert!(!tail.targeted().contains("c"));
    }

    #[test]
    fn position_serializes_as_pair() {
        let step = GraphStep::new("s1", "Slack", "n8n-nodes-base.slack").with_position(250.0, 300.0);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["position"], serde_json::json!([250.0, 300.0]));
        assert_eq!(json["type"], "n8n-nodes-base.slack");
        assert_eq!(json["typeVersion"], 1);
    }

    #[test]
    fn deserializes_platform_json() {
        let raw = serde_json::json!({
            "name": "Demo",
            "active": true,
            "nodes": [
                {"id": "a", "name": "A", "type": "t", "typeVersion": 2, "position": [0, 0], "parameters": {}}
            ],
            "connections": {"a": {"main": [{"node": "b", "type": "main", "index": 0}]}},
            "staticData": {}
        });
        let process: GraphProcess = serde_json::from_value(raw).unwrap();
        assert!(process.active);
        assert_eq!(process.nodes[0].type_version, Number::from(2));
        assert_eq!(process.connections.targets("a").collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn fractional_type_version_passes_through() {
        let raw = serde_json::json!({
            "id": "h", "name": "HTTP", "type": "n8n-nodes-base.httpRequest", "typeVersion": 4.2
        });
        let step: GraphStep = serde_json::from_value(raw).unwrap();
        assert_eq!(step.major_version(), 4);
        let back = serde_json::to_value(&step).unwrap();
        assert_eq!(back["typeVersion"], serde_json::json!(4.2));
    }
}
