//! Platform-agnostic process wrapper.

use serde::{Deserialize, Serialize};

use crate::graph::GraphProcess;
use crate::sequence::SequentialProcess;

/// The two supported platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Node-and-connection graphs.
    Graph,
    /// Numbered module sequences.
    Sequential,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Graph => write!(f, "graph"),
            Self::Sequential => write!(f, "sequential"),
        }
    }
}

/// A process in either form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "platform", content = "process")]
pub enum Process {
    Graph(GraphProcess),
    Sequential(SequentialProcess),
}

impl Process {
    pub fn platform(&self) -> Platform {
        match self {
            Self::Graph(_) => Platform::Graph,
            Self::Sequential(_) => Platform::Sequential,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Graph(p) => &p.name,
            Self::Sequential(p) => &p.name,
        }
    }

    /// Number of steps (nodes or modules).
    pub fn step_count(&self) -> usize {
        match self {
            Self::Graph(p) => p.nodes.len(),
            Self::Sequential(p) => p.blueprint.flow.len(),
        }
    }

    pub fn as_graph(&self) -> Option<&GraphProcess> {
        match self {
            Self::Graph(p) => Some(p),
            Self::Sequential(_) => None,
        }
    }

    pub fn as_sequential(&self) -> Option<&SequentialProcess> {
        match self {
            Self::Sequential(p) => Some(p),
            Self::Graph(_) => None,
        }
    }
}

impl From<GraphProcess> for Process {
    fn from(p: GraphProcess) -> Self {
        Self::Graph(p)
    }
}

impl From<SequentialProcess> for Process {
    fn from(p: SequentialProcess) -> Self {
        Self::Sequential(p)
    }
}
