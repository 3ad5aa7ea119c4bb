//! Whole-process translation.
//!
//! [`GraphToSequence`] and [`SequenceToGraph`] wrap the linearizer and the
//! expander with the process-level bookkeeping (names, scheduling, scoping)
//! and fold every failure into a [`TranslationResult`].  [`TranslationEngine`]
//! bundles both directions behind a single [`Process`]-level call.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, instrument, warn};

use flowbridge_core::{
    BridgeConfig, GraphProcess, ParamValue, Params, Process, Result, ScheduleConfig,
    SequentialProcess, ServiceRegistry, TranslationContext, TranslationResult,
};

use crate::expand::Expander;
use crate::linearize::Linearizer;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One direction of process conversion.
#[async_trait]
pub trait Translate: Send + Sync {
    type Source: Sync;
    type Target: Send;

    /// Convert a single process.  Never fails outright: errors land in the
    /// returned result.
    async fn translate(
        &self,
        source: &Self::Source,
        ctx: &TranslationContext,
    ) -> TranslationResult<Self::Target>;

    /// Convert every process independently, polling them concurrently.
    ///
    /// Results come back in input order; one failure does not affect the
    /// others.
    async fn translate_batch(
        &self,
        sources: &[Self::Source],
        ctx: &TranslationContext,
    ) -> Vec<TranslationResult<Self::Target>> {
        join_all(sources.iter().map(|source| self.translate(source, ctx))).await
    }
}

fn finish<T>(name: &str, result: Result<T>, warnings: Vec<String>) -> TranslationResult<T> {
    match &result {
        Ok(_) => info!(process = %name, warnings = warnings.len(), "translation complete"),
        Err(e) => warn!(process = %name, error = %e, "translation failed"),
    }
    for warning in &warnings {
        warn!(process = %name, %warning, "degraded translation");
    }
    TranslationResult::from_result(result, warnings)
}

// ---------------------------------------------------------------------------
// Graph -> sequence
// ---------------------------------------------------------------------------

/// Converts graph-form processes into sequential ones.
#[derive(Debug, Clone)]
pub struct GraphToSequence {
    linearizer: Linearizer,
    schedule: ScheduleConfig,
}

impl GraphToSequence {
    pub fn new(registry: Arc<ServiceRegistry>, config: &BridgeConfig) -> Self {
        Self {
            linearizer: Linearizer::new(registry, config.layout.clone()),
            schedule: config.schedule.clone(),
        }
    }

    fn convert(
        &self,
        source: &GraphProcess,
        ctx: &TranslationContext,
        warnings: &mut Vec<String>,
    ) -> Result<SequentialProcess> {
        let linearized = self.linearizer.linearize(source)?;
        warnings.extend(linearized.warnings);

        let mut process = SequentialProcess::new(source.name.clone());
        process.blueprint.flow = linearized.modules;
        process.blueprint.metadata = Params::from([
            ("version".to_owned(), ParamValue::from(1_i64)),
            ("scenario".to_owned(), ParamValue::from(source.name.as_str())),
        ]);
        process.team_id = ctx.team_id.clone();
        process.organization_id = ctx.organization_id.clone();
        if source.active {
            process.scheduling = Some(self.schedule.scheduling());
        }
        Ok(process)
    }
}

#[async_trait]
impl Translate for GraphToSequence {
    type Source = GraphProcess;
    type Target = SequentialProcess;

    #[instrument(skip_all, fields(process = %source.name, steps = source.nodes.len()))]
    async fn translate(
        &self,
        source: &GraphProcess,
        ctx: &TranslationContext,
    ) -> TranslationResult<SequentialProcess> {
        let mut warnings = Vec::new();
        let result = self.convert(source, ctx, &mut warnings);
        finish(&source.name, result, warnings)
    }
}

// ---------------------------------------------------------------------------
// Sequence -> graph
// ---------------------------------------------------------------------------

/// Converts sequential-form processes into graph ones.
#[derive(Debug, Clone)]
pub struct SequenceToGraph {
    expander: Expander,
}

impl SequenceToGraph {
    pub fn new(registry: Arc<ServiceRegistry>, config: &BridgeConfig) -> Self {
        Self {
            expander: Expander::new(registry, config.layout.clone()),
        }
    }

    fn convert(
        &self,
        source: &SequentialProcess,
        ctx: &TranslationContext,
        warnings: &mut Vec<String>,
    ) -> Result<GraphProcess> {
        let expanded = self.expander.expand(source)?;
        warnings.extend(expanded.warnings);

        let name = if source.name.is_empty() {
            source.blueprint.name.clone()
        } else {
            source.name.clone()
        };

        let mut process = GraphProcess::new(name);
        process.active = ctx.default_active.unwrap_or(false);
        process.nodes = expanded.nodes;
        process.connections = expanded.connections;
        Ok(process)
    }
}

#[async_trait]
impl Translate for SequenceToGraph {
    type Source = SequentialProcess;
    type Target = GraphProcess;

    #[instrument(skip_all, fields(process = %source.name, modules = source.blueprint.flow.len()))]
    async fn translate(
        &self,
        source: &SequentialProcess,
        ctx: &TranslationContext,
    ) -> TranslationResult<GraphProcess> {
        let mut warnings = Vec::new();
        let result = self.convert(source, ctx, &mut warnings);
        finish(&source.name, result, warnings)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Both translation directions sharing one registry and configuration.
#[derive(Debug, Clone)]
pub struct TranslationEngine {
    to_sequence: GraphToSequence,
    to_graph: SequenceToGraph,
}

impl TranslationEngine {
    pub fn new(registry: Arc<ServiceRegistry>, config: &BridgeConfig) -> Self {
        Self {
            to_sequence: GraphToSequence::new(Arc::clone(&registry), config),
            to_graph: SequenceToGraph::new(registry, config),
        }
    }

    /// Engine over the built-in registry and default configuration.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(ServiceRegistry::builtin()), &BridgeConfig::default())
    }

    pub fn graph_to_sequence(&self) -> &GraphToSequence {
        &self.to_sequence
    }

    pub fn sequence_to_graph(&self) -> &SequenceToGraph {
        &self.to_graph
    }

    /// Convert `process` into the other platform's form.
    pub async fn convert(
        &self,
        process: &Process,
        ctx: &TranslationContext,
    ) -> TranslationResult<Process> {
        match process {
            Process::Graph(p) => self.to_sequence.translate(p, ctx).await.map(Process::from),
            Process::Sequential(p) => self.to_graph.translate(p, ctx).await.map(Process::from),
        }
    }

    /// [`convert`](Self::convert) every process concurrently.
    pub async fn convert_batch(
        &self,
        processes: &[Process],
        ctx: &TranslationContext,
    ) -> Vec<TranslationResult<Process>> {
        join_all(processes.iter().map(|p| self.convert(p, ctx))).await
    }
}

impl Default for TranslationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use flowbridge_core::{GraphStep, Module, ScheduleUnit, Scheduling};

    fn graph(name: &str, types: &[&str]) -> GraphProcess {
        let mut p = GraphProcess::new(name);
        for (i, t) in types.iter().enumerate() {
            p.nodes.push(GraphStep::new(
                format!("n{i}"),
                format!("Step {i}"),
                format!("n8n-nodes-base.{t}"),
            ));
        }
        for i in 1..types.len() {
            p.connections.link(&format!("n{}", i - 1), &format!("n{i}"));
        }
        p
    }

    #[tokio::test]
    async fn graph_to_sequence_sets_metadata_and_scope() {
        let engine = TranslationEngine::with_defaults();
        let mut source = graph("Digest", &["scheduleTrigger", "gmail", "slack"]);
        source.active = true;
        let ctx = TranslationContext::new().with_team("t-1").with_organization("o-1");

        let result = engine.graph_to_sequence().translate(&source, &ctx).await;
        assert!(result.success, "{:?}", result.errors);
        let out = result.data.unwrap();
        assert_eq!(out.name, "Digest");
        assert_eq!(out.blueprint.name, "Digest");
        assert_eq!(out.blueprint.metadata["version"], ParamValue::from(1_i64));
        assert_eq!(out.blueprint.metadata["scenario"], ParamValue::from("Digest"));
        assert_eq!(out.team_id.as_deref(), Some("t-1"));
        assert_eq!(out.organization_id.as_deref(), Some("o-1"));
        assert_eq!(out.scheduling, Some(Scheduling::recurring(15, ScheduleUnit::Minutes)));
        assert_eq!(
            out.modules().iter().map(|m| m.module.as_str()).collect::<Vec<_>>(),
            ["schedule", "google.gmail", "slack.slack"]
        );
    }

    #[tokio::test]
    async fn inactive_graph_has_no_schedule() {
        let engine = TranslationEngine::with_defaults();
        let result = engine
            .graph_to_sequence()
            .translate(&graph("Idle", &["webhook"]), &TranslationContext::new())
            .await;
        assert!(result.data.unwrap().scheduling.is_none());
    }

    #[tokio::test]
    async fn sequence_to_graph_name_and_activation() {
        let engine = TranslationEngine::with_defaults();
        let mut source = SequentialProcess::new("");
        source.blueprint.name = "From blueprint".into();
        source.blueprint.flow = vec![Module::new(1, "webhook"), Module::new(2, "slack.slack")];

        let inactive = engine
            .sequence_to_graph()
            .translate(&source, &TranslationContext::new())
            .await
            .data
            .unwrap();
        assert_eq!(inactive.name, "From blueprint");
        assert!(!inactive.active);
        assert!(inactive.settings.is_empty());

        let active = engine
            .sequence_to_graph()
            .translate(&source, &TranslationContext::new().active(true))
            .await
            .data
            .unwrap();
        assert!(active.active);
    }

    #[tokio::test]
    async fn malformed_input_becomes_failed_result() {
        let engine = TranslationEngine::with_defaults();
        let mut source = SequentialProcess::new("dup");
        source.blueprint.flow = vec![Module::new(1, "http"), Module::new(1, "http")];

        let result = engine.convert(&source.into(), &TranslationContext::new()).await;
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("duplicate module id 1"));
    }

    #[tokio::test]
    async fn empty_input_converts_to_empty_output() {
        let engine = TranslationEngine::with_defaults();
        let result = engine
            .convert(&GraphProcess::new("nothing").into(), &TranslationContext::new())
            .await;
        assert!(result.success);
        assert_eq!(result.data.unwrap().step_count(), 0);
    }
}
