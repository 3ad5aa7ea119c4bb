//! Process generation from plain-language descriptions and templates.
//!
//! Every process is first built in graph form.  Sequential output is derived
//! from that graph through the same [`Linearizer`] the translation engine
//! uses, so a generated sequential process is exactly what translating the
//! generated graph would produce.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, instrument};

use flowbridge_core::{
    BridgeConfig, GraphProcess, GraphStep, LayoutConfig, Params, Platform, Process, Result,
    SequentialProcess, ServiceCategory, TranslationResult, merge_params, params_from_json,
    split_params,
};
use flowbridge_translate::Linearizer;

use crate::parser::{Customizations, Intent, IntentParser};
use crate::template::TemplateCatalog;

/// Verb used for naming when the description contains none.
const DEFAULT_VERB: &str = "process";

/// Trigger used when the registry has no entry for the detected kind.
const FALLBACK_TRIGGER: (&str, &str) = ("Webhook", "n8n-nodes-base.webhook");

/// Builds new processes for either platform.
#[derive(Debug, Clone)]
pub struct WorkflowGenerator {
    parser: Arc<IntentParser>,
    catalog: Arc<TemplateCatalog>,
    linearizer: Linearizer,
    layout: LayoutConfig,
}

impl WorkflowGenerator {
    pub fn new(
        parser: Arc<IntentParser>,
        catalog: Arc<TemplateCatalog>,
        config: &BridgeConfig,
    ) -> Self {
        let linearizer = Linearizer::new(Arc::clone(parser.registry()), config.layout.clone());
        Self {
            parser,
            catalog,
            linearizer,
            layout: config.layout.clone(),
        }
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Generate a process from a description.
    ///
    /// A template whose keywords, name or description contain the
    /// space-joined intent keywords is used verbatim (with a `Using template`
    /// warning); otherwise a trigger plus one step per referenced service is
    /// synthesized.
    #[instrument(skip(self), fields(%platform))]
    pub async fn generate(&self, description: &str, platform: Platform) -> TranslationResult<Process> {
        let intent = self.parser.parse(description);
        self.generate_from_intent(&intent, platform).await
    }

    /// Same as [`generate`](Self::generate) for an already parsed intent, so
    /// callers can attach customizations first.
    pub async fn generate_from_intent(
        &self,
        intent: &Intent,
        platform: Platform,
    ) -> TranslationResult<Process> {
        let mut warnings = Vec::new();

        let template = if intent.keywords.is_empty() {
            None
        } else {
            self.catalog
                .find_by_keyword(&intent.keywords.join(" "))
                .into_iter()
                .next()
        };

        let graph = match template {
            Some(template) => {
                info!(template = %template.id, "generating from matching template");
                warnings.push(format!("Using template: {}", template.name));
                template.graph.clone()
            }
            None => self.synthesize(intent),
        };

        let result = self.materialize(graph, platform, intent.customizations.as_ref(), &mut warnings);
        TranslationResult::from_result(result, warnings)
    }

    /// Instantiate a template by id for `platform`, merging `customizations`
    /// into the matching steps.
    #[instrument(skip(self, customizations), fields(%platform))]
    pub async fn generate_from_template(
        &self,
        template_id: &str,
        platform: Platform,
        customizations: Option<&Customizations>,
    ) -> TranslationResult<Process> {
        let mut warnings = Vec::new();
        let result = self.catalog.get(template_id).and_then(|template| {
            self.materialize(template.graph.clone(), platform, customizations, &mut warnings)
        });
        TranslationResult::from_result(result, warnings)
    }

    // -- Synthesis ----------------------------------------------------------

    /// Trigger followed by one step per service, wired in a line.
    pub fn synthesize(&self, intent: &Intent) -> GraphProcess {
        let registry = self.parser.registry();
        let (trigger_name, trigger_type) = registry
            .trigger(intent.trigger)
            .map(|t| (t.name.clone(), t.graph_type.clone()))
            .unwrap_or_else(|| (FALLBACK_TRIGGER.0.to_owned(), FALLBACK_TRIGGER.1.to_owned()));

        let mut process = GraphProcess::new(self.workflow_name(intent, &trigger_name));
        process.tags = intent.keywords.clone();
        process.nodes.push(
            GraphStep::new("trigger", trigger_name, trigger_type)
                .with_position(self.layout.origin_x, self.layout.baseline_y),
        );

        for (index, service) in intent.services.iter().enumerate() {
            let x = self.layout.origin_x + self.layout.spacing * (index as f64 + 1.0);
            let step = GraphStep::new(
                format!("{service}_{index}"),
                registry.display_name(service),
                registry.graph_type(service),
            )
            .with_position(x, self.layout.baseline_y)
            .with_parameters(self.default_parameters(service));
            process.nodes.push(step);
        }

        let ids: Vec<String> = process.nodes.iter().map(|n| n.id.clone()).collect();
        for pair in ids.windows(2) {
            process.connections.link(&pair[0], &pair[1]);
        }

        debug!(name = %process.name, steps = process.nodes.len(), "synthesized process");
        process
    }

    /// `Create: Gmail + Slack`.  Only the first two services are named; with
    /// none, the trigger stands in.
    fn workflow_name(&self, intent: &Intent, trigger_name: &str) -> String {
        let verb = intent.verbs.first().map_or(DEFAULT_VERB, String::as_str);
        let registry = self.parser.registry();
        let services: Vec<String> = intent
            .services
            .iter()
            .take(2)
            .map(|s| registry.display_name(s))
            .collect();
        let subject = if services.is_empty() {
            trigger_name.to_owned()
        } else {
            services.join(" + ")
        };
        format!("{}: {subject}", capitalize(verb))
    }

    /// Parameters a freshly synthesized step starts with.
    fn default_parameters(&self, service: &str) -> Params {
        let is_ai = self
            .parser
            .registry()
            .get(service)
            .is_some_and(|m| m.category == ServiceCategory::Ai);
        if !is_ai {
            return Params::new();
        }
        params_from_json(json!({
            "operation": "message",
            "messages": { "values": [{ "role": "user", "content": "{{$json.content}}" }] }
        }))
    }

    // -- Output -------------------------------------------------------------

    /// Apply customizations and convert to the requested platform.
    ///
    /// Graph customizations are keyed by node name, sequential ones by module
    /// type.
    fn materialize(
        &self,
        mut graph: GraphProcess,
        platform: Platform,
        customizations: Option<&Customizations>,
        warnings: &mut Vec<String>,
    ) -> Result<Process> {
        match platform {
            Platform::Graph => {
                if let Some(custom) = customizations {
                    for node in &mut graph.nodes {
                        if let Some(overrides) = custom.get(&node.name) {
                            node.parameters = merge_params(&node.parameters, overrides);
                        }
                    }
                }
                Ok(Process::Graph(graph))
            }
            Platform::Sequential => {
                let linearized = self.linearizer.linearize(&graph)?;
                warnings.extend(linearized.warnings);

                let mut process = SequentialProcess::new(graph.name.clone());
                process.blueprint.flow = linearized.modules;
                if let Some(custom) = customizations {
                    for module in &mut process.blueprint.flow {
                        if let Some(overrides) = custom.get(&module.module) {
                            let combined = merge_params(
                                &merge_params(&module.parameters, &module.mapper),
                                overrides,
                            );
                            (module.parameters, module.mapper) = split_params(&combined);
                        }
                    }
                }
                Ok(Process::Sequential(process))
            }
        }
    }
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use flowbridge_core::{ParamValue, ServiceRegistry};

    fn generator() -> WorkflowGenerator {
        let parser = IntentParser::new(Arc::new(ServiceRegistry::builtin())).unwrap();
        WorkflowGenerator::new(
            Arc::new(parser),
            Arc::new(TemplateCatalog::builtin()),
            &BridgeConfig::default(),
        )
    }

    #[tokio::test]
    async fn synthesizes_trigger_and_services() {
        let result = generator()
            .generate("create a workflow that reads Gmail and posts to Slack", Platform::Graph)
            .await;
        assert!(result.success);
        assert!(result.warnings.is_empty());

        let Some(Process::Graph(graph)) = result.data else {
            panic!("expected graph output");
        };
        assert_eq!(graph.name, "Create: Gmail + Slack");
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.nodes[0].step_type, "n8n-nodes-base.gmailTrigger");
        assert_eq!(graph.nodes[1].id, "gmail_0");
        assert_eq!(graph.nodes[2].step_type, "n8n-nodes-base.slack");
        assert_eq!(graph.connections.edge_count(), 2);
        assert_eq!(graph.connections.targets("trigger").collect::<Vec<_>>(), ["gmail_0"]);
        assert_eq!(graph.connections.targets("gmail_0").collect::<Vec<_>>(), ["slack_1"]);
        assert_eq!(graph.tags, ["gmail", "slack", "create", "read"]);
        assert!(!graph.active);
        assert_eq!(graph.nodes[2].position.map(|p| p.x), Some(750.0));
    }

    #[tokio::test]
    async fn ai_steps_get_message_defaults() {
        let result = generator()
            .generate("every hourly batch, summarize it", Platform::Graph)
            .await;
        let Some(Process::Graph(graph)) = result.data else {
            panic!("expected graph output");
        };
        assert_eq!(graph.name, "Summarize: OpenAI");
        assert_eq!(graph.nodes[0].name, "Schedule");
        let ai = &graph.nodes[1];
        assert_eq!(ai.parameters["operation"], ParamValue::from("message"));
        assert!(ai.parameters.contains_key("messages"));
    }

    #[tokio::test]
    async fn single_keyword_hits_template() {
        let result = generator()
            .generate("notify the team on slack", Platform::Graph)
            .await;
        assert_eq!(result.warnings, ["Using template: AI Email Summarizer"]);
        let process = result.data.unwrap();
        assert_eq!(process.name(), "AI Email Summarizer");
        assert_eq!(process.step_count(), 3);
    }

    #[tokio::test]
    async fn sequential_output_splits_mapper_fields() {
        let result = generator()
            .generate("summarize incoming webhooks", Platform::Sequential)
            .await;
        let Some(Process::Sequential(process)) = result.data else {
            panic!("expected sequential output");
        };
        let modules = process.modules();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].module, "webhook");
        assert_eq!(modules[1].module, "openai");
        assert!(modules[1].parameters.contains_key("operation"));
        // `messages` holds an expression only in a nested value.
        assert!(modules[1].parameters.contains_key("messages"));
        assert_eq!(process.blueprint.name, process.name);
    }

    #[tokio::test]
    async fn template_customizations_per_platform() {
        let builder = generator();

        let mut by_name = Customizations::new();
        by_name.insert(
            "Send to Slack".into(),
            params_from_json(json!({ "channel": "#inbox" })),
        );
        let graph = builder
            .generate_from_template("email_ai_summary", Platform::Graph, Some(&by_name))
            .await
            .data
            .unwrap();
        let slack = &graph.as_graph().unwrap().nodes[2];
        assert_eq!(slack.parameters["channel"], ParamValue::from("#inbox"));
        assert_eq!(slack.parameters["operation"], ParamValue::from("post"));

        let mut by_type = Customizations::new();
        by_type.insert(
            "slack.slack".into(),
            params_from_json(json!({ "channel": "#inbox", "text": "{{$json.summary}}" })),
        );
        let seq = builder
            .generate_from_template("email_ai_summary", Platform::Sequential, Some(&by_type))
            .await
            .data
            .unwrap();
        let slack = &seq.as_sequential().unwrap().modules()[2];
        assert_eq!(slack.parameters["channel"], ParamValue::from("#inbox"));
        assert_eq!(slack.mapper["text"], ParamValue::from("{{$json.summary}}"));
    }

    #[tokio::test]
    async fn unknown_template_fails() {
        let result = generator()
            .generate_from_template("does_not_exist", Platform::Graph, None)
            .await;
        assert!(!result.success);
        assert_eq!(result.errors, ["template not found: does_not_exist"]);
    }

    #[test]
    fn names_without_services_use_trigger() {
        let builder = generator();
        let intent = Intent::empty("");
        assert_eq!(builder.workflow_name(&intent, "Webhook"), "Process: Webhook");
    }
}
