//! Instruction-driven edits to existing processes.
//!
//! The source process is never mutated: every call clones it, applies one
//! [`Intent`] and hands back the copy.  Anything the instruction asked for
//! that could not be done (a step that does not exist, an unnamed rename)
//! becomes a warning rather than an error.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use flowbridge_core::{
    BridgeConfig, GraphProcess, GraphStep, LayoutConfig, Module, Params, Process, ScheduleConfig,
    SequentialProcess, TranslationResult, split_params,
};

use crate::generator::capitalize;
use crate::parser::{InsertPosition, Intent, IntentAction, IntentParser};

/// Where an inserted step lands, in list order and on the canvas.
#[derive(Debug, Clone, Copy)]
struct Slot {
    index: usize,
    x: f64,
    y: f64,
    /// Move existing steps from this list index on one spacing to the
    /// right first.
    shift_from: Option<usize>,
    /// Step the insertion is relative to, if any.
    anchor: Option<(usize, Side)>,
}

impl Slot {
    fn at(index: usize, (x, y): (f64, f64)) -> Self {
        Self {
            index,
            x,
            y,
            shift_from: None,
            anchor: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

/// Applies plain-language modifications to processes of either platform.
#[derive(Debug, Clone)]
pub struct WorkflowModifier {
    parser: Arc<IntentParser>,
    layout: LayoutConfig,
    schedule: ScheduleConfig,
}

impl WorkflowModifier {
    pub fn new(parser: Arc<IntentParser>, config: &BridgeConfig) -> Self {
        Self {
            parser,
            layout: config.layout.clone(),
            schedule: config.schedule.clone(),
        }
    }

    // -- Entry points -------------------------------------------------------

    #[instrument(skip(self, process), fields(process = %process.name))]
    pub async fn modify_graph(
        &self,
        process: &GraphProcess,
        instruction: &str,
    ) -> TranslationResult<GraphProcess> {
        let intent = self.parser.parse(instruction);
        let (modified, warnings) = self.apply_graph(process, &intent);
        info!(action = ?intent.action, steps = modified.nodes.len(), "graph process modified");
        TranslationResult::succeeded(modified, warnings)
    }

    #[instrument(skip(self, process), fields(process = %process.name))]
    pub async fn modify_sequential(
        &self,
        process: &SequentialProcess,
        instruction: &str,
    ) -> TranslationResult<SequentialProcess> {
        let intent = self.parser.parse(instruction);
        let (modified, warnings) = self.apply_sequential(process, &intent);
        info!(
            action = ?intent.action,
            modules = modified.blueprint.flow.len(),
            "sequential process modified"
        );
        TranslationResult::succeeded(modified, warnings)
    }

    /// Modify a process of either platform; the result has the same platform.
    pub async fn modify(&self, process: &Process, instruction: &str) -> TranslationResult<Process> {
        match process {
            Process::Graph(p) => self.modify_graph(p, instruction).await.map(Process::Graph),
            Process::Sequential(p) => self
                .modify_sequential(p, instruction)
                .await
                .map(Process::Sequential),
        }
    }

    // -- Graph form ---------------------------------------------------------

    /// Apply an already parsed intent to a copy of `source`.
    pub fn apply_graph(&self, source: &GraphProcess, intent: &Intent) -> (GraphProcess, Vec<String>) {
        let mut process = source.clone();
        let mut warnings = Vec::new();

        match intent.action {
            IntentAction::AddStep | IntentAction::AddStandaloneNode => {
                self.insert_graph_step(&mut process, intent, &mut warnings);
            }
            IntentAction::RemoveStep => match self.find_graph_step(&process, intent) {
                Some(index) => {
                    let removed = process.nodes.remove(index);
                    process.connections.bypass(&removed.id);
                }
                None => warnings.push(target_not_found(intent)),
            },
            IntentAction::ModifyStep => match self.find_graph_step(&process, intent) {
                Some(index) => {
                    let step = &mut process.nodes[index];
                    if let Some(name) = &intent.new_name {
                        step.name = name.clone();
                    }
                    if let Some(op) = &intent.operation {
                        step.parameters.insert("operation".into(), op.as_str().into());
                    }
                }
                None => warnings.push(target_not_found(intent)),
            },
            IntentAction::Rename => match &intent.new_name {
                Some(name) => process.name = name.clone(),
                None => warnings.push(missing_new_name(intent)),
            },
            IntentAction::Activate => process.active = true,
            IntentAction::Deactivate => process.active = false,
            IntentAction::Unknown => warnings.push(unknown_action(intent)),
        }

        (process, warnings)
    }

    fn insert_graph_step(&self, process: &mut GraphProcess, intent: &Intent, warnings: &mut Vec<String>) {
        let steps: Vec<(String, Option<(f64, f64)>)> = process
            .nodes
            .iter()
            .map(|n| (n.name.clone(), n.position.map(|p| (p.x, p.y))))
            .collect();
        let slot = self.plan_slot(&steps, intent, warnings);

        // Neighbours follow the connections around an anchor, list order
        // otherwise.
        let (before, after) = match slot.anchor {
            Some((a, Side::After)) => {
                let anchor = process.nodes[a].id.clone();
                let next = process.connections.targets(&anchor).next().map(str::to_owned);
                (Some(anchor), next)
            }
            Some((a, Side::Before)) => {
                let anchor = process.nodes[a].id.clone();
                let prev = process
                    .connections
                    .edges()
                    .find(|(_, c)| c.node == anchor)
                    .map(|(source, _)| source.to_owned());
                (prev, Some(anchor))
            }
            None => (
                slot.index.checked_sub(1).map(|i| process.nodes[i].id.clone()),
                process.nodes.get(slot.index).map(|n| n.id.clone()),
            ),
        };

        if let Some(from) = slot.shift_from {
            for node in process.nodes.iter_mut().skip(from) {
                if let Some(position) = node.position.as_mut() {
                    position.x += self.layout.spacing;
                }
            }
        }

        let service = intent.primary_service();
        let (name, parameters) = self.new_step_content(intent);
        let id = format!("{service}_{}", Uuid::now_v7().simple());
        let step = GraphStep::new(id.clone(), name, self.parser.registry().graph_type(service))
            .with_position(slot.x, slot.y)
            .with_parameters(parameters);

        process.nodes.insert(slot.index, step);
        process.connections.splice(before.as_deref(), &id, after.as_deref());
    }

    fn find_graph_step(&self, process: &GraphProcess, intent: &Intent) -> Option<usize> {
        let steps: Vec<(String, String)> = process
            .nodes
            .iter()
            .map(|n| (n.name.to_lowercase(), n.step_type.to_lowercase()))
            .collect();
        self.find_target(&steps, intent)
    }

    // -- Sequential form ----------------------------------------------------

    /// Apply an already parsed intent to a copy of `source`.
    ///
    /// Modules run in list order, so inserting or removing needs no rewiring.
    pub fn apply_sequential(
        &self,
        source: &SequentialProcess,
        intent: &Intent,
    ) -> (SequentialProcess, Vec<String>) {
        let mut process = source.clone();
        let mut warnings = Vec::new();

        match intent.action {
            IntentAction::AddStep | IntentAction::AddStandaloneNode => {
                self.insert_module(&mut process, intent, &mut warnings);
            }
            IntentAction::RemoveStep => match self.find_module(&process, intent) {
                Some(index) => {
                    process.blueprint.flow.remove(index);
                }
                None => warnings.push(target_not_found(intent)),
            },
            IntentAction::ModifyStep => match self.find_module(&process, intent) {
                Some(index) => {
                    let module = &mut process.blueprint.flow[index];
                    if let Some(name) = &intent.new_name {
                        module.set_name(name.clone());
                    }
                    if let Some(op) = &intent.operation {
                        module.parameters.insert("operation".into(), op.as_str().into());
                    }
                }
                None => warnings.push(target_not_found(intent)),
            },
            IntentAction::Rename => match &intent.new_name {
                Some(name) => {
                    process.name = name.clone();
                    process.blueprint.name = name.clone();
                }
                None => warnings.push(missing_new_name(intent)),
            },
            IntentAction::Activate => process.scheduling = Some(self.schedule.scheduling()),
            IntentAction::Deactivate => process.scheduling = None,
            IntentAction::Unknown => warnings.push(unknown_action(intent)),
        }

        (process, warnings)
    }

    fn insert_module(&self, process: &mut SequentialProcess, intent: &Intent, warnings: &mut Vec<String>) {
        let steps: Vec<(String, Option<(f64, f64)>)> = process
            .blueprint
            .flow
            .iter()
            .map(|m| (m.display_name(), m.designer().map(|d| (d.x, d.y))))
            .collect();
        let slot = self.plan_slot(&steps, intent, warnings);

        if let Some(from) = slot.shift_from {
            for module in process.blueprint.flow.iter_mut().skip(from) {
                if let Some(designer) = module.designer_mut() {
                    designer.x += self.layout.spacing;
                }
            }
        }

        let service = intent.primary_service();
        let (name, params) = self.new_step_content(intent);
        let (parameters, mapper) = split_params(&params);

        let mut module = Module::new(
            process.next_module_id(),
            self.parser.registry().module_type(service),
        )
        .with_designer(slot.x, slot.y);
        module.parameters = parameters;
        module.mapper = mapper;
        module.set_name(name);

        process.blueprint.flow.insert(slot.index, module);
    }

    fn find_module(&self, process: &SequentialProcess, intent: &Intent) -> Option<usize> {
        let steps: Vec<(String, String)> = process
            .blueprint
            .flow
            .iter()
            .map(|m| (m.display_name().to_lowercase(), m.module.to_lowercase()))
            .collect();
        self.find_target(&steps, intent)
    }

    // -- Shared helpers -----------------------------------------------------

    /// Name and parameters of a step about to be inserted.
    ///
    /// Configured steps are called `<Service> - <Operation>` and pick up
    /// parameter hints from the instruction; standalone nodes start empty and
    /// take the quoted node name unless that name is their anchor.
    fn new_step_content(&self, intent: &Intent) -> (String, Params) {
        let registry = self.parser.registry();
        let service = intent.primary_service();

        if intent.action == IntentAction::AddStep {
            let display = registry.display_name(service);
            let name = match &intent.operation {
                Some(op) => format!("{display} - {}", capitalize(op)),
                None => display,
            };
            let params = self
                .parser
                .parameter_hints(&intent.raw, intent.operation.as_deref());
            return (name, params);
        }

        let anchored = matches!(intent.position, InsertPosition::Before | InsertPosition::After);
        let name = intent
            .target_name
            .clone()
            .filter(|_| !anchored)
            .unwrap_or_else(|| format!("{service} Node"));
        (name, Params::new())
    }

    /// Decide where an inserted step goes among `steps` (name and canvas
    /// position, in list order).
    fn plan_slot(
        &self,
        steps: &[(String, Option<(f64, f64)>)],
        intent: &Intent,
        warnings: &mut Vec<String>,
    ) -> Slot {
        let origin = (self.layout.origin_x, self.layout.baseline_y);
        let spacing = self.layout.spacing;
        let count = steps.len();

        let end = Slot::at(
            count,
            steps
                .last()
                .and_then(|(_, p)| *p)
                .map_or(origin, |(x, y)| (x + spacing, y)),
        );

        match intent.position {
            InsertPosition::End => end,
            // The first step is the trigger; "beginning" means right after it.
            InsertPosition::Beginning => match steps.first() {
                None => Slot::at(0, origin),
                Some((_, first)) => {
                    let xy = steps
                        .get(1)
                        .and_then(|(_, p)| *p)
                        .or_else(|| first.map(|(x, y)| (x + spacing, y)))
                        .unwrap_or(origin);
                    Slot {
                        shift_from: Some(1),
                        ..Slot::at(1, xy)
                    }
                }
            },
            InsertPosition::Middle => {
                let index = count / 2;
                match steps.get(index) {
                    Some((_, p)) => Slot::at(index, p.unwrap_or(origin)),
                    None => end,
                }
            }
            InsertPosition::Before | InsertPosition::After => {
                let side = if intent.position == InsertPosition::Before {
                    Side::Before
                } else {
                    Side::After
                };
                let anchor = intent.target_name.as_deref().and_then(|target| {
                    let target = target.to_lowercase();
                    steps
                        .iter()
                        .position(|(name, _)| name.to_lowercase().contains(&target))
                });
                let Some(a) = anchor else {
                    warnings.push(format!(
                        "no step named `{}` to insert {}; added at the end",
                        intent.target_name.as_deref().unwrap_or_default(),
                        if side == Side::Before { "before" } else { "after" },
                    ));
                    return end;
                };

                let (x, y) = steps[a].1.unwrap_or(origin);
                let (index, x) = match side {
                    Side::Before => (a, x - spacing),
                    Side::After => (a + 1, x + spacing),
                };
                Slot {
                    anchor: Some((a, side)),
                    ..Slot::at(index, (x, y))
                }
            }
        }
    }

    /// First step whose lowercased name or type contains the quoted target
    /// name, falling back to a referenced service's words or exact types.
    fn find_target(&self, steps: &[(String, String)], intent: &Intent) -> Option<usize> {
        let contains = |needle: &str| {
            steps
                .iter()
                .position(|(name, kind)| name.contains(needle) || kind.contains(needle))
        };

        if let Some(found) = intent
            .target_name
            .as_deref()
            .and_then(|target| contains(&target.to_lowercase()))
        {
            return Some(found);
        }

        // Platform types such as `googleDrive` or `aws.s3` contain none of
        // the service's words, so the exact types count too.
        let registry = self.parser.registry();
        let needles: Vec<String> = intent
            .services
            .iter()
            .flat_map(|s| registry.needles(s))
            .collect();
        let types: Vec<String> = intent
            .services
            .iter()
            .flat_map(|s| [registry.graph_type(s), registry.module_type(s)])
            .map(str::to_lowercase)
            .collect();
        steps.iter().position(|(name, kind)| {
            types.iter().any(|t| t == kind)
                || needles
                    .iter()
                    .any(|n| name.contains(n.as_str()) || kind.contains(n.as_str()))
        })
    }
}

fn target_not_found(intent: &Intent) -> String {
    match &intent.target_name {
        Some(name) => format!("target not found: no step matches `{name}`"),
        None => format!("target not found: no step matches \"{}\"", intent.raw),
    }
}

fn missing_new_name(intent: &Intent) -> String {
    format!("no quoted name to rename to in: {}", intent.raw)
}

fn unknown_action(intent: &Intent) -> String {
    format!("Could not determine modification action from: {}", intent.raw)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
