//! Sequential-form processes.
//!
//! A sequential-form process wraps a blueprint whose `flow` is the execution
//! order.  Adjacency is implicit: module `i` feeds module `i + 1`.

use serde::{Deserialize, Serialize};

use crate::value::Params;

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    /// Run on a fixed interval until switched off.
    Indefinitely,
    Once,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleUnit {
    Minutes,
    Hours,
    Days,
}

/// When the platform runs the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduling {
    #[serde(rename = "type")]
    pub kind: ScheduleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<ScheduleUnit>,
}

impl Scheduling {
    /// Run indefinitely every `interval` `unit`s.
    pub fn recurring(interval: u32, unit: ScheduleUnit) -> Self {
        Self {
            kind: ScheduleKind::Indefinitely,
            interval: Some(interval),
            unit: Some(unit),
        }
    }
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// Designer placement of a module, plus its optional custom label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Designer {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designer: Option<Designer>,
}

fn default_version() -> u32 {
    1
}

/// One module of the flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Identifier, unique within the blueprint.
    pub id: u32,
    /// Platform module type (e.g. `slack.slack`).
    pub module: String,
    #[serde(default = "default_version")]
    pub version: u32,
    /// Static configuration.
    #[serde(default)]
    pub parameters: Params,
    /// Values mapped from upstream data.
    #[serde(default)]
    pub mapper: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModuleMetadata>,
}

impl Module {
    pub fn new(id: u32, module: impl Into<String>) -> Self {
        Self {
            id,
            module: module.into(),
            version: 1,
            parameters: Params::new(),
            mapper: Params::new(),
            metadata: None,
        }
    }

    pub fn with_designer(mut self, x: f64, y: f64) -> Self {
        self.metadata = Some(ModuleMetadata {
            designer: Some(Designer { x, y, name: None }),
        });
        self
    }

    pub fn designer(&self) -> Option<&Designer> {
        self.metadata.as_ref()?.designer.as_ref()
    }

    pub fn designer_mut(&mut self) -> Option<&mut Designer> {
        self.metadata.as_mut()?.designer.as_mut()
    }

    /// The designer label if set, otherwise a name derived from the type.
    pub fn display_name(&self) -> String {
        self.designer()
            .and_then(|d| d.name.clone())
            .unwrap_or_else(|| module_display_name(&self.module))
    }

    /// Store a custom label, creating designer metadata at the origin if the
    /// module had none.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        match self.designer_mut() {
            Some(designer) => designer.name = Some(name),
            None => {
                self.metadata = Some(ModuleMetadata {
                    designer: Some(Designer {
                        x: 0.0,
                        y: 0.0,
                        name: Some(name),
                    }),
                });
            }
        }
    }
}

/// `google.gmail` -> `Gmail`, `http` -> `Http`.
pub fn module_display_name(module_type: &str) -> String {
    let base = module_type.rsplit('.').next().unwrap_or(module_type);
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Blueprint and process
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    #[serde(default)]
    pub flow: Vec<Module>,
    #[serde(default)]
    pub metadata: Params,
}

/// A complete sequential-form process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentialProcess {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub blueprint: Blueprint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<Scheduling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl SequentialProcess {
    /// An unscheduled process whose blueprint shares its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            blueprint: Blueprint {
                name: name.clone(),
                ..Blueprint::default()
            },
            name,
            ..Self::default()
        }
    }

    pub fn modules(&self) -> &[Module] {
        &self.blueprint.flow
    }

    /// One past the largest module id in use.
    pub fn next_module_id(&self) -> u32 {
        self.blueprint
            .flow
            .iter()
            .map(|m| m.id)
            .max()
            .map_or(1, |max| max + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_designer_label() {
        let mut module = Module::new(1, "google.gmail").with_designer(250.0, 300.0);
        assert_eq!(module.display_name(), "Gmail");

        module.set_name("Inbox watcher");
        assert_eq!(module.display_name(), "Inbox watcher");
        assert_eq!(module.designer().unwrap().x, 250.0);
    }

    #[test]
    fn derived_names() {
        assert_eq!(module_display_name("slack.slack"), "Slack");
        assert_eq!(module_display_name("http"), "Http");
        assert_eq!(module_display_name(""), "");
    }

    #[test]
    fn next_id_tolerates_gaps() {
        let mut process = SequentialProcess::new("gaps");
        assert_eq!(process.next_module_id(), 1);
        process.blueprint.flow = vec![Module::new(1, "http"), Module::new(7, "http")];
        assert_eq!(process.next_module_id(), 8);
    }

    #[test]
    fn serializes_platform_field_names() {
        let mut process = SequentialProcess::new("Nightly");
        process.team_id = Some("42".into());
        process.scheduling = Some(Scheduling::recurring(15, ScheduleUnit::Minutes));
        let json = serde_json::to_value(&process).unwrap();
        assert_eq!(json["teamId"], "42");
        assert_eq!(json["scheduling"]["type"], "indefinitely");
        assert_eq!(json["scheduling"]["unit"], "minutes");
        assert_eq!(json["blueprint"]["name"], "Nightly");
    }
}
