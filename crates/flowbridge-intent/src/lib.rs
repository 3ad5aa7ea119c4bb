//! FlowBridge intent engine.
//!
//! Turns plain language into processes and process edits:
//!
//! - **[`parser`]** -- Free-form text to a structured [`Intent`] (action,
//!   services, position, names, operation, generation keywords).
//! - **[`template`]** -- Catalogue of pre-built process skeletons with keyword,
//!   category and service lookup.
//! - **[`generator`]** -- New processes from a description or a template, for
//!   either platform.
//! - **[`modifier`]** -- One structural edit per instruction, applied to a copy
//!   of the process.
//!
//! ```
//! use std::sync::Arc;
//! use flowbridge_core::ServiceRegistry;
//! use flowbridge_intent::{IntentAction, IntentParser};
//!
//! let parser = IntentParser::new(Arc::new(ServiceRegistry::builtin())).unwrap();
//! let intent = parser.parse("remove the OpenAI node");
//! assert_eq!(intent.action, IntentAction::RemoveStep);
//! assert_eq!(intent.services, ["openai"]);
//! ```

pub mod generator;
pub mod modifier;
pub mod parser;
pub mod template;

// Re-export key types at the crate root for convenience.
pub use generator::WorkflowGenerator;
pub use modifier::WorkflowModifier;
pub use parser::{Customizations, InsertPosition, Intent, IntentAction, IntentParser};
pub use template::{Template, TemplateCatalog};
