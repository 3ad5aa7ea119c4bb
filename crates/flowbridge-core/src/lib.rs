//! FlowBridge core.
//!
//! Shared vocabulary for the FlowBridge engines:
//!
//! - **[`graph`]** -- Graph-form processes: nodes plus a `source -> port ->
//!   targets` connection map.
//! - **[`sequence`]** -- Sequential-form processes: a blueprint whose module
//!   list is the execution order.
//! - **[`process`]** -- The two forms unified behind [`Process`].
//! - **[`value`]** -- Ordered parameter bags over a closed value enum.
//! - **[`classifier`]** -- Static configuration vs data-mapping expressions.
//! - **[`registry`]** -- Service id to platform step type lookup table.
//! - **[`config`]** -- Layout and schedule defaults loaded from TOML.
//! - **[`report`]** -- Translation context and result envelope.
//! - **[`error`]** -- Unified error type via [`thiserror`].
//!
//! Nothing in this crate performs I/O except [`BridgeConfig::load`].

pub mod classifier;
pub mod config;
pub mod error;
pub mod graph;
pub mod process;
pub mod registry;
pub mod report;
pub mod sequence;
pub mod value;

// Re-export the most commonly used types at the crate root for convenience.
pub use classifier::{FieldClass, classify, is_mapper_field, split_params};
pub use config::{BridgeConfig, LayoutConfig, ScheduleConfig};
pub use error::{BridgeError, Result};
pub use graph::{Connection, Connections, GraphProcess, GraphStep, MAIN_PORT, Position};
pub use process::{Platform, Process};
pub use registry::{
    ServiceCategory, ServiceMapping, ServiceRegistry, TriggerKind, TriggerMapping,
};
pub use report::{TranslationContext, TranslationResult};
pub use sequence::{
    Blueprint, Designer, Module, ModuleMetadata, ScheduleKind, ScheduleUnit, Scheduling,
    SequentialProcess,
};
pub use value::{ParamValue, Params, merge_params, params_from_json};
