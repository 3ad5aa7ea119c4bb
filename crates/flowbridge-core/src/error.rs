//! Bridge error types.
//!
//! Every fallible function in the workspace returns [`BridgeError`].  Public
//! engine operations never hand these to their callers directly; they fold
//! them into a failed [`TranslationResult`](crate::TranslationResult) instead.

/// Unified error type for the FlowBridge engines.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    // -- Structural errors ---------------------------------------------------
    /// Two steps of a graph-form process share the same identifier.
    #[error("duplicate step id `{id}` in process `{process}`")]
    DuplicateStepId { process: String, id: String },

    /// Two modules of a sequential-form process share the same identifier.
    #[error("duplicate module id {id} in process `{process}`")]
    DuplicateModuleId { process: String, id: u32 },

    // -- Lookup errors -------------------------------------------------------
    /// The requested template does not exist in the catalogue.
    #[error("template not found: {template_id}")]
    TemplateNotFound { template_id: String },

    /// A matching pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // -- Configuration -------------------------------------------------------
    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The configuration file could not be parsed as TOML.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    // -- I/O and serialization -----------------------------------------------
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    // -- Generic -------------------------------------------------------------
    /// Catch-all for unexpected internal errors.
    #[error("internal bridge error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, BridgeError>;
