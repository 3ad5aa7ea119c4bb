//! Translation context and result envelope.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Caller-supplied options for a single conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationContext {
    /// Activation state for graph processes built from sequential ones.
    /// `None` means inactive.
    #[serde(default)]
    pub default_active: Option<bool>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
}

impl TranslationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.default_active = Some(active);
        self
    }
}

/// Outcome of one engine operation.
///
/// Engines never return `Err` to their callers.  A failure is a result with
/// `success == false`, no data and at least one error; degraded output is a
/// successful result carrying warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> TranslationResult<T> {
    pub fn succeeded(data: T, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            warnings,
            errors: Vec::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            warnings: Vec::new(),
            errors: vec![error.into()],
        }
    }

    /// Fold an internal result into the envelope, keeping any warnings
    /// gathered before the failure.
    pub fn from_result(result: Result<T>, warnings: Vec<String>) -> Self {
        match result {
            Ok(data) => Self::succeeded(data, warnings),
            Err(e) => Self {
                warnings,
                ..Self::failed(e.to_string())
            },
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Transform the payload, keeping status and diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TranslationResult<U> {
        TranslationResult {
            success: self.success,
            data: self.data.map(f),
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn failure_keeps_earlier_warnings() {
        let result: TranslationResult<()> = TranslationResult::from_result(
            Err(BridgeError::TemplateNotFound {
                template_id: "nope".into(),
            }),
            vec!["first".into()],
        );
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.warnings, ["first"]);
        assert_eq!(result.errors, ["template not found: nope"]);
    }

    #[test]
    fn map_preserves_diagnostics() {
        let result = TranslationResult::succeeded(2, vec!["w".into()]).map(|n| n * 10);
        assert!(result.success);
        assert_eq!(result.data, Some(20));
        assert!(result.has_warnings());
    }

    #[test]
    fn context_builder() {
        let ctx = TranslationContext::new().with_team("t1").active(true);
        assert_eq!(ctx.team_id.as_deref(), Some("t1"));
        assert_eq!(ctx.default_active, Some(true));
        assert!(ctx.organization_id.is_none());
    }
}
