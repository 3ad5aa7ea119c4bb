//! Service registry.
//!
//! Maps abstract service identifiers (`gmail`, `slack`, …) to the step type
//! each platform uses for that service, together with category and operation
//! metadata.  A separate trigger table covers the entry points a generated
//! process starts from.
//!
//! The registry is a plain immutable value: build it once (usually via
//! [`ServiceRegistry::builtin`]), wrap it in an `Arc` and hand it to whichever
//! engine needs it.  Tests can substitute a registry of their own.
//!
//! # Example
//!
//! ```rust
//! # use flowbridge_core::registry::ServiceRegistry;
//! let registry = ServiceRegistry::builtin();
//! assert_eq!(registry.graph_type("slack"), "n8n-nodes-base.slack");
//! assert_eq!(registry.module_type("slack"), "slack.slack");
//! // Unknown services fall back to the generic HTTP step.
//! assert_eq!(registry.module_type("carrier-pigeon"), "http");
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Identifier of the generic HTTP service.
pub const HTTP_SERVICE: &str = "http";

/// Graph-platform type used when nothing better is known.
pub const GENERIC_GRAPH_TYPE: &str = "n8n-nodes-base.httpRequest";

/// Sequential-platform type used when nothing better is known.
pub const GENERIC_MODULE_TYPE: &str = "http";

/// Broad grouping of services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Communication,
    Productivity,
    Ai,
    Crm,
    Ecommerce,
    Finance,
    Storage,
    Database,
}

/// How one service is expressed on both platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMapping {
    /// Human-readable name (e.g. "Google Sheets").
    pub name: String,
    /// Node type on the graph platform.
    pub graph_type: String,
    /// Module type on the sequential platform.
    pub module_type: String,
    pub category: ServiceCategory,
    /// Operations the service commonly performs.
    #[serde(default)]
    pub operations: Vec<String>,
    /// Extra lowercase words that refer to this service in free text.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// The entry point a generated process starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Schedule,
    Email,
    Webhook,
}

/// How one trigger kind is expressed on both platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMapping {
    pub kind: TriggerKind,
    /// Default display name of the trigger step.
    pub name: String,
    pub graph_type: String,
    pub module_type: String,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable lookup table from service ids to platform step types.
///
/// Iteration order is insertion order; intent parsing relies on it to report
/// multiple services deterministically.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: IndexMap<String, ServiceMapping>,
    triggers: Vec<TriggerMapping>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a service.  Ids are stored lowercased.
    #[must_use]
    pub fn with_service(mut self, id: impl Into<String>, mapping: ServiceMapping) -> Self {
        self.services.insert(id.into().to_lowercase(), mapping);
        self
    }

    /// Add (or replace) the mapping for a trigger kind.
    #[must_use]
    pub fn with_trigger(mut self, mapping: TriggerMapping) -> Self {
        self.triggers.retain(|t| t.kind != mapping.kind);
        self.triggers.push(mapping);
        self
    }

    /// Look up a service by id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&ServiceMapping> {
        self.services.get(id.to_lowercase().as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterate `(id, mapping)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceMapping)> {
        self.services.iter().map(|(id, m)| (id.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Graph node type for a service; the generic HTTP node if unknown.
    pub fn graph_type(&self, service: &str) -> &str {
        self.get(service)
            .map_or(GENERIC_GRAPH_TYPE, |m| m.graph_type.as_str())
    }

    /// Sequential module type for a service; the generic HTTP module if
    /// unknown.
    pub fn module_type(&self, service: &str) -> &str {
        self.get(service)
            .map_or(GENERIC_MODULE_TYPE, |m| m.module_type.as_str())
    }

    /// Human-readable name of a service, or the id itself if unknown.
    pub fn display_name(&self, service: &str) -> String {
        self.get(service)
            .map_or_else(|| service.to_owned(), |m| m.name.clone())
    }

    pub fn trigger(&self, kind: TriggerKind) -> Option<&TriggerMapping> {
        self.triggers.iter().find(|t| t.kind == kind)
    }

    /// Lowercase words that refer to `service` in free text or step names:
    /// the id, the display name and every alias.
    pub fn needles(&self, service: &str) -> Vec<String> {
        let id = service.to_lowercase();
        let Some(mapping) = self.services.get(id.as_str()) else {
            return vec![id];
        };
        let mut words = vec![id, mapping.name.to_lowercase()];
        words.extend(mapping.aliases.iter().map(|a| a.to_lowercase()));
        words
    }

    // -- Cross-platform lookups ---------------------------------------------

    /// Translate a graph node type into the matching module type.
    ///
    /// Tries the services and triggers verbatim, then retries services with a
    /// trailing `Trigger` suffix removed (`…gmailTrigger` → `…gmail`).
    pub fn module_type_for_graph_type(&self, graph_type: &str) -> Option<&str> {
        let exact = self
            .services
            .values()
            .find(|m| m.graph_type == graph_type)
            .map(|m| m.module_type.as_str())
            .or_else(|| {
                self.triggers
                    .iter()
                    .find(|t| t.graph_type == graph_type)
                    .map(|t| t.module_type.as_str())
            });
        if exact.is_some() {
            return exact;
        }

        let stem = graph_type.strip_suffix("Trigger")?;
        self.services
            .values()
            .find(|m| m.graph_type == stem)
            .map(|m| m.module_type.as_str())
    }

    /// Translate a module type into the matching graph node type.
    ///
    /// Tries the services and triggers verbatim, then falls back to the last
    /// dotted segment (`google.sheets` → `sheets`) against service ids and the
    /// last segment of each service's own module type.
    pub fn graph_type_for_module_type(&self, module_type: &str) -> Option<&str> {
        let exact = self
            .services
            .values()
            .find(|m| m.module_type == module_type)
            .map(|m| m.graph_type.as_str())
            .or_else(|| {
                self.triggers
                    .iter()
                    .find(|t| t.module_type == module_type)
                    .map(|t| t.graph_type.as_str())
            });
        if exact.is_some() {
            return exact;
        }

        let base = last_segment(module_type).to_lowercase();
        self.services
            .iter()
            .find(|(id, m)| {
                **id == base || last_segment(&m.module_type).eq_ignore_ascii_case(&base)
            })
            .map(|(_, m)| m.graph_type.as_str())
    }

    // -- Queries ------------------------------------------------------------

    /// Ids of every service in `category`.
    pub fn by_category(&self, category: ServiceCategory) -> Vec<&str> {
        self.iter()
            .filter(|(_, m)| m.category == category)
            .map(|(id, _)| id)
            .collect()
    }

    /// Ids whose id or display name contains `keyword` (case-insensitive).
    pub fn search(&self, keyword: &str) -> Vec<&str> {
        let keyword = keyword.to_lowercase();
        self.iter()
            .filter(|(id, m)| id.contains(&keyword) || m.name.to_lowercase().contains(&keyword))
            .map(|(id, _)| id)
            .collect()
    }

    // -- Built-in table -----------------------------------------------------

    /// The standard table of business services and triggers.
    pub fn builtin() -> Self {
        use ServiceCategory::*;

        let entries: [(&str, ServiceMapping); 32] = [
            // Microsoft 365
            ("microsoft_outlook", svc("Microsoft Outlook", "microsoftOutlook", "microsoft365.outlook", Communication,
                &["send_email", "read_email", "create_event", "update_event"], &["outlook"])),
            ("microsoft_teams", svc("Microsoft Teams", "microsoftTeams", "microsoft365.teams", Communication,
                &["send_message", "create_channel", "post_to_channel"], &["teams"])),
            ("microsoft_excel", svc("Microsoft Excel", "microsoftExcel", "microsoft365.excel", Productivity,
                &["read_worksheet", "write_worksheet", "create_row", "update_row"], &["excel"])),
            ("microsoft_onedrive", svc("Microsoft OneDrive", "microsoftOneDrive", "microsoft365.onedrive", Storage,
                &["upload_file", "download_file", "list_files", "delete_file"], &["onedrive"])),
            ("microsoft_sharepoint", svc("Microsoft SharePoint", "microsoftSharepoint", "microsoft365.sharepoint", Productivity,
                &["create_list_item", "update_list_item", "read_list", "upload_file"], &["sharepoint"])),
            // AI
            ("openai", svc("OpenAI", "openAi", "openai", Ai,
                &["chat_completion", "text_completion", "image_generation", "embeddings", "audio_transcription"], &[])),
            ("anthropic_claude", svc("Anthropic Claude", "anthropic", "anthropic", Ai,
                &["create_message", "stream_message"], &["claude", "anthropic"])),
            // Google Workspace
            ("gmail", svc("Gmail", "gmail", "google.gmail", Communication,
                &["send_email", "search_email", "read_email", "add_label"], &[])),
            ("google_sheets", svc("Google Sheets", "googleSheets", "google.sheets", Productivity,
                &["append_row", "update_row", "read_sheet", "create_sheet"], &["sheets"])),
            ("google_drive", svc("Google Drive", "googleDrive", "google.drive", Storage,
                &["upload_file", "create_folder", "share_file", "search_files"], &[])),
            ("google_calendar", svc("Google Calendar", "googleCalendar", "google.calendar", Productivity,
                &["create_event", "update_event", "list_events", "delete_event"], &[])),
            // CRM
            ("salesforce", svc("Salesforce", "salesforce", "salesforce", Crm,
                &["create_lead", "update_opportunity", "search_records", "create_account"], &[])),
            ("hubspot", svc("HubSpot", "hubspot", "hubspot", Crm,
                &["create_contact", "update_deal", "create_company", "add_to_list"], &[])),
            // E-commerce
            ("shopify", svc("Shopify", "shopify", "shopify", Ecommerce,
                &["create_order", "update_product", "create_customer", "fulfill_order"], &[])),
            ("woocommerce", svc("WooCommerce", "wooCommerce", "woocommerce", Ecommerce,
                &["create_product", "update_order", "create_customer"], &[])),
            // Finance
            ("quickbooks", svc("QuickBooks", "quickbooks", "quickbooks", Finance,
                &["create_invoice", "create_customer", "create_payment", "get_reports"], &[])),
            ("stripe", svc("Stripe", "stripe", "stripe", Finance,
                &["create_customer", "create_charge", "create_subscription", "refund_payment"], &[])),
            // Messaging
            ("slack", svc("Slack", "slack", "slack.slack", Communication,
                &["send_message", "create_channel", "invite_user", "upload_file"], &[])),
            ("discord", svc("Discord", "discord", "discord", Communication,
                &["send_message", "create_channel", "send_dm"], &[])),
            ("twilio", svc("Twilio", "twilio", "twilio", Communication,
                &["send_sms", "make_call", "send_whatsapp"], &[])),
            // Databases
            ("postgresql", svc("PostgreSQL", "postgres", "postgresql", Database,
                &["execute_query", "insert", "update", "delete"], &["postgres"])),
            ("mysql", svc("MySQL", "mysql", "mysql", Database,
                &["execute_query", "insert", "update", "delete"], &[])),
            ("mongodb", svc("MongoDB", "mongoDb", "mongodb", Database,
                &["find", "insert", "update", "delete"], &[])),
            // Project management
            ("notion", svc("Notion", "notion", "notion.notion", Productivity,
                &["create_page", "update_database", "query_database", "create_block"], &[])),
            ("airtable", svc("Airtable", "airtable", "airtable.airtable", Productivity,
                &["create_record", "update_record", "search_records", "list_records"], &[])),
            ("asana", svc("Asana", "asana", "asana", Productivity,
                &["create_task", "update_task", "create_project", "add_comment"], &[])),
            ("trello", svc("Trello", "trello", "trello", Productivity,
                &["create_card", "update_card", "create_board", "add_checklist"], &[])),
            // Files
            ("dropbox", svc("Dropbox", "dropbox", "dropbox", Storage,
                &["upload_file", "download_file", "create_folder", "share_link"], &[])),
            ("aws_s3", svc("AWS S3", "awsS3", "aws.s3", Storage,
                &["upload_file", "download_file", "list_objects", "delete_object"], &[])),
            // Source control
            ("github", svc("GitHub", "github", "github", Productivity,
                &["create_issue", "create_pr", "create_repo", "add_comment"], &[])),
            ("gitlab", svc("GitLab", "gitlab", "gitlab", Productivity,
                &["create_issue", "create_merge_request", "create_project"], &[])),
            // Generic
            (HTTP_SERVICE, svc("HTTP Request", "httpRequest", GENERIC_MODULE_TYPE, Productivity,
                &["get", "post", "put", "delete", "patch"], &[])),
        ];

        let registry = entries
            .into_iter()
            .fold(Self::new(), |reg, (id, mapping)| reg.with_service(id, mapping));

        registry
            .with_trigger(trigger(TriggerKind::Schedule, "Schedule", "scheduleTrigger", "schedule"))
            .with_trigger(trigger(TriggerKind::Email, "Email Trigger", "gmailTrigger", "google.gmail.watch"))
            .with_trigger(trigger(TriggerKind::Webhook, "Webhook", "webhook", "webhook"))
    }
}

/// Prefix shared by every built-in graph node type.
const GRAPH_TYPE_PREFIX: &str = "n8n-nodes-base.";

fn svc(
    name: &str,
    graph_node: &str,
    module_type: &str,
    category: ServiceCategory,
    operations: &[&str],
    aliases: &[&str],
) -> ServiceMapping {
    ServiceMapping {
        name: name.to_owned(),
        graph_type: format!("{GRAPH_TYPE_PREFIX}{graph_node}"),
        module_type: module_type.to_owned(),
        category,
        operations: operations.iter().map(|s| (*s).to_owned()).collect(),
        aliases: aliases.iter().map(|s| (*s).to_owned()).collect(),
    }
}

fn trigger(kind: TriggerKind, name: &str, graph_node: &str, module_type: &str) -> TriggerMapping {
    TriggerMapping {
        kind,
        name: name.to_owned(),
        graph_type: format!("{GRAPH_TYPE_PREFIX}{graph_node}"),
        module_type: module_type.to_owned(),
    }
}

fn last_segment(module_type: &str) -> &str {
    module_type.rsplit('.').next().unwrap_or(module_type)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookups() {
        let registry = ServiceRegistry::builtin();
        assert_eq!(registry.len(), 32);
        assert_eq!(registry.graph_type("gmail"), "n8n-nodes-base.gmail");
        assert_eq!(registry.module_type("GMAIL"), "google.gmail");
        assert_eq!(registry.display_name("google_sheets"), "Google Sheets");
        assert_eq!(registry.display_name("unknown"), "unknown");
    }

    #[test]
    fn unknown_service_defaults_to_http() {
        let registry = ServiceRegistry::builtin();
        assert_eq!(registry.graph_type("fax"), GENERIC_GRAPH_TYPE);
        assert_eq!(registry.module_type("fax"), GENERIC_MODULE_TYPE);
    }

    #[test]
    fn graph_to_module_lookup_handles_triggers() {
        let registry = ServiceRegistry::builtin();
        assert_eq!(
            registry.module_type_for_graph_type("n8n-nodes-base.slack"),
            Some("slack.slack")
        );
        assert_eq!(
            registry.module_type_for_graph_type("n8n-nodes-base.webhook"),
            Some("webhook")
        );
        // No dedicated trigger entry: fall back to the service itself.
        assert_eq!(
            registry.module_type_for_graph_type("n8n-nodes-base.salesforceTrigger"),
            Some("salesforce")
        );
        assert_eq!(registry.module_type_for_graph_type("n8n-nodes-base.ftp"), None);
    }

    #[test]
    fn module_to_graph_lookup_uses_last_segment() {
        let registry = ServiceRegistry::builtin();
        assert_eq!(
            registry.graph_type_for_module_type("google.sheets"),
            Some("n8n-nodes-base.googleSheets")
        );
        assert_eq!(
            registry.graph_type_for_module_type("vendor.notion"),
            Some("n8n-nodes-base.notion")
        );
        assert_eq!(
            registry.graph_type_for_module_type("google.gmail.watch"),
            Some("n8n-nodes-base.gmailTrigger")
        );
        assert_eq!(registry.graph_type_for_module_type("ftp"), None);
    }

    #[test]
    fn category_and_search() {
        let registry = ServiceRegistry::builtin();
        assert_eq!(registry.by_category(ServiceCategory::Ai), ["openai", "anthropic_claude"]);
        assert_eq!(
            registry.search("microsoft").len(),
            5,
            "all Microsoft 365 services match by name"
        );
        assert_eq!(registry.search("S3"), ["aws_s3"]);
    }

    #[test]
    fn needles_include_aliases() {
        let registry = ServiceRegistry::builtin();
        assert_eq!(
            registry.needles("microsoft_outlook"),
            ["microsoft_outlook", "microsoft outlook", "outlook"]
        );
        assert_eq!(registry.needles("Mystery"), ["mystery"]);
    }

    #[test]
    fn substituted_registry() {
        let registry = ServiceRegistry::new().with_service(
            "Fax",
            ServiceMapping {
                name: "Fax".into(),
                graph_type: "custom.fax".into(),
                module_type: "fax.send".into(),
                category: ServiceCategory::Communication,
                operations: vec![],
                aliases: vec![],
            },
        );
        assert!(registry.contains("fax"));
        assert_eq!(registry.module_type_for_graph_type("custom.fax"), Some("fax.send"));
        assert!(registry.trigger(TriggerKind::Webhook).is_none());
    }
}
