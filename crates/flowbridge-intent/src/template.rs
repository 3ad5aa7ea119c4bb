//! Pre-built process templates.
//!
//! Each template is a graph-form skeleton; the sequential skeleton is derived
//! from it on demand by the generator, so the two never drift apart.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use flowbridge_core::{BridgeError, GraphProcess, GraphStep, Result, params_from_json};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A reusable process skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub keywords: Vec<String>,
    /// Service ids the skeleton needs credentials for.
    pub required_services: Vec<String>,
    pub graph: GraphProcess,
}

impl Template {
    /// Whether `needle` (already lowercased) appears in a keyword, the name
    /// or the description.
    fn mentions(&self, needle: &str) -> bool {
        self.keywords.iter().any(|k| k.to_lowercase().contains(needle))
            || self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// Ordered collection of templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> Result<&Template> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| BridgeError::TemplateNotFound {
                template_id: id.to_owned(),
            })
    }

    /// Templates mentioning `keyword` (case-insensitive) in their keywords,
    /// name or description, in declaration order.  An empty keyword matches
    /// everything.
    pub fn find_by_keyword(&self, keyword: &str) -> Vec<&Template> {
        let needle = keyword.to_lowercase();
        self.templates.iter().filter(|t| t.mentions(&needle)).collect()
    }

    pub fn find_by_category(&self, category: &str) -> Vec<&Template> {
        self.templates
            .iter()
            .filter(|t| t.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// Templates that need `service` (by id, case-insensitive).
    pub fn find_by_service(&self, service: &str) -> Vec<&Template> {
        let service = service.to_lowercase();
        self.templates
            .iter()
            .filter(|t| t.required_services.iter().any(|s| *s == service))
            .collect()
    }

    /// The standard catalogue.
    pub fn builtin() -> Self {
        Self::new(vec![
            email_ai_summary(),
            crm_lead_enrichment(),
            expense_report_automation(),
            customer_onboarding(),
            social_media_content(),
            invoice_processing(),
        ])
    }
}

// ---------------------------------------------------------------------------
// Built-in templates
// ---------------------------------------------------------------------------

const STEP_X: f64 = 250.0;
const STEP_Y: f64 = 300.0;

/// Metadata half of a template; the skeleton is filled in by [`chain`].
struct Meta<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    category: &'a str,
    keywords: &'a [&'a str],
    services: &'a [&'a str],
    process_name: &'a str,
}

/// Build a template whose steps run in the given order, laid out left to
/// right.  Each step is `(id, name, node type, parameters)`.
fn chain(meta: Meta<'_>, steps: Vec<(&str, &str, &str, Value)>) -> Template {
    let mut graph = GraphProcess::new(meta.process_name);
    for (index, (id, name, node_type, params)) in steps.into_iter().enumerate() {
        let x = STEP_X * (index as f64 + 1.0);
        graph.nodes.push(
            GraphStep::new(id, name, format!("n8n-nodes-base.{node_type}"))
                .with_position(x, STEP_Y)
                .with_parameters(params_from_json(params)),
        );
    }
    let ids: Vec<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
    for pair in ids.windows(2) {
        graph.connections.link(&pair[0], &pair[1]);
    }

    let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| (*s).to_owned()).collect() };
    Template {
        id: meta.id.to_owned(),
        name: meta.name.to_owned(),
        description: meta.description.to_owned(),
        category: meta.category.to_owned(),
        keywords: owned(meta.keywords),
        required_services: owned(meta.services),
        graph,
    }
}

fn ai_message(model: &str, content: &str) -> Value {
    json!({
        "operation": "message",
        "model": model,
        "messages": { "values": [{ "role": "user", "content": content }] }
    })
}

fn email_ai_summary() -> Template {
    chain(
        Meta {
            id: "email_ai_summary",
            name: "AI Email Summarizer",
            description: "Automatically summarize incoming emails using AI and send summaries to Slack",
            category: "productivity",
            keywords: &["email", "ai", "summary", "slack", "automation"],
            services: &["gmail", "openai", "slack"],
            process_name: "AI Email Summarizer",
        },
        vec![
            ("gmail_trigger", "Gmail Trigger", "gmailTrigger", json!({ "event": "messageReceived" })),
            (
                "openai",
                "Summarize with OpenAI",
                "openAi",
                ai_message("gpt-4", "Summarize this email in 2-3 sentences: {{$json.snippet}}"),
            ),
            (
                "slack",
                "Send to Slack",
                "slack",
                json!({
                    "operation": "post",
                    "channel": "#email-summaries",
                    "text": "Email Summary:\n{{$json.choices[0].message.content}}"
                }),
            ),
        ],
    )
}

fn crm_lead_enrichment() -> Template {
    chain(
        Meta {
            id: "crm_lead_enrichment",
            name: "CRM Lead Enrichment",
            description: "Enrich new Salesforce leads with company data and notify sales team",
            category: "sales",
            keywords: &["salesforce", "crm", "lead", "enrichment", "sales"],
            services: &["salesforce", "http", "slack"],
            process_name: "CRM Lead Enrichment",
        },
        vec![
            (
                "salesforce_trigger",
                "New Lead in Salesforce",
                "salesforceTrigger",
                json!({ "object": "Lead", "event": "create" }),
            ),
            (
                "enrich_data",
                "Enrich Company Data",
                "httpRequest",
                json!({
                    "method": "GET",
                    "url": "https://api.clearbit.com/v2/companies/find",
                    "qs": { "domain": "={{$json.Company}}" }
                }),
            ),
            (
                "update_salesforce",
                "Update Lead",
                "salesforce",
                json!({
                    "operation": "update",
                    "resource": "lead",
                    "leadId": "={{$node[\"salesforce_trigger\"].json.Id}}",
                    "updateFields": {
                        "Industry": "={{$json.category.industry}}",
                        "NumberOfEmployees": "={{$json.metrics.employees}}"
                    }
                }),
            ),
            (
                "notify_slack",
                "Notify Sales Team",
                "slack",
                json!({
                    "operation": "post",
                    "channel": "#sales-leads",
                    "text": "New qualified lead: {{$node[\"salesforce_trigger\"].json.Name}} from {{$node[\"salesforce_trigger\"].json.Company}}"
                }),
            ),
        ],
    )
}

fn expense_report_automation() -> Template {
    chain(
        Meta {
            id: "expense_report_automation",
            name: "Expense Report Automation",
            description: "Process expense receipts from email, extract data with AI, and create QuickBooks expenses",
            category: "finance",
            keywords: &["expense", "receipt", "quickbooks", "ai", "ocr"],
            services: &["gmail", "openai", "quickbooks"],
            process_name: "Expense Report Automation",
        },
        vec![
            (
                "gmail_trigger",
                "Receipt Email",
                "gmailTrigger",
                json!({
                    "event": "messageReceived",
                    "filters": { "labelIds": ["INBOX"], "subject": "Receipt" }
                }),
            ),
            (
                "extract_data",
                "Extract Receipt Data",
                "openAi",
                ai_message(
                    "gpt-4-vision",
                    "Extract: amount, vendor, date, category from this receipt image. Return as JSON.",
                ),
            ),
            (
                "create_expense",
                "Create QuickBooks Expense",
                "quickbooks",
                json!({
                    "operation": "create",
                    "resource": "expense",
                    "amount": "={{$json.amount}}",
                    "vendor": "={{$json.vendor}}",
                    "date": "={{$json.date}}",
                    "category": "={{$json.category}}"
                }),
            ),
        ],
    )
}

fn customer_onboarding() -> Template {
    chain(
        Meta {
            id: "customer_onboarding",
            name: "Customer Onboarding Automation",
            description: "Automate new customer onboarding: create accounts, send welcome emails, add to CRM",
            category: "sales",
            keywords: &["customer", "onboarding", "crm", "email", "automation"],
            services: &["shopify", "hubspot", "microsoft_outlook"],
            process_name: "Customer Onboarding",
        },
        vec![
            ("shopify_trigger", "New Customer", "shopifyTrigger", json!({ "topic": "customers/create" })),
            (
                "create_hubspot_contact",
                "Add to HubSpot",
                "hubspot",
                json!({
                    "operation": "create",
                    "resource": "contact",
                    "email": "={{$json.email}}",
                    "firstname": "={{$json.first_name}}",
                    "lastname": "={{$json.last_name}}"
                }),
            ),
            (
                "send_welcome_email",
                "Send Welcome Email",
                "microsoftOutlook",
                json!({
                    "operation": "send",
                    "to": "={{$json.email}}",
                    "subject": "Welcome to our platform!",
                    "bodyContent": "Hi {{$json.first_name}}, welcome aboard!"
                }),
            ),
        ],
    )
}

fn social_media_content() -> Template {
    chain(
        Meta {
            id: "social_media_content",
            name: "AI Social Media Content Generator",
            description: "Generate social media posts with AI based on blog content and schedule them",
            category: "marketing",
            keywords: &["social", "content", "ai", "marketing", "automation"],
            services: &["http", "anthropic_claude", "airtable"],
            process_name: "AI Social Media Generator",
        },
        vec![
            (
                "schedule_trigger",
                "Daily Schedule",
                "scheduleTrigger",
                json!({ "rule": { "interval": [{ "field": "days", "daysInterval": 1 }] } }),
            ),
            (
                "get_blog_posts",
                "Get Recent Blog Posts",
                "httpRequest",
                json!({ "method": "GET", "url": "https://blog.example.com/api/posts/recent" }),
            ),
            (
                "generate_social_post",
                "Generate Post with Claude",
                "anthropic",
                json!({
                    "operation": "message",
                    "model": "claude-3-5-sonnet-20241022",
                    "prompt": "Create 3 engaging social media posts based on this blog: {{$json.title}}. Keep them under 280 characters."
                }),
            ),
            (
                "save_to_airtable",
                "Save to Content Calendar",
                "airtable",
                json!({
                    "operation": "create",
                    "table": "Content Calendar",
                    "fields": { "Post": "={{$json.content}}", "Status": "Scheduled", "Date": "={{$now}}" }
                }),
            ),
        ],
    )
}

fn invoice_processing() -> Template {
    chain(
        Meta {
            id: "invoice_processing",
            name: "Automated Invoice Processing",
            description: "Process invoices from email, extract data, and create records in accounting software",
            category: "finance",
            keywords: &["invoice", "accounting", "ai", "automation", "finance"],
            services: &["microsoft_outlook", "openai", "quickbooks"],
            process_name: "Invoice Processing",
        },
        vec![
            (
                "outlook_trigger",
                "Invoice Email",
                "microsoftOutlookTrigger",
                json!({ "event": "messageReceived", "folder": "Invoices" }),
            ),
            (
                "extract_invoice_data",
                "Extract Invoice Data",
                "openAi",
                ai_message(
                    "gpt-4",
                    "Extract invoice number, amount, vendor, due date from this invoice. Return as JSON.",
                ),
            ),
            (
                "create_quickbooks_bill",
                "Create Bill in QuickBooks",
                "quickbooks",
                json!({
                    "operation": "create",
                    "resource": "bill",
                    "vendor": "={{$json.vendor}}",
                    "amount": "={{$json.amount}}",
                    "dueDate": "={{$json.due_date}}"
                }),
            ),
        ],
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(templates: &[&Template]) -> Vec<String> {
        templates.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn builtin_skeletons_are_chains() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.len(), 6);
        for template in catalog.iter() {
            let graph = &template.graph;
            assert_eq!(graph.connections.edge_count(), graph.nodes.len() - 1, "{}", template.id);
            assert!(!graph.active);
        }
        let social = catalog.get("social_media_content").unwrap();
        assert_eq!(social.graph.nodes.len(), 4);
        assert_eq!(social.graph.nodes[3].position.map(|p| p.x), Some(1000.0));
    }

    #[test]
    fn keyword_lookup_is_case_insensitive_and_ordered() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(
            ids(&catalog.find_by_keyword("QuickBooks")),
            ["expense_report_automation"]
        );
        // Matches descriptions too: "send summaries to Slack".
        assert_eq!(ids(&catalog.find_by_keyword("slack")), ["email_ai_summary"]);
        assert_eq!(catalog.find_by_keyword("").len(), 6);
        assert!(catalog.find_by_keyword("gmail slack create").is_empty());
    }

    #[test]
    fn category_and_service_lookup() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(
            ids(&catalog.find_by_category("Finance")),
            ["expense_report_automation", "invoice_processing"]
        );
        assert_eq!(
            ids(&catalog.find_by_service("microsoft_outlook")),
            ["customer_onboarding", "invoice_processing"]
        );
        assert!(catalog.find_by_service("dropbox").is_empty());
    }

    #[test]
    fn missing_template_is_an_error() {
        let err = TemplateCatalog::builtin().get("nope").unwrap_err();
        assert!(matches!(err, BridgeError::TemplateNotFound { ref template_id } if template_id == "nope"));
    }
}
