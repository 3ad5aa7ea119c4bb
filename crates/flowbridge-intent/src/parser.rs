//! Plain-language instruction parser.
//!
//! Turns free-form text such as `"add a Slack step after node 'Summarize'"`
//! into a structured [`Intent`].  Parsing is a pure function of the text and
//! the service registry: no I/O, no model calls, same input same output.
//!
//! Matching happens in two layers:
//!
//! | Layer | Technique | Used for |
//! |-------|-----------|----------|
//! | 1 | Substring match via [`aho_corasick`] | Service names and aliases |
//! | 2 | Whole-word match over the tokenized text | Verbs, positions, triggers |
//!
//! Quoted names and parameter hints are pulled out with compiled [`regex`]es.

use std::collections::HashSet;
use std::sync::Arc;

use aho_corasick::{AhoCorasick, MatchKind};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use flowbridge_core::{BridgeError, Params, Result, ServiceCategory, ServiceRegistry, TriggerKind};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What the instruction asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    /// Add a configured step (the text mentions "step").
    AddStep,
    /// Add a bare node with empty parameters.
    AddStandaloneNode,
    RemoveStep,
    ModifyStep,
    /// Rename the process itself.
    Rename,
    Activate,
    Deactivate,
    Unknown,
}

/// Where a new step goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    Beginning,
    #[default]
    End,
    Before,
    After,
    Middle,
}

/// Per-step parameter overrides, keyed by node name (graph) or module type
/// (sequential).
pub type Customizations = IndexMap<String, Params>;

/// Structured form of a generation or modification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: IntentAction,
    /// Referenced service ids, in registry order.
    pub services: Vec<String>,
    pub position: InsertPosition,
    /// Quoted name following `node` / `nodes`.
    pub target_name: Option<String>,
    /// Quoted name following `rename`, `call it` or `name it`; with a
    /// target, the quoted name after it following `to`, `as`, `call it` or
    /// `name it`.
    pub new_name: Option<String>,
    pub operation: Option<String>,
    /// The instruction exactly as given.
    pub raw: String,

    // -- Generation extras ---------------------------------------------------
    /// Services, then action verbs, then `ai` when AI was inferred.
    pub keywords: Vec<String>,
    pub trigger: TriggerKind,
    /// Action verbs in vocabulary order.
    pub verbs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customizations: Option<Customizations>,
}

impl Intent {
    /// An intent that asks for nothing.
    pub fn empty(raw: impl Into<String>) -> Self {
        Self {
            action: IntentAction::Unknown,
            services: Vec::new(),
            position: InsertPosition::End,
            target_name: None,
            new_name: None,
            operation: None,
            raw: raw.into(),
            keywords: Vec::new(),
            trigger: TriggerKind::Webhook,
            verbs: Vec::new(),
            customizations: None,
        }
    }

    /// First referenced service, or the generic HTTP service.
    pub fn primary_service(&self) -> &str {
        self.services
            .first()
            .map_or(flowbridge_core::registry::HTTP_SERVICE, String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Action families, checked in this order; the first hit wins.
const ACTION_FAMILIES: &[(&[&str], IntentAction)] = &[
    (&["add", "insert"], IntentAction::AddStep),
    (&["remove", "delete"], IntentAction::RemoveStep),
    (&["change", "modify", "update"], IntentAction::ModifyStep),
    (&["rename"], IntentAction::Rename),
    (&["activate", "enable"], IntentAction::Activate),
    (&["deactivate", "disable"], IntentAction::Deactivate),
];

/// Operations; when several appear the one latest in this list wins.
const OPERATIONS: &[&str] = &["send", "create", "read", "update", "delete", "fetch", "post", "get"];

/// Verbs recorded for generation (naming and keywords).
const ACTION_VERBS: &[&str] = &[
    "send", "create", "update", "delete", "read", "fetch", "process", "analyze", "summarize",
    "extract",
];

const AI_WORDS: &[&str] = &["summarize", "analyze", "generate"];

const TRIGGER_WORDS: &[(&[&str], TriggerKind)] = &[
    (&["schedule", "daily", "hourly"], TriggerKind::Schedule),
    (&["email", "gmail", "outlook"], TriggerKind::Email),
    (&["webhook", "api"], TriggerKind::Webhook),
];

/// Service added when AI is implied but none was named.
const DEFAULT_AI_SERVICE: &str = "openai";

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Compiled instruction parser.
///
/// Not `Clone`: it owns compiled automata.  Wrap in `Arc` to share.
pub struct IntentParser {
    registry: Arc<ServiceRegistry>,
    /// Every needle of every service, lowercased.
    services: AhoCorasick,
    /// Needle index -> service id.
    needle_owner: Vec<String>,
    target_name: Regex,
    new_name: Regex,
    renamed_to: Regex,
    quoted: Regex,
    quoted_span: Regex,
    channel: Regex,
    email: Regex,
}

impl std::fmt::Debug for IntentParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentParser")
            .field("services", &self.registry.len())
            .field("needles", &self.needle_owner.len())
            .finish()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| BridgeError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: e.to_string(),
    })
}

impl IntentParser {
    /// Build a parser over `registry`.
    ///
    /// Fails only if the registry's names cannot be compiled into an
    /// automaton.
    pub fn new(registry: Arc<ServiceRegistry>) -> Result<Self> {
        let mut needles: Vec<String> = Vec::new();
        let mut needle_owner: Vec<String> = Vec::new();
        for (id, _) in registry.iter() {
            for needle in registry.needles(id) {
                needles.push(needle);
                needle_owner.push(id.to_owned());
            }
        }

        let services = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&needles)
            .map_err(|e| BridgeError::InvalidPattern {
                pattern: "<service names>".into(),
                reason: e.to_string(),
            })?;

        debug!(needles = needles.len(), "intent parser built");

        Ok(Self {
            registry,
            services,
            needle_owner,
            target_name: compile(r#"(?i)\bnodes?\s+['"]([^'"]+)['"]"#)?,
            new_name: compile(r#"(?i)\b(?:rename|call\s+it|name\s+it)\b[^'"]*?['"]([^'"]+)['"]"#)?,
            renamed_to: compile(
                r#"(?i)\b(?:to|as|call\s+it|name\s+it)\b[^'"]*?['"]([^'"]+)['"]"#,
            )?,
            quoted: compile(r#"['"]([^'"]*)['"]"#)?,
            quoted_span: compile(r#"(?:^|\W)['"][^'"]*['"]"#)?,
            channel: compile(r#"(?i)\bchannel\s+['"](#?[\w-]+)['"]"#)?,
            email: compile(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)*\.\w+")?,
        })
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Parse `text` into an [`Intent`].
    ///
    /// Verbs and positions are only read outside quoted names, so
    /// `rename it to 'Weekly Update'` is a rename, not an update.
    pub fn parse(&self, text: &str) -> Intent {
        let lowered = text.to_lowercase();
        let unquoted = self.quoted_span.replace_all(&lowered, " ");
        let words = Words::new(&unquoted);

        let mut intent = Intent::empty(text);
        intent.action = detect_action(&words);
        intent.services = self.detect_services(&lowered);
        intent.position = detect_position(&words);

        let target = self
            .target_name
            .captures(text)
            .and_then(|c| c.get(1))
            .filter(|m| !m.as_str().trim().is_empty());
        intent.target_name = target.map(|m| m.as_str().trim().to_owned());
        intent.new_name = match target {
            Some(m) if matches!(intent.action, IntentAction::Rename | IntentAction::ModifyStep) => {
                self.capture(&self.renamed_to, &text[m.end()..])
            }
            _ => self.capture(&self.new_name, text),
        };
        // Renaming a named node edits that step, not the process.
        if intent.action == IntentAction::Rename && intent.target_name.is_some() {
            intent.action = IntentAction::ModifyStep;
        }
        intent.operation = OPERATIONS
            .iter()
            .filter(|op| words.has_verb(op))
            .last()
            .map(|op| (*op).to_owned());

        // Generation extras.
        intent.verbs = ACTION_VERBS
            .iter()
            .filter(|v| words.has_verb(v))
            .map(|v| (*v).to_owned())
            .collect();
        intent.trigger = TRIGGER_WORDS
            .iter()
            .find(|(stems, _)| stems.iter().any(|s| words.has_verb(s)))
            .map_or(TriggerKind::Webhook, |(_, kind)| *kind);

        intent.keywords = intent.services.clone();
        intent.keywords.extend(intent.verbs.iter().cloned());

        let ai_implied = words.has("ai") || AI_WORDS.iter().any(|w| words.has_verb(w));
        if ai_implied {
            let has_ai_service = intent.services.iter().any(|s| {
                self.registry
                    .get(s)
                    .is_some_and(|m| m.category == ServiceCategory::Ai)
            });
            if !has_ai_service && self.registry.contains(DEFAULT_AI_SERVICE) {
                intent.services.push(DEFAULT_AI_SERVICE.to_owned());
            }
            intent.keywords.push("ai".to_owned());
        }

        debug!(
            action = ?intent.action,
            services = ?intent.services,
            position = ?intent.position,
            target = ?intent.target_name,
            "parsed intent"
        );
        intent
    }

    // -- Parameter hints ----------------------------------------------------

    /// Parameters an added step can infer from the instruction: `text`,
    /// `channel`, `to` and `operation`.
    pub fn parameter_hints(&self, text: &str, operation: Option<&str>) -> Params {
        let lowered = text.to_lowercase();
        let words = Words::new(&lowered);
        let mut params = Params::new();

        if words.has_verb("message") || words.has("text") {
            if let Some(quoted) = self.capture(&self.quoted, text) {
                params.insert("text".into(), quoted.into());
            }
        }
        if words.has("channel") {
            if let Some(channel) = self.capture(&self.channel, text) {
                params.insert("channel".into(), channel.into());
            }
        }
        if words.has_verb("email") || lowered.contains("to:") {
            if let Some(address) = self.email.find(text) {
                params.insert("to".into(), address.as_str().into());
            }
        }
        if let Some(op) = operation {
            params.insert("operation".into(), op.into());
        }
        params
    }

    // -- Private helpers ----------------------------------------------------

    fn detect_services(&self, lowered: &str) -> Vec<String> {
        let hits: HashSet<&str> = self
            .services
            .find_overlapping_iter(lowered)
            .map(|m| self.needle_owner[m.pattern().as_usize()].as_str())
            .collect();

        self.registry
            .iter()
            .map(|(id, _)| id)
            .filter(|id| hits.contains(id))
            .map(str::to_owned)
            .collect()
    }

    fn capture(&self, re: &Regex, text: &str) -> Option<String> {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_owned())
            .filter(|s| !s.is_empty())
    }
}

fn detect_action(words: &Words<'_>) -> IntentAction {
    let Some(&(_, action)) = ACTION_FAMILIES
        .iter()
        .find(|(verbs, _)| verbs.iter().any(|v| words.has_verb(v)))
    else {
        return IntentAction::Unknown;
    };

    match action {
        IntentAction::AddStep if !words.has_verb("step") => IntentAction::AddStandaloneNode,
        other => other,
    }
}

fn detect_position(words: &Words<'_>) -> InsertPosition {
    if ["beginning", "start", "first"].iter().any(|w| words.has_verb(w)) {
        InsertPosition::Beginning
    } else if words.has("after") {
        InsertPosition::After
    } else if words.has("before") {
        InsertPosition::Before
    } else if words.has("middle") {
        InsertPosition::Middle
    } else {
        InsertPosition::End
    }
}

// ---------------------------------------------------------------------------
// Word matching
// ---------------------------------------------------------------------------

/// Lowercased text split into alphanumeric words.
struct Words<'a> {
    words: Vec<&'a str>,
}

impl<'a> Words<'a> {
    fn new(lowered: &'a str) -> Self {
        Self {
            words: lowered
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Exact word.
    fn has(&self, word: &str) -> bool {
        self.words.iter().any(|w| *w == word)
    }

    /// `verb` or one of its regular inflections.
    fn has_verb(&self, verb: &str) -> bool {
        self.words.iter().any(|w| is_form_of(w, verb))
    }
}

/// `adds`, `added`, `adding` are forms of `add`; `removed` and `removing` are
/// forms of `remove`.
fn is_form_of(word: &str, verb: &str) -> bool {
    let Some(rest) = word.strip_prefix(verb) else {
        return verb
            .strip_suffix('e')
            .and_then(|stem| word.strip_prefix(stem))
            .is_some_and(|rest| rest == "ing");
    };
    matches!(rest, "" | "s" | "es" | "ed" | "ing")
        || (verb.ends_with('e') && rest == "d")
        || (verb.len() <= 3 && rest.len() > 1 && {
            // `add` -> `added` needs no doubling, but `get` -> `getting` does.
            let last = &verb[verb.len() - 1..];
            rest.strip_prefix(last).is_some_and(|r| r == "ing" || r == "ed")
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
