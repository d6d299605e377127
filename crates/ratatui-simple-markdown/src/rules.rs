//! Rule tables: which markdown constructs are recognized and how each one is drawn.
//!
//! A render pass builds its table in layers with [`RuleSetBuilder`]:
//!
//! 1. [`RuleSetBuilder::engine_defaults`]: every construct the parser knows, no markers (the
//!    renderer falls back to plain ASCII glyphs).
//! 2. [`initial_rules`] (or caller-supplied initial rules): the component's own look.
//! 3. The caller's per-render overrides.
//!
//! and finally narrows it with [`select_rules`].
use crate::ast::Node;
use crate::error::Result;
use crate::render::Output;
use crate::render::OutputContext;
use ratatui_simple_markdown_core::styles::region;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Rule names that survive every whitelist and blacklist.
pub const DEFAULT_RULES: [&str; 2] = ["paragraph", "text"];

/// Every rule name the parser and renderer understand, in the order the engine lists them.
pub const ENGINE_RULES: [&str; 28] = [
    "heading",
    "nptable",
    "lheading",
    "hr",
    "codeBlock",
    "fence",
    "blockQuote",
    "list",
    "def",
    "table",
    "tableSeparator",
    "newline",
    "paragraph",
    "escape",
    "autolink",
    "mailto",
    "url",
    "link",
    "image",
    "reflink",
    "refimage",
    "em",
    "strong",
    "u",
    "del",
    "inlineCode",
    "br",
    "text",
];

/// Custom output for a rule, replacing the built-in rendering of its nodes.
pub type RuleOutput =
    Arc<dyn Fn(&Node, &mut OutputContext<'_>) -> Result<Output> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct Rule {
    /// Style region the rule's nodes are painted with.
    pub region: String,
    /// Glyphs drawn by the rule: list bullet, quote bar, divider, cell separator, image label.
    pub marker: Option<String>,
    pub output: Option<RuleOutput>,
}

impl Rule {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            marker: None,
            output: None,
        }
    }

    /// Applies the fields set in `patch`, keeping the rest.
    pub fn apply(&mut self, patch: &RulePatch) {
        if let Some(region) = &patch.region {
            self.region = region.clone();
        }
        if let Some(marker) = &patch.marker {
            self.marker = Some(marker.clone());
        }
        if let Some(output) = &patch.output {
            self.output = Some(output.clone());
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("region", &self.region)
            .field("marker", &self.marker)
            .field("output", &self.output.as_ref().map(|_| ".."))
            .finish()
    }
}

pub type RuleTable = BTreeMap<String, Rule>;

/// A partial [`Rule`]; unset fields leave the underlying rule alone.
#[derive(Clone, Default)]
pub struct RulePatch {
    pub region: Option<String>,
    pub marker: Option<String>,
    pub output: Option<RuleOutput>,
}

impl RulePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn output<F>(mut self, output: F) -> Self
    where
        F: Fn(&Node, &mut OutputContext<'_>) -> Result<Output> + Send + Sync + 'static,
    {
        self.output = Some(Arc::new(output));
        self
    }
}

impl fmt::Debug for RulePatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulePatch")
            .field("region", &self.region)
            .field("marker", &self.marker)
            .field("output", &self.output.as_ref().map(|_| ".."))
            .finish()
    }
}

pub type RulePatches = BTreeMap<String, RulePatch>;

/// Builds a [`RuleTable`] from ordered layers of [`RulePatches`].
///
/// Each layer merges field by field into the rules already present; a patch for a name the table
/// does not have yet adds a rule whose region defaults to that name.
#[derive(Clone, Debug, Default)]
pub struct RuleSetBuilder {
    table: RuleTable,
}

impl RuleSetBuilder {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn engine_defaults() -> Self {
        let table = ENGINE_RULES
            .iter()
            .map(|name| (name.to_string(), Rule::new(engine_region(name))))
            .collect();
        Self { table }
    }

    pub fn layer(mut self, patches: &RulePatches) -> Self {
        for (name, patch) in patches {
            self.table
                .entry(name.clone())
                .or_insert_with(|| Rule::new(name.clone()))
                .apply(patch);
        }
        self
    }

    pub fn build(self) -> RuleTable {
        self.table
    }
}

fn engine_region(name: &str) -> &str {
    match name {
        "lheading" => region::HEADING,
        "fence" => region::CODE_BLOCK,
        "nptable" | "tableSeparator" => region::TABLE,
        "reflink" | "url" | "autolink" | "mailto" => region::LINK,
        "refimage" => region::IMAGE,
        "def" | "newline" | "escape" | "br" => region::TEXT,
        other => other,
    }
}

/// The component's own rule layer: unicode markers suited to a terminal.
pub fn initial_rules() -> RulePatches {
    [
        ("list", RulePatch::new().marker("• ")),
        ("blockQuote", RulePatch::new().marker("│ ")),
        ("hr", RulePatch::new().marker("─")),
        ("table", RulePatch::new().marker(" │ ")),
        ("nptable", RulePatch::new().marker(" │ ")),
        ("image", RulePatch::new().marker("Image: ")),
        ("refimage", RulePatch::new().marker("Image: ")),
    ]
    .into_iter()
    .map(|(name, patch)| (name.to_string(), patch))
    .collect()
}

/// Narrows `full` to the rules a render pass may use.
///
/// - A non-empty `whitelist` keeps only the listed names plus [`DEFAULT_RULES`].
/// - Otherwise a non-empty `blacklist` drops the listed names, except [`DEFAULT_RULES`].
/// - Otherwise `full` is returned unchanged.
///
/// Names that are not in `full` are ignored.
pub fn select_rules<V>(
    full: BTreeMap<String, V>,
    whitelist: &[String],
    blacklist: &[String],
) -> BTreeMap<String, V> {
    if !whitelist.is_empty() {
        full.into_iter()
            .filter(|(name, _)| is_default(name) || whitelist.iter().any(|w| w == name))
            .collect()
    } else if !blacklist.is_empty() {
        full.into_iter()
            .filter(|(name, _)| is_default(name) || !blacklist.iter().any(|b| b == name))
            .collect()
    } else {
        full
    }
}

fn is_default(name: &str) -> bool {
    DEFAULT_RULES.contains(&name)
}
