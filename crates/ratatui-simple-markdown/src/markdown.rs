use crate::error::RenderError;
use crate::error::Result;
use crate::normalize::normalize_tree;
use crate::parse::MarkdownParser;
use crate::parse::ParseMode;
use crate::render::render_tree;
use crate::rules::RulePatches;
use crate::rules::RuleSetBuilder;
use crate::rules::RuleTable;
use crate::rules::initial_rules;
use crate::rules::select_rules;
use crate::view::MarkdownWidget;
use crate::view::ViewBlock;
use crate::view::ViewNode;
use ratatui_simple_markdown_core::styles::StyleSheet;
use ratatui_simple_markdown_core::styles::region;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use tracing::error;

/// Receives a failed pass's error and the markdown source it was rendering.
pub type ErrorHandler = Arc<dyn Fn(&RenderError, &str) + Send + Sync + 'static>;

/// Appended to every source so the last block is always closed.
const TERMINATOR: &str = "\n\n";

#[derive(Clone)]
pub struct MarkdownOptions {
    /// Shallow overrides on top of [`StyleSheet::default`].
    pub styles: StyleSheet,
    /// The component's own rule layer, applied over the engine defaults.
    pub initial_rules: RulePatches,
    /// Caller overrides, applied last.
    pub rules: RulePatches,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
    pub error_handler: Option<ErrorHandler>,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            styles: StyleSheet::empty(),
            initial_rules: initial_rules(),
            rules: RulePatches::new(),
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            error_handler: None,
        }
    }
}

impl fmt::Debug for MarkdownOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownOptions")
            .field("styles", &self.styles)
            .field("initial_rules", &self.initial_rules)
            .field("rules", &self.rules)
            .field("whitelist", &self.whitelist)
            .field("blacklist", &self.blacklist)
            .field("error_handler", &self.error_handler.as_ref().map(|_| ".."))
            .finish()
    }
}

impl MarkdownOptions {
    pub fn styles(mut self, styles: StyleSheet) -> Self {
        self.styles = styles;
        self
    }

    pub fn initial_rules(mut self, rules: RulePatches) -> Self {
        self.initial_rules = rules;
        self
    }

    pub fn rules(mut self, rules: RulePatches) -> Self {
        self.rules = rules;
        self
    }

    pub fn whitelist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn blacklist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RenderError, &str) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// The merged style sheet a pass paints with.
    pub fn style_sheet(&self) -> StyleSheet {
        StyleSheet::default().merged(&self.styles)
    }

    /// The rule table a pass parses and renders with.
    pub fn rule_table(&self) -> RuleTable {
        let full = RuleSetBuilder::engine_defaults()
            .layer(&self.initial_rules)
            .layer(&self.rules)
            .build();
        select_rules(full, &self.whitelist, &self.blacklist)
    }
}

/// A markdown source plus the options it renders with.
///
/// [`Markdown::render`] keeps its result until the source or the style overrides change, or the
/// options are replaced with [`Markdown::set_options`].
#[derive(Clone, Debug, Default)]
pub struct Markdown {
    source: String,
    options: MarkdownOptions,
    rendered: Option<ViewNode>,
}

impl Markdown {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Joins `parts` into a single source, as if they were one string.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let source = parts.into_iter().fold(String::new(), |mut acc, part| {
            acc.push_str(part.as_ref());
            acc
        });
        Self::new(source)
    }

    pub fn with_options(mut self, options: MarkdownOptions) -> Self {
        self.set_options(options);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    pub fn set_markdown(&mut self, source: impl Into<String>) {
        let source = source.into();
        if source != self.source {
            self.source = source;
            self.rendered = None;
        }
    }

    pub fn set_styles(&mut self, styles: StyleSheet) {
        if styles != self.options.styles {
            self.options.styles = styles;
            self.rendered = None;
        }
    }

    pub fn set_options(&mut self, options: MarkdownOptions) {
        self.options = options;
        self.rendered = None;
    }

    /// Runs a full pass: rules, parse, normalize, render.
    pub fn try_render(&self) -> Result<ViewNode> {
        let styles = self.options.style_sheet();
        let rules = self.options.rule_table();

        let mut source = String::with_capacity(self.source.len() + TERMINATOR.len());
        source.push_str(&self.source);
        source.push_str(TERMINATOR);

        let tree = MarkdownParser::new(&rules).parse(&source, ParseMode::Block)?;
        let tree = normalize_tree(tree);
        let content = render_tree(&tree, &rules, &styles)?;
        debug!(
            source_len = self.source.len(),
            rules = rules.len(),
            blocks = content.len(),
            "rendered markdown"
        );
        Ok(root_view(&styles, content))
    }

    /// The rendered view, re-rendering only when something it depends on changed.
    ///
    /// A failed pass goes to the error handler (or the log) and renders as an empty root view.
    pub fn render(&mut self) -> &ViewNode {
        let root = match self.rendered.take() {
            Some(root) => root,
            None => self.try_render().unwrap_or_else(|err| {
                self.report(&err);
                root_view(&self.options.style_sheet(), Vec::new())
            }),
        };
        self.rendered.insert(root)
    }

    pub fn widget(&mut self) -> MarkdownWidget<'_> {
        MarkdownWidget::new(self.render())
    }

    fn report(&self, err: &RenderError) {
        match &self.options.error_handler {
            Some(handler) => handler(err, &self.source),
            None => error!(error = %err, "markdown render failed"),
        }
    }
}

fn root_view(styles: &StyleSheet, content: Vec<ViewNode>) -> ViewNode {
    ViewNode::View(
        ViewBlock::new(region::VIEW, styles.style(region::VIEW))
            .with_gap(1)
            .with_children(content),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;
    use ratatui::style::Style;
    use std::sync::Mutex;

    #[test]
    fn renders_blocks_under_a_root_view() {
        let mut md = Markdown::new("# Title\n\nbody");
        let root = md.render();
        assert_eq!(root.region(), "view");
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.plain_lines(40), vec!["Title", "", "body"]);
    }

    #[test]
    fn from_parts_joins_without_separator() {
        let md = Markdown::from_parts(["**a", "b**"]);
        assert_eq!(md.source(), "**ab**");
    }

    #[test]
    fn cache_survives_unchanged_updates() {
        let mut md = Markdown::new("a");
        md.render();
        md.set_markdown("a");
        md.set_styles(StyleSheet::empty());
        assert!(md.rendered.is_some());

        md.set_markdown("b");
        assert!(md.rendered.is_none());
        assert_eq!(md.render().plain_lines(10), vec!["b"]);
    }

    #[test]
    fn style_changes_invalidate() {
        let mut md = Markdown::new("a");
        md.render();
        md.set_styles(StyleSheet::empty().with(region::TEXT, Style::default().fg(Color::Red)));
        assert!(md.rendered.is_none());
    }

    #[test]
    fn set_options_always_invalidates() {
        let mut md = Markdown::new("a");
        md.render();
        md.set_options(MarkdownOptions::default());
        assert!(md.rendered.is_none());
    }

    #[test]
    fn errors_reach_the_handler_with_the_source() {
        let seen: Arc<Mutex<Vec<(RenderError, String)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let options = MarkdownOptions::default()
            .whitelist(["fence"])
            .error_handler(move |err, source| {
                if let Ok(mut seen) = sink.lock() {
                    seen.push((err.clone(), source.to_string()));
                }
            });
        let mut md = Markdown::new("```\ncode\n```").with_options(options);

        assert!(md.render().children().is_empty());
        let seen = seen.lock().expect("lock");
        assert_eq!(
            *seen,
            vec![(RenderError::missing_rule("codeBlock"), "```\ncode\n```".to_string())]
        );
    }

    #[test]
    fn failed_pass_without_handler_renders_empty_root() {
        let mut md = Markdown::new("```\ncode\n```")
            .with_options(MarkdownOptions::default().whitelist(["fence"]));
        let root = md.render();
        assert_eq!(root.region(), "view");
        assert!(root.children().is_empty());
    }
}
