//! Builds the document tree from `pulldown-cmark` events, gated by the rule table.
//!
//! Each engine construct maps to one rule name. When that rule is not in the table the construct
//! is not recognized: its source text is kept verbatim, as a `text` node inline or as a paragraph
//! holding that text at block level.
use crate::ast::ColumnAlign;
use crate::ast::Node;
use crate::ast::NodeKind;
use crate::error::RenderError;
use crate::error::Result;
use crate::render::MAX_NESTING;
use crate::rules::RuleTable;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::LinkType;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use std::ops::Range;
use tracing::trace;
use url::Url;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Block,
    /// Only the inline content of the first paragraph.
    Inline,
}

pub struct MarkdownParser<'r> {
    rules: &'r RuleTable,
}

impl<'r> MarkdownParser<'r> {
    pub fn new(rules: &'r RuleTable) -> Self {
        Self { rules }
    }

    pub fn parse(&self, source: &str, mode: ParseMode) -> Result<Vec<Node>> {
        for required in ["paragraph", "text"] {
            if !self.has(required) {
                return Err(RenderError::missing_rule(required));
            }
        }

        let mut tree = TreeBuilder::default();
        let mut events = Parser::new_ext(source, self.options()).into_offset_iter();
        while let Some((event, range)) = events.next() {
            let literal = &source[range.clone()];
            match event {
                Event::Start(Tag::HtmlBlock) => {
                    tree.push_block_literal(literal);
                    skip_element(&mut events);
                }
                Event::Start(tag) => match self.open_kind(&tag, literal) {
                    Ok(kind) => tree.open(kind)?,
                    Err(rule) => {
                        trace!(rule, "construct kept as literal text");
                        if is_block(&tag) {
                            tree.push_block_literal(literal);
                        } else {
                            tree.push(Node::text(literal));
                        }
                        skip_element(&mut events);
                    }
                },
                Event::End(_) => tree.close(),
                Event::Text(text) => tree.push(Node::text(text.into_string())),
                Event::Code(code) => {
                    if self.has("inlineCode") {
                        tree.push(Node::leaf(NodeKind::InlineCode, code.into_string()));
                    } else {
                        tree.push(Node::text(literal));
                    }
                }
                Event::SoftBreak => tree.push(Node::text(" ")),
                Event::HardBreak => {
                    if self.has("br") {
                        tree.push(Node::leaf(NodeKind::Br, ""));
                    } else {
                        tree.push(Node::text(" "));
                    }
                }
                Event::Rule => {
                    if self.has("hr") {
                        tree.push(Node::leaf(NodeKind::Hr, ""));
                    } else {
                        tree.push_block_literal(literal);
                    }
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    tree.push(Node::text(html.into_string()))
                }
                _ => tree.push(Node::text(literal)),
            }
        }

        let blocks = tree.finish();
        Ok(match mode {
            ParseMode::Block => blocks,
            ParseMode::Inline => blocks
                .into_iter()
                .find(|node| node.kind == NodeKind::Paragraph)
                .map(|node| node.content.into_children())
                .unwrap_or_default(),
        })
    }

    fn has(&self, rule: &str) -> bool {
        self.rules.contains_key(rule)
    }

    fn options(&self) -> Options {
        let mut options = Options::empty();
        if self.has("table") || self.has("nptable") {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.has("del") {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        options
    }

    /// The node kind for `tag`, or the name of the missing rule that recognizes it.
    fn open_kind(&self, tag: &Tag<'_>, literal: &str) -> std::result::Result<NodeKind, &'static str> {
        let (rule, kind) = match tag {
            Tag::Paragraph => ("paragraph", NodeKind::Paragraph),
            Tag::Heading { level, .. } => {
                let rule = if is_setext(literal) {
                    "lheading"
                } else {
                    "heading"
                };
                (
                    rule,
                    NodeKind::Heading {
                        level: heading_level(*level),
                    },
                )
            }
            Tag::BlockQuote(_) => ("blockQuote", NodeKind::BlockQuote),
            Tag::CodeBlock(CodeBlockKind::Fenced(lang)) => (
                "fence",
                NodeKind::CodeBlock {
                    lang: fence_lang(lang),
                },
            ),
            Tag::CodeBlock(CodeBlockKind::Indented) => {
                ("codeBlock", NodeKind::CodeBlock { lang: None })
            }
            Tag::List(start) => (
                "list",
                NodeKind::List {
                    ordered: start.is_some(),
                    start: start.unwrap_or(1),
                },
            ),
            Tag::Item => ("list", NodeKind::ListItem),
            Tag::Table(aligns) => {
                let rule = if literal.trim_start().starts_with('|') {
                    "table"
                } else {
                    "nptable"
                };
                let aligns = aligns.iter().cloned().map(ColumnAlign::from).collect();
                (rule, NodeKind::Table { aligns })
            }
            Tag::TableHead => ("table", NodeKind::TableHead),
            Tag::TableRow => ("table", NodeKind::TableRow),
            Tag::TableCell => ("table", NodeKind::TableCell),
            Tag::Emphasis => ("em", NodeKind::Em),
            Tag::Strong if literal.starts_with("__") && self.has("u") => ("u", NodeKind::U),
            Tag::Strong => ("strong", NodeKind::Strong),
            Tag::Strikethrough => ("del", NodeKind::Del),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let (rule, target) = match link_type {
                    LinkType::Inline => ("link", sanitize_target(dest_url)),
                    LinkType::Autolink => ("autolink", sanitize_target(dest_url)),
                    LinkType::Email => ("mailto", Some(mailto(dest_url))),
                    _ => ("reflink", sanitize_target(dest_url)),
                };
                (
                    rule,
                    NodeKind::Link {
                        target,
                        title: title.to_string(),
                    },
                )
            }
            Tag::Image {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let rule = if matches!(link_type, LinkType::Inline) {
                    "image"
                } else {
                    "refimage"
                };
                (
                    rule,
                    NodeKind::Image {
                        target: sanitize_target(dest_url),
                        title: title.to_string(),
                    },
                )
            }
            _ => return Err("text"),
        };

        if self.has(rule) { Ok(kind) } else { Err(rule) }
    }
}

struct Frame {
    kind: NodeKind,
    children: Vec<Node>,
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    root: Vec<Node>,
}

impl TreeBuilder {
    /// Starts a container; the tree never grows deeper than [`MAX_NESTING`].
    fn open(&mut self, kind: NodeKind) -> Result<()> {
        if self.stack.len() >= MAX_NESTING {
            return Err(RenderError::NestingTooDeep { depth: MAX_NESTING });
        }
        self.stack.push(Frame {
            kind,
            children: Vec::new(),
        });
        Ok(())
    }

    fn close(&mut self) {
        let Some(Frame { kind, children }) = self.stack.pop() else {
            return;
        };
        let node = match kind {
            NodeKind::CodeBlock { .. } => {
                let code = children.iter().map(Node::plain_text).collect::<String>();
                Node::leaf(kind, code)
            }
            kind => Node::container(kind, children),
        };
        self.push(node);
    }

    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => frame.children.push(node),
            None => self.root.push(node),
        }
    }

    fn push_block_literal(&mut self, literal: &str) {
        let literal = literal.trim_end();
        if !literal.is_empty() {
            self.push(Node::paragraph(vec![Node::text(literal)]));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.stack.is_empty() {
            self.close();
        }
        self.root
    }
}

/// Consumes events up to and including the end of the element whose start was just read.
fn skip_element<'a>(events: &mut impl Iterator<Item = (Event<'a>, Range<usize>)>) {
    let mut depth = 1usize;
    for (event, _) in events.by_ref() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
            _ => {}
        }
    }
}

fn is_block(tag: &Tag<'_>) -> bool {
    !matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
    )
}

/// Whether a heading's source ends in a `===` or `---` underline.
fn is_setext(literal: &str) -> bool {
    literal
        .trim_end()
        .lines()
        .last()
        .map(str::trim)
        .is_some_and(|line| {
            !line.is_empty() && (line.chars().all(|c| c == '=') || line.chars().all(|c| c == '-'))
        })
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn fence_lang(info: &str) -> Option<String> {
    let first = info.split_whitespace().next()?;
    let first = first.split(',').next().unwrap_or(first);
    let first = first.strip_prefix("language-").unwrap_or(first);
    (!first.is_empty()).then(|| first.to_string())
}

/// Drops targets that would run script or embed content when followed.
fn sanitize_target(dest: &str) -> Option<String> {
    let dest = dest.trim();
    if dest.is_empty() {
        return None;
    }
    let compact: String = dest
        .chars()
        .filter(|ch| !ch.is_whitespace() && !ch.is_control())
        .collect();
    if let Ok(url) = Url::parse(&compact)
        && matches!(url.scheme(), "javascript" | "vbscript" | "data")
    {
        return None;
    }
    Some(dest.to_string())
}

fn mailto(address: &str) -> String {
    if address.starts_with("mailto:") {
        address.to_string()
    } else {
        format!("mailto:{address}")
    }
}
