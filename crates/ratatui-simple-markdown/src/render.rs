//! Turns a normalized document tree into a [`ViewNode`] hierarchy.
//!
//! Every node is drawn by the rule its kind names (see [`NodeKind::rule_name`]). A rule with an
//! `output` callback replaces the built-in drawing for its nodes; otherwise the rule's region
//! picks the style and its marker picks the glyphs.
use crate::ast::ColumnAlign;
use crate::ast::Content;
use crate::ast::Node;
use crate::ast::NodeKind;
use crate::error::RenderError;
use crate::error::Result;
use crate::rules::Rule;
use crate::rules::RuleTable;
use crate::view::Divider;
use crate::view::TextBlock;
use crate::view::ViewBlock;
use crate::view::ViewNode;
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui_simple_markdown_core::styles::StyleSheet;
use ratatui_simple_markdown_core::styles::region;
use ratatui_simple_markdown_core::wrapping::WrapMode;
use ratatui_simple_markdown_core::wrapping::spans_width;
use std::borrow::Cow;

/// Deepest block/inline nesting a render pass accepts.
pub const MAX_NESTING: usize = 64;

const FALLBACK_BULLET: &str = "- ";
const FALLBACK_QUOTE: &str = "> ";
const FALLBACK_DIVIDER: &str = "-";
const FALLBACK_CELL_SEPARATOR: &str = " | ";
const FALLBACK_IMAGE: &str = "image: ";
const CODE_INDENT: &str = "    ";

/// What a custom rule output produces for a node.
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    Block(ViewNode),
    Inline(Vec<Span<'static>>),
}

/// Render state handed to rule outputs; also drives the built-in drawing.
pub struct OutputContext<'a> {
    rules: &'a RuleTable,
    styles: &'a StyleSheet,
    depth: usize,
}

/// Renders `tree` into one view node per top-level block.
pub fn render_tree(tree: &[Node], rules: &RuleTable, styles: &StyleSheet) -> Result<Vec<ViewNode>> {
    OutputContext::new(rules, styles).render_blocks(tree)
}

impl<'a> OutputContext<'a> {
    pub fn new(rules: &'a RuleTable, styles: &'a StyleSheet) -> Self {
        Self {
            rules,
            styles,
            depth: 0,
        }
    }

    pub fn styles(&self) -> &'a StyleSheet {
        self.styles
    }

    pub fn rules(&self) -> &'a RuleTable {
        self.rules
    }

    pub fn rule(&self, name: &str) -> Result<&'a Rule> {
        self.rules
            .get(name)
            .ok_or_else(|| RenderError::missing_rule(name))
    }

    /// The style of `rule`'s region.
    pub fn rule_style(&self, rule: &Rule) -> Style {
        self.styles.style(&rule.region)
    }

    pub fn render_blocks(&mut self, nodes: &[Node]) -> Result<Vec<ViewNode>> {
        nodes.iter().map(|node| self.render_block(node)).collect()
    }

    pub fn render_block(&mut self, node: &Node) -> Result<ViewNode> {
        self.descend()?;
        let out = self.block(node);
        self.depth -= 1;
        out
    }

    /// Renders `nodes` as inline spans layered over `base`.
    pub fn render_inlines(&mut self, nodes: &[Node], base: Style) -> Result<Vec<Span<'static>>> {
        let mut out = Vec::new();
        for node in nodes {
            self.render_inline(node, base, &mut out)?;
        }
        Ok(out)
    }

    pub fn render_inline(
        &mut self,
        node: &Node,
        base: Style,
        out: &mut Vec<Span<'static>>,
    ) -> Result<()> {
        self.descend()?;
        let res = self.inline(node, base, out);
        self.depth -= 1;
        res
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(RenderError::NestingTooDeep { depth: MAX_NESTING });
        }
        self.depth += 1;
        Ok(())
    }

    fn block(&mut self, node: &Node) -> Result<ViewNode> {
        let rule = self.rule(node.kind.rule_name())?;
        if let Some(output) = &rule.output {
            return match output(node, self)? {
                Output::Block(view) => Ok(view),
                Output::Inline(spans) => Ok(text_block(&rule.region, spans, WrapMode::Word)),
            };
        }

        let style = self.rule_style(rule);
        match &node.kind {
            NodeKind::Paragraph => {
                let spans = self.render_inlines(&child_nodes(node), style)?;
                Ok(text_block(&rule.region, spans, WrapMode::Word))
            }
            NodeKind::Heading { level } => {
                let style = style.patch(self.styles.heading(*level));
                let spans = self.render_inlines(&child_nodes(node), style)?;
                Ok(text_block(&rule.region, spans, WrapMode::Word))
            }
            NodeKind::CodeBlock { .. } => {
                let code = node.plain_text();
                let code = code.strip_suffix('\n').unwrap_or(&code).to_string();
                let body = text_block(&rule.region, vec![Span::styled(code, style)], WrapMode::None);
                Ok(ViewNode::View(
                    ViewBlock::new(rule.region.clone(), Style::default())
                        .with_prefix(vec![Span::raw(CODE_INDENT)])
                        .with_children(vec![body]),
                ))
            }
            NodeKind::BlockQuote => {
                let marker = rule.marker.as_deref().unwrap_or(FALLBACK_QUOTE);
                let children = self.render_mixed(node.content.children(), &rule.region, style)?;
                Ok(ViewNode::View(
                    ViewBlock::new(rule.region.clone(), style)
                        .with_prefix(vec![Span::raw(marker.to_string())])
                        .with_gap(1)
                        .with_children(children),
                ))
            }
            NodeKind::List { ordered, start } => {
                self.render_list(rule, *ordered, *start, node.content.children())
            }
            NodeKind::Hr => Ok(ViewNode::Divider(Divider {
                region: rule.region.clone(),
                glyph: rule
                    .marker
                    .clone()
                    .unwrap_or_else(|| FALLBACK_DIVIDER.to_string()),
                style,
            })),
            NodeKind::Table { aligns } => self.render_table(rule, aligns, node.content.children()),
            kind if kind.is_inline() => {
                let spans = self.render_inlines(std::slice::from_ref(node), Style::default())?;
                Ok(text_block(&rule.region, spans, WrapMode::Word))
            }
            _ => {
                let children = self.render_mixed(node.content.children(), &rule.region, style)?;
                Ok(ViewNode::View(
                    ViewBlock::new(rule.region.clone(), Style::default()).with_children(children),
                ))
            }
        }
    }

    fn inline(&mut self, node: &Node, base: Style, out: &mut Vec<Span<'static>>) -> Result<()> {
        let rule = self.rule(node.kind.rule_name())?;
        if let Some(output) = &rule.output {
            return match output(node, self)? {
                Output::Inline(spans) => {
                    out.extend(spans);
                    Ok(())
                }
                Output::Block(_) => Err(RenderError::rule(
                    node.kind.rule_name(),
                    "block output where inline content was expected",
                )),
            };
        }

        let style = base.patch(self.rule_style(rule));
        match (&node.kind, &node.content) {
            (NodeKind::Br, _) => out.push(Span::styled("\n", style)),
            (NodeKind::Image { target, .. }, _) => {
                let marker = rule.marker.as_deref().unwrap_or(FALLBACK_IMAGE);
                let mut label = format!("{marker}{}", node.plain_text());
                if let Some(target) = target {
                    label.push_str(" → ");
                    label.push_str(target);
                }
                out.push(Span::styled(label, style));
            }
            (_, Content::Leaf(text)) => {
                if !text.is_empty() {
                    out.push(Span::styled(text.clone(), style));
                }
            }
            (_, Content::Container(children)) => {
                for child in children {
                    self.render_inline(child, style, out)?;
                }
            }
        }
        Ok(())
    }

    /// Renders a mix of inline and block nodes; consecutive inline nodes share one text block.
    fn render_mixed(&mut self, nodes: &[Node], region: &str, base: Style) -> Result<Vec<ViewNode>> {
        let mut out = Vec::new();
        let mut pending: Vec<Span<'static>> = Vec::new();
        let mut has_inline = false;
        for node in nodes {
            if node.kind.is_inline() {
                self.render_inline(node, base, &mut pending)?;
                has_inline = true;
                continue;
            }
            if has_inline {
                out.push(text_block(region, std::mem::take(&mut pending), WrapMode::Word));
                has_inline = false;
            }
            out.push(self.render_block(node)?);
        }
        if has_inline {
            out.push(text_block(region, pending, WrapMode::Word));
        }
        Ok(out)
    }

    fn render_list(
        &mut self,
        rule: &'a Rule,
        ordered: bool,
        start: u64,
        items: &[Node],
    ) -> Result<ViewNode> {
        let style = self.rule_style(rule);
        let item_style = style.patch(self.styles.style(region::LIST_ITEM));
        let bullet = rule.marker.as_deref().unwrap_or(FALLBACK_BULLET);

        let mut children = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let marker = if ordered {
                Span::styled(
                    format!("{}. ", start.saturating_add(idx as u64)),
                    self.styles.style(region::LIST_ITEM_NUMBER),
                )
            } else {
                Span::styled(bullet.to_string(), self.styles.style(region::LIST_ITEM_BULLET))
            };
            let indent = " ".repeat(spans_width(std::slice::from_ref(&marker)));

            let body = if item.kind == NodeKind::ListItem {
                self.descend()?;
                let body = self.render_mixed(item.content.children(), region::LIST_ITEM, item_style);
                self.depth -= 1;
                body?
            } else {
                self.render_mixed(std::slice::from_ref(item), region::LIST_ITEM, item_style)?
            };

            children.push(ViewNode::View(
                ViewBlock::new(region::LIST_ITEM, Style::default())
                    .with_prefixes(vec![marker], vec![Span::raw(indent)])
                    .with_children(body),
            ));
        }

        Ok(ViewNode::View(
            ViewBlock::new(rule.region.clone(), style).with_children(children),
        ))
    }

    fn render_table(
        &mut self,
        rule: &'a Rule,
        aligns: &[ColumnAlign],
        parts: &[Node],
    ) -> Result<ViewNode> {
        let style = self.rule_style(rule);
        let header_style = style
            .patch(self.styles.style(region::TABLE_HEADER))
            .patch(self.styles.style(region::TABLE_HEADER_CELL));
        let cell_style = style
            .patch(self.styles.style(region::TABLE_ROW))
            .patch(self.styles.style(region::TABLE_ROW_CELL));

        let mut rows: Vec<(bool, Vec<Vec<Span<'static>>>)> = Vec::new();
        for part in parts {
            self.collect_rows(part, header_style, cell_style, &mut rows)?;
        }

        let columns = rows.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for (_, cells) in &rows {
            for (col, cell) in cells.iter().enumerate() {
                widths[col] = widths[col].max(spans_width(cell));
            }
        }

        let separator = rule
            .marker
            .clone()
            .unwrap_or_else(|| FALLBACK_CELL_SEPARATOR.to_string());
        let mut lines = Vec::with_capacity(rows.len() + 1);
        for (header, cells) in rows {
            let mut spans = Vec::new();
            for (col, width) in widths.iter().enumerate() {
                if col > 0 {
                    spans.push(Span::styled(separator.clone(), style));
                }
                let cell = cells.get(col).cloned().unwrap_or_default();
                let align = aligns.get(col).copied().unwrap_or_default();
                spans.extend(pad_cell(cell, *width, align));
            }
            let region = if header {
                region::TABLE_HEADER
            } else {
                region::TABLE_ROW
            };
            lines.push(text_block(region, spans, WrapMode::None));
            if header {
                let rule_line = header_rule(&separator, &widths);
                lines.push(text_block(
                    region::TABLE_HEADER,
                    vec![Span::styled(rule_line, style)],
                    WrapMode::None,
                ));
            }
        }

        Ok(ViewNode::View(
            ViewBlock::new(rule.region.clone(), style).with_children(lines),
        ))
    }

    fn collect_rows(
        &mut self,
        part: &Node,
        header_style: Style,
        cell_style: Style,
        rows: &mut Vec<(bool, Vec<Vec<Span<'static>>>)>,
    ) -> Result<()> {
        let header = part.kind == NodeKind::TableHead;
        let children = part.content.children();
        // The engine puts header cells straight under the head; body cells sit in rows.
        if children.iter().any(|c| c.kind == NodeKind::TableRow) {
            for row in children {
                self.collect_rows(row, header_style, cell_style, rows)?;
            }
            return Ok(());
        }
        let style = if header { header_style } else { cell_style };
        let mut cells = Vec::with_capacity(children.len());
        for cell in children.iter().filter(|c| c.kind == NodeKind::TableCell) {
            cells.push(self.render_inlines(cell.content.children(), style)?);
        }
        rows.push((header, cells));
        Ok(())
    }
}

fn text_block(region: &str, spans: Vec<Span<'static>>, wrap: WrapMode) -> ViewNode {
    ViewNode::Text(TextBlock {
        region: region.to_string(),
        spans,
        wrap,
    })
}

/// Inline children of `node`; leaf content reads as a single text run.
fn child_nodes(node: &Node) -> Cow<'_, [Node]> {
    match &node.content {
        Content::Container(children) => Cow::Borrowed(children),
        Content::Leaf(text) => Cow::Owned(vec![Node::text(text.clone())]),
    }
}

fn pad_cell(cell: Vec<Span<'static>>, width: usize, align: ColumnAlign) -> Vec<Span<'static>> {
    let fill = width.saturating_sub(spans_width(&cell));
    let (left, right) = match align {
        ColumnAlign::Right => (fill, 0),
        ColumnAlign::Center => (fill / 2, fill - fill / 2),
        ColumnAlign::Left | ColumnAlign::None => (0, fill),
    };
    let mut out = Vec::with_capacity(cell.len() + 2);
    if left > 0 {
        out.push(Span::raw(" ".repeat(left)));
    }
    out.extend(cell);
    if right > 0 {
        out.push(Span::raw(" ".repeat(right)));
    }
    out
}

/// The line under a header row: column-wide dashes joined where the separators cross.
fn header_rule(separator: &str, widths: &[usize]) -> String {
    let boxed = separator.contains('│');
    let dash = if boxed { "─" } else { "-" };
    let joint: String = separator
        .chars()
        .map(|ch| match ch {
            '│' => '┼',
            '|' => '+',
            ' ' if boxed => '─',
            ' ' => '-',
            other => other,
        })
        .collect();
    widths
        .iter()
        .map(|w| dash.repeat(*w))
        .collect::<Vec<_>>()
        .join(&joint)
}
