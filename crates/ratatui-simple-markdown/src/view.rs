//! The rendered view hierarchy and its terminal layout.
//!
//! A render pass produces one root [`ViewNode`]. Layout is deferred until the width is known:
//! [`ViewNode::lines`] turns the tree into styled lines, and [`MarkdownWidget`] paints them into a
//! [`Buffer`].
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Widget;
use ratatui_simple_markdown_core::wrapping::WrapMode;
use ratatui_simple_markdown_core::wrapping::spans_width;
use ratatui_simple_markdown_core::wrapping::wrap_spans;
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Debug, PartialEq)]
pub enum ViewNode {
    View(ViewBlock),
    Text(TextBlock),
    Divider(Divider),
}

/// A container whose children are stacked vertically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewBlock {
    pub region: String,
    /// Painted beneath every span of the children.
    pub style: Style,
    /// Drawn before the first line (a list bullet, for instance).
    pub first_prefix: Vec<Span<'static>>,
    /// Drawn before every other line.
    pub prefix: Vec<Span<'static>>,
    /// Blank lines between consecutive children.
    pub gap: u16,
    pub children: Vec<ViewNode>,
}

impl ViewBlock {
    pub fn new(region: impl Into<String>, style: Style) -> Self {
        Self {
            region: region.into(),
            style,
            ..Self::default()
        }
    }

    /// Uses the same prefix on every line.
    pub fn with_prefix(self, prefix: Vec<Span<'static>>) -> Self {
        self.with_prefixes(prefix.clone(), prefix)
    }

    pub fn with_prefixes(mut self, first: Vec<Span<'static>>, rest: Vec<Span<'static>>) -> Self {
        self.first_prefix = first;
        self.prefix = rest;
        self
    }

    pub fn with_gap(mut self, gap: u16) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_children(mut self, children: Vec<ViewNode>) -> Self {
        self.children = children;
        self
    }
}

/// A run of styled inline text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    pub region: String,
    pub spans: Vec<Span<'static>>,
    pub wrap: WrapMode,
}

/// A glyph repeated across the available width.
#[derive(Clone, Debug, PartialEq)]
pub struct Divider {
    pub region: String,
    pub glyph: String,
    pub style: Style,
}

impl ViewNode {
    pub fn region(&self) -> &str {
        match self {
            ViewNode::View(v) => &v.region,
            ViewNode::Text(t) => &t.region,
            ViewNode::Divider(d) => &d.region,
        }
    }

    pub fn children(&self) -> &[ViewNode] {
        match self {
            ViewNode::View(v) => &v.children,
            ViewNode::Text(_) | ViewNode::Divider(_) => &[],
        }
    }

    /// Lays the tree out for `width` terminal columns.
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        self.layout(width as usize)
            .into_iter()
            .map(Line::from)
            .collect()
    }

    /// Like [`Self::lines`], but without styles.
    pub fn plain_lines(&self, width: u16) -> Vec<String> {
        self.layout(width as usize)
            .iter()
            .map(|spans| spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn layout(&self, width: usize) -> Vec<Vec<Span<'static>>> {
        match self {
            ViewNode::Text(text) => wrap_spans(&text.spans, width, text.wrap),
            ViewNode::Divider(divider) => {
                let glyph_w = UnicodeWidthStr::width(divider.glyph.as_str()).max(1);
                let count = (width / glyph_w).max(1);
                vec![vec![Span::styled(divider.glyph.repeat(count), divider.style)]]
            }
            ViewNode::View(view) => layout_view(view, width),
        }
    }
}

fn layout_view(view: &ViewBlock, width: usize) -> Vec<Vec<Span<'static>>> {
    let prefix_w = spans_width(&view.first_prefix).max(spans_width(&view.prefix));
    let inner = width.saturating_sub(prefix_w);

    let mut body: Vec<Vec<Span<'static>>> = Vec::new();
    for (idx, child) in view.children.iter().enumerate() {
        if idx > 0 {
            body.extend((0..view.gap).map(|_| Vec::new()));
        }
        body.extend(child.layout(inner));
    }

    body.into_iter()
        .enumerate()
        .map(|(idx, line)| {
            let prefix = if idx == 0 {
                &view.first_prefix
            } else {
                &view.prefix
            };
            let mut spans = prefix
                .iter()
                .map(|s| Span::styled(s.content.clone(), view.style.patch(s.style)))
                .collect::<Vec<_>>();
            spans.extend(
                line.into_iter()
                    .map(|s| Span::styled(s.content, view.style.patch(s.style))),
            );
            spans
        })
        .collect()
}

/// Paints a rendered view into a buffer, starting `scroll` lines from the top.
#[derive(Clone, Copy, Debug)]
pub struct MarkdownWidget<'a> {
    root: &'a ViewNode,
    scroll: u16,
}

impl<'a> MarkdownWidget<'a> {
    pub fn new(root: &'a ViewNode) -> Self {
        Self { root, scroll: 0 }
    }

    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }
}

impl Widget for MarkdownWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let lines = self.root.lines(area.width);
        for (row, line) in lines
            .iter()
            .skip(self.scroll as usize)
            .take(area.height as usize)
            .enumerate()
        {
            buf.set_line(area.x, area.y + row as u16, line, area.width);
        }
    }
}
