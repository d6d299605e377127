//! The document tree produced by the parser and consumed by the normalizer and renderer.
use pulldown_cmark::Alignment;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnAlign {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl From<Alignment> for ColumnAlign {
    fn from(value: Alignment) -> Self {
        match value {
            Alignment::None => ColumnAlign::None,
            Alignment::Left => ColumnAlign::Left,
            Alignment::Center => ColumnAlign::Center,
            Alignment::Right => ColumnAlign::Right,
        }
    }
}

/// What a [`Node`] is, plus the attributes that only make sense for that kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Paragraph,
    Heading { level: u8 },
    Text,
    Strong,
    Em,
    U,
    Del,
    InlineCode,
    CodeBlock { lang: Option<String> },
    BlockQuote,
    List { ordered: bool, start: u64 },
    ListItem,
    Hr,
    Br,
    Link { target: Option<String>, title: String },
    Image { target: Option<String>, title: String },
    Table { aligns: Vec<ColumnAlign> },
    TableHead,
    TableRow,
    TableCell,
}

impl NodeKind {
    /// Name of the rule that renders this kind.
    ///
    /// List items and table parts have no rule of their own; they render through their parent.
    pub fn rule_name(&self) -> &'static str {
        match self {
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::Text => "text",
            NodeKind::Strong => "strong",
            NodeKind::Em => "em",
            NodeKind::U => "u",
            NodeKind::Del => "del",
            NodeKind::InlineCode => "inlineCode",
            NodeKind::CodeBlock { .. } => "codeBlock",
            NodeKind::BlockQuote => "blockQuote",
            NodeKind::List { .. } | NodeKind::ListItem => "list",
            NodeKind::Hr => "hr",
            NodeKind::Br => "br",
            NodeKind::Link { .. } => "link",
            NodeKind::Image { .. } => "image",
            NodeKind::Table { .. }
            | NodeKind::TableHead
            | NodeKind::TableRow
            | NodeKind::TableCell => "table",
        }
    }

    /// Inline kinds whose adjacent runs are merged by the normalizer.
    pub fn is_mergeable(&self) -> bool {
        matches!(
            self,
            NodeKind::Text | NodeKind::Strong | NodeKind::Em | NodeKind::U
        )
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text
                | NodeKind::Strong
                | NodeKind::Em
                | NodeKind::U
                | NodeKind::Del
                | NodeKind::InlineCode
                | NodeKind::Br
                | NodeKind::Link { .. }
                | NodeKind::Image { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Leaf(String),
    Container(Vec<Node>),
}

impl Content {
    /// Children as a list; a leaf becomes a single `text` node.
    pub fn into_children(self) -> Vec<Node> {
        match self {
            Content::Leaf(text) if text.is_empty() => Vec::new(),
            Content::Leaf(text) => vec![Node::text(text)],
            Content::Container(children) => children,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Content::Leaf(_) => &[],
            Content::Container(children) => children,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub content: Content,
}

impl Node {
    pub fn leaf(kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            content: Content::Leaf(text.into()),
        }
    }

    pub fn container(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            content: Content::Container(children),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Text, text)
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::container(NodeKind::Paragraph, children)
    }

    /// Concatenated text of this node and its descendants.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain_text(&mut out);
        out
    }

    fn push_plain_text(&self, out: &mut String) {
        match &self.content {
            Content::Leaf(text) => out.push_str(text),
            Content::Container(children) => {
                for child in children {
                    child.push_plain_text(out);
                }
            }
        }
    }
}
