//! Post-parse tree normalization.
//!
//! The parser emits text in many small runs (one per escape, entity, soft break, ...). Inline
//! styling is applied per node, so adjacent runs of the same text-like kind are merged back
//! together before rendering. Only paragraph and heading blocks are normalized.
use crate::ast::Content;
use crate::ast::Node;
use crate::ast::NodeKind;

/// Normalizes every top-level paragraph and heading; other blocks are returned as they are.
pub fn normalize_tree(tree: Vec<Node>) -> Vec<Node> {
    tree.into_iter()
        .map(|node| match node.kind {
            NodeKind::Paragraph | NodeKind::Heading { .. } => merge_text_content(node),
            _ => node,
        })
        .collect()
}

/// Rebuilds `node`'s children so that no two adjacent entries share a mergeable kind.
///
/// Adjacent entries of the same mergeable kind (`text`, `strong`, `em`, `u`) collapse into one.
/// A formatted entry (`strong`, `em`, `u`) that does not merge with its predecessor is normalized
/// recursively before it is kept. Leaf content is returned unchanged.
pub fn merge_text_content(node: Node) -> Node {
    let Node { kind, content } = node;
    let items = match content {
        Content::Container(items) => items,
        leaf @ Content::Leaf(_) => return Node { kind, content: leaf },
    };

    let mut out: Vec<Node> = Vec::with_capacity(items.len());
    for item in items {
        let merges =
            item.kind.is_mergeable() && out.last().is_some_and(|last| last.kind == item.kind);
        if merges && let Some(last) = out.pop() {
            out.push(merge_pair(last, item));
            continue;
        }

        if item.kind == NodeKind::Text || !item.kind.is_mergeable() {
            out.push(item);
        } else {
            out.push(merge_text_content(item));
        }
    }

    Node {
        kind,
        content: Content::Container(out),
    }
}

fn merge_pair(prev: Node, next: Node) -> Node {
    match (prev.content, next.content) {
        (Content::Leaf(mut text), Content::Leaf(more)) => {
            text.push_str(&more);
            Node::leaf(prev.kind, text)
        }
        (a, b) => {
            let mut children = a.into_children();
            children.extend(b.into_children());
            // The concatenation can put runs side by side again.
            merge_text_content(Node::container(prev.kind, children))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strong(children: Vec<Node>) -> Node {
        Node::container(NodeKind::Strong, children)
    }

    fn em(children: Vec<Node>) -> Node {
        Node::container(NodeKind::Em, children)
    }

    fn content(node: &Node) -> &[Node] {
        node.content.children()
    }

    #[test]
    fn merges_adjacent_text_runs() {
        let tree = vec![Node::paragraph(vec![
            Node::text("a"),
            Node::text("b"),
            strong(vec![Node::text("c")]),
        ])];
        let out = normalize_tree(tree);
        assert_eq!(
            content(&out[0]),
            &[Node::text("ab"), strong(vec![Node::text("c")])]
        );
    }

    #[test]
    fn does_not_merge_across_kinds() {
        let tree = vec![Node::paragraph(vec![
            Node::text("a"),
            em(vec![Node::text("b"), Node::text("b")]),
            Node::text("c"),
        ])];
        let out = normalize_tree(tree);
        assert_eq!(
            content(&out[0]),
            &[Node::text("a"), em(vec![Node::text("bb")]), Node::text("c")]
        );
    }

    #[test]
    fn recurses_into_nested_formatted_spans() {
        let tree = vec![Node::paragraph(vec![em(vec![
            Node::text("x"),
            strong(vec![Node::text("y"), Node::text("z")]),
            Node::text("w"),
            Node::text("v"),
        ])])];
        let out = normalize_tree(tree);
        assert_eq!(
            content(&out[0]),
            &[em(vec![
                Node::text("x"),
                strong(vec![Node::text("yz")]),
                Node::text("wv"),
            ])]
        );
    }

    #[test]
    fn merges_adjacent_formatted_spans_of_the_same_kind() {
        let tree = vec![Node::paragraph(vec![
            strong(vec![Node::text("a")]),
            strong(vec![Node::text("b")]),
        ])];
        let out = normalize_tree(tree);
        assert_eq!(content(&out[0]), &[strong(vec![Node::text("ab")])]);
    }

    #[test]
    fn headings_are_normalized() {
        let tree = vec![Node::container(
            NodeKind::Heading { level: 2 },
            vec![Node::text("Hello, "), Node::text("world")],
        )];
        let out = normalize_tree(tree);
        assert_eq!(content(&out[0]), &[Node::text("Hello, world")]);
        assert_eq!(out[0].kind, NodeKind::Heading { level: 2 });
    }

    #[test]
    fn other_blocks_pass_through_unchanged() {
        let code = Node::leaf(NodeKind::CodeBlock { lang: None }, "x");
        let quote = Node::container(
            NodeKind::BlockQuote,
            vec![Node::paragraph(vec![Node::text("a"), Node::text("b")])],
        );
        let tree = vec![code.clone(), quote.clone()];
        assert_eq!(normalize_tree(tree), vec![code, quote]);
    }

    #[test]
    fn non_mergeable_inline_nodes_are_kept_verbatim() {
        let link = Node::container(
            NodeKind::Link {
                target: Some("https://example.com".to_string()),
                title: String::new(),
            },
            vec![Node::text("a"), Node::text("b")],
        );
        let tree = vec![Node::paragraph(vec![link.clone(), Node::text("c")])];
        let out = normalize_tree(tree);
        assert_eq!(content(&out[0]), &[link, Node::text("c")]);
    }

    #[test]
    fn leaf_content_is_left_alone() {
        let node = Node::leaf(NodeKind::Strong, "raw");
        assert_eq!(merge_text_content(node.clone()), node);
    }

    fn inline_node() -> impl Strategy<Value = Node> {
        let leaf = prop_oneof![
            "[ab ]{0,3}".prop_map(Node::text),
            "[ab]{1,2}".prop_map(|s| Node::leaf(NodeKind::InlineCode, s)),
            Just(Node::leaf(NodeKind::Br, "")),
        ];
        leaf.prop_recursive(4, 48, 5, |inner| {
            (
                prop_oneof![
                    Just(NodeKind::Strong),
                    Just(NodeKind::Em),
                    Just(NodeKind::U),
                    Just(NodeKind::Del),
                    Just(NodeKind::Link {
                        target: None,
                        title: String::new(),
                    }),
                ],
                prop::collection::vec(inner, 0..5),
            )
                .prop_map(|(kind, children)| Node::container(kind, children))
        })
    }

    fn block_node() -> impl Strategy<Value = Node> {
        let inlines = || prop::collection::vec(inline_node(), 0..6);
        prop_oneof![
            inlines().prop_map(Node::paragraph),
            (1u8..=6, inlines())
                .prop_map(|(level, c)| Node::container(NodeKind::Heading { level }, c)),
            "[ab]{0,4}".prop_map(|s| Node::leaf(NodeKind::CodeBlock { lang: None }, s)),
            inlines().prop_map(|c| Node::container(NodeKind::BlockQuote, vec![Node::paragraph(c)])),
        ]
    }

    fn has_adjacent_mergeable_pair(nodes: &[Node]) -> bool {
        nodes
            .windows(2)
            .any(|w| w[0].kind.is_mergeable() && w[0].kind == w[1].kind)
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(tree in prop::collection::vec(block_node(), 0..5)) {
            let once = normalize_tree(tree);
            let twice = normalize_tree(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalized_blocks_have_no_adjacent_mergeable_runs(
            tree in prop::collection::vec(block_node(), 0..5)
        ) {
            for block in normalize_tree(tree) {
                if matches!(block.kind, NodeKind::Paragraph | NodeKind::Heading { .. }) {
                    prop_assert!(!has_adjacent_mergeable_pair(content(&block)));
                }
            }
        }

        #[test]
        fn normalize_preserves_text(tree in prop::collection::vec(block_node(), 0..5)) {
            let before: Vec<String> = tree.iter().map(Node::plain_text).collect();
            let after: Vec<String> = normalize_tree(tree).iter().map(Node::plain_text).collect();
            prop_assert_eq!(before, after);
        }
    }
}
