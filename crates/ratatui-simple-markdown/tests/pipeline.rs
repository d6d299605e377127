mod support;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::Span;
use ratatui::widgets::Widget;
use ratatui_simple_markdown::Markdown;
use ratatui_simple_markdown::MarkdownOptions;
use ratatui_simple_markdown::RenderError;
use ratatui_simple_markdown::ast::NodeKind;
use ratatui_simple_markdown::normalize::normalize_tree;
use ratatui_simple_markdown::parse::MarkdownParser;
use ratatui_simple_markdown::parse::ParseMode;
use ratatui_simple_markdown::render::MAX_NESTING;
use ratatui_simple_markdown::render::Output;
use ratatui_simple_markdown::rules::RulePatch;
use ratatui_simple_markdown::rules::RulePatches;
use rstest::rstest;
use std::sync::Arc;
use std::sync::Mutex;
use support::init_test_logging;

fn render(source: &str, options: MarkdownOptions, width: u16) -> Vec<String> {
    init_test_logging();
    let mut md = Markdown::new(source).with_options(options);
    md.render().plain_lines(width)
}

#[test]
fn bold_and_italic_normalize_to_three_entries() {
    init_test_logging();
    let rules = MarkdownOptions::default().rule_table();
    let tree = MarkdownParser::new(&rules)
        .parse("**bold** and *italic*\n\n", ParseMode::Block)
        .expect("parse");
    let tree = normalize_tree(tree);

    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].kind, NodeKind::Paragraph);
    let kinds: Vec<&NodeKind> = tree[0].content.children().iter().map(|n| &n.kind).collect();
    assert_eq!(kinds, vec![&NodeKind::Strong, &NodeKind::Text, &NodeKind::Em]);
}

#[test]
fn renders_a_mixed_document() {
    let source = "# Title\n\nSome **bold** text.\n\n- one\n- two\n\n> quoted\n\n---\n\n```\ncode\n```";
    let lines = render(source, MarkdownOptions::default(), 20);
    assert_eq!(
        lines,
        vec![
            "Title",
            "",
            "Some bold text.",
            "",
            "• one",
            "• two",
            "",
            "│ quoted",
            "",
            "────────────────────",
            "",
            "    code",
        ]
    );
}

#[test]
fn strong_text_is_bold() {
    init_test_logging();
    let mut md = Markdown::new("a **b**");
    let lines = md.render().lines(20);
    let bold = lines[0]
        .spans
        .iter()
        .find(|s| s.content.as_ref() == "b")
        .expect("bold span");
    assert!(bold.style.add_modifier.contains(Modifier::BOLD));
}

#[test]
fn whitelist_keeps_only_listed_constructs() {
    let options = MarkdownOptions::default().whitelist(["strong"]);
    assert_eq!(
        render("**bold** and *italic*", options, 40),
        vec!["bold and *italic*"]
    );
}

#[test]
fn whitelist_wins_over_blacklist() {
    let options = MarkdownOptions::default()
        .whitelist(["em"])
        .blacklist(["em"]);
    assert_eq!(render("*a* **b**", options, 40), vec!["a **b**"]);
}

#[test]
fn blacklist_cannot_remove_paragraph_or_text() {
    let options = MarkdownOptions::default().blacklist(["paragraph", "text", "strong"]);
    assert_eq!(render("**bold** plain", options, 40), vec!["**bold** plain"]);
}

#[test]
fn render_errors_reach_the_handler() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let options = MarkdownOptions::default()
        .whitelist(["fence"])
        .error_handler(move |err, source| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(format!("{err} in {source:?}"));
            }
        });

    assert!(render("```\nx\n```", options, 40).is_empty());
    assert_eq!(
        *seen.lock().expect("lock"),
        vec!["no rule named `codeBlock` in the rule table in \"```\\nx\\n```\"".to_string()]
    );
}

#[rstest]
#[case::strong(format!("{}x{}", "**".repeat(3000), "**".repeat(3000)))]
#[case::block_quotes(format!("{} x", ">".repeat(20000)))]
fn deeply_nested_sources_report_nesting_errors(#[case] source: String) {
    let seen: Arc<Mutex<Vec<RenderError>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let options = MarkdownOptions::default().error_handler(move |err, _| {
        if let Ok(mut seen) = sink.lock() {
            seen.push(err.clone());
        }
    });

    assert!(render(&source, options, 40).is_empty());
    assert_eq!(
        *seen.lock().expect("lock"),
        vec![RenderError::NestingTooDeep { depth: MAX_NESTING }]
    );
}

#[test]
fn caller_rules_can_replace_output() {
    let rules: RulePatches = [(
        "em".to_string(),
        RulePatch::new().output(|node, _ctx| {
            Ok(Output::Inline(vec![Span::raw(format!("_{}_", node.plain_text()))]))
        }),
    )]
    .into_iter()
    .collect();
    let options = MarkdownOptions::default().rules(rules);
    assert_eq!(render("a *b*", options, 40), vec!["a _b_"]);
}

#[test]
fn failing_rule_output_is_reported() {
    let seen: Arc<Mutex<Option<RenderError>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let rules: RulePatches = [(
        "hr".to_string(),
        RulePatch::new().output(|_, _| Err(RenderError::rule("hr", "unsupported"))),
    )]
    .into_iter()
    .collect();
    let options = MarkdownOptions::default()
        .rules(rules)
        .error_handler(move |err, _| {
            if let Ok(mut seen) = sink.lock() {
                *seen = Some(err.clone());
            }
        });

    assert!(render("a\n\n---", options, 40).is_empty());
    assert_eq!(
        *seen.lock().expect("lock"),
        Some(RenderError::rule("hr", "unsupported"))
    );
}

#[test]
fn widget_paints_the_rendered_view() {
    init_test_logging();
    let mut md = Markdown::from_parts(["one\n\n", "two"]);
    let area = Rect::new(0, 0, 5, 3);
    let mut buf = Buffer::empty(area);
    md.widget().render(area, &mut buf);

    let row = |y: u16| -> String {
        (0..area.width)
            .filter_map(|x| buf.cell((x, y)).map(|c| c.symbol().to_string()))
            .collect()
    };
    assert_eq!(row(0), "one  ");
    assert_eq!(row(1), "     ");
    assert_eq!(row(2), "two  ");
}
