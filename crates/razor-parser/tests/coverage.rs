//! Every parse must account for every source character: nodes own their text,
//! and the only characters between sibling nodes are skipped whitespace.

use pretty_assertions::assert_eq;
use razor_parser::{parse, Node, NodeKind, Span};

const CORPUS: &[&str] = &[
    "<a>hi</a>",
    "<a/>",
    "@x",
    "@*note*@",
    "@if (a > b) { <p>x</p> }",
    "<html>\n@if (2 > 1)\n{\n    <a>123</a>\n}\n</html>",
    "<ul>\n  @foreach (var item in items) {\n    <li class=\"row\">@item.Name</li>\n  }\n</ul>",
    "<div>@if (a) { <b>x</b> } else if (c) { <i>y</i> } else { <u>z</u> }</div>",
    "@if (a) { <b/> } @else { <i/> }",
    "@do { <p>@i</p> } while (i < 3)",
    "<p>Price: @(price * 2) or @@ sign</p>",
    "@{ var total = items.Sum(); }\n<span>@total</span>",
    "@Html.Each(items, () => { <li>@x</li> })",
    "  text before <br /> and <!-- a comment --> after  ",
    "<section>\n  <h>Title</h>\n  @items[0].Title(1)\n</section>",
];

/// Markup-only sources whose nodes own every character.
const EXACT: &[&str] = &[
    "<a>hi</a>",
    "<a/>",
    "@*note*@",
    "<p>a@@b</p>",
    "<div class=\"x\"><span>one</span><!-- two --><br/></div>",
    "plain text",
];

fn slice(source: &str, span: &Span) -> String {
    source.chars().skip(span.start).take(span.len()).collect()
}

/// What a node's span holds in front of `begin`: nothing, or the `@` sigil
/// and any whitespace after it.
fn check_prefix(source: &str, node: &Node) {
    let text = slice(source, &node.span);
    let lead = text
        .find(node.begin.as_str())
        .unwrap_or_else(|| panic!("{:?} does not contain begin {:?}", text, node.begin));
    let prefix = &text[..lead];
    let sigil = prefix.strip_prefix('@').unwrap_or(prefix);
    assert!(
        prefix.is_empty() || (node.kind == NodeKind::Razor && sigil.trim().is_empty()),
        "unexpected prefix {prefix:?} before {:?}",
        node.begin
    );
    if let Some(end) = &node.end {
        assert!(text.ends_with(end.as_str()), "{text:?} does not end with {end:?}");
    }
    if node.is_leaf() {
        assert_eq!(&text[lead..], node.begin);
    }
}

fn check_siblings(source: &str, nodes: &[Node], within: Option<&Span>) {
    for pair in nodes.windows(2) {
        let (a, b) = (&pair[0].span, &pair[1].span);
        assert!(a.end <= b.start, "siblings overlap: {a:?} {b:?}");
    }
    for node in nodes {
        if let Some(parent) = within {
            assert!(parent.contains(&node.span), "{:?} escapes {parent:?}", node.span);
        }
        check_prefix(source, node);
        check_siblings(source, &node.children, Some(&node.span));
    }
}

fn check_top_level_gaps(source: &str, nodes: &[Node]) {
    let total = source.chars().count();
    let mut cursor = 0;
    for node in nodes {
        let gap = slice(source, &Span::new(cursor, node.span.start, 0, 0));
        assert!(gap.trim().is_empty(), "non-whitespace gap {gap:?}");
        cursor = node.span.end;
    }
    let tail = slice(source, &Span::new(cursor, total, 0, 0));
    assert!(tail.trim().is_empty(), "non-whitespace tail {tail:?}");
}

#[test]
fn spans_cover_the_source() {
    for source in CORPUS {
        let doc = parse(source).unwrap_or_else(|e| panic!("{source:?}: {e}"));
        check_siblings(source, &doc.nodes, None);
        check_top_level_gaps(source, &doc.nodes);
    }
}

#[test]
fn markup_round_trips_exactly() {
    for source in EXACT {
        let doc = parse(source).unwrap();
        assert_eq!(doc.source_text(), *source);
    }
}

#[test]
fn if_block_inside_html() {
    let doc = parse("<html>\n@if (2 > 1)\n{\n    <a>123</a>\n}\n</html>").unwrap();
    let html = &doc.nodes[0];
    assert_eq!(html.begin, "<html>");
    assert_eq!(html.end.as_deref(), Some("</html>"));

    let kinds: Vec<NodeKind> = html.children.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NodeKind::Text, NodeKind::Razor, NodeKind::Text]);

    let block = &html.children[1];
    assert_eq!(block.begin, "if (2 > 1)\n{");
    assert_eq!(block.end.as_deref(), Some("}"));
    assert_eq!(block.children[0].source_text(), "<a>123</a>");
}
