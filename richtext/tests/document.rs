use richtext::document::{HeadingTag, ListType};
use richtext::{BlockNode, Document, NodeKind, text_to_document};

#[test]
fn html_escapes_text() {
    let doc = Document::new(vec![BlockNode::paragraph("Sauna & <kuntosali>")]);
    assert_eq!(doc.to_html(), "<p>Sauna &amp; &lt;kuntosali&gt;</p>\n");
}

#[test]
fn html_heading_levels_follow_tag() {
    let doc = Document::new(vec![
        BlockNode::heading(HeadingTag::H2, "Tilat"),
        BlockNode::heading(HeadingTag::H4, "Sauna"),
    ]);
    assert_eq!(doc.to_html(), "<h2>Tilat</h2>\n<h4>Sauna</h4>\n");
}

#[test]
fn html_of_converted_text() {
    let doc = text_to_document("Säännöt\n\n1. Siivoa\n2. Sammuta valot\n\nKiitos.");
    assert_eq!(
        doc.to_html(),
        "<h2>Säännöt</h2>\n<ol>\n<li>Siivoa</li>\n<li>Sammuta valot</li>\n</ol>\n<p>Kiitos.</p>\n"
    );
}

#[test]
fn empty_document_renders_nothing() {
    assert!(Document::empty().is_empty());
    assert_eq!(Document::empty().to_html(), "");
    assert_eq!(Document::empty().to_string(), "");
}

#[test]
fn outline_display() {
    let doc = text_to_document("Säännöt\n\n1. Siivoa\n2. Sammuta valot\n\nKiitos.");
    assert_eq!(
        doc.to_string(),
        "## Säännöt\n\n1. Siivoa\n2. Sammuta valot\n\nKiitos.\n"
    );
}

#[test]
fn block_accessors() {
    let list = BlockNode::numbered_list(["Eka", "Toka"]);
    assert_eq!(list.kind(), NodeKind::List);
    assert_eq!(list.plain_text(), "Eka\nToka");
    assert_eq!(NodeKind::ListItem.to_string(), "listitem");

    let BlockNode::List { list_type, children } = &list else {
        panic!("expected a list");
    };
    assert_eq!(*list_type, ListType::Number);
    assert_eq!(children[1].plain_text(), "Toka");
}
