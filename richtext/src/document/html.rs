use pulldown_cmark::{CowStr, Event, HeadingLevel, Tag, TagEnd, html};

use crate::document::{BlockNode, Document, HeadingTag, ListType, TextNode};

/// Feed the document tree to pulldown-cmark's HTML writer as an event stream.
/// The writer takes care of escaping text.
pub(super) fn render(doc: &Document) -> String {
    let mut events: Vec<Event<'_>> = Vec::new();
    for node in doc.blocks() {
        push_block(&mut events, node);
    }
    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

fn push_block<'a>(events: &mut Vec<Event<'a>>, node: &'a BlockNode) {
    match node {
        BlockNode::Heading { tag, children } => {
            let level = heading_level(*tag);
            events.push(Event::Start(Tag::Heading {
                level,
                id: None,
                classes: Vec::new(),
                attrs: Vec::new(),
            }));
            push_text(events, children);
            events.push(Event::End(TagEnd::Heading(level)));
        }
        BlockNode::Paragraph { children } => {
            events.push(Event::Start(Tag::Paragraph));
            push_text(events, children);
            events.push(Event::End(TagEnd::Paragraph));
        }
        BlockNode::List {
            list_type,
            children,
        } => {
            let ordered = *list_type == ListType::Number;
            events.push(Event::Start(Tag::List(ordered.then_some(1))));
            for item in children {
                // Tight list: item text goes straight into <li>.
                events.push(Event::Start(Tag::Item));
                for paragraph in &item.children {
                    push_text(events, &paragraph.children);
                }
                events.push(Event::End(TagEnd::Item));
            }
            events.push(Event::End(TagEnd::List(ordered)));
        }
    }
}

fn push_text<'a>(events: &mut Vec<Event<'a>>, children: &'a [TextNode]) {
    for child in children {
        events.push(Event::Text(CowStr::Borrowed(child.text.as_str())));
    }
}

fn heading_level(tag: HeadingTag) -> HeadingLevel {
    match tag {
        HeadingTag::H1 => HeadingLevel::H1,
        HeadingTag::H2 => HeadingLevel::H2,
        HeadingTag::H3 => HeadingLevel::H3,
        HeadingTag::H4 => HeadingLevel::H4,
        HeadingTag::H5 => HeadingLevel::H5,
        HeadingTag::H6 => HeadingLevel::H6,
    }
}
