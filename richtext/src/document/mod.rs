mod html;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A rich-text document in the CMS editor's JSON shape.
/// Serializes as `{"root": {"type": "root", ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub root: Root,
}

impl Document {
    pub fn new(children: Vec<BlockNode>) -> Self {
        Document {
            root: Root {
                children,
                direction: Direction::Ltr,
                format: String::new(),
                indent: 0,
                version: 1,
            },
        }
    }

    pub fn empty() -> Self {
        Document::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Block-level children in document order.
    pub fn blocks(&self) -> &[BlockNode] {
        &self.root.children
    }

    /// Render the document as an HTML fragment.
    pub fn to_html(&self) -> String {
        html::render(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "root")]
pub struct Root {
    pub children: Vec<BlockNode>,
    pub direction: Direction,
    pub format: String,
    pub indent: u32,
    pub version: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

/// A block-level node owned by the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockNode {
    Heading {
        tag: HeadingTag,
        children: Vec<TextNode>,
    },
    Paragraph {
        children: Vec<TextNode>,
    },
    List {
        #[serde(rename = "listType")]
        list_type: ListType,
        children: Vec<ListItem>,
    },
}

impl BlockNode {
    pub fn heading(tag: HeadingTag, text: impl Into<String>) -> Self {
        BlockNode::Heading {
            tag,
            children: vec![TextNode::new(text)],
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        BlockNode::Paragraph {
            children: vec![TextNode::new(text)],
        }
    }

    pub fn numbered_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BlockNode::List {
            list_type: ListType::Number,
            children: items.into_iter().map(ListItem::new).collect(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            BlockNode::Heading { .. } => NodeKind::Heading,
            BlockNode::Paragraph { .. } => NodeKind::Paragraph,
            BlockNode::List { .. } => NodeKind::List,
        }
    }

    /// Concatenated text of the node. List items are separated by newlines.
    pub fn plain_text(&self) -> String {
        match self {
            BlockNode::Heading { children, .. } | BlockNode::Paragraph { children } => {
                concat_text(children)
            }
            BlockNode::List { children, .. } => children
                .iter()
                .map(ListItem::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingTag {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingTag {
    pub fn level(self) -> u8 {
        match self {
            HeadingTag::H1 => 1,
            HeadingTag::H2 => 2,
            HeadingTag::H3 => 3,
            HeadingTag::H4 => 4,
            HeadingTag::H5 => 5,
            HeadingTag::H6 => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Number,
    Bullet,
}

/// One entry of a list. Holds a single paragraph of text runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "listitem")]
pub struct ListItem {
    pub children: Vec<Paragraph>,
}

impl ListItem {
    pub fn new(text: impl Into<String>) -> Self {
        ListItem {
            children: vec![Paragraph {
                children: vec![TextNode::new(text)],
            }],
        }
    }

    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .map(|p| concat_text(&p.children))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "paragraph")]
pub struct Paragraph {
    pub children: Vec<TextNode>,
}

/// Leaf node. Carries only its string payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "text")]
pub struct TextNode {
    pub text: String,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        TextNode { text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Heading,
    Paragraph,
    List,
    ListItem,
    Text,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Heading => "heading",
            NodeKind::Paragraph => "paragraph",
            NodeKind::List => "list",
            NodeKind::ListItem => "listitem",
            NodeKind::Text => "text",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn concat_text(children: &[TextNode]) -> String {
    children.iter().map(|t| t.text.as_str()).collect()
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.root.children.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

impl fmt::Display for BlockNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockNode::Heading { tag, children } => {
                for _ in 0..tag.level() {
                    write!(f, "#")?;
                }
                writeln!(f, " {}", concat_text(children))
            }
            BlockNode::Paragraph { children } => writeln!(f, "{}", concat_text(children)),
            BlockNode::List {
                list_type,
                children,
            } => {
                for (i, item) in children.iter().enumerate() {
                    match list_type {
                        ListType::Number => write!(f, "{}. ", i + 1)?,
                        ListType::Bullet => write!(f, "- ")?,
                    }
                    writeln!(f, "{}", item.plain_text())?;
                }
                Ok(())
            }
        }
    }
}
