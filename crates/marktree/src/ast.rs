//! The document model.
//!
//! Every node is a plain value: documents are compared structurally, cloned freely, and carry no
//! identity across renders. Widgets refer back into a document through a [`NodePath`].

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    Paragraph(Vec<Inline>),
    List(List),
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    BlockQuote(Vec<Block>),
    ThematicBreak,
    Image {
        src: String,
        alt: String,
    },
    Table(Table),
    /// A construct the lexer reported that the model has no variant for (raw HTML blocks, for
    /// example). `raw` is its source text.
    Unsupported {
        tag: String,
        raw: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct List {
    pub ordered: bool,
    /// First ordinal of an ordered list. Ignored for bullet lists.
    pub start: u64,
    pub items: Vec<ListItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListItem {
    pub children: Vec<Block>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// A table; `rows[0]` is the header row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub rows: Vec<TableRow>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableCell {
    pub alignment: Alignment,
    pub inlines: Vec<Inline>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strike(Vec<Inline>),
    CodeSpan(String),
    Link { url: String, children: Vec<Inline> },
    LineBreak,
    Image { src: String, alt: String },
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Resolves a widget's back-reference. List paths step through `(item, block)` index pairs;
    /// block quote paths step through child indices. Paths that continue into a leaf block (a
    /// table cell, say) resolve to that leaf.
    pub fn block_at(&self, path: &NodePath) -> Option<&Block> {
        let mut indices = path.indices().iter().copied();
        let mut block = self.blocks.get(indices.next()?)?;
        loop {
            match block {
                Block::List(list) => {
                    let Some(item) = indices.next() else {
                        return Some(block);
                    };
                    let item = list.items.get(item)?;
                    block = item.children.get(indices.next()?)?;
                }
                Block::BlockQuote(children) => {
                    let Some(i) = indices.next() else {
                        return Some(block);
                    };
                    block = children.get(i)?;
                }
                _ => return Some(block),
            }
        }
    }
}

impl Block {
    /// Short name used in placeholders and log messages.
    pub fn kind_name(&self) -> &str {
        match self {
            Block::Heading { .. } => "heading",
            Block::Paragraph(_) => "paragraph",
            Block::List(_) => "list",
            Block::CodeBlock { .. } => "code_block",
            Block::BlockQuote(_) => "block_quote",
            Block::ThematicBreak => "thematic_break",
            Block::Image { .. } => "image",
            Block::Table(_) => "table",
            Block::Unsupported { tag, .. } => tag,
        }
    }
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    /// Concatenated text content with all formatting dropped.
    pub fn plain_text(inlines: &[Inline]) -> String {
        let mut out = String::new();
        push_plain(inlines, &mut out);
        out
    }
}

fn push_plain(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(s) | Inline::CodeSpan(s) => out.push_str(s),
            Inline::Strong(children)
            | Inline::Emphasis(children)
            | Inline::Strike(children)
            | Inline::Link { children, .. } => push_plain(children, out),
            Inline::LineBreak => out.push('\n'),
            Inline::Image { alt, .. } => out.push_str(alt),
        }
    }
}

/// Child indices from the document root to an AST node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(s: &str) -> Block {
        Block::Paragraph(vec![Inline::text(s)])
    }

    #[test]
    fn block_at_walks_lists_and_quotes() {
        let doc = Document::new(vec![
            para("intro"),
            Block::List(List {
                ordered: false,
                start: 1,
                items: vec![
                    ListItem {
                        children: vec![para("a")],
                    },
                    ListItem {
                        children: vec![para("b"), Block::BlockQuote(vec![para("quoted")])],
                    },
                ],
            }),
        ]);

        assert_eq!(doc.block_at(&vec![0].into()), Some(&para("intro")));
        assert_eq!(doc.block_at(&vec![1, 1, 0].into()), Some(&para("b")));
        assert_eq!(doc.block_at(&vec![1, 1, 1, 0].into()), Some(&para("quoted")));
        assert!(matches!(doc.block_at(&vec![1].into()), Some(Block::List(_))));
        assert_eq!(doc.block_at(&vec![1, 5, 0].into()), None);
        assert_eq!(doc.block_at(&NodePath::root()), None);
    }

    #[test]
    fn plain_text_flattens_formatting() {
        let inlines = vec![
            Inline::text("a "),
            Inline::Strong(vec![Inline::Emphasis(vec![Inline::text("b")])]),
            Inline::LineBreak,
            Inline::Link {
                url: "u".into(),
                children: vec![Inline::CodeSpan("c".into())],
            },
        ];
        assert_eq!(Inline::plain_text(&inlines), "a b\nc");
    }
}
