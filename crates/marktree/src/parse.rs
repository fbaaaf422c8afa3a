use crate::ast::Alignment;
use crate::ast::Block;
use crate::ast::Document;
use crate::ast::Inline;
use crate::ast::List;
use crate::ast::ListItem;
use crate::ast::Table;
use crate::ast::TableCell;
use crate::ast::TableRow;
use crate::error::ParseError;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;

/// Parses Markdown text into a [`Document`].
///
/// Tables and strikethrough are enabled; everything else is CommonMark.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    parse_events(Parser::new_ext(input, options))
}

/// Builds a [`Document`] from a raw lexer event stream.
pub fn parse_events<'a>(events: impl IntoIterator<Item = Event<'a>>) -> Result<Document, ParseError> {
    let mut b = Builder::default();
    for event in events {
        b.event(event)?;
    }
    b.finish()
}

#[derive(Debug)]
enum Frame {
    BlockQuote(Vec<Block>),
    List {
        ordered: bool,
        start: u64,
        items: Vec<ListItem>,
    },
    /// Tight list items carry inline content without a paragraph wrapper; it is gathered in
    /// `loose` until the next block or the end of the item.
    Item {
        blocks: Vec<Block>,
        loose: Vec<Inline>,
    },
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    Html(String),
    Table {
        alignments: Vec<Alignment>,
        rows: Vec<TableRow>,
    },
    Row(Vec<TableCell>),
    Cell(Vec<Inline>),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strike(Vec<Inline>),
    Link {
        url: String,
        children: Vec<Inline>,
    },
    Image {
        src: String,
        children: Vec<Inline>,
    },
    Other {
        tag: String,
        raw: String,
    },
}

#[derive(Debug, Default)]
struct Builder {
    blocks: Vec<Block>,
    stack: Vec<Frame>,
}

impl Builder {
    fn event(&mut self, event: Event<'_>) -> Result<(), ParseError> {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(end) => {
                let Some(frame) = self.stack.pop() else {
                    return Err(ParseError::UnexpectedEnd {
                        tag: format!("{end:?}"),
                    });
                };
                self.close(frame);
            }
            Event::Text(text) => match self.stack.last_mut() {
                Some(Frame::CodeBlock { content, .. }) => content.push_str(&text),
                Some(Frame::Html(raw)) | Some(Frame::Other { raw, .. }) => raw.push_str(&text),
                _ => self.push_inline(Inline::Text(text.into_string())),
            },
            Event::Code(code) => self.push_inline(Inline::CodeSpan(code.into_string())),
            Event::Html(html) => match self.stack.last_mut() {
                Some(Frame::Html(raw)) | Some(Frame::Other { raw, .. }) => raw.push_str(&html),
                _ => self.push_block(Block::Unsupported {
                    tag: "html".to_string(),
                    raw: html.into_string(),
                }),
            },
            Event::InlineHtml(html) => self.push_inline(Inline::Text(html.into_string())),
            Event::SoftBreak => self.push_inline(Inline::Text(" ".to_string())),
            Event::HardBreak => self.push_inline(Inline::LineBreak),
            Event::Rule => self.push_block(Block::ThematicBreak),
            Event::InlineMath(s) | Event::DisplayMath(s) => {
                self.push_inline(Inline::Text(s.into_string()))
            }
            Event::FootnoteReference(label) => {
                self.push_inline(Inline::Text(format!("[^{label}]")))
            }
            Event::TaskListMarker(checked) => {
                self.push_inline(Inline::Text(if checked { "[x] " } else { "[ ] " }.into()))
            }
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading {
                level: heading_level(level),
                inlines: Vec::new(),
            },
            Tag::BlockQuote(_) => Frame::BlockQuote(Vec::new()),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        Some(info.trim().to_string()).filter(|s| !s.is_empty())
                    }
                    CodeBlockKind::Indented => None,
                };
                Frame::CodeBlock {
                    language,
                    content: String::new(),
                }
            }
            Tag::HtmlBlock => Frame::Html(String::new()),
            Tag::List(start) => Frame::List {
                ordered: start.is_some(),
                start: start.unwrap_or(1),
                items: Vec::new(),
            },
            Tag::Item => Frame::Item {
                blocks: Vec::new(),
                loose: Vec::new(),
            },
            Tag::Table(aligns) => Frame::Table {
                alignments: aligns.into_iter().map(alignment).collect(),
                rows: Vec::new(),
            },
            Tag::TableHead | Tag::TableRow => Frame::Row(Vec::new()),
            Tag::TableCell => Frame::Cell(Vec::new()),
            Tag::Emphasis => Frame::Emphasis(Vec::new()),
            Tag::Strong => Frame::Strong(Vec::new()),
            Tag::Strikethrough => Frame::Strike(Vec::new()),
            Tag::Link { dest_url, .. } => Frame::Link {
                url: dest_url.into_string(),
                children: Vec::new(),
            },
            Tag::Image { dest_url, .. } => Frame::Image {
                src: dest_url.into_string(),
                children: Vec::new(),
            },
            other => Frame::Other {
                tag: tag_name(&other),
                raw: String::new(),
            },
        };
        self.stack.push(frame);
    }

    fn close(&mut self, frame: Frame) {
        match frame {
            Frame::Paragraph(inlines) => {
                let block = match inlines.as_slice() {
                    [Inline::Image { src, alt }] => Block::Image {
                        src: src.clone(),
                        alt: alt.clone(),
                    },
                    _ => Block::Paragraph(inlines),
                };
                self.push_block(block);
            }
            Frame::Heading { level, inlines } => self.push_block(Block::Heading { level, inlines }),
            Frame::CodeBlock {
                language,
                mut content,
            } => {
                // A fence left open at end of input has no final newline.
                if !content.is_empty() && !content.ends_with('\n') {
                    content.push('\n');
                }
                self.push_block(Block::CodeBlock { language, content })
            }
            Frame::Html(raw) => self.push_block(Block::Unsupported {
                tag: "html".to_string(),
                raw,
            }),
            Frame::BlockQuote(children) => self.push_block(Block::BlockQuote(children)),
            Frame::List {
                ordered,
                start,
                items,
            } => self.push_block(Block::List(List {
                ordered,
                start,
                items,
            })),
            Frame::Item { mut blocks, loose } => {
                if !loose.is_empty() {
                    blocks.push(Block::Paragraph(loose));
                }
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(ListItem { children: blocks });
                }
            }
            Frame::Table { alignments, rows } => {
                let rows = rows
                    .into_iter()
                    .map(|row| TableRow {
                        cells: row
                            .cells
                            .into_iter()
                            .enumerate()
                            .map(|(i, cell)| TableCell {
                                alignment: alignments.get(i).copied().unwrap_or_default(),
                                inlines: cell.inlines,
                            })
                            .collect(),
                    })
                    .collect();
                self.push_block(Block::Table(Table { alignments, rows }));
            }
            Frame::Row(cells) => {
                if let Some(Frame::Table { rows, .. }) = self.stack.last_mut() {
                    rows.push(TableRow { cells });
                }
            }
            Frame::Cell(inlines) => {
                if let Some(Frame::Row(cells)) = self.stack.last_mut() {
                    cells.push(TableCell {
                        alignment: Alignment::None,
                        inlines,
                    });
                }
            }
            Frame::Strong(children) => self.push_inline(Inline::Strong(children)),
            Frame::Emphasis(children) => self.push_inline(Inline::Emphasis(children)),
            Frame::Strike(children) => self.push_inline(Inline::Strike(children)),
            Frame::Link { url, children } => self.push_inline(Inline::Link { url, children }),
            Frame::Image { src, children } => self.push_inline(Inline::Image {
                src,
                alt: Inline::plain_text(&children),
            }),
            Frame::Other { tag, raw } => self.push_block(Block::Unsupported { tag, raw }),
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.stack.last_mut() {
            None => self.blocks.push(block),
            Some(Frame::BlockQuote(children)) => children.push(block),
            Some(Frame::Item { blocks, loose }) => {
                if !loose.is_empty() {
                    blocks.push(Block::Paragraph(std::mem::take(loose)));
                }
                blocks.push(block);
            }
            Some(Frame::Other { raw, .. }) => {
                if let Block::Unsupported { raw: inner, .. } = block {
                    raw.push_str(&inner);
                }
            }
            Some(_) => {}
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        match self.stack.last_mut() {
            Some(
                Frame::Paragraph(inlines)
                | Frame::Heading { inlines, .. }
                | Frame::Cell(inlines)
                | Frame::Strong(inlines)
                | Frame::Emphasis(inlines)
                | Frame::Strike(inlines)
                | Frame::Link {
                    children: inlines, ..
                }
                | Frame::Image {
                    children: inlines, ..
                },
            ) => inlines.push(inline),
            Some(Frame::Item { loose, .. }) => loose.push(inline),
            Some(Frame::CodeBlock { content, .. }) => {
                content.push_str(&Inline::plain_text(std::slice::from_ref(&inline)))
            }
            Some(Frame::Html(raw) | Frame::Other { raw, .. }) => {
                raw.push_str(&Inline::plain_text(std::slice::from_ref(&inline)))
            }
            None | Some(Frame::BlockQuote(_)) => self.push_block(Block::Paragraph(vec![inline])),
            Some(Frame::List { .. } | Frame::Table { .. } | Frame::Row(_)) => {}
        }
    }

    fn finish(self) -> Result<Document, ParseError> {
        if !self.stack.is_empty() {
            return Err(ParseError::Unclosed {
                open: self.stack.len(),
            });
        }
        Ok(Document::new(self.blocks))
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn alignment(a: pulldown_cmark::Alignment) -> Alignment {
    match a {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}

fn tag_name(tag: &Tag<'_>) -> String {
    let debug = format!("{tag:?}");
    let name = debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
