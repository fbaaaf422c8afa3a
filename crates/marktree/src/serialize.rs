//! Writing a [`Document`] back to Markdown text.
//!
//! The output is not a byte-for-byte copy of whatever was parsed; it is text that parses back to
//! the same document once both sides are [`normalize`]d.

use crate::ast::Alignment;
use crate::ast::Block;
use crate::ast::Document;
use crate::ast::Inline;
use crate::ast::List;
use crate::ast::Table;

pub fn serialize(document: &Document) -> String {
    let mut out = write_blocks(&document.blocks);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Merges adjacent text runs and drops empty ones, recursively.
pub fn normalize(document: Document) -> Document {
    Document::new(document.blocks.into_iter().map(normalize_block).collect())
}

fn normalize_block(block: Block) -> Block {
    match block {
        Block::Heading { level, inlines } => Block::Heading {
            level,
            inlines: normalize_inlines(inlines),
        },
        Block::Paragraph(inlines) => Block::Paragraph(normalize_inlines(inlines)),
        Block::List(mut list) => {
            for item in &mut list.items {
                item.children = std::mem::take(&mut item.children)
                    .into_iter()
                    .map(normalize_block)
                    .collect();
            }
            Block::List(list)
        }
        Block::BlockQuote(children) => {
            Block::BlockQuote(children.into_iter().map(normalize_block).collect())
        }
        Block::Table(mut table) => {
            for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                cell.inlines = normalize_inlines(std::mem::take(&mut cell.inlines));
            }
            Block::Table(table)
        }
        Block::CodeBlock {
            language,
            mut content,
        } => {
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            Block::CodeBlock { language, content }
        }
        other => other,
    }
}

fn normalize_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        let inline = match inline {
            Inline::Strong(c) => Inline::Strong(normalize_inlines(c)),
            Inline::Emphasis(c) => Inline::Emphasis(normalize_inlines(c)),
            Inline::Strike(c) => Inline::Strike(normalize_inlines(c)),
            Inline::Link { url, children } => Inline::Link {
                url,
                children: normalize_inlines(children),
            },
            other => other,
        };
        if let Inline::Text(s) = &inline {
            if s.is_empty() {
                continue;
            }
            if let Some(Inline::Text(prev)) = out.last_mut() {
                prev.push_str(s);
                continue;
            }
        }
        out.push(inline);
    }
    out
}

fn write_blocks(blocks: &[Block]) -> String {
    let mut parts = Vec::with_capacity(blocks.len());
    // Two lists in a row would merge unless their markers differ.
    let mut prev_list: Option<(bool, bool)> = None;
    for block in blocks {
        let part = match block {
            Block::List(list) => {
                let alternate = match prev_list {
                    Some((ordered, alt)) if ordered == list.ordered => !alt,
                    _ => false,
                };
                prev_list = Some((list.ordered, alternate));
                write_list(list, alternate)
            }
            other => {
                prev_list = None;
                write_block(other)
            }
        };
        parts.push(part);
    }
    parts.join("\n\n")
}

fn write_block(block: &Block) -> String {
    match block {
        Block::Heading { level, inlines } => {
            let mut out = "#".repeat(usize::from((*level).clamp(1, 6)));
            let content = write_inlines(inlines, false);
            if !content.is_empty() {
                out.push(' ');
                out.push_str(&content);
            }
            out
        }
        Block::Paragraph(inlines) => write_inlines(inlines, true),
        Block::List(list) => write_list(list, false),
        Block::CodeBlock { language, content } => write_code_block(language.as_deref(), content),
        Block::BlockQuote(children) => prefix_lines(&write_blocks(children), "> ", ">"),
        Block::ThematicBreak => "___".to_string(),
        Block::Image { src, alt } => write_image(src, alt),
        Block::Table(table) => write_table(table),
        Block::Unsupported { raw, .. } => raw.trim_end_matches('\n').to_string(),
    }
}

fn prefix_lines(text: &str, prefix: &str, empty: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                empty.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_list(list: &List, alternate: bool) -> String {
    let spread = list.items.iter().any(|item| item.children.len() > 1);
    let items: Vec<String> = list
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let marker = match (list.ordered, alternate) {
                (false, false) => "-".to_string(),
                (false, true) => "*".to_string(),
                (true, false) => format!("{}.", list.start + i as u64),
                (true, true) => format!("{})", list.start + i as u64),
            };
            write_item(&marker, &write_blocks(&item.children))
        })
        .collect();
    items.join(if spread { "\n\n" } else { "\n" })
}

fn write_item(marker: &str, content: &str) -> String {
    if content.is_empty() {
        return marker.to_string();
    }
    let indent = " ".repeat(marker.len() + 1);
    let mut out = String::with_capacity(content.len() + marker.len() + 1);
    for (i, line) in content.split('\n').enumerate() {
        if i == 0 {
            out.push_str(marker);
            out.push(' ');
        } else {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
            }
        }
        out.push_str(line);
    }
    out
}

fn write_code_block(language: Option<&str>, content: &str) -> String {
    let language = language.unwrap_or_default();
    let fence_char = if language.contains('`') { '~' } else { '`' };
    let fence = fence_char
        .to_string()
        .repeat((longest_run(content, fence_char) + 1).max(3));
    let mut out = format!("{fence}{language}\n{content}");
    if !content.is_empty() && !content.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&fence);
    out
}

/// Fence length [`serialize`] uses for a code block with `content`.
pub fn fence_len(content: &str) -> usize {
    (longest_run(content, '`') + 1).max(3)
}

fn longest_run(s: &str, ch: char) -> usize {
    let mut best = 0;
    let mut cur = 0;
    for c in s.chars() {
        if c == ch {
            cur += 1;
            best = best.max(cur);
        } else {
            cur = 0;
        }
    }
    best
}

fn write_image(src: &str, alt: &str) -> String {
    format!("![{}]({})", escape_text(alt, false), link_destination(src))
}

fn write_table(table: &Table) -> String {
    let columns = table
        .rows
        .iter()
        .map(|r| r.cells.len())
        .max()
        .unwrap_or(0)
        .max(table.alignments.len())
        .max(1);
    let row_line = |cells: Vec<String>| {
        let mut line = String::from("|");
        for cell in cells {
            line.push(' ');
            line.push_str(&cell);
            line.push_str(" |");
        }
        line
    };

    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    let mut rows = table.rows.iter();
    let header = rows.next();
    let cells_of = |row: Option<&crate::ast::TableRow>| {
        (0..columns)
            .map(|i| {
                row.and_then(|r| r.cells.get(i))
                    .map(|c| write_inlines(&c.inlines, false).replace('|', "\\|"))
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
    };
    lines.push(row_line(cells_of(header)));
    lines.push(row_line(
        (0..columns)
            .map(|i| {
                match table.alignments.get(i).copied().unwrap_or_default() {
                    Alignment::None => "---",
                    Alignment::Left => ":---",
                    Alignment::Center => ":---:",
                    Alignment::Right => "---:",
                }
                .to_string()
            })
            .collect(),
    ));
    for row in rows {
        lines.push(row_line(cells_of(Some(row))));
    }
    lines.join("\n")
}

fn write_inlines(inlines: &[Inline], line_start: bool) -> String {
    let mut w = InlineWriter {
        out: String::new(),
        line_start,
    };
    w.inlines(inlines);
    w.out
}

struct InlineWriter {
    out: String,
    /// The next text begins a line, where list markers and the like would be recognized.
    line_start: bool,
}

impl InlineWriter {
    /// Adjacent text runs are escaped as one string so line-start markers split across runs are
    /// still caught.
    fn inlines(&mut self, inlines: &[Inline]) {
        let mut i = 0;
        while let Some(inline) = inlines.get(i) {
            if !matches!(inline, Inline::Text(_)) {
                self.inline(inline, &inlines[i + 1..]);
                i += 1;
                continue;
            }
            let mut run = String::new();
            while let Some(Inline::Text(s)) = inlines.get(i) {
                run.push_str(s);
                i += 1;
            }
            let escaped = escape_text(&run, self.line_start);
            self.push(&escaped);
        }
    }

    /// `rest` holds the siblings after `inline`; they decide whether the node ends inside a word.
    fn inline(&mut self, inline: &Inline, rest: &[Inline]) {
        match inline {
            Inline::Text(s) => {
                let escaped = escape_text(s, self.line_start);
                self.push(&escaped);
            }
            Inline::Strong(children) => {
                let delim = if at_edge(children, |i| matches!(i, Inline::Emphasis(_)))
                    && self.outside_word(rest)
                {
                    "__"
                } else {
                    "**"
                };
                self.wrap(delim, children);
            }
            Inline::Emphasis(children) => {
                let delim = if at_edge(children, |i| matches!(i, Inline::Strong(_)))
                    && self.outside_word(rest)
                {
                    "_"
                } else {
                    "*"
                };
                self.wrap(delim, children);
            }
            Inline::Strike(children) => self.wrap("~~", children),
            Inline::CodeSpan(code) => self.push(&code_span(code)),
            Inline::Link { url, children } => {
                self.push("[");
                self.inlines(children);
                self.push("](");
                self.push(&link_destination(url));
                self.push(")");
            }
            Inline::LineBreak => {
                self.out.push_str("\\\n");
                self.line_start = true;
            }
            Inline::Image { src, alt } => self.push(&write_image(src, alt)),
        }
    }

    /// Underscore runs only open and close at word boundaries.
    fn outside_word(&self, rest: &[Inline]) -> bool {
        let before = self.out.chars().next_back();
        let after = leading_char(rest);
        [before, after]
            .into_iter()
            .all(|c| c.is_none_or(|c| !c.is_alphanumeric()))
    }

    fn wrap(&mut self, delim: &str, children: &[Inline]) {
        self.push(delim);
        self.inlines(children);
        self.push(delim);
    }

    fn push(&mut self, s: &str) {
        if !s.is_empty() {
            self.out.push_str(s);
            self.line_start = false;
        }
    }
}

fn at_edge(children: &[Inline], pred: impl Fn(&Inline) -> bool) -> bool {
    children.first().is_some_and(&pred) || children.last().is_some_and(&pred)
}

/// First character the writer emits for `inlines`, if any.
fn leading_char(inlines: &[Inline]) -> Option<char> {
    inlines.iter().find_map(|inline| match inline {
        Inline::Text(s) => s.chars().next(),
        Inline::Strong(_) | Inline::Emphasis(_) => Some('*'),
        Inline::Strike(_) => Some('~'),
        Inline::CodeSpan(_) => Some('`'),
        Inline::Link { .. } => Some('['),
        Inline::LineBreak => Some('\\'),
        Inline::Image { .. } => Some('!'),
    })
}

fn escape_text(s: &str, line_start: bool) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut rest = s;
    if line_start {
        let digits = s.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0
            && let Some(&delim @ (b'.' | b')')) = s.as_bytes().get(digits)
        {
            out.push_str(&s[..digits]);
            out.push('\\');
            out.push(char::from(delim));
            rest = &s[digits + 1..];
        } else if s.starts_with(['-', '+', '=']) {
            out.push('\\');
        }
    }
    for ch in rest.chars() {
        if matches!(
            ch,
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '&' | '~' | '#' | '!'
        ) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn code_span(code: &str) -> String {
    let ticks = "`".repeat(longest_run(code, '`') + 1);
    let pad = code.starts_with('`')
        || code.ends_with('`')
        || (code.starts_with(' ') && code.ends_with(' ') && !code.bytes().all(|b| b == b' '));
    if pad {
        format!("{ticks} {code} {ticks}")
    } else {
        format!("{ticks}{code}{ticks}")
    }
}

fn link_destination(url: &str) -> String {
    let bracketed = url.is_empty() || url.chars().any(|c| matches!(c, ' ' | '(' | ')') || c.is_control());
    let mut out = String::with_capacity(url.len() + 2);
    for ch in url.chars() {
        if matches!(ch, '\\' | '<' | '>' | '&') {
            out.push('\\');
        }
        out.push(ch);
    }
    if bracketed { format!("<{out}>") } else { out }
}
