//! Inline markup: the string format text labels understand.
//!
//! Markup is plain text with BBCode-style tags: `[b]`, `[i]`, `[s]`, `[u]`, `[font=name]` and
//! `[ref=id]`, each closed by `[/tag]`. Literal text is escaped so that it can never contain a
//! bracket:
//!
//! | char | escape  |
//! |------|---------|
//! | `&`  | `&amp;` |
//! | `[`  | `&bl;`  |
//! | `]`  | `&br;`  |
//!
//! [`render_inline`] produces markup from inline AST nodes; [`parse_markup`] is the label side,
//! turning markup back into plain text plus styled runs.

use crate::ast::Inline;
use crate::props::LinkStyle;
use std::ops::Range;
use url::Url;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '[' => out.push_str("&bl;"),
            ']' => out.push_str("&br;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape`]. A single left-to-right pass; `&` that does not start a known entity is
/// kept as is.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let (ch, len) = if rest.starts_with("&amp;") {
            ('&', 5)
        } else if rest.starts_with("&bl;") {
            ('[', 4)
        } else if rest.starts_with("&br;") {
            (']', 4)
        } else {
            ('&', 1)
        };
        out.push(ch);
        rest = &rest[len..];
    }
    out.push_str(rest);
    out
}

/// Link reference ids and the URLs they resolve to, in document order.
///
/// Ids are `link-<n>` and unique within one map; one map is shared by a whole render pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefMap {
    entries: Vec<(String, String)>,
}

impl RefMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `url` and returns its fresh reference id.
    pub fn insert(&mut self, url: impl Into<String>) -> String {
        let id = format!("link-{}", self.entries.len());
        self.entries.push((id.clone(), url.into()));
        id
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, url)| url.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct InlineContext<'a> {
    pub code_font: &'a str,
    pub link_style: LinkStyle,
    pub base_url: Option<&'a str>,
}

impl Default for InlineContext<'_> {
    fn default() -> Self {
        Self {
            code_font: "monospace",
            link_style: LinkStyle::default(),
            base_url: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineMarkup {
    pub markup: String,
    pub refs: RefMap,
}

/// Renders `inlines` with a fresh reference map.
pub fn render_inline(inlines: &[Inline], ctx: &InlineContext<'_>) -> InlineMarkup {
    let mut refs = RefMap::new();
    let markup = render_inline_into(inlines, ctx, &mut refs);
    InlineMarkup { markup, refs }
}

/// Renders `inlines`, allocating link ids from `refs`.
pub fn render_inline_into(inlines: &[Inline], ctx: &InlineContext<'_>, refs: &mut RefMap) -> String {
    let mut out = String::new();
    push_inlines(inlines, ctx, refs, &mut out);
    out
}

fn push_inlines(inlines: &[Inline], ctx: &InlineContext<'_>, refs: &mut RefMap, out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(s) => out.push_str(&escape(s)),
            Inline::Strong(children) => wrap("b", children, ctx, refs, out),
            Inline::Emphasis(children) => wrap("i", children, ctx, refs, out),
            Inline::Strike(children) => wrap("s", children, ctx, refs, out),
            Inline::CodeSpan(code) => {
                out.push_str("[font=");
                out.push_str(&escape(ctx.code_font));
                out.push(']');
                out.push_str(&escape(code));
                out.push_str("[/font]");
            }
            Inline::Link { url, children } => {
                let id = refs.insert(resolve_url(ctx.base_url, url));
                let underline = ctx.link_style == LinkStyle::Underline;
                if underline {
                    out.push_str("[u]");
                }
                out.push_str("[ref=");
                out.push_str(&id);
                out.push(']');
                push_inlines(children, ctx, refs, out);
                out.push_str("[/ref]");
                if underline {
                    out.push_str("[/u]");
                }
            }
            Inline::LineBreak => out.push('\n'),
            Inline::Image { alt, .. } => out.push_str(&escape(&format!("[{alt}]"))),
        }
    }
}

fn wrap(tag: &str, children: &[Inline], ctx: &InlineContext<'_>, refs: &mut RefMap, out: &mut String) {
    out.push('[');
    out.push_str(tag);
    out.push(']');
    push_inlines(children, ctx, refs, out);
    out.push_str("[/");
    out.push_str(tag);
    out.push(']');
}

/// Resolves a link or image destination against `base_url`. Absolute destinations and fragment
/// links are returned unchanged.
pub fn resolve_url(base_url: Option<&str>, dest: &str) -> String {
    let dest = dest.trim();
    if dest.is_empty() || is_absolute_url(dest) {
        return dest.to_string();
    }
    let Some(base) = base_url.map(str::trim).filter(|s| !s.is_empty()) else {
        return dest.to_string();
    };

    if let Ok(base) = Url::parse(base) {
        return base
            .join(dest)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| dest.to_string());
    }

    let dest = dest.trim_start_matches("./").trim_start_matches('/');
    format!("{}/{dest}", base.trim_end_matches('/'))
}

fn is_absolute_url(dest: &str) -> bool {
    dest.starts_with('#') || Url::parse(dest).is_ok()
}

/// Text attributes of one styled run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunAttrs {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: bool,
    pub font: Option<String>,
    pub ref_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledRun {
    /// Byte range into [`StyledText::text`].
    pub range: Range<usize>,
    pub attrs: RunAttrs,
}

/// Plain text plus the runs that style it. Runs are contiguous, non-empty and cover the text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyledText {
    pub text: String,
    pub runs: Vec<StyledRun>,
}

impl StyledText {
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        let runs = if text.is_empty() {
            Vec::new()
        } else {
            vec![StyledRun {
                range: 0..text.len(),
                attrs: RunAttrs::default(),
            }]
        };
        Self { text, runs }
    }

    /// Runs overlapping `range`, clipped to it.
    pub fn runs_in(&self, range: Range<usize>) -> impl Iterator<Item = (Range<usize>, &RunAttrs)> {
        self.runs.iter().filter_map(move |run| {
            let start = run.range.start.max(range.start);
            let end = run.range.end.min(range.end);
            (start < end).then_some((start..end, &run.attrs))
        })
    }

    fn push(&mut self, s: &str, attrs: &RunAttrs) {
        if s.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(s);
        let end = self.text.len();
        match self.runs.last_mut() {
            Some(last) if last.attrs == *attrs && last.range.end == start => last.range.end = end,
            _ => self.runs.push(StyledRun {
                range: start..end,
                attrs: attrs.clone(),
            }),
        }
    }
}

#[derive(Debug, Default)]
struct OpenTags {
    bold: usize,
    italic: usize,
    strike: usize,
    underline: usize,
    fonts: Vec<String>,
    refs: Vec<String>,
}

impl OpenTags {
    fn attrs(&self) -> RunAttrs {
        RunAttrs {
            bold: self.bold > 0,
            italic: self.italic > 0,
            strike: self.strike > 0,
            underline: self.underline > 0,
            font: self.fonts.last().cloned(),
            ref_id: self.refs.last().cloned(),
        }
    }

    /// Applies `tag` (the text between the brackets). Returns `false` when it is not a tag this
    /// format knows, or closes something that is not open.
    fn apply(&mut self, tag: &str) -> bool {
        fn close(n: &mut usize) -> bool {
            if *n == 0 {
                return false;
            }
            *n -= 1;
            true
        }

        match tag {
            "b" => self.bold += 1,
            "i" => self.italic += 1,
            "s" => self.strike += 1,
            "u" => self.underline += 1,
            "/b" => return close(&mut self.bold),
            "/i" => return close(&mut self.italic),
            "/s" => return close(&mut self.strike),
            "/u" => return close(&mut self.underline),
            "/font" => return self.fonts.pop().is_some(),
            "/ref" => return self.refs.pop().is_some(),
            _ => {
                if let Some(name) = tag.strip_prefix("font=") {
                    self.fonts.push(unescape(name));
                } else if let Some(id) = tag.strip_prefix("ref=") {
                    self.refs.push(unescape(id));
                } else {
                    return false;
                }
            }
        }
        true
    }
}

/// Splits markup into plain text and styled runs. Unknown or unbalanced tags are kept as literal
/// text.
pub fn parse_markup(markup: &str) -> StyledText {
    let mut out = StyledText::default();
    let mut open = OpenTags::default();
    let mut rest = markup;

    while let Some(lb) = rest.find('[') {
        out.push(&unescape(&rest[..lb]), &open.attrs());
        rest = &rest[lb..];
        let Some(rb) = rest.find(']') else {
            break;
        };
        let tag = &rest[1..rb];
        if tag.contains('[') || !open.apply(tag) {
            out.push("[", &open.attrs());
            rest = &rest[1..];
            continue;
        }
        rest = &rest[rb + 1..];
    }
    out.push(&unescape(rest), &open.attrs());
    out
}
