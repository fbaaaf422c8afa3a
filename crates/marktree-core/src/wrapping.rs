use std::ops::Range;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    #[default]
    None,
    Word,
}

/// Splits `text` into display lines of at most `width` columns.
///
/// Lines are returned as byte ranges into `text` so callers can map styled runs (and link
/// references) onto the wrapped output. `'\n'` is always a hard break. Whitespace at a soft break
/// is dropped; a single word wider than `width` is split at the column limit.
pub fn wrap_ranges(text: &str, width: u16, mode: WrapMode) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = 0usize;
    for para in text.split('\n') {
        let end = start + para.len();
        match mode {
            WrapMode::None => out.push(start..end),
            WrapMode::Word => word_wrap_into(text, start..end, width as usize, &mut out),
        }
        start = end + 1;
    }
    out
}

pub fn str_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

pub fn normalize_tabs(s: &str) -> String {
    if s.contains('\t') {
        s.replace('\t', "    ")
    } else {
        s.to_string()
    }
}

fn word_wrap_into(text: &str, para: Range<usize>, max_cols: usize, out: &mut Vec<Range<usize>>) {
    if max_cols == 0 {
        out.push(para);
        return;
    }

    let before = out.len();
    // (line start, line end, line columns)
    let mut line: Option<(usize, usize, usize)> = None;

    for word in words(&text[para.clone()]) {
        let word_end = para.start + word.end;
        let mut word_start = para.start + word.start;
        let mut word_cols = str_width(&text[word_start..word_end]);

        if let Some((ls, le, cols)) = line {
            let gap = str_width(&text[le..word_start]);
            if cols + gap + word_cols <= max_cols {
                line = Some((ls, word_end, cols + gap + word_cols));
                continue;
            }
            out.push(ls..le);
            line = None;
        }

        while word_cols > max_cols {
            let split = split_at_cols(text, word_start..word_end, max_cols);
            out.push(word_start..split);
            word_start = split;
            word_cols = str_width(&text[word_start..word_end]);
        }
        if word_start < word_end {
            line = Some((word_start, word_end, word_cols));
        }
    }

    if let Some((ls, le, _)) = line {
        out.push(ls..le);
    }
    if out.len() == before {
        out.push(para.start..para.start);
    }
}

fn words(s: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (i, ch) in s.char_indices() {
        if ch.is_whitespace() {
            if let Some(st) = start.take() {
                out.push(st..i);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        out.push(st..s.len());
    }
    out
}

/// Byte index where `range` must be cut to fit `max_cols`. Always advances by at least one char.
fn split_at_cols(text: &str, range: Range<usize>, max_cols: usize) -> usize {
    let mut cols = 0usize;
    for (off, ch) in text[range.clone()].char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            if off == 0 {
                return range.start + ch.len_utf8();
            }
            return range.start + off;
        }
        cols += w;
    }
    range.end
}
