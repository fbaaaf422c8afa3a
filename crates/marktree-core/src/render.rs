use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;

/// Writes `spans` left to right starting at `(x, y)`, stopping after `max_cols` columns or at the
/// buffer edge. Returns the number of columns written.
///
/// Spans with the default style are drawn with `fallback_style`. Wide characters that do not fit
/// entirely are dropped rather than split.
pub fn render_spans_clipped(
    x: u16,
    y: u16,
    max_cols: u16,
    buf: &mut Buffer,
    spans: &[Span<'_>],
    fallback_style: Style,
) -> u16 {
    let area = buf.area;
    if max_cols == 0 || y < area.y || y >= area.bottom() {
        return 0;
    }

    let max_cols = max_cols as usize;
    let mut out_cols = 0usize;
    let mut tmp = [0u8; 4];

    for span in spans {
        let style = if span.style == Style::default() {
            fallback_style
        } else {
            fallback_style.patch(span.style)
        };
        for ch in span.content.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if w == 0 {
                continue;
            }
            if out_cols + w > max_cols {
                return out_cols as u16;
            }

            let cx = x as usize + out_cols;
            if cx >= area.right() as usize {
                return out_cols as u16;
            }
            let s = ch.encode_utf8(&mut tmp);
            if let Some(cell) = buf.cell_mut((cx as u16, y)) {
                cell.set_style(style);
                cell.set_symbol(s);
            }
            out_cols += 1;

            if w == 2 {
                let cx = x as usize + out_cols;
                if cx < area.right() as usize
                    && let Some(cell) = buf.cell_mut((cx as u16, y))
                {
                    cell.set_style(style);
                    cell.set_symbol("");
                }
                out_cols += 1;
            }
        }
    }
    out_cols as u16
}

/// Fills every cell of `area` (clipped to the buffer) with `symbol` in `style`.
pub fn fill(buf: &mut Buffer, area: Rect, symbol: &str, style: Style) {
    let area = area.intersection(buf.area);
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_symbol(symbol);
                cell.set_style(style);
            }
        }
    }
}

/// Copies `src` into `dst` with `src`'s top-left cell landing on `(at_x, at_y)`; only cells inside
/// `clip` are written.
pub fn blit(src: &Buffer, dst: &mut Buffer, at_x: u16, at_y: u16, clip: Rect) {
    let clip = clip.intersection(dst.area);
    for sy in 0..src.area.height {
        let dy = at_y.saturating_add(sy);
        if dy < clip.top() || dy >= clip.bottom() {
            continue;
        }
        for sx in 0..src.area.width {
            let dx = at_x.saturating_add(sx);
            if dx < clip.left() || dx >= clip.right() {
                continue;
            }
            let Some(cell) = src.cell((src.area.x + sx, src.area.y + sy)) else {
                continue;
            };
            if let Some(out) = dst.cell_mut((dx, dy)) {
                *out = cell.clone();
            }
        }
    }
}

/// Returns the longest prefix of `input` that fits in `max_cols` columns.
pub fn slice_by_cols(input: &str, max_cols: usize) -> &str {
    let mut cols = 0usize;
    for (b, ch) in input.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            return &input[..b];
        }
        cols += w;
    }
    input
}
