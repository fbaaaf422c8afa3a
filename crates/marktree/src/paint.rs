//! Painting the laid-out tree into a ratatui [`Buffer`].
//!
//! Live mode paints straight into the host's buffer. Texture mode paints the whole tree once into
//! an owned buffer ([`Texture`]) that is then blitted; while doing so it records the aggregated
//! hit-zone map, since individual labels are no longer addressable afterwards.

use crate::hit::HitZone;
use crate::hit::HitZoneIndex;
use crate::hit::ZoneOwner;
use crate::hit::push_zone;
use crate::layout::LabelLayout;
use crate::layout::Layout;
use crate::markup::RefMap;
use crate::markup::RunAttrs;
use crate::widget::ContainerLayout;
use crate::widget::Decoration;
use crate::widget::ImageState;
use crate::widget::LabelAttrs;
use crate::widget::LabelRole;
use crate::widget::WidgetKind;
use crate::widget::WidgetTree;
use marktree_core::geometry::CellRect;
use marktree_core::geometry::Offset;
use marktree_core::render;
use marktree_core::theme::Theme;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Span;

#[derive(Clone, Copy, Debug)]
pub struct PaintContext<'a> {
    pub theme: &'a Theme,
    pub refs: &'a RefMap,
}

/// Paints the tree with its root at `area`'s top-left corner, clipped to `area`.
pub fn paint_live(tree: &WidgetTree, layout: &Layout, ctx: &PaintContext<'_>, area: Rect, buf: &mut Buffer) {
    let origin = Offset::new(i32::from(area.x), i32::from(area.y));
    paint_tree(tree, layout, ctx, buf, origin, CellRect::from(area), None);
}

/// The tree painted into one buffer, plus the hit zones for it.
#[derive(Clone, Debug)]
pub struct Texture {
    buffer: Buffer,
    zones: HitZoneIndex,
}

impl Texture {
    pub fn rasterize(tree: &WidgetTree, layout: &Layout, ctx: &PaintContext<'_>) -> Self {
        let size = layout.size();
        let max = i32::from(u16::MAX);
        let area = Rect::new(0, 0, size.width.min(max) as u16, size.height.min(max) as u16);
        let mut buffer = Buffer::empty(area);
        let mut zones = Vec::new();
        paint_tree(
            tree,
            layout,
            ctx,
            &mut buffer,
            Offset::ZERO,
            CellRect::from(area),
            Some(&mut zones),
        );
        Self {
            buffer,
            zones: HitZoneIndex::new(zones),
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn zones(&self) -> &HitZoneIndex {
        &self.zones
    }

    /// Copies the texture into `buf` with its top-left corner at `area`'s, clipped to `area`.
    pub fn blit_into(&self, area: Rect, buf: &mut Buffer) {
        render::blit(&self.buffer, buf, area.x, area.y, area);
    }
}

struct Frame {
    slot: crate::widget::Slot,
    /// Root-local position of the parent's origin.
    parent: Offset,
    /// Root-local clip inherited from clip containers.
    clip: Option<CellRect>,
}

/// Explicit depth-first paint. `origin` maps root-local cells to buffer cells; `area` is the
/// buffer region that may be written. When `zones` is given, link boxes are collected in
/// root-local coordinates from the offsets accumulated along the way.
fn paint_tree(
    tree: &WidgetTree,
    layout: &Layout,
    ctx: &PaintContext<'_>,
    buf: &mut Buffer,
    origin: Offset,
    area: CellRect,
    mut zones: Option<&mut Vec<HitZone>>,
) {
    let mut stack = vec![Frame {
        slot: tree.root(),
        parent: Offset::ZERO,
        clip: None,
    }];
    let mut depth_guard = 0usize;

    while let Some(Frame { slot, parent, clip }) = stack.pop() {
        let (Some(node), Some(laid)) = (tree.get(slot), layout.node(slot)) else {
            continue;
        };
        depth_guard += 1;
        if depth_guard > tree.len() {
            log::warn!("paint visited more widgets than the tree holds; stopping");
            break;
        }

        let at = parent.then(Offset::new(laid.rect.x, laid.rect.y));
        let local = CellRect::new(0, 0, laid.rect.width, laid.rect.height).translate(at);
        let paint_clip = match clip {
            Some(c) => c.translate(origin).intersection(&area),
            None => Some(area),
        };

        if let Some(paint_clip) = paint_clip {
            let screen = local.translate(origin);
            match &node.kind {
                WidgetKind::Container(attrs) => {
                    if attrs.decoration == Decoration::LeftBorder {
                        paint_left_border(buf, screen, paint_clip, ctx.theme.quote_border);
                    }
                }
                WidgetKind::Label(label) => {
                    if let Some(l) = laid.label.as_ref() {
                        paint_label(buf, label, l, screen, paint_clip, ctx.theme);
                    }
                }
                WidgetKind::Image(image) => {
                    let text = match image.state {
                        ImageState::Loading => Some(("loading…".to_string(), ctx.theme.text_muted)),
                        ImageState::Loaded => None,
                        ImageState::Failed => {
                            let alt = if image.alt.is_empty() { &image.src } else { &image.alt };
                            Some((format!("[{alt}]"), ctx.theme.placeholder))
                        }
                    };
                    if let Some((text, style)) = text {
                        paint_text_line(buf, &text, style, screen.x, screen.y, paint_clip);
                    }
                }
                WidgetKind::Rule { height } => {
                    let line = "─".repeat(screen.width.max(0) as usize);
                    for dy in 0..i32::from(*height) {
                        paint_text_line(buf, &line, ctx.theme.rule, screen.x, screen.y + dy, paint_clip);
                    }
                }
            }
        }

        if let (Some(zones), WidgetKind::Label(_), Some(l)) =
            (zones.as_deref_mut(), &node.kind, laid.label.as_ref())
        {
            for b in &l.ref_boxes {
                push_zone(zones, b.rect.translate(at), clip, &b.ref_id, ctx.refs, ZoneOwner::Texture);
            }
        }

        let child_clip = match &node.kind {
            WidgetKind::Container(attrs) if matches!(attrs.layout, ContainerLayout::Clip { .. }) => {
                Some(match clip {
                    Some(c) => c.intersection(&local).unwrap_or_default(),
                    None => local,
                })
            }
            _ => clip,
        };
        for &child in tree.children(slot).iter().rev() {
            stack.push(Frame {
                slot: child,
                parent: at,
                clip: child_clip,
            });
        }
    }
}

fn paint_left_border(buf: &mut Buffer, screen: CellRect, clip: CellRect, style: Style) {
    for y in screen.y..screen.bottom() {
        paint_text_line(buf, "│", style, screen.x, y, clip);
    }
}

/// Paints `text` on one row starting at `(x, y)`, clipped to `clip`.
fn paint_text_line(buf: &mut Buffer, text: &str, style: Style, x: i32, y: i32, clip: CellRect) {
    paint_spans(buf, &[Span::raw(text)], style, x, y, clip);
}

fn paint_spans(buf: &mut Buffer, spans: &[Span<'_>], style: Style, x: i32, y: i32, clip: CellRect) {
    if y < clip.y || y >= clip.bottom() || x < clip.x || x >= clip.right() || y > i32::from(u16::MAX) {
        return;
    }
    let max_cols = (clip.right() - x).min(i32::from(u16::MAX));
    render::render_spans_clipped(x as u16, y as u16, max_cols as u16, buf, spans, style);
}

fn paint_label(
    buf: &mut Buffer,
    label: &LabelAttrs,
    laid: &LabelLayout,
    screen: CellRect,
    clip: CellRect,
    theme: &Theme,
) {
    let base = label_style(label, theme);
    if let Some(code) = &label.code
        && let Some(fill) = screen.intersection(&clip).and_then(|r| r.to_rect())
    {
        render::fill(buf, fill, " ", base.bg(code.background));
    }

    for line in &laid.lines {
        let mut spans: Vec<Span<'_>> = laid
            .styled
            .runs_in(line.range.clone())
            .map(|(range, attrs)| Span::styled(&laid.styled.text[range], run_style(attrs, theme)))
            .collect();
        if line.ellipsis {
            spans.push(Span::raw(laid.ellipsis.as_str()));
        }
        paint_spans(buf, &spans, base, screen.x + line.x, screen.y + line.y, clip);
    }
}

fn label_style(label: &LabelAttrs, theme: &Theme) -> Style {
    let style = match label.role {
        LabelRole::Body => theme.text_primary,
        LabelRole::Heading(1 | 2) => theme.accent.add_modifier(Modifier::BOLD),
        LabelRole::Heading(_) | LabelRole::TableHeader => {
            theme.text_primary.add_modifier(Modifier::BOLD)
        }
        LabelRole::Code => match &label.code {
            Some(code) => theme.code_block.bg(code.background),
            None => theme.code_block,
        },
        LabelRole::Marker => theme.text_muted,
        LabelRole::Placeholder => theme.placeholder,
    };
    match label.style.color {
        Some(color) => style.fg(color),
        None => style,
    }
}

fn run_style(attrs: &RunAttrs, theme: &Theme) -> Style {
    let mut style = Style::default();
    if attrs.font.is_some() {
        style = style.patch(theme.code_inline);
    }
    if attrs.ref_id.is_some() {
        style = style.patch(theme.link);
    }
    for (on, modifier) in [
        (attrs.bold, Modifier::BOLD),
        (attrs.italic, Modifier::ITALIC),
        (attrs.strike, Modifier::CROSSED_OUT),
        (attrs.underline, Modifier::UNDERLINED),
    ] {
        if on {
            style = style.add_modifier(modifier);
        }
    }
    style
}
