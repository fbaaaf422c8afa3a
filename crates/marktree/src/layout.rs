//! Layout: sizes and positions every widget for a given width.
//!
//! Each widget's rectangle is relative to its parent's top-left corner. Labels additionally get
//! their wrapped lines and the boxes of their link spans, both in label-local coordinates.

use crate::markup::StyledText;
use crate::markup::parse_markup;
use crate::props::HAlign;
use crate::props::VAlign;
use crate::widget::ContainerAttrs;
use crate::widget::ContainerLayout;
use crate::widget::ImageState;
use crate::widget::LabelAttrs;
use crate::widget::Slot;
use crate::widget::WidgetKind;
use crate::widget::WidgetTree;
use marktree_core::geometry::CellRect;
use marktree_core::geometry::Offset;
use marktree_core::geometry::Point;
use marktree_core::geometry::Size;
use marktree_core::render::slice_by_cols;
use marktree_core::wrapping::WrapMode;
use marktree_core::wrapping::str_width;
use marktree_core::wrapping::wrap_ranges;
use std::ops::Range;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaidLine {
    /// Byte range of the visible text in [`LabelLayout::styled`].
    pub range: Range<usize>,
    pub x: i32,
    pub y: i32,
    /// The line was cut short and ends with the ellipsis marker.
    pub ellipsis: bool,
}

/// Bounding box of one link fragment (one line's worth of a link span).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefBox {
    pub rect: CellRect,
    pub ref_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelLayout {
    pub styled: StyledText,
    pub lines: Vec<LaidLine>,
    pub ref_boxes: Vec<RefBox>,
    pub ellipsis: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeLayout {
    /// Relative to the parent's top-left corner.
    pub rect: CellRect,
    pub label: Option<LabelLayout>,
}

#[derive(Clone, Debug)]
pub struct Layout {
    width: u16,
    nodes: Vec<Option<NodeLayout>>,
}

impl Layout {
    pub fn compute(tree: &WidgetTree, width: u16) -> Self {
        let mut layout = Self {
            width,
            nodes: Vec::new(),
        };
        layout.place(tree, tree.root(), 0, 0, i32::from(width), 0);
        layout
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// Size of the whole tree.
    pub fn size(&self) -> Size {
        self.nodes
            .first()
            .and_then(Option::as_ref)
            .map_or(Size::default(), |n| Size::new(n.rect.width, n.rect.height))
    }

    pub fn node(&self, slot: Slot) -> Option<&NodeLayout> {
        self.nodes.get(slot.index()).and_then(Option::as_ref)
    }

    pub fn rect(&self, slot: Slot) -> Option<CellRect> {
        self.node(slot).map(|n| n.rect)
    }

    /// Offset from the root's origin to `slot`'s origin, found by walking the parent chain.
    pub fn offset_in_root(&self, tree: &WidgetTree, slot: Slot) -> Offset {
        let mut offset = Offset::ZERO;
        let mut cur = Some(slot);
        while let Some(s) = cur {
            if let Some(rect) = self.rect(s) {
                offset = offset.then(Offset::new(rect.x, rect.y));
            }
            cur = tree.get(s).and_then(|n| n.parent);
        }
        offset
    }

    /// Root-local area `slot` may paint into, if any ancestor clips. An empty rectangle means
    /// `slot` is clipped away entirely.
    pub fn clip_in_root(&self, tree: &WidgetTree, slot: Slot) -> Option<CellRect> {
        let mut clip: Option<CellRect> = None;
        let mut cur = tree.get(slot).and_then(|n| n.parent);
        while let Some(s) = cur {
            let node = tree.get(s);
            if let Some(WidgetKind::Container(attrs)) = node.map(|n| &n.kind)
                && matches!(attrs.layout, ContainerLayout::Clip { .. })
                && let Some(rect) = self.rect(s)
            {
                let origin = self.offset_in_root(tree, s);
                let area = CellRect::new(0, 0, rect.width, rect.height).translate(origin);
                clip = Some(match clip {
                    None => area,
                    Some(c) => c.intersection(&area).unwrap_or_default(),
                });
            }
            cur = node.and_then(|n| n.parent);
        }
        clip
    }

    fn set(&mut self, slot: Slot, node: NodeLayout) {
        let i = slot.index();
        if self.nodes.len() <= i {
            self.nodes.resize(i + 1, None);
        }
        self.nodes[i] = Some(node);
    }

    fn place(&mut self, tree: &WidgetTree, slot: Slot, x: i32, y: i32, width: i32, depth: usize) -> Size {
        let Some(node) = tree.get(slot) else {
            return Size::default();
        };
        let width = width.max(0);
        if depth > tree.depth_limit() {
            self.set(
                slot,
                NodeLayout {
                    rect: CellRect::new(x, y, 0, 0),
                    label: None,
                },
            );
            return Size::default();
        }

        let (size, label) = match &node.kind {
            WidgetKind::Container(attrs) => (self.container(tree, slot, attrs, width, depth), None),
            WidgetKind::Label(label) => {
                let (laid, height) = layout_label(label, width);
                (Size::new(width, height), Some(laid))
            }
            WidgetKind::Image(image) => {
                let rows = match image.state {
                    ImageState::Loading | ImageState::Loaded => i32::from(image.rows.max(1)),
                    ImageState::Failed => 1,
                };
                (Size::new(width, rows), None)
            }
            WidgetKind::Rule { height } => (Size::new(width, i32::from(*height)), None),
        };
        self.set(
            slot,
            NodeLayout {
                rect: CellRect::from_origin_size(Point::new(x, y), size),
                label,
            },
        );
        size
    }

    fn container(
        &mut self,
        tree: &WidgetTree,
        slot: Slot,
        attrs: &ContainerAttrs,
        width: i32,
        depth: usize,
    ) -> Size {
        let children = tree.children(slot);
        let pad = attrs.padding;
        let left = i32::from(pad.left);
        let top = i32::from(pad.top);
        let inner_w = (width - left - i32::from(pad.right)).max(0);

        let content_h = match attrs.layout {
            ContainerLayout::Column { gap } => {
                self.column(tree, children, left, top, inner_w, i32::from(gap), depth)
            }
            ContainerLayout::Clip { .. } => self.column(tree, children, left, top, inner_w, 1, depth),
            ContainerLayout::Grid { .. } => self.column(tree, children, left, top, inner_w, 0, depth),
            ContainerLayout::Row => {
                let mut h = 0;
                let first_w = children
                    .first()
                    .map_or(0, |&c| natural_width(tree, c).min(inner_w));
                let rest = children.len().saturating_sub(1) as i32;
                let rest_w = if rest > 0 { (inner_w - first_w) / rest } else { 0 };
                let mut x = left;
                for (i, &child) in children.iter().enumerate() {
                    let w = if i == 0 { first_w } else { rest_w };
                    h = h.max(self.place(tree, child, x, top, w, depth + 1).height);
                    x += w;
                }
                h
            }
            ContainerLayout::GridRow { columns } => {
                let columns = columns.max(1) as i32;
                let col_w = ((inner_w - (columns - 1)) / columns).max(1);
                let mut h = 0;
                for (i, &child) in children.iter().enumerate() {
                    let x = left + i as i32 * (col_w + 1);
                    h = h.max(self.place(tree, child, x, top, col_w, depth + 1).height);
                }
                for &child in children {
                    self.align_vertically(tree, child, top, h);
                }
                h
            }
        };

        let height = match attrs.layout {
            ContainerLayout::Clip { height } => i32::from(height),
            _ => top + content_h + i32::from(pad.bottom),
        };
        Size::new(width, height)
    }

    #[allow(clippy::too_many_arguments)]
    fn column(
        &mut self,
        tree: &WidgetTree,
        children: &[Slot],
        x: i32,
        top: i32,
        width: i32,
        gap: i32,
        depth: usize,
    ) -> i32 {
        let mut y = top;
        for (i, &child) in children.iter().enumerate() {
            if i > 0 {
                y += gap;
            }
            y += self.place(tree, child, x, y, width, depth + 1).height;
        }
        y - top
    }

    /// Moves a label that is shorter than its row according to its vertical alignment.
    fn align_vertically(&mut self, tree: &WidgetTree, slot: Slot, top: i32, row_h: i32) {
        let Some(WidgetKind::Label(label)) = tree.get(slot).map(|n| &n.kind) else {
            return;
        };
        let Some(node) = self.nodes.get_mut(slot.index()).and_then(Option::as_mut) else {
            return;
        };
        let slack = (row_h - node.rect.height).max(0);
        node.rect.y = top
            + match label.style.valign {
                VAlign::Top => 0,
                VAlign::Middle => slack / 2,
                VAlign::Bottom => slack,
            };
    }
}

/// Width a widget wants when it is not stretched: the widest text line of a label.
fn natural_width(tree: &WidgetTree, slot: Slot) -> i32 {
    match tree.get(slot).map(|n| &n.kind) {
        Some(WidgetKind::Label(label)) => {
            let styled = styled_text(label);
            let widest = styled.text.split('\n').map(str_width).max().unwrap_or(0);
            widest as i32 + 2 * i32::from(label.style.padding.x)
        }
        _ => 0,
    }
}

fn styled_text(label: &LabelAttrs) -> StyledText {
    if label.markup {
        parse_markup(&label.text)
    } else {
        StyledText::plain(label.text.clone())
    }
}

/// Wraps and aligns a label for `width` columns. Returns the layout and the label's height.
pub fn layout_label(label: &LabelAttrs, width: i32) -> (LabelLayout, i32) {
    let styled = styled_text(label);
    let style = &label.style;
    let pad_x = i32::from(style.padding.x);
    let pad_y = i32::from(style.padding.y);
    let inner_w = (width - 2 * pad_x).max(0);
    let marker = style.ellipsis.marker.as_str();
    let marker_w = str_width(marker) as i32;

    let mode = if label.is_code() || style.shorten {
        WrapMode::None
    } else {
        WrapMode::Word
    };
    let mut ranges = wrap_ranges(&styled.text, inner_w.min(i32::from(u16::MAX)) as u16, mode);
    let mut cut_last = false;
    if let Some(max) = style.max_lines
        && ranges.len() > max.max(1)
    {
        ranges.truncate(max.max(1));
        cut_last = true;
    }

    let rows = i32::from(style.line_rows());
    let halign = label.halign();
    let n = ranges.len();
    let mut lines = Vec::with_capacity(n);
    for (i, range) in ranges.into_iter().enumerate() {
        let full_w = str_width(&styled.text[range.clone()]) as i32;
        let wants_cut = (cut_last && i + 1 == n) || (style.shorten && full_w > inner_w);
        let (range, ellipsis) = if wants_cut {
            (shorten(&styled.text, range, inner_w - marker_w, &style.split_str), true)
        } else {
            (range, false)
        };
        let line_w =
            str_width(&styled.text[range.clone()]) as i32 + if ellipsis { marker_w } else { 0 };
        let slack = (inner_w - line_w).max(0);
        let dx = match halign {
            HAlign::Center => slack / 2,
            HAlign::Right => slack,
            HAlign::Left | HAlign::Auto => 0,
        };
        lines.push(LaidLine {
            range,
            x: pad_x + dx,
            y: pad_y + i as i32 * rows,
            ellipsis,
        });
    }

    let ref_boxes = ref_boxes(&styled, &lines);
    let height = n.max(1) as i32 * rows + 2 * pad_y;
    (
        LabelLayout {
            styled,
            lines,
            ref_boxes,
            ellipsis: marker.to_string(),
        },
        height,
    )
}

/// Longest prefix of `range` fitting `max_cols`; with a non-empty `split_str` the cut moves back
/// to the last occurrence of it that still fits.
fn shorten(text: &str, range: Range<usize>, max_cols: i32, split_str: &str) -> Range<usize> {
    let line = &text[range.clone()];
    let mut keep = slice_by_cols(line, max_cols.max(0) as usize).len();
    if !split_str.is_empty()
        && keep < line.len()
        && let Some(pos) = line[..keep].rfind(split_str)
    {
        keep = pos;
    }
    range.start..range.start + keep
}

fn ref_boxes(styled: &StyledText, lines: &[LaidLine]) -> Vec<RefBox> {
    let mut out: Vec<RefBox> = Vec::new();
    for line in lines {
        for (run, attrs) in styled.runs_in(line.range.clone()) {
            let Some(id) = attrs.ref_id.as_ref() else {
                continue;
            };
            let x = line.x + str_width(&styled.text[line.range.start..run.start]) as i32;
            let w = str_width(&styled.text[run]) as i32;
            match out.last_mut() {
                Some(prev) if prev.ref_id == *id && prev.rect.y == line.y && prev.rect.right() == x => {
                    prev.rect.width += w;
                }
                _ => out.push(RefBox {
                    rect: CellRect::new(x, line.y, w, 1),
                    ref_id: id.clone(),
                }),
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Alignment;
    use crate::props::Props;
    use crate::widget::LabelRole;
    use crate::widget::TextStyle;
    use crate::widget::WidgetSpec;
    use pretty_assertions::assert_eq;

    fn label(text: &str, markup: bool) -> LabelAttrs {
        LabelAttrs {
            text: text.to_string(),
            markup,
            role: LabelRole::Body,
            scale: 1.0,
            alignment: Alignment::None,
            code: None,
            style: TextStyle::from_props(&Props::default(), 1.0),
        }
    }

    fn visible(l: &LabelLayout) -> Vec<&str> {
        l.lines.iter().map(|line| &l.styled.text[line.range.clone()]).collect()
    }

    #[test]
    fn labels_wrap_to_width() {
        let (laid, h) = layout_label(&label("one two three", false), 7);
        assert_eq!(visible(&laid), vec!["one two", "three"]);
        assert_eq!(h, 2);
    }

    #[test]
    fn link_boxes_follow_wrapping() {
        let (laid, _) = layout_label(&label("ab [ref=link-0]cd ef[/ref]", true), 5);
        assert_eq!(visible(&laid), vec!["ab cd", "ef"]);
        assert_eq!(
            laid.ref_boxes,
            vec![
                RefBox {
                    rect: CellRect::new(3, 0, 2, 1),
                    ref_id: "link-0".into(),
                },
                RefBox {
                    rect: CellRect::new(0, 1, 2, 1),
                    ref_id: "link-0".into(),
                },
            ]
        );
    }

    #[test]
    fn styled_runs_inside_a_link_make_one_box() {
        let (laid, _) = layout_label(&label("[ref=link-0]a[b]b[/b]c[/ref]", true), 20);
        assert_eq!(laid.ref_boxes.len(), 1);
        assert_eq!(laid.ref_boxes[0].rect, CellRect::new(0, 0, 3, 1));
    }

    #[test]
    fn padding_alignment_and_line_height_move_lines() {
        let mut l = label("ab", false);
        l.style.padding.x = 1;
        l.style.padding.y = 1;
        l.style.halign = HAlign::Right;
        l.style.line_height = 2.0;
        let (laid, h) = layout_label(&l, 10);
        assert_eq!(laid.lines[0].x, 1 + 6);
        assert_eq!(laid.lines[0].y, 1);
        assert_eq!(h, 2 + 2);
    }

    #[test]
    fn max_lines_and_shorten_add_ellipsis() {
        let mut l = label("aaa bbb ccc", false);
        l.style.max_lines = Some(1);
        let (laid, h) = layout_label(&l, 4);
        assert_eq!(h, 1);
        assert!(laid.lines[0].ellipsis);
        assert_eq!(visible(&laid), vec!["aaa"]);

        let mut l = label("alpha/beta/gamma", false);
        l.style.shorten = true;
        l.style.split_str = "/".into();
        let (laid, _) = layout_label(&l, 12);
        assert_eq!(visible(&laid), vec!["alpha/beta"]);
        assert!(laid.lines[0].ellipsis);
    }

    #[test]
    fn containers_stack_and_offset_children() {
        let mut tree = WidgetTree::new(ContainerAttrs::column(1), 16);
        tree.graft(
            tree.root(),
            WidgetSpec::leaf(WidgetKind::Label(label("first", false)), vec![0].into()),
        );
        let quote = tree.graft(
            tree.root(),
            WidgetSpec::container(
                ContainerAttrs {
                    padding: crate::props::Padding::left(2),
                    ..ContainerAttrs::column(1)
                },
                vec![1].into(),
                vec![WidgetSpec::leaf(
                    WidgetKind::Label(label("inner", false)),
                    vec![1, 0].into(),
                )],
            ),
        );

        let layout = Layout::compute(&tree, 20);
        assert_eq!(layout.rect(quote), Some(CellRect::new(0, 2, 20, 1)));
        let inner = tree.children(quote)[0];
        assert_eq!(layout.rect(inner), Some(CellRect::new(2, 0, 18, 1)));
        assert_eq!(layout.offset_in_root(&tree, inner), Offset::new(2, 2));
        assert_eq!(layout.size(), Size::new(20, 3));
    }

    #[test]
    fn clip_containers_have_fixed_height() {
        let mut tree = WidgetTree::new(ContainerAttrs::column(1), 16);
        let clip = tree.graft(
            tree.root(),
            WidgetSpec::container(
                ContainerAttrs::with_layout(ContainerLayout::Clip { height: 1 }),
                crate::ast::NodePath::root(),
                vec![
                    WidgetSpec::leaf(WidgetKind::Label(label("a", false)), vec![0].into()),
                    WidgetSpec::leaf(WidgetKind::Label(label("b", false)), vec![1].into()),
                ],
            ),
        );
        let layout = Layout::compute(&tree, 10);
        assert_eq!(layout.rect(clip).map(|r| r.height), Some(1));
        let second = tree.children(clip)[1];
        assert_eq!(
            layout.clip_in_root(&tree, second),
            Some(CellRect::new(0, 0, 10, 1))
        );
        assert_eq!(layout.clip_in_root(&tree, clip), None);
    }
}
