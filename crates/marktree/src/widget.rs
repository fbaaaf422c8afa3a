//! The widget arena.
//!
//! Widgets live in slots of a [`WidgetTree`]; a [`Slot`] is a handle into the arena and may be
//! reused after its widget is discarded, while a [`WidgetId`] is never reused. The root occupies
//! the first slot and keeps its id for the lifetime of the tree.
//!
//! Render passes build detached [`WidgetSpec`] trees and [`WidgetTree::graft`] them in once they
//! are complete, so a failed pass never leaves a partial tree attached.

use crate::ast::Alignment;
use crate::ast::NodePath;
use crate::props::BaseDirection;
use crate::props::EllipsisOptions;
use crate::props::HAlign;
use crate::props::Padding;
use crate::props::Props;
use crate::props::TextPadding;
use crate::props::VAlign;
use ratatui::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl WidgetId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot(usize);

impl Slot {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Container,
    Label,
    Image,
    Rule,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerLayout {
    /// Children stacked vertically, `gap` empty rows between them.
    Column { gap: u16 },
    /// First child at its natural width, the remaining children share the rest.
    Row,
    /// Table body: every child is a [`ContainerLayout::GridRow`] of `columns` cells.
    Grid { columns: usize },
    /// Children side by side in equal columns.
    GridRow { columns: usize },
    /// A column clipped to a fixed height.
    Clip { height: u16 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Decoration {
    #[default]
    None,
    LeftBorder,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContainerAttrs {
    pub layout: ContainerLayout,
    pub padding: Padding,
    pub decoration: Decoration,
}

impl ContainerAttrs {
    pub fn column(gap: u16) -> Self {
        Self {
            layout: ContainerLayout::Column { gap },
            padding: Padding::default(),
            decoration: Decoration::None,
        }
    }

    pub fn with_layout(layout: ContainerLayout) -> Self {
        Self {
            layout,
            padding: Padding::default(),
            decoration: Decoration::None,
        }
    }
}

/// What a label is for; painting picks its base style from this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelRole {
    Body,
    Heading(u8),
    Code,
    Marker,
    TableHeader,
    Placeholder,
}

/// Text attributes forwarded from the tree's properties onto every label.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub color: Option<Color>,
    pub font_size: f32,
    pub font_name: Option<String>,
    pub font_context: Option<String>,
    pub font_features: Option<String>,
    pub font_hinting: Option<String>,
    pub font_kerning: bool,
    pub line_height: f32,
    pub padding: TextPadding,
    pub shorten: bool,
    pub split_str: String,
    pub max_lines: Option<usize>,
    pub ellipsis: EllipsisOptions,
    pub halign: HAlign,
    pub valign: VAlign,
    pub base_direction: BaseDirection,
}

impl TextStyle {
    /// Style of a label with font size multiplier `scale`.
    pub fn from_props(props: &Props, scale: f32) -> Self {
        Self {
            color: props.color,
            font_size: props.base_font_size * scale,
            font_name: props.font_name.clone(),
            font_context: props.font_context.clone(),
            font_features: props.font_features.clone(),
            font_hinting: props.font_hinting.clone(),
            font_kerning: props.font_kerning,
            line_height: props.line_height,
            padding: props.text_padding,
            shorten: props.shorten,
            split_str: props.split_str.clone(),
            max_lines: props.max_lines,
            ellipsis: props.ellipsis_options.clone(),
            halign: props.halign,
            valign: props.valign,
            base_direction: props.base_direction,
        }
    }

    /// Rows one text line occupies.
    pub fn line_rows(&self) -> u16 {
        if self.line_height.is_finite() && self.line_height > 1.0 {
            self.line_height.round().min(f32::from(u16::MAX)) as u16
        } else {
            1
        }
    }

    pub fn resolved_halign(&self) -> HAlign {
        match (self.halign, self.base_direction) {
            (HAlign::Auto, BaseDirection::Rtl) => HAlign::Right,
            (HAlign::Auto, _) => HAlign::Left,
            (other, _) => other,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CodeMeta {
    pub language: Option<String>,
    pub background: Color,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelAttrs {
    pub text: String,
    /// `text` is markup (see [`crate::markup`]) rather than literal text.
    pub markup: bool,
    pub role: LabelRole,
    /// Font size multiplier relative to the tree's base font size.
    pub scale: f32,
    /// Table cell alignment; overrides `style.halign` when set.
    pub alignment: Alignment,
    pub code: Option<CodeMeta>,
    pub style: TextStyle,
}

impl LabelAttrs {
    pub fn is_code(&self) -> bool {
        self.code.is_some()
    }

    pub fn halign(&self) -> HAlign {
        match self.alignment {
            Alignment::Left => HAlign::Left,
            Alignment::Center => HAlign::Center,
            Alignment::Right => HAlign::Right,
            Alignment::None => self.style.resolved_halign(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageState {
    #[default]
    Loading,
    Loaded,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAttrs {
    pub src: String,
    pub alt: String,
    pub state: ImageState,
    pub rows: u16,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WidgetKind {
    Container(ContainerAttrs),
    Label(LabelAttrs),
    Image(ImageAttrs),
    /// A horizontal line of fixed height.
    Rule { height: u16 },
}

impl WidgetKind {
    pub fn role(&self) -> Role {
        match self {
            WidgetKind::Container(_) => Role::Container,
            WidgetKind::Label(_) => Role::Label,
            WidgetKind::Image(_) => Role::Image,
            WidgetKind::Rule { .. } => Role::Rule,
        }
    }

    pub fn as_label(&self) -> Option<&LabelAttrs> {
        match self {
            WidgetKind::Label(label) => Some(label),
            _ => None,
        }
    }
}

/// A detached widget subtree produced by a render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetSpec {
    pub kind: WidgetKind,
    pub path: NodePath,
    pub children: Vec<WidgetSpec>,
}

impl WidgetSpec {
    pub fn leaf(kind: WidgetKind, path: NodePath) -> Self {
        Self {
            kind,
            path,
            children: Vec::new(),
        }
    }

    pub fn container(attrs: ContainerAttrs, path: NodePath, children: Vec<WidgetSpec>) -> Self {
        Self {
            kind: WidgetKind::Container(attrs),
            path,
            children,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: WidgetId,
    pub kind: WidgetKind,
    /// Back-reference into the document; `None` for the root.
    pub path: Option<NodePath>,
    pub parent: Option<Slot>,
    pub children: Vec<Slot>,
}

#[derive(Debug)]
pub struct WidgetTree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    next_id: u64,
    depth_limit: usize,
}

impl WidgetTree {
    /// Creates a tree holding only the root. Traversals stop descending below `depth_limit`.
    pub fn new(root: ContainerAttrs, depth_limit: usize) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            next_id: 0,
            depth_limit,
        };
        tree.alloc(WidgetKind::Container(root), None, None);
        tree
    }

    pub fn root(&self) -> Slot {
        Slot(0)
    }

    pub fn root_id(&self) -> WidgetId {
        self.nodes[0].as_ref().map_or(WidgetId(0), |n| n.id)
    }

    pub fn get(&self, slot: Slot) -> Option<&Node> {
        self.nodes.get(slot.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut Node> {
        self.nodes.get_mut(slot.0).and_then(Option::as_mut)
    }

    pub fn children(&self, slot: Slot) -> &[Slot] {
        self.get(slot)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    pub fn find(&self, id: WidgetId) -> Option<Slot> {
        self.nodes
            .iter()
            .position(|n| n.as_ref().is_some_and(|n| n.id == id))
            .map(Slot)
    }

    /// Number of live widgets, root included.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    fn alloc(&mut self, kind: WidgetKind, path: Option<NodePath>, parent: Option<Slot>) -> Slot {
        let node = Node {
            id: WidgetId(self.next_id),
            kind,
            path,
            parent,
            children: Vec::new(),
        };
        self.next_id += 1;
        match self.free.pop() {
            Some(i) => {
                self.nodes[i] = Some(node);
                Slot(i)
            }
            None => {
                self.nodes.push(Some(node));
                Slot(self.nodes.len() - 1)
            }
        }
    }

    /// Discards every descendant of `slot`; `slot` itself keeps its identity.
    pub fn clear_children(&mut self, slot: Slot) {
        let Some(node) = self.get_mut(slot) else {
            return;
        };
        let mut stack = std::mem::take(&mut node.children);
        while let Some(child) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(child.0).and_then(Option::take) {
                stack.extend(node.children);
                self.free.push(child.0);
            }
        }
    }

    /// Attaches `spec` as the last child of `parent`, assigning fresh ids in document order.
    pub fn graft(&mut self, parent: Slot, spec: WidgetSpec) -> Slot {
        let mut stack = vec![(parent, spec)];
        let mut top = None;
        while let Some((parent, spec)) = stack.pop() {
            let WidgetSpec {
                kind,
                path,
                children,
            } = spec;
            let slot = self.alloc(kind, Some(path), Some(parent));
            if let Some(p) = self.get_mut(parent) {
                p.children.push(slot);
            }
            top.get_or_insert(slot);
            stack.extend(children.into_iter().rev().map(|c| (slot, c)));
        }
        top.unwrap_or(parent)
    }

    /// Depth-first, document-order walk from the root. Yields `(slot, depth)` with the root at
    /// depth 0 and never descends past the depth limit.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![(self.root(), 0)],
        }
    }

    /// Every live widget id in document order.
    pub fn ids(&self) -> Vec<WidgetId> {
        self.walk()
            .filter_map(|(slot, _)| self.get(slot).map(|n| n.id))
            .collect()
    }

    pub fn labels(&self) -> impl Iterator<Item = (WidgetId, &LabelAttrs)> + '_ {
        self.walk().filter_map(|(slot, _)| {
            let node = self.get(slot)?;
            node.kind.as_label().map(|l| (node.id, l))
        })
    }

    /// Slots of every label, in document order.
    pub fn label_slots(&self) -> Vec<Slot> {
        self.walk()
            .filter(|&(slot, _)| self.get(slot).is_some_and(|n| n.kind.role() == Role::Label))
            .map(|(slot, _)| slot)
            .collect()
    }
}

pub struct Walk<'a> {
    tree: &'a WidgetTree,
    stack: Vec<(Slot, usize)>,
}

impl Iterator for Walk<'_> {
    type Item = (Slot, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (slot, depth) = self.stack.pop()?;
        if depth < self.tree.depth_limit {
            let children = self.tree.children(slot);
            self.stack
                .extend(children.iter().rev().map(|&c| (c, depth + 1)));
        } else if !self.tree.children(slot).is_empty() {
            log::warn!("widget tree deeper than {}; skipping", self.tree.depth_limit);
        }
        Some((slot, depth))
    }
}
