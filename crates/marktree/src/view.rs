use crate::ast::Block;
use crate::ast::Document;
use crate::block;
use crate::block::BlockContext;
use crate::error::ConfigError;
use crate::error::Error;
use crate::error::ParseError;
use crate::error::RenderError;
use crate::hit::HitZoneIndex;
use crate::hit::LinkTarget;
use crate::layout::Layout;
use crate::markup::RefMap;
use crate::options::MarkdownTreeOptions;
use crate::paint;
use crate::paint::PaintContext;
use crate::paint::Texture;
use crate::parse::parse;
use crate::props::HAlign;
use crate::props::LinkStyle;
use crate::props::Padding;
use crate::props::Prop;
use crate::props::PropClass;
use crate::props::Props;
use crate::props::RenderMode;
use crate::props::TextSize;
use crate::props::VAlign;
use crate::scheduler::RebuildScheduler;
use crate::scheduler::SchedulerState;
use crate::serialize::serialize;
use crate::widget::ContainerLayout;
use crate::widget::ImageState;
use crate::widget::LabelAttrs;
use crate::widget::WidgetId;
use crate::widget::WidgetKind;
use crate::widget::WidgetTree;
use marktree_core::clock::FrameClock;
use marktree_core::geometry::CellRect;
use marktree_core::geometry::Offset;
use marktree_core::geometry::Point;
use marktree_core::geometry::Size;
use marktree_core::input::MouseEvent;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use std::collections::HashMap;
use std::collections::HashSet;

/// Result of pointer handling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkAction {
    None,
    Activated(LinkTarget),
}

/// A Markdown document kept alive as a widget tree.
///
/// Property writes fall into two classes (see [`crate::props::PropKey::class`]). Style writes
/// patch the existing widgets in place and never change a widget id. Structure writes (the text itself,
/// height constraints, render mode, link handling) discard everything below the root and render
/// again, but not immediately: they arm a one-shot request on the host's [`FrameClock`], and the
/// host calls [`MarkdownTree::on_frame`] when it fires. Any number of structure writes between two
/// frames therefore cost one rebuild. [`MarkdownTree::force_rebuild`] rebuilds right away.
///
/// Layout is computed lazily for the width of the area being painted and cached until the next
/// write.
pub struct MarkdownTree {
    options: MarkdownTreeOptions,
    props: Props,
    text: String,
    ast: Option<Document>,
    tree: WidgetTree,
    refs: RefMap,
    scheduler: RebuildScheduler,
    layout: Option<Layout>,
    zones: HitZoneIndex,
    texture: Option<Texture>,
    /// Render mode of the current tree; a pending mode change only takes effect on rebuild.
    built_mode: RenderMode,
    last_width: Option<u16>,
    warned_tags: HashSet<String>,
    image_states: HashMap<String, ImageState>,
}

impl std::fmt::Debug for MarkdownTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownTree")
            .field("root", &self.tree.root_id())
            .field("widgets", &self.tree.len())
            .field("scheduler", &self.scheduler.state())
            .field("built_mode", &self.built_mode)
            .finish_non_exhaustive()
    }
}

impl MarkdownTree {
    pub fn new(clock: Box<dyn FrameClock>) -> Self {
        Self::build(clock, MarkdownTreeOptions::default())
    }

    pub fn with_options(
        clock: Box<dyn FrameClock>,
        options: MarkdownTreeOptions,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self::build(clock, options))
    }

    fn build(clock: Box<dyn FrameClock>, options: MarkdownTreeOptions) -> Self {
        let props = Props {
            code_font_name: options.code_font_name.clone(),
            ..Props::default()
        };
        let tree = WidgetTree::new(
            block::root_attrs(&props),
            block::widget_depth_limit(&options),
        );
        Self {
            built_mode: props.render_mode,
            options,
            props,
            text: String::new(),
            ast: None,
            tree,
            refs: RefMap::new(),
            scheduler: RebuildScheduler::new(clock),
            layout: None,
            zones: HitZoneIndex::default(),
            texture: None,
            last_width: None,
            warned_tags: HashSet::new(),
            image_states: HashMap::new(),
        }
    }

    pub fn options(&self) -> &MarkdownTreeOptions {
        &self.options
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Parses `text` and schedules a rebuild. On error nothing changes.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), ParseError> {
        let text = text.into();
        let document = parse(&text)?;
        self.text = text;
        self.ast = Some(document);
        self.scheduler.request();
        Ok(())
    }

    /// Appends a streamed chunk. The whole text is re-parsed, but the rebuild is still deferred
    /// to the next frame, so a fast producer costs one rebuild per frame.
    pub fn append_text(&mut self, chunk: &str) -> Result<(), ParseError> {
        let mut text = std::mem::take(&mut self.text);
        text.push_str(chunk);
        match parse(&text) {
            Ok(document) => {
                self.text = text;
                self.ast = Some(document);
                self.scheduler.request();
                Ok(())
            }
            Err(err) => {
                text.truncate(text.len() - chunk.len());
                self.text = text;
                Err(err)
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the document. [`Self::text`] becomes its serialized form.
    pub fn set_ast(&mut self, document: Document) {
        self.text = serialize(&document);
        self.ast = Some(document);
        self.scheduler.request();
    }

    pub fn ast(&self) -> Option<&Document> {
        self.ast.as_ref()
    }

    /// Writes one property. Only [`Prop::Text`] can fail.
    pub fn set(&mut self, prop: Prop) -> Result<(), Error> {
        match prop {
            Prop::Text(text) => self.set_text(text)?,
            Prop::Ast(document) => self.set_ast(document),
            prop => self.set_property(prop),
        }
        Ok(())
    }

    fn set_property(&mut self, prop: Prop) {
        let key = prop.key();
        if !self.props.apply(&prop) {
            return;
        }
        match key.class() {
            PropClass::Style => {
                let touched = block::restyle(&mut self.tree, &self.props, key);
                self.relayout();
                log::trace!("style write {}: patched {touched} widgets", key.name());
            }
            PropClass::Structure => {
                if self.ast.is_some() {
                    self.scheduler.request();
                }
            }
        }
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.set_property(Prop::Color(color));
    }

    pub fn set_base_font_size(&mut self, size: f32) {
        self.set_property(Prop::BaseFontSize(size));
    }

    pub fn set_font_name(&mut self, font: Option<String>) {
        self.set_property(Prop::FontName(font));
    }

    pub fn set_code_font_name(&mut self, font: impl Into<String>) {
        self.set_property(Prop::CodeFontName(font.into()));
    }

    pub fn set_max_lines(&mut self, max_lines: Option<usize>) {
        self.set_property(Prop::MaxLines(max_lines));
    }

    pub fn set_halign(&mut self, halign: HAlign) {
        self.set_property(Prop::Halign(halign));
    }

    pub fn set_valign(&mut self, valign: VAlign) {
        self.set_property(Prop::Valign(valign));
    }

    pub fn set_padding(&mut self, padding: Padding) {
        self.set_property(Prop::Padding(padding));
    }

    pub fn set_text_size(&mut self, size: TextSize) {
        self.set_property(Prop::TextSize(size));
    }

    pub fn set_strict_label_mode(&mut self, strict: bool) {
        self.set_property(Prop::StrictLabelMode(strict));
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.set_property(Prop::RenderMode(mode));
    }

    pub fn set_link_style(&mut self, style: LinkStyle) {
        self.set_property(Prop::LinkStyle(style));
    }

    pub fn set_base_url(&mut self, base_url: Option<String>) {
        self.set_property(Prop::BaseUrl(base_url));
    }

    /// Rebuilds now, withdrawing any scheduled rebuild.
    pub fn force_rebuild(&mut self) -> Result<(), RenderError> {
        if self.ast.is_none() {
            return Err(RenderError::NoDocument);
        }
        self.scheduler.begin_forced();
        self.rebuild();
        self.scheduler.finish();
        Ok(())
    }

    /// Host tick. Runs the pending rebuild, if any; returns whether one ran.
    pub fn on_frame(&mut self) -> bool {
        if !self.scheduler.take_frame() {
            return false;
        }
        if self.ast.is_none() {
            self.scheduler.abort();
            return false;
        }
        self.rebuild();
        self.scheduler.finish();
        true
    }

    pub fn is_rebuild_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn rebuild_count(&self) -> u64 {
        self.scheduler.rebuild_count()
    }

    fn rebuild(&mut self) {
        let Some(document) = self.ast.as_ref() else {
            return;
        };
        let rendered = block::render(
            document,
            &BlockContext {
                props: &self.props,
                options: &self.options,
            },
        );
        for tag in &rendered.unsupported {
            if self.warned_tags.insert(tag.clone()) {
                log::warn!("unsupported markdown construct `{tag}` rendered as a placeholder");
            }
        }

        let root = self.tree.root();
        self.tree.clear_children(root);
        if let Some(WidgetKind::Container(attrs)) = self.tree.get_mut(root).map(|n| &mut n.kind) {
            *attrs = block::root_attrs(&self.props);
        }
        let blocks = rendered.blocks.len();
        for spec in rendered.blocks {
            self.tree.graft(root, spec);
        }
        self.refs = rendered.refs;
        self.built_mode = self.props.render_mode;
        self.restore_image_states();

        self.relayout();
        log::debug!(
            "rebuilt markdown tree: {blocks} blocks, {} widgets, {} hit zones, {} truncated",
            self.tree.len(),
            self.zones.len(),
            rendered.truncated,
        );
    }

    pub fn root_id(&self) -> WidgetId {
        self.tree.root_id()
    }

    /// Every widget id, root first, in document order.
    pub fn widget_ids(&self) -> Vec<WidgetId> {
        self.tree.ids()
    }

    pub fn labels(&self) -> impl Iterator<Item = (WidgetId, &LabelAttrs)> + '_ {
        self.tree.labels()
    }

    /// Number of widgets standing for top-level blocks (looking through the clip container).
    pub fn block_widget_count(&self) -> usize {
        let root = self.tree.root();
        match self.tree.children(root) {
            [only] if self.tree.get(*only).is_some_and(|n| {
                matches!(
                    &n.kind,
                    WidgetKind::Container(attrs) if matches!(attrs.layout, ContainerLayout::Clip { .. })
                )
            }) =>
            {
                self.tree.children(*only).len()
            }
            children => children.len(),
        }
    }

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    /// Link reference ids of the current tree.
    pub fn refs(&self) -> &RefMap {
        &self.refs
    }

    /// The block a widget was rendered from.
    pub fn ast_node(&self, id: WidgetId) -> Option<&Block> {
        let slot = self.tree.find(id)?;
        let path = self.tree.get(slot)?.path.as_ref()?;
        self.ast.as_ref()?.block_at(path)
    }

    /// Reports the host's progress loading image `src`. Returns the number of image widgets
    /// updated. The state is remembered across rebuilds.
    pub fn set_image_state(&mut self, src: &str, state: ImageState) -> usize {
        self.image_states.insert(src.to_string(), state);
        let updated = self.restore_image_states();
        if updated > 0 {
            self.relayout();
        }
        updated
    }

    fn restore_image_states(&mut self) -> usize {
        if self.image_states.is_empty() {
            return 0;
        }
        let slots: Vec<_> = self.tree.walk().map(|(slot, _)| slot).collect();
        let mut updated = 0;
        for slot in slots {
            if let Some(WidgetKind::Image(image)) = self.tree.get_mut(slot).map(|n| &mut n.kind)
                && let Some(&state) = self.image_states.get(&image.src)
                && image.state != state
            {
                image.state = state;
                updated += 1;
            }
        }
        updated
    }

    fn invalidate_layout(&mut self) {
        self.layout = None;
        self.texture = None;
        self.zones = HitZoneIndex::default();
    }

    /// Drops cached layout and lays out again at the last known width, so the hit-zone index
    /// keeps covering what is on screen.
    fn relayout(&mut self) {
        self.invalidate_layout();
        if let Some(width) = self.last_width {
            self.ensure_layout(width);
        }
    }

    fn ensure_layout(&mut self, width: u16) {
        self.last_width = Some(width);
        if self.layout.as_ref().is_some_and(|l| l.width() == width) {
            return;
        }
        let layout = Layout::compute(&self.tree, width);
        match self.built_mode {
            RenderMode::Live => {
                self.zones = HitZoneIndex::live(&self.tree, &layout, &self.refs);
                self.texture = None;
            }
            RenderMode::Texture => {
                let ctx = PaintContext {
                    theme: &self.options.theme,
                    refs: &self.refs,
                };
                let texture = Texture::rasterize(&self.tree, &layout, &ctx);
                self.zones = texture.zones().clone();
                self.texture = Some(texture);
            }
        }
        self.layout = Some(layout);
    }

    /// Size of the laid-out tree at `width`.
    pub fn content_size(&mut self, width: u16) -> Size {
        self.ensure_layout(width);
        self.layout.as_ref().map(Layout::size).unwrap_or_default()
    }

    /// Hit zones for the tree laid out at `width`, in root-local cells.
    pub fn hit_zones(&mut self, width: u16) -> &HitZoneIndex {
        self.ensure_layout(width);
        &self.zones
    }

    /// Hit-tests a root-local point against the last layout.
    pub fn locate(&self, point: Point) -> Option<&LinkTarget> {
        self.zones.locate(point)
    }

    /// Hit-tests a point local to a nested child; see [`HitZoneIndex::locate_from`].
    pub fn locate_from(&self, local: Point, offsets: &[Offset]) -> Option<&LinkTarget> {
        self.zones.locate_from(local, offsets)
    }

    /// Activates the link under a left-button press inside `area`.
    pub fn handle_mouse_event(&mut self, area: Rect, event: MouseEvent) -> LinkAction {
        if area.width == 0 || area.height == 0 || !event.is_primary_down() {
            return LinkAction::None;
        }
        let position = event.position();
        if !CellRect::from(area).contains(position) {
            return LinkAction::None;
        }
        self.ensure_layout(area.width);
        let local = position.translate(-Offset::new(i32::from(area.x), i32::from(area.y)));
        match self.zones.locate(local) {
            Some(target) => LinkAction::Activated(target.clone()),
            None => LinkAction::None,
        }
    }

    /// Paints the tree into `area`, laying it out for `area.width` first if needed.
    pub fn render_ref(&mut self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        self.ensure_layout(area.width);
        match (self.built_mode, self.texture.as_ref(), self.layout.as_ref()) {
            (RenderMode::Texture, Some(texture), _) => texture.blit_into(area, buf),
            (_, _, Some(layout)) => {
                let ctx = PaintContext {
                    theme: &self.options.theme,
                    refs: &self.refs,
                };
                paint::paint_live(&self.tree, layout, &ctx, area, buf);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::LabelRole;
    use marktree_core::clock::ManualClock;
    use pretty_assertions::assert_eq;

    fn tree() -> (ManualClock, MarkdownTree) {
        let clock = ManualClock::new();
        let view = MarkdownTree::new(Box::new(clock.clone()));
        (clock, view)
    }

    fn built(md: &str) -> (ManualClock, MarkdownTree) {
        let (clock, mut view) = tree();
        view.set_text(md).expect("parse");
        view.force_rebuild().expect("rebuild");
        (clock, view)
    }

    #[test]
    fn rebuild_without_document_is_an_error() {
        let (clock, mut view) = tree();
        assert_eq!(view.force_rebuild(), Err(RenderError::NoDocument));
        view.set_render_mode(RenderMode::Texture);
        assert_eq!(view.props().render_mode, RenderMode::Texture);
        assert!(!view.is_rebuild_pending());
        assert_eq!(clock.requests(), 0);
        assert_eq!(view.widget_ids(), vec![view.root_id()]);
    }

    #[test]
    fn structure_writes_coalesce_until_the_frame() {
        let (clock, mut view) = tree();
        let root = view.root_id();
        view.set_text("a").expect("parse");
        view.append_text("b").expect("parse");
        view.set_link_style(LinkStyle::Plain);
        view.set_strict_label_mode(true);
        assert_eq!(clock.requests(), 1);
        assert_eq!(view.scheduler_state(), SchedulerState::Pending);
        assert_eq!(view.rebuild_count(), 0);

        assert!(clock.take_frame());
        assert!(view.on_frame());
        assert!(!view.on_frame());
        assert_eq!(view.rebuild_count(), 1);
        assert_eq!(view.scheduler_state(), SchedulerState::Idle);
        assert_eq!(view.root_id(), root);
        assert_eq!(view.text(), "ab");
    }

    #[test]
    fn force_rebuild_cancels_the_frame_request() {
        let (clock, mut view) = tree();
        view.set_text("x").expect("parse");
        view.force_rebuild().expect("rebuild");
        assert_eq!(clock.cancels(), 1);
        assert!(!clock.is_scheduled());
        assert!(!view.on_frame());
        assert_eq!(view.rebuild_count(), 1);
    }

    #[test]
    fn style_writes_keep_identities() {
        let (clock, mut view) = built("# T\n\npara\n\n```\ncode\n```\n");
        let ids = view.widget_ids();
        view.set_base_font_size(20.0);
        view.set_base_font_size(20.0);
        view.set_font_name(Some("Serif".into()));
        assert_eq!(view.widget_ids(), ids);
        assert!(!view.is_rebuild_pending());
        assert_eq!(clock.requests(), 1);

        let labels: Vec<_> = view.labels().map(|(_, l)| l.clone()).collect();
        assert_eq!(labels[0].style.font_size, 40.0);
        assert_eq!(labels[1].style.font_size, 20.0);
        assert_eq!(labels[1].style.font_name.as_deref(), Some("Serif"));
        assert_eq!(labels[2].role, LabelRole::Code);
        assert_eq!(labels[2].style.font_name.as_deref(), Some("monospace"));
    }

    #[test]
    fn structure_rebuild_replaces_descendants_only() {
        let (_clock, mut view) = built("one\n\ntwo\n");
        let before = view.widget_ids();
        view.set_text("one\n\ntwo\n\nthree\n").expect("parse");
        view.force_rebuild().expect("rebuild");
        let after = view.widget_ids();
        assert_eq!(after[0], before[0]);
        assert!(after[1..].iter().all(|id| !before.contains(id)));
        assert_eq!(view.block_widget_count(), 3);
    }

    #[test]
    fn set_ast_serializes_the_text() {
        let (_clock, mut view) = tree();
        let doc = parse("*hi*\n").expect("parse");
        view.set_ast(doc.clone());
        assert_eq!(view.text(), "*hi*\n");
        assert_eq!(view.ast(), Some(&doc));
    }

    #[test]
    fn set_dispatches_by_property_class() {
        let (clock, mut view) = built("keep");
        view.set(Prop::Color(Some(Color::Red))).expect("style write");
        assert!(!view.is_rebuild_pending());
        assert!(view.labels().all(|(_, l)| l.style.color == Some(Color::Red)));

        view.set(Prop::Text("new".into())).expect("structure write");
        assert!(view.is_rebuild_pending());
        assert_eq!(clock.requests(), 2);
        assert_eq!(view.text(), "new");
    }

    #[test]
    fn widgets_map_back_to_blocks() {
        let (_clock, view) = built("para\n\n> quoted\n");
        let (id, _) = view
            .labels()
            .find(|(_, l)| l.text == "quoted")
            .expect("quote label");
        assert_eq!(
            view.ast_node(id),
            Some(&Block::Paragraph(vec![crate::ast::Inline::text("quoted")]))
        );
        assert_eq!(view.ast_node(view.root_id()), None);
    }

    #[test]
    fn image_state_survives_rebuilds() {
        let (_clock, mut view) = built("![alt](a.png)\n");
        assert_eq!(view.set_image_state("a.png", ImageState::Failed), 1);
        assert_eq!(view.set_image_state("a.png", ImageState::Failed), 0);
        view.force_rebuild().expect("rebuild");
        let images: Vec<_> = view
            .tree()
            .walk()
            .filter_map(|(slot, _)| match &view.tree().get(slot)?.kind {
                WidgetKind::Image(image) => Some(image.state),
                _ => None,
            })
            .collect();
        assert_eq!(images, vec![ImageState::Failed]);
    }

    #[test]
    fn mouse_press_activates_links_in_both_modes() {
        for mode in [RenderMode::Live, RenderMode::Texture] {
            let (_clock, mut view) = tree();
            view.set_render_mode(mode);
            view.set_text("go [here](http://x.test) now").expect("parse");
            view.force_rebuild().expect("rebuild");
            let area = Rect::new(4, 2, 40, 5);
            let action = view.handle_mouse_event(area, MouseEvent::left_down(4 + 4, 2));
            let LinkAction::Activated(target) = action else {
                panic!("{mode:?}: expected activation, got {action:?}");
            };
            assert_eq!(target.url, "http://x.test");
            assert_eq!(
                view.handle_mouse_event(area, MouseEvent::left_down(4, 2)),
                LinkAction::None
            );
            assert_eq!(
                view.handle_mouse_event(area, MouseEvent::left_down(1, 1)),
                LinkAction::None
            );
        }
    }

    #[test]
    fn style_writes_keep_links_locatable() {
        for mode in [RenderMode::Live, RenderMode::Texture] {
            let (_clock, mut view) = tree();
            view.set_render_mode(mode);
            view.set_text("[link](http://x.test) and ![pic](p.png)").expect("parse");
            view.force_rebuild().expect("rebuild");
            let zones_before = view.hit_zones(40).len();
            let hit = |view: &MarkdownTree| view.locate(Point::new(1, 0)).map(|t| t.ref_id.clone());
            assert_eq!(hit(&view), Some("link-0".to_string()));

            view.set_color(Some(Color::Red));
            assert_eq!(hit(&view), Some("link-0".to_string()), "{mode:?}");
            view.set_halign(HAlign::Left);
            view.set_image_state("p.png", ImageState::Failed);
            assert_eq!(hit(&view), Some("link-0".to_string()), "{mode:?}");
            assert_eq!(view.hit_zones(40).len(), zones_before);
        }
    }

    #[test]
    fn render_mode_change_applies_on_rebuild() {
        let (_clock, mut view) = built("text");
        view.set_render_mode(RenderMode::Texture);
        assert!(view.is_rebuild_pending());
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 1));
        view.render_ref(buf.area, &mut buf);
        assert!(view.texture.is_none());
        view.force_rebuild().expect("rebuild");
        view.render_ref(buf.area, &mut buf);
        assert!(view.texture.is_some());
        assert_eq!(buf.cell((0, 0)).map(|c| c.symbol().to_string()), Some("t".into()));
    }
}
