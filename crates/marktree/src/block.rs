//! Block rendering: document → detached widget specs.
//!
//! Dispatch is an exhaustive match over [`Block`]. Every label receives the text style forwarded
//! from [`Props`]; code labels are the one exception for `font_name`, which is replaced by the
//! code font.

use crate::ast::Alignment;
use crate::ast::Block;
use crate::ast::Document;
use crate::ast::Inline;
use crate::ast::List;
use crate::ast::NodePath;
use crate::ast::Table;
use crate::markup::InlineContext;
use crate::markup::RefMap;
use crate::markup::render_inline_into;
use crate::markup::resolve_url;
use crate::options::MarkdownTreeOptions;
use crate::props::Padding;
use crate::props::PropKey;
use crate::props::Props;
use crate::widget::CodeMeta;
use crate::widget::ContainerAttrs;
use crate::widget::ContainerLayout;
use crate::widget::Decoration;
use crate::widget::ImageAttrs;
use crate::widget::ImageState;
use crate::widget::LabelAttrs;
use crate::widget::LabelRole;
use crate::widget::TextStyle;
use crate::widget::WidgetKind;
use crate::widget::WidgetSpec;
use crate::widget::WidgetTree;
use marktree_core::wrapping::normalize_tabs;

#[derive(Clone, Copy, Debug)]
pub struct BlockContext<'a> {
    pub props: &'a Props,
    pub options: &'a MarkdownTreeOptions,
}

/// Output of one render pass.
#[derive(Clone, Debug, Default)]
pub struct Rendered {
    /// Children for the root, in document order.
    pub blocks: Vec<WidgetSpec>,
    pub refs: RefMap,
    /// Subtrees replaced by the truncation placeholder.
    pub truncated: usize,
    /// Tags of unsupported blocks, in document order.
    pub unsupported: Vec<String>,
}

/// Attributes of the root container.
pub fn root_attrs(props: &Props) -> ContainerAttrs {
    ContainerAttrs {
        padding: props.padding,
        ..ContainerAttrs::column(1)
    }
}

/// Most widget levels one nesting level (a list or block quote) can add: list, row, body.
const WIDGETS_PER_LEVEL: usize = 3;

/// Depth bound for traversals of trees rendered with `options`.
pub fn widget_depth_limit(options: &MarkdownTreeOptions) -> usize {
    // root, clip, then a table needs grid + row + cell below a block
    (options.max_depth + 1) * WIDGETS_PER_LEVEL + 4
}

pub fn render(document: &Document, ctx: &BlockContext<'_>) -> Rendered {
    let mut r = Renderer {
        ctx: *ctx,
        out: Rendered::default(),
    };
    let mut blocks = r.blocks(&document.blocks, &NodePath::root(), 0);
    if let Some(height) = ctx.props.clips_height() {
        let clip = ContainerAttrs::with_layout(ContainerLayout::Clip { height });
        blocks = vec![WidgetSpec::container(clip, NodePath::root(), blocks)];
    }
    r.out.blocks = blocks;
    r.out
}

struct Renderer<'a> {
    ctx: BlockContext<'a>,
    out: Rendered,
}

impl Renderer<'_> {
    fn blocks(&mut self, blocks: &[Block], parent: &NodePath, depth: usize) -> Vec<WidgetSpec> {
        blocks
            .iter()
            .enumerate()
            .map(|(i, block)| self.block(block, parent.child(i), depth))
            .collect()
    }

    fn block(&mut self, block: &Block, path: NodePath, depth: usize) -> WidgetSpec {
        match block {
            Block::Heading { level, inlines } => {
                let scale = self.ctx.options.heading_scale(*level);
                self.markup_label(inlines, path, LabelRole::Heading(*level), scale)
            }
            Block::Paragraph(inlines) => self.markup_label(inlines, path, LabelRole::Body, 1.0),
            Block::List(list) => self.list(list, path, depth),
            Block::CodeBlock { language, content } => self.code(language, content, path),
            Block::BlockQuote(children) => {
                if depth >= self.ctx.options.max_depth {
                    return self.truncated(path);
                }
                let attrs = ContainerAttrs {
                    padding: Padding::left(self.ctx.options.blockquote_padding),
                    decoration: Decoration::LeftBorder,
                    ..ContainerAttrs::column(1)
                };
                let children = self.blocks(children, &path, depth + 1);
                WidgetSpec::container(attrs, path, children)
            }
            Block::ThematicBreak => WidgetSpec::leaf(WidgetKind::Rule { height: 1 }, path),
            Block::Image { src, alt } => {
                let image = ImageAttrs {
                    src: resolve_url(self.ctx.props.base_url.as_deref(), src),
                    alt: alt.clone(),
                    state: ImageState::Loading,
                    rows: self.ctx.options.image_rows,
                };
                WidgetSpec::leaf(WidgetKind::Image(image), path)
            }
            Block::Table(table) => self.table(table, path),
            Block::Unsupported { tag, .. } => {
                self.out.unsupported.push(tag.clone());
                self.label(format!("[{tag}]"), false, LabelRole::Placeholder, path)
            }
        }
    }

    fn markup_label(
        &mut self,
        inlines: &[Inline],
        path: NodePath,
        role: LabelRole,
        scale: f32,
    ) -> WidgetSpec {
        let ctx = inline_context(&self.ctx);
        let markup = render_inline_into(inlines, &ctx, &mut self.out.refs);
        let mut spec = self.label(markup, true, role, path);
        if let WidgetKind::Label(label) = &mut spec.kind {
            label.scale = scale;
            label.style.font_size = self.ctx.props.base_font_size * scale;
        }
        spec
    }

    fn label(&self, text: String, markup: bool, role: LabelRole, path: NodePath) -> WidgetSpec {
        let label = LabelAttrs {
            text,
            markup,
            role,
            scale: 1.0,
            alignment: Alignment::None,
            code: None,
            style: TextStyle::from_props(self.ctx.props, 1.0),
        };
        WidgetSpec::leaf(WidgetKind::Label(label), path)
    }

    fn code(&self, language: &Option<String>, content: &str, path: NodePath) -> WidgetSpec {
        let content = content.strip_suffix('\n').unwrap_or(content);
        let mut spec = self.label(normalize_tabs(content), false, LabelRole::Code, path);
        if let WidgetKind::Label(label) = &mut spec.kind {
            label.style.font_name = Some(self.ctx.props.code_font_name.clone());
            label.code = Some(CodeMeta {
                language: language.clone(),
                background: self.ctx.options.code_background(),
            });
        }
        spec
    }

    fn list(&mut self, list: &List, path: NodePath, depth: usize) -> WidgetSpec {
        if depth >= self.ctx.options.max_depth {
            return self.truncated(path);
        }
        let attrs = ContainerAttrs {
            padding: Padding::left(self.indent_step(depth)),
            ..ContainerAttrs::column(0)
        };

        let mut rows = Vec::with_capacity(list.items.len());
        for (i, item) in list.items.iter().enumerate() {
            let item_path = path.child(i);
            let marker = if list.ordered {
                format!("{}. ", list.start.saturating_add(i as u64))
            } else {
                format!("{} ", self.ctx.options.bullet)
            };
            let marker = self.label(marker, false, LabelRole::Marker, item_path.clone());
            let body = self.blocks(&item.children, &item_path, depth + 1);
            let body = WidgetSpec::container(ContainerAttrs::column(0), item_path.clone(), body);
            rows.push(WidgetSpec::container(
                ContainerAttrs::with_layout(ContainerLayout::Row),
                item_path,
                vec![marker, body],
            ));
        }
        WidgetSpec::container(attrs, path, rows)
    }

    /// Extra indentation a list at `depth` adds on top of its ancestors, so the accumulated
    /// indentation is `min(depth * list_indent, max_list_indent)`.
    fn indent_step(&self, depth: usize) -> u16 {
        let total = |d: usize| {
            let d = u16::try_from(d).unwrap_or(u16::MAX);
            d.saturating_mul(self.ctx.options.list_indent)
                .min(self.ctx.options.max_list_indent)
        };
        if depth == 0 {
            return 0;
        }
        total(depth) - total(depth - 1)
    }

    fn table(&mut self, table: &Table, path: NodePath) -> WidgetSpec {
        let columns = table
            .rows
            .iter()
            .map(|r| r.cells.len())
            .chain(std::iter::once(table.alignments.len()))
            .max()
            .unwrap_or(0)
            .max(1);

        let mut rows = Vec::with_capacity(table.rows.len());
        for (r, row) in table.rows.iter().enumerate() {
            let row_path = path.child(r);
            let role = if r == 0 {
                LabelRole::TableHeader
            } else {
                LabelRole::Body
            };
            let cells = row
                .cells
                .iter()
                .enumerate()
                .map(|(c, cell)| {
                    let mut spec = self.markup_label(&cell.inlines, row_path.child(c), role, 1.0);
                    if let WidgetKind::Label(label) = &mut spec.kind {
                        label.alignment = cell.alignment;
                    }
                    spec
                })
                .collect();
            rows.push(WidgetSpec::container(
                ContainerAttrs::with_layout(ContainerLayout::GridRow { columns }),
                row_path,
                cells,
            ));
        }
        WidgetSpec::container(
            ContainerAttrs::with_layout(ContainerLayout::Grid { columns }),
            path,
            rows,
        )
    }

    fn truncated(&mut self, path: NodePath) -> WidgetSpec {
        log::debug!(
            "nesting deeper than {} at {:?}; truncating",
            self.ctx.options.max_depth,
            path.indices()
        );
        self.out.truncated += 1;
        let marker = self.ctx.options.truncation_marker.clone();
        self.label(marker, false, LabelRole::Placeholder, path)
    }
}

fn inline_context<'a>(ctx: &BlockContext<'a>) -> InlineContext<'a> {
    InlineContext {
        code_font: &ctx.props.code_font_name,
        link_style: ctx.props.link_style,
        base_url: ctx.props.base_url.as_deref(),
    }
}

/// Re-applies the style property `key` from `props` to every widget it reaches, in place.
/// Returns the number of widgets changed.
pub fn restyle(tree: &mut WidgetTree, props: &Props, key: PropKey) -> usize {
    if key == PropKey::Padding {
        let root = tree.root();
        return match tree.get_mut(root).map(|n| &mut n.kind) {
            Some(WidgetKind::Container(attrs)) if attrs.padding != props.padding => {
                attrs.padding = props.padding;
                1
            }
            _ => 0,
        };
    }

    let mut touched = 0;
    for slot in tree.label_slots() {
        if let Some(WidgetKind::Label(label)) = tree.get_mut(slot).map(|n| &mut n.kind)
            && patch_label(label, props, key)
        {
            touched += 1;
        }
    }
    touched
}

fn patch_label(label: &mut LabelAttrs, props: &Props, key: PropKey) -> bool {
    let code = label.is_code();
    let s = &mut label.style;
    match key {
        PropKey::Color => s.color = props.color,
        PropKey::BaseFontSize => s.font_size = props.base_font_size * label.scale,
        PropKey::FontName if code => return false,
        PropKey::FontName => s.font_name = props.font_name.clone(),
        PropKey::CodeFontName if code => s.font_name = Some(props.code_font_name.clone()),
        PropKey::CodeFontName if label.markup && label.text.contains("[font=") => {
            label.text = retarget_font_tags(&label.text, &props.code_font_name);
        }
        PropKey::CodeFontName => return false,
        PropKey::FontContext => s.font_context = props.font_context.clone(),
        PropKey::FontFeatures => s.font_features = props.font_features.clone(),
        PropKey::FontHinting => s.font_hinting = props.font_hinting.clone(),
        PropKey::FontKerning => s.font_kerning = props.font_kerning,
        PropKey::LineHeight => s.line_height = props.line_height,
        PropKey::TextPadding => s.padding = props.text_padding,
        PropKey::Shorten => s.shorten = props.shorten,
        PropKey::SplitStr => s.split_str = props.split_str.clone(),
        PropKey::MaxLines => s.max_lines = props.max_lines,
        PropKey::EllipsisOptions => s.ellipsis = props.ellipsis_options.clone(),
        PropKey::Halign => s.halign = props.halign,
        PropKey::Valign => s.valign = props.valign,
        PropKey::BaseDirection => s.base_direction = props.base_direction,
        PropKey::Padding
        | PropKey::Text
        | PropKey::Ast
        | PropKey::TextSize
        | PropKey::StrictLabelMode
        | PropKey::RenderMode
        | PropKey::LinkStyle
        | PropKey::BaseUrl => return false,
    }
    true
}

/// Rewrites the name in every `[font=…]` tag of `markup`.
fn retarget_font_tags(markup: &str, font: &str) -> String {
    let font = crate::markup::escape(font);
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(pos) = rest.find("[font=") {
        out.push_str(&rest[..pos + "[font=".len()]);
        rest = &rest[pos + "[font=".len()..];
        let end = rest.find(']').unwrap_or(rest.len());
        out.push_str(&font);
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use pretty_assertions::assert_eq;

    fn render_str(md: &str, props: &Props, options: &MarkdownTreeOptions) -> Rendered {
        let doc = parse(md).expect("parse");
        render(&doc, &BlockContext { props, options })
    }

    fn labels(spec: &WidgetSpec, out: &mut Vec<LabelAttrs>) {
        if let WidgetKind::Label(l) = &spec.kind {
            out.push(l.clone());
        }
        for child in &spec.children {
            labels(child, out);
        }
    }

    fn all_labels(r: &Rendered) -> Vec<LabelAttrs> {
        let mut out = Vec::new();
        for spec in &r.blocks {
            labels(spec, &mut out);
        }
        out
    }

    #[test]
    fn heading_scale_follows_level() {
        let props = Props::default();
        let options = MarkdownTreeOptions::default();
        let r = render_str("# A\n\n### C\n", &props, &options);
        let ls = all_labels(&r);
        assert_eq!(ls[0].role, LabelRole::Heading(1));
        assert_eq!(ls[0].style.font_size, props.base_font_size * 2.0);
        assert_eq!(ls[1].scale, options.heading_scale(3));
    }

    #[test]
    fn code_labels_get_the_code_font_and_keep_other_forwarding() {
        let props = Props {
            font_name: Some("Serif".into()),
            line_height: 2.0,
            ..Props::default()
        };
        let r = render_str(
            "text\n\n```rs\nlet x = 1;\n```\n",
            &props,
            &MarkdownTreeOptions::default(),
        );
        let ls = all_labels(&r);
        assert_eq!(ls[0].style.font_name.as_deref(), Some("Serif"));
        assert_eq!(ls[1].text, "let x = 1;");
        assert!(!ls[1].markup);
        assert_eq!(ls[1].style.font_name.as_deref(), Some("monospace"));
        assert_eq!(ls[1].style.line_height, 2.0);
        assert_eq!(
            ls[1].code.as_ref().and_then(|c| c.language.as_deref()),
            Some("rs")
        );
    }

    #[test]
    fn lists_render_markers_and_grow_indent() {
        let options = MarkdownTreeOptions {
            list_indent: 3,
            max_list_indent: 4,
            ..MarkdownTreeOptions::default()
        };
        let r = render_str(
            "2. a\n3. b\n   - c\n     - d\n",
            &Props::default(),
            &options,
        );
        let markers: Vec<_> = all_labels(&r)
            .into_iter()
            .filter(|l| l.role == LabelRole::Marker)
            .map(|l| l.text)
            .collect();
        assert_eq!(markers, vec!["2. ", "3. ", "• ", "• "]);

        let outer = &r.blocks[0];
        let pad = |s: &WidgetSpec| match &s.kind {
            WidgetKind::Container(c) => c.padding.left,
            _ => u16::MAX,
        };
        assert_eq!(pad(outer), 0);
        let second_body = &outer.children[1].children[1];
        let nested = &second_body.children[1];
        assert_eq!(pad(nested), 3);
        let deeper = &nested.children[0].children[1].children[1];
        assert_eq!(pad(deeper), 1);
    }

    #[test]
    fn nesting_past_the_cap_is_truncated() {
        let options = MarkdownTreeOptions {
            max_depth: 2,
            ..MarkdownTreeOptions::default()
        };
        let r = render_str("> > > deep\n", &Props::default(), &options);
        assert_eq!(r.truncated, 1);
        let ls = all_labels(&r);
        assert_eq!(ls.len(), 1);
        assert_eq!(ls[0].role, LabelRole::Placeholder);
        assert_eq!(ls[0].text, options.truncation_marker);
    }

    #[test]
    fn table_cells_carry_alignment_and_header_role() {
        let r = render_str(
            "| a | b |\n|---|--:|\n| 1 | 2 |\n",
            &Props::default(),
            &MarkdownTreeOptions::default(),
        );
        let ls = all_labels(&r);
        assert_eq!(ls.len(), 4);
        assert_eq!(ls[0].role, LabelRole::TableHeader);
        assert_eq!(ls[3].alignment, Alignment::Right);
        assert_eq!(ls[2].alignment, Alignment::None);
        assert!(matches!(
            r.blocks[0].kind,
            WidgetKind::Container(ContainerAttrs {
                layout: ContainerLayout::Grid { columns: 2 },
                ..
            })
        ));
    }

    #[test]
    fn unsupported_blocks_render_placeholders() {
        let r = render_str(
            "<div>x</div>\n\nafter\n",
            &Props::default(),
            &MarkdownTreeOptions::default(),
        );
        assert_eq!(r.unsupported, vec!["html".to_string()]);
        let ls = all_labels(&r);
        assert_eq!(ls[0].text, "[html]");
        assert_eq!(ls[1].text, "after");
    }

    #[test]
    fn images_bind_resolved_src() {
        let props = Props {
            base_url: Some("https://example.com/docs/".into()),
            ..Props::default()
        };
        let r = render_str("![logo](img/logo.png)\n", &props, &MarkdownTreeOptions::default());
        let WidgetKind::Image(image) = &r.blocks[0].kind else {
            panic!("expected image");
        };
        assert_eq!(image.src, "https://example.com/docs/img/logo.png");
        assert_eq!(image.alt, "logo");
        assert_eq!(image.state, ImageState::Loading);
    }

    #[test]
    fn height_constraint_with_strict_mode_adds_a_clip() {
        let mut props = Props::default();
        props.text_size.height = Some(3);
        let options = MarkdownTreeOptions::default();
        assert_eq!(render_str("a\n\nb\n", &props, &options).blocks.len(), 2);

        props.strict_label_mode = true;
        let r = render_str("a\n\nb\n", &props, &options);
        assert_eq!(r.blocks.len(), 1);
        assert!(matches!(
            r.blocks[0].kind,
            WidgetKind::Container(ContainerAttrs {
                layout: ContainerLayout::Clip { height: 3 },
                ..
            })
        ));
        assert_eq!(r.blocks[0].children.len(), 2);
    }

    #[test]
    fn restyle_withholds_font_name_from_code() {
        let options = MarkdownTreeOptions::default();
        let mut props = Props::default();
        let r = render_str("p `c`\n\n```\ncode\n```\n", &props, &options);
        let mut tree = WidgetTree::new(root_attrs(&props), widget_depth_limit(&options));
        for spec in r.blocks {
            tree.graft(tree.root(), spec);
        }

        props.font_name = Some("Serif".into());
        assert_eq!(restyle(&mut tree, &props, PropKey::FontName), 1);

        props.code_font_name = "Fira".into();
        assert_eq!(restyle(&mut tree, &props, PropKey::CodeFontName), 2);
        let ls: Vec<_> = tree.labels().map(|(_, l)| l.clone()).collect();
        assert_eq!(ls[0].text, "p [font=Fira]c[/font]");
        assert_eq!(ls[0].style.font_name.as_deref(), Some("Serif"));
        assert_eq!(ls[1].style.font_name.as_deref(), Some("Fira"));
    }
}
