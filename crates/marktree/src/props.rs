//! Settable properties and their rebuild classification.
//!
//! Every property is either [`PropClass::Style`] (patched in place on the existing widgets) or
//! [`PropClass::Structure`] (the widget tree below the root is discarded and rebuilt on the next
//! frame). [`PropKey::class`] is an exhaustive match, so a new property does not compile until it
//! is classified.

use crate::ast::Document;
use ratatui::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropClass {
    Style,
    Structure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropKey {
    Color,
    BaseFontSize,
    FontName,
    CodeFontName,
    FontContext,
    FontFeatures,
    FontHinting,
    FontKerning,
    LineHeight,
    TextPadding,
    Shorten,
    SplitStr,
    MaxLines,
    EllipsisOptions,
    Halign,
    Valign,
    BaseDirection,
    Padding,
    Text,
    Ast,
    TextSize,
    StrictLabelMode,
    RenderMode,
    LinkStyle,
    BaseUrl,
}

impl PropKey {
    pub const ALL: [PropKey; 25] = [
        PropKey::Color,
        PropKey::BaseFontSize,
        PropKey::FontName,
        PropKey::CodeFontName,
        PropKey::FontContext,
        PropKey::FontFeatures,
        PropKey::FontHinting,
        PropKey::FontKerning,
        PropKey::LineHeight,
        PropKey::TextPadding,
        PropKey::Shorten,
        PropKey::SplitStr,
        PropKey::MaxLines,
        PropKey::EllipsisOptions,
        PropKey::Halign,
        PropKey::Valign,
        PropKey::BaseDirection,
        PropKey::Padding,
        PropKey::Text,
        PropKey::Ast,
        PropKey::TextSize,
        PropKey::StrictLabelMode,
        PropKey::RenderMode,
        PropKey::LinkStyle,
        PropKey::BaseUrl,
    ];

    pub fn class(self) -> PropClass {
        match self {
            PropKey::Color
            | PropKey::BaseFontSize
            | PropKey::FontName
            | PropKey::CodeFontName
            | PropKey::FontContext
            | PropKey::FontFeatures
            | PropKey::FontHinting
            | PropKey::FontKerning
            | PropKey::LineHeight
            | PropKey::TextPadding
            | PropKey::Shorten
            | PropKey::SplitStr
            | PropKey::MaxLines
            | PropKey::EllipsisOptions
            | PropKey::Halign
            | PropKey::Valign
            | PropKey::BaseDirection
            | PropKey::Padding => PropClass::Style,
            PropKey::Text
            | PropKey::Ast
            | PropKey::TextSize
            | PropKey::StrictLabelMode
            | PropKey::RenderMode
            | PropKey::LinkStyle
            | PropKey::BaseUrl => PropClass::Structure,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PropKey::Color => "color",
            PropKey::BaseFontSize => "base_font_size",
            PropKey::FontName => "font_name",
            PropKey::CodeFontName => "code_font_name",
            PropKey::FontContext => "font_context",
            PropKey::FontFeatures => "font_features",
            PropKey::FontHinting => "font_hinting",
            PropKey::FontKerning => "font_kerning",
            PropKey::LineHeight => "line_height",
            PropKey::TextPadding => "text_padding",
            PropKey::Shorten => "shorten",
            PropKey::SplitStr => "split_str",
            PropKey::MaxLines => "max_lines",
            PropKey::EllipsisOptions => "ellipsis_options",
            PropKey::Halign => "halign",
            PropKey::Valign => "valign",
            PropKey::BaseDirection => "base_direction",
            PropKey::Padding => "padding",
            PropKey::Text => "text",
            PropKey::Ast => "ast",
            PropKey::TextSize => "text_size",
            PropKey::StrictLabelMode => "strict_label_mode",
            PropKey::RenderMode => "render_mode",
            PropKey::LinkStyle => "link_style",
            PropKey::BaseUrl => "base_url",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HAlign {
    /// Left for left-to-right text, right for right-to-left.
    #[default]
    Auto,
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BaseDirection {
    #[default]
    Auto,
    Ltr,
    Rtl,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// One widget per block; hit zones come from the live layout.
    #[default]
    Live,
    /// The tree is painted into one buffer; hit zones come from the aggregated map.
    Texture,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LinkStyle {
    Plain,
    #[default]
    Underline,
}

/// Cells of padding inside a label, on each side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextPadding {
    pub x: u16,
    pub y: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Padding {
    pub left: u16,
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
}

impl Padding {
    pub fn uniform(n: u16) -> Self {
        Self {
            left: n,
            top: n,
            right: n,
            bottom: n,
        }
    }

    pub fn left(n: u16) -> Self {
        Self {
            left: n,
            ..Self::default()
        }
    }
}

/// Explicit size constraint, in cells. `None` means natural size on that axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextSize {
    pub width: Option<u16>,
    pub height: Option<u16>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EllipsisOptions {
    pub marker: String,
}

impl Default for EllipsisOptions {
    fn default() -> Self {
        Self {
            marker: "…".to_string(),
        }
    }
}

/// A property write.
#[derive(Clone, Debug, PartialEq)]
pub enum Prop {
    Color(Option<Color>),
    BaseFontSize(f32),
    FontName(Option<String>),
    CodeFontName(String),
    FontContext(Option<String>),
    FontFeatures(Option<String>),
    FontHinting(Option<String>),
    FontKerning(bool),
    LineHeight(f32),
    TextPadding(TextPadding),
    Shorten(bool),
    SplitStr(String),
    MaxLines(Option<usize>),
    EllipsisOptions(EllipsisOptions),
    Halign(HAlign),
    Valign(VAlign),
    BaseDirection(BaseDirection),
    Padding(Padding),
    Text(String),
    Ast(Document),
    TextSize(TextSize),
    StrictLabelMode(bool),
    RenderMode(RenderMode),
    LinkStyle(LinkStyle),
    BaseUrl(Option<String>),
}

impl Prop {
    pub fn key(&self) -> PropKey {
        match self {
            Prop::Color(_) => PropKey::Color,
            Prop::BaseFontSize(_) => PropKey::BaseFontSize,
            Prop::FontName(_) => PropKey::FontName,
            Prop::CodeFontName(_) => PropKey::CodeFontName,
            Prop::FontContext(_) => PropKey::FontContext,
            Prop::FontFeatures(_) => PropKey::FontFeatures,
            Prop::FontHinting(_) => PropKey::FontHinting,
            Prop::FontKerning(_) => PropKey::FontKerning,
            Prop::LineHeight(_) => PropKey::LineHeight,
            Prop::TextPadding(_) => PropKey::TextPadding,
            Prop::Shorten(_) => PropKey::Shorten,
            Prop::SplitStr(_) => PropKey::SplitStr,
            Prop::MaxLines(_) => PropKey::MaxLines,
            Prop::EllipsisOptions(_) => PropKey::EllipsisOptions,
            Prop::Halign(_) => PropKey::Halign,
            Prop::Valign(_) => PropKey::Valign,
            Prop::BaseDirection(_) => PropKey::BaseDirection,
            Prop::Padding(_) => PropKey::Padding,
            Prop::Text(_) => PropKey::Text,
            Prop::Ast(_) => PropKey::Ast,
            Prop::TextSize(_) => PropKey::TextSize,
            Prop::StrictLabelMode(_) => PropKey::StrictLabelMode,
            Prop::RenderMode(_) => PropKey::RenderMode,
            Prop::LinkStyle(_) => PropKey::LinkStyle,
            Prop::BaseUrl(_) => PropKey::BaseUrl,
        }
    }

    pub fn class(&self) -> PropClass {
        self.key().class()
    }
}

/// Current values of every property except the document itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Props {
    pub color: Option<Color>,
    pub base_font_size: f32,
    pub font_name: Option<String>,
    pub code_font_name: String,
    pub font_context: Option<String>,
    pub font_features: Option<String>,
    pub font_hinting: Option<String>,
    pub font_kerning: bool,
    pub line_height: f32,
    pub text_padding: TextPadding,
    pub shorten: bool,
    pub split_str: String,
    pub max_lines: Option<usize>,
    pub ellipsis_options: EllipsisOptions,
    pub halign: HAlign,
    pub valign: VAlign,
    pub base_direction: BaseDirection,
    pub padding: Padding,
    pub text_size: TextSize,
    pub strict_label_mode: bool,
    pub render_mode: RenderMode,
    pub link_style: LinkStyle,
    pub base_url: Option<String>,
}

impl Default for Props {
    fn default() -> Self {
        Self {
            color: None,
            base_font_size: 15.0,
            font_name: None,
            code_font_name: "monospace".to_string(),
            font_context: None,
            font_features: None,
            font_hinting: None,
            font_kerning: true,
            line_height: 1.0,
            text_padding: TextPadding::default(),
            shorten: false,
            split_str: String::new(),
            max_lines: None,
            ellipsis_options: EllipsisOptions::default(),
            halign: HAlign::Auto,
            valign: VAlign::Top,
            base_direction: BaseDirection::Auto,
            padding: Padding::default(),
            text_size: TextSize::default(),
            strict_label_mode: false,
            render_mode: RenderMode::Live,
            link_style: LinkStyle::Underline,
            base_url: None,
        }
    }
}

impl Props {
    /// Stores `prop`. Returns `false` if the value did not change. Document writes
    /// ([`Prop::Text`], [`Prop::Ast`]) are not stored here and always report a change.
    pub fn apply(&mut self, prop: &Prop) -> bool {
        fn store<T: PartialEq + Clone>(slot: &mut T, value: &T) -> bool {
            if slot == value {
                return false;
            }
            *slot = value.clone();
            true
        }

        match prop {
            Prop::Color(v) => store(&mut self.color, v),
            Prop::BaseFontSize(v) => store(&mut self.base_font_size, v),
            Prop::FontName(v) => store(&mut self.font_name, v),
            Prop::CodeFontName(v) => store(&mut self.code_font_name, v),
            Prop::FontContext(v) => store(&mut self.font_context, v),
            Prop::FontFeatures(v) => store(&mut self.font_features, v),
            Prop::FontHinting(v) => store(&mut self.font_hinting, v),
            Prop::FontKerning(v) => store(&mut self.font_kerning, v),
            Prop::LineHeight(v) => store(&mut self.line_height, v),
            Prop::TextPadding(v) => store(&mut self.text_padding, v),
            Prop::Shorten(v) => store(&mut self.shorten, v),
            Prop::SplitStr(v) => store(&mut self.split_str, v),
            Prop::MaxLines(v) => store(&mut self.max_lines, v),
            Prop::EllipsisOptions(v) => store(&mut self.ellipsis_options, v),
            Prop::Halign(v) => store(&mut self.halign, v),
            Prop::Valign(v) => store(&mut self.valign, v),
            Prop::BaseDirection(v) => store(&mut self.base_direction, v),
            Prop::Padding(v) => store(&mut self.padding, v),
            Prop::TextSize(v) => store(&mut self.text_size, v),
            Prop::StrictLabelMode(v) => store(&mut self.strict_label_mode, v),
            Prop::RenderMode(v) => store(&mut self.render_mode, v),
            Prop::LinkStyle(v) => store(&mut self.link_style, v),
            Prop::BaseUrl(v) => store(&mut self.base_url, v),
            Prop::Text(_) | Prop::Ast(_) => true,
        }
    }

    /// Whether content is wrapped in a clip container sized to the height constraint.
    pub fn clips_height(&self) -> Option<u16> {
        self.text_size.height.filter(|_| self.strict_label_mode)
    }
}
