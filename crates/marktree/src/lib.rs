//! Live Markdown widget trees for `ratatui`.
//!
//! Markdown text (or a [`ast::Document`] built by hand) is rendered into a tree of container,
//! label, image and rule widgets that stays alive between frames. Every widget has a stable
//! [`widget::WidgetId`]; what happens to those ids on a property write depends on the write:
//!
//! - Style writes (color, font size, alignment, ...) patch the existing widgets in place.
//! - Structure writes (the text, height constraints, render mode, link handling) rebuild every
//!   widget below the root, coalesced to at most one rebuild per host frame.
//!
//! Links inside labels become hit zones in root-local cells, so a pointer press can be mapped to
//! the URL under it whether the tree paints live or from a pre-rendered texture.
//!
//! ## Layers
//!
//! - [`MarkdownTree`]: the component a host embeds.
//! - [`parse`], [`block`], [`markup`], [`serialize`]: the pure pipeline from text to widget specs
//!   and back.
//! - [`widget`], [`layout`], [`paint`], [`hit`]: the headless widget arena and what is computed
//!   from it.
pub mod ast;
pub mod block;
pub mod error;
pub mod hit;
pub mod layout;
pub mod markup;
pub mod options;
pub mod paint;
pub mod parse;
pub mod props;
pub mod scheduler;
pub mod serialize;
pub mod view;
pub mod widget;

pub use error::Error;
pub use options::MarkdownTreeOptions;
pub use view::LinkAction;
pub use view::MarkdownTree;
