//! `marktree-core` provides the toolkit-level pieces the Markdown engine is built on.
//!
//! Nothing in this crate knows about Markdown. It covers:
//!
//! - [`geometry`]: signed cell coordinates, offsets and rectangles that may sit partially
//!   off-screen.
//! - [`clock`]: the host frame clock ([`clock::FrameClock`]) and the single-shot
//!   [`clock::DeferredTrigger`] components arm against it.
//! - [`input`]: toolkit-agnostic pointer events (with an optional crossterm adapter).
//! - [`wrapping`]: word wrapping that reports byte ranges, so styled runs survive wrapping.
//! - [`render`]: span painting and buffer blits for `ratatui::buffer::Buffer`.
//! - [`theme`]: base styles.
//!
//! Components never own an event loop: the host drives input, ticks and painting.
pub mod clock;

#[cfg(feature = "crossterm")]
pub mod crossterm_input;

pub mod geometry;
pub mod input;
pub mod render;
pub mod theme;
pub mod wrapping;
