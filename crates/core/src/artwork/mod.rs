//! Normalized artwork model shared by every source.
//!
//! Adapters never build an [`Artwork`] directly: they go through
//! [`ArtworkBuilder`], whose `build` refuses records without a usable image.

mod text;
mod types;

pub use text::{non_blank, present, strip_html, truncate_chars};
pub use types::*;
