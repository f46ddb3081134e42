//! Slide content: the typed block vocabulary and its markup rendering.

mod block;
pub mod markup;

pub use block::*;
pub use markup::{blocks_from_markup, serialize};
