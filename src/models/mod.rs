pub mod slide;

pub use slide::{ImageReference, SlideIndex};
