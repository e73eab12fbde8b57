//! The rendering pipeline and its seams.

pub mod blocks;
pub mod error;
pub mod generate;
pub mod metadata;
pub mod posts;
pub mod render;
pub mod resolver;
pub mod source;
