//! Domain layer types and invariants.

pub mod blocks;
pub mod entries;
pub mod markup;
pub mod slug;
