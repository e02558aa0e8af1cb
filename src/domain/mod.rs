//! Domain layer types and invariants.

pub mod blocks;
pub mod sections;
pub mod slug;
pub mod toc;
