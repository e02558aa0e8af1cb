//! Case-study rendering pipeline: fenced `:::type` data blocks interleaved
//! with Markdown prose, rendered in source order with stable heading anchors
//! and a canonical table of contents.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
