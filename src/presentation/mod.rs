//! HTML presentation of rendered documents.

pub mod views;
