// src/components/mod.rs
pub mod annotation_viewer;
