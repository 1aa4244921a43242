//! markmerge-core — Parsing, correlation and grading for OMR mail merges.
//!
//! This crate joins an enrollment roster, a gradebook export and an OMR scan
//! export into one record per student, grades each record against its
//! versioned answer key, and summarizes the results. Rendering lives in
//! `markmerge-report`.

pub mod answer_key;
pub mod config;
pub mod correlate;
pub mod delimited;
pub mod error;
pub mod grading;
pub mod model;
pub mod pipeline;
pub mod statistics;
