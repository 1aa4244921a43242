//! markmerge-report — Mail-merge, JSON and HTML output for markmerge.

pub mod html;
pub mod json;
pub mod mail_merge;
