//! URL handling module for Sumi-Gleaner
//!
//! This module provides URL normalization (the visited-set key), scope-domain
//! extraction, and the per-URL file key and extension rules used for output files.

mod domain;
mod key;
mod normalize;

pub use domain::{in_scope, scope_domain};
pub use key::{infer_extension, is_document_url, url_key, DOCUMENT_EXTENSIONS};
pub use normalize::normalize;
