//! Utility functions for GraphIndex Core
//!
//! This module provides helpers shared by the indexing pipeline:
//!
//! - [`sha256_hex`] - stable digests for document ids, dimension hashes and subgraph hashes
//! - [`extract_html_tags`] / [`strip_html`] - fulltext extraction from rich text properties

mod hashing;
mod html;

pub use hashing::sha256_hex;
pub use html::{extract_html_tags, strip_html};
