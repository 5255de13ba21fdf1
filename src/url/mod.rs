//! URL handling module for Rivalscope
//!
//! This module provides URL normalization, fetch-key derivation and the
//! host comparisons used by link classification.

mod domain;
mod normalize;

pub use domain::{extract_domain, host_matches, origin_join, same_host};
pub use normalize::{fetch_key, key_for_normalized, normalize_url, parse_http_url};
