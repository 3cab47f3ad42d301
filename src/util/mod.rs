//! Utility functions shared by the encoders.
//!
//! This module provides reusable utilities for:
//!
//! - **CDATA handling**: idempotent wrap/unwrap and the wrap-or-escape decision
//! - **XML text hygiene**: removal of characters XML 1.0 forbids, name checks
//! - **URL handling**: host/path extraction for tag URIs, feed URL normalization
//!
//! # Examples
//!
//! ```
//! use feedsmith::util::{normalize_feed_url, wrap_cdata, unwrap_cdata};
//!
//! let wrapped = wrap_cdata("<p>Hi</p>");
//! assert_eq!(unwrap_cdata(&wrapped), "<p>Hi</p>");
//!
//! assert_eq!(normalize_feed_url("feed://example.com/rss/"), "example.com/rss");
//! ```

mod cdata;
mod urls;
mod xml_chars;

pub use cdata::{needs_escaping, should_wrap, unwrap_cdata, wrap_cdata, CDATA_CLOSE, CDATA_OPEN};
pub use urls::{host_and_path, normalize_feed_url};
pub use xml_chars::{is_xml_name, strip_invalid_xml_chars};
