//! Encode one canonical feed model as RSS 2.0, Atom 1.0, JSON Feed 1.1 and
//! PSP-1 podcast RSS.
//!
//! # Architecture
//!
//! - [`model`] - the format-agnostic [`Feed`]/[`Item`] types and generic
//!   [`ExtensionNode`]s for anything a format needs beyond them
//! - [`validate`] - one advisory validator per target format
//! - [`encode`] - the four encoders behind the [`Encoder`] trait
//! - [`ident`] - fallback entry ids and podcast GUIDs
//! - [`util`] - CDATA, XML character and URL helpers
//! - [`config`] - the command-line tool's config file
//!
//! # Example
//!
//! ```
//! use feedsmith::{validate, Encoder, Feed, Item, Profile, Rss};
//!
//! let mut feed = Feed::new("My Blog", "https://example.com", "Posts");
//! let mut item = Item::new("Hello World");
//! item.description = "<p>Welcome!</p>".to_string();
//! feed.items.push(item);
//!
//! validate::validate(&feed, Profile::Rss).unwrap();
//! let xml = Rss.encode_to_string(&feed).unwrap();
//! assert!(xml.contains("<description><![CDATA[<p>Welcome!</p>]]></description>"));
//! ```

pub mod config;
pub mod encode;
pub mod ident;
pub mod model;
pub mod util;
pub mod validate;

pub use encode::{Atom, EncodeError, Encoder, JsonFeed, Psp, Rss};
pub use model::{Author, Category, Enclosure, ExtensionNode, Feed, Image, Item, Link};
pub use validate::{Profile, ValidationError, ValidationErrors};
