//! Per-format validation profiles.
//!
//! Each profile checks the canonical model against the required-field rules of
//! one target standard and reports the first violation it finds. Validation is
//! advisory: encoders do not run it, callers opt in before encoding.
//! [`validate_all`] checks several profiles at once and keeps every profile's
//! failure.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::{Author, Feed, Item};

/// PSP-1 maximum description size, in bytes.
pub const PSP_MAX_DESCRIPTION_BYTES: usize = 4000;

/// A target format whose rules can be validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Rss,
    Atom,
    Json,
    Psp,
}

impl Profile {
    pub const ALL: [Profile; 4] = [Profile::Rss, Profile::Atom, Profile::Json, Profile::Psp];
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Profile::Rss => "RSS 2.0",
            Profile::Atom => "Atom 1.0",
            Profile::Json => "JSON Feed 1.1",
            Profile::Psp => "PSP-1",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown feed format '{0}' (expected rss, atom, json or psp)")]
pub struct UnknownProfile(pub String);

impl FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rss" => Ok(Profile::Rss),
            "atom" => Ok(Profile::Atom),
            "json" | "jsonfeed" => Ok(Profile::Json),
            "psp" | "podcast" => Ok(Profile::Psp),
            _ => Err(UnknownProfile(s.to_owned())),
        }
    }
}

/// The rule a feed broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// A required field is empty.
    #[error("{0} is required")]
    Missing(&'static str),
    /// The feed has no items.
    #[error("at least one item is required")]
    NoItems,
    /// Neither a title nor a description.
    #[error("title or description is required")]
    NoTitleOrDescription,
    /// Enclosure lacks a url, a type or a positive length.
    #[error("enclosure requires url, type and a positive length")]
    IncompleteEnclosure,
    /// Author must be an email address.
    #[error("author must be an email address, got '{0}'")]
    AuthorNotEmail(String),
    /// No updated or created timestamp.
    #[error("an updated or created timestamp is required")]
    NoTimestamp,
    /// Feed has no author and at least one entry has none either.
    #[error("feed author is required unless every entry has an author")]
    AuthorRequired,
    #[error("{field} is {len} bytes (max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// One violated rule, tagged with its profile and, for item rules, the
/// zero-based position of the offending item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{profile}: {}{violation}", item_prefix(.item))]
pub struct ValidationError {
    pub profile: Profile,
    pub item: Option<usize>,
    pub violation: Violation,
}

fn item_prefix(item: &Option<usize>) -> String {
    item.map(|index| format!("item {index}: ")).unwrap_or_default()
}

/// Several profile failures reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Small helper keeping rule code terse.
struct Checker {
    profile: Profile,
}

impl Checker {
    fn feed(&self, violation: Violation) -> ValidationError {
        ValidationError {
            profile: self.profile,
            item: None,
            violation,
        }
    }

    fn item(&self, index: usize, violation: Violation) -> ValidationError {
        ValidationError {
            profile: self.profile,
            item: Some(index),
            violation,
        }
    }

    fn require(&self, value: &str, field: &'static str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(self.feed(Violation::Missing(field)));
        }
        Ok(())
    }

    fn require_items(&self, feed: &Feed) -> Result<(), ValidationError> {
        if feed.items.is_empty() {
            return Err(self.feed(Violation::NoItems));
        }
        Ok(())
    }
}

/// Loose `local@domain.tld` shape check, enough to tell an address from a name.
fn is_email_shaped(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

fn has_author(author: Option<&Author>) -> bool {
    author.is_some_and(|a| !a.name.trim().is_empty() || !a.email.trim().is_empty())
}

fn has_timestamp(item: &Item) -> bool {
    item.updated.is_some() || item.created.is_some()
}

/// RSS 2.0: channel title, link and description; at least one item; every
/// item has a title or description, a complete enclosure if any, and an
/// email-shaped author if any.
pub fn validate_rss(feed: &Feed) -> Result<(), ValidationError> {
    let check = Checker {
        profile: Profile::Rss,
    };
    check.require(&feed.title, "title")?;
    check.require(feed.link_href(), "link")?;
    check.require(&feed.description, "description")?;
    check.require_items(feed)?;

    for (index, item) in feed.items.iter().enumerate() {
        if item.title.trim().is_empty() && item.description.trim().is_empty() {
            return Err(check.item(index, Violation::NoTitleOrDescription));
        }
        if item.enclosure.as_ref().is_some_and(|e| !e.is_complete()) {
            return Err(check.item(index, Violation::IncompleteEnclosure));
        }
        if let Some(author) = &item.author {
            if !is_email_shaped(&author.email) {
                let shown = if author.email.is_empty() {
                    author.name.clone()
                } else {
                    author.email.clone()
                };
                return Err(check.item(index, Violation::AuthorNotEmail(shown)));
            }
        }
    }
    Ok(())
}

/// Atom 1.0: title, a resolvable updated timestamp and id, at least one
/// entry, entries with title and timestamp, and an author at feed level
/// unless every entry carries one.
pub fn validate_atom(feed: &Feed) -> Result<(), ValidationError> {
    let check = Checker {
        profile: Profile::Atom,
    };
    check.require(&feed.title, "title")?;
    if feed.updated.is_none() && feed.created.is_none() {
        return Err(check.feed(Violation::NoTimestamp));
    }
    if feed.id.trim().is_empty() && feed.link_href().trim().is_empty() {
        return Err(check.feed(Violation::Missing("id")));
    }
    check.require_items(feed)?;

    for (index, item) in feed.items.iter().enumerate() {
        if item.title.trim().is_empty() {
            return Err(check.item(index, Violation::Missing("title")));
        }
        if !has_timestamp(item) {
            return Err(check.item(index, Violation::NoTimestamp));
        }
    }
    check_atom_authors(feed)
}

/// The feed-level author rule on its own; the Atom encoder enforces it too.
pub(crate) fn check_atom_authors(feed: &Feed) -> Result<(), ValidationError> {
    if has_author(feed.author.as_ref()) {
        return Ok(());
    }
    if feed.items.iter().all(|item| has_author(item.author.as_ref())) {
        return Ok(());
    }
    Err(ValidationError {
        profile: Profile::Atom,
        item: None,
        violation: Violation::AuthorRequired,
    })
}

/// JSON Feed 1.1: title, and a non-empty id on every item.
pub fn validate_json(feed: &Feed) -> Result<(), ValidationError> {
    let check = Checker {
        profile: Profile::Json,
    };
    check.require(&feed.title, "title")?;
    for (index, item) in feed.items.iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(check.item(index, Violation::Missing("id")));
        }
    }
    Ok(())
}

/// PSP-1: channel title, description (≤ 4000 bytes), link and language, at
/// least one category, the self feed URL, and at least one item. Every item
/// needs a title, a complete enclosure and a guid; its description, if any,
/// is capped like the channel's.
pub fn validate_psp(feed: &Feed) -> Result<(), ValidationError> {
    let check = Checker {
        profile: Profile::Psp,
    };
    check.require(&feed.title, "title")?;
    check.require(&feed.description, "description")?;
    if feed.description.len() > PSP_MAX_DESCRIPTION_BYTES {
        return Err(check.feed(Violation::TooLong {
            field: "description",
            len: feed.description.len(),
            max: PSP_MAX_DESCRIPTION_BYTES,
        }));
    }
    check.require(feed.link_href(), "link")?;
    check.require(&feed.language, "language")?;
    if feed.primary_category().is_none() {
        return Err(check.feed(Violation::Missing("category")));
    }
    check.require(&feed.feed_url, "feed URL")?;
    check.require_items(feed)?;

    for (index, item) in feed.items.iter().enumerate() {
        if item.title.trim().is_empty() {
            return Err(check.item(index, Violation::Missing("title")));
        }
        if item.complete_enclosure().is_none() {
            return Err(check.item(index, Violation::IncompleteEnclosure));
        }
        if item.id.trim().is_empty() {
            return Err(check.item(index, Violation::Missing("guid")));
        }
        if item.description.len() > PSP_MAX_DESCRIPTION_BYTES {
            return Err(check.item(
                index,
                Violation::TooLong {
                    field: "description",
                    len: item.description.len(),
                    max: PSP_MAX_DESCRIPTION_BYTES,
                },
            ));
        }
    }
    Ok(())
}

/// Runs the validator for a single profile.
pub fn validate(feed: &Feed, profile: Profile) -> Result<(), ValidationError> {
    match profile {
        Profile::Rss => validate_rss(feed),
        Profile::Atom => validate_atom(feed),
        Profile::Json => validate_json(feed),
        Profile::Psp => validate_psp(feed),
    }
}

/// Validates against every listed profile, collecting each profile's first
/// violation instead of stopping at the first failing profile.
pub fn validate_all(feed: &Feed, profiles: &[Profile]) -> Result<(), ValidationErrors> {
    let errors: Vec<ValidationError> = profiles
        .iter()
        .filter_map(|&profile| validate(feed, profile).err())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
