//! URL slugs derived from store names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Derive a slug from a human-readable name.
///
/// The name is lowercased, every maximal run of characters outside `[a-z0-9]`
/// becomes a single hyphen, and leading/trailing hyphens are removed. Non-ASCII
/// letters count as separators.
///
/// A name made only of separators yields an empty slug. No fallback is applied.
///
/// ```
/// use wozify_core::slugify;
///
/// assert_eq!(slugify("My Store!"), "my-store");
/// assert_eq!(slugify("Acme -- Widgets & Co."), "acme-widgets-co");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// A slug computed from a store name at creation time.
///
/// Slugs are never edited afterwards; the only constructor is
/// [`Slug::from_name`]. Values read back from the backend are trusted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Compute the slug for a name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(slugify(name))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the name contained no `[a-z0-9]` characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
