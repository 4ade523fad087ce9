//! Book metadata guessed from an output file name.

use std::sync::LazyLock;

use regex::Regex;

/// Title, author and publication year of a book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub pub_year: Option<u16>,
}

static AUTHOR_TITLE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) - (.+) \((\d{4})\)$").expect("valid pattern"));
static AUTHOR_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) - (.+)$").expect("valid pattern"));
static TITLE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) \((\d{4})\)$").expect("valid pattern"));

impl BookMetadata {
    /// Parse `Author - Title (YYYY)`, `Author - Title` or `Title (YYYY)`.
    /// Anything else becomes the title as a whole.
    pub fn from_filename(name: &str) -> Self {
        let name = name.trim();

        if let Some(c) = AUTHOR_TITLE_YEAR.captures(name) {
            return Self {
                author: c[1].trim().to_string(),
                title: c[2].trim().to_string(),
                pub_year: c[3].parse().ok(),
            };
        }
        if let Some(c) = AUTHOR_TITLE.captures(name) {
            return Self {
                author: c[1].trim().to_string(),
                title: c[2].trim().to_string(),
                pub_year: None,
            };
        }
        if let Some(c) = TITLE_YEAR.captures(name) {
            return Self {
                title: c[1].trim().to_string(),
                pub_year: c[2].parse().ok(),
                ..Self::default()
            };
        }

        Self {
            title: name.to_string(),
            ..Self::default()
        }
    }
}
