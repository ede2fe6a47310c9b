//! Text helpers for slugs, excerpts and name validation.

use quill_common::{AppError, AppResult};

/// Content longer than this gets a truncated excerpt.
pub const EXCERPT_LIMIT: usize = 300;

/// Column widths of the stored text fields, in characters.
pub mod limits {
    /// Post title.
    pub const POST_TITLE: usize = 200;
    /// Post slug, suffix included.
    pub const POST_SLUG: usize = 200;
    /// Category name.
    pub const CATEGORY_NAME: usize = 100;
    /// Category slug, suffix included.
    pub const CATEGORY_SLUG: usize = 100;
    /// Attachment title.
    pub const ATTACHMENT_TITLE: usize = 100;
    /// Attachment MIME type.
    pub const CONTENT_TYPE: usize = 255;
    /// Username, first name and last name.
    pub const USER_NAME: usize = 150;
    /// Email address.
    pub const EMAIL: usize = 254;
}

/// Turn a title or name into a URL slug.
///
/// Lowercases, keeps ASCII letters and digits, collapses runs of whitespace,
/// `-` and `_` into a single `-`, drops everything else and trims dashes.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }

    slug
}

/// Cut `slug` to at most `max` characters without leaving a trailing dash.
#[must_use]
pub fn truncate_slug(slug: &str, max: usize) -> String {
    let cut: String = slug.chars().take(max).collect();
    cut.trim_end_matches('-').to_string()
}

/// `base` with a numeric suffix, shortened so the result fits in `max`.
#[must_use]
pub fn suffixed_slug(base: &str, suffix: u32, max: usize) -> String {
    let tail = format!("-{suffix}");
    let head = truncate_slug(base, max.saturating_sub(tail.len()));
    format!("{head}{tail}")
}

/// Reject `value` when it has more than `max` characters.
pub fn check_length(label: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{label} must be at most {max} characters."
        )));
    }
    Ok(())
}

/// Excerpt for content saved without one.
#[must_use]
pub fn derive_excerpt(content: &str) -> String {
    if content.chars().count() > EXCERPT_LIMIT {
        let head: String = content.chars().take(EXCERPT_LIMIT - 3).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

/// Empty, whitespace-only, or without a single letter or digit.
#[must_use]
pub fn is_blank_or_symbols(value: &str) -> bool {
    !value.trim().chars().any(char::is_alphanumeric)
}

/// Non-empty and made only of digits.
#[must_use]
pub fn is_all_digits(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.chars().all(char::is_numeric)
}

/// `value` trimmed, or `None` when nothing is left.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
