//! Slug normalisation for statically generated file names.
//!
//! Slugs come straight from a database property and are not guaranteed to be
//! URL-safe or unique. The static export runs them through `slug::slugify` and
//! suffixes a counter when two entries collapse onto the same file name.

use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Normalise a raw slug into lowercase ASCII words joined by hyphens.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug that does not collide according to the supplied predicate.
///
/// `is_unique` returns `true` when the candidate is free. Collisions are
/// retried with a monotonic suffix (`-2`, `-3`, …).
pub fn generate_unique_slug<F>(input: &str, mut is_unique: F) -> Result<String, SlugError>
where
    F: FnMut(&str) -> bool,
{
    let base = derive_slug(input)?;

    if is_unique(&base) {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate) {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted { base })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        assert_eq!(derive_slug("My First  Post!").expect("slug"), "my-first-post");
        assert_eq!(derive_slug("already-fine").expect("slug"), "already-fine");
    }

    #[test]
    fn derive_slug_rejects_blank_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn generate_unique_slug_appends_counter() {
        let mut existing = vec!["trip-notes".to_string()];
        let slug = generate_unique_slug("Trip Notes", |candidate| {
            if existing.contains(&candidate.to_string()) {
                false
            } else {
                existing.push(candidate.to_string());
                true
            }
        })
        .expect("unique slug");

        assert_eq!(slug, "trip-notes-2");
        assert!(existing.contains(&slug));
    }
}
