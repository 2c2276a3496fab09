//! Seam for the external text generator that drafts descriptions.
//!
//! The garden never surfaces a generation failure: whatever goes wrong, the
//! form receives [`FALLBACK_DESCRIPTION`] instead.

use log::warn;

use crate::app_response::AppResponse;
pub use crate::garden_config::FALLBACK_DESCRIPTION;

pub trait DescriptionGenerator {
    fn generate(&self, title: &str) -> Result<String, AppResponse>;
}

impl<F> DescriptionGenerator for F
where
    F: Fn(&str) -> Result<String, AppResponse>,
{
    fn generate(&self, title: &str) -> Result<String, AppResponse> {
        self(title)
    }
}

/// Asks `generator` for a description of `title`.
///
/// Returns `None` without calling the generator when the title is blank.
pub fn describe<G: DescriptionGenerator + ?Sized>(generator: &G, title: &str) -> Option<String> {
    if title.trim().is_empty() {
        return None;
    }

    let text = match generator.generate(title) {
        Ok(raw) => clean(&raw),
        Err(e) => {
            warn!("Description generation failed for '{}': {}", title, e);
            return Some(FALLBACK_DESCRIPTION.to_string());
        }
    };

    if text.is_empty() {
        warn!("Description generation returned nothing for '{}'", title);
        return Some(FALLBACK_DESCRIPTION.to_string());
    }
    Some(text)
}

/// Trims whitespace, then one leading and one trailing double quote.
fn clean(raw: &str) -> String {
    let text = raw.trim();
    let text = text.strip_prefix('"').unwrap_or(text);
    let text = text.strip_suffix('"').unwrap_or(text);
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_successful_text_is_cleaned() {
        let generator = |_: &str| -> Result<String, AppResponse> { Ok("  \"A booking tool for small cafes.\"\n".to_string()) };
        assert_eq!(
            describe(&generator, "Cafe").as_deref(),
            Some("A booking tool for small cafes.")
        );
    }

    #[test]
    fn test_inner_quotes_survive() {
        let generator = |_: &str| -> Result<String, AppResponse> { Ok("The \"best\" cafe".to_string()) };
        assert_eq!(describe(&generator, "Cafe").as_deref(), Some("The \"best\" cafe"));
    }

    #[test]
    fn test_failure_yields_fallback() {
        let generator =
            |_: &str| -> Result<String, AppResponse> { Err(AppResponse::BadRequest("quota".into())) };
        assert_eq!(describe(&generator, "Cafe").as_deref(), Some(FALLBACK_DESCRIPTION));
    }

    #[test]
    fn test_empty_answer_yields_fallback() {
        let generator = |_: &str| -> Result<String, AppResponse> { Ok("  \"\" ".to_string()) };
        assert_eq!(describe(&generator, "Cafe").as_deref(), Some(FALLBACK_DESCRIPTION));
    }

    #[test]
    fn test_blank_title_skips_generator() {
        let calls = Cell::new(0);
        let generator = |_: &str| -> Result<String, AppResponse> {
            calls.set(calls.get() + 1);
            Ok("unused".to_string())
        };
        assert_eq!(describe(&generator, "   "), None);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_generator_receives_title() {
        let generator = |title: &str| -> Result<String, AppResponse> { Ok(format!("All about {title}")) };
        assert_eq!(describe(&generator, "Bees").as_deref(), Some("All about Bees"));
    }
}
