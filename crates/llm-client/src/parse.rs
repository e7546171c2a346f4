//! Tolerant JSON extraction for model output.
//!
//! Models wrap JSON payloads in prose more often than not, so every consumer
//! of structured output goes through [`parse_with_fallback`]: slice out the
//! outermost JSON array or object, then deserialize. Fallback-triggering
//! stays here instead of being re-implemented at each call site.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Failure to get a usable payload out of model text.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no JSON payload found in model output")]
    NoPayload,
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Extracts the substring between the first `open` and the last `close`
/// delimiter, inclusive. Returns None when no complete pair exists.
fn extract_delimited(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Parses model output into `T`, tolerating surrounding prose.
///
/// Tries the raw text first; if that fails, retries on the outermost
/// `[..]` slice, then the outermost `{..}` slice. The caller decides what
/// the fallback behavior is when this returns an error.
pub fn parse_with_fallback<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let trimmed = raw.trim();
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            for (open, close) in [('[', ']'), ('{', '}')] {
                if let Some(slice) = extract_delimited(trimmed, open, close) {
                    if let Ok(value) = serde_json::from_str(slice) {
                        return Ok(value);
                    }
                }
            }
            // No delimiter pair at all means there was never a payload.
            if extract_delimited(trimmed, '[', ']').is_none()
                && extract_delimited(trimmed, '{', '}').is_none()
            {
                return Err(ParseError::NoPayload);
            }
            Err(ParseError::Malformed(first_err))
        }
    }
}
