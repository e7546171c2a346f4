//! Tests for [`openai_client::mask_token`], which keeps API keys out of logs.

use openai_client::mask_token;

/// **Test: Tokens too short to mask partially are fully hidden.**
///
/// **Expected:** Any token of length ≤ 11 comes back as `"***"`.
#[test]
fn short_tokens_are_fully_masked() {
    for token in ["", "x", "sk-abc", "sk-proj-123"] {
        assert_eq!(mask_token(token), "***", "token {token:?}");
    }
}

/// **Test: Long tokens keep only the first 7 and last 4 characters.**
#[test]
fn long_tokens_keep_head_and_tail() {
    assert_eq!(mask_token("sk-proj-abcdefghijklmnop"), "sk-proj***mnop");
    assert_eq!(mask_token("sk-proj-xyzw"), "sk-proj***xyzw");
}

/// **Test: A realistic key masks to a fixed-length string.**
#[test]
fn masked_key_has_fixed_length() {
    let masked = mask_token("sk-proj-1234567890abcdefghijklmnopqrstuvwxyz");
    assert_eq!(masked, "sk-proj***wxyz");
    assert_eq!(masked.len(), 7 + 3 + 4);
}
