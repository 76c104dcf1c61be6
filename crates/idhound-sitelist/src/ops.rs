//! Identifier transforms for catalogue entries.
//!
//! Email catalogues frequently probe by digest rather than by the raw
//! address. Unknown operation names pass the input through unchanged so a
//! newer catalogue never breaks an older engine.

use md5::{Digest as _, Md5};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use sha2::Sha256;

// `urlencode` keeps alphanumerics, `-_.~` and `/` literal; catalogue URL
// templates embed slashed identifiers in path position.
const URLENCODE_KEEP: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Apply a catalogue `input_operation` to an identifier.
#[must_use]
pub fn apply_input_operation(value: &str, operation: Option<&str>) -> String {
    let Some(operation) = operation else {
        return value.to_string();
    };

    match operation.trim().to_lowercase().as_str() {
        "identity" | "none" | "noop" => value.to_string(),
        "lower" => value.to_lowercase(),
        "strip" => value.trim().to_string(),
        "urlencode" | "url-encode" | "url_encode" => {
            utf8_percent_encode(value, URLENCODE_KEEP).to_string()
        }
        "md5" | "hash-md5" => hex::encode(Md5::digest(value.as_bytes())),
        "sha1" | "hash-sha1" => hex::encode(Sha1::digest(value.as_bytes())),
        "sha256" | "hash-sha256" => hex::encode(Sha256::digest(value.as_bytes())),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_variants() {
        assert_eq!(apply_input_operation("Ab C", None), "Ab C");
        assert_eq!(apply_input_operation("Ab C", Some("identity")), "Ab C");
        assert_eq!(apply_input_operation("Ab C", Some("noop")), "Ab C");
        assert_eq!(apply_input_operation("Ab C", Some("made-up-op")), "Ab C");
    }

    #[test]
    fn test_simple_transforms() {
        assert_eq!(apply_input_operation("AbC", Some("lower")), "abc");
        assert_eq!(apply_input_operation("  x  ", Some("strip")), "x");
        assert_eq!(apply_input_operation("a b@c", Some("urlencode")), "a%20b%40c");
    }

    #[test]
    fn test_urlencode_keeps_slashes_and_unreserved_chars() {
        assert_eq!(
            apply_input_operation("\"a/b\"@example.com", Some("urlencode")),
            "%22a/b%22%40example.com"
        );
        assert_eq!(apply_input_operation("a-b_c.d~e/f", Some("urlencode")), "a-b_c.d~e/f");
    }

    #[test]
    fn test_digests() {
        assert_eq!(
            apply_input_operation("bob@example.com", Some("md5")),
            "4b9bb80620f03eb3719e0a061c14283d"
        );
        assert_eq!(
            apply_input_operation("abc", Some("sha1")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            apply_input_operation("abc", Some("sha256")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        // hash-* aliases resolve to the same digests
        assert_eq!(
            apply_input_operation("abc", Some("hash-sha1")),
            apply_input_operation("abc", Some("sha1"))
        );
    }

    #[test]
    fn test_idempotent_operations() {
        for op in ["lower", "strip"] {
            let once = apply_input_operation(" MiXed ", Some(op));
            let twice = apply_input_operation(&once, Some(op));
            assert_eq!(once, twice, "{op} must be idempotent");
        }
        // urlencode is idempotent on already-encoded ASCII-safe output only
        // when there is nothing left to escape.
        let once = apply_input_operation("plain", Some("urlencode"));
        assert_eq!(apply_input_operation(&once, Some("urlencode")), once);
    }

    #[test]
    fn test_operation_name_is_case_insensitive() {
        assert_eq!(apply_input_operation("AbC", Some("LOWER")), "abc");
        assert_eq!(apply_input_operation("AbC", Some(" Lower ")), "abc");
    }
}
