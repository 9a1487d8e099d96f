//! Canonical textual codec.
//!
//! Every record that crosses the wire or gets hashed is rendered as a frame
//! of the shape
//!
//! ```text
//! TypeName [field1:Enc(v1), field2:Enc(v2), ...]
//! ```
//!
//! with a fixed field order per record type. Scalar values are rendered to
//! their decimal / lowercase / UTF-8 string form and then base64-encoded.
//! Compound fields encode each element, base64 each encoded element once
//! more, join with `", "`, and base64 the joined string a final time before
//! it is placed in the outer field. An empty compound field is the base64 of
//! the empty string, i.e. the empty string.
//!
//! Because digests are computed over this encoding, the format is part of
//! consensus: field order and the exact separators (including the single
//! space after each comma) must not drift.
//!
//! Decoding is tolerant of unknown field names but strict about the outer
//! `TypeName [` ... `]` wrapper. Parse failures are expected inputs from
//! untrusted peers and are returned as values, never panics.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Error produced while decoding a canonical frame.
#[derive(Debug, Eq, PartialEq)]
pub enum CodecError {
    /// The outer `TypeName [...]` wrapper is missing or malformed.
    Wrapper(&'static str),
    /// A field value is not valid base64 or not valid UTF-8 underneath.
    Encoding,
    /// A numeric or boolean field failed to parse after decoding.
    Scalar(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Wrapper(ty) => write!(f, "malformed {ty} frame"),
            CodecError::Encoding => write!(f, "field is not valid base64 text"),
            CodecError::Scalar(msg) => write!(f, "bad scalar field: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Base64-encodes a scalar already rendered to its string form.
pub fn encode_str(value: &str) -> String {
    BASE64.encode(value.as_bytes())
}

/// Decodes a base64 field back to its UTF-8 string form.
pub fn decode_str(field: &str) -> Result<String, CodecError> {
    let bytes = BASE64.decode(field).map_err(|_| CodecError::Encoding)?;
    String::from_utf8(bytes).map_err(|_| CodecError::Encoding)
}

/// Decodes a base64 field and parses it as a scalar.
pub fn decode_scalar<T>(field: &str) -> Result<T, CodecError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    let text = decode_str(field)?;
    text.parse::<T>()
        .map_err(|e| CodecError::Scalar(format!("{text:?}: {e}")))
}

/// Encodes a compound field from the already-encoded frames of its elements.
pub fn encode_list<I>(elements: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let joined = elements
        .into_iter()
        .map(|frame| BASE64.encode(frame.as_bytes()))
        .collect::<Vec<_>>()
        .join(", ");
    BASE64.encode(joined.as_bytes())
}

/// Decodes a compound field into the frames of its elements.
pub fn decode_list(field: &str) -> Result<Vec<String>, CodecError> {
    let joined = decode_str(field)?;
    if joined.is_empty() {
        return Ok(Vec::new());
    }
    joined.split(", ").map(decode_str).collect()
}

/// Renders a record frame from its type name and ordered encoded fields.
pub fn render(type_name: &str, fields: &[(&str, String)]) -> String {
    let body = fields
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{type_name} [{body}]")
}

/// Splits a record frame into `(field_name, raw_value)` pairs.
///
/// The wrapper literal is checked strictly; attributes that do not contain a
/// key/value separator are skipped; values keep everything after the *first*
/// colon.
pub fn fields<'a>(
    type_name: &'static str,
    frame: &'a str,
) -> Result<Vec<(&'a str, &'a str)>, CodecError> {
    let body = frame
        .strip_prefix(type_name)
        .and_then(|rest| rest.strip_prefix(" ["))
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or(CodecError::Wrapper(type_name))?;

    Ok(body
        .split(", ")
        .filter_map(|attribute| attribute.split_once(':'))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip() {
        let encoded = encode_str("10.5");
        assert_eq!(decode_str(&encoded).unwrap(), "10.5");
        let value: f64 = decode_scalar(&encoded).unwrap();
        assert_eq!(value, 10.5);
    }

    #[test]
    fn render_and_fields_roundtrip() {
        let frame = render(
            "Sample",
            &[("alpha", encode_str("a")), ("beta", encode_str("b"))],
        );
        assert_eq!(frame, format!("Sample [alpha:{}, beta:{}]", encode_str("a"), encode_str("b")));

        let parsed = fields("Sample", &frame).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, "alpha");
        assert_eq!(decode_str(parsed[1].1).unwrap(), "b");
    }

    #[test]
    fn wrapper_is_strict() {
        assert_eq!(
            fields("Sample", "Other [alpha:x]").unwrap_err(),
            CodecError::Wrapper("Sample")
        );
        assert_eq!(
            fields("Sample", "Sample [alpha:x").unwrap_err(),
            CodecError::Wrapper("Sample")
        );
    }

    #[test]
    fn unknown_separatorless_attributes_are_skipped() {
        let frame = "Sample [alpha:x, junk]";
        let parsed = fields("Sample", frame).unwrap();
        assert_eq!(parsed, vec![("alpha", "x")]);
    }

    #[test]
    fn value_keeps_everything_after_first_colon() {
        let frame = "Sample [alpha:x:y:z]";
        let parsed = fields("Sample", frame).unwrap();
        assert_eq!(parsed, vec![("alpha", "x:y:z")]);
    }

    #[test]
    fn empty_list_is_base64_of_empty_string() {
        assert_eq!(encode_list(Vec::<String>::new()), "");
        assert!(decode_list("").unwrap().is_empty());
    }

    #[test]
    fn list_roundtrip_is_double_encoded() {
        let frames = vec!["One [a:1]".to_string(), "Two [b:2]".to_string()];
        let field = encode_list(frames.clone());
        // The outer field itself is base64.
        assert!(decode_str(&field).is_ok());
        assert_eq!(decode_list(&field).unwrap(), frames);
    }

    #[test]
    fn bad_base64_is_an_encoding_error() {
        assert_eq!(decode_str("!!!").unwrap_err(), CodecError::Encoding);
        assert!(matches!(
            decode_scalar::<u64>(&encode_str("not-a-number")).unwrap_err(),
            CodecError::Scalar(_)
        ));
    }
}
