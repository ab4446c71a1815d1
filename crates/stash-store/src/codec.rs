//! The kind-tagged envelope translating between [`Value`] and the backing
//! document's JSON text.
//!
//! Every stored node is wrapped, recursively, in an explicit envelope:
//!
//! ```text
//! {"kind": "<null|bool|int|float|str|bytes|seq|map>", "value": <payload>}
//! ```
//!
//! The tag makes reads exact: a stored string that happens to look like an
//! encoded composite is still a string when it comes back, because nothing
//! is ever re-decoded on a guess. A whole document serializes as one
//! top-level JSON object mapping store keys to envelopes; an empty or
//! whitespace-only document text decodes to the empty document.
//!
//! # Encoding restrictions
//!
//! - Binary blobs must be valid UTF-8; anything else is rejected rather
//!   than silently transcoded.
//! - Floats must be finite and within [`FLOAT_MAGNITUDE_LIMIT`]; beyond it
//!   the text round trip is not trusted to preserve the value.

use std::collections::BTreeMap;

use serde_json::{json, Map as JsonMap, Value as Json};

use stash_value::Value;

use crate::error::{StoreError, StoreResult};

/// The decoded contents of a backing file at one point in time: store key
/// to raw envelope. `BTreeMap` keeps the persisted key order deterministic.
pub type Document = BTreeMap<String, Json>;

/// Largest float magnitude the text encoding is trusted to round-trip.
pub const FLOAT_MAGNITUDE_LIMIT: f64 = 1.0e14;

/// Encode one value into its envelope on behalf of the named backend.
///
/// The backend name appears in `UnsupportedValue` errors so the caller can
/// tell which encoding rejected the value.
pub fn encode_value(value: &Value, backend: &'static str) -> StoreResult<Json> {
    let envelope = match value {
        Value::Null => json!({ "kind": "null", "value": null }),
        Value::Bool(b) => json!({ "kind": "bool", "value": b }),
        Value::Int(i) => json!({ "kind": "int", "value": i }),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(unsupported(backend, value, "non-finite floats have no text form"));
            }
            if f.abs() > FLOAT_MAGNITUDE_LIMIT {
                return Err(unsupported(
                    backend,
                    value,
                    format!("magnitude exceeds the safe round-trip limit of {FLOAT_MAGNITUDE_LIMIT:e}"),
                ));
            }
            json!({ "kind": "float", "value": f })
        }
        Value::Str(s) => json!({ "kind": "str", "value": s }),
        Value::Bytes(b) => match std::str::from_utf8(b) {
            Ok(text) => json!({ "kind": "bytes", "value": text }),
            Err(_) => {
                return Err(unsupported(backend, value, "binary content is not valid UTF-8"));
            }
        },
        Value::Seq(items) => {
            let encoded: Vec<Json> = items
                .iter()
                .map(|item| encode_value(item, backend))
                .collect::<StoreResult<_>>()?;
            json!({ "kind": "seq", "value": encoded })
        }
        Value::Map(entries) => {
            let mut encoded = JsonMap::with_capacity(entries.len());
            for (key, entry) in entries {
                encoded.insert(key.clone(), encode_value(entry, backend)?);
            }
            json!({ "kind": "map", "value": encoded })
        }
    };
    Ok(envelope)
}

/// Decode one envelope back into a value.
///
/// A malformed envelope means the document was not produced by this codec
/// (or was edited by hand) and surfaces as a `Read` error.
pub fn decode_value(raw: &Json) -> StoreResult<Value> {
    let envelope = raw
        .as_object()
        .ok_or_else(|| corrupt("entry is not a tagged object"))?;
    let kind = envelope
        .get("kind")
        .and_then(Json::as_str)
        .ok_or_else(|| corrupt("entry is missing its kind tag"))?;
    let payload = envelope
        .get("value")
        .ok_or_else(|| corrupt("entry is missing its payload"))?;

    match kind {
        "null" => Ok(Value::Null),
        "bool" => payload
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| corrupt("bool entry holds a non-boolean payload")),
        "int" => payload
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| corrupt("int entry holds a non-integer payload")),
        "float" => payload
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| corrupt("float entry holds a non-numeric payload")),
        "str" => payload
            .as_str()
            .map(|s| Value::Str(s.to_string()))
            .ok_or_else(|| corrupt("str entry holds a non-string payload")),
        "bytes" => payload
            .as_str()
            .map(|s| Value::Bytes(s.as_bytes().to_vec()))
            .ok_or_else(|| corrupt("bytes entry holds a non-string payload")),
        "seq" => {
            let items = payload
                .as_array()
                .ok_or_else(|| corrupt("seq entry holds a non-array payload"))?;
            let decoded: Vec<Value> = items.iter().map(decode_value).collect::<StoreResult<_>>()?;
            Ok(Value::Seq(decoded))
        }
        "map" => {
            let entries = payload
                .as_object()
                .ok_or_else(|| corrupt("map entry holds a non-object payload"))?;
            let mut decoded = BTreeMap::new();
            for (key, entry) in entries {
                decoded.insert(key.clone(), decode_value(entry)?);
            }
            Ok(Value::Map(decoded))
        }
        other => Err(corrupt(&format!("unknown kind tag {other:?}"))),
    }
}

/// Serialize a full document to the on-disk text form.
pub fn encode_document(doc: &Document) -> StoreResult<String> {
    serde_json::to_string_pretty(doc).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Parse on-disk text into a document.
///
/// Empty or whitespace-only text is the empty document; anything else must
/// parse as a single top-level JSON object.
pub fn decode_document(text: &str) -> StoreResult<Document> {
    if text.trim().is_empty() {
        return Ok(Document::new());
    }
    let parsed: Json = serde_json::from_str(text)
        .map_err(|e| StoreError::Read(format!("malformed document: {e}")))?;
    match parsed {
        Json::Object(entries) => Ok(entries.into_iter().collect()),
        _ => Err(StoreError::Read("document root is not an object".to_string())),
    }
}

fn unsupported(backend: &'static str, value: &Value, reason: impl Into<String>) -> StoreError {
    StoreError::UnsupportedValue {
        backend,
        kind: value.kind(),
        reason: reason.into(),
    }
}

fn corrupt(detail: &str) -> StoreError {
    StoreError::Read(format!("corrupt document entry: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: Value) -> Value {
        let raw = encode_value(&value, "test").unwrap();
        decode_value(&raw).unwrap()
    }

    // -----------------------------------------------------------------------
    // Scalar round trips
    // -----------------------------------------------------------------------

    #[test]
    fn scalars_round_trip() {
        assert_eq!(roundtrip(Value::Null), Value::Null);
        assert_eq!(roundtrip(Value::Bool(true)), Value::Bool(true));
        assert_eq!(roundtrip(Value::Int(-12)), Value::Int(-12));
        assert_eq!(roundtrip(Value::Float(0.25)), Value::Float(0.25));
        assert_eq!(
            roundtrip(Value::Str("plain".into())),
            Value::Str("plain".into())
        );
    }

    #[test]
    fn int_extremes_round_trip() {
        assert_eq!(roundtrip(Value::Int(i64::MAX)), Value::Int(i64::MAX));
        assert_eq!(roundtrip(Value::Int(i64::MIN)), Value::Int(i64::MIN));
    }

    #[test]
    fn utf8_bytes_round_trip() {
        let blob = Value::Bytes("snapshot \u{2764}".as_bytes().to_vec());
        assert_eq!(roundtrip(blob.clone()), blob);
    }

    // -----------------------------------------------------------------------
    // Composite round trips
    // -----------------------------------------------------------------------

    #[test]
    fn nested_composites_round_trip() {
        let value = Value::Map(BTreeMap::from([
            (
                "nums".to_string(),
                Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            ),
            (
                "inner".to_string(),
                Value::Map(BTreeMap::from([
                    ("flag".to_string(), Value::Bool(false)),
                    ("label".to_string(), Value::Str("deep".into())),
                ])),
            ),
            ("nothing".to_string(), Value::Null),
        ]));
        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn string_resembling_an_envelope_stays_a_string() {
        // The explicit kind tag means no content is ever re-decoded on a
        // guess: text that looks like an encoded payload comes back as text.
        let sneaky = Value::Str(r#"{"kind": "int", "value": 3}"#.into());
        assert_eq!(roundtrip(sneaky.clone()), sneaky);

        let listish = Value::Str("[1, 2, 3]".into());
        assert_eq!(roundtrip(listish.clone()), listish);
    }

    // -----------------------------------------------------------------------
    // Encoding restrictions
    // -----------------------------------------------------------------------

    #[test]
    fn float_beyond_limit_is_rejected() {
        let err = encode_value(&Value::Float(2.0e14), "file").unwrap_err();
        match err {
            StoreError::UnsupportedValue { backend, kind, .. } => {
                assert_eq!(backend, "file");
                assert_eq!(kind, "float");
            }
            other => panic!("expected UnsupportedValue, got: {other}"),
        }
    }

    #[test]
    fn float_within_limit_round_trips_exactly() {
        assert_eq!(roundtrip(Value::Float(1.0e13)), Value::Float(1.0e13));
        assert_eq!(
            roundtrip(Value::Float(-FLOAT_MAGNITUDE_LIMIT)),
            Value::Float(-FLOAT_MAGNITUDE_LIMIT)
        );
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        assert!(encode_value(&Value::Float(f64::NAN), "file").is_err());
        assert!(encode_value(&Value::Float(f64::INFINITY), "file").is_err());
        assert!(encode_value(&Value::Float(f64::NEG_INFINITY), "file").is_err());
    }

    #[test]
    fn non_utf8_bytes_are_rejected() {
        let err = encode_value(&Value::Bytes(vec![0xff, 0xfe]), "file").unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedValue { kind: "bytes", .. }
        ));
    }

    #[test]
    fn unsupported_value_nested_in_composite_is_rejected() {
        let value = Value::Seq(vec![Value::Int(1), Value::Float(f64::NAN)]);
        let err = encode_value(&value, "file").unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedValue { kind: "float", .. }
        ));
    }

    // -----------------------------------------------------------------------
    // Document text form
    // -----------------------------------------------------------------------

    #[test]
    fn document_text_round_trips() {
        let mut doc = Document::new();
        doc.insert("a".into(), encode_value(&Value::Int(1), "test").unwrap());
        doc.insert(
            "b".into(),
            encode_value(&Value::Str("two".into()), "test").unwrap(),
        );

        let text = encode_document(&doc).unwrap();
        let reread = decode_document(&text).unwrap();
        assert_eq!(reread, doc);
    }

    #[test]
    fn blank_text_is_the_empty_document() {
        assert!(decode_document("").unwrap().is_empty());
        assert!(decode_document("  \n\t ").unwrap().is_empty());
    }

    #[test]
    fn malformed_text_is_a_read_error() {
        let err = decode_document("{ not json").unwrap_err();
        assert!(matches!(err, StoreError::Read(_)));
    }

    #[test]
    fn non_object_root_is_a_read_error() {
        let err = decode_document("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, StoreError::Read(_)));
    }

    #[test]
    fn unknown_kind_tag_is_a_read_error() {
        let raw: Json = serde_json::json!({ "kind": "tuple", "value": [] });
        assert!(matches!(decode_value(&raw), Err(StoreError::Read(_))));
    }

    #[test]
    fn untagged_entry_is_a_read_error() {
        let raw: Json = serde_json::json!(42);
        assert!(matches!(decode_value(&raw), Err(StoreError::Read(_))));
        let raw: Json = serde_json::json!({ "value": 42 });
        assert!(matches!(decode_value(&raw), Err(StoreError::Read(_))));
    }
}
