//! On-disk representation of the backing file.
//!
//! The file is a JSON array of objects with the keys `id`, `name`,
//! `quantity` and `price`. Decoding is lenient about field presence and
//! scalar spelling (`"5"` is accepted for `5`) but strict about shape: a top
//! level that is not an array, or an element that is not an object, is
//! rejected as corrupt.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::record::Record;

/// Why the content of a backing file was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(String);

impl DecodeError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A JSON scalar as it may appear in a field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

/// One element of the array, before conversion.
#[derive(Debug, Deserialize)]
struct StoredEntry {
    #[serde(default)]
    id: Option<Scalar>,
    #[serde(default)]
    name: Option<Scalar>,
    #[serde(default)]
    quantity: Option<Scalar>,
    #[serde(default)]
    price: Option<Scalar>,
}

/// The records decoded from a backing file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    /// Admitted records keyed by id. Later duplicates replace earlier ones.
    pub records: BTreeMap<String, Record>,
    /// Entries dropped for a blank id.
    pub blank_ids: usize,
    /// Entries dropped for a negative quantity or price.
    pub out_of_range: usize,
}

/// Serialize records as the backing file's bytes.
///
/// # Errors
///
/// Returns the serializer's error, which does not occur for well-formed records.
pub fn encode<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    pretty: bool,
) -> serde_json::Result<Vec<u8>> {
    let records: Vec<&Record> = records.into_iter().collect();
    let mut bytes = if pretty {
        serde_json::to_vec_pretty(&records)?
    } else {
        serde_json::to_vec(&records)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse the backing file's bytes.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the bytes are not a JSON array of objects
/// or a field cannot be read as its type.
pub fn decode(bytes: &[u8]) -> Result<Decoded, DecodeError> {
    // Elements are taken as objects first; a derived struct would also accept a positional array.
    let entries: Vec<Map<String, Value>> = serde_json::from_slice(bytes)
        .map_err(|e| DecodeError::new(format!("expected a list of records: {e}")))?;

    let mut decoded = Decoded::default();
    for (index, object) in entries.into_iter().enumerate() {
        let record = serde_json::from_value::<StoredEntry>(Value::Object(object))
            .map_err(|e| e.to_string())
            .and_then(convert)
            .map_err(|e| DecodeError::new(format!("entry {index}: {e}")))?;
        if record.id.is_empty() {
            decoded.blank_ids += 1;
            continue;
        }
        if record.quantity < 0 || record.price < 0.0 {
            warn!(
                "Dropping record '{}' with negative quantity or price",
                record.id
            );
            decoded.out_of_range += 1;
            continue;
        }
        decoded.records.insert(record.id.clone(), record);
    }
    Ok(decoded)
}

fn convert(entry: StoredEntry) -> Result<Record, String> {
    Ok(Record {
        id: text(entry.id),
        name: text(entry.name),
        quantity: quantity(entry.quantity)?,
        price: price(entry.price)?,
    })
}

fn text(value: Option<Scalar>) -> String {
    match value {
        None => String::new(),
        Some(Scalar::Text(s)) => s.trim().to_string(),
        Some(Scalar::Int(n)) => n.to_string(),
        Some(Scalar::Float(f)) => f.to_string(),
    }
}

fn quantity(value: Option<Scalar>) -> Result<i64, String> {
    match value {
        None => Ok(0),
        Some(Scalar::Int(n)) => Ok(n),
        #[allow(clippy::cast_possible_truncation)]
        Some(Scalar::Float(f)) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
        Some(Scalar::Float(f)) => Err(format!("quantity {f} is not a whole number")),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| format!("quantity '{s}' is not an integer")),
    }
}

fn price(value: Option<Scalar>) -> Result<f64, String> {
    let price = match value {
        None => return Ok(0.0),
        #[allow(clippy::cast_precision_loss)]
        Some(Scalar::Int(n)) => n as f64,
        Some(Scalar::Float(f)) => f,
        Some(Scalar::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| format!("price '{s}' is not a number"))?,
    };
    if price.is_finite() {
        Ok(price)
    } else {
        Err(format!("price {price} is not finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_str(s: &str) -> Result<Decoded, DecodeError> {
        decode(s.as_bytes())
    }

    #[test]
    fn test_decode_empty_list() {
        let decoded = decode_str("[]").unwrap();
        assert!(decoded.records.is_empty());
        assert_eq!(decoded.blank_ids, 0);
    }

    #[test]
    fn test_decode_well_formed() {
        let decoded = decode_str(
            r#"[{"id":"A1","name":"Pen","quantity":10,"price":1.5},
                {"id":"B2","name":"Ink","quantity":0,"price":0}]"#,
        )
        .unwrap();
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.records["A1"], Record::new("A1", "Pen", 10, 1.5));
        assert_eq!(decoded.records["B2"], Record::new("B2", "Ink", 0, 0.0));
    }

    #[test]
    fn test_decode_trims_and_defaults() {
        let decoded = decode_str(r#"[{"id":"  C3 ","name":"  Glue\n"}]"#).unwrap();
        assert_eq!(decoded.records["C3"], Record::new("C3", "Glue", 0, 0.0));
    }

    #[test]
    fn test_decode_null_fields_default() {
        let decoded = decode_str(r#"[{"id":"C3","name":null,"quantity":null}]"#).unwrap();
        assert_eq!(decoded.records["C3"], Record::new("C3", "", 0, 0.0));
    }

    #[test]
    fn test_decode_drops_blank_ids() {
        let decoded = decode_str(concat!(
            r#"[{"id":"","name":"Nameless"},{"name":"No id"},"#,
            r#"{"id":"   "},{"id":"A1","name":"Pen"}]"#,
        ))
        .unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.blank_ids, 3);
    }

    #[test]
    fn test_decode_last_duplicate_wins() {
        let decoded = decode_str(
            r#"[{"id":"A1","name":"First","quantity":1},{"id":"A1","name":"Second","quantity":2}]"#,
        )
        .unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.records["A1"].name, "Second");
        assert_eq!(decoded.records["A1"].quantity, 2);
    }

    #[test]
    fn test_decode_numeric_strings_and_ids() {
        let decoded =
            decode_str(r#"[{"id":42,"name":"Tape","quantity":"7","price":"2.50"}]"#).unwrap();
        assert_eq!(decoded.records["42"], Record::new("42", "Tape", 7, 2.5));
    }

    #[test]
    fn test_decode_whole_float_quantity() {
        let decoded = decode_str(r#"[{"id":"A1","quantity":3.0}]"#).unwrap();
        assert_eq!(decoded.records["A1"].quantity, 3);
    }

    #[test]
    fn test_decode_drops_negative_values() {
        let decoded = decode_str(concat!(
            r#"[{"id":"A1","quantity":-1,"price":1},"#,
            r#"{"id":"B2","quantity":1,"price":-2.5},{"id":"C3"}]"#,
        ))
        .unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.out_of_range, 2);
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let decoded = decode_str(r#"[{"id":"A1","name":"Pen","colour":"blue"}]"#).unwrap();
        assert_eq!(decoded.records.len(), 1);
    }

    #[test]
    fn test_decode_rejects_non_list() {
        let err = decode_str(r#"{"id":"A1"}"#).unwrap_err();
        assert!(err.to_string().contains("expected a list of records"));
    }

    #[test]
    fn test_decode_rejects_non_object_element() {
        assert!(decode_str(r#"[["A1","Pen",1,1.0]]"#).is_err());
        assert!(decode_str(r#"["A1"]"#).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_str("this is not json").is_err());
        assert!(decode_str("").is_err());
        assert!(decode_str("[{\"id\":\"A1\"").is_err());
        assert!(decode(&[0xff, 0xfe, 0x00, 0x5b]).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_field_values() {
        let err = decode_str(r#"[{"id":"A1","quantity":"lots"}]"#).unwrap_err();
        assert!(err.to_string().contains("entry 0"));
        assert!(err.to_string().contains("lots"));

        assert!(decode_str(r#"[{"id":"A1","quantity":1.5}]"#).is_err());
        assert!(decode_str(r#"[{"id":"A1","price":true}]"#).is_err());
        assert!(decode_str(r#"[{"id":"A1","name":{"first":"x"}}]"#).is_err());
    }

    #[test]
    fn test_encode_pretty_layout() {
        let records = [Record::new("A1", "Pen", 10, 1.5)];
        let bytes = encode(&records, true).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("[\n  {\n    \"id\": \"A1\""));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn test_encode_empty_is_empty_list() {
        let bytes = encode(std::iter::empty(), false).unwrap();
        assert_eq!(bytes, b"[]\n");
        assert!(decode(&bytes).unwrap().records.is_empty());
    }

    #[test]
    fn test_encode_then_decode_preserves_values() {
        let records = [
            Record::new("A1", "Pen", 10, 1.5),
            Record::new("A2", "Pen", 10, 1.5),
            Record::new("Z9", "Ünïcødé ✓, \"quoted\"", 0, 0.1 + 0.2),
        ];
        let decoded = decode(&encode(&records, true).unwrap()).unwrap();
        assert_eq!(decoded.records.len(), 3);
        for record in &records {
            assert_eq!(&decoded.records[&record.id], record);
        }
    }
}
