//! Core record types for stockpile.
//!
//! A [`Record`] is one inventory item. A [`RecordPatch`] carries the subset of
//! fields an update supplies; absent fields are left unchanged.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique, non-blank identifier.
    pub id: String,
    /// Free-text name.
    pub name: String,
    /// Units in stock; never negative.
    pub quantity: i64,
    /// Unit price; never negative.
    pub price: f64,
}

impl Record {
    /// Create a new record. Values are not validated until the record is admitted to a store.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, quantity: i64, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity,
            price,
        }
    }

    /// Trim the text fields and check every invariant a stored record must hold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a blank id or name, a negative
    /// quantity, or a negative or non-finite price.
    pub fn normalized(self) -> Result<Self> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(Error::invalid_value("id", "must not be empty"));
        }
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::invalid_value("name", "must not be empty"));
        }
        check_quantity(self.quantity)?;
        check_price(self.price)?;
        Ok(Self {
            id,
            name,
            quantity: self.quantity,
            price: self.price,
        })
    }

    /// Case-insensitive substring match against the name.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn name_contains(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} | quantity: {} | price: {:.2}",
            self.id, self.name, self.quantity, self.price
        )
    }
}

/// The fields an update may change. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    /// New name.
    pub name: Option<String>,
    /// New quantity.
    pub quantity: Option<i64>,
    /// New price.
    pub price: Option<f64>,
}

impl RecordPatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the quantity.
    #[must_use]
    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Set the price.
    #[must_use]
    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// True when no field is supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.quantity.is_none() && self.price.is_none()
    }

    /// Produce the patched copy of `record`.
    ///
    /// Every supplied field is validated before anything is applied, so a
    /// rejected patch never yields a partially updated record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] on the first supplied field that is invalid.
    pub fn apply_to(&self, record: &Record) -> Result<Record> {
        let name = match &self.name {
            Some(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(Error::invalid_value("name", "must not be empty"));
                }
                Some(name.to_string())
            }
            None => None,
        };
        if let Some(quantity) = self.quantity {
            check_quantity(quantity)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }

        Ok(Record {
            id: record.id.clone(),
            name: name.unwrap_or_else(|| record.name.clone()),
            quantity: self.quantity.unwrap_or(record.quantity),
            price: self.price.unwrap_or(record.price),
        })
    }
}

fn check_quantity(quantity: i64) -> Result<()> {
    if quantity < 0 {
        return Err(Error::invalid_value(
            "quantity",
            format!("must not be negative (got {quantity})"),
        ));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<()> {
    if !price.is_finite() {
        return Err(Error::invalid_value("price", "must be a finite number"));
    }
    if price < 0.0 {
        return Err(Error::invalid_value(
            "price",
            format!("must not be negative (got {price})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn pen() -> Record {
        Record::new("A1", "Pen", 10, 1.5)
    }

    #[test]
    fn test_record_new() {
        let record = pen();
        assert_eq!(record.id, "A1");
        assert_eq!(record.name, "Pen");
        assert_eq!(record.quantity, 10);
        assert!((record.price - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalized_trims_text() {
        let record = Record::new("  A1 ", "\tPen  ", 10, 1.5).normalized().unwrap();
        assert_eq!(record.id, "A1");
        assert_eq!(record.name, "Pen");
    }

    #[test]
    fn test_normalized_rejects_blank_id() {
        let err = Record::new("   ", "Pen", 1, 1.0).normalized().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn test_normalized_rejects_blank_name() {
        let err = Record::new("A1", "", 1, 1.0).normalized().unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_normalized_rejects_negative_values() {
        let err = Record::new("A1", "Pen", -1, 1.0).normalized().unwrap_err();
        assert!(err.to_string().contains("quantity"));

        let err = Record::new("A1", "Pen", 1, -0.01).normalized().unwrap_err();
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_normalized_rejects_non_finite_price() {
        let err = Record::new("A1", "Pen", 1, f64::NAN).normalized().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert!(Record::new("A1", "Pen", 1, f64::INFINITY).normalized().is_err());
    }

    #[test]
    fn test_zero_values_are_valid() {
        assert!(Record::new("A1", "Pen", 0, 0.0).normalized().is_ok());
    }

    #[test]
    fn test_name_contains() {
        let record = Record::new("B2", "Blue Ballpoint", 3, 0.99);
        assert!(record.name_contains("ball"));
        assert!(record.name_contains("blue b"));
        assert!(!record.name_contains("pencil"));
    }

    #[test]
    fn test_record_display() {
        assert_eq!(pen().to_string(), "A1 - Pen | quantity: 10 | price: 1.50");
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(RecordPatch::new().is_empty());
        assert!(!RecordPatch::new().price(2.0).is_empty());
    }

    #[test]
    fn test_patch_leaves_omitted_fields() {
        let patched = RecordPatch::new().quantity(4).apply_to(&pen()).unwrap();
        assert_eq!(patched.name, "Pen");
        assert_eq!(patched.quantity, 4);
        assert!((patched.price - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_patch_applies_all_fields() {
        let patched = RecordPatch::new()
            .name(" Marker ")
            .quantity(7)
            .price(2.25)
            .apply_to(&pen())
            .unwrap();
        assert_eq!(patched, Record::new("A1", "Marker", 7, 2.25));
    }

    #[test]
    fn test_patch_rejects_whole_update_on_invalid_field() {
        let original = pen();
        let err = RecordPatch::new()
            .name("Marker")
            .quantity(5)
            .price(-1.0)
            .apply_to(&original)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert_eq!(original, pen());
    }

    #[test]
    fn test_patch_rejects_blank_name() {
        let err = RecordPatch::new().name("  ").apply_to(&pen()).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_record_serialization() {
        let json = serde_json::to_string(&pen()).unwrap();
        assert_eq!(json, r#"{"id":"A1","name":"Pen","quantity":10,"price":1.5}"#);
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pen());
    }
}
