//! Flat listing records and their tabular column schema.
//!
//! A [`Record`] is a mapping from column name to scalar [`FieldValue`].
//! Absent values are represented by the key being missing, never by a
//! placeholder, so writers must tolerate records with differing key sets
//! (detail columns only exist on enriched records).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Column carrying the listing's catalog-wide identity.
pub const IDENTITY_FIELD: &str = "publicReference";

/// Columns produced by mapping a listing summary, in export order.
///
/// Only the legacy `price` / `price_unit` pricing shape is canonical.
pub const BASE_COLUMNS: &[&str] = &[
    IDENTITY_FIELD,
    "price",
    "price_unit",
    "price_vat",
    "engineSize",
    "engineSizeCC",
    "registrationYear",
    "colour",
    "mileageKm",
    "make",
    "model",
    "fuelType",
    "transmission",
    "sale_city",
    "sale_county",
];

/// Columns merged in from a per-listing detail payload, in export order.
pub const DETAIL_COLUMNS: &[&str] = &[
    "bodyType",
    "doors",
    "seats",
    "numberOfOwners",
    "nctExpiry",
    "taxExpiry",
    "sellerType",
    "dealerName",
    "description",
];

/// A single scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// One flattened listing, optionally extended with detail fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, or removes it when `value` is `None`.
    pub fn set(&mut self, key: impl Into<String>, value: Option<FieldValue>) {
        let key = key.into();
        match value {
            Some(v) => {
                self.fields.insert(key, v);
            }
            None => {
                self.fields.remove(&key);
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// The listing's `publicReference`, if present and textual.
    #[must_use]
    pub fn public_reference(&self) -> Option<&str> {
        self.get(IDENTITY_FIELD).and_then(FieldValue::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Computes the export column order for a set of records.
///
/// Base columns come first, then detail columns when `include_detail` is set,
/// then any remaining keys seen on the records in lexical order.
#[must_use]
pub fn column_order(records: &[Record], include_detail: bool) -> Vec<String> {
    let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
    if include_detail {
        columns.extend(DETAIL_COLUMNS.iter().map(|c| (*c).to_owned()));
    }

    let known: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
    let extra: BTreeSet<&str> = records
        .iter()
        .flat_map(Record::keys)
        .filter(|k| !known.contains(k))
        .collect();
    let extra: Vec<String> = extra.into_iter().map(str::to_owned).collect();

    columns.extend(extra);
    columns
}
