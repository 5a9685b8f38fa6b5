//! Flattening of raw listing JSON into [`Record`]s.
//!
//! Everything here is pure: the same input always yields the same record or
//! the same error. Failures are reported as [`ScraperError::Mapping`] and are
//! never retried.

use carzone_core::{FieldValue, Record, IDENTITY_FIELD};
use serde_json::Value;

use crate::error::ScraperError;

/// Location of the listing array inside a page body.
pub const ITEMS_POINTER: &str = "/results/1/items";

/// Location of the flattened summary inside one listing item.
pub const SUMMARY_POINTER: &str = "/summary";

/// Base columns and the JSON pointer each is read from inside a summary.
///
/// Every pointer must resolve; a JSON `null` is accepted and leaves the
/// column absent.
const BASE_FIELDS: &[(&str, &str)] = &[
    (IDENTITY_FIELD, "/publicReference"),
    ("price", "/sale/advertPricing/price"),
    ("price_unit", "/sale/advertPricing/unit"),
    ("price_vat", "/priceDetail/vatIncluded"),
    ("engineSize", "/engineSize"),
    ("engineSizeCC", "/engineSizeCC"),
    ("registrationYear", "/vehicle/registrationYear"),
    ("colour", "/vehicle/colour"),
    ("mileageKm", "/vehicle/mileage/mileageKm"),
    ("make", "/searchDetailSummary/mmv/make"),
    ("model", "/searchDetailSummary/mmv/model"),
    ("fuelType", "/searchDetailSummary/fuelType"),
    ("transmission", "/searchDetailSummary/transmission"),
    ("sale_city", "/stockLocation/city"),
    ("sale_county", "/stockLocation/county"),
];

/// Detail columns and their pointers inside a detail payload. All optional.
const DETAIL_FIELDS: &[(&str, &str)] = &[
    ("bodyType", "/vehicle/bodyType"),
    ("doors", "/vehicle/doors"),
    ("seats", "/vehicle/seats"),
    ("numberOfOwners", "/vehicle/numberOfOwners"),
    ("nctExpiry", "/vehicle/nctExpiry"),
    ("taxExpiry", "/vehicle/taxExpiry"),
    ("sellerType", "/seller/type"),
    ("dealerName", "/seller/name"),
    ("description", "/description"),
];

/// Converts one listing summary into a [`Record`].
///
/// # Errors
///
/// Returns [`ScraperError::Mapping`] if the summary is not an object, a base
/// field is missing or non-scalar, or `publicReference` is not a non-empty
/// string.
pub fn map_listing(summary: &Value) -> Result<Record, ScraperError> {
    if !summary.is_object() {
        return Err(mapping_error("listing summary", "expected a JSON object"));
    }

    let reference = match summary.pointer("/publicReference") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(_) => {
            return Err(mapping_error(
                "listing summary",
                "publicReference is empty or not a string",
            ))
        }
        None => return Err(mapping_error("listing summary", "missing publicReference")),
    };
    let context = format!("listing {reference}");

    let mut record = Record::new();
    record.set(IDENTITY_FIELD, Some(FieldValue::Text(reference)));

    for (column, pointer) in &BASE_FIELDS[1..] {
        let raw = summary
            .pointer(pointer)
            .ok_or_else(|| mapping_error(&context, &format!("missing field {pointer}")))?;
        let value = scalar(raw)
            .map_err(|reason| mapping_error(&context, &format!("{pointer}: {reason}")))?;
        record.set(*column, value);
    }

    Ok(record)
}

/// Extracts and maps every listing on a page body, preserving API order.
///
/// All-or-nothing: a single unmappable item fails the whole page.
///
/// # Errors
///
/// Returns [`ScraperError::Mapping`] if the item array is missing or any item
/// fails [`map_listing`].
pub fn map_page(body: &Value) -> Result<Vec<Record>, ScraperError> {
    let items = body
        .pointer(ITEMS_POINTER)
        .and_then(Value::as_array)
        .ok_or_else(|| mapping_error("page body", &format!("no item array at {ITEMS_POINTER}")))?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let summary = item.pointer(SUMMARY_POINTER).ok_or_else(|| {
                mapping_error(&format!("item {idx}"), "missing summary object")
            })?;
            map_listing(summary)
        })
        .collect()
}

/// Merges detail fields into `record`.
///
/// Detail columns are optional; missing or `null` ones are simply not set.
///
/// # Errors
///
/// Returns [`ScraperError::Mapping`] if `detail` is not an object, names a
/// different `publicReference` than the record, or carries a non-scalar value
/// for a detail column.
pub fn merge_details(mut record: Record, detail: &Value) -> Result<Record, ScraperError> {
    let reference = record.public_reference().unwrap_or_default().to_owned();
    let context = format!("detail for {reference}");

    if !detail.is_object() {
        return Err(mapping_error(&context, "expected a JSON object"));
    }

    if let Some(Value::String(other)) = detail.pointer("/publicReference") {
        if *other != reference {
            return Err(mapping_error(
                &context,
                &format!("payload belongs to listing {other}"),
            ));
        }
    }

    for (column, pointer) in DETAIL_FIELDS {
        let Some(raw) = detail.pointer(pointer) else {
            continue;
        };
        let value = scalar(raw)
            .map_err(|reason| mapping_error(&context, &format!("{pointer}: {reason}")))?;
        record.set(*column, value);
    }

    Ok(record)
}

/// Converts a JSON scalar into a [`FieldValue`]; `null` becomes `None`.
fn scalar(value: &Value) -> Result<Option<FieldValue>, &'static str> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(FieldValue::Bool(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(FieldValue::Integer(i)))
            } else if let Some(f) = n.as_f64() {
                Ok(Some(FieldValue::Float(f)))
            } else {
                Err("number out of range")
            }
        }
        Value::String(s) => Ok(Some(FieldValue::Text(s.clone()))),
        Value::Array(_) | Value::Object(_) => Err("expected a scalar value"),
    }
}

fn mapping_error(context: &str, reason: &str) -> ScraperError {
    ScraperError::Mapping {
        context: context.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
#[path = "mapper_test.rs"]
mod tests;
