use serde_json::json;

use super::*;
use crate::testing::{detail_body, listing_summary, page_body};

#[test]
fn maps_every_base_column() {
    let record = map_listing(&listing_summary("R100")).unwrap();

    assert_eq!(record.public_reference(), Some("R100"));
    assert_eq!(record.get("price"), Some(&FieldValue::Integer(15_950)));
    assert_eq!(record.get("price_unit"), Some(&FieldValue::Text("EUR".into())));
    assert_eq!(record.get("price_vat"), Some(&FieldValue::Bool(false)));
    assert_eq!(record.get("engineSize"), Some(&FieldValue::Float(1.6)));
    assert_eq!(record.get("engineSizeCC"), Some(&FieldValue::Integer(1598)));
    assert_eq!(record.get("registrationYear"), Some(&FieldValue::Integer(2018)));
    assert_eq!(record.get("colour"), Some(&FieldValue::Text("Grey".into())));
    assert_eq!(record.get("mileageKm"), Some(&FieldValue::Integer(74_000)));
    assert_eq!(record.get("make"), Some(&FieldValue::Text("Toyota".into())));
    assert_eq!(record.get("model"), Some(&FieldValue::Text("Corolla".into())));
    assert_eq!(record.get("fuelType"), Some(&FieldValue::Text("Petrol".into())));
    assert_eq!(record.get("transmission"), Some(&FieldValue::Text("Manual".into())));
    assert_eq!(record.get("sale_city"), Some(&FieldValue::Text("Naas".into())));
    assert_eq!(record.get("sale_county"), Some(&FieldValue::Text("Kildare".into())));
    assert_eq!(record.len(), carzone_core::BASE_COLUMNS.len());
}

#[test]
fn mapping_is_idempotent() {
    let summary = listing_summary("R7");
    let first = map_listing(&summary).unwrap();
    let second = map_listing(&summary).unwrap();
    assert_eq!(first, second);
}

#[test]
fn null_field_leaves_column_absent() {
    let mut summary = listing_summary("R1");
    summary["vehicle"]["colour"] = serde_json::Value::Null;
    let record = map_listing(&summary).unwrap();
    assert!(record.get("colour").is_none());
    assert!(record.get("make").is_some());
}

#[test]
fn missing_field_is_a_mapping_error() {
    let mut summary = listing_summary("R1");
    summary["stockLocation"]
        .as_object_mut()
        .unwrap()
        .remove("county");
    let err = map_listing(&summary).unwrap_err();
    assert!(
        matches!(err, ScraperError::Mapping { ref reason, .. } if reason.contains("/stockLocation/county")),
        "expected Mapping error naming the pointer, got: {err:?}"
    );
}

#[test]
fn missing_public_reference_is_a_mapping_error() {
    let mut summary = listing_summary("R1");
    summary.as_object_mut().unwrap().remove("publicReference");
    assert!(matches!(
        map_listing(&summary),
        Err(ScraperError::Mapping { .. })
    ));
}

#[test]
fn blank_public_reference_is_a_mapping_error() {
    let mut summary = listing_summary("R1");
    summary["publicReference"] = json!("  ");
    assert!(matches!(
        map_listing(&summary),
        Err(ScraperError::Mapping { .. })
    ));
}

#[test]
fn numeric_public_reference_is_a_mapping_error() {
    let mut summary = listing_summary("R1");
    summary["publicReference"] = json!(2_749_581);
    assert!(matches!(
        map_listing(&summary),
        Err(ScraperError::Mapping { .. })
    ));
}

#[test]
fn base_field_table_matches_export_columns() {
    let columns: Vec<&str> = BASE_FIELDS.iter().map(|(column, _)| *column).collect();
    assert_eq!(columns, carzone_core::BASE_COLUMNS);
}

#[test]
fn detail_field_table_matches_export_columns() {
    let columns: Vec<&str> = DETAIL_FIELDS.iter().map(|(column, _)| *column).collect();
    assert_eq!(columns, carzone_core::DETAIL_COLUMNS);
}

#[test]
fn non_scalar_field_is_a_mapping_error() {
    let mut summary = listing_summary("R1");
    summary["vehicle"]["colour"] = json!(["Grey", "Black"]);
    assert!(matches!(
        map_listing(&summary),
        Err(ScraperError::Mapping { .. })
    ));
}

#[test]
fn non_object_summary_is_a_mapping_error() {
    assert!(matches!(
        map_listing(&json!("R1")),
        Err(ScraperError::Mapping { .. })
    ));
}

#[test]
fn map_page_preserves_item_order() {
    let records = map_page(&page_body(&["A", "B", "C"])).unwrap();
    let refs: Vec<&str> = records.iter().filter_map(Record::public_reference).collect();
    assert_eq!(refs, vec!["A", "B", "C"]);
}

#[test]
fn map_page_accepts_empty_item_list() {
    assert!(map_page(&page_body(&[])).unwrap().is_empty());
}

#[test]
fn map_page_without_item_array_fails() {
    let err = map_page(&json!({"results": [{"banner": true}]})).unwrap_err();
    assert!(matches!(err, ScraperError::Mapping { .. }));
}

#[test]
fn map_page_fails_whole_page_on_one_bad_item() {
    let mut body = page_body(&["A", "B"]);
    body["results"][1]["items"][1]["summary"]
        .as_object_mut()
        .unwrap()
        .remove("engineSize");
    assert!(map_page(&body).is_err());
}

#[test]
fn merge_details_adds_detail_columns() {
    let record = map_listing(&listing_summary("R5")).unwrap();
    let merged = merge_details(record, &detail_body("R5")).unwrap();

    assert_eq!(merged.get("bodyType"), Some(&FieldValue::Text("Hatchback".into())));
    assert_eq!(merged.get("doors"), Some(&FieldValue::Integer(5)));
    assert_eq!(merged.get("sellerType"), Some(&FieldValue::Text("TRADE".into())));
    assert_eq!(merged.get("dealerName"), Some(&FieldValue::Text("Naas Motors".into())));
    assert!(merged.get("taxExpiry").is_none(), "null detail stays absent");
    assert_eq!(merged.get("make"), Some(&FieldValue::Text("Toyota".into())));
}

#[test]
fn merge_details_tolerates_sparse_payload() {
    let record = map_listing(&listing_summary("R5")).unwrap();
    let merged = merge_details(record.clone(), &json!({})).unwrap();
    assert_eq!(merged, record);
}

#[test]
fn merge_details_rejects_foreign_payload() {
    let record = map_listing(&listing_summary("R5")).unwrap();
    let err = merge_details(record, &detail_body("R6")).unwrap_err();
    assert!(matches!(err, ScraperError::Mapping { .. }));
}

#[test]
fn merge_details_rejects_non_object() {
    let record = map_listing(&listing_summary("R5")).unwrap();
    assert!(merge_details(record, &json!([1, 2])).is_err());
}
