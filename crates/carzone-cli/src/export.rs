//! CSV export of a finished result set.
//!
//! Columns follow [`carzone_core::column_order`]. Records lacking a column get
//! an empty cell. Quoting follows RFC 4180.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use carzone_core::{column_order, Record};

/// Writes `records` as CSV (header row first) to `out`.
///
/// # Errors
///
/// Returns any I/O error raised by `out`.
pub(crate) fn write_csv<W: Write>(
    out: &mut W,
    records: &[Record],
    include_detail: bool,
) -> io::Result<()> {
    let columns = column_order(records, include_detail);

    write_row(out, columns.iter().map(String::as_str))?;
    for record in records {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| record.get(column).map(ToString::to_string).unwrap_or_default())
            .collect();
        write_row(out, cells.iter().map(String::as_str))?;
    }
    out.flush()
}

/// Creates (or truncates) `path` and writes the CSV into it.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub(crate) fn write_csv_file(
    path: &Path,
    records: &[Record],
    include_detail: bool,
) -> anyhow::Result<()> {
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_csv(&mut out, records, include_detail)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))
}

fn write_row<'a, W: Write>(out: &mut W, cells: impl Iterator<Item = &'a str>) -> io::Result<()> {
    for (idx, cell) in cells.enumerate() {
        if idx > 0 {
            out.write_all(b",")?;
        }
        out.write_all(escape(cell).as_bytes())?;
    }
    out.write_all(b"\r\n")
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use carzone_core::{FieldValue, BASE_COLUMNS};

    use super::*;

    fn record(reference: &str, extra: &[(&str, FieldValue)]) -> Record {
        let mut record = Record::new();
        record.set("publicReference", Some(reference.into()));
        record.set("make", Some("Ford".into()));
        record.set("price", Some(FieldValue::Integer(12_500)));
        for (key, value) in extra {
            record.set(*key, Some(value.clone()));
        }
        record
    }

    fn render(records: &[Record], include_detail: bool) -> String {
        let mut out = Vec::new();
        write_csv(&mut out, records, include_detail).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn escape_leaves_plain_cells_alone() {
        assert_eq!(escape("Corolla"), "Corolla");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn escape_quotes_special_characters() {
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn header_lists_base_columns_first() {
        let csv = render(&[record("R1", &[])], false);
        let header = csv.lines().next().unwrap();
        assert_eq!(header, BASE_COLUMNS.join(","));
    }

    #[test]
    fn absent_fields_render_as_empty_cells() {
        let csv = render(&[record("R1", &[])], false);
        let row: Vec<&str> = csv.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(row.len(), BASE_COLUMNS.len());
        assert_eq!(row[0], "R1");
        assert_eq!(row[1], "12500");
        assert_eq!(row[2], "", "price_unit absent");
    }

    #[test]
    fn detail_columns_follow_base_when_enriched() {
        let records = [record("R1", &[("bodyType", "Saloon".into())]), record("R2", &[])];
        let csv = render(&records, true);
        let header: Vec<&str> = csv.lines().next().unwrap().split(',').collect();
        assert_eq!(header[BASE_COLUMNS.len()], "bodyType");
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn quoted_description_survives() {
        let records = [record("R1", &[("description", "Low miles, \"mint\"".into())])];
        let csv = render(&records, true);
        assert!(csv.contains("\"Low miles, \"\"mint\"\"\""));
    }

    #[test]
    fn empty_result_set_writes_only_header() {
        let csv = render(&[], false);
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn writes_file_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv_file(&path, &[record("R9", &[])], false).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("R9"));
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(write_csv_file(&path, &[], false).is_err());
    }
}
