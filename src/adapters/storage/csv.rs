//! CSV codec for export objects and delta artifacts
//!
//! Exports arrive as CSV, usually gzipped. Parsing produces [`RawRow`]s
//! with field order intact; serialization takes the header from the first
//! record's field names and quotes only values that need it (comma or
//! double quote, internal quotes doubled).

use crate::domain::{RawRow, StorageError};
use flate2::read::GzDecoder;
use std::io::Read;

/// Parse an object's bytes into raw rows
///
/// Objects whose key ends in `.gz` are gunzipped first. The first CSV line
/// is the header; every following line becomes one row with that header's
/// field names.
///
/// # Errors
///
/// Returns [`StorageError::Decompression`] for corrupt gzip data and
/// [`StorageError::CsvParse`] for malformed CSV. Both are fatal to the
/// current run.
pub fn parse_rows(bytes: &[u8], key: &str) -> Result<Vec<RawRow>, StorageError> {
    let decompressed;
    let content: &[u8] = if key.ends_with(".gz") {
        decompressed = gunzip(bytes, key)?;
        &decompressed
    } else {
        bytes
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|e| StorageError::CsvParse(e.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| StorageError::CsvParse(e.to_string()))?;
        rows.push(RawRow::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .map(|(name, value)| (name.to_string(), value.to_string())),
        ));
    }

    tracing::debug!(key, rows = rows.len(), "Parsed CSV object");
    Ok(rows)
}

/// Serialize rows into CSV text
///
/// The header comes from the first row's field names in their original
/// order; rows missing a field emit an empty value there. Returns an empty
/// string for an empty slice.
///
/// # Errors
///
/// Returns [`StorageError::CsvParse`] when serialization fails.
pub fn write_rows(rows: &[RawRow]) -> Result<String, StorageError> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };

    let headers: Vec<&str> = first.field_names().collect();
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(&headers)
        .map_err(|e| StorageError::CsvParse(e.to_string()))?;

    for row in rows {
        let values: Vec<&str> = headers
            .iter()
            .map(|name| row.get(name).unwrap_or(""))
            .collect();
        writer
            .write_record(&values)
            .map_err(|e| StorageError::CsvParse(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StorageError::CsvParse(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StorageError::CsvParse(e.to_string()))
}

fn gunzip(bytes: &[u8], key: &str) -> Result<Vec<u8>, StorageError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| StorageError::Decompression {
            key: key.to_string(),
            message: e.to_string(),
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(content: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_parse_plain_csv() {
        let content = "profile.identity,eventProps.Product ID\nu1,p1\nu2,p2\n";
        let rows = parse_rows(content.as_bytes(), "export.csv").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("profile.identity"), Some("u1"));
        assert_eq!(rows[1].get("eventProps.Product ID"), Some("p2"));
    }

    #[test]
    fn test_parse_gzipped_csv() {
        let content = "profile.identity,eventProps.Product ID\nu1,p1\n";
        let rows = parse_rows(&gzip(content), "export-20250604-001.csv.gz").unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("eventProps.Product ID"), Some("p1"));
    }

    #[test]
    fn test_parse_corrupt_gzip_fails() {
        let err = parse_rows(b"definitely not gzip", "export.csv.gz").unwrap_err();
        assert!(matches!(err, StorageError::Decompression { .. }));
    }

    #[test]
    fn test_parse_quoted_values() {
        let content = "a,b\n\"hello, world\",\"say \"\"hi\"\"\"\n";
        let rows = parse_rows(content.as_bytes(), "x.csv").unwrap();

        assert_eq!(rows[0].get("a"), Some("hello, world"));
        assert_eq!(rows[0].get("b"), Some("say \"hi\""));
    }

    #[test]
    fn test_write_rows_header_from_first_record() {
        let rows = vec![
            RawRow::from_pairs([("b", "2"), ("a", "1")]),
            RawRow::from_pairs([("a", "3"), ("b", "4")]),
        ];

        let csv = write_rows(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("b,a"));
        assert_eq!(lines.next(), Some("2,1"));
        assert_eq!(lines.next(), Some("4,3"));
    }

    #[test]
    fn test_write_rows_quotes_only_when_needed() {
        let rows = vec![RawRow::from_pairs([
            ("plain", "value"),
            ("comma", "a,b"),
            ("quote", "say \"hi\""),
        ])];

        let csv = write_rows(&rows).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        assert_eq!(data_line, "value,\"a,b\",\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_rows_missing_fields_emit_empty() {
        let rows = vec![
            RawRow::from_pairs([("a", "1"), ("b", "2")]),
            RawRow::from_pairs([("a", "3")]),
        ];

        let csv = write_rows(&rows).unwrap();
        assert_eq!(csv.lines().nth(2), Some("3,"));
    }

    #[test]
    fn test_write_rows_empty_input() {
        assert_eq!(write_rows(&[]).unwrap(), "");
    }

    #[test]
    fn test_round_trip_preserves_rows() {
        let rows = vec![RawRow::from_pairs([
            ("profile.identity", "u1"),
            ("eventProps.Items", r#"[{"product_id": "p1"}]"#),
        ])];

        let csv = write_rows(&rows).unwrap();
        let parsed = parse_rows(csv.as_bytes(), "delta.csv").unwrap();
        assert_eq!(parsed, rows);
    }
}
