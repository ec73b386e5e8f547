//! CSV table format: a header row followed by one row per record

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use serde::{de::DeserializeOwned, Serialize};

use super::TableFormat;
use crate::core::config::BackendKind;
use crate::core::error::StoreError;

#[derive(Debug, Clone, Copy, Default)]
pub struct Csv;

impl TableFormat for Csv {
    const EXTENSION: &'static str = "csv";
    const KIND: BackendKind = BackendKind::Csv;

    fn read_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>, StoreError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            rows.push(result?);
        }
        Ok(rows)
    }

    fn write_rows<R: Serialize>(path: &Path, _table: &str, rows: &[R]) -> Result<(), StoreError> {
        let mut wtr = WriterBuilder::new().has_headers(true).from_path(path)?;
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        note: String,
    }

    #[test]
    fn test_quoted_fields_survive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let rows = vec![Row {
            id: "1".to_string(),
            note: "comma, \"quote\"\nnewline".to_string(),
        }];

        Csv::write_rows(&path, "rows", &rows).unwrap();
        let back: Vec<Row> = Csv::read_rows(&path).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_empty_file_reads_as_no_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        Csv::write_rows::<Row>(&path, "rows", &[]).unwrap();

        let back: Vec<Row> = Csv::read_rows(&path).unwrap();
        assert!(back.is_empty());
    }
}
