//! XML table format
//!
//! ```xml
//! <tasks>
//!   <record>
//!     <id>...</id>
//!     ...
//!   </record>
//! </tasks>
//! ```

use std::fs;
use std::path::Path;

use quick_xml::se::Serializer;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::TableFormat;
use crate::core::config::BackendKind;
use crate::core::error::StoreError;

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

#[derive(Debug, Clone, Copy, Default)]
pub struct Xml;

#[derive(Deserialize)]
struct Table<R> {
    #[serde(rename = "record", default = "Vec::new")]
    records: Vec<R>,
}

#[derive(Serialize)]
struct TableRef<'a, R> {
    #[serde(rename = "record")]
    records: &'a [R],
}

impl TableFormat for Xml {
    const EXTENSION: &'static str = "xml";
    const KIND: BackendKind = BackendKind::Xml;

    fn read_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>, StoreError> {
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let table: Table<R> = quick_xml::de::from_str(&text)?;
        Ok(table.records)
    }

    fn write_rows<R: Serialize>(path: &Path, table: &str, rows: &[R]) -> Result<(), StoreError> {
        let mut out = String::from(DECLARATION);
        let mut ser = Serializer::with_root(&mut out, Some(table))?;
        ser.indent(' ', 2);
        TableRef { records: rows }.serialize(ser)?;
        out.push('\n');
        fs::write(path, out)?;
        Ok(())
    }
}
