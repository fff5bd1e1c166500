//! # CSV Export / Import
//!
//! Export writes an `ID` column followed by one column per exportable field,
//! headed by the field label. Import accepts headers matching either a field
//! name or its label; unknown columns are reported and skipped.

use csv::{ReaderBuilder, Trim, WriterBuilder};

use crate::backend::{Record, record_id, value_to_plain};
use crate::core::crud::CrudError;
use crate::core::form::FormValues;
use crate::core::model::ModelConfig;

pub fn to_csv(model: &ModelConfig, rows: &[Record]) -> Result<String, CrudError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header = vec!["ID".to_string()];
    header.extend(model.export_fields().map(|f| f.label.clone()));
    writer
        .write_record(&header)
        .map_err(|e| CrudError::Export(e.to_string()))?;

    for row in rows {
        let mut line = vec![record_id(row).unwrap_or_default()];
        line.extend(
            model
                .export_fields()
                .map(|f| row.get(&f.name).map(value_to_plain).unwrap_or_default()),
        );
        writer
            .write_record(&line)
            .map_err(|e| CrudError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CrudError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CrudError::Export(e.to_string()))
}

/// Rows of an import file, keyed by field name.
#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub rows: Vec<FormValues>,
    pub ignored_columns: Vec<String>,
}

pub fn parse_csv(model: &ModelConfig, text: &str) -> Result<ParsedCsv, CrudError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CrudError::Import(e.to_string()))?
        .clone();

    let mut ignored_columns = Vec::new();
    let columns: Vec<Option<String>> = headers
        .iter()
        .map(|header| {
            let field = model
                .fields
                .iter()
                .find(|f| f.name == header || f.label.eq_ignore_ascii_case(header));
            if field.is_none() && !header.eq_ignore_ascii_case("id") {
                ignored_columns.push(header.to_string());
            }
            field.map(|f| f.name.clone())
        })
        .collect();

    if columns.iter().all(Option::is_none) {
        return Err(CrudError::Import(format!(
            "no column matches a field of {}",
            model.name
        )));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| CrudError::Import(e.to_string()))?;
        let values = columns
            .iter()
            .zip(record.iter())
            .filter_map(|(column, value)| {
                column.as_ref().map(|name| (name.clone(), value.to_string()))
            })
            .collect();
        rows.push(values);
    }

    Ok(ParsedCsv {
        rows,
        ignored_columns,
    })
}
