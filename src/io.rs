//! Delimited-text reading and writing of [`Table`]s

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::{Error, Result};
use crate::types::{Column, Table, Value};

/// Single delimiter for every file the pipeline reads or writes.
pub const DELIMITER: u8 = b',';

pub fn read_table(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let table = parse_table(file, &path.display().to_string())?;
    tracing::info!(
        "Read {}: rows={}, columns={}",
        path.display(),
        table.n_rows(),
        table.n_cols()
    );
    Ok(table)
}

/// Parses delimited text with a header row. `source` names the input in errors.
pub fn parse_table<R: Read>(reader: R, source: &str) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| csv_error(source, e))?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(Error::parse(source, "input is empty, expected a header row"));
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record.map_err(|e| csv_error(source, e))?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let columns = headers
        .iter()
        .zip(cells)
        .map(|(name, raw)| infer_column(name, raw))
        .collect();
    Table::from_columns(columns)
}

/// Integer if every non-empty cell is an integer, float if every one is a
/// number, text otherwise. Empty cells are null.
fn infer_column(name: &str, raw: Vec<String>) -> Column {
    let mut present = raw.iter().filter(|s| !s.is_empty());
    let values = if present.clone().all(|s| s.parse::<i64>().is_ok()) {
        raw.iter()
            .map(|s| s.parse::<i64>().map_or(Value::Null, Value::Int))
            .collect()
    } else if present.all(|s| s.parse::<f64>().is_ok()) {
        raw.iter()
            .map(|s| {
                s.parse::<f64>()
                    .ok()
                    .filter(|v| !v.is_nan())
                    .map_or(Value::Null, Value::Float)
            })
            .collect()
    } else {
        raw.into_iter()
            .map(|s| if s.is_empty() { Value::Null } else { Value::Text(s) })
            .collect()
    };
    Column::new(name, values)
}

fn csv_error(source: &str, err: csv::Error) -> Error {
    let location = match err.position() {
        Some(pos) => format!("{source} line {}", pos.line()),
        None => source.to_string(),
    };
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => Error::io(Path::new(source), e),
        _ => Error::parse(location, message),
    }
}

/// Writes `table` to `path` atomically; nothing is written if encoding fails.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let bytes = encode_table(table, path)?;
    write_atomic(path, &bytes)?;
    tracing::info!(
        "Wrote {}: rows={}, columns={}",
        path.display(),
        table.n_rows(),
        table.n_cols()
    );
    Ok(())
}

fn encode_table(table: &Table, path: &Path) -> Result<Vec<u8>> {
    let mut wtr = WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(Vec::new());
    wtr.write_record(table.column_names())
        .map_err(|e| csv_error(&path.display().to_string(), e))?;
    for idx in 0..table.n_rows() {
        wtr.write_record(table.row(idx).iter().map(|v| v.to_string()))
            .map_err(|e| csv_error(&path.display().to_string(), e))?;
    }
    wtr.into_inner()
        .map_err(|e| Error::io(path, e.into_error()))
}

/// Writes to a sibling temporary file, then renames it over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        Error::io(path, e)
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
