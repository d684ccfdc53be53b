use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::polyfit::PolynomialModel;

/// On-disk form of a fitted model
///
/// `terms` is redundant with `(nvars, max_degree)` and is checked against the
/// regenerated basis on load.
#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    nvars: usize,
    max_degree: u32,
    terms: Vec<Vec<u32>>,
    coefficients: Vec<f64>,
}

/// Reads a headerless numeric CSV table, one sample per row
///
/// Lines starting with `#` and blank lines are skipped. Every row must have the
/// same number of columns.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<DMatrix<f64>> {
    Ok(read_table_with_start(path.as_ref())?.0)
}

/// Reads a table and the 1-based line of its first record (0 when empty)
fn read_table_with_start(path: &Path) -> Result<(DMatrix<f64>, u64)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut values = Vec::new();
    let mut width = 0;
    let mut rows = 0;
    let mut first_line = 0;
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        if rows == 0 {
            first_line = line;
        }
        width = record.len();
        for cell in record.iter() {
            let value = cell.parse::<f64>().map_err(|e| Error::Parse {
                path: path.to_owned(),
                line,
                message: format!("{:?} is not a number: {}", cell, e),
            })?;
            values.push(value);
        }
        rows += 1;
    }

    Ok((DMatrix::from_row_slice(rows, width, &values), first_line))
}

/// Reads training samples; the last column holds the labels
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<(DMatrix<f64>, DVector<f64>)> {
    let path = path.as_ref();
    let (table, first_line) = read_table_with_start(path)?;
    if table.nrows() > 0 && table.ncols() < 2 {
        return Err(Error::Parse {
            path: path.to_owned(),
            line: first_line,
            message: format!(
                "expected at least one coordinate column and a label column, got {} column(s)",
                table.ncols()
            ),
        });
    }

    let nvars = table.ncols().saturating_sub(1);
    let samples = table.columns(0, nvars).into_owned();
    let labels = if table.ncols() > 0 {
        table.column(nvars).into_owned()
    } else {
        DVector::zeros(0)
    };
    Ok((samples, labels))
}

pub fn save_model<P: AsRef<Path>>(path: P, model: &PolynomialModel) -> Result<()> {
    let file = ModelFile {
        nvars: model.nvars(),
        max_degree: model.max_degree(),
        terms: model.basis().iter().map(|t| t.to_vec()).collect(),
        coefficients: model.coefficients().iter().copied().collect(),
    };
    fs::write(&path, serde_json::to_string_pretty(&file)?)?;
    info!("Saved model {}", path.as_ref().display());
    Ok(())
}

/// Loads a model saved by [`save_model`], rejecting files whose basis differs
/// from the one this crate generates for the same variable count and degree
pub fn load_model<P: AsRef<Path>>(path: P, max_terms: usize) -> Result<PolynomialModel> {
    let file: ModelFile = serde_json::from_str(&fs::read_to_string(path)?)?;
    let model =
        PolynomialModel::with_coefficients(file.nvars, file.max_degree, file.coefficients, max_terms)?;

    let matches = file.terms.len() == model.num_terms()
        && file
            .terms
            .iter()
            .zip(model.basis().iter())
            .all(|(stored, generated)| stored.as_slice() == generated);
    if !matches {
        return Err(Error::BasisMismatch {
            nvars: file.nvars,
            max_degree: file.max_degree,
        });
    }

    Ok(model)
}

/// Writes one prediction per line to `<path>.<suffix>.csv` and returns the output path
pub fn save_predictions(path: &str, suffix: &str, values: &DVector<f64>) -> Result<PathBuf> {
    let output_path = PathBuf::from(format!("{}.{}.csv", path, suffix));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&output_path)?;
    for value in values.iter() {
        writer.serialize(value)?;
    }
    writer.flush()?;

    info!("Saved {}", output_path.display());
    Ok(output_path)
}

pub fn read_dir_tables(dir: &str) -> std::io::Result<Vec<PathBuf>> {
    let path = Path::new(dir);

    if !path.is_dir() {
        return Ok(vec![]);
    }

    let mut table_paths: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|dir_entry| dir_entry.path())
        .filter(|path| has_table_extension(path))
        .collect();
    table_paths.sort();

    Ok(table_paths)
}

pub fn has_table_extension(path: &Path) -> bool {
    if path.is_file()
        && let Some(ext) = path.extension()
    {
        let ext = ext.to_ascii_lowercase();
        ["csv", "txt", "dat"].iter().any(|&known| ext == known)
    } else {
        false
    }
}
