//! Reads point sets from CSV files
//!
//! One point per line, comma separated. A first line that does not parse as numbers is taken to
//! be a header and skipped. Every row must have the same number of fields.

use glob::glob;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::dataset::Dataset;
use crate::error::Error;

fn parse_row(line: &str) -> Option<Vec<f64>> {
    line.split(',').map(|x| x.trim().parse::<f64>().ok()).collect()
}

/// Appends the rows of `filename` to `columns`.
fn read_rows<P: AsRef<Path>>(filename: P, columns: &mut Vec<Vec<f64>>) -> Result<(), Error> {

    let filename = filename.as_ref();
    let lines = BufReader::new(File::open(filename)?).lines();

    for (line_number, line) in lines.enumerate() {
        let line = line?;

        if line.trim().is_empty() {
            continue;
        }

        let row = match parse_row(&line) {
            Some(x) => x,
            None if line_number == 0 => {
                debug!("skipping header of {}", filename.display());
                continue;
            }
            None => {
                return Err(Error::InvalidArgument(format!(
                    "{}:{}: not a row of numbers",
                    filename.display(),
                    line_number + 1
                )))
            }
        };

        if let Some(first) = columns.first() {
            if first.len() != row.len() {
                return Err(Error::InvalidArgument(format!(
                    "{}:{}: {} fields, expected {}",
                    filename.display(),
                    line_number + 1,
                    row.len(),
                    first.len()
                )));
            }
        }

        columns.push(row);
    }

    Ok(())
}

pub fn read_csv<P: AsRef<Path>>(filename: P) -> Result<Dataset, Error> {

    let mut columns: Vec<Vec<f64>> = Vec::new();
    read_rows(filename, &mut columns)?;

    Dataset::from_columns(&columns)
}

/// Files matching `pattern`, sorted.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, Error> {

    let paths = glob(pattern).map_err(|e| Error::InvalidArgument(format!("bad pattern {}: {}", pattern, e)))?;

    let mut filenames: Vec<PathBuf> = Vec::new();
    for path in paths {
        filenames.push(path.map_err(|e| Error::Io(e.to_string()))?);
    }
    filenames.sort();

    if filenames.is_empty() {
        return Err(Error::InvalidArgument(format!("no files match {}", pattern)));
    }

    Ok(filenames)
}

/// Reads every file in `filenames` into one dataset, in order. `progress` is called after each
/// file.
pub fn read_csv_files<F: FnMut(&Path)>(filenames: &[PathBuf], mut progress: F) -> Result<Dataset, Error> {

    let mut columns: Vec<Vec<f64>> = Vec::new();
    for filename in filenames {
        read_rows(filename, &mut columns)?;
        progress(filename);
    }

    Dataset::from_columns(&columns)
}

pub fn read_csv_glob(pattern: &str) -> Result<Dataset, Error> {
    read_csv_files(&expand_glob(pattern)?, |_| {})
}
