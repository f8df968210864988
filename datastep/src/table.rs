//! In-memory tables loaded from and written to CSV.

use std::{
    fs,
    io::{Read, Write},
    path::Path,
};

use crate::common::*;

/// A table with named columns and ordered rows.
///
/// Cells keep the exact text that we read, so loading and re-writing a table
/// may change CSV quoting but never values. We don't infer or enforce a schema.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from headers and rows. Every row must have one cell per
    /// header.
    pub(crate) fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(format_err!(
                    "row {} has {} cells, but there are {} columns",
                    idx + 1,
                    row.len(),
                    headers.len(),
                ));
            }
        }
        Ok(Table { headers, rows })
    }

    /// Read a CSV file with a header row.
    pub(crate) fn read_csv_path(path: &Path) -> Result<Self> {
        let f = fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        Self::read_csv(f).with_context(|| format!("cannot read CSV {}", path.display()))
    }

    /// Read CSV data with a header row.
    pub(crate) fn read_csv<R: Read>(rdr: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(rdr);
        let headers = rdr
            .headers()
            .context("cannot read CSV header")?
            .iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if headers.is_empty() {
            return Err(format_err!("CSV data is empty, expected a header row"));
        }
        let mut rows = vec![];
        for record in rdr.records() {
            let record = record.context("cannot read CSV row")?;
            rows.push(record.iter().map(str::to_owned).collect());
        }
        trace!("read {} columns and {} rows", headers.len(), rows.len());
        Self::new(headers, rows)
    }

    /// Our column names, in order.
    #[cfg(test)]
    pub(crate) fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Our rows, in order.
    #[cfg(test)]
    pub(crate) fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The number of rows, not counting the header.
    pub(crate) fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The number of columns.
    pub(crate) fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Set every cell of column `name` to `value`. If there's already a column
    /// named `name`, we overwrite it in place; otherwise we append it.
    pub(crate) fn set_constant_column(&mut self, name: &str, value: &str) {
        match self.headers.iter().position(|h| h == name) {
            Some(idx) => {
                debug!("overwriting existing column {:?}", name);
                for row in &mut self.rows {
                    row[idx] = value.to_owned();
                }
            }
            None => {
                self.headers.push(name.to_owned());
                for row in &mut self.rows {
                    row.push(value.to_owned());
                }
            }
        }
    }

    /// Write this table as CSV with a header row and no index column.
    pub(crate) fn write_csv<W: Write>(&self, wtr: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(wtr);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write this table to `path`, replacing any existing file.
    ///
    /// We write to a temporary file in the same directory and rename it into
    /// place, so readers never see a half-written file at `path`. The file
    /// gets the same permissions as any newly created file, subject to the
    /// umask, so that other users of a shared output mount can read it.
    pub(crate) fn write_csv_path(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut builder = tempfile::Builder::new();
        builder.prefix(".datastep-");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let tmp = builder
            .tempfile_in(dir)
            .with_context(|| format!("cannot create temporary file in {}", dir.display()))?;
        self.write_csv(tmp.as_file())
            .with_context(|| format!("error writing CSV for {}", path.display()))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("error writing CSV for {}", path.display()))?;
        tmp.persist(path)
            .with_context(|| format!("cannot move CSV into place at {}", path.display()))?;
        debug!("wrote {} rows to {}", self.row_count(), path.display());
        Ok(())
    }
}
