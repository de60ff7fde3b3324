pub mod aggregate;
pub mod validate;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tunetally_parser::parse_track_table;

/// Reads and parses a track table. Any parse failure means there is nothing to chart.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let no_data = || format!("no data available in {}", path.display());
    let content = std::str::from_utf8(&bytes).with_context(no_data)?;
    parse_track_table(content).with_context(no_data)
}

#[cfg(test)]
pub(crate) fn sample_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../tunetally-parser/tests/data/tracks_sample.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_reports_no_data() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/empty.csv");
        let err = load_table(&path).unwrap_err();
        assert!(err.to_string().starts_with("no data available"), "{err}");
    }

    #[test]
    fn non_utf8_file_reports_no_data() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/latin1.csv");
        let err = load_table(&path).unwrap_err();
        assert!(err.to_string().starts_with("no data available"), "{err}");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_table(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(err.to_string().starts_with("failed to read"), "{err}");
    }

    #[test]
    fn sample_loads() {
        let df = load_table(&sample_path()).expect("sample parses");
        assert_eq!(df.height(), 4);
    }
}
