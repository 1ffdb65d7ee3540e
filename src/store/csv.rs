//! a `BatchStore` adapted to comma-separated files

use super::BatchStore;
use crate::protocol::beaver::Triple;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Result as IOResult, Write};
use std::path::PathBuf;

/// writes one header row `a,b,c` and one decimal row per triple
/// # Example
/// ```no_run
/// use beaver::store::{csv::CsvStore, BatchStore};
/// let mut store = CsvStore::new("output/p1.csv");
/// store.save(&[]).unwrap();
/// ```
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> CsvStore {
        CsvStore { path: path.into() }
    }
}

impl BatchStore for CsvStore {
    fn save(&mut self, batch: &[Triple]) -> IOResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let mut file = BufWriter::new(File::create(&self.path)?);
        writeln!(file, "a,b,c")?;
        for triple in batch {
            writeln!(file, "{},{},{}", triple.a, triple.b, triple.c)?;
        }
        file.flush()
    }
}

#[test]
fn test_format() {
    let path = std::env::temp_dir().join("beaver_csv_store_test/p1.csv");
    let mut store = CsvStore::new(&path);
    store
        .save(&[
            Triple { a: 7, b: 3, c: 59 },
            Triple { a: 5, b: 9, c: 85 },
        ])
        .unwrap();
    assert_eq!(
        "a,b,c\n7,3,59\n5,9,85\n",
        std::fs::read_to_string(&path).unwrap()
    );
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}
