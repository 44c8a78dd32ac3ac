//! CSV-backed listing storage

use crate::storage::traits::{ListingStore, StoreError, StoreResult};
use crate::storage::Listing;
use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An entire CSV file held in memory
///
/// Rows are padded to the header width, so every cell lookup is in bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Index of the named column
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of the named column, appending it with empty cells if absent
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column(name) {
            return index;
        }

        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn get(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.into();
        }
    }

    /// Value of a named cell, empty if the column does not exist
    pub fn value(&self, row: usize, name: &str) -> &str {
        self.column(name).map_or("", |column| self.get(row, column))
    }
}

/// Listing storage in a single CSV file
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file exists and is not empty
    pub fn exists(&self) -> bool {
        fs::metadata(&self.path).is_ok_and(|m| m.len() > 0)
    }

    /// Reads the whole file; a missing file reads as an empty table
    pub fn read_table(&self) -> StoreResult<CsvTable> {
        if !self.exists() {
            return Ok(CsvTable::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for record in reader.records() {
            let mut row: Vec<String> = record?.iter().map(str::to_string).collect();
            row.resize(width.max(row.len()), String::new());
            rows.push(row);
        }

        Ok(CsvTable { headers, rows })
    }

    /// Rewrites the whole file
    ///
    /// Writes to a sibling temporary file first and renames it into place, so an
    /// interrupted write leaves the previous contents intact.
    pub fn write_table(&self, table: &CsvTable) -> StoreResult<()> {
        self.create_parent_dir()?;
        let tmp_path = self.path.with_extension("csv.tmp");

        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&tmp_path)?;
            writer.write_record(&table.headers)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        debug!("Wrote {} rows to {}", table.rows.len(), self.path.display());
        Ok(())
    }

    /// Adds a column with empty values if the file lacks it
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - if the column was added
    pub fn ensure_column(&self, name: &str) -> StoreResult<bool> {
        let mut table = self.read_table()?;
        if table.headers.is_empty() || table.column(name).is_some() {
            return Ok(false);
        }

        table.ensure_column(name);
        self.write_table(&table)?;
        Ok(true)
    }

    fn create_parent_dir(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn existing_headers(&self) -> StoreResult<Option<Vec<String>>> {
        if !self.exists() {
            return Ok(None);
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        Ok(Some(headers))
    }

    fn require_column(&self, table: &CsvTable, name: &str) -> StoreResult<usize> {
        table.column(name).ok_or_else(|| StoreError::MissingColumn {
            column: name.to_string(),
            path: self.path.display().to_string(),
        })
    }
}

impl ListingStore for CsvStore {
    fn processed_ids(&self) -> StoreResult<HashSet<String>> {
        let table = self.read_table()?;
        let Some(id_column) = table.column("id") else {
            return Ok(HashSet::new());
        };

        Ok((0..table.rows.len())
            .map(|row| table.get(row, id_column).to_string())
            .filter(|id| !id.is_empty())
            .collect())
    }

    fn append(&mut self, listings: &[Listing]) -> StoreResult<()> {
        if listings.is_empty() {
            return Ok(());
        }

        self.create_parent_dir()?;
        let existing = self.existing_headers()?;
        let write_header = existing.is_none();
        let headers =
            existing.unwrap_or_else(|| Listing::HEADERS.iter().map(|h| h.to_string()).collect());

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(&headers)?;
        }
        for listing in listings {
            let record: Vec<String> = headers.iter().map(|h| listing.field(h)).collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;

        debug!("Appended {} listings to {}", listings.len(), self.path.display());
        Ok(())
    }

    fn missing_emails(&self) -> StoreResult<Vec<Listing>> {
        let table = self.read_table()?;
        if table.headers.is_empty() {
            return Ok(Vec::new());
        }
        self.require_column(&table, "id")?;

        Ok((0..table.rows.len())
            .filter(|&row| {
                !table.value(row, "website").trim().is_empty()
                    && table.value(row, "email").trim().is_empty()
            })
            .map(|row| Listing::from_row(&table, row))
            .collect())
    }

    fn update_emails(&mut self, emails: &HashMap<String, String>) -> StoreResult<usize> {
        if emails.is_empty() {
            return Ok(0);
        }

        let mut table = self.read_table()?;
        let id_column = self.require_column(&table, "id")?;
        let email_column = table.ensure_column("email");

        let mut changed = 0;
        for row in 0..table.rows.len() {
            let id = table.get(row, id_column).to_string();
            if let Some(email) = emails.get(&id) {
                table.set(row, email_column, email.as_str());
                changed += 1;
            }
        }

        self.write_table(&table)?;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listing(id: &str, website: Option<&str>, email: &str) -> Listing {
        Listing {
            id: id.to_string(),
            name: format!("Business {}", id),
            rating: Some(4.5),
            reviews: Some(120),
            address: "Via Roma 1, Firenze".to_string(),
            website: website.map(str::to_string),
            phone: "+39055123456".to_string(),
            search_term: "hotels in florence".to_string(),
            email: email.to_string(),
        }
    }

    fn store(dir: &TempDir) -> CsvStore {
        CsvStore::new(dir.path().join("results").join("hotels_in_florence.csv"))
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert!(!store.exists());
        assert_eq!(store.read_table().unwrap(), CsvTable::default());
        assert!(store.processed_ids().unwrap().is_empty());
        assert!(store.missing_emails().unwrap().is_empty());
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        store.append(&[listing("a", Some("a.com"), "")]).unwrap();
        store.append(&[listing("b", None, "")]).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "id,name,rating,reviews,address,website,phone,search_term,email"
        );
        assert!(lines[1].starts_with("a,Business a,4.5,120,"));
    }

    #[test]
    fn test_quoting_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        let mut tricky = listing("q", Some("q.com"), "a@q.com,b@q.com");
        tricky.name = "Bar \"Da Mario\", Firenze".to_string();
        store.append(&[tricky.clone()]).unwrap();

        let table = store.read_table().unwrap();
        assert_eq!(Listing::from_row(&table, 0), tricky);
    }

    #[test]
    fn test_append_follows_existing_columns() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        store.append(&[listing("a", Some("a.com"), "x@a.com")]).unwrap();
        assert!(store.ensure_column("valid_emails").unwrap());
        assert!(!store.ensure_column("valid_emails").unwrap());

        store.append(&[listing("b", Some("b.com"), "y@b.com")]).unwrap();

        let table = store.read_table().unwrap();
        assert_eq!(table.headers.len(), 10);
        assert_eq!(table.value(1, "email"), "y@b.com");
        assert_eq!(table.value(1, "valid_emails"), "");
    }

    #[test]
    fn test_processed_ids() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store
            .append(&[listing("a", None, ""), listing("b", None, "")])
            .unwrap();

        let ids = store.processed_ids().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("a") && ids.contains("b"));
    }

    #[test]
    fn test_missing_emails_and_update() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store
            .append(&[
                listing("a", Some("a.com"), ""),
                listing("b", Some("b.com"), "info@b.com"),
                listing("c", None, ""),
                listing("d", Some("d.com"), "  "),
            ])
            .unwrap();

        let missing: Vec<_> = store
            .missing_emails()
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(missing, vec!["a", "d"]);

        let mut updates = HashMap::new();
        updates.insert("a".to_string(), "sales@a.com".to_string());
        updates.insert("zz".to_string(), "nobody@zz.com".to_string());
        assert_eq!(store.update_emails(&updates).unwrap(), 1);

        let table = store.read_table().unwrap();
        assert_eq!(table.value(0, "email"), "sales@a.com");
        assert_eq!(table.value(1, "email"), "info@b.com");
        assert_eq!(table.rows.len(), 4);
    }

    #[test]
    fn test_update_adds_missing_email_column() {
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join("legacy.csv");
        fs::write(&store_path, "id,name,website\n1,Old Shop,old.com\n").unwrap();
        let mut store = CsvStore::new(&store_path);

        assert_eq!(store.missing_emails().unwrap().len(), 1);

        let mut updates = HashMap::new();
        updates.insert("1".to_string(), "shop@old.com".to_string());
        store.update_emails(&updates).unwrap();

        let table = store.read_table().unwrap();
        assert_eq!(table.headers, vec!["id", "name", "website", "email"]);
        assert_eq!(table.value(0, "email"), "shop@old.com");
    }

    #[test]
    fn test_missing_id_column() {
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join("broken.csv");
        fs::write(&store_path, "name,website\nShop,shop.com\n").unwrap();
        let store = CsvStore::new(&store_path);

        assert!(matches!(
            store.missing_emails(),
            Err(StoreError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join("ragged.csv");
        fs::write(&store_path, "id,website,email\n1,a.com\n").unwrap();
        let store = CsvStore::new(&store_path);

        let table = store.read_table().unwrap();
        assert_eq!(table.rows[0], vec!["1", "a.com", ""]);
    }
}
