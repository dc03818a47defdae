//! Table-oriented record store mirrored to a JSON file.
//!
//! All tables live in memory. Every successful insert, update or delete
//! serializes the whole store and hands the snapshot to a background
//! [`Writer`](writer::Writer), which rewrites the backing file. Reads never
//! wait on disk, and the in-memory view is always at least as new as the
//! file. Call [`Store::flush`] to wait for queued writes.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use writer::Writer;

pub mod writer;

/// Tables by name, each an ordered list of records.
pub type Tables = BTreeMap<String, Vec<Record>>;

/// Field name to searched substring; a record matches if any field does.
pub type Filter = HashMap<String, String>;

/// A schema-less record. The `id` field is reserved for the record's
/// identifier, always a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }
    pub fn with<V: Into<Value>>(mut self, field: &str, value: V) -> Self {
        self.insert(field, value);
        self
    }
    pub fn insert<V: Into<Value>>(&mut self, field: &str, value: V) {
        self.0.insert(field.to_string(), value.into());
    }
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
    /// The record's id, if it has a string `id` field.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Whether any filter field, compared case-insensitively, contains the
    /// filter value. Missing fields and non-scalar values never match.
    pub fn matches(&self, filter: &Filter) -> bool {
        filter.iter().any(|(field, needle)| {
            let needle = needle.to_lowercase();
            match self.0.get(field) {
                Some(Value::String(s)) => s.to_lowercase().contains(&needle),
                Some(v @ Value::Number(_)) | Some(v @ Value::Bool(_)) => {
                    v.to_string().contains(&needle)
                }
                _ => false,
            }
        })
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Json(serde_json::Error),
    WriterGone,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Io(e) => write!(f, "store I/O error: {}", e),
            Self::Json(e) => write!(f, "store serialization error: {}", e),
            Self::WriterGone => write!(f, "store writer has stopped"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::WriterGone => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// The record store. Share it between handlers with an `Arc`.
///
/// # Example
/// ```
/// use barehttp::store::{Filter, Record, Store};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = Store::open(dir.path().join("db.json")).unwrap();
///
/// store.insert("users", Record::new().with("id", "1").with("name", "Ann"));
/// store.insert("users", Record::new().with("id", "2").with("name", "Bob"));
///
/// let mut filter = Filter::new();
/// filter.insert("name".to_string(), "an".to_string());
/// let found = store.select("users", Some(&filter));
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].id(), Some("1"));
///
/// store.flush().unwrap();
/// ```
pub struct Store {
    tables: Mutex<Tables>,
    writer: Writer,
}

impl Store {
    /// Open the store backed by `path`. An existing file is loaded; a
    /// missing or unreadable one is replaced by an empty store, which is
    /// written out right away.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let (tables, fresh) = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Tables>(&bytes) {
                Ok(tables) => {
                    info!("loaded {} table(s) from {}", tables.len(), path.display());
                    (tables, false)
                }
                Err(e) => {
                    warn!("{} is not a valid store, starting empty: {}", path.display(), e);
                    (Tables::new(), true)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("creating new store at {}", path.display());
                (Tables::new(), true)
            }
            Err(e) => return Err(e.into()),
        };
        let store = Self {
            tables: Mutex::new(tables),
            writer: Writer::spawn(path)?,
        };
        if fresh {
            store.persist(&store.lock());
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a snapshot of `tables`. Called with the lock held so that
    /// snapshots reach the writer in mutation order.
    fn persist(&self, tables: &Tables) {
        let snapshot = match serde_json::to_vec_pretty(tables) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("failed to serialize store: {}", e);
                return;
            }
        };
        if let Err(e) = self.writer.write(snapshot) {
            error!("failed to queue store snapshot: {}", e);
        }
    }

    /// Records of `table`, all of them or only those matching `filter`.
    /// A table that was never created is empty.
    pub fn select(&self, table: &str, filter: Option<&Filter>) -> Vec<Record> {
        let tables = self.lock();
        let rows = match tables.get(table) {
            Some(rows) => rows,
            None => return vec![],
        };
        match filter {
            Some(filter) => rows.iter().filter(|r| r.matches(filter)).cloned().collect(),
            None => rows.clone(),
        }
    }

    /// Append `record` to `table`, creating the table if needed. The
    /// caller provides the record's id.
    pub fn insert(&self, table: &str, record: Record) -> Record {
        let mut tables = self.lock();
        tables
            .entry(table.to_string())
            .or_insert_with(Vec::new)
            .push(record.clone());
        self.persist(&tables);
        debug!("inserted {:?} into {}", record.id(), table);
        record
    }

    /// Replace the first record with the given id by `fields` plus that
    /// id. Fields of the old record are not kept, and an `id` in `fields`
    /// is ignored. Returns false, changing nothing, if there is no such
    /// record.
    pub fn update(&self, table: &str, id: &str, fields: Record) -> bool {
        let mut tables = self.lock();
        let row = match tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| r.id() == Some(id)))
        {
            Some(row) => row,
            None => return false,
        };
        let mut record = Record::new().with("id", id);
        for (field, value) in fields.0 {
            if field != "id" {
                record.0.insert(field, value);
            }
        }
        *row = record;
        self.persist(&tables);
        true
    }

    /// Remove the first record with the given id. Returns false if there
    /// is no such record.
    pub fn delete(&self, table: &str, id: &str) -> bool {
        let mut tables = self.lock();
        let rows = match tables.get_mut(table) {
            Some(rows) => rows,
            None => return false,
        };
        match rows.iter().position(|r| r.id() == Some(id)) {
            Some(i) => {
                rows.remove(i);
                self.persist(&tables);
                true
            }
            None => false,
        }
    }

    /// Copy of the current in-memory contents.
    pub fn snapshot(&self) -> Tables {
        self.lock().clone()
    }

    /// Block until all queued snapshots are on disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn user(id: &str, name: &str, email: &str) -> Record {
        Record::new()
            .with("id", id)
            .with("name", name)
            .with("email", email)
    }

    fn filter(pairs: &[(&str, &str)]) -> Filter {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn open() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("db.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_file() {
        let (dir, store) = open();
        store.flush().unwrap();
        let contents = fs::read_to_string(dir.path().join("db.json")).unwrap();
        assert_eq!(contents, "{}");
        assert_eq!(store.path(), dir.path().join("db.json"));
    }

    #[test]
    fn test_open_loads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, r#"{"users": [{"id": "1", "name": "Ann"}]}"#).unwrap();
        let store = Store::open(&path).unwrap();
        assert_eq!(store.select("users", None), vec![Record::new().with("id", "1").with("name", "Ann")]);
    }

    #[test]
    fn test_open_replaces_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "not json").unwrap();
        let store = Store::open(&path).unwrap();
        store.flush().unwrap();
        assert!(store.snapshot().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_select_missing_table() {
        let (_dir, store) = open();
        assert!(store.select("nothing", None).is_empty());
        assert!(store.select("nothing", Some(&filter(&[("name", "a")]))).is_empty());
    }

    #[test]
    fn test_insert_then_select() {
        let (_dir, store) = open();
        let ann = user("1", "Ann", "ann@example.com");
        let stored = store.insert("users", ann.clone());
        assert_eq!(stored, ann);
        assert_eq!(store.select("users", None), vec![ann]);
    }

    #[test]
    fn test_insert_keeps_order_and_duplicates() {
        let (_dir, store) = open();
        store.insert("users", user("1", "Ann", "a"));
        store.insert("users", user("2", "Bob", "b"));
        store.insert("users", user("1", "Ann", "a"));
        let ids: Vec<_> = store
            .select("users", None)
            .iter()
            .map(|r| r.id().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2", "1"]);
    }

    #[test]
    fn test_filter_case_insensitive_substring() {
        let (_dir, store) = open();
        store.insert("users", Record::new().with("name", "Ann"));
        store.insert("users", Record::new().with("name", "Bob"));
        let found = store.select("users", Some(&filter(&[("name", "an")])));
        assert_eq!(found, vec![Record::new().with("name", "Ann")]);
        let found = store.select("users", Some(&filter(&[("name", "BO")])));
        assert_eq!(found, vec![Record::new().with("name", "Bob")]);
    }

    #[test]
    fn test_filter_any_field() {
        let (_dir, store) = open();
        store.insert("users", user("1", "Ann", "ann@example.com"));
        store.insert("users", user("2", "Bob", "bob@test.org"));
        let found = store.select("users", Some(&filter(&[("name", "test"), ("email", "test")])));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), Some("2"));
    }

    #[test]
    fn test_filter_skips_missing_fields() {
        let (_dir, store) = open();
        store.insert("users", Record::new().with("id", "1"));
        store.insert("users", user("2", "Ann", "a"));
        let found = store.select("users", Some(&filter(&[("name", "ann")])));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), Some("2"));
    }

    #[test]
    fn test_filter_scalars() {
        let record = Record::new()
            .with("age", 42)
            .with("admin", true)
            .with("tags", json!(["x"]));
        assert!(record.matches(&filter(&[("age", "4")])));
        assert!(record.matches(&filter(&[("admin", "TRUE")])));
        assert!(!record.matches(&filter(&[("tags", "x")])));
        assert!(!record.matches(&Filter::new()));
    }

    #[test]
    fn test_update_replaces_whole_record() {
        let (_dir, store) = open();
        store.insert("users", Record::new().with("id", "1").with("name", "Old").with("email", "e"));
        assert!(store.update("users", "1", Record::new().with("name", "A")));
        assert_eq!(
            store.select("users", None),
            vec![Record::new().with("id", "1").with("name", "A")]
        );
    }

    #[test]
    fn test_update_keeps_id() {
        let (_dir, store) = open();
        store.insert("users", user("1", "Ann", "a"));
        assert!(store.update("users", "1", Record::new().with("id", "9").with("name", "B")));
        assert_eq!(store.select("users", None)[0].id(), Some("1"));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let (_dir, store) = open();
        store.insert("users", user("1", "Ann", "a"));
        let before = store.snapshot();
        assert!(!store.update("users", "2", Record::new().with("name", "B")));
        assert!(!store.update("nothing", "1", Record::new()));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_ids_are_strings() {
        let (_dir, store) = open();
        store.insert("users", Record::new().with("id", 1).with("name", "Ann"));
        assert!(!store.update("users", "1", Record::new()));
        assert!(!store.delete("users", "1"));
        assert_eq!(store.select("users", None).len(), 1);
    }

    #[test]
    fn test_delete_removes_first_match() {
        let (_dir, store) = open();
        store.insert("users", user("1", "Ann", "a"));
        store.insert("users", user("2", "Bob", "b"));
        store.insert("users", user("1", "Ann again", "c"));
        assert!(store.delete("users", "1"));
        let rows = store.select("users", None);
        assert_eq!(rows, vec![user("2", "Bob", "b"), user("1", "Ann again", "c")]);
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let (_dir, store) = open();
        store.insert("users", user("1", "Ann", "a"));
        assert!(store.delete("users", "1"));
        let before = store.snapshot();
        assert!(!store.delete("users", "1"));
        assert!(!store.delete("nothing", "1"));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_persisted_state_converges() {
        let (dir, store) = open();
        for i in 0..50 {
            let id = i.to_string();
            store.insert("users", user(&id, "Ann", "a"));
            if i % 3 == 0 {
                store.update("users", &id, Record::new().with("name", "Bob"));
            }
            if i % 5 == 0 {
                store.delete("users", &id);
            }
        }
        store.insert("posts", Record::new().with("id", "p1"));
        store.flush().unwrap();
        let expected = store.snapshot();
        drop(store);

        let reopened = Store::open(dir.path().join("db.json")).unwrap();
        assert_eq!(reopened.snapshot(), expected);
    }

    #[test]
    fn test_concurrent_writers() {
        let (dir, store) = open();
        let store = std::sync::Arc::new(store);
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let id = format!("{}-{}", t, i);
                        store.insert("users", user(&id, "Ann", "a"));
                        if i % 2 == 0 {
                            assert!(store.update("users", &id, Record::new().with("name", "Bob")));
                        }
                        if i % 5 == 0 {
                            assert!(store.delete("users", &id));
                        }
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let users = store.select("users", None);
        assert_eq!(users.len(), 8 * 20);
        for t in 0..8 {
            for i in 0..25 {
                let id = format!("{}-{}", t, i);
                let found: Vec<&Record> = users.iter().filter(|r| r.id() == Some(&id[..])).collect();
                match (i % 5, i % 2) {
                    (0, _) => assert!(found.is_empty()),
                    (_, 0) => assert_eq!(found, vec![&Record::new().with("id", id.as_str()).with("name", "Bob")]),
                    _ => assert_eq!(found, vec![&user(&id, "Ann", "a")]),
                }
            }
        }

        store.flush().unwrap();
        let expected = store.snapshot();
        drop(store);
        let reopened = Store::open(dir.path().join("db.json")).unwrap();
        assert_eq!(reopened.snapshot(), expected);
    }

    #[test]
    fn test_file_layout() {
        let (dir, store) = open();
        store.insert("users", user("1", "Ann", "a"));
        store.flush().unwrap();
        let contents = fs::read_to_string(dir.path().join("db.json")).unwrap();
        let value: Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value, json!({"users": [{"id": "1", "name": "Ann", "email": "a"}]}));
        assert!(contents.contains("\n  \"users\""));
    }

    #[test]
    fn test_flush_reports_write_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("missing").join("db.json")).unwrap();
        match store.flush() {
            Err(StoreError::Io(_)) => (),
            other => panic!("expected I/O error, got {:?}", other),
        }
        assert!(store.flush().is_ok());
    }
}
