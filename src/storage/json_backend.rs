use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use tracing::{debug, info};
use uuid::Uuid;

use super::{LedgerStore, Result, StoreDocument, STORE_SCHEMA_VERSION};
use crate::{
    errors::LedgerError,
    ledger::{FlowRole, OneOffEntry, OpeningBalance, RecurringDefinition},
};

pub const STORE_FILE_NAME: &str = "cashflow.json";
const TMP_SUFFIX: &str = "tmp";

/// Single-document JSON store. Every write stages to a temp file and renames it
/// over the original, so a crash never leaves a half-written document.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        Ok(Self { path })
    }

    /// Store living at `<dir>/cashflow.json`.
    pub fn in_dir(dir: &Path) -> Result<Self> {
        Self::new(dir.join(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_document(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::new());
        }
        let data = fs::read_to_string(&self.path)?;
        let document: StoreDocument = serde_json::from_str(&data)?;
        if document.schema_version > STORE_SCHEMA_VERSION {
            return Err(LedgerError::Storage(format!(
                "store `{}` is from a newer schema version",
                self.path.display()
            )));
        }
        Ok(document)
    }

    pub fn save_document(&self, document: &StoreDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "store written");
        Ok(())
    }

    fn modify<T>(&self, change: impl FnOnce(&mut StoreDocument) -> T) -> Result<T> {
        let mut document = self.load_document()?;
        let outcome = change(&mut document);
        self.save_document(&document)?;
        Ok(outcome)
    }
}

impl LedgerStore for JsonStore {
    fn list_income_definitions(&self) -> Result<Vec<RecurringDefinition>> {
        Ok(self.load_document()?.income_sources)
    }

    fn list_bill_definitions(&self) -> Result<Vec<RecurringDefinition>> {
        Ok(self.load_document()?.bills)
    }

    fn list_one_off_entries(&self) -> Result<Vec<OneOffEntry>> {
        Ok(self.load_document()?.misc_spending)
    }

    fn get_opening_balance(&self) -> Result<Option<OpeningBalance>> {
        Ok(self.load_document()?.opening)
    }

    fn set_opening_balance(&self, opening: OpeningBalance) -> Result<()> {
        self.modify(|document| document.opening = Some(opening))
    }

    fn upsert_definition(&self, role: FlowRole, definition: &RecurringDefinition) -> Result<()> {
        info!(%role, definition = %definition.id, "upserting definition");
        self.modify(|document| document.upsert_definition(role, definition))
    }

    fn delete_definition(&self, id: Uuid) -> Result<bool> {
        info!(definition = %id, "deleting definition");
        self.modify(|document| document.delete_definition(id))
    }

    fn insert_one_off(&self, entry: &OneOffEntry) -> Result<()> {
        self.modify(|document| document.insert_one_off(entry))
    }

    fn delete_one_off(&self, id: Uuid) -> Result<bool> {
        self.modify(|document| document.delete_one_off(id))
    }
}

pub(crate) fn ensure_dir(path: &Path) -> Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Schedule;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn store_with_temp_dir() -> (JsonStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonStore::in_dir(&temp.path().join("data")).expect("json store");
        (store, temp)
    }

    #[test]
    fn missing_file_reads_as_empty_store() {
        let (store, _guard) = store_with_temp_dir();
        assert!(store.list_bill_definitions().unwrap().is_empty());
        assert_eq!(store.get_opening_balance().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn upsert_replaces_and_moves_between_roles() {
        let (store, _guard) = store_with_temp_dir();
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut def =
            RecurringDefinition::new(Uuid::from_u128(3), "Side gig", 1_000, Schedule::Weekly, start);
        store.upsert_definition(FlowRole::Bill, &def).unwrap();
        def.amount = 2_000;
        store.upsert_definition(FlowRole::Income, &def).unwrap();

        assert!(store.list_bill_definitions().unwrap().is_empty());
        let incomes = store.list_income_definitions().unwrap();
        assert_eq!(incomes, vec![def.clone()]);
        assert!(store.delete_definition(def.id).unwrap());
        assert!(!store.delete_definition(def.id).unwrap());
        assert!(!tmp_path(store.path()).exists());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let (store, _guard) = store_with_temp_dir();
        let document = StoreDocument {
            schema_version: STORE_SCHEMA_VERSION + 1,
            ..StoreDocument::new()
        };
        store.save_document(&document).unwrap();
        let err = store.load_document().unwrap_err();
        assert!(matches!(err, LedgerError::Storage(message) if message.contains("newer")));
    }
}
