use crate::domain::model::{AddressId, SelectionRecord};
use crate::domain::ports::SelectionStore;
use crate::utils::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores each address' selections as a JSON array in `<base>/<address>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn path_for(&self, address: &AddressId) -> PathBuf {
        let file_name: String = address
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        Path::new(&self.base_path).join(format!("{}.json", file_name))
    }
}

impl SelectionStore for JsonFileStore {
    fn load(&self, address: &AddressId) -> Result<Vec<SelectionRecord>> {
        let path = self.path_for(address);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&data)?)
    }

    fn save(&self, address: &AddressId, records: &[SelectionRecord]) -> Result<()> {
        let path = self.path_for(address);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // 先寫入暫存檔再改名，避免讀到寫到一半的檔案
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(records)?)?;
        fs::rename(&tmp_path, &path)?;
        tracing::debug!("Wrote {} selections to {}", records.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::codes;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());

        let records = store.load(&AddressId::new("7")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));
        let address = AddressId::new("7");
        let records = vec![SelectionRecord::new(
            codes::PREFERRED_LOCATION,
            codes::FIELD_DETAILS,
            "Garage",
        )];

        store.save(&address, &records).unwrap();
        assert_eq!(store.load(&address).unwrap(), records);

        let raw = std::fs::read_to_string(store.path_for(&address)).unwrap();
        assert!(raw.contains("\"optionCode\": \"preferredLocation\""));
    }

    #[test]
    fn test_address_is_sanitized_into_file_name() {
        let store = JsonFileStore::new("/tmp/selections");
        let path = store.path_for(&AddressId::new("../quote 12"));
        assert_eq!(path, PathBuf::from("/tmp/selections/___quote_12.json"));
    }

    #[test]
    fn test_corrupt_file_is_a_persistence_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let address = AddressId::new("9");
        std::fs::write(store.path_for(&address), "{not json").unwrap();

        let err = store.load(&address).unwrap_err();
        assert_eq!(
            err.category(),
            crate::utils::error::ErrorCategory::Persistence
        );
    }
}
