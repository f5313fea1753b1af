use crate::error::DeskError;
use crate::service::cipher::ContentCipher;
use serde::Serialize;
use std::collections::HashMap;

/// One stored value. `content` is ciphertext when `is_confidential`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub content: String,
    pub is_confidential: bool,
}

/// Size of one record, as shown in usage reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySize {
    pub key: String,
    pub bytes: usize,
    pub is_confidential: bool,
}

/// Flat `key -> value` map with transparent encryption of confidential values.
pub struct MemoryStore {
    cipher: ContentCipher,
    entries: HashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new(cipher: ContentCipher) -> Self {
        Self {
            cipher,
            entries: HashMap::new(),
        }
    }

    pub fn upload(&mut self, key: &str, value: &str, confidential: bool) -> Result<(), DeskError> {
        if self.entries.contains_key(key) {
            return Err(DeskError::DuplicateKey(key.to_string()));
        }
        let stored = self.seal(value, confidential)?;
        self.entries.insert(key.to_string(), stored);
        Ok(())
    }

    pub fn read(&self, key: &str) -> Result<String, DeskError> {
        let stored = self
            .entries
            .get(key)
            .ok_or_else(|| DeskError::NotFound(key.to_string()))?;
        if stored.is_confidential {
            self.cipher.decrypt(&stored.content)
        } else {
            Ok(stored.content.clone())
        }
    }

    pub fn update(&mut self, key: &str, value: &str, confidential: bool) -> Result<(), DeskError> {
        if !self.entries.contains_key(key) {
            return Err(DeskError::NotFound(key.to_string()));
        }
        let stored = self.seal(value, confidential)?;
        self.entries.insert(key.to_string(), stored);
        Ok(())
    }

    pub fn delete(&mut self, key: &str) -> Result<(), DeskError> {
        self.entries
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| DeskError::NotFound(key.to_string()))
    }

    /// The record as held in memory, without decryption.
    pub fn raw(&self, key: &str) -> Option<&StoredValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest records by stored content size, ties broken by key.
    pub fn largest(&self, limit: usize) -> Vec<EntrySize> {
        let mut sizes: Vec<EntrySize> = self
            .entries
            .iter()
            .map(|(key, v)| EntrySize {
                key: key.clone(),
                bytes: key.len() + v.content.len(),
                is_confidential: v.is_confidential,
            })
            .collect();
        sizes.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.key.cmp(&b.key)));
        sizes.truncate(limit);
        sizes
    }

    fn seal(&self, value: &str, confidential: bool) -> Result<StoredValue, DeskError> {
        let content = if confidential {
            self.cipher.encrypt(value)?
        } else {
            value.to_string()
        };
        Ok(StoredValue {
            content,
            is_confidential: confidential,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(ContentCipher::generate())
    }

    #[test]
    fn upload_read_update_delete_scenario() {
        let mut s = store();
        s.upload("k1", "secret", true).unwrap();
        assert_eq!(s.read("k1").unwrap(), "secret");

        s.update("k1", "new", false).unwrap();
        assert_eq!(s.read("k1").unwrap(), "new");

        s.delete("k1").unwrap();
        assert!(matches!(s.read("k1"), Err(DeskError::NotFound(_))));
    }

    #[test]
    fn duplicate_upload_fails_regardless_of_confidentiality() {
        for (first, second) in [(false, false), (false, true), (true, false), (true, true)] {
            let mut s = store();
            s.upload("k", "v1", first).unwrap();
            let err = s.upload("k", "v2", second).unwrap_err();
            assert!(matches!(err, DeskError::DuplicateKey(ref k) if k == "k"));
            assert_eq!(s.read("k").unwrap(), "v1");
        }
    }

    #[test]
    fn confidential_content_is_encrypted_at_rest() {
        let mut s = store();
        s.upload("card", "4111-1111", true).unwrap();
        let raw = s.raw("card").unwrap();
        assert!(raw.is_confidential);
        assert_ne!(raw.content, "4111-1111");
        assert_eq!(s.read("card").unwrap(), "4111-1111");

        s.upload("note", "plain", false).unwrap();
        assert_eq!(s.raw("note").unwrap().content, "plain");
    }

    #[test]
    fn update_can_switch_confidentiality_on() {
        let mut s = store();
        s.upload("k", "open", false).unwrap();
        s.update("k", "closed", true).unwrap();
        assert!(s.raw("k").unwrap().is_confidential);
        assert_eq!(s.read("k").unwrap(), "closed");
    }

    #[test]
    fn missing_keys_are_not_found() {
        let mut s = store();
        assert!(matches!(s.update("x", "v", false), Err(DeskError::NotFound(_))));
        assert!(matches!(s.delete("x"), Err(DeskError::NotFound(_))));
        assert!(s.is_empty());
    }

    #[test]
    fn second_delete_fails() {
        let mut s = store();
        s.upload("k", "v", true).unwrap();
        s.delete("k").unwrap();
        assert!(matches!(s.delete("k"), Err(DeskError::NotFound(_))));
    }

    #[test]
    fn largest_orders_by_size() {
        let mut s = store();
        s.upload("a", "x", false).unwrap();
        s.upload("b", "xxxxxxxx", false).unwrap();
        s.upload("c", "xxxx", false).unwrap();
        let keys: Vec<String> = s.largest(2).into_iter().map(|e| e.key).collect();
        assert_eq!(keys, ["b", "c"]);
        assert_eq!(s.len(), 3);
    }
}
