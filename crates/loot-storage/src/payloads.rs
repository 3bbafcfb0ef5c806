use crate::kv::KvStore;
use crate::StorageError;
use loot_core::{normalize, CanonicalPayload, LootError, PayloadSignature};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Key holding the JSON array of canonical payloads.
pub const PAYLOADS_KEY: &str = "LT_PAYLOADS_V1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Merge,
    Replace,
}

impl ImportMode {
    pub fn from_merge(merge: bool) -> Self {
        if merge {
            ImportMode::Merge
        } else {
            ImportMode::Replace
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Appended to the existing payloads.
    Added,
    /// Same signature already stored; nothing written.
    Duplicate,
    /// Everything previously stored was discarded.
    Replaced,
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub outcome: ImportOutcome,
    pub signature: PayloadSignature,
    pub realm: String,
    pub player: String,
    pub loots: usize,
    pub payloads: Vec<CanonicalPayload>,
}

/// Durable, deduplicated sequence of imported payloads.
pub struct PayloadStore<S: KvStore> {
    store: S,
    key: String,
}

impl<S: KvStore> PayloadStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, PAYLOADS_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.store
    }

    pub fn into_backend(self) -> S {
        self.store
    }

    /// Stored payloads in import order.
    ///
    /// Missing or undecodable state reads as empty; the next successful write
    /// replaces it.
    pub fn load_payloads(&self) -> Result<Vec<CanonicalPayload>, StorageError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(Vec::new());
        };

        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!(key = %self.key, "stored payloads are not an array; treating as empty");
                return Ok(Vec::new());
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "stored payloads are not valid JSON; treating as empty");
                return Ok(Vec::new());
            }
        };

        let mut payloads = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<CanonicalPayload>(entry) {
                Ok(payload) => payloads.push(payload),
                Err(err) => {
                    warn!(key = %self.key, index = idx, error = %err, "skipping undecodable stored payload");
                }
            }
        }
        Ok(payloads)
    }

    /// Normalize `raw` and store it, returning the resulting sequence.
    pub fn add_payload(
        &mut self,
        raw: &Value,
        merge: bool,
    ) -> Result<Vec<CanonicalPayload>, StorageError> {
        Ok(self.import_value(raw, ImportMode::from_merge(merge))?.payloads)
    }

    pub fn import_value(
        &mut self,
        raw: &Value,
        mode: ImportMode,
    ) -> Result<ImportReport, StorageError> {
        let payload = normalize(raw)?;
        let signature = PayloadSignature::of(&payload);
        let realm = payload.realm().to_string();
        let player = payload.player().to_string();
        let loots = payload.loot_count();

        let (outcome, payloads) = match mode {
            ImportMode::Replace => (ImportOutcome::Replaced, vec![payload]),
            ImportMode::Merge => {
                let mut existing = self.load_payloads()?;
                if existing
                    .iter()
                    .any(|stored| PayloadSignature::of(stored) == signature)
                {
                    debug!(%signature, "payload already stored");
                    (ImportOutcome::Duplicate, existing)
                } else {
                    existing.push(payload);
                    (ImportOutcome::Added, existing)
                }
            }
        };

        if outcome != ImportOutcome::Duplicate {
            self.save(&payloads)?;
        }
        info!(%signature, ?outcome, stored = payloads.len(), "payload import finished");

        Ok(ImportReport {
            outcome,
            signature,
            realm,
            player,
            loots,
            payloads,
        })
    }

    /// Parse export text, then import it. Malformed JSON changes nothing.
    pub fn import_text(&mut self, text: &str, mode: ImportMode) -> Result<ImportReport, StorageError> {
        let raw: Value = serde_json::from_str(text).map_err(LootError::from)?;
        self.import_value(&raw, mode)
    }

    /// Remove all stored payloads.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove(&self.key)?;
        info!(key = %self.key, "stored payloads cleared");
        Ok(())
    }

    fn save(&mut self, payloads: &[CanonicalPayload]) -> Result<(), StorageError> {
        let json = serde_json::to_string(payloads)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.store.set(&self.key, &json)
    }
}
