use thiserror::Error;

#[derive(Debug, Error)]
pub enum LootError {
    /// Input text is not well-formed JSON.
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// Input is JSON but not a loot export we understand.
    #[error("invalid payload: {0}")]
    Validation(String),
}

impl LootError {
    pub fn validation(message: impl Into<String>) -> Self {
        LootError::Validation(message.into())
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, LootError::Parse(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LootError::Validation(_))
    }
}
