use crate::source::SourceMarker;

/// Environment variable naming the bound field.
pub const KEY_VAR: &str = "INPUT_SYNC_KEY";
/// Environment variable fixing the source marker.
pub const SOURCE_VAR: &str = "INPUT_SYNC_SOURCE";

/// Options for binding one document field to one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Top-level document field the buffer mirrors.
    pub key: String,
    /// Marker attached to outbound ops. Generated per engine when unset.
    pub source: Option<SourceMarker>,
}

impl SyncOptions {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<SourceMarker>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Load options from environment variables.
    ///
    /// Required environment variables:
    /// - `INPUT_SYNC_KEY`: the field to bind
    ///
    /// Optional:
    /// - `INPUT_SYNC_SOURCE`: fixed source marker
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let key = lookup(KEY_VAR)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingKey)?;
        let source = lookup(SOURCE_VAR)
            .filter(|s| !s.is_empty())
            .map(SourceMarker::from);
        Ok(Self { key, source })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("INPUT_SYNC_KEY environment variable not set")]
    MissingKey,
}
