use std::path::{Path, PathBuf};

use crate::store::ids::TemplateIdPolicy;

pub const DEFAULT_STORE_ROOT: &str = "./data";
pub const DEFAULT_MAX_BODY: u64 = 2 * 1024 * 1024;

/// Store settings. Rocket's own settings (address, port, ...) come from
/// `ROCKET_*` variables and `Rocket.toml` as usual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub store_root: PathBuf,
    pub max_body_bytes: u64,
    pub template_ids: TemplateIdPolicy,
}

impl StoreConfig {
    pub fn new(store_root: impl AsRef<Path>) -> Self {
        StoreConfig {
            store_root: store_root.as_ref().to_path_buf(),
            max_body_bytes: DEFAULT_MAX_BODY,
            template_ids: TemplateIdPolicy::default(),
        }
    }

    /// Read `CONTENT_STORE_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = StoreConfig::new(
            non_empty("CONTENT_STORE_ROOT").unwrap_or_else(|| DEFAULT_STORE_ROOT.to_string()),
        );
        if let Some(raw) = non_empty("CONTENT_STORE_MAX_BODY") {
            match raw.trim().parse::<u64>() {
                Ok(bytes) if bytes > 0 => config.max_body_bytes = bytes,
                _ => log::warn!(
                    "ignoring invalid CONTENT_STORE_MAX_BODY '{}', using {}",
                    raw,
                    DEFAULT_MAX_BODY
                ),
            }
        }
        config.template_ids = TemplateIdPolicy {
            attack_roll_suffix_field: non_empty("CONTENT_STORE_ATTACK_ROLL_SUFFIX_FIELD"),
            other_suffix_field: non_empty("CONTENT_STORE_OTHER_SUFFIX_FIELD"),
        };
        config
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new(DEFAULT_STORE_ROOT)
    }
}
