use std::path::Path;

use nodist_core::codec::{CodecPolicy, DEFAULT_INLINE_THRESHOLD, Transport};
use nodist_core::inspect::InspectorLimits;
use nodist_core::record::Format;
use nodist_offload::WorkerConfig;
use serde::Deserialize;

/// Editor configuration loaded from `nodist.toml`.
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub codec: CodecConfig,
    pub inspector: InspectorLimits,
    pub log: LogConfig,
}

/// `[codec]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Buffers with fewer elements are written as plain sequences.
    pub inline_threshold: usize,
    /// `"transfer"` splits large buffers out on the calling side and moves
    /// them to the worker; `"shared"` hands the worker native buffers to
    /// split.
    pub transport: Transport,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            inline_threshold: DEFAULT_INLINE_THRESHOLD,
            transport: Transport::Transfer,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// env_logger filter; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
        }
    }
}

impl EditorConfig {
    pub fn codec_policy(&self) -> CodecPolicy {
        CodecPolicy::new(self.codec.inline_threshold, self.codec.transport)
    }

    pub fn inspector_limits(&self) -> InspectorLimits {
        self.inspector
    }

    /// Settings for the offload worker.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            format: Format::Json,
            policy: self.codec_policy(),
        }
    }
}

/// Parse a config from TOML text.
pub fn parse_config(text: &str) -> Result<EditorConfig, String> {
    toml::from_str(text).map_err(|e| e.to_string())
}

/// Load a config from a TOML file.
///
/// Returns `Err` with a human-readable message if the file cannot be read
/// or parsed.
pub fn load_config(path: &Path) -> Result<EditorConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    parse_config(&content).map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

/// Load a config, falling back to defaults if the file is missing or invalid.
pub fn load_or_default(path: &Path) -> EditorConfig {
    match load_config(path) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("No usable config ({e}), using defaults");
            EditorConfig::default()
        }
    }
}
