//! # nodist editor
//!
//! The editor-side glue around the serialization core: saving and loading
//! scene archives through the offload worker, configuration, log capture,
//! and the `nodist` command-line tool.

pub mod archive;
pub mod config;
pub mod demo;
pub mod log_capture;
pub mod storage;

pub use archive::{ArchiveStore, DirectoryArchive, MemoryArchive};
pub use config::{EditorConfig, load_config, load_or_default};
pub use storage::{SaveSummary, SceneStorage, StorageError};
