//! Saving and loading scene archives.
//!
//! An archive holds three kinds of entries:
//!
//! - `scene.json`: the wire record as text
//! - `buffers.json`: one [`BinEntry`] per out-of-band slot of the text
//! - `buffers/bin_<n>.bin`: raw little-endian bytes of each unique buffer
//!
//! Text encoding and decoding run on the offload worker; graph traversal
//! stays on the calling side.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use nodist_core::codec::{AttributeArray, CodecPolicy, ElementType, TransferList};
use nodist_core::record::WireRecord;
use nodist_core::scene::SceneNode;
use nodist_core::serialize::{self, DeserializeError, SerializeError};
use nodist_offload::{OffloadChannel, OffloadError, ThreadWorker, Transport};

use crate::archive::ArchiveStore;

pub const SCENE_ENTRY: &str = "scene.json";
pub const BUFFERS_ENTRY: &str = "buffers.json";

/// Name of the binary entry holding unique buffer `index`.
pub fn bin_entry(index: usize) -> String {
    format!("buffers/bin_{index}.bin")
}

/// Errors of archive storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("archive entry '{0}' is missing")]
    MissingEntry(String),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
    #[error(transparent)]
    Offload(#[from] OffloadError),
    #[error("invalid archive: {0}")]
    Format(String),
}

/// Where one out-of-band slot lives in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinEntry {
    /// Index of the `buffers/bin_<n>.bin` entry.
    pub bin: usize,
    /// Element type the bytes are read back as.
    #[serde(rename = "type")]
    pub element_type: ElementType,
}

/// What [`SceneStorage::save`] wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSummary {
    pub nodes: usize,
    pub geometries: usize,
    pub materials: usize,
    /// Unique binary entries written.
    pub bins: usize,
    /// Total bytes across binary entries.
    pub bin_bytes: usize,
    pub text_bytes: usize,
}

/// Scene persistence on top of an [`ArchiveStore`] and an offload worker.
pub struct SceneStorage<A: ArchiveStore, T: Transport = ThreadWorker> {
    archive: A,
    channel: OffloadChannel<T>,
    policy: CodecPolicy,
}

impl<A: ArchiveStore, T: Transport> SceneStorage<A, T> {
    pub fn new(archive: A, channel: OffloadChannel<T>) -> Self {
        Self {
            archive,
            channel,
            policy: CodecPolicy::default(),
        }
    }

    /// Policy the graph is serialized with before it is handed to the
    /// worker. With [`Transport::Transfer`] large buffers are split out on the
    /// calling side and move to the worker beside the record; with
    /// [`Transport::Shared`] the worker receives native handles and splits
    /// them itself. Both produce the same archive.
    ///
    /// [`Transport::Transfer`]: nodist_core::codec::Transport::Transfer
    /// [`Transport::Shared`]: nodist_core::codec::Transport::Shared
    #[must_use]
    pub fn with_policy(mut self, policy: CodecPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    pub fn into_archive(self) -> A {
        self.archive
    }

    /// Write the graph rooted at `root` to the archive.
    pub fn save(&mut self, root: &SceneNode) -> Result<SaveSummary, StorageError> {
        let serialized = serialize::serialize(root, &self.policy)?;
        let geometries = serialized.record.geometries.len();
        let materials = serialized.record.materials.len();

        let handle = self.channel.serialize_scene(serialized);
        let encoded = self.channel.block_on(handle)?;

        let (mapping, bins, bin_bytes) = self.write_buffers(&encoded.buffers)?;
        let mapping = serde_json::to_vec(&mapping).map_err(|e| StorageError::Format(e.to_string()))?;
        self.archive.write(BUFFERS_ENTRY, &mapping)?;
        self.archive.write(SCENE_ENTRY, encoded.text.as_bytes())?;

        let summary = SaveSummary {
            nodes: root.node_count(),
            geometries,
            materials,
            bins,
            bin_bytes,
            text_bytes: encoded.text.len(),
        };
        log::info!(
            "saved scene: {} nodes, {} geometries, {} materials, {} buffers ({} bytes)",
            summary.nodes,
            summary.geometries,
            summary.materials,
            summary.bins,
            summary.bin_bytes
        );
        Ok(summary)
    }

    /// Write each distinct allocation once; slots sharing one map to one bin.
    fn write_buffers(
        &mut self,
        buffers: &TransferList,
    ) -> Result<(Vec<BinEntry>, usize, usize), StorageError> {
        let mut bins: HashMap<(usize, usize), usize> = HashMap::new();
        let mut mapping = Vec::with_capacity(buffers.len());
        let mut bin_bytes = 0;
        for buffer in buffers.iter() {
            let key = (buffer.identity(), buffer.byte_len());
            let next = bins.len();
            let bin = *bins.entry(key).or_insert(next);
            if bin == next {
                self.archive.write(&bin_entry(bin), buffer.as_bytes())?;
                bin_bytes += buffer.byte_len();
            }
            mapping.push(BinEntry {
                bin,
                element_type: buffer.element_type(),
            });
        }
        Ok((mapping, bins.len(), bin_bytes))
    }

    /// Read the archive's text entry without decoding it.
    pub fn read_text(&self) -> Result<String, StorageError> {
        let bytes = self.archive.read(SCENE_ENTRY)?;
        String::from_utf8(bytes).map_err(|e| StorageError::Format(format!("{SCENE_ENTRY}: {e}")))
    }

    fn read_buffers(&self) -> Result<TransferList, StorageError> {
        if !self.archive.exists(BUFFERS_ENTRY) {
            return Ok(TransferList::new());
        }
        let mapping: Vec<BinEntry> = serde_json::from_slice(&self.archive.read(BUFFERS_ENTRY)?)
            .map_err(|e| StorageError::Format(format!("{BUFFERS_ENTRY}: {e}")))?;

        let mut loaded: HashMap<BinEntry, AttributeArray> = HashMap::new();
        let mut slots = Vec::with_capacity(mapping.len());
        for entry in mapping {
            let array = match loaded.get(&entry) {
                Some(array) => array.clone(),
                None => {
                    let name = bin_entry(entry.bin);
                    let bytes = self.archive.read(&name)?;
                    let array = AttributeArray::from_bytes(entry.element_type, &bytes)
                        .map_err(|e| StorageError::Format(format!("{name}: {e}")))?;
                    loaded.insert(entry, array.clone());
                    array
                }
            };
            slots.push(array);
        }
        Ok(TransferList::from_buffers(slots))
    }

    /// Read and decode the archive's wire record.
    ///
    /// Attribute buffers in the returned record are native.
    pub fn load_record(&mut self) -> Result<WireRecord, StorageError> {
        let text = self.read_text()?;
        let buffers = self.read_buffers()?;
        let handle = self.channel.deserialize(text, buffers);
        Ok(self.channel.block_on(handle)?)
    }

    /// Read the archive and rebuild the scene graph.
    pub fn load(&mut self) -> Result<SceneNode, StorageError> {
        let record = self.load_record()?;
        let root = serialize::deserialize(&record, &TransferList::new())?;
        log::info!("loaded scene: {} nodes", root.node_count());
        Ok(root)
    }
}
