//! # Document Handle
//!
//! A Document is one root message instance of a schema plus its editing
//! state. Documents can be:
//! - **Memory-backed**: created from scratch or from bytes, not yet saved
//! - **File-backed**: loaded from or saved to a path on disk
//!
//! ## Lifecycle
//!
//! ```text
//! Create/Load → Visit passes → Save / Save As
//!      ↓             ↓               ↓
//!  completed     in-place        encode +
//!  root          edits           write
//! ```
//!
//! The document codec is only touched at the load and save boundaries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use protoedit_common::{ByteSource, Clipboard};
use protoedit_schema::{MessageIndex, SchemaPool};
use tracing::{info, warn};

use crate::completion;
use crate::frontend::EditFrontend;
use crate::record::{DynamicRecord, MessageId};
use crate::traversal::{visit_document, Services};
use crate::wire::{DocumentCodec, WireCodec};
use crate::{EditorError, EditorOptions, MessageArena, VisitReport};

/// Editable protobuf document
#[derive(Debug)]
pub struct Document {
    /// Current version number (increments on each changing pass)
    pub version: u64,

    /// Backing storage strategy
    storage: DocumentStorage,

    /// Changed since the last load or save
    dirty: bool,

    pool: Arc<SchemaPool>,
    arena: MessageArena,
    root: MessageId,
    codec: Box<dyn DocumentCodec>,
    options: EditorOptions,
}

/// Storage backend for document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStorage {
    /// In-memory only (new or decoded from bytes)
    Memory,

    /// File-backed
    File { path: PathBuf },
}

impl Document {
    /// Create a new document whose root holds every required field
    pub fn create(pool: Arc<SchemaPool>, schema: MessageIndex, options: EditorOptions) -> Result<Self, EditorError> {
        let mut arena = MessageArena::new();
        let root = arena.alloc(schema);
        completion::complete(&pool, &mut arena, root, &options)?;
        info!(message = %pool.message(schema).full_name, "Created document");

        Ok(Self {
            version: 0,
            storage: DocumentStorage::Memory,
            dirty: true,
            pool,
            arena,
            root,
            codec: Box::new(WireCodec),
            options,
        })
    }

    /// Decode a document from bytes (memory-backed)
    pub fn from_bytes(
        pool: Arc<SchemaPool>,
        schema: MessageIndex,
        bytes: &[u8],
        codec: Box<dyn DocumentCodec>,
    ) -> Result<Self, EditorError> {
        let mut arena = MessageArena::new();
        let root = codec.decode(&pool, &mut arena, schema, bytes)?;

        Ok(Self {
            version: 0,
            storage: DocumentStorage::Memory,
            dirty: false,
            pool,
            arena,
            root,
            codec,
            options: EditorOptions::default(),
        })
    }

    /// Load document from file (file-backed)
    pub fn load(
        pool: Arc<SchemaPool>,
        schema: MessageIndex,
        path: impl Into<PathBuf>,
        codec: Box<dyn DocumentCodec>,
    ) -> Result<Self, EditorError> {
        let path = path.into();
        let bytes = std::fs::read(&path)?;
        let mut document = Self::from_bytes(pool, schema, &bytes, codec)?;
        info!(path = %path.display(), bytes = bytes.len(), "Loaded document");

        document.storage = DocumentStorage::File { path };
        Ok(document)
    }

    pub fn with_options(mut self, options: EditorOptions) -> Self {
        self.options = options;
        self
    }

    /// Re-read the backing file, discarding unsaved edits
    ///
    /// On failure the current contents stay as they were.
    pub fn reload(&mut self) -> Result<(), EditorError> {
        let DocumentStorage::File { path } = &self.storage else {
            return Err(EditorError::NotFileBacked);
        };
        let bytes = std::fs::read(path)?;
        let schema = self.arena.schema_of(self.root)?;

        let mut arena = MessageArena::new();
        let root = self.codec.decode(&self.pool, &mut arena, schema, &bytes)?;
        self.arena = arena;
        self.root = root;
        self.dirty = false;
        self.version += 1;
        Ok(())
    }

    /// Encode the document with its codec
    pub fn to_bytes(&self) -> Result<Vec<u8>, EditorError> {
        self.codec.encode(&self.pool, &self.arena, self.root)
    }

    /// Write back to the backing file
    pub fn save(&mut self) -> Result<(), EditorError> {
        let DocumentStorage::File { path } = &self.storage else {
            return Err(EditorError::NotFileBacked);
        };
        let path = path.clone();
        self.write_to(&path)
    }

    /// Write to `path` and make it the backing file
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), EditorError> {
        let path = path.into();
        self.write_to(&path)?;
        self.storage = DocumentStorage::File { path };
        Ok(())
    }

    fn write_to(&mut self, path: &Path) -> Result<(), EditorError> {
        let bytes = self.to_bytes()?;
        if let Err(err) = std::fs::write(path, &bytes) {
            warn!(path = %path.display(), error = %err, "Failed to save document");
            return Err(err.into());
        }
        info!(path = %path.display(), bytes = bytes.len(), "Saved document");
        self.dirty = false;
        Ok(())
    }

    /// Run one traversal pass from the root
    pub fn visit(
        &mut self,
        frontend: &mut dyn EditFrontend,
        clipboard: &mut dyn Clipboard,
        bytes: &dyn ByteSource,
    ) -> Result<VisitReport, EditorError> {
        let services = Services {
            frontend,
            clipboard,
            bytes,
        };
        let report = visit_document(&self.pool, &mut self.arena, self.root, services, &self.options)?;
        if report.changed() {
            self.version += 1;
            self.dirty = true;
        }
        Ok(report)
    }

    pub fn pool(&self) -> &SchemaPool {
        &self.pool
    }

    pub fn root(&self) -> MessageId {
        self.root
    }

    pub fn schema(&self) -> Result<MessageIndex, EditorError> {
        Ok(self.arena.schema_of(self.root)?)
    }

    pub fn record(&self) -> &MessageArena {
        &self.arena
    }

    /// Mutable record access (marks the document dirty)
    pub fn record_mut(&mut self) -> &mut MessageArena {
        self.dirty = true;
        &mut self.arena
    }

    pub fn storage(&self) -> &DocumentStorage {
        &self.storage
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            DocumentStorage::File { path } => Some(path),
            DocumentStorage::Memory => None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }
}
