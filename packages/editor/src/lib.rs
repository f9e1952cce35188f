//! # Protoedit Editor
//!
//! Schema-driven editing engine for protobuf documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: descriptor set → SchemaPool         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document lifecycle + traversal      │
//! │  - Load/save through a DocumentCodec        │
//! │  - Walk fields, dispatch on type/cardinality│
//! │  - Complete required fields on creation     │
//! │  - Validate text through the value codec    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ front-end: EditFrontend callbacks           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Record is source of truth**: no component keeps a private copy
//! 2. **Always structurally valid**: every existing message holds its
//!    required closure after each operation
//! 3. **Idempotent passes**: a pass mutates only on an explicit commit
//!
//! ## Usage
//!
//! ```rust,ignore
//! use protoedit_editor::{Document, EditCommand, ScriptedFrontend, WireCodec};
//!
//! let mut doc = Document::load(pool, root, "config.bin", Box::new(WireCodec))?;
//!
//! let mut frontend = ScriptedFrontend::new(vec![EditCommand::Set {
//!     path: "server.port".to_string(),
//!     value: "8080".to_string(),
//! }]);
//! let report = doc.visit(&mut frontend, &mut clipboard, &bytes)?;
//!
//! doc.save()?;
//! ```

mod arena;
pub mod codec;
pub mod completion;
mod document;
mod errors;
pub mod frontend;
mod options;
mod record;
pub mod repeated;
mod report;
pub mod traversal;
mod value;
pub mod wire;

pub use arena::MessageArena;
pub use document::{Document, DocumentStorage};
pub use errors::{EditorError, InvalidFormat};
pub use frontend::{EditCommand, EditFrontend, FieldView, NoopFrontend, ScriptedFrontend, TextEdit};
pub use options::{EditorOptions, DEFAULT_MAX_COMPLETION_DEPTH};
pub use record::{is_set, DynamicRecord, MessageId, RecordError};
pub use repeated::{BulkOutcome, InvalidSlot, RepeatedEditor, BULK_DELIMITER};
pub use report::{Diagnostic, DiagnosticLevel, FieldEvent, FieldOutcome, VisitReport};
pub use traversal::{visit_document, Services};
pub use value::Value;
pub use wire::{DocumentCodec, WireCodec};
