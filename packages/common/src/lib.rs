//! Collaborator contracts shared by the protoedit crates.
//!
//! The editing engine never touches the file system or the system clipboard
//! directly. It calls through the narrow traits defined here so front-ends can
//! plug in real providers and tests can plug in in-memory ones.

pub mod byte_source;
pub mod clipboard;
pub mod error;
pub mod result;

pub use byte_source::*;
pub use clipboard::*;
pub use error::*;
pub use result::*;
