//! # Protoedit Schema
//!
//! Read-only description of the documents the editor works on: message
//! types, their fields in declaration order, cardinality, required flags,
//! enum value sets and links to nested message types.
//!
//! A [`SchemaPool`] is built once (from a compiled descriptor set or with the
//! [`SchemaBuilder`]) and shared by reference with every editing component.

mod builder;
mod descriptor;
mod error;
mod model;

pub use builder::{FieldSpec, SchemaBuilder};
pub use error::SchemaError;
pub use model::{
    Cardinality, EnumIndex, EnumSchema, EnumValue, FieldDescriptor, FieldType, MessageIndex,
    MessageSchema, SchemaPool, WireEncoding,
};
