use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Duplicate field '{field}' in message {message}")]
    DuplicateField { message: String, field: String },

    #[error("Field '{field}' in message {message} is repeated and required")]
    RequiredRepeated { message: String, field: String },

    #[error("Enum {0} declares no values")]
    EmptyEnum(String),

    #[error("Field '{field}' refers to unknown type {type_name}")]
    UnresolvedType { field: String, type_name: String },

    #[error("Invalid schema reference: {0}")]
    InvalidReference(String),

    #[error("Descriptor is missing a name: {0}")]
    MissingName(String),

    #[error("Descriptor decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}
