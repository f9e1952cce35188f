//! Programmatic schema construction
//!
//! ```rust,ignore
//! let mut builder = SchemaBuilder::new();
//! let node = builder.message("demo.Node");
//! builder.field(node, FieldSpec::new("value", FieldType::Int32).required());
//! builder.field(node, FieldSpec::message("children", node).repeated());
//! let pool = builder.build()?;
//! ```

use std::collections::HashSet;

use crate::{
    Cardinality, EnumIndex, EnumSchema, EnumValue, FieldDescriptor, FieldType, MessageIndex,
    MessageSchema, SchemaError, SchemaPool, WireEncoding,
};

/// Declaration of a single field, consumed by [`SchemaBuilder::field`]
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    field_type: FieldType,
    cardinality: Cardinality,
    required: bool,
    number: Option<u32>,
    encoding: WireEncoding,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            cardinality: Cardinality::Singular,
            required: false,
            number: None,
            encoding: WireEncoding::Varint,
        }
    }

    pub fn message(name: impl Into<String>, index: MessageIndex) -> Self {
        Self::new(name, FieldType::Message { index })
    }

    pub fn enumeration(name: impl Into<String>, index: EnumIndex) -> Self {
        Self::new(name, FieldType::Enum { index })
    }

    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn number(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }

    pub fn encoding(mut self, encoding: WireEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Incremental builder for a [`SchemaPool`]
///
/// Messages are declared before their fields so that fields may reference
/// any message, including the one being declared.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    pool: SchemaPool,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a message type and return its index
    pub fn message(&mut self, full_name: impl Into<String>) -> MessageIndex {
        let full_name = full_name.into();
        let index = MessageIndex(self.pool.messages.len());
        self.pool.messages.push(MessageSchema {
            index,
            name: short_name(&full_name).to_string(),
            full_name,
            fields: Vec::new(),
        });
        index
    }

    /// Declare an enum type with `(name, number)` values in declaration order
    pub fn enumeration<N: Into<String>>(
        &mut self,
        full_name: impl Into<String>,
        values: impl IntoIterator<Item = (N, i32)>,
    ) -> EnumIndex {
        let full_name = full_name.into();
        let index = EnumIndex(self.pool.enums.len());
        self.pool.enums.push(EnumSchema {
            index,
            name: short_name(&full_name).to_string(),
            full_name,
            values: values
                .into_iter()
                .map(|(name, number)| EnumValue {
                    name: name.into(),
                    number,
                })
                .collect(),
        });
        index
    }

    /// Append a field to a declared message
    pub fn field(&mut self, message: MessageIndex, spec: FieldSpec) -> &mut Self {
        let schema = &mut self.pool.messages[message.0];
        let index = schema.fields.len();
        let number = spec.number.unwrap_or_else(|| {
            schema.fields.iter().map(|f| f.number).max().unwrap_or(0) + 1
        });

        schema.fields.push(FieldDescriptor {
            owner: message,
            index,
            number,
            name: spec.name,
            field_type: spec.field_type,
            cardinality: spec.cardinality,
            required: spec.required,
            encoding: spec.encoding,
        });
        self
    }

    /// Validate and freeze the pool
    pub fn build(self) -> Result<SchemaPool, SchemaError> {
        validate(&self.pool)?;
        Ok(self.pool)
    }
}

/// Structural checks shared by the builder and the descriptor-set import
pub(crate) fn validate(pool: &SchemaPool) -> Result<(), SchemaError> {
    for enumeration in &pool.enums {
        if enumeration.values.is_empty() {
            return Err(SchemaError::EmptyEnum(enumeration.full_name.clone()));
        }
    }

    for message in &pool.messages {
        let mut names = HashSet::new();
        for field in &message.fields {
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    message: message.full_name.clone(),
                    field: field.name.clone(),
                });
            }

            if field.required && field.cardinality == Cardinality::Repeated {
                return Err(SchemaError::RequiredRepeated {
                    message: message.full_name.clone(),
                    field: field.name.clone(),
                });
            }

            match field.field_type {
                FieldType::Message { index } if index.0 >= pool.messages.len() => {
                    return Err(SchemaError::InvalidReference(format!(
                        "{}.{} -> message #{}",
                        message.full_name, field.name, index.0
                    )));
                }
                FieldType::Enum { index } if index.0 >= pool.enums.len() => {
                    return Err(SchemaError::InvalidReference(format!(
                        "{}.{} -> enum #{}",
                        message.full_name, field.name, index.0
                    )));
                }
                _ => {}
            }
        }
    }

    Ok(())
}

fn short_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}
