//! Import of compiled descriptor sets (`protoc --descriptor_set_out`)

use std::collections::HashMap;

use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, EnumDescriptorProto, FileDescriptorSet};
use tracing::{debug, info};

use crate::builder::validate;
use crate::{
    Cardinality, EnumIndex, EnumSchema, EnumValue, FieldDescriptor, FieldType, MessageIndex,
    MessageSchema, SchemaError, SchemaPool, WireEncoding,
};

impl SchemaPool {
    /// Decode a serialized `FileDescriptorSet` and build the pool from it
    pub fn decode_descriptor_set(bytes: &[u8]) -> Result<Self, SchemaError> {
        let set = FileDescriptorSet::decode(bytes)?;
        Self::from_descriptor_set(&set)
    }

    /// Build the pool from every file of a descriptor set
    pub fn from_descriptor_set(set: &FileDescriptorSet) -> Result<Self, SchemaError> {
        let mut collector = Collector::default();

        // First pass: give every message and enum an index so fields can
        // reference types declared later or in other files.
        for file in &set.file {
            let package = file.package();
            for message in &file.message_type {
                collector.declare_message(package, message)?;
            }
            for enumeration in &file.enum_type {
                collector.declare_enum(package, enumeration)?;
            }
        }

        // Second pass: resolve fields.
        let mut pool = SchemaPool {
            messages: Vec::with_capacity(collector.messages.len()),
            enums: collector.enums,
        };
        for (index, (full_name, proto)) in collector.messages.iter().enumerate() {
            let index = MessageIndex(index);
            let fields = proto
                .field
                .iter()
                .enumerate()
                .map(|(position, field)| {
                    resolve_field(&collector.names, index, position, field)
                })
                .collect::<Result<Vec<_>, _>>()?;

            pool.messages.push(MessageSchema {
                index,
                name: proto.name().to_string(),
                full_name: full_name.clone(),
                fields,
            });
        }

        validate(&pool)?;
        info!(
            messages = pool.messages.len(),
            enums = pool.enums.len(),
            "Loaded descriptor set"
        );
        Ok(pool)
    }
}

#[derive(Debug, Clone, Copy)]
enum TypeRef {
    Message(MessageIndex),
    Enum(EnumIndex),
}

#[derive(Default)]
struct Collector<'a> {
    messages: Vec<(String, &'a DescriptorProto)>,
    enums: Vec<EnumSchema>,
    names: HashMap<String, TypeRef>,
}

impl<'a> Collector<'a> {
    fn declare_message(&mut self, scope: &str, proto: &'a DescriptorProto) -> Result<(), SchemaError> {
        let name = proto
            .name
            .as_deref()
            .ok_or_else(|| SchemaError::MissingName(format!("message in '{}'", scope)))?;
        let full_name = qualify(scope, name);

        let index = MessageIndex(self.messages.len());
        self.names.insert(full_name.clone(), TypeRef::Message(index));
        self.messages.push((full_name.clone(), proto));
        debug!(message = %full_name, index = index.0, "Declared message");

        for nested in &proto.nested_type {
            self.declare_message(&full_name, nested)?;
        }
        for enumeration in &proto.enum_type {
            self.declare_enum(&full_name, enumeration)?;
        }
        Ok(())
    }

    fn declare_enum(&mut self, scope: &str, proto: &EnumDescriptorProto) -> Result<(), SchemaError> {
        let name = proto
            .name
            .as_deref()
            .ok_or_else(|| SchemaError::MissingName(format!("enum in '{}'", scope)))?;
        let full_name = qualify(scope, name);

        let index = EnumIndex(self.enums.len());
        self.names.insert(full_name.clone(), TypeRef::Enum(index));
        self.enums.push(EnumSchema {
            index,
            name: name.to_string(),
            full_name,
            values: proto
                .value
                .iter()
                .map(|v| EnumValue {
                    name: v.name().to_string(),
                    number: v.number(),
                })
                .collect(),
        });
        Ok(())
    }
}

fn resolve_field(
    names: &HashMap<String, TypeRef>,
    owner: MessageIndex,
    position: usize,
    proto: &prost_types::FieldDescriptorProto,
) -> Result<FieldDescriptor, SchemaError> {
    let name = proto
        .name
        .as_deref()
        .ok_or_else(|| SchemaError::MissingName(format!("field #{}", position)))?;

    let lookup = |expected: &str| -> Result<TypeRef, SchemaError> {
        let type_name = proto.type_name().trim_start_matches('.');
        names
            .get(type_name)
            .copied()
            .ok_or_else(|| SchemaError::UnresolvedType {
                field: name.to_string(),
                type_name: format!("{} {}", expected, type_name),
            })
    };

    let mut encoding = WireEncoding::Varint;
    let field_type = match proto.r#type() {
        Type::Int32 => FieldType::Int32,
        Type::Sint32 => {
            encoding = WireEncoding::ZigZag;
            FieldType::Int32
        }
        Type::Sfixed32 => {
            encoding = WireEncoding::Fixed;
            FieldType::Int32
        }
        Type::Uint32 => FieldType::Uint32,
        Type::Fixed32 => {
            encoding = WireEncoding::Fixed;
            FieldType::Uint32
        }
        Type::Float => FieldType::Float,
        Type::Double => FieldType::Double,
        Type::Bool => FieldType::Bool,
        Type::String => FieldType::String,
        Type::Bytes => FieldType::Bytes,
        Type::Enum => match lookup("enum")? {
            TypeRef::Enum(index) => FieldType::Enum { index },
            TypeRef::Message(_) => {
                return Err(SchemaError::InvalidReference(format!(
                    "field '{}' declares enum type {}",
                    name,
                    proto.type_name()
                )))
            }
        },
        Type::Message => match lookup("message")? {
            TypeRef::Message(index) => FieldType::Message { index },
            TypeRef::Enum(_) => {
                return Err(SchemaError::InvalidReference(format!(
                    "field '{}' declares message type {}",
                    name,
                    proto.type_name()
                )))
            }
        },
        other => FieldType::Unsupported {
            name: other.as_str_name().trim_start_matches("TYPE_").to_lowercase(),
        },
    };

    let (cardinality, required) = match proto.label() {
        Label::Repeated => (Cardinality::Repeated, false),
        Label::Required => (Cardinality::Singular, true),
        Label::Optional => (Cardinality::Singular, false),
    };

    Ok(FieldDescriptor {
        owner,
        index: position,
        number: u32::try_from(proto.number()).unwrap_or(0),
        name: name.to_string(),
        field_type,
        cardinality,
        required,
        encoding,
    })
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}
