//! Structured-value contract shared by every entity type.
//!
//! Server payloads are flat mappings of field name to scalar, nested mapping
//! or sequence. Entities hydrate from them leniently so the server's field
//! set can evolve independently of the client:
//!
//! - declared fields hydrate into their declared types, nested mappings
//!   recursively into their nested entity types;
//! - missing fields keep the type's defaults;
//! - unknown fields land in an explicit `extra` bag and are written back out
//!   unchanged by [`WireEntity::to_wire`].
//!
//! The only boundary checks are that the payload is a mapping and that the
//! declared fields have the declared shape.

use crate::{Result, XflrError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Fields the server sent that this client does not declare.
pub type Extra = serde_json::Map<String, Value>;

/// A value type that round-trips through a server structured value.
pub trait WireEntity: Serialize + DeserializeOwned + Default {
    /// Entity kind, used in error messages.
    const KIND: &'static str;

    /// The entity's field mapping, extras included.
    fn to_wire(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Hydrate from a server mapping.
    fn from_wire(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(XflrError::Wire {
                kind: Self::KIND,
                message: format!("expected a mapping, got {}", value_kind(&value)),
            });
        }
        serde_json::from_value(value).map_err(|e| XflrError::Wire {
            kind: Self::KIND,
            message: e.to_string(),
        })
    }

    /// Hydrate every element of a server sequence.
    fn from_wire_list(value: Value) -> Result<Vec<Self>> {
        match value {
            Value::Array(items) => items.into_iter().map(Self::from_wire).collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(XflrError::Wire {
                kind: Self::KIND,
                message: format!("expected a sequence, got {}", value_kind(&other)),
            }),
        }
    }
}

/// Short name of a JSON value's shape.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Decode a plain (non-entity) server value into `T`.
pub(crate) fn decode<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| XflrError::Wire {
        kind,
        message: e.to_string(),
    })
}

/// Declare an enum that travels as its integer code.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Default,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(try_from = "i64", into = "i64")]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $code),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Integer code used on the wire.
            pub fn code(self) -> i64 {
                self as i64
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                value as i64
            }
        }

        impl TryFrom<i64> for $name {
            type Error = String;

            fn try_from(code: i64) -> std::result::Result<Self, Self::Error> {
                $(
                    if code == $name::$variant as i64 {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("invalid {} code {}", stringify!($name), code))
            }
        }
    };
}

pub(crate) use wire_enum;
