//! Typed values stored in DAO attributes and registry settings.

use serde::{Deserialize, Serialize};

use crate::types::{Asset, Name};

/// A value of one of the supported scalar types.
///
/// Serialized externally tagged, e.g. `{"uint64": 20}` or `"empty"`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantValue {
    #[default]
    Empty,
    Uint64(u64),
    Int64(i64),
    Double(f64),
    Name(Name),
    Asset(Asset),
    String(String),
}

impl VariantValue {
    /// Name of the contained type, as used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            VariantValue::Empty => "empty",
            VariantValue::Uint64(_) => "uint64",
            VariantValue::Int64(_) => "int64",
            VariantValue::Double(_) => "double",
            VariantValue::Name(_) => "name",
            VariantValue::Asset(_) => "asset",
            VariantValue::String(_) => "string",
        }
    }

    pub fn as_uint64(&self) -> Option<u64> {
        match self {
            VariantValue::Uint64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<Asset> {
        match self {
            VariantValue::Asset(v) => Some(*v),
            _ => None,
        }
    }
}
