//! Located packets used to evaluate predicates and policies.

use std::collections::BTreeMap;
use std::fmt;

use crate::{Field, Value};

/// A packet header: the set fields and their values.
///
/// Setting a field to [`Value::Unset`] removes it, so two packets compare
/// equal exactly when they read the same on every field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Packet {
    fields: BTreeMap<Field, Value>,
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Packet::set`].
    pub fn with(mut self, field: Field, value: impl Into<Value>) -> Self {
        self.set(field, value.into());
        self
    }

    pub fn get(&self, field: Field) -> Value {
        self.fields.get(&field).copied().unwrap_or(Value::Unset)
    }

    pub fn set(&mut self, field: Field, value: Value) {
        if value == Value::Unset {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
    }

    /// Keep only the listed fields.
    pub fn project(&self, fields: &[Field]) -> Packet {
        Packet {
            fields: self
                .fields
                .iter()
                .filter(|(field, _)| fields.contains(field))
                .map(|(&field, &value)| (field, value))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, Value)> + '_ {
        self.fields.iter().map(|(&field, &value)| (field, value))
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (field, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}={value}")?;
        }
        f.write_str("}")
    }
}
