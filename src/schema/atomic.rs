use crate::value::Value;

/// Schema kinds that match a whole primitive domain.
///
/// `null` and `undefined` are literal schemas, not atomics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Atomic {
    Boolean,
    Number,
    BigInt,
    String,
    Symbol,
    Unknown,
    Any,
    Never,
    Void,
}

impl Atomic {
    pub fn name(self) -> &'static str {
        match self {
            Atomic::Boolean => "boolean",
            Atomic::Number => "number",
            Atomic::BigInt => "bigint",
            Atomic::String => "string",
            Atomic::Symbol => "symbol",
            Atomic::Unknown => "unknown",
            Atomic::Any => "any",
            Atomic::Never => "never",
            Atomic::Void => "void",
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Atomic::Boolean => matches!(value, Value::Bool(_)),
            Atomic::Number => matches!(value, Value::Number(_)),
            Atomic::BigInt => matches!(value, Value::BigInt(_)),
            Atomic::String => matches!(value, Value::String(_)),
            Atomic::Symbol => matches!(value, Value::Symbol(_)),
            Atomic::Unknown | Atomic::Any => true,
            Atomic::Never => false,
            Atomic::Void => matches!(value, Value::Undefined),
        }
    }

    pub fn mismatch_message(self) -> &'static str {
        match self {
            Atomic::Boolean => "not a boolean",
            Atomic::Number => "not a number",
            Atomic::BigInt => "not a bigint",
            Atomic::String => "not a string",
            Atomic::Symbol => "not a symbol",
            // unreachable in practice, both accept everything
            Atomic::Unknown | Atomic::Any => "unexpected value",
            Atomic::Never => "never type does not accept any value",
            Atomic::Void => "not equal to undefined",
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
