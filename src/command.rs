//! Request validation: raw `action` JSON → typed [`CommandDescriptor`].
//!
//! The raw descriptor has three levels, category → operation → parameters:
//!
//! ```json
//! { "resize": { "resizeByPercentage": { "percentage": 30 } } }
//! { "bgRemove": { "bgRemove": null } }
//! ```
//!
//! [`validate`] checks the shape in a fixed order and stops at the first
//! failure, each step with its own error kind:
//!
//! 1. exactly one category key (`MalformedCommand`)
//! 2. the category exists (`UnknownCategory`)
//! 3. exactly one operation key (`MalformedCommand`)
//! 4. the operation exists (`UnknownOperation`) and belongs to that category
//!    (`OperationCategoryMismatch`)
//! 5. a parameter-less operation got no parameters (`UnexpectedParameters`)
//! 6. an operation with parameters got some (`MissingParameters`)
//! 7. the parameter names equal the required set (`ParameterNameMismatch`)
//! 8. digit-only strings are coerced to integers
//!
//! Range and type checks of individual values are left to the operations.

use crate::error::OperationError;
use crate::schema::{Operation, OperationCategory};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A loosely-typed scalar parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
    /// Anything JSON can hold that is not a number or string (bool, null, array, object).
    Other(Value),
}

impl ParamValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => ParamValue::Int(i),
                // beyond i64: still an integer, and out of range for every parameter
                (None, Some(_)) => ParamValue::Int(i64::MAX),
                (None, None) => ParamValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ParamValue::Text(s.clone()),
            other => ParamValue::Other(other.clone()),
        }
    }

    /// Turn a digit-only string into an integer. Every other value is returned as is.
    ///
    /// Digit strings too long for `i64` saturate to `i64::MAX`, so range checks
    /// downstream reject them as out of range rather than as non-integers.
    pub fn coerce(self) -> Self {
        match self {
            ParamValue::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                ParamValue::Int(s.parse::<i64>().unwrap_or(i64::MAX))
            }
            other => other,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers and floats both count as numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Parameter name → value. Ordered so messages and logs are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet(BTreeMap<String, ParamValue>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn from_json(map: &Map<String, Value>) -> Self {
        Self(
            map.iter()
                .map(|(k, v)| (k.clone(), ParamValue::from_json(v)))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn names(&self) -> BTreeSet<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn coerced(self) -> Self {
        Self(self.0.into_iter().map(|(k, v)| (k, v.coerce())).collect())
    }
}

/// A validated unit of work: one operation plus exactly its parameters.
///
/// Only [`validate`] and [`CommandDescriptor::new`] build one, so a descriptor
/// in hand always satisfies the registry's parameter contract.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDescriptor {
    operation: Operation,
    parameters: ParameterSet,
}

impl CommandDescriptor {
    /// Check a parameter set against an operation (steps 5–8) and coerce it.
    ///
    /// `None` and an empty set are both "no parameters".
    pub fn new(
        operation: Operation,
        parameters: Option<ParameterSet>,
    ) -> Result<Self, OperationError> {
        let name = operation.wire_name();
        let provided = parameters.filter(|p| !p.is_empty());

        let parameters = match (operation.parameters(), provided) {
            (None, Some(_)) => {
                return Err(OperationError::UnexpectedParameters(format!(
                    "The action: \"{name}\" requires no arguments for it to work."
                )));
            }
            (None, None) => ParameterSet::new(),
            (Some(_), None) => {
                return Err(OperationError::MissingParameters(format!(
                    "The action: \"{name}\" requires arguments for it to work."
                )));
            }
            (Some(required), Some(provided)) => {
                let expected: BTreeSet<&str> = required.iter().copied().collect();
                if provided.names() != expected {
                    return Err(OperationError::ParameterNameMismatch(format!(
                        "The action: \"{name}\" was provided with the wrong parameters \
                         for this request. Expected: {}.",
                        required.join(", ")
                    )));
                }
                provided.coerced()
            }
        };

        Ok(Self {
            operation,
            parameters,
        })
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Fetch a parameter the registry guarantees is present.
    pub fn param(&self, name: &str) -> Result<&ParamValue, OperationError> {
        self.parameters.get(name).ok_or_else(|| {
            OperationError::ParameterNameMismatch(format!(
                "The action: \"{}\" is missing the parameter \"{name}\".",
                self.operation.wire_name()
            ))
        })
    }
}

/// Take the single key of a JSON object, or fail with `MalformedCommand`.
fn single_entry<'a>(value: &'a Value, what: &str) -> Result<(&'a str, &'a Value), OperationError> {
    let map = value.as_object().ok_or_else(|| {
        OperationError::MalformedCommand(format!("The {what} must be a JSON object."))
    })?;
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((key, inner)), None) => Ok((key.as_str(), inner)),
        _ => Err(OperationError::MalformedCommand(format!(
            "Exactly one {what} must be specified per request, found {}.",
            map.len()
        ))),
    }
}

/// Validate a raw category → operation → parameters descriptor.
pub fn validate(raw: &Value) -> Result<CommandDescriptor, OperationError> {
    let (category_name, operations) = single_entry(raw, "operation category")?;

    let category = OperationCategory::from_name(category_name).ok_or_else(|| {
        OperationError::UnknownCategory(format!(
            "The action category: \"{category_name}\" is invalid."
        ))
    })?;

    let (operation_name, raw_params) = single_entry(operations, "image editing operation")?;

    let operation = Operation::from_name(operation_name).ok_or_else(|| {
        OperationError::UnknownOperation(format!("The action: \"{operation_name}\" is invalid."))
    })?;
    if !category.operations().contains(&operation) {
        return Err(OperationError::OperationCategoryMismatch(format!(
            "The action: \"{operation_name}\" does not belong to the category \"{category_name}\"."
        )));
    }

    let parameters = match raw_params {
        Value::Null => None,
        Value::Object(map) => Some(ParameterSet::from_json(map)),
        _ if operation.parameters().is_none() => {
            return Err(OperationError::UnexpectedParameters(format!(
                "The action: \"{operation_name}\" requires no arguments for it to work."
            )));
        }
        _ => {
            return Err(OperationError::MalformedCommand(format!(
                "The parameters of \"{operation_name}\" must be a JSON object."
            )));
        }
    };

    CommandDescriptor::new(operation, parameters)
}
