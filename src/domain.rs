//! Domain registry: contexts, parameters, and their values.
//!
//! The [`Domain`] maps names to dense [`ContextId`] / [`ParameterId`] handles
//! and rejects duplicate names. It is filled once by the knowledge loader and
//! is read-only afterwards (the [`KnowledgeBase`](crate::knowledge::KnowledgeBase)
//! only hands out shared references).

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::error::{ConfigError, ConfigResult, ValueError};

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Dense index of a context in its [`Domain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u32);

/// Dense index of a parameter in its [`Domain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(u32);

impl ContextId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl ParameterId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A (context, parameter) pair: the unit of resolution and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub context: ContextId,
    pub parameter: ParameterId,
}

impl Slot {
    pub fn new(context: ContextId, parameter: ParameterId) -> Self {
        Self { context, parameter }
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A parameter value after coercion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Text(String),
    Boolean(bool),
    /// A member of a parameter's allowed-value set.
    Enum(String),
}

impl PartialOrd for Value {
    /// Values only compare within the same variant; coercion guarantees both
    /// sides of a statement share one.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) | (Self::Enum(a), Self::Enum(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) | Self::Enum(s) => write!(f, "{s}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Primitive type a parameter's values are cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Text,
    Boolean,
}

impl ValueType {
    /// Parse the knowledge-file type tag (`int`, `str`, `bool`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "int" | "integer" => Some(Self::Integer),
            "str" | "string" | "text" => Some(Self::Text),
            "bool" | "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Text => write!(f, "text"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// How raw values are turned into a parameter's [`Value`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueRule {
    /// Cast to a primitive type.
    Type(ValueType),
    /// Accept exactly one of these values.
    OneOf(Vec<String>),
}

// ---------------------------------------------------------------------------
// Context and parameter
// ---------------------------------------------------------------------------

/// A named reasoning scope with its initial data and goals.
#[derive(Debug, Clone)]
pub struct Context {
    pub id: ContextId,
    pub name: String,
    /// Parameters asked for eagerly, in order, before any goal.
    pub initial_data: Vec<String>,
    /// Parameters whose values the run reports.
    pub goals: Vec<String>,
}

/// A named variable scoped to a context.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub id: ParameterId,
    pub name: String,
    pub context: ContextId,
    /// Query the oracle before trying rules.
    pub ask_first: bool,
    pub rule: ValueRule,
}

impl Parameter {
    /// Coerce a value through this parameter's [`ValueRule`].
    pub fn coerce(&self, value: &Value) -> Result<Value, ValueError> {
        match &self.rule {
            ValueRule::Type(ty) => self.cast(*ty, value),
            ValueRule::OneOf(allowed) => {
                let text = value.to_string();
                if allowed.iter().any(|a| *a == text) {
                    Ok(Value::Enum(text))
                } else {
                    Err(ValueError::NotAllowed {
                        parameter: self.name.clone(),
                        value: text,
                        allowed: allowed.join(", "),
                    })
                }
            }
        }
    }

    /// Coerce free text (an oracle reply) into a value.
    pub fn parse(&self, text: &str) -> Result<Value, ValueError> {
        self.coerce(&Value::Text(text.trim().to_string()))
    }

    /// Describe what this parameter accepts, for the `?` prompt command.
    pub fn describe_legal(&self) -> String {
        match &self.rule {
            ValueRule::Type(ty) => format!("{} must be of type {ty}", self.name),
            ValueRule::OneOf(allowed) => {
                format!("the allowed values of {} are {}", self.name, allowed.join(", "))
            }
        }
    }

    fn cast(&self, ty: ValueType, value: &Value) -> Result<Value, ValueError> {
        let mismatch = || ValueError::TypeMismatch {
            parameter: self.name.clone(),
            expected: ty.to_string(),
            value: value.to_string(),
        };
        match (ty, value) {
            (ValueType::Integer, Value::Integer(i)) => Ok(Value::Integer(*i)),
            (ValueType::Integer, Value::Boolean(b)) => Ok(Value::Integer(i64::from(*b))),
            (ValueType::Integer, Value::Text(s) | Value::Enum(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| mismatch()),
            (ValueType::Text, v) => Ok(Value::Text(v.to_string())),
            (ValueType::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(*b)),
            (ValueType::Boolean, Value::Integer(i)) => Ok(Value::Boolean(*i != 0)),
            (ValueType::Boolean, Value::Text(s) | Value::Enum(s)) => {
                match s.trim().to_lowercase().as_str() {
                    "true" | "t" | "yes" | "y" | "1" => Ok(Value::Boolean(true)),
                    "false" | "f" | "no" | "n" | "0" => Ok(Value::Boolean(false)),
                    _ => Err(mismatch()),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Name-keyed registry of contexts and parameters.
#[derive(Debug, Clone, Default)]
pub struct Domain {
    contexts: Vec<Context>,
    parameters: Vec<Parameter>,
    context_index: HashMap<String, ContextId>,
    parameter_index: HashMap<String, ParameterId>,
}

impl Domain {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context. Errors if the name is already taken.
    pub fn add_context(
        &mut self,
        name: impl Into<String>,
        initial_data: Vec<String>,
        goals: Vec<String>,
    ) -> ConfigResult<ContextId> {
        let name = name.into();
        if self.context_index.contains_key(&name) {
            return Err(ConfigError::DuplicateContext { name });
        }
        let id = ContextId(self.contexts.len() as u32);
        self.context_index.insert(name.clone(), id);
        self.contexts.push(Context {
            id,
            name,
            initial_data,
            goals,
        });
        Ok(id)
    }

    /// Register a parameter of an already registered context.
    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        context: &str,
        ask_first: bool,
        rule: ValueRule,
    ) -> ConfigResult<ParameterId> {
        let name = name.into();
        if self.parameter_index.contains_key(&name) {
            return Err(ConfigError::DuplicateParameter { name });
        }
        if matches!(&rule, ValueRule::OneOf(allowed) if allowed.is_empty()) {
            return Err(ConfigError::EmptyAllowedValues { parameter: name });
        }
        let context = self.context_id(context)?;
        let id = ParameterId(self.parameters.len() as u32);
        self.parameter_index.insert(name.clone(), id);
        self.parameters.push(Parameter {
            id,
            name,
            context,
            ask_first,
            rule,
        });
        Ok(id)
    }

    /// Look up a context ID by name.
    pub fn context_id(&self, name: &str) -> ConfigResult<ContextId> {
        self.context_index
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownContext { name: name.into() })
    }

    /// Look up a parameter ID by name.
    pub fn parameter_id(&self, name: &str) -> ConfigResult<ParameterId> {
        self.parameter_index
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownParameter { name: name.into() })
    }

    pub fn context(&self, id: ContextId) -> &Context {
        &self.contexts[id.index()]
    }

    pub fn parameter(&self, id: ParameterId) -> &Parameter {
        &self.parameters[id.index()]
    }

    /// All contexts in registration order.
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    /// All parameters in registration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_domain() -> Domain {
        let mut domain = Domain::new();
        domain
            .add_context("demo", vec!["temp".into()], vec!["season".into()])
            .unwrap();
        domain
            .add_parameter("temp", "demo", true, ValueRule::Type(ValueType::Integer))
            .unwrap();
        domain
            .add_parameter(
                "season",
                "demo",
                false,
                ValueRule::OneOf(vec!["summer".into(), "winter".into()]),
            )
            .unwrap();
        domain
    }

    #[test]
    fn register_and_lookup() {
        let domain = demo_domain();
        let ctx = domain.context_id("demo").unwrap();
        let temp = domain.parameter_id("temp").unwrap();
        assert_eq!(domain.context(ctx).name, "demo");
        assert_eq!(domain.parameter(temp).context, ctx);
        assert!(domain.parameter(temp).ask_first);
        assert_eq!(domain.parameters().len(), 2);
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut domain = demo_domain();
        assert!(matches!(
            domain.add_context("demo", vec![], vec![]),
            Err(ConfigError::DuplicateContext { .. })
        ));
        assert!(matches!(
            domain.add_parameter("temp", "demo", false, ValueRule::Type(ValueType::Text)),
            Err(ConfigError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn parameter_requires_known_context() {
        let mut domain = demo_domain();
        assert!(matches!(
            domain.add_parameter("pressure", "lab", false, ValueRule::Type(ValueType::Integer)),
            Err(ConfigError::UnknownContext { .. })
        ));
        assert!(domain.parameter_id("pressure").is_err());
    }

    #[test]
    fn empty_allowed_set_rejected() {
        let mut domain = demo_domain();
        assert!(matches!(
            domain.add_parameter("colour", "demo", false, ValueRule::OneOf(vec![])),
            Err(ConfigError::EmptyAllowedValues { .. })
        ));
    }

    #[test]
    fn integer_coercion() {
        let domain = demo_domain();
        let temp = domain.parameter(domain.parameter_id("temp").unwrap());
        assert_eq!(temp.parse(" 85 ").unwrap(), Value::Integer(85));
        assert!(matches!(
            temp.parse("hot"),
            Err(ValueError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn allowed_value_membership() {
        let domain = demo_domain();
        let season = domain.parameter(domain.parameter_id("season").unwrap());
        assert_eq!(
            season.parse("summer").unwrap(),
            Value::Enum("summer".into())
        );
        assert!(matches!(
            season.parse("spring"),
            Err(ValueError::NotAllowed { .. })
        ));
    }

    #[test]
    fn boolean_coercion() {
        let mut domain = demo_domain();
        let id = domain
            .add_parameter("fever", "demo", true, ValueRule::Type(ValueType::Boolean))
            .unwrap();
        let fever = domain.parameter(id);
        assert_eq!(fever.parse("yes").unwrap(), Value::Boolean(true));
        assert_eq!(fever.parse("False").unwrap(), Value::Boolean(false));
        assert!(fever.parse("maybe").is_err());
    }

    #[test]
    fn values_compare_within_variant() {
        assert!(Value::Integer(85) > Value::Integer(80));
        assert!(Value::Boolean(false) < Value::Boolean(true));
        assert_eq!(
            Value::Integer(1).partial_cmp(&Value::Text("1".into())),
            None
        );
    }
}
