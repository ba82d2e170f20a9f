//! Knowledge files: JSON or TOML documents describing a knowledge base.
//!
//! A file has three sections, loaded in this order:
//!
//! ```json
//! {
//!   "contexts":   [{"name": "demo", "initial_data": ["temp"], "goals": ["season"]}],
//!   "parameters": [{"name": "temp", "ctx_name": "demo", "ask_first": true, "param_type": "int"},
//!                  {"name": "season", "ctx_name": "demo", "allowed_values": ["summer", "winter"]}],
//!   "rules":      [{"conditions":  [["temp", "demo", ">=", 80]],
//!                   "conclusions": [["season", "demo", "=", "summer"]],
//!                   "cf": 0.9}]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Value, ValueRule, ValueType};
use crate::error::{ConfigError, ConfigResult};
use crate::knowledge::{KnowledgeBase, KnowledgeBuilder, StatementDef};

/// A literal as written in a knowledge file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Boolean(b) => Value::Boolean(b),
            Literal::Integer(i) => Value::Integer(i),
            Literal::Text(s) => Value::Text(s),
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextDef {
    pub name: String,
    #[serde(default)]
    pub initial_data: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(alias = "context")]
    pub ctx_name: String,
    #[serde(default)]
    pub ask_first: bool,
    /// `int`, `str` or `bool`. Takes precedence over `allowed_values`.
    #[serde(default)]
    pub param_type: Option<String>,
    #[serde(default)]
    pub allowed_values: Option<Vec<Literal>>,
}

impl ParameterDef {
    fn value_rule(&self) -> ConfigResult<ValueRule> {
        if let Some(tag) = &self.param_type {
            return ValueType::from_tag(tag)
                .map(ValueRule::Type)
                .ok_or_else(|| ConfigError::UnknownType {
                    parameter: self.name.clone(),
                    type_tag: tag.clone(),
                });
        }
        match &self.allowed_values {
            Some(values) => Ok(ValueRule::OneOf(
                values.iter().map(ToString::to_string).collect(),
            )),
            None => Err(ConfigError::MissingValueRule {
                parameter: self.name.clone(),
            }),
        }
    }
}

/// `[parameter, context, operator, value]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStatement(pub String, pub String, pub String, pub Literal);

impl From<RawStatement> for StatementDef {
    fn from(RawStatement(parameter, context, operator, value): RawStatement) -> Self {
        StatementDef::new(parameter, context, operator, Value::from(value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub conditions: Vec<RawStatement>,
    pub conclusions: Vec<RawStatement>,
    pub cf: f64,
}

/// Parsed contents of a knowledge file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFile {
    pub contexts: Vec<ContextDef>,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

impl KnowledgeFile {
    pub fn from_json(text: &str, origin: &str) -> ConfigResult<Self> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.into(),
            message: e.to_string(),
        })
    }

    pub fn from_toml(text: &str, origin: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.into(),
            message: e.to_string(),
        })
    }

    /// Read a file; `.toml` files are TOML, anything else JSON.
    pub fn read(path: &Path) -> ConfigResult<Self> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: origin.clone(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&text, &origin),
            _ => Self::from_json(&text, &origin),
        }
    }

    /// Validate and assemble: contexts, then parameters, then rules.
    pub fn build(self) -> ConfigResult<KnowledgeBase> {
        let mut builder = KnowledgeBuilder::new();

        for context in self.contexts {
            builder.context(&context.name, context.initial_data, context.goals)?;
        }
        for parameter in &self.parameters {
            builder.parameter(
                &parameter.name,
                &parameter.ctx_name,
                parameter.ask_first,
                parameter.value_rule()?,
            )?;
        }
        for rule in self.rules {
            builder.rule(
                rule.name.as_deref(),
                rule.conditions.into_iter().map(Into::into).collect(),
                rule.conclusions.into_iter().map(Into::into).collect(),
                rule.cf,
            )?;
        }
        builder.build()
    }
}

/// Read and build a knowledge base in one step.
pub fn load_path(path: &Path) -> ConfigResult<KnowledgeBase> {
    let kb = KnowledgeFile::read(path)?.build()?;
    tracing::info!(
        path = %path.display(),
        contexts = kb.domain().contexts().len(),
        parameters = kb.domain().parameters().len(),
        rules = kb.rules().len(),
        "knowledge base loaded"
    );
    Ok(kb)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO_JSON: &str = r#"{
        "contexts": [{"name": "demo", "initial_data": ["temp"], "goals": ["season"]}],
        "parameters": [
            {"name": "temp", "ctx_name": "demo", "ask_first": true, "param_type": "int"},
            {"name": "season", "ctx_name": "demo", "allowed_values": ["summer", "winter"]}
        ],
        "rules": [
            {"conditions": [["temp", "demo", ">=", 80]],
             "conclusions": [["season", "demo", "=", "summer"]],
             "cf": 0.9}
        ]
    }"#;

    const DEMO_TOML: &str = r#"
        [[contexts]]
        name = "demo"
        initial_data = ["temp"]
        goals = ["season"]

        [[parameters]]
        name = "temp"
        ctx_name = "demo"
        ask_first = true
        param_type = "int"

        [[parameters]]
        name = "season"
        context = "demo"
        allowed_values = ["summer", "winter"]

        [[rules]]
        name = "hot"
        conditions = [["temp", "demo", ">=", 80]]
        conclusions = [["season", "demo", "=", "summer"]]
        cf = 0.9
    "#;

    #[test]
    fn json_and_toml_agree() {
        let from_json = KnowledgeFile::from_json(DEMO_JSON, "demo.json")
            .unwrap()
            .build()
            .unwrap();
        let from_toml = KnowledgeFile::from_toml(DEMO_TOML, "demo.toml")
            .unwrap()
            .build()
            .unwrap();

        for kb in [&from_json, &from_toml] {
            assert_eq!(kb.context_names(), vec!["demo"]);
            assert_eq!(kb.domain().parameters().len(), 2);
            assert_eq!(kb.rules().len(), 1);
            assert_eq!(kb.rules()[0].conditions[0].value, Value::Integer(80));
        }
        assert_eq!(from_toml.rules()[0].name.as_deref(), Some("hot"));
    }

    #[test]
    fn duplicate_parameter_fails_load() {
        let json = DEMO_JSON.replace(r#""name": "season""#, r#""name": "temp""#);
        let err = KnowledgeFile::from_json(&json, "dup.json").unwrap().build();
        assert!(matches!(err, Err(ConfigError::DuplicateParameter { .. })));
    }

    #[test]
    fn duplicate_rule_name_fails_load() {
        let toml = format!(
            "{DEMO_TOML}\n[[rules]]\nname = \"hot\"\nconclusions = [[\"season\", \"demo\", \"=\", \"winter\"]]\ncf = 0.3\n"
        );
        let err = KnowledgeFile::from_toml(&toml, "dup.toml").unwrap().build();
        assert!(matches!(err, Err(ConfigError::DuplicateRule { .. })));
    }

    #[test]
    fn unknown_type_tag_fails_load() {
        let json = DEMO_JSON.replace(r#""param_type": "int""#, r#""param_type": "float""#);
        let err = KnowledgeFile::from_json(&json, "bad.json").unwrap().build();
        assert!(matches!(err, Err(ConfigError::UnknownType { .. })));
    }

    #[test]
    fn missing_value_rule_fails_load() {
        let json = DEMO_JSON.replace(r#", "allowed_values": ["summer", "winter"]"#, "");
        let err = KnowledgeFile::from_json(&json, "bad.json").unwrap().build();
        assert!(matches!(err, Err(ConfigError::MissingValueRule { .. })));
    }

    #[test]
    fn out_of_range_cf_fails_load() {
        let json = DEMO_JSON.replace(r#""cf": 0.9"#, r#""cf": 1.9"#);
        let err = KnowledgeFile::from_json(&json, "bad.json").unwrap().build();
        assert!(matches!(err, Err(ConfigError::CfOutOfRange { .. })));
    }

    #[test]
    fn malformed_document_is_parse_error() {
        assert!(matches!(
            KnowledgeFile::from_json("{\"contexts\": 3}", "bad.json"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn numeric_allowed_values_become_text() {
        let json = DEMO_JSON.replace(r#"["summer", "winter"]"#, r#"[1, 2]"#).replace(
            r#"["season", "demo", "=", "summer"]"#,
            r#"["season", "demo", "=", 2]"#,
        );
        let kb = KnowledgeFile::from_json(&json, "n.json").unwrap().build().unwrap();
        assert_eq!(
            kb.rules()[0].conclusions[0].value,
            Value::Enum("2".into())
        );
    }
}
