//! Rich diagnostic error types for the emycin shell.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so knowledge engineers
//! know exactly which definition is wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the emycin shell.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum EmycinError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Oracle(#[from] OracleError),
}

// ---------------------------------------------------------------------------
// Configuration errors (load time)
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("duplicate context: {name}")]
    #[diagnostic(
        code(emycin::config::duplicate_context),
        help("Context names must be unique within a knowledge base. Rename or remove one of them.")
    )]
    DuplicateContext { name: String },

    #[error("duplicate parameter: {name}")]
    #[diagnostic(
        code(emycin::config::duplicate_parameter),
        help(
            "Parameter names are global, even across contexts. \
             Rename one of the parameters, e.g. by prefixing it with its context."
        )
    )]
    DuplicateParameter { name: String },

    #[error("duplicate rule name: {name}")]
    #[diagnostic(
        code(emycin::config::duplicate_rule),
        help("Rule names label explanations and must be unique. Rename one of the rules or leave it unnamed.")
    )]
    DuplicateRule { name: String },

    #[error("context not found: {name}")]
    #[diagnostic(
        code(emycin::config::unknown_context),
        help(
            "Contexts must be defined before the parameters and rules that refer to them. \
             Check the spelling against the `contexts` section."
        )
    )]
    UnknownContext { name: String },

    #[error("parameter not found: {name}")]
    #[diagnostic(
        code(emycin::config::unknown_parameter),
        help(
            "Parameters must be defined before the contexts' goals, initial data, \
             or rules can use them. Check the spelling against the `parameters` section."
        )
    )]
    UnknownParameter { name: String },

    #[error("invalid operator '{token}'")]
    #[diagnostic(
        code(emycin::config::invalid_operator),
        help("Statements accept only the operators <, <=, >, >=, =.")
    )]
    InvalidOperator { token: String },

    #[error("certainty factor {cf} is outside [-1, 1]")]
    #[diagnostic(
        code(emycin::config::cf_out_of_range),
        help("A rule's certainty factor must lie between -1.0 (certainly false) and 1.0 (certainly true).")
    )]
    CfOutOfRange { cf: f64 },

    #[error("invalid literal for parameter '{parameter}': {source}")]
    #[diagnostic(
        code(emycin::config::invalid_literal),
        help("Every statement value must satisfy its parameter's type or allowed-value set.")
    )]
    InvalidLiteral {
        parameter: String,
        #[source]
        source: ValueError,
    },

    #[error("parameter '{parameter}' has an empty allowed-value set")]
    #[diagnostic(
        code(emycin::config::empty_allowed_values),
        help("List at least one allowed value, or give the parameter a `param_type` instead.")
    )]
    EmptyAllowedValues { parameter: String },

    #[error("parameter '{parameter}' has no value rule")]
    #[diagnostic(
        code(emycin::config::missing_value_rule),
        help("Give the parameter either a `param_type` (int, str, bool) or a list of `allowed_values`.")
    )]
    MissingValueRule { parameter: String },

    #[error("parameter '{parameter}' has unknown type '{type_tag}'")]
    #[diagnostic(
        code(emycin::config::unknown_type),
        help("Supported parameter types are: int, str, bool.")
    )]
    UnknownType { parameter: String, type_tag: String },

    #[error("failed to read knowledge file {path}")]
    #[diagnostic(
        code(emycin::config::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    #[diagnostic(
        code(emycin::config::parse),
        help(
            "The file must hold `contexts`, `parameters` and `rules` sections. \
             Files ending in .toml are read as TOML, everything else as JSON."
        )
    )]
    Parse { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Value errors (coercion)
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ValueError {
    #[error("'{value}' is not a valid {expected} for parameter '{parameter}'")]
    #[diagnostic(
        code(emycin::value::type_mismatch),
        help("Type ? at the prompt to see the expected type.")
    )]
    TypeMismatch {
        parameter: String,
        expected: String,
        value: String,
    },

    #[error("'{value}' is not one of the allowed values of '{parameter}': {allowed}")]
    #[diagnostic(
        code(emycin::value::not_allowed),
        help("Type ? at the prompt to list the legal values.")
    )]
    NotAllowed {
        parameter: String,
        value: String,
        allowed: String,
    },

    #[error("malformed answer '{pair}': expected `value weight`")]
    #[diagnostic(
        code(emycin::value::malformed_answer),
        help("Give a single value, or comma-separated pairs such as `summer .6, winter .4`.")
    )]
    MalformedAnswer { pair: String },

    #[error("weight {weight} is outside [-1, 1]")]
    #[diagnostic(
        code(emycin::value::weight_out_of_range),
        help("Answer weights are certainty factors between -1 and 1.")
    )]
    WeightOutOfRange { weight: f64 },
}

// ---------------------------------------------------------------------------
// Execution errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExecError {
    #[error("circular dependency while resolving '{parameter}' of '{context}'")]
    #[diagnostic(
        code(emycin::exec::cycle),
        help(
            "A rule concluding this parameter depends, directly or through other rules, \
             on the parameter itself. Break the cycle or mark the parameter ask-first."
        )
    )]
    Cycle { context: String, parameter: String },

    #[error("resolution depth exceeded maximum of {max_depth}")]
    #[diagnostic(
        code(emycin::exec::depth_exceeded),
        help("The rule chain is deeper than ExecutorConfig::max_depth. Raise or remove the limit if this is intended.")
    )]
    DepthExceeded { max_depth: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Oracle(#[from] OracleError),
}

// ---------------------------------------------------------------------------
// Oracle errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum OracleError {
    #[error("oracle I/O error: {source}")]
    #[diagnostic(
        code(emycin::oracle::io),
        help("Reading the answer from the terminal failed. Check that stdin is attached.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}

impl From<std::io::Error> for OracleError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

/// Convenience alias for functions returning emycin results.
pub type EmycinResult<T> = std::result::Result<T, EmycinError>;

/// Result type for knowledge loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type for resolution.
pub type ExecResult<T> = std::result::Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_emycin_error() {
        let err = ConfigError::DuplicateContext {
            name: "patient".into(),
        };
        let top: EmycinError = err.into();
        assert!(matches!(
            top,
            EmycinError::Config(ConfigError::DuplicateContext { .. })
        ));
    }

    #[test]
    fn exec_error_wraps_value_error() {
        let err = ValueError::NotAllowed {
            parameter: "season".into(),
            value: "spring".into(),
            allowed: "summer, winter".into(),
        };
        let exec: ExecError = err.into();
        assert!(matches!(exec, ExecError::Value(ValueError::NotAllowed { .. })));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = ExecError::Cycle {
            context: "patient".into(),
            parameter: "identity".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("patient"));
        assert!(msg.contains("identity"));

        let err = ConfigError::CfOutOfRange { cf: 1.5 };
        assert!(format!("{err}").contains("1.5"));
    }
}
