//! Statements: `(parameter, context, operator, value)` matchers.
//!
//! The same shape serves as a rule condition (tested with [`Statement::meet`])
//! and as a rule conclusion (its value is what the rule asserts).

use std::cmp::Ordering;

use crate::domain::{ContextId, Domain, ParameterId, Slot, Value};
use crate::error::{ConfigError, ConfigResult, ValueError};

/// Comparison operator of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Equal,
}

impl Operator {
    /// Parse an operator token.
    pub fn parse(token: &str) -> ConfigResult<Self> {
        match token.trim() {
            "<" => Ok(Self::LessThan),
            "<=" | "≤" => Ok(Self::LessOrEqual),
            ">" => Ok(Self::GreaterThan),
            ">=" | "≥" => Ok(Self::GreaterOrEqual),
            "=" | "==" => Ok(Self::Equal),
            other => Err(ConfigError::InvalidOperator {
                token: other.to_string(),
            }),
        }
    }

    /// Evaluate `observed OP literal`.
    pub fn holds(self, observed: &Value, literal: &Value) -> bool {
        let Some(ordering) = observed.partial_cmp(literal) else {
            return false;
        };
        match self {
            Self::LessThan => ordering == Ordering::Less,
            Self::LessOrEqual => ordering != Ordering::Greater,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::GreaterOrEqual => ordering != Ordering::Less,
            Self::Equal => ordering == Ordering::Equal,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::Equal => "=",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single `(parameter, context, operator, value)` matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub parameter: ParameterId,
    pub context: ContextId,
    pub operator: Operator,
    /// The literal, already coerced through the parameter's value rule.
    pub value: Value,
}

impl Statement {
    /// Build a statement from names, coercing the literal.
    pub fn new(
        domain: &Domain,
        parameter: &str,
        context: &str,
        operator: &str,
        literal: &Value,
    ) -> ConfigResult<Self> {
        let parameter = domain.parameter_id(parameter)?;
        let context = domain.context_id(context)?;
        let operator = Operator::parse(operator)?;
        let param = domain.parameter(parameter);
        let value = param
            .coerce(literal)
            .map_err(|source| ConfigError::InvalidLiteral {
                parameter: param.name.clone(),
                source,
            })?;
        Ok(Self {
            parameter,
            context,
            operator,
            value,
        })
    }

    /// The (context, parameter) pair this statement talks about.
    pub fn slot(&self) -> Slot {
        Slot::new(self.context, self.parameter)
    }

    /// Whether an observed value satisfies this statement.
    ///
    /// The candidate is coerced through the parameter's value rule first; a
    /// value the parameter cannot hold is an error, not a mismatch.
    pub fn meet(&self, domain: &Domain, candidate: &Value) -> Result<bool, ValueError> {
        let param = domain.parameter(self.parameter);
        let observed = param.coerce(candidate)?;
        Ok(self.operator.holds(&observed, &self.value))
    }

    /// Render with names resolved through `domain`.
    pub fn display<'a>(&'a self, domain: &'a Domain) -> StatementDisplay<'a> {
        StatementDisplay {
            statement: self,
            domain,
        }
    }
}

/// [`Statement`] paired with its domain for printing.
pub struct StatementDisplay<'a> {
    statement: &'a Statement,
    domain: &'a Domain,
}

impl std::fmt::Display for StatementDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.statement;
        write!(
            f,
            "{} of {} {} {}",
            self.domain.parameter(s.parameter).name,
            self.domain.context(s.context).name,
            s.operator,
            s.value
        )
    }
}
