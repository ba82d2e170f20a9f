//! Knowledge base: the loaded domain and its rules.
//!
//! A [`KnowledgeBase`] is built once through a [`KnowledgeBuilder`], which
//! enforces the load order (contexts, then parameters, then rules) and rejects
//! duplicate or dangling names before any resolution starts. Afterwards it is
//! only shared immutably with the executor.

use std::collections::{HashMap, HashSet};

use crate::domain::{Domain, ParameterId, Value, ValueRule};
use crate::error::{ConfigError, ConfigResult};
use crate::rule::{Rule, RuleId};
use crate::statement::Statement;

/// A statement in name form, before it is resolved against a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementDef {
    pub parameter: String,
    pub context: String,
    pub operator: String,
    pub value: Value,
}

impl StatementDef {
    pub fn new(
        parameter: impl Into<String>,
        context: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            context: context.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    fn resolve(&self, domain: &Domain) -> ConfigResult<Statement> {
        Statement::new(
            domain,
            &self.parameter,
            &self.context,
            &self.operator,
            &self.value,
        )
    }
}

/// Immutable contexts, parameters, and rules of one expert system.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    domain: Domain,
    rules: Vec<Rule>,
    /// Conclusion parameter → rules concluding it, in registration order.
    by_conclusion: HashMap<ParameterId, Vec<RuleId>>,
}

impl KnowledgeBase {
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// All rules in registration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0 as usize]
    }

    /// Rules with a conclusion about `parameter`, in registration order.
    pub fn rules_concluding(&self, parameter: ParameterId) -> Vec<&Rule> {
        self.by_conclusion
            .get(&parameter)
            .map(|ids| ids.iter().map(|&id| self.rule(id)).collect())
            .unwrap_or_default()
    }

    /// Names of all contexts in definition order.
    pub fn context_names(&self) -> Vec<String> {
        self.domain
            .contexts()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Incrementally assembles a [`KnowledgeBase`].
#[derive(Debug, Default)]
pub struct KnowledgeBuilder {
    domain: Domain,
    rules: Vec<Rule>,
    rule_names: HashSet<String>,
    by_conclusion: HashMap<ParameterId, Vec<RuleId>>,
}

impl KnowledgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a context. Its initial data and goals are checked in [`build`](Self::build).
    pub fn context<I, G>(&mut self, name: &str, initial_data: I, goals: G) -> ConfigResult<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        self.domain.add_context(
            name,
            initial_data.into_iter().map(Into::into).collect(),
            goals.into_iter().map(Into::into).collect(),
        )?;
        Ok(())
    }

    /// Define a parameter of an existing context.
    pub fn parameter(
        &mut self,
        name: &str,
        context: &str,
        ask_first: bool,
        rule: ValueRule,
    ) -> ConfigResult<ParameterId> {
        self.domain.add_parameter(name, context, ask_first, rule)
    }

    /// Define a rule over existing parameters and contexts. Names, when
    /// given, must be unique.
    pub fn rule(
        &mut self,
        name: Option<&str>,
        conditions: Vec<StatementDef>,
        conclusions: Vec<StatementDef>,
        cf: f64,
    ) -> ConfigResult<RuleId> {
        if let Some(name) = name.filter(|n| self.rule_names.contains(*n)) {
            return Err(ConfigError::DuplicateRule { name: name.into() });
        }
        let conditions = conditions
            .iter()
            .map(|def| def.resolve(&self.domain))
            .collect::<ConfigResult<Vec<_>>>()?;
        let conclusions = conclusions
            .iter()
            .map(|def| def.resolve(&self.domain))
            .collect::<ConfigResult<Vec<_>>>()?;

        let id = RuleId(self.rules.len() as u32);
        let rule = Rule::new(id, name.map(String::from), conditions, conclusions, cf)?;
        for conclusion in &rule.conclusions {
            let indexed = self.by_conclusion.entry(conclusion.parameter).or_default();
            if indexed.last() != Some(&id) {
                indexed.push(id);
            }
        }
        if let Some(name) = name {
            self.rule_names.insert(name.into());
        }
        self.rules.push(rule);
        Ok(id)
    }

    /// Check that every context's initial data and goals name a parameter.
    pub fn build(self) -> ConfigResult<KnowledgeBase> {
        for context in self.domain.contexts() {
            for name in context.initial_data.iter().chain(&context.goals) {
                self.domain.parameter_id(name)?;
            }
        }
        tracing::debug!(
            contexts = self.domain.contexts().len(),
            parameters = self.domain.parameters().len(),
            rules = self.rules.len(),
            "knowledge base built"
        );
        Ok(KnowledgeBase {
            domain: self.domain,
            rules: self.rules,
            by_conclusion: self.by_conclusion,
        })
    }
}
