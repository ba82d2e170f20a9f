//! Weighted rules: conjunctive conditions imply conjunctive conclusions.
//!
//! Rules are data. Applying one pulls every condition's parameter through the
//! executor's backward-chaining resolution, folds the condition CFs with
//! [`cf_and`], scales the result by the rule's own CF, and records the outcome
//! for each conclusion in the certainty store.

use crate::cf::{self, cf_and};
use crate::domain::Domain;
use crate::error::{ConfigError, ConfigResult, ExecResult, ValueError};
use crate::executor::{Executor, Focus};
use crate::oracle::Oracle;
use crate::statement::Statement;
use crate::store::CertaintyStore;

/// Position of a rule in its knowledge base (registration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) u32);

impl RuleId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RULE {}", self.0)
    }
}

/// IF all conditions THEN all conclusions, with certainty `cf`.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: RuleId,
    /// Optional label shown in explanations.
    pub name: Option<String>,
    pub conditions: Vec<Statement>,
    pub conclusions: Vec<Statement>,
    pub cf: f64,
}

impl Rule {
    /// Create a rule. The CF must be a legal certainty factor.
    pub fn new(
        id: RuleId,
        name: Option<String>,
        conditions: Vec<Statement>,
        conclusions: Vec<Statement>,
        cf: f64,
    ) -> ConfigResult<Self> {
        if !cf::is_valid(cf) {
            return Err(ConfigError::CfOutOfRange { cf });
        }
        Ok(Self {
            id,
            name,
            conditions,
            conclusions,
            cf,
        })
    }

    /// Current CF of a condition: the sum over every stored value of its slot
    /// that satisfies it, clamped into `[-1, 1]`.
    ///
    /// Several stored values may each satisfy a condition such as `>= 5`;
    /// they all contribute.
    pub fn evaluate_condition(
        condition: &Statement,
        domain: &Domain,
        store: &CertaintyStore,
    ) -> Result<f64, ValueError> {
        let mut total = cf::UNKNOWN;
        for (value, value_cf) in store.get(condition.slot()) {
            if condition.meet(domain, value)? {
                total += value_cf;
            }
        }
        Ok(cf::clamp(total))
    }

    /// Conjunctive CF of the conditions, or `None` if the rule cannot fire.
    ///
    /// A cheap pass over what is already known rejects rules with a false
    /// condition before anything is asked or inferred. The full pass then
    /// resolves each condition in order and stops as soon as the running
    /// conjunction is no longer true.
    pub fn applicable<O: Oracle>(&self, exec: &mut Executor<'_, O>) -> ExecResult<Option<f64>> {
        let domain = exec.knowledge().domain();

        for condition in &self.conditions {
            if cf::is_false(Self::evaluate_condition(condition, domain, exec.store())?) {
                tracing::debug!(rule = %self.id, "rejected by pre-check");
                return Ok(None);
            }
        }

        let mut total = cf::TRUE;
        for condition in &self.conditions {
            exec.resolve(condition.slot())?;
            let condition_cf = Self::evaluate_condition(condition, domain, exec.store())?;
            total = cf_and(total, condition_cf);
            if !cf::is_true(total) {
                tracing::debug!(rule = %self.id, cf = total, "condition not satisfied");
                return Ok(None);
            }
        }
        Ok(Some(total))
    }

    /// Try to fire the rule. Returns whether its conclusions were recorded.
    ///
    /// The rule is the executor's focus while it is evaluated, so a question
    /// asked on its behalf can be explained; the previous focus is restored
    /// afterwards.
    pub fn apply<O: Oracle>(&self, exec: &mut Executor<'_, O>) -> ExecResult<bool> {
        let previous = exec.set_focus(Focus::Rule(self.id));
        let outcome = self.fire(exec);
        exec.set_focus(previous);
        outcome
    }

    fn fire<O: Oracle>(&self, exec: &mut Executor<'_, O>) -> ExecResult<bool> {
        let Some(strength) = self.applicable(exec)? else {
            return Ok(false);
        };
        let effective = self.cf * strength;
        if !cf::is_true(effective) {
            tracing::debug!(rule = %self.id, cf = effective, "too weak to conclude");
            return Ok(false);
        }
        for conclusion in &self.conclusions {
            exec.record(conclusion.slot(), conclusion.value.clone(), effective);
        }
        tracing::debug!(rule = %self.id, cf = effective, "applied");
        Ok(true)
    }

    /// Render with names resolved through `domain`.
    pub fn display<'a>(&'a self, domain: &'a Domain) -> RuleDisplay<'a> {
        RuleDisplay { rule: self, domain }
    }
}

/// Apply every rule in order, without stopping at the first success.
///
/// Independent rules concluding the same value each contribute evidence,
/// combined by the store. Returns whether any rule applied.
pub fn use_rules<O: Oracle>(rules: &[&Rule], exec: &mut Executor<'_, O>) -> ExecResult<bool> {
    let mut applied = false;
    for rule in rules {
        if rule.apply(exec)? {
            applied = true;
        }
    }
    Ok(applied)
}

/// [`Rule`] paired with its domain for printing.
pub struct RuleDisplay<'a> {
    rule: &'a Rule,
    domain: &'a Domain,
}

impl std::fmt::Display for RuleDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = self.rule;
        match &rule.name {
            Some(name) => writeln!(f, "{} ({name}):", rule.id)?,
            None => writeln!(f, "{}:", rule.id)?,
        }
        for (i, condition) in rule.conditions.iter().enumerate() {
            let keyword = if i == 0 { "IF  " } else { "AND " };
            writeln!(f, "  {keyword} {}", condition.display(self.domain))?;
        }
        for (i, conclusion) in rule.conclusions.iter().enumerate() {
            if i == 0 {
                writeln!(f, "  THEN ({}) {}", rule.cf, conclusion.display(self.domain))?;
            } else {
                writeln!(f, "  AND  {}", conclusion.display(self.domain))?;
            }
        }
        Ok(())
    }
}
