//! Backward-chaining executor.
//!
//! The [`Executor`] resolves (context, parameter) slots on demand. Each
//! parameter's `ask_first` flag picks the strategy: ask the oracle and fall
//! back to rules, or apply rules and fall back to the oracle. Resolution is
//! memoized per run, so a slot is inferred at most once and asked about at
//! most once; re-entering a slot that is still being resolved is reported as
//! a circular dependency.
//!
//! ```
//! use emycin::domain::{ValueRule, ValueType};
//! use emycin::executor::Executor;
//! use emycin::knowledge::{KnowledgeBuilder, StatementDef};
//! use emycin::oracle::ScriptedOracle;
//!
//! let mut kb = KnowledgeBuilder::new();
//! kb.context("demo", ["temp"], ["season"]).unwrap();
//! kb.parameter("temp", "demo", true, ValueRule::Type(ValueType::Integer)).unwrap();
//! kb.parameter(
//!     "season",
//!     "demo",
//!     false,
//!     ValueRule::OneOf(vec!["summer".into(), "winter".into()]),
//! )
//! .unwrap();
//! kb.rule(
//!     None,
//!     vec![StatementDef::new("temp", "demo", ">=", 80)],
//!     vec![StatementDef::new("season", "demo", "=", "summer")],
//!     0.9,
//! )
//! .unwrap();
//! let kb = kb.build().unwrap();
//!
//! let mut exec = Executor::new(&kb, ScriptedOracle::new(["85"]));
//! let findings = exec.execute(&["demo"]).unwrap();
//! assert_eq!(findings.to_string(), "Findings for demo:\nseason: summer 0.9\n");
//! ```

use std::collections::HashSet;

use crate::cf;
use crate::config::ExecutorConfig;
use crate::domain::{ContextId, ParameterId, Slot, Value};
use crate::error::{ExecError, ExecResult, ValueError};
use crate::knowledge::KnowledgeBase;
use crate::oracle::{self, Oracle, Question, Reply};
use crate::report::{ContextFindings, Finding, Findings, GoalFinding};
use crate::rule::{self, Rule, RuleId};
use crate::store::CertaintyStore;

/// What the executor is currently working on, for explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Collecting a context's initial data.
    Initial,
    /// Resolving a context's goals directly.
    Goal,
    /// Evaluating a rule.
    Rule(RuleId),
}

/// Per-run bookkeeping.
#[derive(Debug, Clone)]
pub struct ExecutionState {
    /// Slots resolved successfully; only grows.
    known: HashSet<Slot>,
    /// Slots the oracle has been asked about, answered or not.
    asked: HashSet<Slot>,
    /// Slots whose resolution was tried and failed.
    exhausted: HashSet<Slot>,
    /// Slots on the current resolution path.
    in_progress: HashSet<Slot>,
    depth: usize,
    focus: Focus,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            known: HashSet::new(),
            asked: HashSet::new(),
            exhausted: HashSet::new(),
            in_progress: HashSet::new(),
            depth: 0,
            focus: Focus::Initial,
        }
    }
}

impl ExecutionState {
    pub fn is_known(&self, slot: Slot) -> bool {
        self.known.contains(&slot)
    }

    pub fn was_asked(&self, slot: Slot) -> bool {
        self.asked.contains(&slot)
    }

    pub fn is_exhausted(&self, slot: Slot) -> bool {
        self.exhausted.contains(&slot)
    }

    pub fn known_count(&self) -> usize {
        self.known.len()
    }
}

/// Resolves goals of a [`KnowledgeBase`] by backward chaining.
pub struct Executor<'kb, O> {
    kb: &'kb KnowledgeBase,
    config: ExecutorConfig,
    store: CertaintyStore,
    state: ExecutionState,
    oracle: O,
}

impl<'kb, O: Oracle> Executor<'kb, O> {
    /// Create an executor with the default configuration.
    pub fn new(kb: &'kb KnowledgeBase, oracle: O) -> Self {
        Self::with_config(kb, oracle, ExecutorConfig::default())
    }

    pub fn with_config(kb: &'kb KnowledgeBase, oracle: O, config: ExecutorConfig) -> Self {
        Self {
            kb,
            config,
            store: CertaintyStore::new(),
            state: ExecutionState::default(),
            oracle,
        }
    }

    pub fn knowledge(&self) -> &'kb KnowledgeBase {
        self.kb
    }

    pub fn store(&self) -> &CertaintyStore {
        &self.store
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Consume the executor, returning the oracle and the evidence gathered.
    pub fn into_parts(self) -> (O, CertaintyStore) {
        (self.oracle, self.store)
    }

    pub fn focus(&self) -> Focus {
        self.state.focus
    }

    /// Replace the focus, returning the previous one.
    pub fn set_focus(&mut self, focus: Focus) -> Focus {
        std::mem::replace(&mut self.state.focus, focus)
    }

    /// Add evidence for a value. Returns the combined CF.
    pub fn record(&mut self, slot: Slot, value: Value, cf: f64) -> f64 {
        let combined = self.store.update(slot, value, cf);
        tracing::debug!(
            context = %self.kb.domain().context(slot.context).name,
            parameter = %self.kb.domain().parameter(slot.parameter).name,
            cf,
            combined,
            "evidence recorded"
        );
        combined
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Resolve a parameter of a context, both given by name.
    pub fn find_out(&mut self, context: &str, parameter: &str) -> ExecResult<bool> {
        let domain = self.kb.domain();
        let slot = Slot::new(domain.context_id(context)?, domain.parameter_id(parameter)?);
        self.resolve(slot)
    }

    /// Resolve a slot, by rules or the oracle as its parameter prefers.
    ///
    /// Returns `Ok(false)` when neither produced a value; that is an
    /// undetermined parameter, not an error.
    pub fn resolve(&mut self, slot: Slot) -> ExecResult<bool> {
        if self.state.known.contains(&slot) {
            return Ok(true);
        }
        if self.state.exhausted.contains(&slot) {
            return Ok(false);
        }
        if self.state.in_progress.contains(&slot) {
            let domain = self.kb.domain();
            return Err(ExecError::Cycle {
                context: domain.context(slot.context).name.clone(),
                parameter: domain.parameter(slot.parameter).name.clone(),
            });
        }
        if let Some(max_depth) = self.config.max_depth.filter(|&max| self.state.depth >= max) {
            return Err(ExecError::DepthExceeded { max_depth });
        }

        self.state.in_progress.insert(slot);
        self.state.depth += 1;
        let outcome = self.resolve_fresh(slot);
        self.state.depth -= 1;
        self.state.in_progress.remove(&slot);

        let success = outcome?;
        if success {
            self.state.known.insert(slot);
        } else {
            self.state.exhausted.insert(slot);
        }
        Ok(success)
    }

    fn resolve_fresh(&mut self, slot: Slot) -> ExecResult<bool> {
        let param = self.kb.domain().parameter(slot.parameter);
        tracing::debug!(
            parameter = %param.name,
            ask_first = param.ask_first,
            depth = self.state.depth,
            "resolving"
        );
        if param.ask_first {
            if self.ask(slot)? {
                return Ok(true);
            }
            self.use_rules_for(slot.parameter)
        } else {
            if self.use_rules_for(slot.parameter)? {
                return Ok(true);
            }
            self.ask(slot)
        }
    }

    fn use_rules_for(&mut self, parameter: ParameterId) -> ExecResult<bool> {
        let rules = self.kb.rules_concluding(parameter);
        if rules.is_empty() {
            return Ok(false);
        }
        rule::use_rules(&rules, self)
    }

    // -----------------------------------------------------------------------
    // Oracle interaction
    // -----------------------------------------------------------------------

    /// Ask the oracle for a slot's value, at most once per run.
    ///
    /// The slot counts as asked as soon as the question is posed, whatever
    /// the reply. Meta commands are answered in place; invalid answers are
    /// explained and the question is posed again.
    pub fn ask(&mut self, slot: Slot) -> ExecResult<bool> {
        if !self.state.asked.insert(slot) {
            return Ok(false);
        }
        let domain = self.kb.domain();
        let param = domain.parameter(slot.parameter);
        let question = Question {
            context: &domain.context(slot.context).name,
            parameter: &param.name,
        };

        loop {
            let Some(text) = self.oracle.query(&question)? else {
                tracing::debug!(parameter = %param.name, "oracle has no more input");
                return Ok(false);
            };
            match Reply::parse(&text, &self.config.no_answer_token) {
                Reply::Empty => {}
                Reply::NoAnswer => return Ok(false),
                Reply::Help => self.oracle.show(oracle::HELP)?,
                Reply::Why => {
                    let explanation = self.explain(slot.parameter)?;
                    self.oracle.show(&explanation)?;
                }
                Reply::Rule => {
                    let text = self.describe_focus(slot.parameter);
                    self.oracle.show(&text)?;
                }
                Reply::Legal => self.oracle.show(&param.describe_legal())?,
                Reply::Answer(answer) => match oracle::parse_answer(param, answer) {
                    Ok(pairs) => {
                        for (value, cf) in pairs {
                            self.record(slot, value, cf);
                        }
                        return Ok(true);
                    }
                    Err(e) => {
                        tracing::warn!(parameter = %param.name, error = %e, "invalid answer");
                        self.oracle
                            .show(&format!("Invalid response: {e}. Type ? to see legal ones."))?;
                    }
                },
            }
        }
    }

    /// Why is `parameter` being asked for?
    ///
    /// Inside a rule, lists the rule's conditions already believed true and
    /// then the rule itself. This is a single level, not a derivation tree.
    pub fn explain(&self, parameter: ParameterId) -> Result<String, ValueError> {
        let domain = self.kb.domain();
        let name = &domain.parameter(parameter).name;
        let mut out = format!("Why is the value of {name} being asked for?");

        let id = match self.state.focus {
            Focus::Initial => {
                out.push_str(&format!("\n{name} is one of the initial parameters."));
                return Ok(out);
            }
            Focus::Goal => {
                out.push_str(&format!("\n{name} is one of the goal parameters."));
                return Ok(out);
            }
            Focus::Rule(id) => id,
        };

        let rule = self.kb.rule(id);
        let mut known = Vec::new();
        for condition in &rule.conditions {
            if cf::is_true(Rule::evaluate_condition(condition, domain, &self.store)?) {
                known.push(condition);
            }
        }
        if !known.is_empty() {
            out.push_str("\nIt is known that:");
            for condition in known {
                out.push_str(&format!("\n  {}", condition.display(domain)));
            }
            out.push_str(&format!("\nTherefore,\n{}", rule.display(domain)));
        }
        Ok(out)
    }

    fn describe_focus(&self, parameter: ParameterId) -> String {
        let domain = self.kb.domain();
        let name = &domain.parameter(parameter).name;
        match self.state.focus {
            Focus::Initial => format!("No rule is being evaluated: {name} is initial data."),
            Focus::Goal => format!("No rule is being evaluated: {name} is a goal."),
            Focus::Rule(id) => self.kb.rule(id).display(domain).to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // Runs
    // -----------------------------------------------------------------------

    /// Run the named contexts in order and report their goals.
    ///
    /// For each context the initial data is resolved eagerly, then every
    /// goal. All names are checked before anything is resolved.
    pub fn execute<S: AsRef<str>>(&mut self, context_names: &[S]) -> ExecResult<Findings> {
        let domain = self.kb.domain();
        let contexts = context_names
            .iter()
            .map(|name| domain.context_id(name.as_ref()))
            .collect::<Result<Vec<ContextId>, _>>()?;

        let mut findings = Findings::default();
        for context_id in contexts {
            let context = domain.context(context_id);
            tracing::info!(context = %context.name, "executing context");

            self.set_focus(Focus::Initial);
            for name in &context.initial_data {
                let slot = Slot::new(context_id, domain.parameter_id(name)?);
                self.resolve(slot)?;
            }

            self.set_focus(Focus::Goal);
            for name in &context.goals {
                let slot = Slot::new(context_id, domain.parameter_id(name)?);
                if !self.resolve(slot)? {
                    tracing::info!(context = %context.name, goal = %name, "goal undetermined");
                }
            }

            tracing::info!(
                context = %context.name,
                known = self.state.known_count(),
                slots_with_evidence = self.store.len(),
                "context finished"
            );
            if context.goals.is_empty() {
                continue;
            }
            let mut goals = Vec::with_capacity(context.goals.len());
            for name in &context.goals {
                let slot = Slot::new(context_id, domain.parameter_id(name)?);
                let values = self
                    .store
                    .ranked(slot)
                    .into_iter()
                    .map(|(value, cf)| Finding { value, cf })
                    .collect();
                goals.push(GoalFinding {
                    parameter: name.clone(),
                    values,
                });
            }
            findings.contexts.push(ContextFindings {
                context: context.name.clone(),
                goals,
            });
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ValueRule, ValueType};
    use crate::knowledge::{KnowledgeBuilder, StatementDef};
    use crate::oracle::ScriptedOracle;

    fn base() -> KnowledgeBuilder {
        let mut b = KnowledgeBuilder::new();
        b.context("demo", ["temp"], ["season"]).unwrap();
        b.parameter("temp", "demo", true, ValueRule::Type(ValueType::Integer))
            .unwrap();
        b.parameter(
            "season",
            "demo",
            false,
            ValueRule::OneOf(vec!["summer".into(), "winter".into()]),
        )
        .unwrap();
        b
    }

    fn summer_rule(b: &mut KnowledgeBuilder, cf: f64) {
        b.rule(
            None,
            vec![StatementDef::new("temp", "demo", ">=", 80)],
            vec![StatementDef::new("season", "demo", "=", "summer")],
            cf,
        )
        .unwrap();
    }

    fn slot(kb: &KnowledgeBase, parameter: &str) -> Slot {
        let d = kb.domain();
        Slot::new(d.context_id("demo").unwrap(), d.parameter_id(parameter).unwrap())
    }

    #[test]
    fn infer_first_uses_rules() {
        let mut b = base();
        summer_rule(&mut b, 0.9);
        let kb = b.build().unwrap();
        let mut exec = Executor::new(&kb, ScriptedOracle::new(["85"]));

        assert!(exec.find_out("demo", "season").unwrap());
        let cf = exec
            .store()
            .cf_of(slot(&kb, "season"), &Value::Enum("summer".into()));
        assert!((cf - 0.9).abs() < 1e-9);
        // Only temp was asked; season came from the rule.
        assert_eq!(
            exec.oracle().questions(),
            &[("demo".to_string(), "temp".to_string())]
        );
    }

    #[test]
    fn infer_first_falls_back_to_oracle() {
        let mut b = base();
        summer_rule(&mut b, 0.9);
        let kb = b.build().unwrap();
        let mut exec = Executor::new(&kb, ScriptedOracle::new(["50", "winter"]));

        assert!(exec.find_out("demo", "season").unwrap());
        let ranked = exec.store().ranked(slot(&kb, "season"));
        assert_eq!(ranked, vec![(Value::Enum("winter".into()), 1.0)]);
    }

    #[test]
    fn ask_first_falls_back_to_rules() {
        let mut b = base();
        b.parameter("alert", "demo", true, ValueRule::Type(ValueType::Boolean))
            .unwrap();
        b.rule(
            None,
            vec![StatementDef::new("temp", "demo", ">", 100)],
            vec![StatementDef::new("alert", "demo", "=", true)],
            0.7,
        )
        .unwrap();
        let kb = b.build().unwrap();
        let mut exec = Executor::new(&kb, ScriptedOracle::new(["unknown", "120"]));

        assert!(exec.find_out("demo", "alert").unwrap());
        let cf = exec
            .store()
            .cf_of(slot(&kb, "alert"), &Value::Boolean(true));
        assert!((cf - 0.7).abs() < 1e-9);
    }

    #[test]
    fn find_out_is_memoized() {
        let mut b = base();
        summer_rule(&mut b, 0.9);
        let kb = b.build().unwrap();
        let mut exec = Executor::new(&kb, ScriptedOracle::new(["85", "85"]));

        assert!(exec.find_out("demo", "season").unwrap());
        assert!(exec.find_out("demo", "season").unwrap());
        let cf = exec
            .store()
            .cf_of(slot(&kb, "season"), &Value::Enum("summer".into()));
        // Applying the rule twice would have given 0.99.
        assert!((cf - 0.9).abs() < 1e-9);
        assert_eq!(exec.oracle().questions().len(), 1);
    }

    #[test]
    fn failed_resolution_is_not_retried() {
        let kb = base().build().unwrap();
        let mut exec = Executor::new(&kb, ScriptedOracle::new(["unknown", "85"]));

        assert!(!exec.find_out("demo", "temp").unwrap());
        assert!(!exec.find_out("demo", "temp").unwrap());
        assert_eq!(exec.oracle().questions().len(), 1);
        assert!(exec.state().was_asked(slot(&kb, "temp")));
        assert!(exec.state().is_exhausted(slot(&kb, "temp")));
        assert!(!exec.state().is_known(slot(&kb, "temp")));
    }

    #[test]
    fn meta_commands_do_not_consume_question() {
        let kb = base().build().unwrap();
        let mut exec = Executor::new(
            &kb,
            ScriptedOracle::new(["", "help", "?", "rule", "why", "hot", "85"]),
        );

        assert!(exec.find_out("demo", "temp").unwrap());
        let shown = exec.oracle().shown();
        assert_eq!(shown[0], oracle::HELP);
        assert_eq!(shown[1], "temp must be of type integer");
        assert!(shown[2].contains("initial data"));
        assert!(shown[3].ends_with("temp is one of the initial parameters."));
        assert!(shown[4].starts_with("Invalid response"));
        assert_eq!(exec.oracle().questions().len(), 7);
        assert_eq!(
            exec.store().ranked(slot(&kb, "temp")),
            vec![(Value::Integer(85), 1.0)]
        );
    }

    #[test]
    fn exhausted_script_is_no_answer() {
        let kb = base().build().unwrap();
        let mut exec = Executor::new(&kb, ScriptedOracle::new(Vec::<String>::new()));
        assert!(!exec.find_out("demo", "temp").unwrap());
    }

    #[test]
    fn why_inside_rule_lists_known_conditions() {
        let mut b = base();
        b.parameter("humid", "demo", false, ValueRule::Type(ValueType::Boolean))
            .unwrap();
        b.rule(
            Some("muggy"),
            vec![
                StatementDef::new("temp", "demo", ">=", 80),
                StatementDef::new("humid", "demo", "=", true),
            ],
            vec![StatementDef::new("season", "demo", "=", "summer")],
            0.8,
        )
        .unwrap();
        let kb = b.build().unwrap();
        let mut exec = Executor::new(&kb, ScriptedOracle::new(["85", "why", "yes"]));

        assert!(exec.find_out("demo", "season").unwrap());
        let why = &exec.oracle().shown()[0];
        assert!(why.starts_with("Why is the value of humid being asked for?"));
        assert!(why.contains("It is known that:\n  temp of demo >= 80"));
        assert!(why.contains("RULE 0 (muggy):"));
    }

    #[test]
    fn cycle_is_detected() {
        let mut b = base();
        b.parameter("pressure", "demo", false, ValueRule::Type(ValueType::Integer))
            .unwrap();
        b.rule(
            None,
            vec![StatementDef::new("pressure", "demo", ">", 1)],
            vec![StatementDef::new("season", "demo", "=", "summer")],
            0.5,
        )
        .unwrap();
        b.rule(
            None,
            vec![StatementDef::new("season", "demo", "=", "summer")],
            vec![StatementDef::new("pressure", "demo", "=", 2)],
            0.5,
        )
        .unwrap();
        let kb = b.build().unwrap();
        let mut exec = Executor::new(&kb, ScriptedOracle::new(Vec::<String>::new()));

        let err = exec.find_out("demo", "season").unwrap_err();
        assert!(matches!(err, ExecError::Cycle { .. }));
    }

    #[test]
    fn depth_limit_enforced() {
        let mut b = base();
        summer_rule(&mut b, 0.9);
        let kb = b.build().unwrap();
        let config = ExecutorConfig {
            max_depth: Some(1),
            ..Default::default()
        };
        let mut exec = Executor::with_config(&kb, ScriptedOracle::new(["85"]), config);
        assert!(matches!(
            exec.find_out("demo", "season"),
            Err(ExecError::DepthExceeded { max_depth: 1 })
        ));
    }

    #[test]
    fn execute_reports_goals_by_descending_cf() {
        let mut b = base();
        summer_rule(&mut b, 0.9);
        b.rule(
            None,
            vec![StatementDef::new("temp", "demo", ">=", 60)],
            vec![StatementDef::new("season", "demo", "=", "winter")],
            0.3,
        )
        .unwrap();
        let kb = b.build().unwrap();
        let mut exec = Executor::new(&kb, ScriptedOracle::new(["85"]));

        let findings = exec.execute(&["demo"]).unwrap();
        let season = findings.context("demo").unwrap().goal("season").unwrap();
        let values: Vec<String> = season.values.iter().map(|f| f.value.to_string()).collect();
        assert_eq!(values, vec!["summer", "winter"]);
        assert_eq!(exec.focus(), Focus::Goal);
    }

    #[test]
    fn execute_rejects_unknown_context_before_asking() {
        let kb = base().build().unwrap();
        let mut exec = Executor::new(&kb, ScriptedOracle::new(["85"]));
        assert!(matches!(
            exec.execute(&["demo", "lab"]),
            Err(ExecError::Config(_))
        ));
        assert!(exec.oracle().questions().is_empty());
    }
}
