//! Findings: what a run concluded about each context's goals.

use serde::Serialize;

use crate::domain::Value;

/// One candidate value of a goal and its certainty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub value: Value,
    pub cf: f64,
}

/// All candidate values of one goal parameter, by descending CF.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalFinding {
    pub parameter: String,
    pub values: Vec<Finding>,
}

impl GoalFinding {
    /// Whether nothing at all was concluded for the goal.
    pub fn is_undetermined(&self) -> bool {
        self.values.is_empty()
    }

    /// The most certain value, if any.
    pub fn best(&self) -> Option<&Finding> {
        self.values.first()
    }
}

/// Goal findings of one context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextFindings {
    pub context: String,
    pub goals: Vec<GoalFinding>,
}

impl ContextFindings {
    pub fn goal(&self, parameter: &str) -> Option<&GoalFinding> {
        self.goals.iter().find(|g| g.parameter == parameter)
    }
}

/// Result of [`Executor::execute`](crate::executor::Executor::execute).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Findings {
    pub contexts: Vec<ContextFindings>,
}

impl Findings {
    pub fn context(&self, name: &str) -> Option<&ContextFindings> {
        self.contexts.iter().find(|c| c.context == name)
    }
}

/// Print a CF without floating-point noise (`0.8`, not `0.8000000000000002`).
fn format_cf(cf: f64) -> String {
    // Adding +0.0 turns a rounded -0 into 0.
    let rounded = (cf * 1e4).round() / 1e4 + 0.0;
    format!("{rounded}")
}

impl std::fmt::Display for Findings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for context in &self.contexts {
            writeln!(f, "Findings for {}:", context.context)?;
            for goal in &context.goals {
                if goal.is_undetermined() {
                    writeln!(f, "{}: undetermined", goal.parameter)?;
                    continue;
                }
                let values: Vec<String> = goal
                    .values
                    .iter()
                    .map(|v| format!("{} {}", v.value, format_cf(v.cf)))
                    .collect();
                writeln!(f, "{}: {}", goal.parameter, values.join(", "))?;
            }
        }
        Ok(())
    }
}
