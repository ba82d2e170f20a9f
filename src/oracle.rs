//! The oracle: whoever answers questions the rules cannot.
//!
//! [`Oracle`] is a synchronous capability. The executor poses a [`Question`],
//! reads back raw reply text, and interprets it with [`Reply::parse`] and
//! [`parse_answer`]. [`TerminalOracle`] talks to a person over any
//! reader/writer pair; [`ScriptedOracle`] replays canned replies for tests
//! and batch runs.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::cf;
use crate::domain::{Parameter, Value};
use crate::error::{OracleError, ValueError};

/// Shown for the `help` command.
pub const HELP: &str = "\
Type one of the following:
 ?        - to see possible answers for this parameter
 rule     - to show the current rule
 why      - to see why this question is asked
 help     - to see this list
 unknown  - if you do not know the answer
 xxx      - (for some specific xxx) if there is a definite answer
 xxx .5, yyy .4
          - if there are several answers with different certainty factors
            (end a single weighted answer with a comma: `xxx .5,`)";

/// What the executor wants to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question<'a> {
    pub context: &'a str,
    pub parameter: &'a str,
}

impl std::fmt::Display for Question<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "What is the {} of {}?", self.parameter, self.context)
    }
}

/// Source of parameter values outside the rule base.
pub trait Oracle {
    /// Pose a question and block until a reply arrives.
    ///
    /// `Ok(None)` means no further input will ever come (end of stream).
    fn query(&mut self, question: &Question<'_>) -> Result<Option<String>, OracleError>;

    /// Show informational text (help, explanations, error hints).
    fn show(&mut self, text: &str) -> Result<(), OracleError>;
}

impl<T: Oracle + ?Sized> Oracle for &mut T {
    fn query(&mut self, question: &Question<'_>) -> Result<Option<String>, OracleError> {
        (**self).query(question)
    }

    fn show(&mut self, text: &str) -> Result<(), OracleError> {
        (**self).show(text)
    }
}

// ---------------------------------------------------------------------------
// Reply interpretation
// ---------------------------------------------------------------------------

/// One line typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    /// Nothing typed; ask again.
    Empty,
    /// Explicit "I don't know".
    NoAnswer,
    Help,
    Why,
    Rule,
    /// `?`: list legal values or the expected type.
    Legal,
    /// Anything else: a value or a weighted value list.
    Answer(&'a str),
}

impl<'a> Reply<'a> {
    /// Classify a reply. `no_answer` is the explicit non-answer token.
    pub fn parse(text: &'a str, no_answer: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::Empty;
        }
        if text.eq_ignore_ascii_case(no_answer) {
            return Self::NoAnswer;
        }
        match text.to_lowercase().as_str() {
            "help" => Self::Help,
            "why" => Self::Why,
            "rule" => Self::Rule,
            "?" => Self::Legal,
            _ => Self::Answer(text),
        }
    }
}

/// Turn an answer into `(value, cf)` pairs for `param`.
///
/// Without a comma the whole answer is one value held with certainty.
/// Otherwise each comma-separated item is `value weight`; empty items are
/// skipped, so `summer .6,` is a single weighted answer. Either every item is
/// valid or nothing is returned.
pub fn parse_answer(param: &Parameter, answer: &str) -> Result<Vec<(Value, f64)>, ValueError> {
    if !answer.contains(',') {
        return Ok(vec![(param.parse(answer)?, cf::TRUE)]);
    }

    let mut pairs = Vec::new();
    for item in answer.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let malformed = || ValueError::MalformedAnswer { pair: item.into() };
        let (value, weight) = item.rsplit_once(char::is_whitespace).ok_or_else(malformed)?;
        let weight: f64 = weight.parse().map_err(|_| malformed())?;
        if !cf::is_valid(weight) {
            return Err(ValueError::WeightOutOfRange { weight });
        }
        pairs.push((param.parse(value)?, weight));
    }
    if pairs.is_empty() {
        return Err(ValueError::MalformedAnswer {
            pair: answer.into(),
        });
    }
    Ok(pairs)
}

// ---------------------------------------------------------------------------
// Terminal oracle
// ---------------------------------------------------------------------------

/// Asks a person over a line-oriented reader and writer.
pub struct TerminalOracle<R, W> {
    input: R,
    output: W,
}

impl TerminalOracle<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompt on stderr, read answers from stdin. Stdout stays free for the
    /// findings.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalOracle<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Recover the writer, e.g. to inspect a transcript.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Oracle for TerminalOracle<R, W> {
    fn query(&mut self, question: &Question<'_>) -> Result<Option<String>, OracleError> {
        write!(self.output, "{question} ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn show(&mut self, text: &str) -> Result<(), OracleError> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scripted oracle
// ---------------------------------------------------------------------------

/// Replays a fixed list of replies and records everything it was told.
///
/// Once the script runs out every further question gets no reply, which the
/// executor treats as "no answer".
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    replies: VecDeque<String>,
    questions: Vec<(String, String)>,
    shown: Vec<String>,
}

impl ScriptedOracle {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Every `(context, parameter)` asked about, in order, one entry per prompt.
    pub fn questions(&self) -> &[(String, String)] {
        &self.questions
    }

    /// Every text shown via [`Oracle::show`].
    pub fn shown(&self) -> &[String] {
        &self.shown
    }

    /// Replies not consumed yet.
    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

impl Oracle for ScriptedOracle {
    fn query(&mut self, question: &Question<'_>) -> Result<Option<String>, OracleError> {
        self.questions
            .push((question.context.to_string(), question.parameter.to_string()));
        Ok(self.replies.pop_front())
    }

    fn show(&mut self, text: &str) -> Result<(), OracleError> {
        self.shown.push(text.to_string());
        Ok(())
    }
}
