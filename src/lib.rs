// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # emycin
//!
//! A backward-chaining expert-system shell that reasons under uncertainty with
//! certainty factors, in the EMYCIN/MYCIN tradition.
//!
//! ## Architecture
//!
//! - **CF algebra** (`cf`): combination and threshold functions over `[-1, 1]`
//! - **Domain** (`domain`): contexts, parameters, typed values and coercion
//! - **Statements** (`statement`): `(parameter, context, operator, value)` matchers
//! - **Certainty store** (`store`): accumulated CF per candidate value
//! - **Rules** (`rule`): conjunctive conditions, weighted conclusions
//! - **Executor** (`executor`): goal resolution by rules or the oracle
//! - **Oracle** (`oracle`): terminal and scripted answer sources
//! - **Loader** (`loader`): JSON/TOML knowledge files
//!
//! ## Library usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! use emycin::executor::Executor;
//! use emycin::oracle::TerminalOracle;
//!
//! let kb = emycin::loader::load_path(Path::new("demos/weather.json")).unwrap();
//! let mut exec = Executor::new(&kb, TerminalOracle::stdio());
//! let findings = exec.execute(&kb.context_names()).unwrap();
//! print!("{findings}");
//! ```

pub mod cf;
pub mod config;
pub mod domain;
pub mod error;
pub mod executor;
pub mod knowledge;
pub mod loader;
pub mod oracle;
pub mod report;
pub mod rule;
pub mod statement;
pub mod store;
