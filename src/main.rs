//! emycin CLI: certainty-factor expert-system shell.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use emycin::config::ExecutorConfig;
use emycin::domain::ValueRule;
use emycin::error::EmycinResult;
use emycin::executor::Executor;
use emycin::knowledge::KnowledgeBase;
use emycin::loader;
use emycin::oracle::{Oracle, TerminalOracle};
use emycin::report::Findings;

#[derive(Parser)]
#[command(name = "emycin", version, about = "Certainty-factor expert-system shell")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a consultation: ask questions, chain rules, report goal findings.
    Run {
        /// Knowledge file (.json or .toml).
        #[arg(long, default_value = "demos/organism.toml")]
        kb: PathBuf,

        /// Context to run; repeatable. Defaults to every context in file order.
        #[arg(long = "context")]
        contexts: Vec<String>,

        /// Executor configuration (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print findings as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Load and validate a knowledge file without running it.
    Check {
        /// Knowledge file (.json or .toml).
        #[arg(long, default_value = "demos/organism.toml")]
        kb: PathBuf,

        /// Also print every rule.
        #[arg(long)]
        rules: bool,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    // Default to warn: log lines would interleave with the interactive prompt.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            kb,
            contexts,
            config,
            json,
        } => {
            let findings = consult(&kb, contexts, config.as_deref(), TerminalOracle::stdio())?;
            if json {
                let out = serde_json::to_string_pretty(&findings).into_diagnostic()?;
                println!("{out}");
            } else {
                print!("{findings}");
            }
        }

        Commands::Check { kb: path, rules } => {
            let kb = loader::load_path(&path)?;
            println!("Knowledge base {} is valid.", path.display());
            print_summary(&kb);
            if rules {
                for rule in kb.rules() {
                    print!("\n{}", rule.display(kb.domain()));
                }
            }
        }
    }

    Ok(())
}

/// Load everything, then run the consultation. The banner and every prompt
/// go through the oracle, never to stdout.
fn consult<O: Oracle>(
    kb: &Path,
    contexts: Vec<String>,
    config: Option<&Path>,
    mut oracle: O,
) -> EmycinResult<Findings> {
    let config = match config {
        Some(path) => ExecutorConfig::from_toml_file(path)?,
        None => ExecutorConfig::default(),
    };
    let kb = loader::load_path(kb)?;
    let contexts = if contexts.is_empty() {
        kb.context_names()
    } else {
        contexts
    };

    oracle.show(&format!(
        "Executing begins, type help for help, {} if you don't know.",
        config.no_answer_token
    ))?;
    let mut exec = Executor::with_config(&kb, oracle, config);
    Ok(exec.execute(contexts.as_slice())?)
}

fn print_summary(kb: &KnowledgeBase) {
    let domain = kb.domain();
    println!("Contexts ({}):", domain.contexts().len());
    for context in domain.contexts() {
        println!(
            "  {} initial=[{}] goals=[{}]",
            context.name,
            context.initial_data.join(", "),
            context.goals.join(", ")
        );
    }
    println!("Parameters ({}):", domain.parameters().len());
    for param in domain.parameters() {
        let rule = match &param.rule {
            ValueRule::Type(ty) => ty.to_string(),
            ValueRule::OneOf(allowed) => format!("one of {}", allowed.join("|")),
        };
        let strategy = if param.ask_first { "ask-first" } else { "infer-first" };
        println!(
            "  {} ({}) {} [{}], {} rule(s)",
            param.name,
            domain.context(param.context).name,
            rule,
            strategy,
            kb.rules_concluding(param.id).len()
        );
    }
    println!("Rules: {}", kb.rules().len());
}
