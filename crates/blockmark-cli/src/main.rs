use anyhow::{Context, Result};
use blockmark_config::Config;
use blockmark_engine::{BlockList, IdAllocator, NodeTree, SyntaxPolicy};
use clap::{Parser, Subcommand};
use std::{
    fmt,
    io::{self, Write},
    path::PathBuf,
    process,
};

/// Inspect and check markdown documents as editable blocks
#[derive(Parser, Debug)]
#[command(name = "blockmark")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Fail on unsupported markdown instead of treating the line as plain text
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every block with its editable tree
    Inspect {
        /// Markdown file (defaults to the configured document_path)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Report lines that do not survive a parse and re-serialize
    Check {
        /// Markdown file (defaults to the configured document_path)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()
        .context("Failed to load configuration")?
        .unwrap_or_default();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();

    let policy = if args.strict || config.strict_syntax {
        SyntaxPolicy::Strict
    } else {
        SyntaxPolicy::DegradeToText
    };

    match args.command {
        Command::Inspect { file } => {
            let markdown = read_document(file, &config)?;
            inspect(&markdown, policy, &mut io::stdout().lock())?;
        }
        Command::Check { file } => {
            let markdown = read_document(file, &config)?;
            let findings = check(&markdown, policy);
            for finding in &findings {
                println!("{finding}");
            }
            if findings.iter().any(Finding::is_mismatch) {
                process::exit(1);
            }
            log::info!("all lines round-trip");
        }
    }
    Ok(())
}

fn read_document(file: Option<PathBuf>, config: &Config) -> Result<String> {
    let path = file.or_else(|| config.document_path.clone()).with_context(|| {
        format!(
            "No file given and no document_path set in {}",
            Config::config_path().display()
        )
    })?;
    log::debug!("reading {}", path.display());
    std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read document: {}", path.display()))
}

/// Writes each block's id, source and tree outline.
fn inspect(markdown: &str, policy: SyntaxPolicy, out: &mut impl Write) -> Result<()> {
    let mut blocks = BlockList::from_markdown(markdown, IdAllocator::new()).with_policy(policy);
    let ids: Vec<_> = blocks.iter().map(|block| block.id()).collect();

    for id in ids {
        let source = blocks.block(id)?.source().to_string();
        match blocks.activate(id) {
            Ok(tree) => {
                let marker = if tree.is_degraded() { " (plain text)" } else { "" };
                writeln!(out, "{id} {source:?}{marker}")?;
                for line in tree.outline().lines() {
                    writeln!(out, "  {line}")?;
                }
            }
            Err(err) => writeln!(out, "{id} {source:?} error: {err}")?,
        }
    }
    Ok(())
}

/// A line that did not survive a parse and re-serialize unchanged.
#[derive(Debug, PartialEq, Eq)]
enum Finding {
    Changed {
        line: usize,
        expected: String,
        actual: String,
    },
    /// Kept verbatim as plain text.
    Degraded { line: usize },
    Failed { line: usize, error: String },
}

impl Finding {
    fn is_mismatch(&self) -> bool {
        !matches!(self, Finding::Degraded { .. })
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Changed {
                line,
                expected,
                actual,
            } => write!(f, "line {line}: {expected:?} re-serializes as {actual:?}"),
            Finding::Degraded { line } => write!(f, "line {line}: edited as plain text"),
            Finding::Failed { line, error } => write!(f, "line {line}: {error}"),
        }
    }
}

fn check(markdown: &str, policy: SyntaxPolicy) -> Vec<Finding> {
    let blocks = BlockList::from_markdown(markdown, IdAllocator::new());
    let mut findings = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        let line = index + 1;
        let source = block.source();
        match NodeTree::construct_with(source, policy) {
            Ok(tree) if tree.is_degraded() => findings.push(Finding::Degraded { line }),
            Ok(tree) => {
                let actual = tree.source();
                if actual != source {
                    findings.push(Finding::Changed {
                        line,
                        expected: source.to_string(),
                        actual,
                    });
                }
            }
            Err(err) => findings.push(Finding::Failed {
                line,
                error: err.to_string(),
            }),
        }
    }
    findings
}
