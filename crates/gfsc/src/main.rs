//! `gfsc`: compile GFSLang features and run compiled statements.
//!
//! ```text
//! gfsc compile strength.gfsl                 # writes strength.ts
//! gfsc compile strength.gfsl --format json   # writes strength.json
//! gfsc run strength.json --store character.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gfs_eval::{load_statements, run, BatchPolicy, JsonStore, RunOptions};
use gfs_types::CompileErrors;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "gfsc", version, about = "GFSLang compiler and runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a GFSLang file
    Compile(CompileArgs),

    /// Run a compiled GFS JSON document against a character store
    Run(RunArgs),
}

#[derive(Parser)]
struct CompileArgs {
    /// GFSLang source file
    input: PathBuf,

    /// Output file (defaults to the input with the format's extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Ts)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// TypeScript object literal
    Ts,
    /// GFS JSON document
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Ts => "ts",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Parser)]
struct RunArgs {
    /// Compiled GFS JSON document
    statements: PathBuf,

    /// JSON object holding the character's attributes
    #[arg(short, long)]
    store: PathBuf,

    /// Run options as JSON, e.g. {"policy": "continue", "max_depth": 60}
    #[arg(short, long, env = "GFSC_RUN_CONFIG")]
    config: Option<PathBuf>,

    /// Keep going after a failing statement
    #[arg(long)]
    continue_on_error: bool,

    /// Write the updated store here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Compile(args) => compile(&args),
        Command::Run(args) => execute(&args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ══════════════════════════════════════════════════════════════════════════════
// compile
// ══════════════════════════════════════════════════════════════════════════════

fn compile(args: &CompileArgs) -> Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let rendered = match args.format {
        OutputFormat::Ts => gfs_compiler::compile_to_ts(&source, &filename),
        OutputFormat::Json => gfs_compiler::compile_to_json(&source, &filename),
    };
    let rendered = match rendered {
        Ok(text) => text,
        Err(errors) => {
            eprint!("{}", diagnostics(&errors));
            bail!("compilation of {filename} failed with {} error(s)", errors.total_errors);
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, args.format));
    fs::write(&output, rendered)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(input = %filename, output = %output.display(), "wrote output");
    Ok(())
}

fn default_output(input: &Path, format: OutputFormat) -> PathBuf {
    input.with_extension(format.extension())
}

/// Each error followed by its source line and a caret under the column.
fn diagnostics(errors: &CompileErrors) -> String {
    let mut out = String::new();
    for error in &errors.errors {
        out.push_str(&format!("{error}\n"));
        if !error.source_line.is_empty() {
            let pad = " ".repeat(error.span.column.saturating_sub(1) as usize);
            out.push_str(&format!("    {}\n    {pad}^\n", error.source_line));
        }
        if let Some(suggestion) = &error.suggestion {
            out.push_str(&format!("    help: {suggestion}\n"));
        }
    }
    if errors.total_errors > errors.errors.len() {
        out.push_str(&format!(
            "... and {} more errors\n",
            errors.total_errors - errors.errors.len()
        ));
    }
    out
}

// ══════════════════════════════════════════════════════════════════════════════
// run
// ══════════════════════════════════════════════════════════════════════════════

fn execute(args: &RunArgs) -> Result<()> {
    let document = fs::read_to_string(&args.statements)
        .with_context(|| format!("failed to read {}", args.statements.display()))?;
    let statements = load_statements(&document)
        .with_context(|| format!("invalid GFS document {}", args.statements.display()))?;

    let state = fs::read_to_string(&args.store)
        .with_context(|| format!("failed to read {}", args.store.display()))?;
    let mut store = JsonStore::from_json(&state)
        .with_context(|| format!("invalid store {}", args.store.display()))?;

    let options = run_options(args)?;
    debug!(statements = statements.len(), ?options, "running batch");

    let report = run(&statements, &mut store, &options)?;
    for failure in &report.failures {
        warn!(
            index = failure.index,
            path = %failure.target,
            error = %failure.error,
            "statement skipped"
        );
    }

    let updated = serde_json::to_string_pretty(&store.into_value())?;
    match &args.output {
        Some(path) => fs::write(path, updated)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{updated}"),
    }
    Ok(())
}

fn run_options(args: &RunArgs) -> Result<RunOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            RunOptions::from_json(&text)
                .with_context(|| format!("invalid run config {}", path.display()))?
        }
        None => RunOptions::default(),
    };
    if args.continue_on_error {
        options.policy = BatchPolicy::Continue;
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output(Path::new("features/jason.gfsl"), OutputFormat::Ts),
            PathBuf::from("features/jason.ts")
        );
        assert_eq!(
            default_output(Path::new("strength"), OutputFormat::Json),
            PathBuf::from("strength.json")
        );
    }

    #[test]
    fn test_parse_compile_args() {
        let cli = Cli::try_parse_from(["gfsc", "compile", "a.gfsl", "--format", "json", "-o", "out.json"])
            .unwrap();
        let Command::Compile(args) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_continue_flag_overrides_config() {
        let cli = Cli::try_parse_from([
            "gfsc",
            "run",
            "doc.json",
            "--store",
            "char.json",
            "--continue-on-error",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let options = run_options(&args).unwrap();
        assert_eq!(options.policy, BatchPolicy::Continue);
    }

    #[test]
    fn test_diagnostics_show_source_line() {
        let Err(errors) = gfs_compiler::compile("0: x = a / b", "bad.gfsl") else {
            panic!("expected errors");
        };
        let text = diagnostics(&errors);
        assert!(text.starts_with("bad.gfsl:1:12: E301"));
        assert!(text.contains("    0: x = a / b\n               ^\n"));
    }
}
