//! CLI for generating stencil artifacts.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use colored::Colorize;
use stencil_define::{Diagnostic, Severity};
use stencil_gen::config::EngineConfig;
use stencil_gen::diagnostics::CollectingSink;
use stencil_gen::driver::Engine;
use stencil_gen::output::{DirectorySink, DryRunSink, FileSink};
use stencil_gen::source::CompilationUnit;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stencil-gen")]
#[command(about = "Generate builders, implementations and converters from stencil declarations")]
struct Cli {
    /// Declaration files or glob patterns (e.g., "decls/*.rs")
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<String>,

    /// Output directory for generated files
    #[arg(short, long, default_value = "generated")]
    output: PathBuf,

    /// Engine configuration (stencil.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print generated code to stdout instead of writing files
    #[arg(long)]
    dry_run: bool,

    /// Print the extracted type information as JSON instead of generating
    #[arg(long, conflicts_with = "dry_run")]
    emit_model: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,stencil_gen=info".to_string(),
            2 => "info,stencil_gen=debug".to_string(),
            _ => "debug,stencil_gen=trace".to_string(),
        },
    };
    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_file(verbose >= 3)
                .with_line_number(verbose >= 3)
                .with_writer(io::stderr)
                .compact(),
        )
        .init();
}

/// Expands glob patterns; plain paths are kept as given.
fn resolve_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(input));
            continue;
        }
        let before = paths.len();
        for entry in glob::glob(input).with_context(|| format!("invalid pattern '{}'", input))? {
            paths.push(entry?);
        }
        if paths.len() == before {
            return Err(eyre!("no declaration files match '{}'", input));
        }
    }
    Ok(paths)
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let severity = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Note => "note".cyan().bold(),
    };
    eprintln!("{}: {}", severity, diagnostic.message);
    eprintln!("  {} {}", "-->".blue(), diagnostic.location);
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config)?;

    let paths = resolve_inputs(&cli.input)?;
    let unit = CompilationUnit::from_files(&paths)?;
    tracing::info!(files = paths.len(), types = unit.declarations().len(), "loaded declarations");

    let mut diagnostics = CollectingSink::new();

    if cli.emit_model {
        let models = engine.models(&unit, &mut diagnostics);
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        let stdout = io::stdout();
        let mut sink: Box<dyn FileSink> = if cli.dry_run {
            Box::new(DryRunSink::new(stdout.lock()))
        } else {
            Box::new(DirectorySink::new(&cli.output))
        };
        let report = engine.run(&unit, &mut diagnostics, sink.as_mut())?;

        if !cli.dry_run && cli.verbose > 0 {
            eprintln!(
                "{} {} file(s) for {} type(s) into {}",
                "Generated".green().bold(),
                report.emitted.len(),
                report.succeeded.len(),
                cli.output.display()
            );
        }
    }

    for diagnostic in diagnostics.diagnostics() {
        print_diagnostic(diagnostic);
    }

    match diagnostics.error_count() {
        0 => Ok(()),
        errors => Err(eyre!("generation reported {} error(s)", errors)),
    }
}
