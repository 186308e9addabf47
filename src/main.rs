use clap::{Parser, Subcommand};
use haml_jsp::{CompileError, Compiler, Config, Format};
use serde::Serialize;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "haml-jsp")]
#[command(about = "haml-jsp - Haml templates to HTML with JSP expressions and scriptlets")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate .jsp from .haml files
    Generate {
        /// Path to .haml file or directory
        #[arg(required_unless_present = "stdin")]
        file: Option<PathBuf>,

        /// Read from stdin
        #[arg(long)]
        stdin: bool,

        /// Output a JSON report instead of markup
        #[arg(long)]
        json: bool,

        /// Output format: html4, html5 or xhtml
        #[arg(long)]
        format: Option<Format>,

        /// Comma-separated tags that self-close when empty
        #[arg(long, value_delimiter = ',')]
        autoclose: Option<Vec<String>>,

        /// JSON config file with "format" and "autoclose"
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// JSON report for one compiled document
#[derive(Serialize)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
}

#[derive(Serialize)]
struct ErrorReport {
    kind: &'static str,
    message: String,
    line: usize,
    column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
}

impl From<&CompileError> for ErrorReport {
    fn from(err: &CompileError) -> Self {
        Self {
            kind: err.kind.name(),
            message: err.message.clone(),
            line: err.span.start.line + 1,
            column: err.span.start.col + 1,
            help: err.help.clone(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate { file, stdin, json, format, autoclose, config } => {
            let config = match load_config(config.as_deref(), format, autoclose) {
                Ok(config) => config,
                Err(message) => {
                    eprintln!("Error: {}", message);
                    process::exit(1);
                }
            };
            debug!(?config, "configuration");

            if stdin {
                generate_stdin(&config, json);
            } else if let Some(path) = file {
                generate_path(&config, &path);
            } else {
                eprintln!("Error: provide a file/directory or use --stdin");
                process::exit(1);
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Config file first, then command-line flags on top
fn load_config(path: Option<&Path>, format: Option<Format>, autoclose: Option<Vec<String>>) -> Result<Config, String> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("can't read {}: {}", path.display(), e))?;
            Config::from_json(&text).map_err(|e| format!("invalid config {}: {}", path.display(), e))?
        }
        None => Config::default(),
    };
    if let Some(format) = format {
        config = config.with_format(format);
    }
    if let Some(tags) = autoclose {
        config = config.with_autoclose(tags);
    }
    Ok(config)
}

fn generate_stdin(config: &Config, json_output: bool) {
    let mut source = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut source) {
        eprintln!("Error: failed to read stdin: {}", e);
        process::exit(1);
    }

    let result = Compiler::new(config).compile(&source);

    if json_output {
        let report = match &result {
            Ok(output) => Report { output: Some(output.clone()), error: None },
            Err(err) => Report { output: None, error: Some(err.into()) },
        };
        match serde_json::to_string(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        if result.is_err() {
            process::exit(1);
        }
        return;
    }

    match result {
        Ok(output) => print!("{}", output),
        Err(err) => {
            eprint!("{}", render_error(&err, &source, "<stdin>"));
            process::exit(1);
        }
    }
}

fn generate_path(config: &Config, path: &Path) {
    if path.is_file() {
        if path.extension().is_none_or(|ext| ext != "haml") {
            eprintln!("Error: {} is not a .haml file", path.display());
            process::exit(1);
        }
        let start = Instant::now();
        if !generate_file(config, path) {
            process::exit(1);
        }
        print_summary(1, start.elapsed());
    } else if path.is_dir() {
        generate_directory(config, path);
    } else {
        eprintln!("Error: {} does not exist", path.display());
        process::exit(1);
    }
}

fn generate_directory(config: &Config, dir: &Path) {
    let start = Instant::now();
    let mut file_count = 0;
    let mut failures = 0;

    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "haml"))
    {
        if generate_file(config, entry.path()) {
            file_count += 1;
        } else {
            failures += 1;
        }
    }

    if file_count == 0 && failures == 0 {
        eprintln!("No .haml files found in {}", dir.display());
        process::exit(1);
    }

    print_summary(file_count, start.elapsed());
    if failures > 0 {
        warn!(failures, "some templates failed to compile");
        process::exit(1);
    }
}

/// Compile one file to a `.jsp` sibling. Reports and returns false on failure.
fn generate_file(config: &Config, path: &Path) -> bool {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: can't read {}: {}", path.display(), e);
            return false;
        }
    };

    let output = match Compiler::new(config).compile(&source) {
        Ok(output) => output,
        Err(err) => {
            eprint!("{}", render_error(&err, &source, &path.display().to_string()));
            return false;
        }
    };

    let target = path.with_extension("jsp");
    if let Err(e) = fs::write(&target, output) {
        eprintln!("Error: can't write {}: {}", target.display(), e);
        return false;
    }
    print_generated(&target.display().to_string());
    true
}

fn render_error(err: &CompileError, source: &str, filename: &str) -> String {
    if io::stderr().is_terminal() {
        err.render_color(source, filename)
    } else {
        err.render(source, filename)
    }
}

fn print_generated(path: &str) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path);
    } else {
        eprintln!("  ✓ {}", path);
    }
}

fn print_summary(count: usize, elapsed: std::time::Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };

    if is_tty {
        eprintln!("\n\x1b[1mGenerated {} {} in {}\x1b[0m", count, files_word, time_str);
    } else {
        eprintln!("\nGenerated {} {} in {}", count, files_word, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
