//! CLI application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use quill_core::function::Library;
use quill_core::{
    CompilationOutput, Context, Diagnostic, ErrorKind, OutputResource, Pipeline, PipelineOptions,
    QuillError, ResourceContent,
};
use quill_html::HtmlTarget;
use quill_plaintext::PlainTextTarget;

use crate::loader::FileLoader;

/// Configuration file looked up next to the source document
pub const CONFIG_FILE: &str = "quill.toml";

/// Exit code when the source document does not exist
pub const EXIT_NO_SOURCE: u8 = 66;
/// Exit code for malformed source
pub const EXIT_COMPILE: u8 = 65;
/// Exit code for failures while running the document
pub const EXIT_RUNTIME: u8 = 70;
/// Exit code for values that cannot be converted
pub const EXIT_CONVERSION: u8 = 64;

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TargetFormat {
    /// HTML page
    #[default]
    Html,
    /// Plain text
    Text,
}

/// The source document does not exist
#[derive(Debug, thiserror::Error)]
#[error("Source file not found: {}", .0.display())]
pub struct MissingSource(pub PathBuf);

#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about = "Markdown with functions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a document
    Compile(CompileArgs),

    /// Read documents from stdin and print their rendering
    Repl {
        /// Output format
        #[arg(short, long, value_enum, default_value = "html")]
        target: TargetFormat,
    },
}

/// Arguments of `quill compile`
#[derive(Debug, Clone, Args)]
pub struct CompileArgs {
    /// Source document
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "html")]
    pub target: TargetFormat,

    /// Configuration file (defaults to quill.toml next to the source)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Library file whose functions `.include {name}` enables,
    /// `name` being the file stem
    #[arg(long = "lib")]
    pub libraries: Vec<PathBuf>,

    /// Fail on the first call error
    #[arg(long)]
    pub strict: bool,

    /// Emit the rendered body only, without a page around it
    #[arg(long)]
    pub no_wrap: bool,

    /// Write the main output to stdout instead of the output directory
    #[arg(long)]
    pub pipe: bool,
}

impl CompileArgs {
    /// Compile arguments with every option at its default
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from("output"),
            target: TargetFormat::default(),
            config: None,
            libraries: Vec::new(),
            strict: false,
            no_wrap: false,
            pipe: false,
        }
    }
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compile(args) => {
            compile_command(&args)?;
        }
        Commands::Repl { target } => {
            let stdin = io::stdin();
            repl(stdin.lock(), io::stdout(), target)?;
        }
    }

    Ok(())
}

/// Log to stderr so that stdout stays clean for piped output.
///
/// `RUST_LOG` takes precedence; otherwise warnings only, or everything
/// down to debug with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Process exit code for an error returned by a command
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<MissingSource>().is_some() {
        return EXIT_NO_SOURCE;
    }
    match err.downcast_ref::<QuillError>().map(QuillError::kind) {
        Some(ErrorKind::CompileTime) => EXIT_COMPILE,
        Some(ErrorKind::IllegalConversion) => EXIT_CONVERSION,
        Some(ErrorKind::Runtime) | Some(ErrorKind::Internal) | None => EXIT_RUNTIME,
    }
}

fn pipeline(options: PipelineOptions, target: TargetFormat) -> Pipeline {
    let pipeline = match target {
        TargetFormat::Html => Pipeline::new(options, HtmlTarget),
        TargetFormat::Text => Pipeline::new(options, PlainTextTarget),
    };
    pipeline.with_library(quill_stdlib::library())
}

/// Options from the configuration file, overridden by command-line flags
pub fn load_options(args: &CompileArgs, source_dir: &Path) -> Result<PipelineOptions> {
    let config = match &args.config {
        Some(path) => Some(path.clone()),
        None => Some(source_dir.join(CONFIG_FILE)).filter(|path| path.exists()),
    };
    let mut options = match config {
        Some(path) => {
            info!(config = %path.display(), "loading configuration");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            PipelineOptions::from_toml_str(&content)
                .with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => PipelineOptions::default(),
    };
    if args.strict {
        options.strict = true;
    }
    if args.no_wrap {
        options.wrap_output = false;
    }
    Ok(options)
}

/// A library that runs a markup file when included, so that the file's
/// `.function` definitions become available
pub fn user_library(path: &Path) -> Result<Library> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("Invalid library file name: {}", path.display()))?
        .to_string();
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read library: {}", path.display()))?;
    debug!(library = %name, "user library registered");
    Ok(Library::new(name).on_load(move |ctx| {
        ctx.parse_blocks(&source)?;
        Ok(())
    }))
}

/// Execute the compile command.
///
/// Returns the compilation output after writing it out.
pub fn compile_command(args: &CompileArgs) -> Result<CompilationOutput> {
    let input = &args.input;
    if !input.is_file() {
        return Err(MissingSource(input.clone()).into());
    }
    if !args.pipe {
        println!("quill v{}", quill_core::VERSION);
        println!("Compiling: {}", input.display());
    }

    let source = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let loader = FileLoader::for_source(input);
    let options = load_options(args, loader.root())?;

    let mut ctx = Context::new(loader);
    for path in &args.libraries {
        ctx.add_loadable(user_library(path)?);
    }
    let pipeline = pipeline(options, args.target);
    pipeline.attach(&mut ctx)?;
    let output = pipeline
        .execute(&mut ctx, &source)
        .with_context(|| format!("Failed to compile {}", input.display()))?;

    report(input, &output.diagnostics);

    if args.pipe {
        let main = output
            .resources
            .first()
            .context("Compilation produced no output")?;
        write_stdout(main)?;
    } else {
        let written = write_resources(&args.output, &output.resources)?;
        println!();
        println!("Compile complete!");
        for path in &written {
            println!("  Output: {}", path.display());
        }
    }
    Ok(output)
}

/// Print diagnostics to stderr, prefixed with the source path
fn report(input: &Path, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}: {diagnostic}", input.display());
    }
}

fn write_stdout(resource: &OutputResource) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match &resource.content {
        ResourceContent::Text(text) => stdout.write_all(text.as_bytes()),
        ResourceContent::Binary(bytes) => stdout.write_all(bytes),
    }
    .context("Failed to write to stdout")?;
    stdout.flush().context("Failed to write to stdout")
}

/// Write resources under `dir`, creating directories as needed
pub fn write_resources(dir: &Path, resources: &[OutputResource]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(resources.len());
    for resource in resources {
        let path = dir.join(&resource.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let bytes = match &resource.content {
            ResourceContent::Text(text) => text.as_bytes(),
            ResourceContent::Binary(bytes) => bytes.as_slice(),
        };
        fs::write(&path, bytes)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        debug!(path = %path.display(), bytes = bytes.len(), "resource written");
        written.push(path);
    }
    Ok(written)
}

/// Read-eval-print loop.
///
/// Each entry ends at a blank line (or at end of input) and is compiled
/// with the same context, so variables and functions carry over. The
/// rendered body is printed; diagnostics go to stderr.
pub fn repl(input: impl BufRead, mut output: impl Write, target: TargetFormat) -> Result<()> {
    let options = PipelineOptions {
        wrap_output: false,
        ..PipelineOptions::default()
    };
    let pipeline = pipeline(options, target);
    let mut ctx = Context::new(FileLoader::new("."));
    pipeline.attach(&mut ctx)?;

    let mut entry = String::new();
    let mut lines = input.lines();
    loop {
        let line = lines.next().transpose().context("Failed to read input")?;
        let finished = match &line {
            Some(line) if !line.trim().is_empty() => {
                entry.push_str(line);
                entry.push('\n');
                false
            }
            _ => true,
        };
        if finished && !entry.trim().is_empty() {
            evaluate(&pipeline, &mut ctx, &entry, &mut output)?;
            entry.clear();
        }
        if line.is_none() {
            return Ok(());
        }
    }
}

fn evaluate(
    pipeline: &Pipeline,
    ctx: &mut Context,
    entry: &str,
    output: &mut impl Write,
) -> Result<()> {
    match pipeline.execute(ctx, entry) {
        Ok(compiled) => {
            for diagnostic in &compiled.diagnostics {
                eprintln!("{diagnostic}");
            }
            output
                .write_all(compiled.rendered.as_bytes())
                .context("Failed to write output")?;
        }
        // The session survives errors that abort a single entry
        Err(err) => eprintln!("error: {err}"),
    }
    output.flush().context("Failed to write output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = anyhow::Error::from(MissingSource(PathBuf::from("a.md")));
        assert_eq!(exit_code(&missing), EXIT_NO_SOURCE);

        let lexical = anyhow::Error::from(QuillError::Lexical {
            position: Default::default(),
            message: "unterminated braces".to_string(),
        });
        assert_eq!(exit_code(&lexical), EXIT_COMPILE);

        let conversion = anyhow::Error::from(QuillError::conversion("number", "x"))
            .context("Failed to compile doc.md");
        assert_eq!(exit_code(&conversion), EXIT_CONVERSION);

        assert_eq!(exit_code(&anyhow::anyhow!("disk full")), EXIT_RUNTIME);
    }

    #[test]
    fn test_flags_override_defaults() {
        let mut args = CompileArgs::new("doc.md");
        args.strict = true;
        args.no_wrap = true;
        let options = load_options(&args, Path::new("/nonexistent")).unwrap();
        assert!(options.strict);
        assert!(!options.wrap_output);
    }

    #[test]
    fn test_repl_keeps_state_between_entries() {
        let input = ".var {name} {Ada}\n\nHello, .name!\n\n.name::uppercase\n";
        let mut output = Vec::new();
        repl(input.as_bytes(), &mut output, TargetFormat::Text).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Hello, Ada!\nADA\n");
    }
}
