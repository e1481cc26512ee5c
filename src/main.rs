use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rlox as lox;

use lox::ast_printer::AstPrinter;
use lox::error::LoxError;
use lox::interpreter::Interpreter;
use lox::runner;
use lox::scanner::scan_all;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the tokens as a JSON array instead of one per line
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive prompt
    Repl,
}

/// Maps a file and validates it as UTF‑8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero‑length mappings are rejected on some platforms.
    if len == 0 {
        info!("{:?} is empty", filename);
        return Ok(String::new());
    }

    // SAFETY: the map is read once, here, and copied out before returning.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map file {:?}", filename))?;

    let text = std::str::from_utf8(&map)
        .map_err(LoxError::from)
        .with_context(|| format!("{:?} is not valid UTF-8", filename))?;

    info!("Read {} bytes from {:?}", len, filename);

    Ok(text.to_owned())
}

/// Like [`read_file`], but an unreadable source exits with status 74.
fn load_source(filename: &Path) -> String {
    match read_file(filename) {
        Ok(source) => source,
        Err(e) => {
            debug!("Input error: {:#}", e);
            eprintln!("{:#}", e);
            std::process::exit(74);
        }
    }
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rlox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rlox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print a Lox error to stderr and exit with its status code.
fn fail(e: LoxError) -> ! {
    debug!("Exiting with code {}: {}", e.exit_code(), e);
    eprintln!("{}", e);
    std::process::exit(e.exit_code());
}

fn no_input() -> Result<()> {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");
    let source = load_source(filename);
    let (tokens, errors) = scan_all(&source);

    for e in &errors {
        eprintln!("{}", e);
    }

    if json {
        let rendered = serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !errors.is_empty() {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    info!("Running Parse subcommand");
    let source = load_source(filename);

    match runner::parse_expression(&source) {
        Ok(expr) => {
            let ast_str = AstPrinter::print(&expr);
            debug!("AST: {}", ast_str);
            println!("{}", ast_str);
        }
        Err(e) => fail(e),
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn evaluate(filename: &Path) -> Result<()> {
    info!("Running Evaluate subcommand");
    let source = load_source(filename);
    let mut interpreter = Interpreter::new();

    match runner::evaluate(&source, &mut interpreter) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
        }
        Err(e) => fail(e),
    }

    info!("Evaluate subcommand completed");
    Ok(())
}

fn run(filename: &Path) -> Result<()> {
    info!("Running Run subcommand");
    let source = load_source(filename);
    debug!("Provided input:\n {}", source);

    let mut interpreter = Interpreter::new();

    if let Err(e) = runner::run(&source, &mut interpreter) {
        fail(e);
    }

    info!("Program executed successfully");
    Ok(())
}

/// One line at a time against a single interpreter, so definitions persist.
/// Errors are reported and the session continues.
fn repl() -> Result<()> {
    info!("Starting REPL");
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            info!("End of input, leaving REPL");
            println!();
            return Ok(());
        }

        if let Err(e) = runner::run(&line, &mut interpreter) {
            debug!("REPL error: {}", e);
            eprintln!("{}", e);
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => tokenize(&filename, json),
            None => no_input(),
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => parse(&filename),
            None => no_input(),
        },

        Commands::Evaluate { filename } => match filename {
            Some(filename) => evaluate(&filename),
            None => no_input(),
        },

        Commands::Run { filename } => match filename {
            Some(filename) => run(&filename),
            None => no_input(),
        },

        Commands::Repl => repl(),
    }
}
