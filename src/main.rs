use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use tree_lox as lox;

use lox::ast_printer::AstPrinter;
use lox::error::LoxError;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::{self, Scanner};

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking Lox interpreter", long_about = None)]
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
        filename: PathBuf,

        /// Print the token list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a program and prints each statement in prefix form
    Parse {
        filename: PathBuf,

        /// Also resolve the program and dump the scope-distance table
        #[arg(long)]
        locals: bool,
    },

    /// Runs a file as a Lox program
    Eval { filename: PathBuf },

    /// Starts an interactive session
    Prompt,
}

/// Reads the contents of a file as UTF‑8 text.
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let text = String::from_utf8(buf)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    Ok(text)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("tree_lox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{} {}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Prints diagnostics to stderr and exits with the conventional code:
/// 70 when a runtime error is among them, 65 otherwise.
fn report_and_exit(diagnostics: &[LoxError]) -> ! {
    for e in diagnostics {
        eprintln!("{}", e);
    }

    let code = if diagnostics.iter().any(LoxError::is_runtime) {
        70
    } else {
        65
    };

    debug!("Exiting with code {}", code);
    process::exit(code);
}

fn tokenize(filename: PathBuf, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");
    let text = read_file(filename)?;

    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for token in Scanner::new(&text) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                tokens.push(token);
            }
            Err(e) => {
                debug!("Tokenization debug: {}", e);
                errors.push(e);
            }
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?
        );
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !errors.is_empty() {
        report_and_exit(&errors);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: PathBuf, locals: bool) -> Result<()> {
    info!("Running Parse subcommand");
    let text = read_file(filename)?;

    let (tokens, mut diagnostics) = scanner::scan(&text);
    let mut parser = Parser::new(&tokens);
    let (statements, _) = parser.parse(true)?;
    diagnostics.extend(parser.into_errors());

    for stmt in &statements {
        println!("{}", AstPrinter::print_stmt(stmt));
    }

    if !diagnostics.is_empty() {
        report_and_exit(&diagnostics);
    }

    if locals {
        let mut interpreter = Interpreter::new();

        if let Err(errors) = Resolver::new(&mut interpreter).resolve(&statements) {
            report_and_exit(&errors);
        }

        let table: BTreeMap<_, _> = interpreter.locals().iter().collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&table).context("Failed to serialize locals")?
        );
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn eval(filename: PathBuf) -> Result<()> {
    info!("Running Eval subcommand");
    let text = read_file(filename)?;

    let mut interpreter = Interpreter::new();
    let diagnostics = lox::run(&mut interpreter, &text, false);

    if !diagnostics.is_empty() {
        report_and_exit(&diagnostics);
    }

    info!("Program executed successfully");
    Ok(())
}

fn prompt() -> Result<()> {
    info!("Starting interactive session");

    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            info!("End of input, leaving interactive session");
            println!();
            return Ok(());
        }

        for e in lox::run(&mut interpreter, &line, true) {
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
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, json),
        Commands::Parse { filename, locals } => parse(filename, locals),
        Commands::Eval { filename } => eval(filename),
        Commands::Prompt => prompt(),
    }
}
