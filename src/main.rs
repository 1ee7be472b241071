use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use clap::Parser as ClapParser;
use log::info;

use sable::interpreter::Interpreter;
use sable::parser::Parser;
use sable::resolver::Resolver;
use sable::scanner::Scanner;

/// Tree-walking interpreter for the Sable scripting language.
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to run; starts a REPL when omitted.
    script: Vec<PathBuf>,
}

/// How one statement batch ended.  The driver maps these onto process exit
/// codes (65 for static errors, 70 for runtime errors).
enum Outcome {
    Clean,
    StaticError,
    RuntimeError,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.script.as_slice() {
        [] => run_prompt()?,

        [script] => run_file(script)?,

        _ => {
            eprintln!("Usage: sable [script]");
            std::process::exit(64);
        }
    }

    Ok(())
}

fn run_file(path: &PathBuf) -> anyhow::Result<()> {
    info!("Running script {}", path.display());

    let mut buf: Vec<u8> = Vec::new();
    let mut reader: BufReader<File> = BufReader::new(File::open(path)?);
    reader.read_to_end(&mut buf)?;

    let source: String = String::from_utf8(buf)?;

    let mut interpreter = Interpreter::new();

    match run(&source, &mut interpreter) {
        Outcome::Clean => Ok(()),

        Outcome::StaticError => std::process::exit(65),

        Outcome::RuntimeError => std::process::exit(70),
    }
}

/// Read-eval-print loop: one line at a time until end of input.  Errors are
/// reported and the session continues with the same interpreter, so
/// definitions persist across lines.
fn run_prompt() -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut interpreter = Interpreter::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        run(&line, &mut interpreter);
    }

    Ok(())
}

/// Drive one source text through scan → parse → resolve → interpret.  All
/// static diagnostics are reported before deciding; a program with any
/// static error is never executed.
fn run(source: &str, interpreter: &mut Interpreter) -> Outcome {
    let scanner = Scanner::new(source);

    let mut tokens = Vec::new();
    let mut had_static_error = false;

    for result in scanner {
        match result {
            Ok(token) => tokens.push(token),

            Err(error) => {
                eprintln!("{}", error);
                had_static_error = true;
            }
        }
    }

    let mut parser = Parser::new(tokens);
    let statements = parser.parse();

    for error in parser.errors() {
        eprintln!("{}", error);
        had_static_error = true;
    }

    let mut resolver = Resolver::new(interpreter);
    resolver.resolve(&statements);

    for error in resolver.errors() {
        eprintln!("{}", error);
        had_static_error = true;
    }

    if had_static_error {
        return Outcome::StaticError;
    }

    match interpreter.interpret(&statements) {
        Ok(()) => Outcome::Clean,

        Err(error) => {
            eprintln!("{}", error);
            Outcome::RuntimeError
        }
    }
}
