//! MScript REPL
//!
//! Interactive shell and script runner.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mscript::{Context, EvalError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Compile and run scripts, or start an interactive shell.
#[derive(Parser, Debug)]
#[command(name = "mscript", version, about)]
struct Cli {
    /// Script file to run.
    script: Option<PathBuf>,

    /// Evaluate the given source instead of a file.
    #[arg(short, long, conflicts_with = "script")]
    eval: Option<String>,

    /// Print the bytecode disassembly instead of executing.
    #[arg(long)]
    dump: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let source = match (&cli.eval, &cli.script) {
        (Some(source), _) => source.clone(),
        (None, Some(path)) => match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        (None, None) => return run_repl(cli.dump),
    };

    let mut ctx = Context::new();
    match run(&mut ctx, &source, cli.dump) {
        Ok(Some(output)) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Evaluate (or disassemble) one script; `None` when there is nothing to print
fn run(ctx: &mut Context, source: &str, dump: bool) -> Result<Option<String>, EvalError> {
    if dump {
        let bytecode = ctx.compile(source)?;
        return Ok(Some(bytecode.to_string().trim_end().to_string()));
    }
    let result = ctx.eval(source)?;
    Ok((!result.is_undefined()).then(|| result.to_string()))
}

fn run_repl(dump: bool) -> ExitCode {
    println!("MScript {}", env!("CARGO_PKG_VERSION"));
    println!("Type statements to evaluate, Ctrl+D to exit.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error starting line editor: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut ctx = Context::new();

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match run(&mut ctx, line, dump) {
                    Ok(Some(output)) => println!("{}", output),
                    Ok(None) => println!("undefined"),
                    Err(e) => println!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
