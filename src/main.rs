use clap::Parser;
use posish::interpreter::errors::{os_error_text, report_error};
use posish::interpreter::helpers::bytes::{decode_bytes, from_os_string};
use posish::interpreter::process::{block_signals_in_thread, reset_sigpipe};
use posish::{Shell, ShellConfig};
use std::io::Read;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Stack for the interpreter thread; deep function recursion walks the AST
/// recursively.
const INTERPRETER_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "posish")]
#[command(about = "A POSIX-compatible command-line shell")]
#[command(version)]
struct Cli {
    /// Execute COMMAND; the first operand after it becomes $0
    #[arg(short = 'c', value_name = "COMMAND")]
    command: Option<String>,

    /// Read the script from standard input
    #[arg(short = 's')]
    stdin: bool,

    /// Print commands and their arguments as they are executed
    #[arg(short = 'x')]
    xtrace: bool,

    /// Exit immediately if a command exits with non-zero status
    #[arg(short = 'e')]
    errexit: bool,

    /// Script file followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    operands: Vec<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("POSISH_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Work out the source to run, `$0` and the positional parameters
fn load_source(cli: Cli) -> Result<(String, Option<String>, Vec<String>), i32> {
    let mut operands = cli.operands.into_iter();

    if let Some(command) = cli.command {
        let name = operands.next();
        return Ok((command, name, operands.collect()));
    }

    if !cli.stdin {
        if let Some(path) = operands.next() {
            return match std::fs::read(&path) {
                Ok(bytes) => Ok((decode_bytes(&bytes), Some(path), operands.collect())),
                Err(e) => {
                    report_error(format!("{}: {}", path, os_error_text(&e)));
                    Err(127)
                }
            };
        }
    }

    let mut buf = Vec::new();
    if let Err(e) = std::io::stdin().read_to_end(&mut buf) {
        report_error(format!("stdin: {}", os_error_text(&e)));
        return Err(1);
    }
    Ok((decode_bytes(&buf), None, operands.collect()))
}

fn run(cli: Cli) -> i32 {
    let env: Vec<(String, String)> = std::env::vars_os()
        .map(|(k, v)| (from_os_string(k), from_os_string(v)))
        .collect();
    let (xtrace, errexit) = (cli.xtrace, cli.errexit);

    let (source, script_name, args) = match load_source(cli) {
        Ok(loaded) => loaded,
        Err(status) => return status,
    };

    let mut shell = Shell::new(ShellConfig {
        env,
        script_name,
        args,
        xtrace,
        errexit,
        limits: None,
    });
    let status = shell.run(&source);
    shell.exit(status)
}

fn main() {
    reset_sigpipe();
    init_logging();
    let cli = Cli::parse();

    let status = std::thread::Builder::new()
        .name("posish".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || run(cli))
        .map(|handle| {
            block_signals_in_thread();
            handle.join().unwrap_or(1)
        })
        .unwrap_or_else(|e| {
            report_error(format!("cannot start interpreter: {}", e));
            1
        });

    std::process::exit(status.rem_euclid(256));
}
