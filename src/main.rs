//! Punto de entrada ("driver").
//!
//! Este módulo orquesta las diferentes fases del proceso de
//! compilación y expone una CLI.

use anyhow::{self, Context};
use bitflags::bitflags;
use clap::{Arg, ArgAction, Command};
use mipscc::{codegen, error::CompileError, lex::Lexer, parse};
use tracing::{debug, Level};

use std::{
    fs,
    io::{self, Read, Write},
    process,
};

bitflags! {
    /// Representaciones intermedias a volcar en stderr.
    struct Dump: u32 {
        /// Secuencia de tokens.
        const TOKENS = 0x01;

        /// Árbol sintáctico.
        const AST = 0x02;
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("mipscc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles a single `int main()` C-like program to MIPS assembly")
        .arg(
            Arg::new("input")
                .required(true)
                .value_name("SOURCE")
                .help("Source file ('-' for stdin)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .required(true)
                .value_name("FILE")
                .help("Output assembly file ('-' for stdout)"),
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .takes_value(true)
                .action(ArgAction::Append)
                .value_name("STAGE")
                .possible_values(["tokens", "ast"])
                .help("Print an intermediate representation to stderr"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("Log compiler phases to stderr (repeat for more detail)"),
        )
        .get_matches();

    let level = match args.get_count("verbose") {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();

    // Se extraen argumentos necesarios
    let input = args.value_of("input").context("Missing source file")?;
    let output = args.value_of("output").context("Missing output file")?;

    let mut dump = Dump::empty();
    for stage in args.values_of("dump").into_iter().flatten() {
        dump |= match stage {
            "tokens" => Dump::TOKENS,
            _ => Dump::AST,
        };
    }

    let source = read_source(input)?;
    debug!(input, bytes = source.len(), "source loaded");

    // La salida solo se crea si la compilación tuvo éxito
    let asm = compile(&source, dump)?;

    match output {
        "-" => io::stdout()
            .write_all(asm.as_bytes())
            .context("Failed to write to stdout")?,

        path => {
            fs::write(path, asm).with_context(|| format!("Failed to write: {}", path))?;
            println!("wrote {}", path);
        }
    }

    Ok(())
}

fn read_source(input: &str) -> anyhow::Result<String> {
    match input {
        "-" => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("Failed to read from stdin")?;

            Ok(source)
        }

        path => fs::read_to_string(path).with_context(|| format!("Cannot open input: {}", path)),
    }
}

fn compile(source: &str, dump: Dump) -> Result<String, CompileError> {
    let tokens = Lexer::new(source).tokenize()?;
    if dump.contains(Dump::TOKENS) {
        eprintln!("Tokens: {:#?}", tokens);
    }

    let ast = parse::parse(&tokens)?;
    if dump.contains(Dump::AST) {
        eprintln!("Ast: {:#?}", ast);
    }

    codegen::emit(&ast)
}
