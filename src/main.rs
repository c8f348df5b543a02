//! Punto de entrada ("driver").
//!
//! Este módulo lee el archivo fuente, ejecuta las fases del compilador
//! y escribe el resultado solicitado. Es el único componente que
//! interactúa con la terminal y el sistema de archivos.

use anyhow::{self, bail, Context};
use clap::{self, crate_version, Arg, Command};
use ucc::compile::{self, Failure};

use std::{
    fs::File,
    io::{self, Read, Write},
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Parsing de CLI
    let args = Command::new("uC compiler")
        .version(crate_version!())
        .arg(
            Arg::new("input")
                .required(true)
                .value_name("INPUT")
                .help("Source file ('-' for stdin)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .default_value("-")
                .help("Output file ('-' for stdout)"),
        )
        .arg(
            Arg::new("emit")
                .long("emit")
                .takes_value(true)
                .value_name("KIND")
                .default_value("ir")
                .possible_values(&["tokens", "ast", "ir"])
                .help("Compiler output"),
        )
        .get_matches();

    let input = args.value_of("input").context("Missing input file")?;
    let output = args.value_of("output").unwrap_or("-");
    let emit = args.value_of("emit").unwrap_or("ir");

    let (name, text) = read_source(input)?;
    let source = text.as_bytes();

    let result = match emit {
        "tokens" => compile::tokenize(source, &name)
            .map(|tokens| format!("{:#?}\n", tokens.tokens))
            .map_err(Failure::from),

        "ast" => compile::check(source, &name)
            .map(|(program, _)| format!("{:#?}\n", program))
            .map_err(Failure::from),

        _ => compile::compile(source, &name).map(|module| module.to_string()),
    };

    let rendered = match result {
        Ok(rendered) => rendered,
        Err(failure) => {
            eprint!("{}", failure);
            bail!("Failed to compile {}", name);
        }
    };

    match output {
        "-" => io::stdout()
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?,

        path => File::create(path)
            .and_then(|mut file| file.write_all(rendered.as_bytes()))
            .with_context(|| format!("Failed to write output file: {}", path))?,
    }

    Ok(())
}

fn read_source(input: &str) -> anyhow::Result<(String, String)> {
    let mut text = String::new();

    match input {
        "-" => {
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read from stdin")?;

            Ok((String::from("<stdin>"), text))
        }

        path => {
            File::open(path)
                .and_then(|mut file| file.read_to_string(&mut text))
                .with_context(|| format!("Failed to read source file: {}", path))?;

            Ok((String::from(path), text))
        }
    }
}
