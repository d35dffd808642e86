//! The compiler executable.
//!
//! Builds the demonstration program, prints its IR and emits it for the
//! requested target.

use std::process::ExitCode;

use clap::{value_parser, Arg, ArgAction, Command};
use flowc::{
    codegen::{self, EmitConfig, EmitKind, OptLevel},
    frontend::{IrGen, IrGenContext, Program, RetKind},
};
use log::error;

fn cli() -> Command {
    Command::new("flowc")
        .about("Lower a fixed demonstration program to IR and native code")
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .default_value("output.o"),
        )
        .arg(Arg::new("target").long("target").help("target triple, the host by default"))
        .arg(
            Arg::new("emit")
                .long("emit")
                .value_parser(["obj", "asm"])
                .default_value("obj"),
        )
        .arg(
            Arg::new("opt-level")
                .long("opt-level")
                .value_parser(["none", "speed", "speed_and_size"])
                .default_value("speed"),
        )
        .arg(
            Arg::new("b")
                .long("b")
                .help("value assigned to `b` before the if/else")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true)
                .default_value("4.0"),
        )
        .arg(
            Arg::new("ret")
                .long("ret")
                .value_parser(["f64", "void"])
                .default_value("f64"),
        )
        .arg(
            Arg::new("no-print")
                .long("no-print")
                .help("do not print the IR")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    let default_level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    // all values below are validated by the value parsers
    let output = matches.get_one::<String>("output").cloned().unwrap_or_default();
    let b = matches.get_one::<f64>("b").copied().unwrap_or(4.0);
    let ret = match matches.get_one::<String>("ret").map(String::as_str) {
        Some("void") => RetKind::Void,
        _ => RetKind::F64,
    };
    let kind = matches
        .get_one::<String>("emit")
        .and_then(|kind| kind.parse::<EmitKind>().ok())
        .unwrap_or_default();
    let opt_level = matches
        .get_one::<String>("opt-level")
        .and_then(|level| level.parse::<OptLevel>().ok())
        .unwrap_or_default();

    let config = EmitConfig {
        target: matches.get_one::<String>("target").cloned(),
        kind,
        opt_level,
        ..EmitConfig::default()
    };

    let mut irgen = IrGenContext::new("flowc");
    let built = Program::demo(b, ret).irgen(&mut irgen);
    let mut ctx = irgen.finish();
    ctx.alloc_all_names();

    if !matches.get_flag("no-print") {
        println!("{}", ctx.display());
    }

    if let Err(err) = built {
        error!("irgen failed: {}", err);
        return ExitCode::FAILURE;
    }

    match codegen::emit(&mut ctx, &output, &config) {
        Ok(out) => {
            println!(
                "wrote {} ({} bytes) to {}",
                out.kind,
                out.bytes_written,
                out.path.display()
            );
            ExitCode::SUCCESS
        }
        // already logged by the emitter
        Err(_) => ExitCode::FAILURE,
    }
}
