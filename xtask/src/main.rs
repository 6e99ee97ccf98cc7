// Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;

mod hwif_wrapper;
mod regblock;

#[derive(Parser)]
#[command(
    name = "xtask",
    author,
    version,
    about = "Register block generation tasks"
)]
struct Xtask {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    xtask: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a register block from a register map description
    Regblock {
        /// Register map description (TOML)
        #[arg(short, long, value_name = "FILE")]
        map: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Export settings (TOML); command line options take precedence
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// CPU interface, e.g. apb3, apb4-flat, axi4-lite
        #[arg(long)]
        cpuif: Option<String>,

        #[arg(long)]
        module_name: Option<String>,

        #[arg(long)]
        package_name: Option<String>,

        /// hwif typedef style: lexical or hier
        #[arg(long)]
        type_style: Option<String>,

        /// Replace the top instance name
        #[arg(long)]
        rename: Option<String>,

        /// Also write the hwif report
        #[arg(long)]
        hwif_report: bool,

        /// Also write a wrapper with flat hwif ports
        #[arg(long)]
        flatten: bool,
    },
    /// Generate a flat-port wrapper for an existing register block
    HwifWrapper {
        /// hwif report listing the struct signals
        #[arg(short, long, value_name = "FILE")]
        report: PathBuf,

        /// SystemVerilog source of the register block
        #[arg(short, long, value_name = "FILE")]
        module: PathBuf,

        /// Module name; defaults to the source file stem
        #[arg(long)]
        name: Option<String>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Xtask::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(err) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Failed to initialize logging: {err}");
    }

    let result = match &cli.xtask {
        Commands::Regblock {
            map,
            output,
            config,
            cpuif,
            module_name,
            package_name,
            type_style,
            rename,
            hwif_report,
            flatten,
        } => regblock::generate(&regblock::Args {
            map,
            output,
            config: config.as_deref(),
            cpuif: cpuif.as_deref(),
            module_name: module_name.as_deref(),
            package_name: package_name.as_deref(),
            type_style: type_style.as_deref(),
            rename: rename.as_deref(),
            hwif_report: *hwif_report,
            flatten: *flatten,
        }),
        Commands::HwifWrapper {
            report,
            module,
            name,
            output,
        } => hwif_wrapper::generate(report, module, name.as_deref(), output),
    };
    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
