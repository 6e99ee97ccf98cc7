// Licensed under the Apache-2.0 license

//! Register block generation from a TOML register map description.

use anyhow::{Context, Result};
use registers_regblock::{export_to_dir, CpuifKind, ExportConfig, RegMap, TypeStyle};
use std::path::Path;

pub struct Args<'a> {
    pub map: &'a Path,
    pub output: &'a Path,
    pub config: Option<&'a Path>,
    pub cpuif: Option<&'a str>,
    pub module_name: Option<&'a str>,
    pub package_name: Option<&'a str>,
    pub type_style: Option<&'a str>,
    pub rename: Option<&'a str>,
    pub hwif_report: bool,
    pub flatten: bool,
}

fn load_config(args: &Args) -> Result<ExportConfig> {
    let mut config = match args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ExportConfig::from_toml_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => ExportConfig::with_defaults(),
    };

    if let Some(cpuif) = args.cpuif {
        config = config.cpuif(CpuifKind::parse(cpuif)?);
    }
    if let Some(style) = args.type_style {
        config = config.type_style(TypeStyle::parse(style)?);
    }
    if let Some(name) = args.module_name {
        config = config.module_name(name);
    }
    if let Some(name) = args.package_name {
        config = config.package_name(name);
    }
    if let Some(name) = args.rename {
        config = config.rename(name);
    }
    if args.hwif_report {
        config = config.hwif_report(true);
    }
    if args.flatten {
        config = config.flatten_hwif(true);
    }
    Ok(config)
}

pub fn generate(args: &Args) -> Result<()> {
    println!("Generating register block from: {}", args.map.display());
    let config = load_config(args)?;

    let text = std::fs::read_to_string(args.map)
        .with_context(|| format!("reading {}", args.map.display()))?;
    let map = RegMap::from_toml_str(&text)
        .with_context(|| format!("loading register map {}", args.map.display()))?;

    let artifacts = export_to_dir(&map, &config, args.output)
        .with_context(|| format!("exporting {}", args.map.display()))?;
    for file in &artifacts.files {
        println!("Output written to: {}", args.output.join(&file.name).display());
    }
    Ok(())
}
