// Licensed under the Apache-2.0 license

//! Flat-port wrapper generation for an existing register block.

use anyhow::{anyhow, Context, Result};
use log::warn;
use registers_regblock::generate_wrapper;
use std::path::Path;

pub fn generate(report: &Path, module: &Path, name: Option<&str>, output: &Path) -> Result<()> {
    let module_name = match name {
        Some(name) => name.to_string(),
        None => module
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("cannot derive a module name from {}", module.display()))?,
    };
    println!("Generating wrapper for module {module_name}");

    // Blocks without hwif signals may have no report at all.
    let report_text = if report.exists() {
        std::fs::read_to_string(report).with_context(|| format!("reading {}", report.display()))?
    } else {
        warn!("{} does not exist, wrapping without hwif ports", report.display());
        String::new()
    };
    let source = std::fs::read_to_string(module)
        .with_context(|| format!("reading {}", module.display()))?;

    let wrapper = generate_wrapper(&module_name, &source, &report_text)
        .with_context(|| format!("wrapping {}", module.display()))?;

    std::fs::create_dir_all(output)?;
    let path = output.join(format!("{module_name}_wrapper.sv"));
    std::fs::write(&path, wrapper).with_context(|| format!("writing {}", path.display()))?;
    println!("Output written to: {}", path.display());
    Ok(())
}
