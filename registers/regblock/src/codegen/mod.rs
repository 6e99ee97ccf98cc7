// Licensed under the Apache-2.0 license

//! Register block export.
//!
//! [`export`] renders the package, the module and the optional hwif report
//! and flat wrapper for one register map. Nothing touches the disk until
//! every artifact rendered successfully; [`export_to_dir`] then writes them
//! together.

mod module;
#[cfg(test)]
mod tests;

use std::path::Path;

use log::info;

use crate::config::ExportConfig;
use crate::error::Result;
use crate::hwif::Hwif;
use crate::output::GeneratedArtifacts;
use crate::regmap::RegMap;
use crate::wrapper::generate_wrapper;

pub use module::HEADER;

/// Renders every artifact requested by `config`.
pub fn export(map: &RegMap, config: &ExportConfig) -> Result<GeneratedArtifacts> {
    config.validate()?;
    let top_inst = &map.node(map.top()).name;
    let top_name = config.top_name_for(top_inst);
    let module_name = config.module_name_for(&top_name);
    let package_name = config.package_name_for(&top_name);
    info!(
        "exporting {top_inst} as module {module_name} (package {package_name}, cpuif {})",
        config.cpuif
    );

    let mut hwif = Hwif::new(map, &top_name, &package_name, config.type_style);
    let package = hwif.build_package()?;
    let package_text =
        module::render_package(map, config, &module_name, &package_name, &package);
    let module_text = module::render_module(map, config, &module_name, &hwif);

    let mut artifacts = GeneratedArtifacts {
        module_name: module_name.clone(),
        package_name: package_name.clone(),
        files: vec![],
    };
    artifacts.push(format!("{package_name}.sv"), package_text);
    if config.hwif_report {
        artifacts.push(format!("{module_name}_hwif.rpt"), package.report_text());
    }
    if config.flatten_hwif {
        let wrapper = generate_wrapper(&module_name, &module_text, &package.report_text())?;
        artifacts.push(format!("{module_name}_wrapper.sv"), wrapper);
    }
    artifacts.push(format!("{module_name}.sv"), module_text);
    Ok(artifacts)
}

/// Renders and writes every artifact into `dir`.
pub fn export_to_dir(map: &RegMap, config: &ExportConfig, dir: &Path) -> Result<GeneratedArtifacts> {
    let artifacts = export(map, config)?;
    artifacts.write_all(dir)?;
    Ok(artifacts)
}
