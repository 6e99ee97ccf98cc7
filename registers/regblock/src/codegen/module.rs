// Licensed under the Apache-2.0 license

use crate::config::ExportConfig;
use crate::field_logic::{declare_struct, nested_members, FieldLogic};
use crate::hwif::{Hwif, HwifPackage};
use crate::regmap::{NodeKind, ParamValue, RegMap};
use crate::util::{indent, kw_filter, packed_range, sv_int};

pub const HEADER: &str = "// Generated by registers-regblock. Do not edit.";

fn banner(title: &str) -> String {
    let rule = format!("//{}", "-".repeat(76));
    format!("{rule}\n// {title}\n{rule}")
}

/// Ports of the generated module, grouped and in order.
fn port_groups(map: &RegMap, config: &ExportConfig, hwif: &Hwif) -> Vec<String> {
    let mut groups = vec!["input wire clk,\ninput wire rst".to_string()];

    let external: Vec<String> = map
        .external_signals()
        .map(|(_, node)| {
            let width = match node.kind {
                NodeKind::Signal { width } => width,
                _ => 1,
            };
            format!("input wire {}{}", packed_range(width), kw_filter(&node.name))
        })
        .collect();
    if !external.is_empty() {
        groups.push(external.join(",\n"));
    }

    groups.push(
        config
            .cpuif
            .port_declaration(config.data_width, config.addr_width),
    );

    let hwif_ports = hwif.port_declaration();
    if !hwif_ports.is_empty() {
        groups.push(hwif_ports);
    }
    groups
}

fn cpuif_section(config: &ExportConfig) -> String {
    let data = packed_range(config.data_width);
    let addr = packed_range(config.addr_width);
    [
        "logic cpuif_req;".to_string(),
        "logic cpuif_req_is_wr;".to_string(),
        format!("logic {addr}cpuif_addr;"),
        format!("logic {data}cpuif_wr_data;"),
        format!("logic {data}cpuif_wr_biten;"),
        "logic cpuif_req_stall_wr;".to_string(),
        "logic cpuif_req_stall_rd;".to_string(),
        "logic cpuif_rd_ack;".to_string(),
        "logic cpuif_rd_err;".to_string(),
        format!("logic {data}cpuif_rd_data;"),
        "logic cpuif_wr_ack;".to_string(),
        "logic cpuif_wr_err;".to_string(),
    ]
    .join("\n")
}

fn decode_section(map: &RegMap, config: &ExportConfig) -> String {
    let strobes = nested_members(map, map.top(), &mut |_| Some("logic".to_string()));
    let data = packed_range(config.data_width);
    let mut parts = vec![];
    let strobe_struct = declare_struct("decoded_reg_strb", &strobes);
    if !strobe_struct.is_empty() {
        parts.push(strobe_struct);
    }
    parts.push(
        [
            "logic decoded_req;".to_string(),
            "logic decoded_req_is_wr;".to_string(),
            format!("logic {data}decoded_wr_data;"),
            format!("logic {data}decoded_wr_biten;"),
        ]
        .join("\n"),
    );
    parts.join("\n")
}

fn field_section(fields: &FieldLogic) -> String {
    [
        fields.combo_struct(),
        fields.storage_struct(),
        fields.implementation(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// Renders the register block module.
pub(crate) fn render_module(
    map: &RegMap,
    config: &ExportConfig,
    module_name: &str,
    hwif: &Hwif,
) -> String {
    let ports = port_groups(map, config, hwif).join(",\n\n");
    let fields = FieldLogic::new(map, hwif);
    let body = [
        banner("CPU Bus interface logic"),
        cpuif_section(config),
        banner("Address Decode"),
        decode_section(map, config),
        banner("Field logic"),
        field_section(&fields),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join("\n\n");

    format!(
        "{HEADER}\n\nmodule {module_name}\n    (\n{}\n    );\n\n{}\nendmodule\n",
        indent(&ports, 2),
        indent(&body, 1)
    )
}

/// Renders the package holding the hwif typedefs and block parameters.
pub(crate) fn render_package(
    map: &RegMap,
    config: &ExportConfig,
    module_name: &str,
    package_name: &str,
    hwif: &HwifPackage,
) -> String {
    let upper = module_name.to_uppercase();
    let mut params = vec![
        format!("localparam {upper}_DATA_WIDTH = {};", config.data_width),
        format!("localparam {upper}_MIN_ADDR_WIDTH = {};", config.addr_width),
    ];
    for param in map.parameters() {
        let value = match &param.value {
            ParamValue::Int(v) => sv_int(*v, None),
            ParamValue::Str(s) => s.clone(),
        };
        params.push(format!("localparam {} = {value};", param.name));
    }

    let mut sections = vec![params.join("\n")];
    sections.extend(hwif.typedefs.iter().cloned());
    format!(
        "{HEADER}\n\npackage {package_name};\n{}\nendpackage\n",
        indent(&sections.join("\n\n"), 1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner() {
        let b = banner("Field logic");
        let lines: Vec<&str> = b.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 78);
        assert_eq!(lines[1], "// Field logic");
    }

    #[test]
    fn test_cpuif_section_widths() {
        let config = ExportConfig::with_defaults().data_width(16).addr_width(6);
        let text = cpuif_section(&config);
        assert!(text.contains("logic [5:0] cpuif_addr;"));
        assert!(text.contains("logic [15:0] cpuif_rd_data;"));
    }
}
