// Licensed under the Apache-2.0 license

use super::*;
use crate::config::{CpuifKind, TypeStyle};
use crate::error::RegblockError;

const BLOCK: &str = r#"
name = "uart"

[[parameters]]
name = "N_CH"
value = 2

[[parameters]]
name = "MODE"
value = "\"fast\""

[[signals]]
name = "ext_clr"

[[children]]
kind = "reg"
name = "ctrl"
[[children.fields]]
name = "enable"
lsb = 0
reset = 0
[[children.fields]]
name = "level"
lsb = 4
width = 4
sw = "r"
hw = "w"
sticky = true
implied_inputs = ["hwclr"]

[[children]]
kind = "reg"
name = "status"
array = [2]
[[children.fields]]
name = "rx"
lsb = 0
sw = "r"
hw = "w"
stickybit = true
intr = true
intr_type = "negedge"
reset = 0
"#;

fn block() -> RegMap {
    RegMap::from_toml_str(BLOCK).unwrap()
}

fn names(artifacts: &GeneratedArtifacts) -> Vec<&str> {
    artifacts.files.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn test_default_export() {
    let artifacts = export(&block(), &ExportConfig::with_defaults()).unwrap();
    assert_eq!(artifacts.module_name, "uart");
    assert_eq!(artifacts.package_name, "uart_pkg");
    assert_eq!(names(&artifacts), vec!["uart_pkg.sv", "uart.sv"]);

    let module = artifacts.get("uart.sv").unwrap();
    assert!(
        module.starts_with(
            "// Generated by registers-regblock. Do not edit.

module uart
    (
        input wire clk,
        input wire rst,

        input wire ext_clr,

        apb3_intf.slave s_apb,

        input uart_pkg::uart__in_t hwif_in,
        output uart_pkg::uart__out_t hwif_out
    );
"
        ),
        "{module}"
    );
    assert!(module.ends_with("endmodule\n"));
    assert!(module.contains("    // Field logic\n"));
    assert!(module.contains("        logic ctrl;\n        logic status[2];\n    } decoded_reg_strb_t;"));
}

#[test]
fn test_package_contents() {
    let artifacts = export(&block(), &ExportConfig::with_defaults()).unwrap();
    let package = artifacts.get("uart_pkg.sv").unwrap();
    assert!(package.contains("package uart_pkg;\n"));
    assert!(package.contains("    localparam UART_DATA_WIDTH = 32;\n"));
    assert!(package.contains("    localparam UART_MIN_ADDR_WIDTH = 32;\n"));
    assert!(package.contains("    localparam N_CH = 'h2;\n"));
    assert!(package.contains("    localparam MODE = \"fast\";\n"));
    assert!(package.contains("    } uart__in_t;\n"));
    assert!(package.contains("    } uart__out_t;\n"));
    assert!(package.ends_with("endpackage\n"));
}

#[test]
fn test_next_state_families_in_module() {
    let artifacts = export(&block(), &ExportConfig::with_defaults()).unwrap();
    let module = artifacts.get("uart.sv").unwrap();
    assert!(module.contains("if(hwif_in.ctrl.level.hwclr) begin // HW Clear"));
    assert!(module.contains(
        "end else if((field_storage.ctrl.level.value == '0) && (hwif_in.ctrl.level.next != '0)) begin // multi-bit sticky"
    ));
    // negedge stickybit inside the status array loop
    assert!(module.contains("for(genvar i0 = 0; i0 < 2; i0++) begin"));
    assert!(module.contains(
        "if((field_storage.status[i0].rx.next_q & ~hwif_in.status[i0].rx.next) != '0) begin // negedge stickybit"
    ));
    assert!(module.contains("field_storage.status[i0].rx.next_q <= hwif_in.status[i0].rx.next;"));
    assert!(module.contains("assign hwif_out.status[i0].intr = |{field_storage.status[i0].rx.value};"));
}

#[test]
fn test_report_and_wrapper() {
    let config = ExportConfig::with_defaults()
        .hwif_report(true)
        .flatten_hwif(true);
    let artifacts = export(&block(), &config).unwrap();
    assert_eq!(
        names(&artifacts),
        vec!["uart_pkg.sv", "uart_hwif.rpt", "uart_wrapper.sv", "uart.sv"]
    );
    assert_eq!(
        artifacts.get("uart_hwif.rpt").unwrap(),
        "hwif_in.ctrl.level.next[3:0]
hwif_in.ctrl.level.hwclr
hwif_in.status[0:1].rx.next
hwif_out.ctrl.enable.value
hwif_out.status[0:1].intr
"
    );

    let wrapper = artifacts.get("uart_wrapper.sv").unwrap();
    assert!(wrapper.contains("module uart_wrapper\n"));
    assert!(wrapper.contains("        input wire ext_clr,\n"));
    assert!(wrapper.contains("        input logic [3:0] hwif_in_ctrl_level,\n"));
    assert!(wrapper.contains("        input logic [1:0] hwif_in_status_rx,\n"));
    assert!(wrapper.contains("        output logic [1:0] hwif_out_status_intr\n    );"));
    assert!(wrapper.contains("    uart_pkg::uart__in_t hwif_in;\n"));
    assert!(wrapper.contains("            assign hwif_in.status[i].rx.next = hwif_in_status_rx[i];\n"));
    assert!(wrapper.contains("    uart i_uart (\n"));
    assert!(!wrapper.contains("hwif_in_status_rx_next"));
}

#[test]
fn test_export_is_idempotent() {
    let map = block();
    for style in [TypeStyle::Lexical, TypeStyle::Hier] {
        let config = ExportConfig::with_defaults()
            .type_style(style)
            .hwif_report(true)
            .flatten_hwif(true);
        let first = export(&map, &config).unwrap();
        let second = export(&map, &config).unwrap();
        assert_eq!(first, second, "{style:?}");
        assert_eq!(first.files.len(), 4);
    }
}

#[test]
fn test_names_from_config() {
    let config = ExportConfig::with_defaults()
        .rename("serial")
        .package_name("regs_pkg")
        .type_style(TypeStyle::Hier)
        .cpuif(CpuifKind::Axi4Lite);
    let artifacts = export(&block(), &config).unwrap();
    assert_eq!(artifacts.module_name, "serial");
    assert_eq!(names(&artifacts), vec!["regs_pkg.sv", "serial.sv"]);
    let module = artifacts.get("serial.sv").unwrap();
    assert!(module.contains("axi4lite_intf.slave s_axil,"));
    assert!(module.contains("input regs_pkg::serial__in_t hwif_in,"));
    let package = artifacts.get("regs_pkg.sv").unwrap();
    assert!(package.contains("} serial__ctrl__level__in_t;"));
}

#[test]
fn test_keyword_top_name_is_filtered() {
    let map = RegMap::new("module");
    let artifacts = export(&map, &ExportConfig::with_defaults()).unwrap();
    assert_eq!(artifacts.module_name, "module_");
    assert_eq!(artifacts.package_name, "module__pkg");
}

#[test]
fn test_empty_map_exports_without_hwif() {
    let map = RegMap::new("empty");
    let config = ExportConfig::with_defaults()
        .hwif_report(true)
        .flatten_hwif(true);
    let artifacts = export(&map, &config).unwrap();
    assert_eq!(artifacts.get("empty_hwif.rpt"), Some(""));
    let module = artifacts.get("empty.sv").unwrap();
    assert!(!module.contains("hwif_in"));
    assert!(module.contains("        apb3_intf.slave s_apb\n    );"));
    let wrapper = artifacts.get("empty_wrapper.sv").unwrap();
    assert!(wrapper.contains(".s_apb(s_apb)"));
    assert!(!wrapper.contains("assign"));
}

#[test]
fn test_invalid_config_rejected() {
    let config = ExportConfig::with_defaults().data_width(12);
    assert!(matches!(
        export(&block(), &config),
        Err(RegblockError::InvalidConfig(_))
    ));
}

#[test]
fn test_export_to_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig::with_defaults().hwif_report(true);
    let artifacts = export_to_dir(&block(), &config, dir.path()).unwrap();
    for file in &artifacts.files {
        let on_disk = std::fs::read_to_string(dir.path().join(&file.name)).unwrap();
        assert_eq!(on_disk, file.contents, "{}", file.name);
    }
}
