// Licensed under the Apache-2.0 license

//! Wrapper module with flat hwif ports.
//!
//! The wrapper re-exports every port of the register block except the two
//! hwif structs, which are replaced by the flat ports derived from an hwif
//! manifest. Port information is read from the block's own source text, so
//! any module that follows the `hwif_in`/`hwif_out` convention can be
//! wrapped together with its manifest.

use log::{debug, warn};

use crate::bitrange::{parse_manifest, Manifest};
use crate::codegen::HEADER;
use crate::error::{RegblockError, Result};
use crate::flatten::{flatten_all, FlatSignal};
use crate::ports::{connections, port_declarations};
use crate::signal::Direction;
use crate::util::indent;

/// One ANSI-style port of a module header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModulePort {
    /// Full declaration text, e.g. `input wire [31:0] s_apb_paddr`.
    pub declaration: String,
    pub name: String,
}

impl ModulePort {
    /// Declared type with the direction keyword and the name removed, e.g.
    /// `top_pkg::top__in_t`.
    pub fn data_type(&self) -> String {
        let tokens: Vec<&str> = self.declaration.split_whitespace().collect();
        let start = match tokens.first() {
            Some(&"input" | &"output" | &"inout") => 1,
            _ => 0,
        };
        let end = tokens.len().saturating_sub(1).max(start);
        tokens[start..end].join(" ")
    }
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |i| &after[i..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |i| &after[i + 2..]);
            out.push(' ');
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Returns the contents of the balanced group opening at `text[0]`, and the
/// text after its closing delimiter.
fn balanced_group(text: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some((&text[1..i], &text[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on commas outside of any brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Locates the header of `module_name`, returning the text after its name.
fn find_module<'s>(source: &'s str, module_name: &str) -> Option<&'s str> {
    let mut offset = 0;
    while let Some(pos) = source[offset..].find("module") {
        let at = offset + pos;
        offset = at + "module".len();
        let before_ok = !matches!(source[..at].chars().next_back(), Some(c) if is_ident_char(c));
        let after = &source[offset..];
        if !before_ok || !after.starts_with(char::is_whitespace) {
            continue;
        }
        let after = after.trim_start();
        if let Some(rest) = after.strip_prefix(module_name) {
            if !rest.starts_with(is_ident_char) {
                return Some(rest);
            }
        }
    }
    None
}

/// Extracts the ANSI port list of `module_name` from SystemVerilog source.
pub fn extract_module_ports(source: &str, module_name: &str) -> Result<Vec<ModulePort>> {
    let missing = || RegblockError::MissingModuleHeader(module_name.to_string());
    let source = strip_comments(source);
    let mut rest = find_module(&source, module_name).ok_or_else(missing)?.trim_start();

    // Parameter port list.
    if let Some(after) = rest.strip_prefix('#') {
        let (_, after) = balanced_group(after.trim_start()).ok_or_else(missing)?;
        rest = after.trim_start();
    }
    if !rest.starts_with('(') {
        return Err(missing());
    }
    let (list, _) = balanced_group(rest).ok_or_else(missing)?;

    let mut ports: Vec<ModulePort> = vec![];
    // Direction and type of the last full declaration, without name or
    // unpacked dimensions.
    let mut type_prefix = String::new();
    for entry in split_top_level(list) {
        let entry = entry.split_whitespace().collect::<Vec<_>>().join(" ");
        if entry.is_empty() {
            continue;
        }
        // Drop unpacked dimensions after the name to find it.
        let mut head = entry.as_str();
        while let Some(stripped) = head.strip_suffix(']') {
            head = match stripped.rfind('[') {
                Some(i) => stripped[..i].trim_end(),
                None => return Err(missing()),
            };
        }
        let name_start = head
            .rfind(|c: char| !is_ident_char(c))
            .map_or(0, |i| i + 1);
        let name = head[name_start..].to_string();
        if name.is_empty() {
            return Err(missing());
        }
        // A bare name continues the previous declaration: `input wire a, b`.
        let declaration = if name_start == 0 && !ports.is_empty() {
            format!("{type_prefix}{entry}")
        } else {
            type_prefix = head[..name_start].to_string();
            entry.clone()
        };
        ports.push(ModulePort { declaration, name });
    }
    debug!("module {module_name}: {} ports", ports.len());
    Ok(ports)
}

/// Builds the flat-port wrapper around a register block.
pub struct WrapperBuilder {
    module_name: String,
    ports: Vec<ModulePort>,
    inputs: Vec<FlatSignal>,
    outputs: Vec<FlatSignal>,
}

impl WrapperBuilder {
    pub fn new(module_name: &str, module_source: &str, manifest: &Manifest) -> Result<Self> {
        let ports = extract_module_ports(module_source, module_name)?;
        let inputs = flatten_all(&manifest.inputs)?;
        let outputs = flatten_all(&manifest.outputs)?;
        for (direction, signals) in [(Direction::Input, &inputs), (Direction::Output, &outputs)] {
            let prefix = direction.prefix();
            let has_port = ports.iter().any(|p| p.name == prefix);
            if signals.is_empty() {
                warn!("no {prefix} signals in hwif manifest");
            } else if !has_port {
                return Err(RegblockError::MissingHwifPort(prefix));
            }
        }
        Ok(Self {
            module_name: module_name.to_string(),
            ports,
            inputs,
            outputs,
        })
    }

    fn is_hwif(port: &ModulePort) -> bool {
        Direction::from_prefix(&port.name).is_some()
    }

    pub fn wrapper_name(&self) -> String {
        format!("{}_wrapper", self.module_name)
    }

    pub fn generate(&self) -> String {
        let mut port_lines: Vec<String> = self
            .ports
            .iter()
            .filter(|p| !Self::is_hwif(p))
            .map(|p| p.declaration.clone())
            .collect();
        for signals in [&self.inputs, &self.outputs] {
            if !signals.is_empty() {
                port_lines.push(port_declarations(signals));
            }
        }

        let mut body = vec![];
        let structs: Vec<String> = self
            .ports
            .iter()
            .filter(|p| Self::is_hwif(p))
            .map(|p| format!("{} {};", p.data_type(), p.name))
            .collect();
        if !structs.is_empty() {
            body.push(structs.join("\n"));
        }
        let mut assigns = vec![];
        for signals in [&self.inputs, &self.outputs] {
            if !signals.is_empty() {
                assigns.push(connections(signals));
            }
        }
        if !assigns.is_empty() {
            body.push(assigns.join("\n"));
        }
        let bindings: Vec<String> = self
            .ports
            .iter()
            .map(|p| format!(".{0}({0})", p.name))
            .collect();
        body.push(format!(
            "{0} i_{0} (\n{1}\n);",
            self.module_name,
            indent(&bindings.join(",\n"), 1)
        ));

        format!(
            "{HEADER}\n\nmodule {}\n    (\n{}\n    );\n{}\nendmodule\n",
            self.wrapper_name(),
            indent(&port_lines.join(",\n"), 2),
            indent(&body.join("\n\n"), 1)
        )
    }
}

/// Generates the wrapper for `module_name` from its source and an hwif
/// report. An empty report yields a wrapper with no flat ports.
pub fn generate_wrapper(module_name: &str, module_source: &str, report: &str) -> Result<String> {
    let manifest = parse_manifest(report)?;
    Ok(WrapperBuilder::new(module_name, module_source, &manifest)?.generate())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE: &str = r#"
// Generated by registers-regblock. Do not edit.

module blk #(parameter int W = 8 /* unused */)
    (
        input wire clk,
        input wire rst, // active high
        input wire [31:0] s_apb_paddr,
        apb3_intf.slave s_apb,
        input blk_pkg::blk__in_t hwif_in,
        output blk_pkg::blk__out_t hwif_out
    );
endmodule
"#;

    #[test]
    fn test_extract_ports() {
        let ports = extract_module_ports(MODULE, "blk").unwrap();
        let names: Vec<&str> = ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["clk", "rst", "s_apb_paddr", "s_apb", "hwif_in", "hwif_out"]
        );
        assert_eq!(ports[1].declaration, "input wire rst");
        assert_eq!(ports[4].data_type(), "blk_pkg::blk__in_t");
        assert_eq!(ports[3].data_type(), "apb3_intf.slave");
    }

    #[test]
    fn test_extract_continued_and_unpacked_ports() {
        let src = "module m(input wire a, b, output logic [3:0] q [2]);endmodule";
        let ports = extract_module_ports(src, "m").unwrap();
        assert_eq!(ports[1].declaration, "input wire b");
        assert_eq!(ports[2].name, "q");

        let src = "module m(output logic [3:0] q [2], r, input wire a);endmodule";
        let ports = extract_module_ports(src, "m").unwrap();
        assert_eq!(ports[1].declaration, "output logic [3:0] r");
        assert_eq!(ports[1].name, "r");
        assert_eq!(ports[2].declaration, "input wire a");
    }

    #[test]
    fn test_missing_module() {
        assert!(matches!(
            extract_module_ports(MODULE, "other"),
            Err(RegblockError::MissingModuleHeader(_))
        ));
        // Name prefix is not a match.
        assert!(extract_module_ports(MODULE, "bl").is_err());
        assert!(extract_module_ports("module blk;", "blk").is_err());
    }

    #[test]
    fn test_generate_wrapper() {
        let report = "hwif_in.ctrl.enable\nhwif_in.data[0:3][15:0]\nhwif_out.ctrl.enable.value\n";
        let text = generate_wrapper("blk", MODULE, report).unwrap();
        assert_eq!(
            text,
            "// Generated by registers-regblock. Do not edit.

module blk_wrapper
    (
        input wire clk,
        input wire rst,
        input wire [31:0] s_apb_paddr,
        apb3_intf.slave s_apb,
        input logic hwif_in_ctrl_enable,
        input logic [3:0] [15:0] hwif_in_data,
        output logic hwif_out_ctrl_enable
    );
    blk_pkg::blk__in_t hwif_in;
    blk_pkg::blk__out_t hwif_out;

    assign hwif_in.ctrl.enable = hwif_in_ctrl_enable;
    generate
        for (genvar i = 0; i <= 3; i++) begin
            assign hwif_in.data[i] = hwif_in_data[i];
        end
    endgenerate
    assign hwif_out_ctrl_enable = hwif_out.ctrl.enable.value;

    blk i_blk (
        .clk(clk),
        .rst(rst),
        .s_apb_paddr(s_apb_paddr),
        .s_apb(s_apb),
        .hwif_in(hwif_in),
        .hwif_out(hwif_out)
    );
endmodule
"
        );
    }

    #[test]
    fn test_empty_report() {
        let text = generate_wrapper("blk", MODULE, "").unwrap();
        assert!(text.contains("        apb3_intf.slave s_apb\n    );"));
        assert!(!text.contains("assign"));
        assert!(text.contains(".hwif_out(hwif_out)"));
    }

    #[test]
    fn test_missing_hwif_port() {
        let src = "module m(input wire clk);endmodule";
        assert!(matches!(
            generate_wrapper("m", src, "hwif_out.a.value\n"),
            Err(RegblockError::MissingHwifPort("hwif_out"))
        ));
        assert!(generate_wrapper("m", src, "").is_ok());
    }
}
