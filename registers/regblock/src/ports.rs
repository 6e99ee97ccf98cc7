// Licensed under the Apache-2.0 license

//! Flat port declarations and the logic connecting them to hwif structs.
//!
//! Unpacked dimensions are declared in reverse of their discovery order, so
//! `hwif_in.a[0:63].b[0:7].next[15:0]` becomes
//!
//! ```text
//! input logic [7:0] [63:0] [15:0] hwif_in_a_b
//! ```
//!
//! and the flat side of each connection is indexed in the same reversed
//! order: `hwif_in_a_b[j][i]`.

use crate::flatten::FlatSignal;
use crate::signal::Direction;

const INDENT: &str = "    ";

/// Number of elements covered by an inclusive range.
fn dim_size(first: u32, last: u32) -> u32 {
    first.abs_diff(last) + 1
}

/// Loop variable for the `depth`-th array dimension: `i`, `j`, `k`, ...
fn index_var(depth: usize) -> String {
    match u8::try_from(depth) {
        Ok(d) if d <= b'z' - b'i' => char::from(b'i' + d).to_string(),
        _ => format!("i{depth}"),
    }
}

/// Declaration of a single flat port.
pub fn port_declaration(signal: &FlatSignal) -> String {
    let path = &signal.path;
    let unpacked: String = path
        .array_dims()
        .iter()
        .rev()
        .map(|&(first, last)| format!("[{}:0] ", dim_size(first, last) - 1))
        .collect();
    let packed = if path.width() == 1 && path.base_offset() == 0 {
        String::new()
    } else {
        format!(
            "[{}:{}] ",
            path.base_offset() + path.width() - 1,
            path.base_offset()
        )
    };
    format!(
        "{} logic {unpacked}{packed}{}",
        path.direction().keyword(),
        signal.port_identifier()
    )
}

/// Port declarations for a list of signals, comma separated, one per line.
pub fn port_declarations(signals: &[FlatSignal]) -> String {
    signals
        .iter()
        .map(port_declaration)
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Connection logic for one signal. Inputs drive the struct member from the
/// flat port; outputs drive the flat port from the struct member.
pub fn connection(signal: &FlatSignal) -> Vec<String> {
    let path = &signal.path;
    let port = signal.port_identifier();
    let dims = path.array_dims();
    if dims.is_empty() {
        let struct_path = path.struct_path();
        return vec![match path.direction() {
            Direction::Input => format!("assign {struct_path} = {port};"),
            Direction::Output => format!("assign {port} = {struct_path};"),
        }];
    }

    let vars: Vec<String> = (0..dims.len()).map(index_var).collect();
    let mut lines = vec!["generate".to_string()];
    for (depth, (&(first, last), var)) in dims.iter().zip(&vars).enumerate() {
        lines.push(format!(
            "{}for (genvar {var} = 0; {var} <= {}; {var}++) begin",
            INDENT.repeat(depth + 1),
            dim_size(first, last) - 1
        ));
    }

    let flat_index: String = vars.iter().rev().map(|v| format!("[{v}]")).collect();
    let struct_path = path.indexed_struct_path(&vars);
    let body_indent = INDENT.repeat(dims.len() + 1);
    lines.push(match path.direction() {
        Direction::Input => format!("{body_indent}assign {struct_path} = {port}{flat_index};"),
        Direction::Output => format!("{body_indent}assign {port}{flat_index} = {struct_path};"),
    });

    for depth in (0..dims.len()).rev() {
        lines.push(format!("{}end", INDENT.repeat(depth + 1)));
    }
    lines.push("endgenerate".to_string());
    lines
}

/// Connection logic for a list of signals, one statement per line.
pub fn connections(signals: &[FlatSignal]) -> String {
    signals
        .iter()
        .flat_map(connection)
        .collect::<Vec<_>>()
        .join("\n")
}
