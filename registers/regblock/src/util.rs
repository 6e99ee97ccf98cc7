// Licensed under the Apache-2.0 license

//! Identifier and literal formatting helpers for generated SystemVerilog.

/// SystemVerilog reserved words (IEEE 1800-2017 Annex B).
#[rustfmt::skip]
const SV_KEYWORDS: &[&str] = &[
    "accept_on", "alias", "always", "always_comb", "always_ff", "always_latch", "and", "assert",
    "assign", "assume", "automatic", "before", "begin", "bind", "bins", "binsof", "bit", "break",
    "buf", "bufif0", "bufif1", "byte", "case", "casex", "casez", "cell", "chandle", "checker",
    "class", "clocking", "cmos", "config", "const", "constraint", "context", "continue", "cover",
    "covergroup", "coverpoint", "cross", "deassign", "default", "defparam", "design", "disable",
    "dist", "do", "edge", "else", "end", "endcase", "endchecker", "endclass", "endclocking",
    "endconfig", "endfunction", "endgenerate", "endgroup", "endinterface", "endmodule",
    "endpackage", "endprimitive", "endprogram", "endproperty", "endspecify", "endsequence",
    "endtable", "endtask", "enum", "event", "eventually", "expect", "export", "extends", "extern",
    "final", "first_match", "for", "force", "foreach", "forever", "fork", "forkjoin", "function",
    "generate", "genvar", "global", "highz0", "highz1", "if", "iff", "ifnone", "ignore_bins",
    "illegal_bins", "implements", "implies", "import", "incdir", "include", "initial", "inout",
    "input", "inside", "instance", "int", "integer", "interconnect", "interface", "intersect",
    "join", "join_any", "join_none", "large", "let", "liblist", "library", "local", "localparam",
    "logic", "longint", "macromodule", "matches", "medium", "modport", "module", "nand",
    "negedge", "nettype", "new", "nexttime", "nmos", "nor", "noshowcancelled", "not", "notif0",
    "notif1", "null", "or", "output", "package", "packed", "parameter", "pmos", "posedge",
    "primitive", "priority", "program", "property", "protected", "pull0", "pull1", "pulldown",
    "pullup", "pulsestyle_ondetect", "pulsestyle_onevent", "pure", "rand", "randc", "randcase",
    "randsequence", "rcmos", "real", "realtime", "ref", "reg", "reject_on", "release", "repeat",
    "restrict", "return", "rnmos", "rpmos", "rtran", "rtranif0", "rtranif1", "s_always",
    "s_eventually", "s_nexttime", "s_until", "s_until_with", "scalared", "sequence", "shortint",
    "shortreal", "showcancelled", "signed", "small", "soft", "solve", "specify", "specparam",
    "static", "string", "strong", "strong0", "strong1", "struct", "super", "supply0", "supply1",
    "sync_accept_on", "sync_reject_on", "table", "tagged", "task", "this", "throughout", "time",
    "timeprecision", "timeunit", "tran", "tranif0", "tranif1", "tri", "tri0", "tri1", "triand",
    "trior", "trireg", "type", "typedef", "union", "unique", "unique0", "unsigned", "until",
    "until_with", "untyped", "use", "uwire", "var", "vectored", "virtual", "void", "wait",
    "wait_order", "wand", "weak", "weak0", "weak1", "while", "wildcard", "wire", "with",
    "within", "wor", "xnor", "xor",
];

/// Appends `_` to names that collide with a SystemVerilog keyword.
///
/// # Examples
/// ```
/// use registers_regblock::util::kw_filter;
/// assert_eq!(kw_filter("input"), "input_");
/// assert_eq!(kw_filter("status"), "status");
/// ```
pub fn kw_filter(name: &str) -> String {
    if SV_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Formats a sized hex literal, e.g. `8'h3f`. Without a width the literal is
/// unsized: `'h3f`.
pub fn sv_int(value: u64, width: Option<u32>) -> String {
    match width {
        Some(width) => format!("{width}'h{value:x}"),
        None => format!("'h{value:x}"),
    }
}

/// Packed range prefix for a vector of `width` bits, including the trailing
/// space. Single bits get no range.
pub fn packed_range(width: u32) -> String {
    if width == 1 {
        String::new()
    } else {
        format!("[{}:0] ", width - 1)
    }
}

/// Indents every non-empty line of `text` by `levels` four-space steps.
pub fn indent(text: &str, levels: usize) -> String {
    let pad = "    ".repeat(levels);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kw_filter() {
        assert_eq!(kw_filter("logic"), "logic_");
        assert_eq!(kw_filter("always_ff"), "always_ff_");
        assert_eq!(kw_filter("Logic"), "Logic");
        assert_eq!(kw_filter("ctrl"), "ctrl");
    }

    #[test]
    fn test_sv_int() {
        assert_eq!(sv_int(0, Some(1)), "1'h0");
        assert_eq!(sv_int(0xab, Some(12)), "12'hab");
        assert_eq!(sv_int(4, None), "'h4");
    }

    #[test]
    fn test_packed_range() {
        assert_eq!(packed_range(1), "");
        assert_eq!(packed_range(8), "[7:0] ");
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent("a\n\nb", 1), "    a\n\n    b");
        assert_eq!(indent("", 2), "");
    }
}
