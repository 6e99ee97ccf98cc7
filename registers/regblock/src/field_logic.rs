// Licensed under the Apache-2.0 license

//! Field storage and update logic.
//!
//! For every field with storage this emits an `always_comb` block choosing
//! the next value and an `always_ff` block latching it:
//!
//! ```text
//! always_comb begin
//!     automatic logic [3:0] next_c;
//!     automatic logic load_next_c;
//!     next_c = field_storage.chan[i0].status.err.value;
//!     load_next_c = '0;
//!     if(hwif_in.chan[i0].status.err.hwclr) begin // HW Clear
//!         next_c = '0;
//!         load_next_c = '1;
//!     end else if(hwif_in.chan[i0].status.err.next != '0) begin // stickybit
//!         next_c = field_storage.chan[i0].status.err.value | hwif_in.chan[i0].status.err.next;
//!         load_next_c = '1;
//!     end
//!     field_combo.chan[i0].status.err.next = next_c;
//!     field_combo.chan[i0].status.err.load_next = load_next_c;
//! end
//! ```
//!
//! Logic of arrayed components sits inside one generate loop per dimension,
//! using the same `i0`, `i1`, ... indices as [`Hwif::indexed_path`].

use std::collections::HashMap;

use crate::hwif::Hwif;
use crate::nextstate::{Conditional, FieldIdentifiers, NextStateFamily};
use crate::regmap::{FieldRef, ImpliedInput, ImpliedOutput, NodeIdx, NodeKind, OutRef, RegMap};
use crate::util::{indent, kw_filter, packed_range, sv_int};

const LOAD: &str = "load_next_c = '1;";

pub struct FieldLogic<'a> {
    map: &'a RegMap,
    hwif: &'a Hwif<'a>,
    /// Next-state family of every hardware-writable field, selected once.
    families: HashMap<NodeIdx, NextStateFamily>,
}

impl FieldIdentifiers for FieldLogic<'_> {
    fn input_identifier(&self, field: FieldRef<'_>) -> String {
        self.hwif.input_identifier(field)
    }

    fn next_q_identifier(&self, field: FieldRef<'_>) -> String {
        format!("field_storage.{}.next_q", self.hwif.indexed_path(field.idx))
    }

    fn storage_identifier(&self, field: FieldRef<'_>) -> String {
        format!("field_storage.{}.value", self.hwif.indexed_path(field.idx))
    }

    fn implied_input_identifier(&self, field: FieldRef<'_>, prop: ImpliedInput) -> String {
        format!("hwif_in.{}.{prop}", self.hwif.indexed_path(field.idx))
    }
}

impl<'a> FieldLogic<'a> {
    pub fn new(map: &'a RegMap, hwif: &'a Hwif<'a>) -> Self {
        let mut families = HashMap::new();
        let mut pending = vec![map.top()];
        while let Some(idx) = pending.pop() {
            pending.extend(&map.node(idx).children);
            if let Some(family) = map.field(idx).and_then(|f| NextStateFamily::select(f.props)) {
                families.insert(idx, family);
            }
        }
        Self {
            map,
            hwif,
            families,
        }
    }

    /// Next-state family of `field`, or `None` when hardware cannot write it.
    pub fn family(&self, field: FieldRef<'_>) -> Option<NextStateFamily> {
        self.families.get(&field.idx).copied()
    }

    fn combo_identifier(&self, field: FieldRef<'_>, member: &str) -> String {
        format!("field_combo.{}.{member}", self.hwif.indexed_path(field.idx))
    }

    /// Write strobe of the register containing `field`.
    fn reg_strobe(&self, field: FieldRef<'_>) -> String {
        let reg = self.map.node(field.idx).parent.unwrap_or(field.idx);
        format!("decoded_reg_strb.{}", self.hwif.indexed_path(reg))
    }

    /// `field_storage` struct declaration, or empty when nothing is stored.
    pub fn storage_struct(&self) -> String {
        let members = nested_members(self.map, self.map.top(), &mut |reg| {
            self.reg_fields_struct(reg, |field| {
                let range = packed_range(field.props.width);
                let mut lines = vec![format!("logic {range}value;")];
                if self.family(field).is_some_and(|f| f.needs_previous_sample()) {
                    lines.push(format!("logic {range}next_q;"));
                }
                lines
            })
        });
        declare_struct("field_storage", &members)
    }

    /// `field_combo` struct declaration, or empty when nothing is stored.
    pub fn combo_struct(&self) -> String {
        let members = nested_members(self.map, self.map.top(), &mut |reg| {
            self.reg_fields_struct(reg, |field| {
                vec![
                    format!("logic {}next;", packed_range(field.props.width)),
                    "logic load_next;".to_string(),
                ]
            })
        });
        declare_struct("field_combo", &members)
    }

    fn reg_fields_struct(
        &self,
        reg: NodeIdx,
        members: impl Fn(FieldRef<'_>) -> Vec<String>,
    ) -> Option<String> {
        let fields: Vec<String> = self
            .map
            .fields_of(reg)
            .filter(|f| f.props.has_storage())
            .map(|f| {
                let name = kw_filter(&self.map.node(f.idx).name);
                anonymous_struct(&members(f), &name)
            })
            .collect();
        if fields.is_empty() {
            None
        } else {
            Some(format!("struct {{\n{}\n}}", indent(&fields.join("\n"), 1)))
        }
    }

    /// All field logic of the block.
    pub fn implementation(&self) -> String {
        let mut blocks = vec![];
        self.collect_regs(self.map.top(), &mut blocks);
        blocks.join("\n\n")
    }

    fn collect_regs(&self, node: NodeIdx, blocks: &mut Vec<String>) {
        for &child in &self.map.node(node).children {
            match self.map.node(child).kind {
                NodeKind::Reg { .. } => {
                    let body = self.reg_logic(child);
                    if !body.is_empty() {
                        blocks.push(self.wrap_in_generate(child, body));
                    }
                }
                NodeKind::AddrMap | NodeKind::RegFile => self.collect_regs(child, blocks),
                NodeKind::Field(_) | NodeKind::Signal { .. } => {}
            }
        }
    }

    /// Wraps `body` in one generate loop per array dimension of `reg` and
    /// its ancestors, outermost first.
    fn wrap_in_generate(&self, reg: NodeIdx, body: String) -> String {
        let mut dims = vec![];
        let mut cur = Some(reg);
        while let Some(idx) = cur {
            if idx == self.map.top() {
                break;
            }
            let node = self.map.node(idx);
            dims.splice(0..0, node.array.iter().copied());
            cur = node.parent;
        }
        let mut text = body;
        for (dim, size) in dims.iter().enumerate().rev() {
            text = format!(
                "for(genvar i{dim} = 0; i{dim} < {size}; i{dim}++) begin\n{}\nend",
                indent(&text, 1)
            );
        }
        text
    }

    fn reg_logic(&self, reg: NodeIdx) -> String {
        let mut sections = vec![];
        let mut intr_values = vec![];
        for field in self.map.fields_of(reg) {
            sections.push(self.field_logic(field));
            if field.props.intr {
                intr_values.push(self.hwif.field_value(field));
            }
        }
        if !intr_values.is_empty() {
            sections.push(format!(
                "assign {} = |{{{}}};",
                self.hwif.output_identifier(OutRef::RegIntr(reg)),
                intr_values.join(", ")
            ));
        }
        sections.retain(|s| !s.is_empty());
        sections.join("\n")
    }

    fn conditionals(&self, field: FieldRef<'_>) -> Vec<Conditional> {
        let props = field.props;
        let mut conds = vec![];
        if props.is_sw_writable() {
            let mut predicate = format!("{} && decoded_req_is_wr", self.reg_strobe(field));
            if props.implied_inputs.contains(&ImpliedInput::Swwe) {
                predicate.push_str(&format!(
                    " && {}",
                    self.implied_input_identifier(field, ImpliedInput::Swwe)
                ));
            } else if props.implied_inputs.contains(&ImpliedInput::Swwel) {
                predicate.push_str(&format!(
                    " && !{}",
                    self.implied_input_identifier(field, ImpliedInput::Swwel)
                ));
            }
            let bits = format!("[{}:{}]", props.msb(), props.lsb);
            conds.push(Conditional {
                comment: "SW write",
                predicate,
                assignments: vec![
                    format!(
                        "next_c = ({} & ~decoded_wr_biten{bits}) | (decoded_wr_data{bits} & decoded_wr_biten{bits});",
                        self.storage_identifier(field)
                    ),
                    LOAD.to_string(),
                ],
            });
        }
        if props.implied_inputs.contains(&ImpliedInput::Hwclr) {
            conds.push(Conditional {
                comment: "HW Clear",
                predicate: self.implied_input_identifier(field, ImpliedInput::Hwclr),
                assignments: vec!["next_c = '0;".to_string(), LOAD.to_string()],
            });
        }
        if props.implied_inputs.contains(&ImpliedInput::Hwset) {
            conds.push(Conditional {
                comment: "HW Set",
                predicate: self.implied_input_identifier(field, ImpliedInput::Hwset),
                assignments: vec!["next_c = '1;".to_string(), LOAD.to_string()],
            });
        }
        if let Some(family) = self.family(field) {
            conds.push(family.conditional(field, self));
        }
        conds
    }

    fn field_logic(&self, field: FieldRef<'_>) -> String {
        let props = field.props;
        let mut lines = vec![format!(
            "// Field: {}",
            self.map.path_name(field.idx)
        )];

        if props.has_storage() {
            let storage = self.storage_identifier(field);
            let mut comb = vec![
                format!("automatic logic {}next_c;", packed_range(props.width)),
                "automatic logic load_next_c;".to_string(),
                format!("next_c = {storage};"),
                "load_next_c = '0;".to_string(),
            ];
            comb.extend(render_conditionals(&self.conditionals(field)));
            comb.push(format!("{} = next_c;", self.combo_identifier(field, "next")));
            comb.push(format!(
                "{} = load_next_c;",
                self.combo_identifier(field, "load_next")
            ));
            lines.push(format!(
                "always_comb begin\n{}\nend",
                indent(&comb.join("\n"), 1)
            ));

            let load = self.combo_identifier(field, "load_next");
            let latch = format!("{storage} <= {};", self.combo_identifier(field, "next"));
            let ff = match props.reset {
                Some(reset) => format!(
                    "if(rst) begin\n    {storage} <= {};\nend else if({load}) begin\n    {latch}\nend",
                    sv_int(reset, Some(props.width))
                ),
                None => format!("if({load}) begin\n    {latch}\nend"),
            };
            lines.push(format!(
                "always_ff @(posedge clk) begin\n{}\nend",
                indent(&ff, 1)
            ));

            if self.family(field).is_some_and(|f| f.needs_previous_sample()) {
                lines.push(format!(
                    "always_ff @(posedge clk) begin\n    {} <= {};\nend",
                    self.next_q_identifier(field),
                    self.input_identifier(field)
                ));
            }
        }

        let value = self.hwif.field_value(field);
        if props.is_hw_readable() {
            lines.push(format!(
                "assign {} = {value};",
                self.hwif.output_identifier(OutRef::Field(field.idx))
            ));
        }
        for &prop in &props.implied_outputs {
            let expr = match prop {
                ImpliedOutput::Anded => format!("&({value})"),
                ImpliedOutput::Ored => format!("|({value})"),
                ImpliedOutput::Xored => format!("^({value})"),
                ImpliedOutput::Swmod => {
                    format!("{} && decoded_req_is_wr", self.reg_strobe(field))
                }
                ImpliedOutput::Swacc => self.reg_strobe(field),
            };
            lines.push(format!(
                "assign {} = {expr};",
                self.hwif
                    .output_identifier(OutRef::PropertyRef(field.idx, prop))
            ));
        }

        if lines.len() == 1 {
            String::new()
        } else {
            lines.join("\n")
        }
    }
}

fn render_conditionals(conds: &[Conditional]) -> Vec<String> {
    let mut lines = vec![];
    for (i, cond) in conds.iter().enumerate() {
        let keyword = if i == 0 { "if" } else { "end else if" };
        lines.push(format!(
            "{keyword}({}) begin // {}",
            cond.predicate, cond.comment
        ));
        lines.extend(cond.assignments.iter().map(|a| format!("    {a}")));
    }
    if !conds.is_empty() {
        lines.push("end".to_string());
    }
    lines
}

fn anonymous_struct(members: &[String], name: &str) -> String {
    format!("struct {{\n{}\n}} {name};", indent(&members.join("\n"), 1))
}

/// Declares a struct type and its one instance, or nothing when empty.
pub(crate) fn declare_struct(name: &str, members: &[String]) -> String {
    if members.is_empty() {
        return String::new();
    }
    format!(
        "typedef struct {{\n{}\n}} {name}_t;\n{name}_t {name};",
        indent(&members.join("\n"), 1)
    )
}

/// Nested anonymous struct members mirroring the addressable hierarchy below
/// `node`. `reg_type` gives the member type of a register, or `None` to
/// leave it out.
pub(crate) fn nested_members(
    map: &RegMap,
    node: NodeIdx,
    reg_type: &mut dyn FnMut(NodeIdx) -> Option<String>,
) -> Vec<String> {
    let mut members = vec![];
    for &child in &map.node(node).children {
        let c = map.node(child);
        let dims: String = c.array.iter().map(|d| format!("[{d}]")).collect();
        let name = kw_filter(&c.name);
        let member_type = match c.kind {
            NodeKind::Reg { .. } => reg_type(child),
            NodeKind::AddrMap | NodeKind::RegFile => {
                let inner = nested_members(map, child, reg_type);
                if inner.is_empty() {
                    None
                } else {
                    Some(format!("struct {{\n{}\n}}", indent(&inner.join("\n"), 1)))
                }
            }
            NodeKind::Field(_) | NodeKind::Signal { .. } => None,
        };
        if let Some(member_type) = member_type {
            members.push(format!("{member_type} {name}{dims};"));
        }
    }
    members
}
