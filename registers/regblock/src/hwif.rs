// Licensed under the Apache-2.0 license

//! Structured hardware interface.
//!
//! Walks the register map and describes every signal crossing the block
//! boundary as nested packed-free structs:
//!
//! ```text
//! typedef struct {
//!     logic [3:0] next;
//!     logic hwset;
//! } status_t__err__in_t;
//!
//! typedef struct {
//!     status_t__err__in_t err;
//! } status_t__in_t;
//!
//! typedef struct {
//!     status_t__in_t status[4];
//! } top__in_t;
//! ```
//!
//! The same walk produces the hwif report, one manifest line per leaf
//! member of every instance (`hwif_in.status[0:3].err.next[3:0]`). It also
//! answers the identifier queries the field logic makes for each field.

use std::collections::HashMap;

use log::debug;

use crate::config::TypeStyle;
use crate::error::{RegblockError, Result};
use crate::regmap::{FieldRef, HwRef, NodeIdx, NodeKind, OutRef, RegMap};
use crate::signal::Direction;
use crate::util::{indent, kw_filter, packed_range, sv_int};

/// Struct typedefs and report produced for one register map.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HwifPackage {
    /// Input typedefs followed by output typedefs, children before parents.
    pub typedefs: Vec<String>,
    pub has_input_struct: bool,
    pub has_output_struct: bool,
    /// Manifest lines, all inputs first.
    pub report: Vec<String>,
}

impl HwifPackage {
    /// The hwif report file contents.
    pub fn report_text(&self) -> String {
        let mut text = self.report.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}

/// Accumulates typedefs while walking one direction.
#[derive(Default)]
struct StructCollector {
    typedefs: Vec<String>,
    bodies: HashMap<String, String>,
    report: Vec<String>,
}

impl StructCollector {
    fn typedef(&mut self, type_name: &str, members: &[String]) -> Result<()> {
        let body = indent(&members.join("\n"), 1);
        match self.bodies.get(type_name) {
            Some(existing) if *existing == body => Ok(()),
            Some(_) => Err(RegblockError::InvalidRegMap(format!(
                "components sharing hwif type `{type_name}` have different contents"
            ))),
            None => {
                self.typedefs
                    .push(format!("typedef struct {{\n{body}\n}} {type_name};"));
                self.bodies.insert(type_name.to_string(), body);
                Ok(())
            }
        }
    }

    fn leaf(&mut self, members: &mut Vec<String>, report_path: &str, name: &str, width: u32) {
        members.push(format!("logic {}{name};", packed_range(width)));
        let range = if width == 1 {
            String::new()
        } else {
            format!("[{}:0]", width - 1)
        };
        self.report.push(format!("{report_path}.{name}{range}"));
    }
}

/// Per-node naming context during the walk.
struct Scope {
    /// Type scope, e.g. `status_t` (lexical) or `top__chan__status` (hier).
    type_scope: String,
    /// Manifest path, e.g. `hwif_in.chan[0:3].status`.
    report_path: String,
}

pub struct Hwif<'a> {
    map: &'a RegMap,
    top_name: String,
    package_name: String,
    style: TypeStyle,
    has_input_struct: bool,
    has_output_struct: bool,
}

impl<'a> Hwif<'a> {
    pub fn new(map: &'a RegMap, top_name: &str, package_name: &str, style: TypeStyle) -> Self {
        Self {
            map,
            top_name: top_name.to_string(),
            package_name: package_name.to_string(),
            style,
            has_input_struct: false,
            has_output_struct: false,
        }
    }

    pub fn struct_type_name(&self, direction: Direction) -> String {
        match direction {
            Direction::Input => format!("{}__in_t", self.top_name),
            Direction::Output => format!("{}__out_t", self.top_name),
        }
    }

    /// Builds the struct typedefs and report. Must run before
    /// [`Hwif::port_declaration`].
    pub fn build_package(&mut self) -> Result<HwifPackage> {
        let mut package = HwifPackage::default();
        for direction in [Direction::Input, Direction::Output] {
            let mut collector = StructCollector::default();
            let top = Scope {
                type_scope: self.top_name.clone(),
                report_path: direction.prefix().to_string(),
            };
            let present = self
                .walk(direction, self.map.top(), &top, &mut collector)?
                .is_some();
            debug!(
                "{} struct: {} typedefs, {} signals",
                direction.prefix(),
                collector.typedefs.len(),
                collector.report.len()
            );
            match direction {
                Direction::Input => self.has_input_struct = present,
                Direction::Output => self.has_output_struct = present,
            }
            package.typedefs.append(&mut collector.typedefs);
            package.report.append(&mut collector.report);
        }
        package.has_input_struct = self.has_input_struct;
        package.has_output_struct = self.has_output_struct;
        Ok(package)
    }

    pub fn has_input_struct(&self) -> bool {
        self.has_input_struct
    }

    pub fn has_output_struct(&self) -> bool {
        self.has_output_struct
    }

    /// Module port declarations for the hwif structs that exist.
    pub fn port_declaration(&self) -> String {
        let mut lines = vec![];
        if self.has_input_struct {
            lines.push(format!(
                "input {}::{} hwif_in",
                self.package_name,
                self.struct_type_name(Direction::Input)
            ));
        }
        if self.has_output_struct {
            lines.push(format!(
                "output {}::{} hwif_out",
                self.package_name,
                self.struct_type_name(Direction::Output)
            ));
        }
        lines.join(",\n")
    }

    /// Emits the typedef for `node` and returns its type name, or `None`
    /// when nothing below it crosses the boundary in this direction.
    fn walk(
        &self,
        direction: Direction,
        node: NodeIdx,
        scope: &Scope,
        out: &mut StructCollector,
    ) -> Result<Option<String>> {
        let mut members = vec![];
        let n = self.map.node(node);

        for &child in &n.children {
            let c = self.map.node(child);
            let name = kw_filter(&c.name);
            if let NodeKind::Signal { width } = c.kind {
                if direction == Direction::Input {
                    out.leaf(&mut members, &scope.report_path, &name, width);
                }
                continue;
            }
            let ranges: String = c.array.iter().map(|d| format!("[0:{}]", d - 1)).collect();
            let dims: String = c.array.iter().map(|d| format!("[{d}]")).collect();
            let child_scope = Scope {
                type_scope: self.child_type_scope(scope, child),
                report_path: format!("{}.{name}{ranges}", scope.report_path),
            };
            if let Some(type_name) = self.walk(direction, child, &child_scope, out)? {
                members.push(format!("{type_name} {name}{dims};"));
            }
        }

        match (&n.kind, direction) {
            (NodeKind::Field(props), Direction::Input) => {
                if props.is_hw_writable() && props.next.is_none() {
                    out.leaf(&mut members, &scope.report_path, "next", props.width);
                }
                for prop in &props.implied_inputs {
                    out.leaf(&mut members, &scope.report_path, &prop.to_string(), 1);
                }
            }
            (NodeKind::Field(props), Direction::Output) => {
                if props.is_hw_readable() {
                    out.leaf(&mut members, &scope.report_path, "value", props.width);
                }
                for prop in &props.implied_outputs {
                    out.leaf(&mut members, &scope.report_path, &prop.to_string(), 1);
                }
            }
            (NodeKind::Reg { .. }, Direction::Output) => {
                if self.map.fields_of(node).any(|f| f.props.intr) {
                    out.leaf(&mut members, &scope.report_path, "intr", 1);
                }
            }
            _ => {}
        }

        if members.is_empty() {
            return Ok(None);
        }
        let suffix = match direction {
            Direction::Input => "in_t",
            Direction::Output => "out_t",
        };
        let type_name = format!("{}__{suffix}", scope.type_scope);
        out.typedef(&type_name, &members)?;
        Ok(Some(type_name))
    }

    fn child_type_scope(&self, parent: &Scope, child: NodeIdx) -> String {
        let node = self.map.node(child);
        match (self.style, &node.type_name) {
            (TypeStyle::Lexical, Some(type_name)) => type_name.clone(),
            _ => format!("{}__{}", parent.type_scope, node.name),
        }
    }

    /// Dotted path from the top node with a generate index in place of each
    /// array dimension, numbered outermost first: `chan[i0].status.err`.
    pub fn indexed_path(&self, node: NodeIdx) -> String {
        let mut chain = vec![];
        let mut cur = Some(node);
        while let Some(idx) = cur {
            if idx == self.map.top() {
                break;
            }
            chain.push(idx);
            cur = self.map.node(idx).parent;
        }
        let mut dim = 0;
        let mut parts = Vec::with_capacity(chain.len());
        for &idx in chain.iter().rev() {
            let n = self.map.node(idx);
            let mut part = kw_filter(&n.name);
            for _ in &n.array {
                part.push_str(&format!("[i{dim}]"));
                dim += 1;
            }
            parts.push(part);
        }
        parts.join(".")
    }

    /// Current value of a field: its storage, or its reset constant when
    /// nothing can write it.
    pub fn field_value(&self, field: FieldRef<'_>) -> String {
        if field.props.has_storage() {
            format!("field_storage.{}.value", self.indexed_path(field.idx))
        } else {
            sv_int(field.props.reset.unwrap_or(0), Some(field.props.width))
        }
    }

    /// Value a reference evaluates to when read by logic.
    pub fn dereference(&self, reference: HwRef) -> String {
        match reference {
            HwRef::Field(idx) => match self.map.field(idx) {
                Some(field) => self.field_value(field),
                None => format!("field_storage.{}.value", self.indexed_path(idx)),
            },
            HwRef::Signal(idx) => {
                if self.map.is_within_top(idx) {
                    format!("hwif_in.{}", self.indexed_path(idx))
                } else {
                    kw_filter(&self.map.node(idx).name)
                }
            }
            HwRef::PropertyRef(idx, prop) => {
                format!("hwif_in.{}.{prop}", self.indexed_path(idx))
            }
        }
    }

    /// The field's hardware input. A `next` override replaces the inferred
    /// `next` member.
    pub fn input_identifier(&self, field: FieldRef<'_>) -> String {
        match field.props.next {
            Some(next) => self.dereference(next),
            None => format!("hwif_in.{}.next", self.indexed_path(field.idx)),
        }
    }

    pub fn output_identifier(&self, reference: OutRef) -> String {
        match reference {
            OutRef::Field(idx) => format!("hwif_out.{}.value", self.indexed_path(idx)),
            OutRef::PropertyRef(idx, prop) => {
                format!("hwif_out.{}.{prop}", self.indexed_path(idx))
            }
            OutRef::RegIntr(idx) => format!("hwif_out.{}.intr", self.indexed_path(idx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regmap::{AccessType, FieldProperties, ImpliedInput, ImpliedOutput};

    fn status_map() -> RegMap {
        RegMap::from_toml_str(
            r#"
name = "top"

[[signals]]
name = "ext_clr"

[[children]]
kind = "reg"
name = "ctrl"
[[children.fields]]
name = "enable"
lsb = 0
implied_outputs = ["swmod"]

[[children]]
kind = "regfile"
name = "chan"
type_name = "chan_t"
array = [4]

[[children.children]]
kind = "reg"
name = "status"
type_name = "status_t"
[[children.children.fields]]
name = "err"
lsb = 0
width = 4
sw = "r"
hw = "w"
stickybit = true
intr = true
implied_inputs = ["hwclr"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_report_and_presence() {
        let map = status_map();
        let mut hwif = Hwif::new(&map, "top", "top_pkg", TypeStyle::Lexical);
        let package = hwif.build_package().unwrap();
        assert!(package.has_input_struct);
        assert!(package.has_output_struct);
        assert_eq!(
            package.report,
            vec![
                "hwif_in.chan[0:3].status.err.next[3:0]",
                "hwif_in.chan[0:3].status.err.hwclr",
                "hwif_out.ctrl.enable.value",
                "hwif_out.ctrl.enable.swmod",
                "hwif_out.chan[0:3].status.intr",
            ]
        );
        assert_eq!(
            hwif.port_declaration(),
            "input top_pkg::top__in_t hwif_in,\noutput top_pkg::top__out_t hwif_out"
        );
    }

    #[test]
    fn test_lexical_typedefs() {
        let map = status_map();
        let mut hwif = Hwif::new(&map, "top", "top_pkg", TypeStyle::Lexical);
        let package = hwif.build_package().unwrap();
        assert_eq!(
            package.typedefs[0],
            "typedef struct {\n    logic [3:0] next;\n    logic hwclr;\n} status_t__err__in_t;"
        );
        assert!(package
            .typedefs
            .contains(&"typedef struct {\n    chan_t__in_t chan[4];\n} top__in_t;".to_string()));
        assert!(package
            .typedefs
            .contains(&"typedef struct {\n    logic intr;\n} status_t__out_t;".to_string()));
    }

    #[test]
    fn test_hier_typedef_names() {
        let map = status_map();
        let mut hwif = Hwif::new(&map, "top", "top_pkg", TypeStyle::Hier);
        let package = hwif.build_package().unwrap();
        let names: Vec<&str> = package
            .typedefs
            .iter()
            .filter_map(|t| t.lines().last())
            .collect();
        assert_eq!(
            names,
            vec![
                "} top__chan__status__err__in_t;",
                "} top__chan__status__in_t;",
                "} top__chan__in_t;",
                "} top__in_t;",
                "} top__ctrl__enable__out_t;",
                "} top__ctrl__out_t;",
                "} top__chan__status__out_t;",
                "} top__chan__out_t;",
                "} top__out_t;",
            ]
        );
    }

    #[test]
    fn test_lexical_reuse_emits_typedef_once() {
        let mut map = RegMap::new("top");
        for name in ["a", "b"] {
            let reg = map.add_reg(map.top(), name, 32).unwrap();
            map.set_type_name(reg, "r_t");
            let props = FieldProperties {
                hw: AccessType::W,
                ..FieldProperties::new(0, 8)
            };
            map.add_field(reg, "f", props).unwrap();
        }
        let mut hwif = Hwif::new(&map, "top", "pkg", TypeStyle::Lexical);
        let package = hwif.build_package().unwrap();
        let inputs: Vec<&String> = package
            .typedefs
            .iter()
            .filter(|t| t.ends_with("__in_t;"))
            .collect();
        assert_eq!(inputs.len(), 3, "{inputs:#?}");
        assert_eq!(package.report, vec!["hwif_in.a.f.next[7:0]", "hwif_in.b.f.next[7:0]"]);
    }

    #[test]
    fn test_lexical_conflict_is_an_error() {
        let mut map = RegMap::new("top");
        for (name, width) in [("a", 8), ("b", 4)] {
            let reg = map.add_reg(map.top(), name, 32).unwrap();
            map.set_type_name(reg, "r_t");
            let props = FieldProperties {
                hw: AccessType::W,
                ..FieldProperties::new(0, width)
            };
            map.add_field(reg, "f", props).unwrap();
        }
        let mut hwif = Hwif::new(&map, "top", "pkg", TypeStyle::Lexical);
        assert!(matches!(
            hwif.build_package(),
            Err(RegblockError::InvalidRegMap(_))
        ));
        let mut hwif = Hwif::new(&map, "top", "pkg", TypeStyle::Hier);
        assert!(hwif.build_package().is_ok());
    }

    #[test]
    fn test_empty_directions() {
        let mut map = RegMap::new("top");
        let reg = map.add_reg(map.top(), "scratch", 32).unwrap();
        let props = FieldProperties {
            hw: AccessType::Na,
            ..FieldProperties::new(0, 32)
        };
        map.add_field(reg, "data", props).unwrap();
        let mut hwif = Hwif::new(&map, "top", "pkg", TypeStyle::Lexical);
        let package = hwif.build_package().unwrap();
        assert!(!package.has_input_struct);
        assert!(!package.has_output_struct);
        assert!(package.typedefs.is_empty());
        assert_eq!(package.report_text(), "");
        assert_eq!(hwif.port_declaration(), "");
    }

    #[test]
    fn test_identifiers() {
        let map = status_map();
        let hwif = Hwif::new(&map, "top", "top_pkg", TypeStyle::Lexical);
        let err = map.lookup("chan.status.err").unwrap();
        let status = map.lookup("chan.status").unwrap();
        let enable = map.lookup("ctrl.enable").unwrap();
        let ext = map.resolve_reference(err, "ext_clr").unwrap();

        assert_eq!(hwif.indexed_path(err), "chan[i0].status.err");
        assert_eq!(
            hwif.input_identifier(map.field(err).unwrap()),
            "hwif_in.chan[i0].status.err.next"
        );
        assert_eq!(
            hwif.dereference(HwRef::PropertyRef(err, ImpliedInput::Hwclr)),
            "hwif_in.chan[i0].status.err.hwclr"
        );
        assert_eq!(hwif.dereference(ext), "ext_clr");
        assert_eq!(
            hwif.output_identifier(OutRef::RegIntr(status)),
            "hwif_out.chan[i0].status.intr"
        );
        assert_eq!(
            hwif.output_identifier(OutRef::PropertyRef(enable, ImpliedOutput::Swmod)),
            "hwif_out.ctrl.enable.swmod"
        );
        assert_eq!(
            hwif.output_identifier(OutRef::Field(enable)),
            "hwif_out.ctrl.enable.value"
        );
    }

    #[test]
    fn test_next_override_drops_next_member() {
        let mut map = RegMap::new("top");
        let reg = map.add_reg(map.top(), "r", 32).unwrap();
        let src = map.add_field(reg, "src", FieldProperties::new(0, 4)).unwrap();
        let props = FieldProperties {
            sw: AccessType::R,
            hw: AccessType::W,
            ..FieldProperties::new(4, 4)
        };
        let dst = map.add_field(reg, "dst", props).unwrap();
        map.set_next(dst, HwRef::Field(src)).unwrap();

        let mut hwif = Hwif::new(&map, "top", "pkg", TypeStyle::Lexical);
        let package = hwif.build_package().unwrap();
        assert!(!package.has_input_struct);
        assert_eq!(
            hwif.input_identifier(map.field(dst).unwrap()),
            "field_storage.r.src.value"
        );
    }

    #[test]
    fn test_keyword_names_are_filtered() {
        let mut map = RegMap::new("top");
        let reg = map.add_reg(map.top(), "output", 32).unwrap();
        let props = FieldProperties {
            hw: AccessType::W,
            ..FieldProperties::new(0, 1)
        };
        let field = map.add_field(reg, "logic", props).unwrap();
        let mut hwif = Hwif::new(&map, "top", "pkg", TypeStyle::Hier);
        let package = hwif.build_package().unwrap();
        assert_eq!(package.report, vec!["hwif_in.output_.logic_.next"]);
        assert_eq!(hwif.indexed_path(field), "output_.logic_");
    }
}
