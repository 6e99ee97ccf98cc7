// Licensed under the Apache-2.0 license

//! Elaborated register map consumed by the generator.
//!
//! The map is an arena of [`Node`]s referenced by [`NodeIdx`]. Nodes are
//! added but never removed, so indices stay valid for the lifetime of the
//! map. Everything downstream only reads it.
//!
//! ```text
//! RegMap
//! ├── nodes: Vec<Node>
//! │   ├── AddrMap   # top node and nested address maps
//! │   ├── RegFile   # register groups
//! │   ├── Reg       # registers
//! │   ├── Field     # bit fields, carrying FieldProperties
//! │   └── Signal    # user signals, inside or outside the hierarchy
//! └── parameters    # top-level parameters exported to the package
//! ```

mod load;

use std::collections::BTreeSet;

use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::error::{RegblockError, Result};

/// Index into the node arena.
pub type NodeIdx = usize;

/// Software or hardware access mode of a field.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    #[default]
    Rw,
    R,
    W,
    Na,
}

impl AccessType {
    pub fn readable(self) -> bool {
        matches!(self, AccessType::Rw | AccessType::R)
    }

    pub fn writable(self) -> bool {
        matches!(self, AccessType::Rw | AccessType::W)
    }
}

/// Edge sensitivity of an interrupt field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptType {
    Level,
    Posedge,
    Negedge,
    Bothedge,
}

/// Field properties that imply an extra hwif input.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Display, EnumString, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ImpliedInput {
    Hwclr,
    Hwset,
    Swwe,
    Swwel,
    We,
    Wel,
}

/// Field properties that imply an extra hwif output.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Display, EnumString, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ImpliedOutput {
    Anded,
    Ored,
    Xored,
    Swmod,
    Swacc,
}

/// Something that can be read as an input-side value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HwRef {
    Field(NodeIdx),
    Signal(NodeIdx),
    PropertyRef(NodeIdx, ImpliedInput),
}

/// Something that drives an hwif output.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutRef {
    Field(NodeIdx),
    PropertyRef(NodeIdx, ImpliedOutput),
    /// Interrupt summary of a register.
    RegIntr(NodeIdx),
}

/// Synthesis-relevant properties of a field.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldProperties {
    pub sw: AccessType,
    pub hw: AccessType,
    /// Bit position of the field's LSB within its register.
    pub lsb: u32,
    pub width: u32,
    pub reset: Option<u64>,
    pub sticky: bool,
    pub stickybit: bool,
    pub intr: bool,
    pub intr_type: Option<InterruptType>,
    /// Explicit hardware next value; replaces the inferred `next` input.
    pub next: Option<HwRef>,
    pub implied_inputs: BTreeSet<ImpliedInput>,
    pub implied_outputs: BTreeSet<ImpliedOutput>,
}

impl FieldProperties {
    /// A software read-write, hardware read-only field.
    pub fn new(lsb: u32, width: u32) -> Self {
        Self {
            sw: AccessType::Rw,
            hw: AccessType::R,
            lsb,
            width,
            ..Default::default()
        }
    }

    pub fn is_hw_writable(&self) -> bool {
        self.hw.writable()
    }

    pub fn is_hw_readable(&self) -> bool {
        self.hw.readable()
    }

    pub fn is_sw_writable(&self) -> bool {
        self.sw.writable()
    }

    /// Whether the field needs a storage flop. Fields nobody can write are
    /// constants.
    pub fn has_storage(&self) -> bool {
        self.is_sw_writable() || self.is_hw_writable()
    }

    pub fn msb(&self) -> u32 {
        self.lsb.saturating_add(self.width).saturating_sub(1)
    }
}

/// A field node viewed together with its properties.
#[derive(Clone, Copy, Debug)]
pub struct FieldRef<'a> {
    pub idx: NodeIdx,
    pub props: &'a FieldProperties,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    AddrMap,
    RegFile,
    Reg { width: u32 },
    Field(FieldProperties),
    Signal { width: u32 },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    /// Component type name, used for lexical hwif typedef reuse.
    pub type_name: Option<String>,
    /// Array dimensions, outermost first. Empty for scalar instances.
    pub array: Vec<u32>,
    pub parent: Option<NodeIdx>,
    pub children: Vec<NodeIdx>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_addressable(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::AddrMap | NodeKind::RegFile | NodeKind::Reg { .. }
        )
    }
}

/// Value of a top-level parameter.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(u64),
    Str(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: ParamValue,
}

/// The elaborated register map. The top address map is always node 0.
#[derive(Clone, Debug)]
pub struct RegMap {
    nodes: Vec<Node>,
    parameters: Vec<Parameter>,
}

impl RegMap {
    pub fn new(top_name: &str) -> Self {
        Self {
            nodes: vec![Node {
                name: top_name.to_string(),
                type_name: None,
                array: vec![],
                parent: None,
                children: vec![],
                kind: NodeKind::AddrMap,
            }],
            parameters: vec![],
        }
    }

    pub fn top(&self) -> NodeIdx {
        0
    }

    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx]
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn field(&self, idx: NodeIdx) -> Option<FieldRef<'_>> {
        match &self.nodes[idx].kind {
            NodeKind::Field(props) => Some(FieldRef { idx, props }),
            _ => None,
        }
    }

    /// Fields of a register, in declaration order.
    pub fn fields_of(&self, reg: NodeIdx) -> impl Iterator<Item = FieldRef<'_>> + '_ {
        self.nodes[reg]
            .children
            .iter()
            .filter_map(move |&child| self.field(child))
    }

    /// Dotted instance path from the top node, without array indices.
    pub fn path_name(&self, idx: NodeIdx) -> String {
        let mut names = vec![];
        let mut cur = Some(idx);
        while let Some(i) = cur {
            names.push(self.nodes[i].name.as_str());
            cur = self.nodes[i].parent;
        }
        names.reverse();
        names.join(".")
    }

    /// Whether `idx` is the top node or one of its descendants. Signals
    /// declared outside the hierarchy are not.
    pub fn is_within_top(&self, idx: NodeIdx) -> bool {
        let mut cur = Some(idx);
        while let Some(i) = cur {
            if i == self.top() {
                return true;
            }
            cur = self.nodes[i].parent;
        }
        false
    }

    /// Signals declared outside the top hierarchy, in declaration order.
    /// They become plain module inputs.
    pub fn external_signals(&self) -> impl Iterator<Item = (NodeIdx, &Node)> + '_ {
        self.nodes.iter().enumerate().filter(|(idx, n)| {
            *idx != 0 && n.parent.is_none() && matches!(n.kind, NodeKind::Signal { .. })
        })
    }

    /// Finds a node by its dotted path relative to the top node. A single
    /// name that matches no child of the top may name an out-of-hierarchy
    /// signal.
    pub fn lookup(&self, path: &str) -> Option<NodeIdx> {
        let mut cur = self.top();
        for name in path.split('.') {
            cur = *self.nodes[cur]
                .children
                .iter()
                .find(|&&c| self.nodes[c].name == name)?;
        }
        Some(cur)
    }

    fn lookup_or_outside(&self, path: &str) -> Option<NodeIdx> {
        self.lookup(path).or_else(|| {
            self.nodes.iter().position(|n| {
                n.parent.is_none() && matches!(n.kind, NodeKind::Signal { .. }) && n.name == path
            })
        })
    }

    pub fn add_parameter(&mut self, name: &str, value: ParamValue) {
        self.parameters.push(Parameter {
            name: name.to_string(),
            value,
        });
    }

    pub fn add_addrmap(&mut self, parent: NodeIdx, name: &str) -> Result<NodeIdx> {
        self.add_child(parent, name, NodeKind::AddrMap)
    }

    pub fn add_regfile(&mut self, parent: NodeIdx, name: &str) -> Result<NodeIdx> {
        self.add_child(parent, name, NodeKind::RegFile)
    }

    pub fn add_reg(&mut self, parent: NodeIdx, name: &str, width: u32) -> Result<NodeIdx> {
        if width == 0 {
            return Err(RegblockError::InvalidRegMap(format!(
                "register `{name}` has zero width"
            )));
        }
        self.add_child(parent, name, NodeKind::Reg { width })
    }

    pub fn add_field(
        &mut self,
        reg: NodeIdx,
        name: &str,
        props: FieldProperties,
    ) -> Result<NodeIdx> {
        let reg_width = match self.nodes.get(reg).map(|n| &n.kind) {
            Some(NodeKind::Reg { width }) => *width,
            _ => {
                return Err(RegblockError::InvalidRegMap(format!(
                    "field `{name}` must be placed in a register"
                )))
            }
        };
        let fits = props
            .lsb
            .checked_add(props.width)
            .is_some_and(|end| end <= reg_width);
        if props.width == 0 || !fits {
            return Err(RegblockError::InvalidRegMap(format!(
                "field `{name}` [{}+:{}] does not fit in `{}`",
                props.lsb,
                props.width,
                self.path_name(reg)
            )));
        }
        self.add_child(reg, name, NodeKind::Field(props))
    }

    /// Adds a signal. `parent == None` declares it outside the hierarchy.
    pub fn add_signal(
        &mut self,
        parent: Option<NodeIdx>,
        name: &str,
        width: u32,
    ) -> Result<NodeIdx> {
        if width == 0 {
            return Err(RegblockError::InvalidRegMap(format!(
                "signal `{name}` has zero width"
            )));
        }
        match parent {
            Some(parent) => self.add_child(parent, name, NodeKind::Signal { width }),
            None => {
                self.nodes.push(Node {
                    name: name.to_string(),
                    type_name: None,
                    array: vec![],
                    parent: None,
                    children: vec![],
                    kind: NodeKind::Signal { width },
                });
                Ok(self.nodes.len() - 1)
            }
        }
    }

    /// Makes an addressable node an array instance.
    pub fn set_array(&mut self, idx: NodeIdx, dims: &[u32]) -> Result<()> {
        let node = &mut self.nodes[idx];
        if !node.is_addressable() || idx == 0 {
            return Err(RegblockError::InvalidRegMap(format!(
                "`{}` cannot be an array",
                node.name
            )));
        }
        if dims.contains(&0) {
            return Err(RegblockError::InvalidRegMap(format!(
                "`{}` has an empty array dimension",
                node.name
            )));
        }
        node.array = dims.to_vec();
        Ok(())
    }

    pub fn set_type_name(&mut self, idx: NodeIdx, type_name: &str) {
        self.nodes[idx].type_name = Some(type_name.to_string());
    }

    /// Points a field's hardware next value at another value.
    pub fn set_next(&mut self, field: NodeIdx, next: HwRef) -> Result<()> {
        if let NodeKind::Field(props) = &mut self.nodes[field].kind {
            props.next = Some(next);
            return Ok(());
        }
        Err(RegblockError::InvalidRegMap(format!(
            "`{}` is not a field",
            self.nodes[field].name
        )))
    }

    /// Resolves a textual reference: `path`, or `path->prop` for an implied
    /// input of a field.
    pub fn resolve_reference(&self, referrer: NodeIdx, target: &str) -> Result<HwRef> {
        let unresolved = || RegblockError::UnresolvedReference {
            field: self.path_name(referrer),
            target: target.to_string(),
        };
        let (path, prop) = match target.split_once("->") {
            Some((path, prop)) => (path, Some(prop)),
            None => (target, None),
        };
        let idx = self.lookup_or_outside(path).ok_or_else(unresolved)?;
        match (&self.nodes[idx].kind, prop) {
            (NodeKind::Field(_), None) => Ok(HwRef::Field(idx)),
            (NodeKind::Field(props), Some(prop)) => match prop.parse::<ImpliedInput>() {
                // The referenced wire only exists if the field declares it.
                Ok(p) if props.implied_inputs.contains(&p) => Ok(HwRef::PropertyRef(idx, p)),
                _ => Err(unresolved()),
            },
            (NodeKind::Signal { .. }, None) => Ok(HwRef::Signal(idx)),
            _ => Err(unresolved()),
        }
    }

    fn add_child(&mut self, parent: NodeIdx, name: &str, kind: NodeKind) -> Result<NodeIdx> {
        let parent_node = self.nodes.get(parent).ok_or_else(|| {
            RegblockError::InvalidRegMap(format!("no parent node {parent} for `{name}`"))
        })?;
        let allowed = match (&parent_node.kind, &kind) {
            (_, NodeKind::Signal { .. }) => parent_node.is_addressable(),
            (NodeKind::AddrMap, NodeKind::Field(_)) => false,
            (NodeKind::AddrMap, _) => true,
            (NodeKind::RegFile, NodeKind::RegFile | NodeKind::Reg { .. }) => true,
            (NodeKind::Reg { .. }, NodeKind::Field(_)) => true,
            _ => false,
        };
        if !allowed {
            return Err(RegblockError::InvalidRegMap(format!(
                "`{name}` cannot be placed in `{}`",
                self.path_name(parent)
            )));
        }
        if parent_node
            .children
            .iter()
            .any(|&c| self.nodes[c].name == name)
        {
            return Err(RegblockError::InvalidRegMap(format!(
                "duplicate instance `{name}` in `{}`",
                self.path_name(parent)
            )));
        }
        self.nodes.push(Node {
            name: name.to_string(),
            type_name: None,
            array: vec![],
            parent: Some(parent),
            children: vec![],
            kind,
        });
        let idx = self.nodes.len() - 1;
        self.nodes[parent].children.push(idx);
        Ok(idx)
    }
}
