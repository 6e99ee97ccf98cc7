// Licensed under the Apache-2.0 license

//! TOML interchange format for elaborated register maps.
//!
//! ```toml
//! name = "top"
//!
//! [[parameters]]
//! name = "N_CH"
//! value = 4
//!
//! [[children]]
//! kind = "reg"
//! name = "status"
//! array = [4]
//!
//! [[children.fields]]
//! name = "err"
//! lsb = 0
//! sw = "r"
//! hw = "w"
//! stickybit = true
//! intr = true
//! intr_type = "posedge"
//! ```

use serde::Deserialize;

use super::{
    AccessType, FieldProperties, ImpliedInput, ImpliedOutput, InterruptType, NodeIdx, ParamValue,
    RegMap,
};
use crate::error::Result;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RegMapDesc {
    name: String,
    type_name: Option<String>,
    #[serde(default)]
    parameters: Vec<ParamDesc>,
    /// Signals declared outside the top hierarchy.
    #[serde(default)]
    signals: Vec<SignalDesc>,
    #[serde(default)]
    children: Vec<NodeDesc>,
}

#[derive(Deserialize)]
struct ParamDesc {
    name: String,
    value: ParamValue,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum NodeDesc {
    Addrmap(BlockDesc),
    Regfile(BlockDesc),
    Reg(RegDesc),
    Signal(SignalDesc),
}

#[derive(Deserialize)]
struct BlockDesc {
    name: String,
    type_name: Option<String>,
    #[serde(default)]
    array: Vec<u32>,
    #[serde(default)]
    children: Vec<NodeDesc>,
}

fn default_reg_width() -> u32 {
    32
}

#[derive(Deserialize)]
struct RegDesc {
    name: String,
    type_name: Option<String>,
    #[serde(default)]
    array: Vec<u32>,
    #[serde(default = "default_reg_width")]
    width: u32,
    #[serde(default)]
    fields: Vec<FieldDesc>,
}

fn default_width() -> u32 {
    1
}

fn default_sw() -> AccessType {
    AccessType::Rw
}

fn default_hw() -> AccessType {
    AccessType::R
}

#[derive(Deserialize)]
struct SignalDesc {
    name: String,
    #[serde(default = "default_width")]
    width: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDesc {
    name: String,
    lsb: u32,
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_sw")]
    sw: AccessType,
    #[serde(default = "default_hw")]
    hw: AccessType,
    reset: Option<u64>,
    #[serde(default)]
    sticky: bool,
    #[serde(default)]
    stickybit: bool,
    #[serde(default)]
    intr: bool,
    intr_type: Option<InterruptType>,
    /// Reference to the value that replaces the inferred `next` input.
    next: Option<String>,
    #[serde(default)]
    implied_inputs: Vec<ImpliedInput>,
    #[serde(default)]
    implied_outputs: Vec<ImpliedOutput>,
}

impl RegMap {
    /// Builds a register map from its TOML description.
    pub fn from_toml_str(text: &str) -> Result<RegMap> {
        let desc: RegMapDesc = toml::from_str(text)?;
        let mut map = RegMap::new(&desc.name);
        if let Some(type_name) = &desc.type_name {
            map.set_type_name(map.top(), type_name);
        }
        for param in desc.parameters {
            map.add_parameter(&param.name, param.value);
        }
        for signal in &desc.signals {
            map.add_signal(None, &signal.name, signal.width)?;
        }

        // `next` references may point forward, so they are resolved once the
        // whole tree exists.
        let mut pending = vec![];
        let top = map.top();
        for child in &desc.children {
            add_node(&mut map, top, child, &mut pending)?;
        }
        for (field, target) in pending {
            let next = map.resolve_reference(field, &target)?;
            map.set_next(field, next)?;
        }
        Ok(map)
    }
}

fn add_block(
    map: &mut RegMap,
    idx: NodeIdx,
    block: &BlockDesc,
    pending: &mut Vec<(NodeIdx, String)>,
) -> Result<()> {
    if let Some(type_name) = &block.type_name {
        map.set_type_name(idx, type_name);
    }
    if !block.array.is_empty() {
        map.set_array(idx, &block.array)?;
    }
    for child in &block.children {
        add_node(map, idx, child, pending)?;
    }
    Ok(())
}

fn add_node(
    map: &mut RegMap,
    parent: NodeIdx,
    desc: &NodeDesc,
    pending: &mut Vec<(NodeIdx, String)>,
) -> Result<()> {
    match desc {
        NodeDesc::Addrmap(block) => {
            let idx = map.add_addrmap(parent, &block.name)?;
            add_block(map, idx, block, pending)
        }
        NodeDesc::Regfile(block) => {
            let idx = map.add_regfile(parent, &block.name)?;
            add_block(map, idx, block, pending)
        }
        NodeDesc::Signal(signal) => {
            map.add_signal(Some(parent), &signal.name, signal.width)?;
            Ok(())
        }
        NodeDesc::Reg(reg) => {
            let idx = map.add_reg(parent, &reg.name, reg.width)?;
            if let Some(type_name) = &reg.type_name {
                map.set_type_name(idx, type_name);
            }
            if !reg.array.is_empty() {
                map.set_array(idx, &reg.array)?;
            }
            for field in &reg.fields {
                let props = FieldProperties {
                    sw: field.sw,
                    hw: field.hw,
                    lsb: field.lsb,
                    width: field.width,
                    reset: field.reset,
                    sticky: field.sticky,
                    stickybit: field.stickybit,
                    intr: field.intr,
                    intr_type: field.intr_type,
                    next: None,
                    implied_inputs: field.implied_inputs.iter().copied().collect(),
                    implied_outputs: field.implied_outputs.iter().copied().collect(),
                };
                let field_idx = map.add_field(idx, &field.name, props)?;
                if let Some(target) = &field.next {
                    pending.push((field_idx, target.clone()));
                }
            }
            Ok(())
        }
    }
}
