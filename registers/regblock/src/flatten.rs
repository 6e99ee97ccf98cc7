// Licensed under the Apache-2.0 license

//! Flat identifiers for hwif signals.
//!
//! `hwif_in.regs[0:3].status.next` becomes the port `hwif_in_regs_status`:
//! the direction prefix is dropped, array ranges disappear from the name
//! (they become unpacked port dimensions), literal selects become `_n`, and
//! the `next`/`value` member names are stripped.

use std::collections::HashMap;

use crate::error::{RegblockError, Result};
use crate::signal::{SignalPath, Subscript};

/// Derives the flattened identifier of a path, without the direction prefix.
pub fn flatten(path: &SignalPath) -> String {
    let mut name = String::new();
    for (i, segment) in path.segments().iter().enumerate() {
        if i > 0 {
            name.push('_');
        }
        name.push_str(&segment.name);
        for sub in &segment.subscripts {
            if let Subscript::Index(n) = sub {
                name.push('_');
                name.push_str(&n.unsigned_abs().to_string());
            }
        }
    }
    name
}

/// Derives the port name from a flattened identifier.
///
/// The `_next`/`_value` suffix is only removed when the path itself ends in
/// that member; a field that happens to be called `next_value` keeps its
/// name. A doubled final component (`cnt_cnt`) is collapsed once.
pub fn port_name(path: &SignalPath, flat: &str) -> String {
    let name = path
        .suffix_role()
        .and_then(|role| flat.strip_suffix(role.flat_suffix()))
        .unwrap_or(flat);
    collapse_repeated_tail(name)
}

fn collapse_repeated_tail(name: &str) -> String {
    let parts: Vec<&str> = name.split('_').collect();
    match parts.as_slice() {
        [head @ .., a, b] if a == b => {
            let mut kept = head.to_vec();
            kept.push(*a);
            kept.join("_")
        }
        _ => name.to_string(),
    }
}

/// A signal together with its derived identifiers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlatSignal {
    pub path: SignalPath,
    pub flat_name: String,
    pub port_name: String,
}

impl FlatSignal {
    pub fn new(path: SignalPath) -> Self {
        let flat_name = flatten(&path);
        let port_name = port_name(&path, &flat_name);
        Self {
            path,
            flat_name,
            port_name,
        }
    }

    /// Full port identifier including the direction prefix.
    pub fn port_identifier(&self) -> String {
        format!("{}_{}", self.path.direction().prefix(), self.port_name)
    }
}

/// Flattens a list of paths and checks that no two of them share a port.
pub fn flatten_all(paths: &[SignalPath]) -> Result<Vec<FlatSignal>> {
    let signals: Vec<FlatSignal> = paths.iter().cloned().map(FlatSignal::new).collect();
    check_unique_ports(&signals)?;
    Ok(signals)
}

/// Fails if two signals would be emitted under the same port identifier.
pub fn check_unique_ports(signals: &[FlatSignal]) -> Result<()> {
    let mut seen: HashMap<String, &SignalPath> = HashMap::new();
    for signal in signals {
        let port = signal.port_identifier();
        if let Some(first) = seen.get(&port) {
            return Err(RegblockError::FlatNameCollision {
                port,
                first: first.to_string(),
                second: signal.path.to_string(),
            });
        }
        seen.insert(port, &signal.path);
    }
    Ok(())
}
