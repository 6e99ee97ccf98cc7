// Licensed under the Apache-2.0 license

//! Hierarchical signal path model.
//!
//! A [`SignalPath`] is one wire or wire-array crossing the register block
//! boundary, e.g. `hwif_in.regs[0:3].status.next[7:0]`. It is built once by
//! the manifest parser (or directly by the structuring engine) and never
//! mutated afterwards.

use std::fmt;

/// Which side of the hwif boundary a signal lives on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// The struct port name that prefixes every path in this direction.
    pub fn prefix(self) -> &'static str {
        match self {
            Direction::Input => "hwif_in",
            Direction::Output => "hwif_out",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "hwif_in" => Some(Direction::Input),
            "hwif_out" => Some(Direction::Output),
            _ => None,
        }
    }

    /// Port direction keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// A bracketed annotation following a path segment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Subscript {
    /// `[first:last]`, an unpacked array dimension.
    Range(u32, u32),
    /// `[n]`, a literal element select.
    Index(i64),
}

impl fmt::Display for Subscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscript::Range(first, last) => write!(f, "[{first}:{last}]"),
            Subscript::Index(n) => write!(f, "[{n}]"),
        }
    }
}

/// One hierarchy level of a signal path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathSegment {
    pub name: String,
    pub subscripts: Vec<Subscript>,
}

impl PathSegment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscripts: vec![],
        }
    }

    pub fn with_range(mut self, first: u32, last: u32) -> Self {
        self.subscripts.push(Subscript::Range(first, last));
        self
    }

    pub fn with_index(mut self, index: i64) -> Self {
        self.subscripts.push(Subscript::Index(index));
        self
    }
}

/// Structural role of the final path segment.
///
/// Field ports in the hwif structs are named `next` (inputs) and `value`
/// (outputs); the flattener drops those names from port identifiers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SuffixRole {
    Next,
    Value,
}

impl SuffixRole {
    pub fn member(self) -> &'static str {
        match self {
            SuffixRole::Next => "next",
            SuffixRole::Value => "value",
        }
    }

    /// The suffix the member leaves on a flattened identifier.
    pub fn flat_suffix(self) -> &'static str {
        match self {
            SuffixRole::Next => "_next",
            SuffixRole::Value => "_value",
        }
    }
}

/// A single hwif signal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignalPath {
    direction: Direction,
    segments: Vec<PathSegment>,
    width: u32,
    base_offset: u32,
    array_dims: Vec<(u32, u32)>,
}

impl SignalPath {
    /// Builds a path from its segments. `segments` excludes the direction
    /// prefix; array dimensions are taken from the `Range` subscripts in
    /// outer-to-inner order.
    pub fn new(
        direction: Direction,
        segments: Vec<PathSegment>,
        width: u32,
        base_offset: u32,
    ) -> Self {
        debug_assert!(width > 0, "signal width must be positive");
        let array_dims = segments
            .iter()
            .flat_map(|s| s.subscripts.iter())
            .filter_map(|s| match s {
                Subscript::Range(first, last) => Some((*first, *last)),
                Subscript::Index(_) => None,
            })
            .collect();
        Self {
            direction,
            segments,
            width,
            base_offset,
            array_dims,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn base_offset(&self) -> u32 {
        self.base_offset
    }

    /// Unpacked dimensions, outermost first.
    pub fn array_dims(&self) -> &[(u32, u32)] {
        &self.array_dims
    }

    /// Role of the last segment, if it is a bare `next` or `value` member.
    ///
    /// A segment only counts when it carries no subscripts, so `x.next[0:3]`
    /// does not end in the `next` role.
    pub fn suffix_role(&self) -> Option<SuffixRole> {
        let last = self.segments.last()?;
        if !last.subscripts.is_empty() {
            return None;
        }
        [SuffixRole::Next, SuffixRole::Value]
            .into_iter()
            .find(|role| last.name == role.member())
    }

    /// The structured reference without the packed range, e.g.
    /// `hwif_in.regs[0:3].status.next`.
    pub fn struct_path(&self) -> String {
        self.render_struct_path(|sub, _| sub.to_string())
    }

    /// The structured reference with every array range replaced, in order,
    /// by the matching loop index: `hwif_in.regs[i].status.next`.
    pub fn indexed_struct_path(&self, index_vars: &[String]) -> String {
        self.render_struct_path(|sub, dim| match (sub, index_vars.get(dim)) {
            (Subscript::Range(..), Some(var)) => format!("[{var}]"),
            _ => sub.to_string(),
        })
    }

    fn render_struct_path(&self, mut subscript: impl FnMut(&Subscript, usize) -> String) -> String {
        let mut out = String::from(self.direction.prefix());
        let mut dim = 0;
        for segment in &self.segments {
            out.push('.');
            out.push_str(&segment.name);
            for sub in &segment.subscripts {
                out.push_str(&subscript(sub, dim));
                if matches!(sub, Subscript::Range(..)) {
                    dim += 1;
                }
            }
        }
        out
    }
}

impl fmt::Display for SignalPath {
    /// Renders the manifest form, including the packed range when the
    /// signal is not a plain single bit at offset zero.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.struct_path())?;
        if self.width != 1 || self.base_offset != 0 {
            write!(
                f,
                "[{}:{}]",
                self.base_offset + self.width - 1,
                self.base_offset
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs_status() -> SignalPath {
        SignalPath::new(
            Direction::Input,
            vec![
                PathSegment::new("regs").with_range(0, 3),
                PathSegment::new("status"),
                PathSegment::new("next"),
            ],
            8,
            0,
        )
    }

    #[test]
    fn test_array_dims_follow_range_subscripts() {
        let path = SignalPath::new(
            Direction::Output,
            vec![
                PathSegment::new("a").with_range(0, 63),
                PathSegment::new("b").with_index(2).with_range(0, 7),
                PathSegment::new("value"),
            ],
            1,
            0,
        );
        assert_eq!(path.array_dims(), &[(0, 63), (0, 7)]);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            regs_status().to_string(),
            "hwif_in.regs[0:3].status.next[7:0]"
        );
        let bit = SignalPath::new(Direction::Output, vec![PathSegment::new("irq")], 1, 0);
        assert_eq!(bit.to_string(), "hwif_out.irq");
        let offset = SignalPath::new(Direction::Output, vec![PathSegment::new("f")], 4, 8);
        assert_eq!(offset.to_string(), "hwif_out.f[11:8]");
    }

    #[test]
    fn test_indexed_struct_path() {
        let vars = vec!["i".to_string()];
        assert_eq!(
            regs_status().indexed_struct_path(&vars),
            "hwif_in.regs[i].status.next"
        );
    }

    #[test]
    fn test_suffix_role() {
        assert_eq!(regs_status().suffix_role(), Some(SuffixRole::Next));
        let subscripted = SignalPath::new(
            Direction::Input,
            vec![PathSegment::new("x"), PathSegment::new("next").with_range(0, 3)],
            1,
            0,
        );
        assert_eq!(subscripted.suffix_role(), None);
        let named = SignalPath::new(
            Direction::Output,
            vec![PathSegment::new("next_value")],
            1,
            0,
        );
        assert_eq!(named.suffix_role(), None);
    }
}
