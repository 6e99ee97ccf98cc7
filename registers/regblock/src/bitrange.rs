// Licensed under the Apache-2.0 license

//! Parser for hwif manifest lines.
//!
//! Each non-blank line of a manifest names one signal:
//!
//! ```text
//! hwif_in.regs[0:3].status.next[7:0]
//! hwif_out.ctrl.enable.value
//! hwif_out.gain.value[3:-4]
//! ```
//!
//! The trailing bracket group, when present, is the packed bit range. Every
//! other `[first:last]` group is an unpacked array dimension.

use log::debug;
use winnow::ascii::dec_int;
use winnow::combinator::{delimited, opt, preceded, repeat, separated};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::error::{RegblockError, Result};
use crate::signal::{Direction, PathSegment, SignalPath, Subscript};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RawSubscript {
    Single(i64),
    Pair(i64, i64),
}

struct RawSegment {
    name: String,
    subscripts: Vec<RawSubscript>,
}

fn identifier<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$').parse_next(input)
}

fn integer(input: &mut &str) -> ModalResult<i64> {
    dec_int.parse_next(input)
}

fn subscript(input: &mut &str) -> ModalResult<RawSubscript> {
    delimited('[', (integer, opt(preceded(':', integer))), ']')
        .map(|(first, last)| match last {
            Some(last) => RawSubscript::Pair(first, last),
            None => RawSubscript::Single(first),
        })
        .parse_next(input)
}

fn segment(input: &mut &str) -> ModalResult<RawSegment> {
    let name = identifier.parse_next(input)?;
    let subscripts: Vec<RawSubscript> = repeat(0.., subscript).parse_next(input)?;
    Ok(RawSegment {
        name: name.to_string(),
        subscripts,
    })
}

fn signal_path(input: &mut &str) -> ModalResult<Vec<RawSegment>> {
    separated(1.., segment, '.').parse_next(input)
}

/// Parses one manifest line into a [`SignalPath`].
///
/// `line_no` is only used for error context.
pub fn parse_signal_line(line_no: usize, line: &str) -> Result<SignalPath> {
    let line = line.trim();
    let mut segments = signal_path
        .parse(line)
        .map_err(|e| RegblockError::MalformedSignal {
            line_no,
            line: line.to_string(),
            reason: format!("unexpected input at column {}", e.offset() + 1),
        })?;

    let prefix = segments.remove(0);
    let direction = if prefix.subscripts.is_empty() && !segments.is_empty() {
        Direction::from_prefix(&prefix.name)
    } else {
        None
    };
    let direction = direction.ok_or_else(|| RegblockError::UnrecognizedSignalPrefix {
        line_no,
        line: line.to_string(),
    })?;

    // The packed range is stripped first, so it never becomes an array dim.
    let packed = segments.last_mut().and_then(|s| s.subscripts.pop());
    let width = match packed {
        Some(RawSubscript::Pair(msb, lsb)) => msb
            .abs_diff(lsb)
            .checked_add(1)
            .and_then(|w| u32::try_from(w).ok())
            .ok_or_else(|| RegblockError::MalformedSignal {
                line_no,
                line: line.to_string(),
                reason: "bit range too wide".to_string(),
            })?,
        Some(RawSubscript::Single(_)) | None => 1,
    };

    let mut path_segments = Vec::with_capacity(segments.len());
    for raw in segments {
        let mut subscripts = Vec::with_capacity(raw.subscripts.len());
        for sub in raw.subscripts {
            subscripts.push(match sub {
                RawSubscript::Single(n) => Subscript::Index(n),
                RawSubscript::Pair(first, last) => {
                    match (u32::try_from(first), u32::try_from(last)) {
                        (Ok(first), Ok(last)) if first.abs_diff(last) == u32::MAX => {
                            return Err(RegblockError::MalformedSignal {
                                line_no,
                                line: line.to_string(),
                                reason: "array range too large".to_string(),
                            })
                        }
                        (Ok(first), Ok(last)) => Subscript::Range(first, last),
                        _ => {
                            return Err(RegblockError::InvalidArrayRange {
                                line_no,
                                line: line.to_string(),
                            })
                        }
                    }
                }
            });
        }
        path_segments.push(PathSegment {
            name: raw.name,
            subscripts,
        });
    }

    // Ports are always declared zero-based, whatever the original range.
    Ok(SignalPath::new(direction, path_segments, width, 0))
}

/// All signals of a manifest, split by direction in file order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Manifest {
    pub inputs: Vec<SignalPath>,
    pub outputs: Vec<SignalPath>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }
}

/// Parses a whole manifest. Blank lines are skipped; the first malformed
/// line aborts the parse.
pub fn parse_manifest(text: &str) -> Result<Manifest> {
    let mut manifest = Manifest::default();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let signal = parse_signal_line(idx + 1, line)?;
        debug!(
            "hwif signal {} (width {}, dims {:?})",
            signal,
            signal.width(),
            signal.array_dims()
        );
        match signal.direction() {
            Direction::Input => manifest.inputs.push(signal),
            Direction::Output => manifest.outputs.push(signal),
        }
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_bit() {
        let sig = parse_signal_line(1, "hwif_in.ctrl.enable").unwrap();
        assert_eq!(sig.direction(), Direction::Input);
        assert_eq!(sig.width(), 1);
        assert_eq!(sig.base_offset(), 0);
        assert!(sig.array_dims().is_empty());
        assert_eq!(sig.struct_path(), "hwif_in.ctrl.enable");
    }

    #[test]
    fn test_packed_range() {
        let sig = parse_signal_line(1, "hwif_out.ctrl.mode.value[7:4]").unwrap();
        assert_eq!(sig.width(), 4);
        assert_eq!(sig.base_offset(), 0);
        assert_eq!(sig.struct_path(), "hwif_out.ctrl.mode.value");
    }

    #[test]
    fn test_q_format_range_normalizes_offset() {
        let sig = parse_signal_line(1, "hwif_out.field[3:-4]").unwrap();
        assert_eq!(sig.width(), 8);
        assert_eq!(sig.base_offset(), 0);
        assert!(sig.array_dims().is_empty());
    }

    #[test]
    fn test_single_bit_select() {
        let sig = parse_signal_line(1, "hwif_out.gain.value[-3]").unwrap();
        assert_eq!(sig.width(), 1);
        assert_eq!(sig.base_offset(), 0);
        let sig = parse_signal_line(1, "hwif_in.x.next[5]").unwrap();
        assert_eq!(sig.width(), 1);
        assert_eq!(sig.base_offset(), 0);
    }

    #[test]
    fn test_array_dims_outer_to_inner() {
        let sig = parse_signal_line(1, "hwif_in.a[0:63].b[0:7].next[15:0]").unwrap();
        assert_eq!(sig.array_dims(), &[(0, 63), (0, 7)]);
        assert_eq!(sig.width(), 16);
    }

    #[test]
    fn test_trailing_group_is_packed_not_array() {
        let sig = parse_signal_line(1, "hwif_in.data[0:3][15:0]").unwrap();
        assert_eq!(sig.array_dims(), &[(0, 3)]);
        assert_eq!(sig.width(), 16);

        let sig = parse_signal_line(1, "hwif_in.data[0:3]").unwrap();
        assert!(sig.array_dims().is_empty());
        assert_eq!(sig.width(), 4);
    }

    #[test]
    fn test_unknown_prefix() {
        let err = parse_signal_line(7, "hwif_mid.ctrl.enable").unwrap_err();
        assert!(
            matches!(err, RegblockError::UnrecognizedSignalPrefix { line_no: 7, .. }),
            "{err}"
        );
        assert!(matches!(
            parse_signal_line(1, "hwif_in").unwrap_err(),
            RegblockError::UnrecognizedSignalPrefix { .. }
        ));
        assert!(matches!(
            parse_signal_line(1, "hwif_in[0:1].x").unwrap_err(),
            RegblockError::UnrecognizedSignalPrefix { .. }
        ));
    }

    #[test]
    fn test_malformed_brackets() {
        for line in ["hwif_in.a[0:3.b", "hwif_in.a[x]", "hwif_in..a", "hwif_in.a[1:2:3]"] {
            assert!(
                matches!(
                    parse_signal_line(1, line).unwrap_err(),
                    RegblockError::MalformedSignal { .. }
                ),
                "{line} should be malformed"
            );
        }
    }

    #[test]
    fn test_negative_array_range_rejected() {
        assert!(matches!(
            parse_signal_line(1, "hwif_in.a[-1:3].next[7:0]").unwrap_err(),
            RegblockError::InvalidArrayRange { .. }
        ));
    }

    #[test]
    fn test_oversized_array_range_rejected() {
        assert!(matches!(
            parse_signal_line(3, "hwif_in.a[0:4294967295].next[7:0]").unwrap_err(),
            RegblockError::MalformedSignal { line_no: 3, .. }
        ));
        assert!(matches!(
            parse_signal_line(3, "hwif_in.a[4294967295:0].next").unwrap_err(),
            RegblockError::MalformedSignal { .. }
        ));
        let sig = parse_signal_line(3, "hwif_in.a[0:4294967294].next").unwrap();
        assert_eq!(sig.array_dims(), &[(0, 4294967294)]);
    }

    #[test]
    fn test_round_trip_without_arrays() {
        for line in [
            "hwif_in.ctrl.enable",
            "hwif_out.status.code.value[11:0]",
            "hwif_in.sig[2].x.next[3:0]",
        ] {
            let sig = parse_signal_line(1, line).unwrap();
            let again = parse_signal_line(1, &sig.to_string()).unwrap();
            assert_eq!(sig, again);
            assert_eq!(again.width(), sig.width());
            assert_eq!(again.base_offset(), sig.base_offset());
            assert_eq!(again.direction(), sig.direction());
        }
    }

    #[test]
    fn test_manifest_skips_blank_lines_and_splits_directions() {
        let manifest = parse_manifest(
            "hwif_in.ctrl.enable\n\n   \nhwif_out.ctrl.enable.value\nhwif_in.data[0:3][15:0]\n",
        )
        .unwrap();
        assert_eq!(manifest.inputs.len(), 2);
        assert_eq!(manifest.outputs.len(), 1);
        assert!(parse_manifest("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_manifest_aborts_on_bad_line() {
        let err = parse_manifest("hwif_in.a\nbogus.b\nhwif_in.c\n").unwrap_err();
        assert!(matches!(
            err,
            RegblockError::UnrecognizedSignalPrefix { line_no: 2, .. }
        ));
    }
}
