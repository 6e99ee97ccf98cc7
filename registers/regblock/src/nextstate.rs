// Licensed under the Apache-2.0 license

//! Hardware next-state rules for fields.
//!
//! Every hardware-writable field latches a value chosen by exactly one
//! [`NextStateFamily`]. Rules are tried in [`NextStateRule::PRIORITY`] order
//! and the first match wins; a field no rule matches is plain storage.
//!
//! The rules only produce SystemVerilog text. The identifiers they refer to
//! (`I` the hardware input, `Iq` its previous sample, `R` the stored value)
//! are supplied by a [`FieldIdentifiers`] implementation.

use log::{debug, warn};

use crate::regmap::{FieldProperties, FieldRef, ImpliedInput, InterruptType};

/// Names used by the generated logic for one field.
pub trait FieldIdentifiers {
    /// Hardware input value, or the value the field's `next` override points to.
    fn input_identifier(&self, field: FieldRef<'_>) -> String;
    /// Previous-cycle sample of the hardware input.
    fn next_q_identifier(&self, field: FieldRef<'_>) -> String;
    /// Current stored value.
    fn storage_identifier(&self, field: FieldRef<'_>) -> String;
    /// Input wire implied by a field property such as `we`.
    fn implied_input_identifier(&self, field: FieldRef<'_>, prop: ImpliedInput) -> String;
}

/// A predicate with the statements to run when it holds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Conditional {
    pub comment: &'static str,
    pub predicate: String,
    pub assignments: Vec<String>,
}

const LOAD: &str = "load_next_c = '1;";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NextStateRule {
    Sticky,
    Stickybit,
    PosedgeStickybit,
    NegedgeStickybit,
    BothedgeStickybit,
}

impl NextStateRule {
    pub const PRIORITY: [NextStateRule; 5] = [
        NextStateRule::Sticky,
        NextStateRule::Stickybit,
        NextStateRule::PosedgeStickybit,
        NextStateRule::NegedgeStickybit,
        NextStateRule::BothedgeStickybit,
    ];

    pub fn comment(self) -> &'static str {
        match self {
            NextStateRule::Sticky => "multi-bit sticky",
            NextStateRule::Stickybit => "stickybit",
            NextStateRule::PosedgeStickybit => "posedge stickybit",
            NextStateRule::NegedgeStickybit => "negedge stickybit",
            NextStateRule::BothedgeStickybit => "bothedge stickybit",
        }
    }

    pub fn is_match(self, props: &FieldProperties) -> bool {
        if !props.is_hw_writable() {
            return false;
        }
        match self {
            NextStateRule::Sticky => props.sticky,
            NextStateRule::Stickybit => {
                props.stickybit
                    && matches!(props.intr_type, None | Some(InterruptType::Level))
            }
            NextStateRule::PosedgeStickybit => {
                props.stickybit && props.intr_type == Some(InterruptType::Posedge)
            }
            NextStateRule::NegedgeStickybit => {
                props.stickybit && props.intr_type == Some(InterruptType::Negedge)
            }
            NextStateRule::BothedgeStickybit => {
                props.stickybit && props.intr_type == Some(InterruptType::Bothedge)
            }
        }
    }

    /// Edge detection needs the input registered one cycle back.
    pub fn needs_previous_sample(self) -> bool {
        matches!(
            self,
            NextStateRule::PosedgeStickybit
                | NextStateRule::NegedgeStickybit
                | NextStateRule::BothedgeStickybit
        )
    }

    pub fn predicate(self, field: FieldRef<'_>, ids: &dyn FieldIdentifiers) -> String {
        let i = ids.input_identifier(field);
        match self {
            NextStateRule::Sticky => {
                let r = ids.storage_identifier(field);
                format!("({r} == '0) && ({i} != '0)")
            }
            NextStateRule::Stickybit if field.props.width == 1 => i,
            NextStateRule::Stickybit => format!("{i} != '0"),
            NextStateRule::PosedgeStickybit => {
                format!("(~{} & {i}) != '0", ids.next_q_identifier(field))
            }
            NextStateRule::NegedgeStickybit => {
                format!("({} & ~{i}) != '0", ids.next_q_identifier(field))
            }
            NextStateRule::BothedgeStickybit => {
                format!("{} != {i}", ids.next_q_identifier(field))
            }
        }
    }

    pub fn assignments(self, field: FieldRef<'_>, ids: &dyn FieldIdentifiers) -> Vec<String> {
        let i = ids.input_identifier(field);
        if self == NextStateRule::Sticky {
            return vec![format!("next_c = {i};"), LOAD.to_string()];
        }
        // Single-bit stickybits of every flavor simply set.
        if field.props.width == 1 {
            return vec!["next_c = '1;".to_string(), LOAD.to_string()];
        }
        let r = ids.storage_identifier(field);
        let next = match self {
            NextStateRule::Sticky | NextStateRule::Stickybit => format!("next_c = {r} | {i};"),
            NextStateRule::PosedgeStickybit => {
                let iq = ids.next_q_identifier(field);
                format!("next_c = {r} | (~{iq} & {i});")
            }
            NextStateRule::NegedgeStickybit => {
                let iq = ids.next_q_identifier(field);
                format!("next_c = {r} | ({iq} & ~{i});")
            }
            NextStateRule::BothedgeStickybit => {
                let iq = ids.next_q_identifier(field);
                format!("next_c = {r} | ({iq} ^ {i});")
            }
        };
        vec![next, LOAD.to_string()]
    }
}

/// How a hardware-writable field picks its next value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NextStateFamily {
    Rule(NextStateRule),
    /// Hardware writes the input value, optionally gated by `we`/`wel`.
    Plain,
}

impl NextStateFamily {
    /// Selects the family for a field, or `None` when hardware cannot write it.
    pub fn select(props: &FieldProperties) -> Option<NextStateFamily> {
        if !props.is_hw_writable() {
            return None;
        }
        let mut matches = NextStateRule::PRIORITY
            .into_iter()
            .filter(|rule| rule.is_match(props));
        let Some(first) = matches.next() else {
            return Some(NextStateFamily::Plain);
        };
        let rest: Vec<NextStateRule> = matches.collect();
        if !rest.is_empty() {
            warn!(
                "overlapping next-state rules {:?} and {:?}; using {}",
                first,
                rest,
                first.comment()
            );
        }
        Some(NextStateFamily::Rule(first))
    }

    pub fn needs_previous_sample(self) -> bool {
        match self {
            NextStateFamily::Rule(rule) => rule.needs_previous_sample(),
            NextStateFamily::Plain => false,
        }
    }

    pub fn conditional(self, field: FieldRef<'_>, ids: &dyn FieldIdentifiers) -> Conditional {
        let cond = match self {
            NextStateFamily::Rule(rule) => Conditional {
                comment: rule.comment(),
                predicate: rule.predicate(field, ids),
                assignments: rule.assignments(field, ids),
            },
            NextStateFamily::Plain => {
                let implied = &field.props.implied_inputs;
                let (comment, predicate) = if implied.contains(&ImpliedInput::We) {
                    (
                        "HW Write - we",
                        ids.implied_input_identifier(field, ImpliedInput::We),
                    )
                } else if implied.contains(&ImpliedInput::Wel) {
                    (
                        "HW Write - wel",
                        format!("!{}", ids.implied_input_identifier(field, ImpliedInput::Wel)),
                    )
                } else {
                    ("HW Write", "1".to_string())
                };
                Conditional {
                    comment,
                    predicate,
                    assignments: vec![
                        format!("next_c = {};", ids.input_identifier(field)),
                        LOAD.to_string(),
                    ],
                }
            }
        };
        debug!("next-state {:?}: if({})", self, cond.predicate);
        cond
    }
}
