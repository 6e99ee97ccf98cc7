// Licensed under the Apache-2.0 license

//! Error type shared by every stage of the register block generator.

use thiserror::Error;

/// Errors produced while building, structuring, flattening or exporting a
/// register block.
///
/// Every variant is fatal for the export in progress: nothing is written to
/// disk once one of these is returned.
#[derive(Error, Debug)]
pub enum RegblockError {
    /// A manifest line does not start with `hwif_in.` or `hwif_out.`.
    #[error("line {line_no}: unrecognized hwif prefix in `{line}`")]
    UnrecognizedSignalPrefix { line_no: usize, line: String },

    /// A manifest line has broken path or bracket syntax.
    #[error("line {line_no}: malformed signal `{line}`: {reason}")]
    MalformedSignal {
        line_no: usize,
        line: String,
        reason: String,
    },

    /// An array range inside the path uses a negative bound.
    #[error("line {line_no}: array range in `{line}` must use nonnegative bounds")]
    InvalidArrayRange { line_no: usize, line: String },

    /// Two distinct signals flatten to the same port identifier.
    #[error("flattened port `{port}` is produced by both `{first}` and `{second}`")]
    FlatNameCollision {
        port: String,
        first: String,
        second: String,
    },

    #[error("unknown cpuif `{0}`")]
    UnknownCpuif(String),

    #[error("unknown hwif type style `{0}`")]
    UnknownTypeStyle(String),

    /// A `next` override or other reference names nothing in the register map.
    #[error("field `{field}` references `{target}`, which does not resolve")]
    UnresolvedReference { field: String, target: String },

    #[error("invalid export configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid register map: {0}")]
    InvalidRegMap(String),

    /// The wrapped module's header could not be located in its source.
    #[error("could not find a port list for module `{0}`")]
    MissingModuleHeader(String),

    /// The manifest has signals for a direction the wrapped module has no port for.
    #[error("module has no `{0}` port but the hwif manifest lists signals for it")]
    MissingHwifPort(&'static str),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for register block operations.
pub type Result<T> = std::result::Result<T, RegblockError>;
