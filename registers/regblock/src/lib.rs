// Licensed under the Apache-2.0 license

//! SystemVerilog register block generator.
//!
//! Turns an elaborated register map into a register block module, a package
//! of hwif struct typedefs and, optionally, an hwif report and a wrapper
//! whose hwif ports are flat vectors instead of structs.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use registers_regblock::{export_to_dir, CpuifKind, ExportConfig, RegMap};
//!
//! let text = std::fs::read_to_string("uart.toml").unwrap();
//! let map = RegMap::from_toml_str(&text).unwrap();
//! let config = ExportConfig::with_defaults()
//!     .cpuif(CpuifKind::Axi4Lite)
//!     .hwif_report(true)
//!     .flatten_hwif(true);
//! export_to_dir(&map, &config, Path::new("out")).unwrap();
//! ```
//!
//! An existing module and its hwif report can also be wrapped on their own:
//!
//! ```
//! use registers_regblock::generate_wrapper;
//!
//! let module = "module blk(input wire clk, input blk_pkg::blk__in_t hwif_in); endmodule";
//! let wrapper = generate_wrapper("blk", module, "hwif_in.ctrl.enable\n").unwrap();
//! assert!(wrapper.contains("input logic hwif_in_ctrl_enable"));
//! ```
//!
//! ## Module Organization
//!
//! - [`regmap`]: Register map model and its TOML loader
//! - [`config`]: Export settings ([`ExportConfig`])
//! - [`hwif`]: hwif struct typedefs, report and identifiers
//! - [`nextstate`]: Hardware next-state rules for fields
//! - [`field_logic`]: Field storage and update logic
//! - [`signal`], [`bitrange`]: hwif manifest parsing
//! - [`flatten`], [`ports`]: Flat port names, declarations and connections
//! - [`wrapper`]: Flat-port wrapper modules
//! - [`output`]: Generated files ([`GeneratedArtifacts`])

pub mod bitrange;
pub mod config;
pub mod error;
pub mod field_logic;
pub mod flatten;
pub mod hwif;
pub mod nextstate;
pub mod output;
pub mod ports;
pub mod regmap;
pub mod signal;
pub mod util;
pub mod wrapper;

mod codegen;

pub use bitrange::{parse_manifest, Manifest};
pub use codegen::{export, export_to_dir};
pub use config::{CpuifKind, ExportConfig, TypeStyle};
pub use error::{RegblockError, Result};
pub use output::{GeneratedArtifacts, GeneratedFile};
pub use regmap::RegMap;
pub use wrapper::generate_wrapper;
