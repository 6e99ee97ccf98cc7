// Licensed under the Apache-2.0 license

//! Export configuration.
//!
//! [`ExportConfig`] collects every knob of a generator run: module and
//! package names, the CPU interface flavor, hwif typedef style and which
//! optional artifacts to emit. It can be built in code or loaded from TOML:
//!
//! ```
//! use registers_regblock::config::{CpuifKind, ExportConfig, TypeStyle};
//!
//! let config = ExportConfig::with_defaults()
//!     .cpuif(CpuifKind::Axi4LiteFlat)
//!     .type_style(TypeStyle::Hier)
//!     .flatten_hwif(true);
//! assert_eq!(config.module_name_for("my_block"), "my_block");
//!
//! let config = ExportConfig::from_toml_str(r#"
//! cpuif = "apb4"
//! module_name = "soc_regs"
//! "#).unwrap();
//! assert_eq!(config.package_name_for("top"), "soc_regs_pkg");
//! ```

use std::str::FromStr;

use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::error::{RegblockError, Result};
use crate::util::kw_filter;

/// CPU bus interface flavor. Only the port identifiers are generated; the
/// protocol adapter behind them lives outside this crate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Display, EnumString, Deserialize)]
#[serde(try_from = "String")]
pub enum CpuifKind {
    #[strum(serialize = "passthrough")]
    Passthrough,
    #[default]
    #[strum(serialize = "apb3")]
    Apb3,
    #[strum(serialize = "apb3-flat")]
    Apb3Flat,
    #[strum(serialize = "apb4")]
    Apb4,
    #[strum(serialize = "apb4-flat")]
    Apb4Flat,
    #[strum(serialize = "axi4-lite")]
    Axi4Lite,
    #[strum(serialize = "axi4-lite-flat")]
    Axi4LiteFlat,
    #[strum(serialize = "avalon-mm")]
    AvalonMm,
    #[strum(serialize = "avalon-mm-flat")]
    AvalonMmFlat,
}

impl TryFrom<String> for CpuifKind {
    type Error = RegblockError;

    fn try_from(value: String) -> Result<Self> {
        CpuifKind::parse(&value)
    }
}

/// One port of a flattened bus interface.
struct BusPort {
    output: bool,
    width: BusWidth,
    name: &'static str,
}

enum BusWidth {
    Bit,
    Fixed(u32),
    Data,
    Strobe,
    Addr,
}

const fn input(width: BusWidth, name: &'static str) -> BusPort {
    BusPort {
        output: false,
        width,
        name,
    }
}

const fn output(width: BusWidth, name: &'static str) -> BusPort {
    BusPort {
        output: true,
        width,
        name,
    }
}

impl CpuifKind {
    /// Parses a cpuif name. Every unknown name is rejected.
    pub fn parse(name: &str) -> Result<Self> {
        CpuifKind::from_str(name).map_err(|_| RegblockError::UnknownCpuif(name.to_string()))
    }

    pub fn is_flattened(self) -> bool {
        matches!(
            self,
            CpuifKind::Passthrough
                | CpuifKind::Apb3Flat
                | CpuifKind::Apb4Flat
                | CpuifKind::Axi4LiteFlat
                | CpuifKind::AvalonMmFlat
        )
    }

    /// Port declarations of the bus interface, comma separated, one per line.
    pub fn port_declaration(self, data_width: u32, addr_width: u32) -> String {
        let interface = match self {
            CpuifKind::Apb3 => Some("apb3_intf.slave s_apb"),
            CpuifKind::Apb4 => Some("apb4_intf.slave s_apb"),
            CpuifKind::Axi4Lite => Some("axi4lite_intf.slave s_axil"),
            CpuifKind::AvalonMm => Some("avalon_mm_intf.agent avalon"),
            _ => None,
        };
        if let Some(interface) = interface {
            return interface.to_string();
        }
        self.flat_ports()
            .iter()
            .map(|port| {
                let width = match port.width {
                    BusWidth::Bit => 1,
                    BusWidth::Fixed(w) => w,
                    BusWidth::Data => data_width,
                    BusWidth::Strobe => data_width.div_ceil(8),
                    BusWidth::Addr => addr_width,
                };
                let range = if width == 1 {
                    String::new()
                } else {
                    format!("[{}:0] ", width - 1)
                };
                let dir = if port.output {
                    "output logic"
                } else {
                    "input wire"
                };
                format!("{dir} {range}{}", port.name)
            })
            .collect::<Vec<_>>()
            .join(",\n")
    }

    fn flat_ports(self) -> Vec<BusPort> {
        use BusWidth::*;
        match self {
            CpuifKind::Passthrough => vec![
                input(Bit, "s_cpuif_req"),
                input(Bit, "s_cpuif_req_is_wr"),
                input(Addr, "s_cpuif_addr"),
                input(Data, "s_cpuif_wr_data"),
                input(Data, "s_cpuif_wr_biten"),
                output(Bit, "s_cpuif_req_stall_wr"),
                output(Bit, "s_cpuif_req_stall_rd"),
                output(Bit, "s_cpuif_rd_ack"),
                output(Bit, "s_cpuif_rd_err"),
                output(Data, "s_cpuif_rd_data"),
                output(Bit, "s_cpuif_wr_ack"),
                output(Bit, "s_cpuif_wr_err"),
            ],
            CpuifKind::Apb3 | CpuifKind::Apb3Flat => vec![
                input(Bit, "s_apb_psel"),
                input(Bit, "s_apb_penable"),
                input(Bit, "s_apb_pwrite"),
                input(Addr, "s_apb_paddr"),
                input(Data, "s_apb_pwdata"),
                output(Bit, "s_apb_pready"),
                output(Data, "s_apb_prdata"),
                output(Bit, "s_apb_pslverr"),
            ],
            CpuifKind::Apb4 | CpuifKind::Apb4Flat => vec![
                input(Bit, "s_apb_psel"),
                input(Bit, "s_apb_penable"),
                input(Bit, "s_apb_pwrite"),
                input(Fixed(3), "s_apb_pprot"),
                input(Addr, "s_apb_paddr"),
                input(Data, "s_apb_pwdata"),
                input(Strobe, "s_apb_pstrb"),
                output(Bit, "s_apb_pready"),
                output(Data, "s_apb_prdata"),
                output(Bit, "s_apb_pslverr"),
            ],
            CpuifKind::Axi4Lite | CpuifKind::Axi4LiteFlat => vec![
                output(Bit, "s_axil_awready"),
                input(Bit, "s_axil_awvalid"),
                input(Addr, "s_axil_awaddr"),
                input(Fixed(3), "s_axil_awprot"),
                output(Bit, "s_axil_wready"),
                input(Bit, "s_axil_wvalid"),
                input(Data, "s_axil_wdata"),
                input(Strobe, "s_axil_wstrb"),
                input(Bit, "s_axil_bready"),
                output(Bit, "s_axil_bvalid"),
                output(Fixed(2), "s_axil_bresp"),
                output(Bit, "s_axil_arready"),
                input(Bit, "s_axil_arvalid"),
                input(Addr, "s_axil_araddr"),
                input(Fixed(3), "s_axil_arprot"),
                input(Bit, "s_axil_rready"),
                output(Bit, "s_axil_rvalid"),
                output(Data, "s_axil_rdata"),
                output(Fixed(2), "s_axil_rresp"),
            ],
            CpuifKind::AvalonMm | CpuifKind::AvalonMmFlat => vec![
                input(Bit, "avalon_read"),
                input(Bit, "avalon_write"),
                output(Bit, "avalon_waitrequest"),
                input(Addr, "avalon_address"),
                input(Data, "avalon_writedata"),
                input(Strobe, "avalon_byteenable"),
                output(Bit, "avalon_readdatavalid"),
                output(Bit, "avalon_writeresponsevalid"),
                output(Data, "avalon_readdata"),
                output(Fixed(2), "avalon_response"),
            ],
        }
    }
}

/// How hwif struct typedefs are named.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Display, EnumString, Deserialize)]
#[serde(try_from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum TypeStyle {
    /// One typedef per component type, reused by every instance of it.
    #[default]
    Lexical,
    /// One typedef per instance, named after its hierarchical path.
    Hier,
}

impl TypeStyle {
    pub fn parse(name: &str) -> Result<Self> {
        TypeStyle::from_str(name).map_err(|_| RegblockError::UnknownTypeStyle(name.to_string()))
    }
}

impl TryFrom<String> for TypeStyle {
    type Error = RegblockError;

    fn try_from(value: String) -> Result<Self> {
        TypeStyle::parse(&value)
    }
}

fn default_bus_width() -> u32 {
    32
}

/// Settings for one export.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Generated module name. Defaults to the sanitized top instance name.
    #[serde(default)]
    pub module_name: Option<String>,
    /// Generated package name. Defaults to `<module>_pkg`.
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub cpuif: CpuifKind,
    #[serde(default)]
    pub type_style: TypeStyle,
    /// Replaces the top component's instance name.
    #[serde(default)]
    pub rename: Option<String>,
    /// Also write the hwif manifest next to the module.
    #[serde(default)]
    pub hwif_report: bool,
    /// Also write a wrapper with flat hwif ports.
    #[serde(default)]
    pub flatten_hwif: bool,
    #[serde(default = "default_bus_width")]
    pub data_width: u32,
    #[serde(default = "default_bus_width")]
    pub addr_width: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ExportConfig {
    /// APB3, lexical typedefs, no optional artifacts, 32-bit bus.
    pub fn with_defaults() -> Self {
        Self {
            module_name: None,
            package_name: None,
            cpuif: CpuifKind::default(),
            type_style: TypeStyle::default(),
            rename: None,
            hwif_report: false,
            flatten_hwif: false,
            data_width: default_bus_width(),
            addr_width: default_bus_width(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn module_name(mut self, name: &str) -> Self {
        self.module_name = Some(name.to_string());
        self
    }

    pub fn package_name(mut self, name: &str) -> Self {
        self.package_name = Some(name.to_string());
        self
    }

    pub fn cpuif(mut self, cpuif: CpuifKind) -> Self {
        self.cpuif = cpuif;
        self
    }

    pub fn type_style(mut self, style: TypeStyle) -> Self {
        self.type_style = style;
        self
    }

    pub fn rename(mut self, name: &str) -> Self {
        self.rename = Some(name.to_string());
        self
    }

    pub fn hwif_report(mut self, enable: bool) -> Self {
        self.hwif_report = enable;
        self
    }

    pub fn flatten_hwif(mut self, enable: bool) -> Self {
        self.flatten_hwif = enable;
        self
    }

    pub fn data_width(mut self, width: u32) -> Self {
        self.data_width = width;
        self
    }

    pub fn addr_width(mut self, width: u32) -> Self {
        self.addr_width = width;
        self
    }

    /// Instance name of the top node after `rename` is applied.
    pub fn top_name_for(&self, top_inst_name: &str) -> String {
        self.rename
            .clone()
            .unwrap_or_else(|| top_inst_name.to_string())
    }

    pub fn module_name_for(&self, top_name: &str) -> String {
        self.module_name
            .clone()
            .unwrap_or_else(|| kw_filter(top_name))
    }

    pub fn package_name_for(&self, top_name: &str) -> String {
        self.package_name
            .clone()
            .unwrap_or_else(|| format!("{}_pkg", self.module_name_for(top_name)))
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.data_width == 0 || self.data_width % 8 != 0 {
            return Err(RegblockError::InvalidConfig(format!(
                "cpuif data width {} is not a whole number of bytes",
                self.data_width
            )));
        }
        if self.addr_width == 0 {
            return Err(RegblockError::InvalidConfig(
                "cpuif address width must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
