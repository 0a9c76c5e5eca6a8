//! Machine configuration.
//!
//! A run can be described by an optional JSON file, for example:
//!
//! ```json
//! {
//!   "start_address": 256,
//!   "max_ticks": 50000,
//!   "registers": { "AC": 5, "IEN": 1 },
//!   "input": "hello"
//! }
//! ```
//!
//! Every field is optional. Command-line flags override the file.

use crate::cpu::{Cpu, CpuError, RegisterError, RegisterName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Default tick budget for a run.
pub const DEFAULT_MAX_TICKS: u64 = 100_000;

/// How to start and bound a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Initial PC. When absent, the program's lowest address is used.
    pub start_address: Option<u16>,

    /// Clock edges to allow before giving up on HLT.
    pub max_ticks: u64,

    /// Register values applied right after reset, by name.
    pub registers: BTreeMap<String, u16>,

    /// Characters offered to the input device, one per INP.
    pub input: String,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            start_address: None,
            max_ticks: DEFAULT_MAX_TICKS,
            registers: BTreeMap::new(),
            input: String::new(),
        }
    }
}

impl MachineConfig {
    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config = Self::from_json(&text)?;
        log::debug!("loaded configuration from {}: {:?}", path.as_ref().display(), config);
        Ok(config)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Reset the machine and apply the start address, registers and input.
    /// `default_start` is used when no start address is configured.
    pub fn apply(&self, cpu: &mut Cpu, default_start: u16) -> Result<(), ConfigError> {
        let start = self.start_address.unwrap_or(default_start);
        if start > RegisterName::Pc.max_value() {
            return Err(CpuError::from(RegisterError::ValueOutOfRange {
                register: RegisterName::Pc,
                value: start,
                width: RegisterName::Pc.width(),
            })
            .into());
        }
        cpu.reset(start);

        for (name, &value) in &self.registers {
            let register: RegisterName = name.parse().map_err(CpuError::from)?;
            cpu.set_register(register, value)?;
        }

        if !self.input.is_empty() {
            cpu.queue_input(self.input.as_bytes());
        }
        Ok(())
    }
}

/// Errors from loading or applying a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("invalid configuration: {0}")]
    ParseError(String),

    #[error(transparent)]
    Machine(#[from] CpuError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MachineConfig::from_json("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
        assert_eq!(config.max_ticks, DEFAULT_MAX_TICKS);
    }

    #[test]
    fn test_apply() {
        let config = MachineConfig::from_json(
            r#"{ "start_address": 16, "registers": { "ac": 7, "E": 1 }, "input": "ok" }"#,
        )
        .unwrap();

        let mut cpu = Cpu::new();
        config.apply(&mut cpu, 0).unwrap();
        assert_eq!(cpu.regs.pc, 16);
        assert_eq!(cpu.regs.ac, 7);
        assert!(cpu.regs.e);
        assert!(cpu.is_running());
        assert_eq!(cpu.regs.inpr, b'o');
        assert_eq!(cpu.pending_input(), 1);
    }

    #[test]
    fn test_apply_rejects_bad_registers() {
        let mut cpu = Cpu::new();

        let unknown = MachineConfig::from_json(r#"{ "registers": { "XR": 1 } }"#).unwrap();
        assert!(matches!(unknown.apply(&mut cpu, 0), Err(ConfigError::Machine(_))));

        let wide = MachineConfig::from_json(r#"{ "registers": { "PC": 4096 } }"#).unwrap();
        assert!(matches!(wide.apply(&mut cpu, 0), Err(ConfigError::Machine(_))));
    }

    #[test]
    fn test_apply_rejects_wide_start_address() {
        let mut cpu = Cpu::new();
        let config = MachineConfig::from_json(r#"{ "start_address": 4097 }"#).unwrap();

        assert_eq!(
            config.apply(&mut cpu, 0),
            Err(ConfigError::Machine(CpuError::Register(RegisterError::ValueOutOfRange {
                register: RegisterName::Pc,
                value: 4097,
                width: 12,
            })))
        );
        assert!(cpu.is_halted());

        let edge = MachineConfig::from_json(r#"{ "start_address": 4095 }"#).unwrap();
        edge.apply(&mut cpu, 0).unwrap();
        assert_eq!(cpu.regs.pc, 0xFFF);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(MachineConfig::from_json("{ nope"), Err(ConfigError::ParseError(_))));
    }
}
