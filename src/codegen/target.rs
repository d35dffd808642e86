//! Target resolution.

use std::str::FromStr;

use cranelift_codegen::{
    ir::Endianness,
    isa::{self, OwnedTargetIsa, TargetIsa},
    settings::{self, Configurable},
};
use target_lexicon::{Architecture, Triple};

use super::{EmitConfig, EmitError, OptLevel};

/// Everything needed to build the instruction set backend.
#[derive(Debug, Clone)]
pub struct TargetDescriptor {
    pub triple: Triple,
    pub cpu: String,
    /// `+name` enables an ISA flag, `-name` disables it.
    pub features: Vec<String>,
    pub opt_level: OptLevel,
}

impl TargetDescriptor {
    /// Resolve the target of `config`, the host if none is given.
    ///
    /// Fails with [EmitError::TargetLookup] if the triple cannot be parsed or
    /// the code generator has no backend for it.
    pub fn resolve(config: &EmitConfig) -> Result<Self, EmitError> {
        let triple = match &config.target {
            None => Triple::host(),
            Some(name) => Triple::from_str(name).map_err(|err| EmitError::TargetLookup {
                triple: name.clone(),
                reason: err.to_string(),
            })?,
        };

        isa::lookup(triple.clone()).map_err(|err| EmitError::TargetLookup {
            triple: triple.to_string(),
            reason: err.to_string(),
        })?;

        let features = config
            .features
            .split(',')
            .map(str::trim)
            .filter(|feature| !feature.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            triple,
            cpu: config.cpu.clone(),
            features,
            opt_level: config.opt_level,
        })
    }

    /// Build the ISA with the shared and target-specific settings applied.
    pub fn build_isa(&self) -> Result<OwnedTargetIsa, EmitError> {
        if self.cpu != "generic" {
            return Err(EmitError::Isa(format!("unsupported cpu `{}`", self.cpu)));
        }

        let mut flag_builder = settings::builder();
        flag_builder
            .set("opt_level", self.opt_level.as_setting())
            .map_err(|err| EmitError::Isa(err.to_string()))?;
        flag_builder
            .set("is_pic", "true")
            .map_err(|err| EmitError::Isa(err.to_string()))?;

        let mut isa_builder = isa::lookup(self.triple.clone()).map_err(|err| {
            EmitError::TargetLookup {
                triple: self.triple.to_string(),
                reason: err.to_string(),
            }
        })?;

        for feature in self.features.iter() {
            let result = if let Some(name) = feature.strip_prefix('+') {
                isa_builder.enable(name)
            } else if let Some(name) = feature.strip_prefix('-') {
                isa_builder.set(name, "false")
            } else {
                isa_builder.enable(feature)
            };
            result.map_err(|err| EmitError::Isa(format!("feature `{}`: {}", feature, err)))?;
        }

        isa_builder
            .finish(settings::Flags::new(flag_builder))
            .map_err(|err| EmitError::Isa(err.to_string()))
    }
}

/// The data layout string of an ISA.
///
/// Only the facts the IR depends on are encoded: byte order, pointer width
/// and the stack alignment of the ABI.
pub fn data_layout(isa: &dyn TargetIsa) -> String {
    let endian = match isa.endianness() {
        Endianness::Little => "e",
        Endianness::Big => "E",
    };
    let pointer_bits = isa.pointer_bits();
    format!(
        "{}-p:{}:{}-f64:64-S{}",
        endian,
        pointer_bits,
        pointer_bits,
        stack_align_bits(isa.triple().architecture)
    )
}

#[allow(clippy::wildcard_enum_match_arm)]
fn stack_align_bits(arch: Architecture) -> u32 {
    match arch {
        Architecture::X86_64 | Architecture::Aarch64(_) | Architecture::Riscv64(_) => 128,
        _ => 64,
    }
}
