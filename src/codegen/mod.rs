//! # Machine Code Emitter
//!
//! Turns a finished module into a native object file (or a textual listing
//! of the generated machine code) through Cranelift.
//!
//! 1. resolve the target and build the ISA
//! 2. record the triple and data layout on the module
//! 3. verify every function
//! 4. open the output file, truncating it
//! 5. lower, compile and write

mod lower;
pub mod target;

use std::{
    fmt,
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use cranelift_codegen::ir::UserFuncName;
use cranelift_frontend::FunctionBuilderContext;
use cranelift_module::{Linkage, Module};
use cranelift_object::{ObjectBuilder, ObjectModule};
use log::{debug, error, info};
use thiserror::Error;

pub use self::target::TargetDescriptor;
use crate::ir::{
    self,
    verify::{verify_module, VerifyError},
    TargetInfo,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptLevel {
    None,
    #[default]
    Speed,
    SpeedAndSize,
}

impl OptLevel {
    /// The value of Cranelift's `opt_level` setting.
    pub fn as_setting(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Speed => "speed",
            OptLevel::SpeedAndSize => "speed_and_size",
        }
    }
}

impl FromStr for OptLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(OptLevel::None),
            "speed" => Ok(OptLevel::Speed),
            "speed_and_size" => Ok(OptLevel::SpeedAndSize),
            _ => Err(format!("unknown optimization level `{}`", s)),
        }
    }
}

/// The kind of file to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmitKind {
    #[default]
    Object,
    Assembly,
}

impl FromStr for EmitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "obj" => Ok(EmitKind::Object),
            "asm" => Ok(EmitKind::Assembly),
            _ => Err(format!("unknown emit kind `{}`", s)),
        }
    }
}

impl fmt::Display for EmitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitKind::Object => write!(f, "obj"),
            EmitKind::Assembly => write!(f, "asm"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// Target triple, the host if `None`.
    pub target: Option<String>,
    pub cpu: String,
    /// Comma separated ISA flags, e.g. `+has_avx,-has_sse41`.
    pub features: String,
    pub opt_level: OptLevel,
    pub kind: EmitKind,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            target: None,
            cpu: "generic".to_string(),
            features: String::new(),
            opt_level: OptLevel::default(),
            kind: EmitKind::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("target lookup failed for `{triple}`: {reason}")]
    TargetLookup { triple: String, reason: String },

    #[error("cannot configure the target: {0}")]
    Isa(String),

    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("code generation failed: {0}")]
    Module(String),

    #[error("{triple} cannot emit a file of kind `{kind}`")]
    UnsupportedKind { kind: EmitKind, triple: String },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to emit an invalid module: {0}")]
    Verify(#[from] VerifyError),

    #[error("cannot lower to machine code: {0}")]
    Lower(String),
}

/// A successfully written output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOutput {
    pub path: PathBuf,
    pub kind: EmitKind,
    pub bytes_written: usize,
}

/// Emit `ctx` into `path`.
///
/// The module gets the target triple and data layout attached on the way.
/// Every failure is logged before it is returned. On failure the file at
/// `path` may or may not exist and must not be trusted.
pub fn emit(
    ctx: &mut ir::Context,
    path: impl AsRef<Path>,
    config: &EmitConfig,
) -> Result<EmitOutput, EmitError> {
    emit_inner(ctx, path.as_ref(), config).inspect_err(|err| error!("{}", err))
}

fn emit_inner(
    ctx: &mut ir::Context,
    path: &Path,
    config: &EmitConfig,
) -> Result<EmitOutput, EmitError> {
    let target = TargetDescriptor::resolve(config)?;
    let isa = target.build_isa()?;
    debug!("resolved target {}", target.triple);

    ctx.set_target(TargetInfo {
        triple: target.triple.to_string(),
        data_layout: target::data_layout(&*isa),
    });

    verify_module(ctx)?;

    let mut file = File::create(path).map_err(|source| EmitError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let builder = ObjectBuilder::new(isa, ctx.name(), cranelift_module::default_libcall_names())
        .map_err(|err| EmitError::Module(err.to_string()))?;
    let mut module = ObjectModule::new(builder);
    let pointer_ty = module.target_config().pointer_type();

    let mut clctx = module.make_context();
    let mut fb_ctx = FunctionBuilderContext::new();
    let mut listing = String::new();

    for &func in ctx.funcs() {
        let name = func.name(ctx);

        let mut sig = module.make_signature();
        lower::lower_sig(func.sig(ctx), &mut sig, pointer_ty)?;
        let func_id = module
            .declare_function(name, Linkage::Export, &sig)
            .map_err(|err| EmitError::Module(err.to_string()))?;

        clctx.func.signature = sig;
        clctx.func.name = UserFuncName::user(0, func_id.as_u32());
        clctx.set_disasm(config.kind == EmitKind::Assembly);

        lower::lower_func(ctx, func, &mut clctx.func, &mut fb_ctx, pointer_ty)?;
        debug!("lowered @{}", name);

        module
            .define_function(func_id, &mut clctx)
            .map_err(|err| EmitError::Module(format!("@{}: {}", name, err)))?;

        if config.kind == EmitKind::Assembly {
            let vcode = clctx
                .compiled_code()
                .and_then(|code| code.vcode.as_ref())
                .ok_or_else(|| EmitError::UnsupportedKind {
                    kind: config.kind,
                    triple: target.triple.to_string(),
                })?;
            listing.push_str(&format!("{}:\n{}\n", name, vcode));
        }

        module.clear_context(&mut clctx);
    }

    let bytes = match config.kind {
        EmitKind::Object => module
            .finish()
            .emit()
            .map_err(|err| EmitError::Module(err.to_string()))?,
        EmitKind::Assembly => listing.into_bytes(),
    };

    let write_err = |source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    };
    file.write_all(&bytes).map_err(write_err)?;
    file.flush().map_err(write_err)?;

    info!(
        "wrote {} bytes of {} to {}",
        bytes.len(),
        config.kind,
        path.display()
    );

    Ok(EmitOutput {
        path: path.to_path_buf(),
        kind: config.kind,
        bytes_written: bytes.len(),
    })
}
