use core::fmt;

use rustc_hash::FxHashMap;

use super::{
    block::BlockData,
    func::FuncData,
    inst::InstData,
    name_alloc::NameAlloc,
    value::ValueData,
    Block,
    Func,
    Value,
};
use crate::collections::{linked_list::LinkedListContainerPtr, storage::BaseArena};

/// Target metadata attached to a module right before emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub triple: String,
    pub data_layout: String,
}

/// The context of the IR, i.e. the module.
///
/// A context owns every entity of the compilation unit. Entities are referred
/// to by handles, and all the handles are only meaningful together with the
/// context that created them.
pub struct Context {
    /// The name of the module.
    name: String,

    // +-----------------+
    // |    storages     |
    // +-----------------+
    pub(super) blocks: BaseArena<BlockData>,
    pub(super) insts: BaseArena<InstData>,
    pub(super) values: BaseArena<ValueData>,
    pub(super) funcs: BaseArena<FuncData>,

    /// Function symbols, and their definition order for printing/emission.
    symbols: FxHashMap<String, Func>,
    func_order: Vec<Func>,

    // +-----------------+
    // | name management |
    // +-----------------+
    pub(super) value_name_alloc: NameAlloc<Value>,
    pub(super) block_name_alloc: NameAlloc<Block>,

    /// Set by the code generator.
    target: Option<TargetInfo>,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),

            blocks: BaseArena::default(),
            insts: BaseArena::default(),
            values: BaseArena::default(),
            funcs: BaseArena::default(),

            symbols: FxHashMap::default(),
            func_order: Vec::new(),

            value_name_alloc: NameAlloc::default(),
            block_name_alloc: NameAlloc::default(),

            target: None,
        }
    }

    pub fn name(&self) -> &str { &self.name }

    /// Map the name of a newly created function.
    ///
    /// # Panics
    ///
    /// Panics if the symbol already exists, check with
    /// [lookup_func](Self::lookup_func) first.
    pub(super) fn insert_func(&mut self, name: String, func: Func) {
        if self.symbols.contains_key(&name) {
            panic!("symbol {:?} is already defined", name);
        }
        self.symbols.insert(name, func);
        self.func_order.push(func);
    }

    pub fn lookup_func(&self, name: &str) -> Option<Func> { self.symbols.get(name).copied() }

    /// All functions, in definition order.
    pub fn funcs(&self) -> &[Func] { &self.func_order }

    pub fn lookup_value(&self, name: &str) -> Option<Value> { self.value_name_alloc.get_ptr(name) }

    pub fn lookup_block(&self, name: &str) -> Option<Block> { self.block_name_alloc.get_ptr(name) }

    pub fn set_target(&mut self, target: TargetInfo) { self.target = Some(target); }

    pub fn target(&self) -> Option<&TargetInfo> { self.target.as_ref() }

    /// Allocate names for all the values and blocks reachable from the
    /// function layouts.
    ///
    /// Names are needed to print the IR immutably, existing names are kept.
    pub fn alloc_all_names(&mut self) {
        for func in self.func_order.clone() {
            let blocks: Vec<Block> = func.iter(self).collect();
            for block in blocks {
                block.name_or_alloc(self, "bb");
                let insts: Vec<_> = block.iter(self).collect();
                for inst in insts {
                    for result in inst.results(self).to_vec() {
                        result.name_or_alloc(self, "v");
                    }
                }
            }
        }
    }

    pub fn display(&self) -> DisplayContext<'_> { DisplayContext { ctx: self } }
}

pub struct DisplayContext<'a> {
    ctx: &'a Context,
}

impl fmt::Display for DisplayContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// module: {}", self.ctx.name)?;

        if let Some(target) = &self.ctx.target {
            writeln!(f, "target triple = \"{}\"", target.triple)?;
            writeln!(f, "target datalayout = \"{}\"", target.data_layout)?;
        }

        for func in self.ctx.func_order.iter() {
            writeln!(f)?;
            writeln!(f, "{}", func.display(self.ctx))?;
        }

        Ok(())
    }
}
