//! Stack slots for source-level variables.
//!
//! Every variable gets exactly one slot per function, placed at the front of
//! the entry block. The slot then dominates every use no matter which branch
//! assigns the variable first.

use log::{debug, error};

use super::{IrGenContext, IrGenError, IrGenResult};
use crate::{
    collections::linked_list::LinkedListContainerPtr,
    ir::{Inst, Ty, Value},
};

impl IrGenContext {
    /// The slot of `name`, allocating it on first request.
    ///
    /// The slot is inserted at the front of the entry block regardless of the
    /// cursor.
    pub fn alloc_slot(&mut self, name: &str) -> IrGenResult<Value> {
        if let Some(&slot) = self.symtable.get(name) {
            return Ok(slot);
        }

        let func = self.curr_func.ok_or(IrGenError::NoFunction)?;
        let entry = func.entry(&self.ctx).ok_or(IrGenError::NoFunction)?;

        let inst = Inst::stack_slot(&mut self.ctx, Ty::float64().bytewidth());
        entry.push_front(&mut self.ctx, inst);

        let slot = inst.result(&self.ctx, 0);
        let slot_name = format!("{}.addr", name);
        if self.ctx.lookup_value(&slot_name).is_none() {
            slot.assign_name(&mut self.ctx, slot_name);
        } else {
            // the same variable in an earlier function
            slot.alloc_name(&mut self.ctx, slot_name);
        }
        self.symtable.insert(name.to_string(), slot);

        debug!("allocate slot {} for `{}`", slot.display(&self.ctx), name);
        Ok(slot)
    }

    /// Store `value` into the slot of `name`, returning the store.
    pub fn assign(&mut self, name: &str, value: IrGenResult<Value>) -> IrGenResult<Inst> {
        let value = value?;
        self.expect_float(value)?;

        let slot = self.alloc_slot(name)?;
        let inst = Inst::store(&mut self.ctx, value, slot);
        self.append(inst)?;
        Ok(inst)
    }

    /// Load the current value of `name` at the cursor.
    pub fn read(&mut self, name: &str) -> IrGenResult<Value> {
        let Some(&slot) = self.symtable.get(name) else {
            error!("Unknown variable: {}", name);
            return Err(IrGenError::UnknownVariable(name.to_string()));
        };

        let inst = Inst::load(&mut self.ctx, Ty::float64(), slot);
        self.append(inst)?;
        Ok(inst.result(&self.ctx, 0))
    }

    pub fn slot(&self, name: &str) -> Option<Value> { self.symtable.get(name).copied() }
}
