//! Control unit: walks instruction chains and dispatches them in queue order.
//!
//! A chain is a run of cells linked through their tails. Every cell's head must be an
//! integer opcode; the walk stops at the first empty tail. Chains are not checked for
//! cycles, a cyclic chain never terminates.
use crate::{
    Address, ControlQueue, ExecutionContext, Executor, Memory, Register, Result, Tag, VMError,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunState {
    Running,
    Halted,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    /// Chains handed to the executor.
    pub dispatched: usize,
    /// Opcodes across all of them.
    pub opcodes: usize,
}

/// Collects the opcodes of the chain starting at `pc`, in link order.
pub fn sequence(memory: &Memory, pc: Address) -> Result<Vec<u32>> {
    let mut cursor = pc;
    let mut opcodes = Vec::new();
    loop {
        opcodes.push(memory.head_integer(cursor)?);
        match memory.tail_type(cursor)? {
            Tag::Pointer => {
                let next = memory.tail_pointer(cursor)?;
                log::trace!("{cursor} -> {next}");
                cursor = next;
            }
            Tag::Empty => break,
            found => {
                return Err(VMError::TypeMismatch {
                    slot: Some(cursor),
                    expected: Tag::Pointer,
                    found,
                });
            }
        }
    }
    log::debug!("instruction sequence at {pc}: {opcodes:?}");
    Ok(opcodes)
}

#[derive(Debug, Clone)]
pub struct ControlUnit {
    pc: Address,
    queue: ControlQueue,
    state: RunState,
}

impl Default for ControlUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlUnit {
    /// Starts at the entry cell with nothing queued.
    pub fn new() -> Self {
        Self::with_entry(Address::ENTRY)
    }

    pub fn with_entry(pc: Address) -> Self {
        Self {
            pc,
            queue: ControlQueue::new(),
            state: RunState::Running,
        }
    }

    #[inline(always)]
    pub fn pc(&self) -> Address {
        self.pc
    }

    #[inline(always)]
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn queue(&self) -> &ControlQueue {
        &self.queue
    }

    pub fn enqueue(&mut self, pc: Address) {
        self.queue.push(pc);
    }

    /// Back to the entry cell, queue cleared.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Extract the chain at `pc`, run it, then move to the next queued chain.
    /// On error the unit stays at the failing `pc`.
    pub fn step<E: Executor + ?Sized>(
        &mut self,
        memory: &mut Memory,
        register: &mut Register,
        executor: &mut E,
    ) -> Result<RunState> {
        if self.state == RunState::Running {
            self.dispatch(memory, register, executor)?;
        }
        Ok(self.state)
    }

    /// Steps until the queue runs dry.
    pub fn run<E: Executor + ?Sized>(
        &mut self,
        memory: &mut Memory,
        register: &mut Register,
        executor: &mut E,
    ) -> Result<RunReport> {
        let mut report = RunReport::default();
        while self.state == RunState::Running {
            report.opcodes += self.dispatch(memory, register, executor)?;
            report.dispatched += 1;
        }
        log::debug!(
            "halted after {} dispatches ({} opcodes)",
            report.dispatched,
            report.opcodes
        );
        Ok(report)
    }

    fn dispatch<E: Executor + ?Sized>(
        &mut self,
        memory: &mut Memory,
        register: &mut Register,
        executor: &mut E,
    ) -> Result<usize> {
        let pc = self.pc;
        let opcodes = sequence(memory, pc)?;
        {
            let mut context = ExecutionContext::new(memory, register, &mut self.queue);
            executor.execute(pc, &opcodes, &mut context)?;
        }

        match self.queue.pop() {
            Some(next) => {
                log::debug!("dispatched {pc}, next {next} ({} pending)", self.queue.len());
                self.pc = next;
            }
            None => {
                log::debug!("dispatched {pc}, queue exhausted");
                self.state = RunState::Halted;
            }
        }
        Ok(opcodes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NullExecutor, TaggedValue};

    fn chain(memory: &mut Memory, start: u32, opcodes: &[u32]) {
        for (offset, &opcode) in opcodes.iter().enumerate() {
            let slot = Address(start + offset as u32);
            let tail = if offset + 1 == opcodes.len() {
                TaggedValue::Empty
            } else {
                TaggedValue::Pointer(Address(slot.raw() + 1))
            };
            memory
                .set_cell(slot, TaggedValue::Integer(opcode), tail)
                .unwrap();
        }
    }

    #[test]
    fn three_cell_chain() {
        let mut memory = Memory::new(8).unwrap();
        chain(&mut memory, 0, &[10, 20, 30]);
        assert_eq!(sequence(&memory, Address(0)), Ok(vec![10, 20, 30]));
        assert_eq!(sequence(&memory, Address(1)), Ok(vec![20, 30]));
    }

    #[test]
    fn links_need_not_be_contiguous() {
        let mut memory = Memory::new(16).unwrap();
        memory
            .set_cell(Address(9), TaggedValue::Integer(1), TaggedValue::Pointer(Address(2)))
            .unwrap();
        memory
            .set_cell(Address(2), TaggedValue::Integer(2), TaggedValue::Pointer(Address(14)))
            .unwrap();
        memory
            .set_cell(Address(14), TaggedValue::Integer(3), TaggedValue::Empty)
            .unwrap();
        assert_eq!(sequence(&memory, Address(9)), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn non_integer_head_fails_the_whole_chain() {
        let mut memory = Memory::new(4).unwrap();
        chain(&mut memory, 0, &[10, 20, 30]);
        memory
            .set_head(Address(1), TaggedValue::Pointer(Address(3)))
            .unwrap();

        assert_eq!(
            sequence(&memory, Address(0)),
            Err(VMError::TypeMismatch {
                slot: Some(Address(1)),
                expected: Tag::Integer,
                found: Tag::Pointer,
            })
        );
    }

    #[test]
    fn empty_head_fails() {
        let memory = Memory::new(4).unwrap();
        assert!(matches!(
            sequence(&memory, Address(0)),
            Err(VMError::TypeMismatch {
                expected: Tag::Integer,
                found: Tag::Empty,
                ..
            })
        ));
    }

    #[test]
    fn integer_tail_is_malformed() {
        let mut memory = Memory::new(4).unwrap();
        memory
            .set_cell(Address(0), TaggedValue::Integer(1), TaggedValue::Integer(1))
            .unwrap();
        assert_eq!(
            sequence(&memory, Address(0)),
            Err(VMError::TypeMismatch {
                slot: Some(Address(0)),
                expected: Tag::Pointer,
                found: Tag::Integer,
            })
        );
    }

    #[test]
    fn dangling_tail_is_out_of_range() {
        let mut memory = Memory::new(2).unwrap();
        memory
            .set_cell(Address(0), TaggedValue::Integer(1), TaggedValue::Pointer(Address(5)))
            .unwrap();
        assert_eq!(
            sequence(&memory, Address(0)),
            Err(VMError::OutOfRange {
                slot: Address(5),
                capacity: 2,
            })
        );
    }

    #[test]
    fn visits_pc_then_queue_in_order() {
        let mut memory = Memory::new(8).unwrap();
        let mut register = Register::new();
        chain(&mut memory, 4, &[1]);
        chain(&mut memory, 2, &[2, 2]);
        chain(&mut memory, 6, &[3, 3]);

        let mut control = ControlUnit::with_entry(Address(4));
        control.enqueue(Address(2));
        control.enqueue(Address(6));

        let mut visited = Vec::new();
        let mut record = |pc: Address, _: &[u32], _: &mut ExecutionContext<'_>| -> Result<()> {
            visited.push(pc);
            Ok(())
        };
        let report = control.run(&mut memory, &mut register, &mut record).unwrap();

        assert_eq!(visited, vec![Address(4), Address(2), Address(6)]);
        assert_eq!(report.dispatched, 3);
        assert_eq!(report.opcodes, 5);
        assert_eq!(control.state(), RunState::Halted);
    }

    #[test]
    fn scheduled_chains_run_after_pending_ones() {
        let mut memory = Memory::new(8).unwrap();
        let mut register = Register::new();
        chain(&mut memory, 0, &[0]);
        chain(&mut memory, 1, &[1]);
        chain(&mut memory, 2, &[2]);

        let mut control = ControlUnit::new();
        control.enqueue(Address(1));

        let mut order = Vec::new();
        let mut spawn_once = |pc: Address, ops: &[u32], ctx: &mut ExecutionContext<'_>| -> Result<()> {
            order.push(ops[0]);
            if pc == Address(0) {
                ctx.schedule(Address(2));
            }
            Ok(())
        };
        control.run(&mut memory, &mut register, &mut spawn_once).unwrap();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn executor_sees_memory_and_register() {
        let mut memory = Memory::new(4).unwrap();
        let mut register = Register::new();
        chain(&mut memory, 0, &[5, 6]);

        let mut sum = |_: Address, ops: &[u32], ctx: &mut ExecutionContext<'_>| -> Result<()> {
            ctx.register.set_integer(ops.iter().sum());
            ctx.memory
                .set_tail(Address(3), TaggedValue::Integer(ops.len() as u32))
        };
        ControlUnit::new()
            .run(&mut memory, &mut register, &mut sum)
            .unwrap();

        assert_eq!(register.get_integer(), Ok(11));
        assert_eq!(memory.tail_integer(Address(3)), Ok(2));
    }

    #[test]
    fn step_by_step() {
        let mut memory = Memory::new(4).unwrap();
        let mut register = Register::new();
        chain(&mut memory, 0, &[1]);
        chain(&mut memory, 1, &[2]);

        let mut control = ControlUnit::new();
        control.enqueue(Address(1));

        let state = control.step(&mut memory, &mut register, &mut NullExecutor);
        assert_eq!(state, Ok(RunState::Running));
        assert_eq!(control.pc(), Address(1));
        assert!(control.queue().is_empty());

        let state = control.step(&mut memory, &mut register, &mut NullExecutor);
        assert_eq!(state, Ok(RunState::Halted));

        // halted units read nothing
        memory.set_head(Address(1), TaggedValue::Empty).unwrap();
        let state = control.step(&mut memory, &mut register, &mut NullExecutor);
        assert_eq!(state, Ok(RunState::Halted));

        control.reset();
        assert_eq!(control.pc(), Address::ENTRY);
        assert_eq!(control.state(), RunState::Running);
    }

    #[test]
    fn errors_abort_the_run() {
        let mut memory = Memory::new(4).unwrap();
        let mut register = Register::new();
        chain(&mut memory, 0, &[1]);

        let mut control = ControlUnit::new();
        control.enqueue(Address(3));
        control.enqueue(Address(0));

        let mut count = 0;
        let mut counting = |_: Address, _: &[u32], _: &mut ExecutionContext<'_>| -> Result<()> {
            count += 1;
            Ok(())
        };
        let result = control.run(&mut memory, &mut register, &mut counting);

        assert!(matches!(result, Err(VMError::TypeMismatch { .. })));
        assert_eq!(count, 1);
        assert_eq!(control.pc(), Address(3));
        assert_eq!(control.state(), RunState::Running);
    }
}
