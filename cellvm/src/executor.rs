use std::collections::VecDeque;

use crate::{Address, Memory, Register, Result};

/// FIFO of program counters waiting for dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlQueue {
    pending: VecDeque<Address>,
}

impl ControlQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pc: Address) {
        self.pending.push_back(pc);
    }

    pub fn pop(&mut self) -> Option<Address> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Address> + '_ {
        self.pending.iter().copied()
    }
}

impl FromIterator<Address> for ControlQueue {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            pending: iter.into_iter().collect(),
        }
    }
}

/// What an executor may touch while running one instruction sequence.
///
/// The queue is append-only from here; popping belongs to the control unit.
#[derive(Debug)]
pub struct ExecutionContext<'a> {
    pub memory: &'a mut Memory,
    pub register: &'a mut Register,
    queue: &'a mut ControlQueue,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        memory: &'a mut Memory,
        register: &'a mut Register,
        queue: &'a mut ControlQueue,
    ) -> Self {
        Self {
            memory,
            register,
            queue,
        }
    }

    /// Queue another chain; it runs after everything already pending.
    pub fn schedule(&mut self, pc: Address) {
        log::trace!("scheduling {pc}");
        self.queue.push(pc);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Gives meaning to an opcode sequence. The control unit only walks chains.
pub trait Executor {
    fn execute(
        &mut self,
        pc: Address,
        sequence: &[u32],
        context: &mut ExecutionContext<'_>,
    ) -> Result<()>;
}

impl<F> Executor for F
where
    F: FnMut(Address, &[u32], &mut ExecutionContext<'_>) -> Result<()>,
{
    fn execute(
        &mut self,
        pc: Address,
        sequence: &[u32],
        context: &mut ExecutionContext<'_>,
    ) -> Result<()> {
        self(pc, sequence, context)
    }
}

/// Executes nothing and schedules nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullExecutor;

impl Executor for NullExecutor {
    fn execute(&mut self, _: Address, _: &[u32], _: &mut ExecutionContext<'_>) -> Result<()> {
        Ok(())
    }
}
