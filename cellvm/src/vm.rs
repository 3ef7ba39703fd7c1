use crate::{
    Address, ControlUnit, Executor, Loader, Memory, Register, Result, RunReport, RunState,
    sequence,
};

/// Slot count used by the bootstrap firmware.
pub const DEFAULT_SLOTS: usize = 65536;

#[derive(Debug, Clone)]
pub struct VMCreateInfo {
    pub slots: usize,
}

impl Default for VMCreateInfo {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS,
        }
    }
}

/// One machine: memory, the scratch register and the control unit.
#[derive(Debug, Clone)]
pub struct VM {
    memory: Memory,
    register: Register,
    control: ControlUnit,
}

impl VM {
    pub fn new(info: VMCreateInfo) -> Result<Self> {
        let memory = Memory::new(info.slots)?;
        Ok(Self {
            memory,
            register: Register::new(),
            control: ControlUnit::new(),
        })
    }

    pub fn load<L: Loader + ?Sized>(&mut self, loader: &L) -> Result<()> {
        loader.load(&mut self.memory)
    }

    /// Dispatches from the current pc until the control queue is empty.
    pub fn run<E: Executor + ?Sized>(&mut self, executor: &mut E) -> Result<RunReport> {
        self.control
            .run(&mut self.memory, &mut self.register, executor)
    }

    pub fn step<E: Executor + ?Sized>(&mut self, executor: &mut E) -> Result<RunState> {
        self.control
            .step(&mut self.memory, &mut self.register, executor)
    }

    /// Opcodes of the chain at `pc`, without dispatching it.
    pub fn sequence(&self, pc: Address) -> Result<Vec<u32>> {
        sequence(&self.memory, pc)
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn register(&self) -> &Register {
        &self.register
    }

    pub fn register_mut(&mut self) -> &mut Register {
        &mut self.register
    }

    pub fn control(&self) -> &ControlUnit {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut ControlUnit {
        &mut self.control
    }
}
