mod control;
mod error;
mod executor;
mod loader;
mod memory;
mod register;
mod tagged;
mod vm;

pub use control::*;
pub use error::{Result, VMError};
pub use executor::*;
pub use loader::*;
pub use memory::*;
pub use register::*;
pub use tagged::*;
pub use vm::*;
