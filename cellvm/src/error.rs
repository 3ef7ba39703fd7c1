use thiserror::Error;

use crate::{Address, Tag};

pub type Result<T> = std::result::Result<T, VMError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VMError {
    /// Memory was sized zero or past the 32 bit address space.
    #[error("invalid memory capacity: {slots} slots (must be 1..={max})", max = crate::MAX_SLOTS)]
    Capacity { slots: usize },

    #[error("slot {slot} out of range (capacity {capacity})")]
    OutOfRange { slot: Address, capacity: usize },

    /// `slot` is `None` when the register was accessed.
    #[error("expected {expected}, found {found}{}", at(.slot))]
    TypeMismatch {
        slot: Option<Address>,
        expected: Tag,
        found: Tag,
    },

    #[error("malformed memory image: {words} words")]
    MalformedImage { words: usize },
}

fn at(slot: &Option<Address>) -> String {
    match slot {
        Some(slot) => format!(" at {slot}"),
        None => " in register".to_string(),
    }
}
