use std::fmt;

use crate::{
    Address, HEAD_TAG_SHIFT, Result, TAIL_TAG_SHIFT, Tag, TaggedValue, VMError, decode_tag,
    encode_tag,
};

/// Largest capacity whose every index still fits an `Address`.
pub const MAX_SLOTS: usize = u32::MAX as usize;

/// Number of 32 bit words in one cell of a raw image.
pub const CELL_WORDS: usize = 4;

/// One addressable unit of memory.
///
/// ```text
/// word 0: head payload
/// word 1: tail payload
/// word 2: tags  [head:2] [tail:2] [unused:28]
/// word 3: free  reserved for allocator linkage, never read by the core
/// ```
///
/// Payloads are only meaningful when the matching tag is integer or pointer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    head: u32,
    tail: u32,
    tags: u32,
    free: u32,
}

const _: () = assert!(size_of::<Cell>() == CELL_WORDS * size_of::<u32>());

impl Cell {
    #[inline(always)]
    pub const fn from_words(words: [u32; CELL_WORDS]) -> Self {
        let [head, tail, tags, free] = words;
        Self {
            head,
            tail,
            tags,
            free,
        }
    }

    #[inline(always)]
    pub const fn words(&self) -> [u32; CELL_WORDS] {
        [self.head, self.tail, self.tags, self.free]
    }

    #[inline(always)]
    pub const fn head_tag(&self) -> Tag {
        decode_tag(self.tags, HEAD_TAG_SHIFT)
    }

    #[inline(always)]
    pub const fn tail_tag(&self) -> Tag {
        decode_tag(self.tags, TAIL_TAG_SHIFT)
    }

    #[inline(always)]
    pub const fn free(&self) -> u32 {
        self.free
    }

    /// Payload and tag land in the same call, so a half-written side is never visible.
    #[inline(always)]
    fn set_head(&mut self, value: TaggedValue) {
        let (payload, tag) = value.encode();
        self.head = payload;
        self.tags = encode_tag(self.tags, HEAD_TAG_SHIFT, tag);
    }

    #[inline(always)]
    fn set_tail(&mut self, value: TaggedValue) {
        let (payload, tag) = value.encode();
        self.tail = payload;
        self.tags = encode_tag(self.tags, TAIL_TAG_SHIFT, tag);
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_side(f, self.head, self.head_tag())?;
        f.write_str(" . ")?;
        write_side(f, self.tail, self.tail_tag())?;
        write!(f, ") free=0x{:08x}", self.free)
    }
}

fn write_side(f: &mut fmt::Formatter<'_>, payload: u32, tag: Tag) -> fmt::Result {
    match TaggedValue::decode(payload, tag) {
        Some(value) => write!(f, "{value}"),
        None => write!(f, "reserved(0x{payload:08x})"),
    }
}

/// Fixed-capacity cell store, zeroed (all empty) on construction and never resized.
#[derive(Debug, Clone)]
pub struct Memory {
    cells: Box<[Cell]>,
}

impl Memory {
    pub fn new(slots: usize) -> Result<Self> {
        if slots == 0 || slots > MAX_SLOTS {
            return Err(VMError::Capacity { slots });
        }
        log::debug!("allocating memory: {slots} cells");
        Ok(Self {
            cells: vec![Cell::default(); slots].into_boxed_slice(),
        })
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Raw cell at `slot`, tags undecoded.
    #[inline]
    pub fn cell(&self, slot: Address) -> Result<&Cell> {
        self.cells.get(slot.index()).ok_or(VMError::OutOfRange {
            slot,
            capacity: self.cells.len(),
        })
    }

    #[inline]
    fn cell_mut(&mut self, slot: Address) -> Result<&mut Cell> {
        let capacity = self.cells.len();
        self.cells
            .get_mut(slot.index())
            .ok_or(VMError::OutOfRange { slot, capacity })
    }

    // ── Tags ───────────────────────────────────────────────────────

    pub fn head_type(&self, slot: Address) -> Result<Tag> {
        Ok(self.cell(slot)?.head_tag())
    }

    pub fn tail_type(&self, slot: Address) -> Result<Tag> {
        Ok(self.cell(slot)?.tail_tag())
    }

    // ── Typed reads ────────────────────────────────────────────────

    pub fn head_integer(&self, slot: Address) -> Result<u32> {
        let cell = self.cell(slot)?;
        check_tag(slot, Tag::Integer, cell.head_tag())?;
        Ok(cell.head)
    }

    pub fn tail_integer(&self, slot: Address) -> Result<u32> {
        let cell = self.cell(slot)?;
        check_tag(slot, Tag::Integer, cell.tail_tag())?;
        Ok(cell.tail)
    }

    pub fn head_pointer(&self, slot: Address) -> Result<Address> {
        let cell = self.cell(slot)?;
        check_tag(slot, Tag::Pointer, cell.head_tag())?;
        Ok(Address(cell.head))
    }

    pub fn tail_pointer(&self, slot: Address) -> Result<Address> {
        let cell = self.cell(slot)?;
        check_tag(slot, Tag::Pointer, cell.tail_tag())?;
        Ok(Address(cell.tail))
    }

    /// Whole head value. Fails only on the reserved tag.
    pub fn head(&self, slot: Address) -> Result<TaggedValue> {
        let cell = self.cell(slot)?;
        decode(slot, cell.head, cell.head_tag())
    }

    pub fn tail(&self, slot: Address) -> Result<TaggedValue> {
        let cell = self.cell(slot)?;
        decode(slot, cell.tail, cell.tail_tag())
    }

    pub fn free(&self, slot: Address) -> Result<u32> {
        Ok(self.cell(slot)?.free())
    }

    // ── Writes ─────────────────────────────────────────────────────

    pub fn set_head(&mut self, slot: Address, value: TaggedValue) -> Result<()> {
        self.cell_mut(slot)?.set_head(value);
        Ok(())
    }

    pub fn set_tail(&mut self, slot: Address, value: TaggedValue) -> Result<()> {
        self.cell_mut(slot)?.set_tail(value);
        Ok(())
    }

    pub fn set_cell(&mut self, slot: Address, head: TaggedValue, tail: TaggedValue) -> Result<()> {
        let cell = self.cell_mut(slot)?;
        cell.set_head(head);
        cell.set_tail(tail);
        Ok(())
    }

    /// Copies a raw `head, tail, tags, free` word image into the cells starting at slot 0.
    /// Tag words are taken verbatim. Returns the number of cells written.
    pub fn load_words(&mut self, words: &[u32]) -> Result<usize> {
        if words.len() % CELL_WORDS != 0 || words.len() / CELL_WORDS > self.cells.len() {
            return Err(VMError::MalformedImage { words: words.len() });
        }
        let mut count = 0;
        for (cell, chunk) in self.cells.iter_mut().zip(words.chunks_exact(CELL_WORDS)) {
            *cell = Cell::from_words([chunk[0], chunk[1], chunk[2], chunk[3]]);
            count += 1;
        }
        Ok(count)
    }

    /// The first `count` cells, clamped to capacity.
    pub fn cells(&self, count: usize) -> impl Iterator<Item = (Address, &Cell)> {
        self.cells
            .iter()
            .take(count)
            .enumerate()
            .map(|(index, cell)| (Address(index as u32), cell))
    }
}

#[inline(always)]
fn check_tag(slot: Address, expected: Tag, found: Tag) -> Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(VMError::TypeMismatch {
            slot: Some(slot),
            expected,
            found,
        })
    }
}

fn decode(slot: Address, payload: u32, tag: Tag) -> Result<TaggedValue> {
    TaggedValue::decode(payload, tag).ok_or(VMError::TypeMismatch {
        slot: Some(slot),
        // reserved has no value form
        expected: Tag::Empty,
        found: tag,
    })
}
