//! Tag: 2 bit type marker, empty/integer/pointer (one encoding is reserved)
//!
//! TaggedValue: payload + tag as a sum type, what the accessors hand out
//!
//! Address: a memory index, never a native pointer. Dereferencing goes through
//! `Memory`, which bounds-checks every access.
use std::fmt;

/// Width of one tag field in the packed tag word.
pub const TAG_BITS: u32 = 2;
pub const TAG_MASK: u32 = 0b11;
pub const HEAD_TAG_SHIFT: u32 = 0;
pub const TAIL_TAG_SHIFT: u32 = TAG_BITS;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Empty = 0b00,
    Integer = 0b01,
    Pointer = 0b10,
    Reserved = 0b11,
}

impl Tag {
    #[inline(always)]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & TAG_MASK {
            0b00 => Self::Empty,
            0b01 => Self::Integer,
            0b10 => Self::Pointer,
            _ => Self::Reserved,
        }
    }

    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Integer => "integer",
            Self::Pointer => "pointer",
            Self::Reserved => "reserved",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Packed tag word ────────────────────────────────────────────────

/// Layout of a cell's tag word:
///
/// ```text
/// bits 0‥1:  head tag
/// bits 2‥3:  tail tag
/// bits 4‥31: unused (preserved verbatim when loaded from an image)
/// ```
#[inline(always)]
pub const fn decode_tag(tags: u32, shift: u32) -> Tag {
    Tag::from_bits(tags >> shift)
}

/// Replaces the field at `shift` and leaves every other bit alone.
#[inline(always)]
pub const fn encode_tag(tags: u32, shift: u32, tag: Tag) -> u32 {
    (tags & !(TAG_MASK << shift)) | (tag.bits() << shift)
}

#[inline(always)]
pub const fn pack_tags(head: Tag, tail: Tag) -> u32 {
    (head.bits() << HEAD_TAG_SHIFT) | (tail.bits() << TAIL_TAG_SHIFT)
}

// ── Address ────────────────────────────────────────────────────────

/// Index of a cell in `Memory`.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub u32);

impl Address {
    pub const ENTRY: Self = Self(0);

    #[inline(always)]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

// ── TaggedValue ────────────────────────────────────────────────────

/// One side of a cell (or the register) with its tag resolved.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum TaggedValue {
    #[default]
    Empty,
    Integer(u32),
    Pointer(Address),
}

impl TaggedValue {
    #[inline(always)]
    pub const fn tag(self) -> Tag {
        match self {
            Self::Empty => Tag::Empty,
            Self::Integer(_) => Tag::Integer,
            Self::Pointer(_) => Tag::Pointer,
        }
    }

    /// Splits into the raw payload word and its tag. Empty encodes as zero.
    #[inline(always)]
    pub const fn encode(self) -> (u32, Tag) {
        match self {
            Self::Empty => (0, Tag::Empty),
            Self::Integer(value) => (value, Tag::Integer),
            Self::Pointer(address) => (address.raw(), Tag::Pointer),
        }
    }

    /// Returns `None` for the reserved tag, which has no value form.
    #[inline(always)]
    pub const fn decode(payload: u32, tag: Tag) -> Option<Self> {
        match tag {
            Tag::Empty => Some(Self::Empty),
            Tag::Integer => Some(Self::Integer(payload)),
            Tag::Pointer => Some(Self::Pointer(Address(payload))),
            Tag::Reserved => None,
        }
    }
}

impl fmt::Display for TaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Pointer(address) => write!(f, "→{}", address.raw()),
        }
    }
}
