use crate::{Address, HEAD_TAG_SHIFT, Result, Tag, TaggedValue, VMError, decode_tag, encode_tag};

/// Scratch slot outside of `Memory`, laid out like one side of a cell.
///
/// ```text
/// word 0: payload
/// word 1: tags  [value:2] [unused:30]
/// ```
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Register {
    bits: u32,
    tags: u32,
}

impl Register {
    pub const fn new() -> Self {
        Self { bits: 0, tags: 0 }
    }

    #[inline(always)]
    pub const fn tag(&self) -> Tag {
        decode_tag(self.tags, HEAD_TAG_SHIFT)
    }

    pub fn get_integer(&self) -> Result<u32> {
        self.check_tag(Tag::Integer)?;
        Ok(self.bits)
    }

    pub fn get_pointer(&self) -> Result<Address> {
        self.check_tag(Tag::Pointer)?;
        Ok(Address(self.bits))
    }

    /// Overwrites whatever was held before.
    pub fn set_integer(&mut self, value: u32) {
        self.set(TaggedValue::Integer(value));
    }

    pub fn set_pointer(&mut self, address: Address) {
        self.set(TaggedValue::Pointer(address));
    }

    pub fn value(&self) -> Result<TaggedValue> {
        TaggedValue::decode(self.bits, self.tag()).ok_or(VMError::TypeMismatch {
            slot: None,
            expected: Tag::Empty,
            found: self.tag(),
        })
    }

    pub fn set(&mut self, value: TaggedValue) {
        let (payload, tag) = value.encode();
        self.bits = payload;
        self.tags = encode_tag(self.tags, HEAD_TAG_SHIFT, tag);
    }

    pub fn clear(&mut self) {
        self.set(TaggedValue::Empty);
    }

    #[inline(always)]
    fn check_tag(&self, expected: Tag) -> Result<()> {
        let found = self.tag();
        if found == expected {
            Ok(())
        } else {
            Err(VMError::TypeMismatch {
                slot: None,
                expected,
                found,
            })
        }
    }
}
