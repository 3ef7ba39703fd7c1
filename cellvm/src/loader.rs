use crate::{CELL_WORDS, Memory, Result};

/// Firmware stub: one chain `100 → 150 → 200` starting at the entry cell.
///
/// Raw cell layout, four words per cell: head, tail, tags, free.
#[rustfmt::skip]
pub const BOOTSTRAP_IMAGE: [u32; 3 * CELL_WORDS] = [
    100, 1, 0b1001, 0,
    150, 2, 0b1001, 0,
    200, 0, 0b0001, 0,
];

/// Fills a zeroed `Memory` before the first dispatch.
///
/// Every chain reachable from the entry cell (and from anything an executor later
/// schedules) must have integer heads and pointer or empty tails.
pub trait Loader {
    fn load(&self, memory: &mut Memory) -> Result<()>;
}

impl<F> Loader for F
where
    F: Fn(&mut Memory) -> Result<()>,
{
    fn load(&self, memory: &mut Memory) -> Result<()> {
        self(memory)
    }
}

/// Copies a raw word image into memory starting at slot 0.
#[derive(Debug, Clone, Copy)]
pub struct ImageLoader<'a> {
    words: &'a [u32],
}

impl<'a> ImageLoader<'a> {
    pub const fn new(words: &'a [u32]) -> Self {
        Self { words }
    }

    pub const fn bootstrap() -> ImageLoader<'static> {
        ImageLoader::new(&BOOTSTRAP_IMAGE)
    }
}

impl Loader for ImageLoader<'_> {
    fn load(&self, memory: &mut Memory) -> Result<()> {
        let cells = memory.load_words(self.words)?;
        log::info!("loaded {cells} cells from image");
        Ok(())
    }
}
