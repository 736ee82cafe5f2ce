//! MDL MOL V2000 / SDF translation.
//!
//! An SDF file is a sequence of MOL blocks, each terminated by `$$$$`.
//! [`SdfBlocks`] iterates over those blocks; [`MolReader`] parses one
//! block into a [`Molecule`](crate::Molecule), with optional hooks
//! applied after the connection table, after the properties section and
//! after the data items. The ring-perception core never depends on this
//! module; it exists so molecules can be ingested from the common
//! interchange format.

mod error;
mod reader;

pub use error::MdlError;
pub use reader::{MolReader, ReaderHook};

use std::io::BufRead;

/// Separator line between molecules in an SDF file.
pub const MOL_DELIMITER: &str = "$$$$";

/// Iterates over the `$$$$`-terminated blocks of an SDF stream. Each
/// item is the block's lines, without the delimiter.
pub struct SdfBlocks<R: BufRead> {
    lines: std::io::Lines<R>,
    done: bool,
}

impl<R: BufRead> SdfBlocks<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for SdfBlocks<R> {
    type Item = std::io::Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut block = Vec::new();
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if line.trim_end().starts_with(MOL_DELIMITER) {
                        return Some(Ok(block));
                    }
                    block.push(line);
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    if block.iter().any(|l| !l.trim().is_empty()) {
                        return Some(Ok(block));
                    }
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn splits_blocks_on_delimiter() {
        let text = "a\nb\n$$$$\nc\n$$$$\n";
        let blocks: Vec<Vec<String>> = SdfBlocks::new(Cursor::new(text))
            .map(|b| b.unwrap())
            .collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], vec!["a", "b"]);
        assert_eq!(blocks[1], vec!["c"]);
    }

    #[test]
    fn final_block_without_delimiter() {
        let text = "a\nb\n";
        let blocks: Vec<Vec<String>> = SdfBlocks::new(Cursor::new(text))
            .map(|b| b.unwrap())
            .collect();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn trailing_whitespace_only_is_no_block() {
        let text = "a\n$$$$\n\n  \n";
        let blocks: Vec<Vec<String>> = SdfBlocks::new(Cursor::new(text))
            .map(|b| b.unwrap())
            .collect();
        assert_eq!(blocks.len(), 1);
    }
}
