use serde::{Deserialize, Serialize};

use super::TextStyle;
use crate::error::TextError;

/// Byte index of the `offset`-th char, or the string length past the end
fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices().nth(offset).map_or(text.len(), |(index, _)| index)
}

/// A maximal span of text sharing one explicit style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    text: String,
    style: TextStyle,
}

impl Run {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One line of the document.
///
/// After every structural edit the runs are normalised: empty runs are
/// dropped and neighbours with equal styles are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    runs: Vec<Run>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_runs(runs: impl IntoIterator<Item = Run>) -> Self {
        let mut block = Self::new();
        for run in runs {
            block.push_run(run);
        }
        block
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn char_len(&self) -> usize {
        self.runs.iter().map(Run::char_len).sum()
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }

    /// Run index and offset within it for a block offset. At a boundary the
    /// end of the preceding run wins. `None` for an empty block or an offset
    /// past the end.
    pub fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (index, run) in self.runs.iter().enumerate() {
            let len = run.char_len();
            if offset <= start + len {
                return Some((index, offset - start));
            }
            start += len;
        }
        None
    }

    /// Block offset of `offset` chars into run `run`
    pub fn offset_of(&self, run: usize, offset: usize) -> usize {
        self.runs[..run.min(self.runs.len())]
            .iter()
            .map(Run::char_len)
            .sum::<usize>()
            + offset
    }

    /// Appends `run`, merging it into the last run when the styles match
    pub fn push_run(&mut self, run: Run) {
        if run.text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.style == run.style => last.text.push_str(&run.text),
            _ => self.runs.push(run),
        }
    }

    pub fn normalize(&mut self) {
        let runs = std::mem::take(&mut self.runs);
        for run in runs {
            self.push_run(run);
        }
    }

    /// Inserts `text` at `offset` with `style`.
    ///
    /// At the end of a run with the same style the text is appended to that
    /// run. Otherwise the run under the offset is split, a new run goes
    /// between the halves, and the block is normalised.
    pub fn insert(&mut self, offset: usize, text: &str, style: &TextStyle) {
        debug_assert!(!text.contains('\n'), "line breaks split blocks");
        if text.is_empty() {
            return;
        }
        match self.locate(offset) {
            // Typing at the end of a matching run
            Some((run, at)) if at == self.runs[run].char_len() && self.runs[run].style == *style => {
                self.runs[run].text.push_str(text);
            }
            _ => {
                let index = self.split_at(offset);
                self.runs.insert(index, Run::new(text, style.clone()));
                self.normalize();
            }
        }
    }

    /// Ensures a run boundary at `offset` and returns the index of the first
    /// run starting there (the run count when `offset` is at the end)
    pub fn split_at(&mut self, offset: usize) -> usize {
        let mut start = 0;
        for index in 0..self.runs.len() {
            if offset <= start {
                return index;
            }
            let len = self.runs[index].char_len();
            // Offset falls inside this run
            if offset < start + len {
                let run = &mut self.runs[index];
                let at = byte_index(&run.text, offset - start);
                let tail = run.text.split_off(at);
                let style = run.style.clone();
                self.runs.insert(index + 1, Run::new(tail, style));
                return index + 1;
            }
            start += len;
        }
        self.runs.len()
    }

    /// Removes the chars in `start..end` and returns the removed runs
    pub fn remove_range(&mut self, start: usize, end: usize) -> Vec<Run> {
        if start >= end {
            return Vec::new();
        }
        // Cut at both ends so whole runs can be drained
        let first = self.split_at(start);
        let last = self.split_at(end);
        let removed = self.runs.drain(first..last).collect();
        self.normalize();
        removed
    }

    /// Gives every char in `start..end` the style `style`
    pub fn restyle_range(&mut self, start: usize, end: usize, style: &TextStyle) {
        if start >= end {
            return;
        }
        let first = self.split_at(start);
        let last = self.split_at(end);
        for run in &mut self.runs[first..last] {
            run.style = style.clone();
        }
        self.normalize();
    }

    /// Plain text of `start..end`
    pub fn slice_text(&self, start: usize, end: usize) -> String {
        self.text().chars().skip(start).take(end.saturating_sub(start)).collect()
    }

    /// Splits the block at `offset`, keeping the head and returning the tail
    pub fn split_off(&mut self, offset: usize) -> Block {
        let index = self.split_at(offset);
        let tail = Block {
            runs: self.runs.split_off(index),
        };
        self.normalize();
        tail
    }

    pub fn append(&mut self, other: Block) {
        for run in other.runs {
            self.push_run(run);
        }
    }
}

/// A caret or selection end: block index and char offset within the block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextPosition {
    pub block: usize,
    pub offset: usize,
}

impl TextPosition {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// Run-level view of a position. `run` is `None` in an empty block, so the
/// next character always starts a fresh run there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub block: usize,
    pub run: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: TextPosition,
    pub head: TextPosition,
}

impl Selection {
    pub fn new(anchor: TextPosition, head: TextPosition) -> Self {
        Self { anchor, head }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// `(start, end)` in document order
    pub fn ordered(&self) -> (TextPosition, TextPosition) {
        if self.anchor <= self.head {
            (self.anchor, self.head)
        } else {
            (self.head, self.anchor)
        }
    }
}

/// Ordered blocks of styled runs. Always holds at least one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            blocks: vec![Block::new()],
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut blocks: Vec<Block> = blocks.into_iter().collect();
        for block in &mut blocks {
            block.normalize();
        }
        if blocks.is_empty() {
            blocks.push(Block::new());
        }
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Block::is_empty)
    }

    /// Plain text with blocks joined by `\n`
    pub fn text(&self) -> String {
        self.blocks.iter().map(Block::text).collect::<Vec<_>>().join("\n")
    }

    pub fn start(&self) -> TextPosition {
        TextPosition::new(0, 0)
    }

    pub fn end(&self) -> TextPosition {
        let block = self.blocks.len() - 1;
        TextPosition::new(block, self.blocks[block].char_len())
    }

    pub fn validate(&self, pos: TextPosition) -> Result<(), TextError> {
        match self.blocks.get(pos.block) {
            Some(block) if pos.offset <= block.char_len() => Ok(()),
            _ => Err(TextError::PositionOutOfRange {
                block: pos.block,
                offset: pos.offset,
            }),
        }
    }

    pub fn cursor(&self, pos: TextPosition) -> Result<Cursor, TextError> {
        self.validate(pos)?;
        let located = self.blocks[pos.block].locate(pos.offset);
        Ok(Cursor {
            block: pos.block,
            run: located.map(|(run, _)| run),
            offset: located.map_or(0, |(_, offset)| offset),
        })
    }

    /// Inserts single-line `text` and returns the position after it. Line
    /// breaks go through [`Self::split_block`].
    pub fn insert(&mut self, pos: TextPosition, text: &str, style: &TextStyle) -> Result<TextPosition, TextError> {
        if text.contains('\n') {
            return Err(TextError::LineBreakInText);
        }
        self.validate(pos)?;
        self.blocks[pos.block].insert(pos.offset, text, style);
        Ok(TextPosition::new(pos.block, pos.offset + text.chars().count()))
    }

    /// Ends the block at `pos` and returns the start of the new block
    pub fn split_block(&mut self, pos: TextPosition) -> Result<TextPosition, TextError> {
        self.validate(pos)?;
        let tail = self.blocks[pos.block].split_off(pos.offset);
        self.blocks.insert(pos.block + 1, tail);
        Ok(TextPosition::new(pos.block + 1, 0))
    }

    /// Removes everything between `start` and `end`, joining the blocks at
    /// either side when the range crosses line breaks
    pub fn delete_range(&mut self, start: TextPosition, end: TextPosition) -> Result<(), TextError> {
        self.validate(start)?;
        self.validate(end)?;
        let (start, end) = if start <= end { (start, end) } else { (end, start) };

        if start.block == end.block {
            self.blocks[start.block].remove_range(start.offset, end.offset);
            return Ok(());
        }

        // Keep the head of the first block and the tail of the last
        let head = &mut self.blocks[start.block];
        let head_len = head.char_len();
        head.remove_range(start.offset, head_len);
        let tail = self.blocks[end.block].split_off(end.offset);
        self.blocks.drain(start.block + 1..=end.block);
        self.blocks[start.block].append(tail);
        Ok(())
    }

    /// Restyles `start..end` in place. Fails with
    /// [`TextError::CannotIsolate`] when the range crosses blocks.
    pub fn restyle_range(&mut self, start: TextPosition, end: TextPosition, style: &TextStyle) -> Result<(), TextError> {
        self.validate(start)?;
        self.validate(end)?;
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        if start.block != end.block {
            return Err(TextError::CannotIsolate {
                start_block: start.block,
                end_block: end.block,
            });
        }
        self.blocks[start.block].restyle_range(start.offset, end.offset, style);
        Ok(())
    }

    /// Plain text of the range, with `\n` between blocks
    pub fn text_in(&self, start: TextPosition, end: TextPosition) -> Result<String, TextError> {
        self.validate(start)?;
        self.validate(end)?;
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        if start.block == end.block {
            return Ok(self.blocks[start.block].slice_text(start.offset, end.offset));
        }

        // Spans blocks
        let mut text = self.blocks[start.block].slice_text(start.offset, usize::MAX);
        for block in &self.blocks[start.block + 1..end.block] {
            text.push('\n');
            text.push_str(&block.text());
        }
        text.push('\n');
        text.push_str(&self.blocks[end.block].slice_text(0, end.offset));
        Ok(text)
    }

    /// Removes `\n` between `block` and the next block
    pub fn merge_with_next(&mut self, block: usize) -> bool {
        if block + 1 >= self.blocks.len() {
            return false;
        }
        let next = self.blocks.remove(block + 1);
        self.blocks[block].append(next);
        true
    }
}
