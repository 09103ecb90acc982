use egui::{Color32, Modifiers};
use uuid::Uuid;

use super::markup::{parse_markup, to_markup};
use super::{Cursor, Document, FontMetricsTable, Selection, StyleEvent, StyleState, TextPosition, TextStyle};
use crate::command::HistoryStack;
use crate::config::Settings;
use crate::error::TextError;
use crate::event::{EditorEvent, EventBus, EventHandler, SubscriptionId};

/// Document plus caret, as stored in the text history
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub document: Document,
    pub caret: TextPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretMove {
    Left,
    Right,
    Home,
    End,
}

/// Keystrokes the composer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    SelectAll,
}

impl KeyInput {
    /// Maps a non-text egui key; printable input arrives as text events
    pub fn from_key(key: egui::Key) -> Option<Self> {
        match key {
            egui::Key::Enter => Some(KeyInput::Enter),
            egui::Key::Backspace => Some(KeyInput::Backspace),
            egui::Key::Delete => Some(KeyInput::Delete),
            egui::Key::ArrowLeft => Some(KeyInput::Left),
            egui::Key::ArrowRight => Some(KeyInput::Right),
            egui::Key::Home => Some(KeyInput::Home),
            egui::Key::End => Some(KeyInput::End),
            _ => None,
        }
    }

    /// Maps editing shortcuts such as Ctrl/Cmd+A
    pub fn from_shortcut(key: egui::Key, modifiers: Modifiers) -> Option<Self> {
        match key {
            egui::Key::A if modifiers.command => Some(KeyInput::SelectAll),
            _ => None,
        }
    }
}

/// Inserts `text` at `pos`, turning `\n` into block breaks. Returns the
/// position after the inserted text.
fn insert_lines(
    document: &mut Document,
    mut pos: TextPosition,
    text: &str,
    style: &TextStyle,
) -> Result<TextPosition, TextError> {
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            pos = document.split_block(pos)?;
        }
        pos = document.insert(pos, line, style)?;
    }
    Ok(pos)
}

/// Turns keystrokes and style changes into edits of a styled [`Document`].
///
/// Each character is stamped with the style current at the moment it is
/// typed; later style changes never alter text already in the document.
#[derive(Debug)]
pub struct TextComposer {
    id: Uuid,
    style: StyleState,
    document: Document,
    caret: TextPosition,
    anchor: Option<TextPosition>,
    history: HistoryStack<DocumentSnapshot>,
    metrics: FontMetricsTable,
    event_bus: EventBus,
}

impl Default for TextComposer {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl TextComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let style = TextStyle {
            font_family: settings.font_family.clone(),
            color: settings.ink,
            ..TextStyle::default()
        };
        let mut composer = Self {
            id: Uuid::new_v4(),
            style: StyleState::new(style),
            document: Document::new(),
            caret: TextPosition::default(),
            anchor: None,
            history: HistoryStack::new(settings.history_capacity),
            metrics: FontMetricsTable::with_overrides(&settings.font_metrics),
            event_bus: EventBus::new(),
        };
        composer.history.push(composer.snapshot());
        log::info!("text composer {} ready", composer.id);
        composer
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn style(&self) -> &StyleState {
        &self.style
    }

    pub fn metrics(&self) -> &FontMetricsTable {
        &self.metrics
    }

    pub fn caret(&self) -> TextPosition {
        self.caret
    }

    /// Run-level view of the caret
    pub fn cursor(&self) -> Cursor {
        // The caret is kept valid by every edit
        self.document.cursor(self.caret).unwrap_or(Cursor {
            block: self.caret.block,
            run: None,
            offset: 0,
        })
    }

    /// The non-empty selection, if any
    pub fn selection(&self) -> Option<Selection> {
        self.anchor
            .map(|anchor| Selection::new(anchor, self.caret))
            .filter(|selection| !selection.is_collapsed())
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) -> SubscriptionId {
        self.event_bus.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.event_bus.unsubscribe(id)
    }

    /// Applies a style change for text typed from now on
    pub fn apply_style_event(&mut self, event: StyleEvent) -> bool {
        let changed = self.style.apply(event);
        if changed {
            log::debug!("composer {}: style now {:?}", self.id, self.style.current());
            self.event_bus
                .emit(EditorEvent::StyleChanged(self.style.snapshot()));
        }
        changed
    }

    pub fn set_color(&mut self, color: Color32) -> bool {
        self.apply_style_event(StyleEvent::SetColor(color))
    }

    pub fn set_caret(&mut self, pos: TextPosition) -> Result<(), TextError> {
        self.document.validate(pos)?;
        self.caret = pos;
        self.anchor = None;
        Ok(())
    }

    /// Selects from `anchor` to `head`; the caret ends at `head`
    pub fn select(&mut self, anchor: TextPosition, head: TextPosition) -> Result<(), TextError> {
        self.document.validate(anchor)?;
        self.document.validate(head)?;
        self.anchor = Some(anchor);
        self.caret = head;
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.anchor = Some(self.document.start());
        self.caret = self.document.end();
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    /// Types one character, replacing any selection. `\n` is a line break.
    pub fn insert_char(&mut self, c: char) -> Result<(), TextError> {
        if c == '\n' {
            return self.line_break();
        }
        self.delete_selection()?;
        let mut buf = [0; 4];
        let style = self.style.snapshot();
        self.caret = self.document.insert(self.caret, c.encode_utf8(&mut buf), &style)?;
        self.commit();
        Ok(())
    }

    /// Pastes plain text as one edit
    pub fn insert_text(&mut self, text: &str) -> Result<(), TextError> {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        if text.is_empty() {
            return Ok(());
        }
        self.delete_selection()?;
        let style = self.style.snapshot();
        self.caret = insert_lines(&mut self.document, self.caret, &text, &style)?;
        self.commit();
        Ok(())
    }

    /// Ends the current block; the next character starts a fresh run
    pub fn line_break(&mut self) -> Result<(), TextError> {
        self.delete_selection()?;
        self.caret = self.document.split_block(self.caret)?;
        self.commit();
        Ok(())
    }

    /// Deletes the selection or the character before the caret. Returns
    /// false when there was nothing to delete.
    pub fn backspace(&mut self) -> Result<bool, TextError> {
        if self.delete_selection()? {
            self.commit();
            return Ok(true);
        }
        let TextPosition { block, offset } = self.caret;
        if offset > 0 {
            let start = TextPosition::new(block, offset - 1);
            self.document.delete_range(start, self.caret)?;
            self.caret = start;
        } else if block > 0 {
            let joined = TextPosition::new(block - 1, self.block_len(block - 1));
            self.document.merge_with_next(block - 1);
            self.caret = joined;
        } else {
            return Ok(false);
        }
        self.commit();
        Ok(true)
    }

    /// Deletes the selection or the character after the caret
    pub fn delete_forward(&mut self) -> Result<bool, TextError> {
        if self.delete_selection()? {
            self.commit();
            return Ok(true);
        }
        let TextPosition { block, offset } = self.caret;
        if offset < self.block_len(block) {
            self.document
                .delete_range(self.caret, TextPosition::new(block, offset + 1))?;
        } else if !self.document.merge_with_next(block) {
            return Ok(false);
        }
        self.commit();
        Ok(true)
    }

    /// Moves the caret and collapses the selection
    pub fn move_caret(&mut self, movement: CaretMove) {
        self.caret = self.moved_caret(movement);
        self.anchor = None;
    }

    /// Moves the caret while the anchor stays put, growing or shrinking the
    /// selection
    pub fn extend_selection(&mut self, movement: CaretMove) {
        let anchor = self.anchor.unwrap_or(self.caret);
        self.caret = self.moved_caret(movement);
        self.anchor = Some(anchor);
    }

    /// Plain text of the selection, blocks joined by `\n`
    pub fn selected_text(&self) -> Option<String> {
        let (start, end) = self.selection()?.ordered();
        self.document.text_in(start, end).ok()
    }

    fn moved_caret(&self, movement: CaretMove) -> TextPosition {
        let TextPosition { block, offset } = self.caret;
        let len = self.block_len(block);
        match movement {
            CaretMove::Left if offset > 0 => TextPosition::new(block, offset - 1),
            CaretMove::Left if block > 0 => TextPosition::new(block - 1, self.block_len(block - 1)),
            CaretMove::Right if offset < len => TextPosition::new(block, offset + 1),
            CaretMove::Right if block + 1 < self.document.block_count() => TextPosition::new(block + 1, 0),
            CaretMove::Home => TextPosition::new(block, 0),
            CaretMove::End => TextPosition::new(block, len),
            _ => self.caret,
        }
    }

    /// Handles one keystroke. Characters typed with Ctrl, Alt or Command
    /// held are left to shortcuts, and Shift with a movement key extends the
    /// selection. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: KeyInput, modifiers: Modifiers) -> Result<bool, TextError> {
        let movement = match key {
            KeyInput::Left => Some(CaretMove::Left),
            KeyInput::Right => Some(CaretMove::Right),
            KeyInput::Home => Some(CaretMove::Home),
            KeyInput::End => Some(CaretMove::End),
            _ => None,
        };
        if let Some(movement) = movement {
            if modifiers.shift {
                self.extend_selection(movement);
            } else {
                self.move_caret(movement);
            }
            return Ok(true);
        }

        match key {
            KeyInput::Char(_) if modifiers.ctrl || modifiers.alt || modifiers.command || modifiers.mac_cmd => {
                Ok(false)
            }
            KeyInput::Char(c) if c.is_control() && c != '\n' => Ok(false),
            KeyInput::Char(c) => self.insert_char(c).map(|()| true),
            KeyInput::Enter => self.line_break().map(|()| true),
            KeyInput::Backspace => self.backspace(),
            KeyInput::Delete => self.delete_forward(),
            KeyInput::SelectAll => {
                self.select_all();
                Ok(true)
            }
            // Movement keys were handled above
            KeyInput::Left | KeyInput::Right | KeyInput::Home | KeyInput::End => Ok(true),
        }
    }

    /// Gives the selected text the current style.
    ///
    /// A selection inside one block is restyled in place. One that spans
    /// blocks is extracted, deleted and reinserted with the style instead.
    /// The edit is built on a copy, so a failure leaves the document as it
    /// was.
    pub fn apply_style_to_selection(&mut self) -> Result<bool, TextError> {
        let Some(selection) = self.selection() else {
            return Ok(false);
        };
        let (start, end) = selection.ordered();
        let style = self.style.snapshot();
        let mut draft = self.document.clone();

        match draft.restyle_range(start, end, &style) {
            Ok(()) => {}
            Err(TextError::CannotIsolate { start_block, end_block }) => {
                log::debug!(
                    "composer {}: blocks {start_block}..{end_block} restyled by extract and reinsert",
                    self.id
                );
                let text = draft.text_in(start, end)?;
                draft.delete_range(start, end)?;
                insert_lines(&mut draft, start, &text, &style)?;
            }
            Err(err) => return Err(err),
        }

        self.document = draft;
        self.commit();
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo() else {
            return false;
        };
        let step = entry.step();
        let snapshot = entry.snapshot().clone();
        self.restore(snapshot, step);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo() else {
            return false;
        };
        let step = entry.step();
        let snapshot = entry.snapshot().clone();
        self.restore(snapshot, step);
        true
    }

    /// Styled markup for the export pipeline
    pub fn to_markup(&self) -> String {
        to_markup(&self.document, &self.metrics)
    }

    /// Replaces the document with parsed markup, as one undoable edit
    pub fn load_markup(&mut self, markup: &str) -> Result<(), TextError> {
        self.document = parse_markup(markup)?;
        self.caret = self.document.end();
        self.anchor = None;
        self.commit();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.document = Document::new();
        self.caret = TextPosition::default();
        self.anchor = None;
        self.commit();
    }

    fn block_len(&self, block: usize) -> usize {
        self.document.block(block).map_or(0, |b| b.char_len())
    }

    /// Removes a non-empty selection and puts the caret at its start
    fn delete_selection(&mut self) -> Result<bool, TextError> {
        let Some(selection) = self.selection() else {
            self.anchor = None;
            return Ok(false);
        };
        let (start, end) = selection.ordered();
        self.document.delete_range(start, end)?;
        self.caret = start;
        self.anchor = None;
        Ok(true)
    }

    fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            document: self.document.clone(),
            caret: self.caret,
        }
    }

    fn commit(&mut self) {
        let step = self.history.push(self.snapshot());
        let blocks = self.document.block_count();
        log::trace!("composer {}: committed step {step}", self.id);
        self.event_bus
            .emit(EditorEvent::DocumentChanged { step, blocks });
    }

    fn restore(&mut self, snapshot: DocumentSnapshot, step: u64) {
        self.document = snapshot.document;
        self.caret = snapshot.caret;
        self.anchor = None;
        log::debug!("composer {}: restored step {step}", self.id);
        self.event_bus.emit(EditorEvent::HistoryRestored { step });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(composer: &mut TextComposer, text: &str) {
        for c in text.chars() {
            composer.insert_char(c).unwrap();
        }
    }

    #[test]
    fn test_typing_merges_into_one_run() {
        let mut composer = TextComposer::new();
        type_str(&mut composer, "hello");
        let block = &composer.document().blocks()[0];
        assert_eq!(block.runs().len(), 1);
        assert_eq!(composer.cursor(), Cursor { block: 0, run: Some(0), offset: 5 });
    }

    #[test]
    fn test_line_break_starts_fresh_run() {
        let mut composer = TextComposer::new();
        type_str(&mut composer, "ab\ncd");
        assert_eq!(composer.document().block_count(), 2);
        assert_eq!(composer.document().text(), "ab\ncd");
        assert_eq!(composer.caret(), TextPosition::new(1, 2));
    }

    #[test]
    fn test_backspace_joins_blocks() {
        let mut composer = TextComposer::new();
        type_str(&mut composer, "ab\ncd");
        composer.move_caret(CaretMove::Home);
        assert!(composer.backspace().unwrap());
        assert_eq!(composer.document().text(), "abcd");
        assert_eq!(composer.caret(), TextPosition::new(0, 2));
        assert_eq!(composer.document().blocks()[0].runs().len(), 1);
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut composer = TextComposer::new();
        assert!(!composer.backspace().unwrap());
        assert!(!composer.delete_forward().unwrap());
        assert!(!composer.can_undo());
    }

    #[test]
    fn test_modified_chars_are_ignored() {
        let mut composer = TextComposer::new();
        assert!(!composer.handle_key(KeyInput::Char('z'), Modifiers::CTRL).unwrap());
        assert!(!composer.handle_key(KeyInput::Char('z'), Modifiers::ALT).unwrap());
        assert!(composer.handle_key(KeyInput::Char('Z'), Modifiers::SHIFT).unwrap());
        assert_eq!(composer.document().text(), "Z");
    }

    #[test]
    fn test_caret_wraps_between_blocks() {
        let mut composer = TextComposer::new();
        type_str(&mut composer, "a\nb");
        composer.move_caret(CaretMove::Home);
        composer.move_caret(CaretMove::Left);
        assert_eq!(composer.caret(), TextPosition::new(0, 1));
        composer.move_caret(CaretMove::Right);
        assert_eq!(composer.caret(), TextPosition::new(1, 0));
    }
}
