use egui::{Color32, Modifiers};
use penpage::event::{EditorEvent, EventLog};
use penpage::text::{
    Block, CaretMove, KeyInput, Run, StyleEvent, TextPosition, parse_markup,
};
use penpage::{TextComposer, TextError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn type_str(composer: &mut TextComposer, text: &str) {
    for c in text.chars() {
        composer.insert_char(c).unwrap();
    }
}

fn runs_of(block: &Block) -> Vec<(String, Color32)> {
    block
        .runs()
        .iter()
        .map(|run| (run.text().to_owned(), run.style().color))
        .collect()
}

fn assert_merge_invariant(composer: &TextComposer) {
    for block in composer.document().blocks() {
        for run in block.runs() {
            assert!(!run.text().is_empty(), "empty run retained");
        }
        for pair in block.runs().windows(2) {
            assert_ne!(pair[0].style(), pair[1].style(), "adjacent runs share a style");
        }
    }
}

#[test]
fn test_color_change_isolates_runs() {
    let mut composer = TextComposer::new();
    let x = Color32::from_rgb(0x00, 0x0f, 0x55);
    let y = Color32::from_rgb(0xc0, 0x10, 0x10);

    type_str(&mut composer, "ab");
    composer.set_color(y);
    type_str(&mut composer, "cd");

    assert_eq!(
        runs_of(&composer.document().blocks()[0]),
        vec![("ab".to_owned(), x), ("cd".to_owned(), y)]
    );

    // Later style changes do not touch committed text
    composer.set_color(Color32::GREEN);
    composer.apply_style_event(StyleEvent::ToggleBold);
    assert_eq!(
        runs_of(&composer.document().blocks()[0]),
        vec![("ab".to_owned(), x), ("cd".to_owned(), y)]
    );
}

#[test]
fn test_typing_back_into_previous_style_merges() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "ab");
    composer.apply_style_event(StyleEvent::ToggleItalic);
    composer.apply_style_event(StyleEvent::ToggleItalic);
    type_str(&mut composer, "cd");
    assert_eq!(composer.document().blocks()[0].runs().len(), 1);
}

#[test]
fn test_insert_inside_run_splits_and_restores() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "abcd");
    composer.set_caret(TextPosition::new(0, 2)).unwrap();
    composer.apply_style_event(StyleEvent::ToggleUnderline);
    composer.insert_char('X').unwrap();

    let block = &composer.document().blocks()[0];
    let texts: Vec<_> = block.runs().iter().map(Run::text).collect();
    assert_eq!(texts, ["ab", "X", "cd"]);
    assert!(block.runs()[1].style().underline);
    assert!(!block.runs()[2].style().underline);
    assert_eq!(composer.caret(), TextPosition::new(0, 3));
}

#[test]
fn test_deleting_selection_remerges_runs() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "ab");
    composer.apply_style_event(StyleEvent::ToggleBold);
    type_str(&mut composer, "X");
    composer.apply_style_event(StyleEvent::ToggleBold);
    type_str(&mut composer, "cd");
    assert_eq!(composer.document().blocks()[0].runs().len(), 3);

    composer
        .select(TextPosition::new(0, 2), TextPosition::new(0, 3))
        .unwrap();
    assert!(composer.backspace().unwrap());

    let block = &composer.document().blocks()[0];
    assert_eq!(block.runs().len(), 1);
    assert_eq!(block.text(), "abcd");
    assert_eq!(composer.caret(), TextPosition::new(0, 2));
}

#[test]
fn test_typing_replaces_selection() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "hello world");
    composer
        .select(TextPosition::new(0, 11), TextPosition::new(0, 6))
        .unwrap();
    type_str(&mut composer, "there");
    assert_eq!(composer.document().text(), "hello there");
}

#[test]
fn test_restyle_selection_within_block() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "abcdef");
    composer
        .select(TextPosition::new(0, 2), TextPosition::new(0, 4))
        .unwrap();
    composer.set_color(Color32::RED);
    assert!(composer.apply_style_to_selection().unwrap());

    let runs = runs_of(&composer.document().blocks()[0]);
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[1], ("cd".to_owned(), Color32::RED));
    let selected = composer.selection().map(|s| s.ordered());
    assert_eq!(selected, Some((TextPosition::new(0, 2), TextPosition::new(0, 4))));
}

#[test]
fn test_restyle_across_blocks_falls_back_to_reinsert() {
    let mut composer = TextComposer::new();
    let ink = composer.style().current().color;
    type_str(&mut composer, "ab\ncd");
    composer
        .select(TextPosition::new(0, 1), TextPosition::new(1, 1))
        .unwrap();
    composer.set_color(Color32::RED);
    assert!(composer.apply_style_to_selection().unwrap());

    let document = composer.document();
    assert_eq!(document.text(), "ab\ncd");
    assert_eq!(
        runs_of(&document.blocks()[0]),
        vec![("a".to_owned(), ink), ("b".to_owned(), Color32::RED)]
    );
    assert_eq!(
        runs_of(&document.blocks()[1]),
        vec![("c".to_owned(), Color32::RED), ("d".to_owned(), ink)]
    );
    assert_merge_invariant(&composer);
}

#[test]
fn test_no_selection_means_no_restyle() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "ab");
    assert!(!composer.apply_style_to_selection().unwrap());
}

#[test]
fn test_consecutive_spaces_survive_markup() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "a   b");
    let markup = composer.to_markup();
    assert!(markup.contains("a &nbsp;&nbsp;b"));
    assert_eq!(&parse_markup(&markup).unwrap(), composer.document());
}

#[test]
fn test_random_session_keeps_invariants_and_round_trips() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut composer = TextComposer::new();
    let colors = [
        Color32::RED,
        Color32::BLUE,
        Color32::from_rgb(0x00, 0x0f, 0x55),
        Color32::from_rgba_unmultiplied(255, 0, 0, 128),
        Color32::from_rgba_premultiplied(200, 10, 90, 128),
        Color32::from_rgba_unmultiplied(12, 200, 77, 3),
    ];

    for _ in 0..400 {
        match rng.random_range(0..10) {
            0..=3 => {
                let chars = [' ', 'a', 'b', 'é', '&', '<'];
                composer.insert_char(chars[rng.random_range(0..chars.len())]).unwrap();
            }
            4 => {
                composer.set_color(colors[rng.random_range(0..colors.len())]);
            }
            5 => {
                let event = match rng.random_range(0..3) {
                    0 => StyleEvent::ToggleBold,
                    1 => StyleEvent::ToggleItalic,
                    _ => StyleEvent::ToggleUnderline,
                };
                composer.apply_style_event(event);
            }
            6 => {
                let movement = match rng.random_range(0..4) {
                    0 => CaretMove::Left,
                    1 => CaretMove::Right,
                    2 => CaretMove::Home,
                    _ => CaretMove::End,
                };
                composer.move_caret(movement);
            }
            7 => {
                composer.backspace().unwrap();
            }
            8 => {
                if rng.random_range(0..4) == 0 {
                    composer.line_break().unwrap();
                } else {
                    composer.delete_forward().unwrap();
                }
            }
            _ => {
                // Edit through a live selection between two random positions
                let mut random_position = |composer: &TextComposer| {
                    let blocks = composer.document().blocks();
                    let block = rng.random_range(0..blocks.len());
                    let offset = rng.random_range(0..=blocks[block].char_len());
                    TextPosition::new(block, offset)
                };
                let anchor = random_position(&composer);
                let head = random_position(&composer);
                composer.select(anchor, head).unwrap();

                let selected = composer.selected_text();
                let before = composer.document().text().chars().count();
                match rng.random_range(0..3) {
                    0 => {
                        composer.insert_char('a').unwrap();
                    }
                    1 => {
                        composer.backspace().unwrap();
                    }
                    _ => {
                        composer.set_color(colors[rng.random_range(0..colors.len())]);
                        let restyled = composer.apply_style_to_selection().unwrap();
                        assert_eq!(restyled, selected.is_some());
                        assert_eq!(composer.document().text().chars().count(), before);
                    }
                }
                if let Some(selected) = selected {
                    assert!(composer.selection().is_none() || composer.selected_text() == Some(selected));
                }
            }
        }
        assert_merge_invariant(&composer);
    }

    let markup = composer.to_markup();
    let parsed = parse_markup(&markup).unwrap();
    assert_eq!(&parsed, composer.document());

    let mut reloaded = TextComposer::new();
    reloaded.load_markup(&markup).unwrap();
    assert_eq!(reloaded.to_markup(), markup);
}

#[test]
fn test_paste_splits_lines_as_one_edit() {
    let mut composer = TextComposer::new();
    composer.insert_text("one\r\ntwo\nthree").unwrap();
    assert_eq!(composer.document().block_count(), 3);
    assert_eq!(composer.caret(), TextPosition::new(2, 5));

    assert!(composer.undo());
    assert!(composer.document().is_empty());
    assert!(composer.redo());
    assert_eq!(composer.document().text(), "one\ntwo\nthree");
}

#[test]
fn test_key_translation() {
    let mut composer = TextComposer::new();
    for key in [KeyInput::Char('a'), KeyInput::Char('b'), KeyInput::Enter, KeyInput::Char('c')] {
        assert!(composer.handle_key(key, Modifiers::NONE).unwrap());
    }
    assert!(!composer.handle_key(KeyInput::Char('v'), Modifiers::COMMAND).unwrap());
    assert_eq!(composer.document().text(), "ab\nc");

    composer.handle_key(KeyInput::Left, Modifiers::NONE).unwrap();
    composer.handle_key(KeyInput::Backspace, Modifiers::NONE).unwrap();
    assert_eq!(composer.document().text(), "abc");
    composer.handle_key(KeyInput::Home, Modifiers::NONE).unwrap();
    composer.handle_key(KeyInput::Delete, Modifiers::NONE).unwrap();
    assert_eq!(composer.document().text(), "bc");
    composer.handle_key(KeyInput::End, Modifiers::NONE).unwrap();
    assert_eq!(composer.caret(), TextPosition::new(0, 2));
    assert_eq!(KeyInput::from_key(egui::Key::ArrowRight), Some(KeyInput::Right));
    assert_eq!(KeyInput::from_key(egui::Key::A), None);
}

#[test]
fn test_shift_movement_builds_selection() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "abc");

    composer.handle_key(KeyInput::Left, Modifiers::SHIFT).unwrap();
    composer.handle_key(KeyInput::Left, Modifiers::SHIFT).unwrap();
    let selection = composer.selection().unwrap();
    assert_eq!(selection.ordered(), (TextPosition::new(0, 1), TextPosition::new(0, 3)));
    assert_eq!(composer.selected_text().as_deref(), Some("bc"));

    // Shrinking back to the anchor leaves nothing selected
    composer.handle_key(KeyInput::End, Modifiers::SHIFT).unwrap();
    assert!(composer.selection().is_none());

    composer.handle_key(KeyInput::Home, Modifiers::SHIFT).unwrap();
    assert_eq!(composer.selected_text().as_deref(), Some("abc"));
    composer.handle_key(KeyInput::Char('X'), Modifiers::SHIFT).unwrap();
    assert_eq!(composer.document().text(), "X");
    assert!(composer.selection().is_none());

    // Plain movement collapses a selection
    composer.handle_key(KeyInput::Home, Modifiers::SHIFT).unwrap();
    assert!(composer.selection().is_some());
    composer.handle_key(KeyInput::Right, Modifiers::NONE).unwrap();
    assert!(composer.selection().is_none());
}

#[test]
fn test_select_all_shortcut_spans_blocks() {
    assert_eq!(
        KeyInput::from_shortcut(egui::Key::A, Modifiers::COMMAND),
        Some(KeyInput::SelectAll)
    );
    assert_eq!(KeyInput::from_shortcut(egui::Key::A, Modifiers::NONE), None);

    let mut composer = TextComposer::new();
    composer.insert_text("one\ntwo").unwrap();
    assert!(composer.handle_key(KeyInput::SelectAll, Modifiers::COMMAND).unwrap());
    assert_eq!(composer.selected_text().as_deref(), Some("one\ntwo"));

    composer.set_color(Color32::BLUE);
    assert!(composer.apply_style_to_selection().unwrap());
    for block in composer.document().blocks() {
        assert_eq!(runs_of(block), vec![(block.text(), Color32::BLUE)]);
    }

    composer.handle_key(KeyInput::Backspace, Modifiers::NONE).unwrap();
    assert!(composer.document().is_empty());
}

#[test]
fn test_translucent_color_survives_markup() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "solid");
    composer.set_color(Color32::from_rgba_unmultiplied(255, 0, 0, 128));
    type_str(&mut composer, "faint");
    composer.set_color(Color32::from_rgba_premultiplied(0, 0, 40, 64));
    type_str(&mut composer, "ghost");

    let markup = composer.to_markup();
    assert!(markup.contains("color: #ff000080"));
    let parsed = parse_markup(&markup).unwrap();
    assert_eq!(&parsed, composer.document());

    let runs = runs_of(&parsed.blocks()[0]);
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[1].1.a(), 128);
    assert_eq!(runs[2].1.a(), 64);
}

#[test]
fn test_line_break_in_insert_is_rejected() {
    let mut document = penpage::text::Document::new();
    let style = penpage::text::TextStyle::default();
    let result = document.insert(document.start(), "a\nb", &style);
    assert!(matches!(result, Err(TextError::LineBreakInText)));
    assert!(document.is_empty());
}

#[test]
fn test_undo_redo_walks_edits() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "ab");
    assert!(composer.undo());
    assert_eq!(composer.document().text(), "a");
    assert_eq!(composer.caret(), TextPosition::new(0, 1));
    assert!(composer.undo());
    assert!(!composer.undo());

    assert!(composer.redo());
    type_str(&mut composer, "z");
    assert!(!composer.can_redo());
    assert_eq!(composer.document().text(), "az");
}

#[test]
fn test_bad_markup_leaves_document_unchanged() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "keep");
    let before = composer.document().clone();
    let err = composer.load_markup("<div>nope</div>").unwrap_err();
    assert!(matches!(err, TextError::Markup(_)));
    assert_eq!(composer.document(), &before);
}

#[test]
fn test_out_of_range_caret_is_rejected() {
    let mut composer = TextComposer::new();
    type_str(&mut composer, "ab");
    assert_eq!(
        composer.set_caret(TextPosition::new(0, 3)),
        Err(TextError::PositionOutOfRange { block: 0, offset: 3 })
    );
    assert_eq!(composer.caret(), TextPosition::new(0, 2));
}

#[test]
fn test_composer_events() {
    let mut composer = TextComposer::new();
    let events = EventLog::new();
    composer.subscribe(events.handler());

    composer.insert_char('a').unwrap();
    composer.apply_style_event(StyleEvent::SetFontFamily("Caveat".to_owned()));

    let recorded = events.drain();
    assert_eq!(recorded[0], EditorEvent::DocumentChanged { step: 1, blocks: 1 });
    match &recorded[1] {
        EditorEvent::StyleChanged(style) => assert_eq!(style.font_family, "Caveat"),
        other => panic!("unexpected event {other:?}"),
    }
    assert!(composer.to_markup().contains("font-family: 'Homemade Apple'"));
}
