use egui::{Color32, FontId, Pos2, Rect, RichText, Sense};

use crate::app::{Mode, PageApp};
use crate::text::{KeyInput, Run, TextPosition};

pub fn central_panel(app: &mut PageApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| match app.mode() {
        Mode::Draw => drawing_surface(app, ctx, ui),
        Mode::Text => page_text(app, ctx, ui),
    });
}

/// Shows the surface at its intrinsic size, shrunk to fit the panel
fn drawing_surface(app: &mut PageApp, ctx: &egui::Context, ui: &mut egui::Ui) {
    let [width, height] = app.engine().surface().size();
    let intrinsic = egui::vec2(width as f32, height as f32);
    let available = ui.available_size();
    // Never scale up past the intrinsic size
    let fit = (available.x / intrinsic.x).min(available.y / intrinsic.y).min(1.0);
    let (rect, _response) = ui.allocate_exact_size(intrinsic * fit, Sense::drag());

    // Input maps through the rect as displayed this frame
    app.input_mut().set_displayed_rect(rect);
    app.handle_surface_input(ctx);

    // Background under the transparent surface
    let texture = app.surface_texture(ctx);
    let painter = ui.painter();
    painter.rect_filled(rect, 0.0, app.engine().background());
    painter.image(
        texture,
        rect,
        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
        Color32::WHITE,
    );
}

fn page_text(app: &mut PageApp, ctx: &egui::Context, ui: &mut egui::Ui) {
    let base_size = app.page_size().base_font_pt() * 1.6;
    let line_height = base_size * app.page_size().line_height_em();

    handle_keyboard(app, ctx);

    // Render from a copy so the composer stays free for input
    let caret = app.composer().caret();
    let selection = app.composer().selection().map(|s| s.ordered());
    let document = app.composer().document().clone();
    egui::ScrollArea::vertical().show(ui, |ui| {
        for (index, block) in document.blocks().iter().enumerate() {
            let selected = selected_span(selection, index, block.char_len());
            let caret_offset = (caret.block == index).then_some(caret.offset);

            ui.horizontal_wrapped(|ui| {
                ui.set_min_height(line_height);
                ui.spacing_mut().item_spacing.x = 0.0;
                let mut offset = 0;
                for run in block.runs() {
                    let len = run.char_len();

                    // Cut the run wherever the caret or a selection edge falls inside it
                    let mut cuts = vec![0, len];
                    let edges = [caret_offset, selected.map(|(s, _)| s), selected.map(|(_, e)| e)];
                    for point in edges.into_iter().flatten() {
                        if point > offset && point < offset + len {
                            cuts.push(point - offset);
                        }
                    }
                    cuts.sort_unstable();
                    cuts.dedup();

                    for pair in cuts.windows(2) {
                        let (from, to) = (offset + pair[0], offset + pair[1]);
                        if caret_offset == Some(from) {
                            caret_label(ui, base_size);
                        }
                        let text: String = run.text().chars().skip(pair[0]).take(pair[1] - pair[0]).collect();
                        let highlighted = selected.is_some_and(|(s, e)| from >= s && to <= e);
                        run_label(ui, run, &text, base_size, highlighted);
                    }
                    offset += len;
                }
                if caret_offset == Some(offset) {
                    caret_label(ui, base_size);
                }
            });
        }
    });
}

/// Char range of block `index` covered by the ordered selection
fn selected_span(
    selection: Option<(TextPosition, TextPosition)>,
    index: usize,
    block_len: usize,
) -> Option<(usize, usize)> {
    let (start, end) = selection?;
    if index < start.block || index > end.block {
        return None;
    }
    let from = if index == start.block { start.offset } else { 0 };
    let to = if index == end.block { end.offset } else { block_len };
    (from < to).then_some((from, to))
}

fn run_label(ui: &mut egui::Ui, run: &Run, text: &str, size: f32, highlighted: bool) {
    if text.is_empty() {
        return;
    }
    let style = run.style();
    let mut rich = RichText::new(text)
        .font(FontId::proportional(size))
        .color(style.color);
    if style.bold {
        rich = rich.strong();
    }
    if style.italic {
        rich = rich.italics();
    }
    if style.underline {
        rich = rich.underline();
    }
    if highlighted {
        rich = rich.background_color(ui.visuals().selection.bg_fill);
    }
    ui.label(rich);
}

fn caret_label(ui: &mut egui::Ui, size: f32) {
    ui.label(RichText::new("|").font(FontId::proportional(size)).weak());
}

fn handle_keyboard(app: &mut PageApp, ctx: &egui::Context) {
    let (events, modifiers) = ctx.input(|i| (i.events.clone(), i.modifiers));
    for event in events {
        let result = match event {
            egui::Event::Text(text) => text
                .chars()
                .try_for_each(|c| app.composer_mut().handle_key(KeyInput::Char(c), modifiers).map(|_| ())),
            egui::Event::Paste(text) => app.composer_mut().insert_text(&text),
            egui::Event::Copy => {
                if let Some(text) = app.composer().selected_text() {
                    ctx.copy_text(text);
                }
                Ok(())
            }
            egui::Event::Cut => match app.composer().selected_text() {
                Some(text) => {
                    ctx.copy_text(text);
                    // Backspace removes the selection as one edit
                    app.composer_mut().backspace().map(|_| ())
                }
                None => Ok(()),
            },
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } => {
                // Shortcuts first, so Ctrl+A is not read as plain A
                let input = KeyInput::from_shortcut(key, modifiers).or_else(|| KeyInput::from_key(key));
                match input {
                    Some(input) => app.composer_mut().handle_key(input, modifiers).map(|_| ()),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        };
        if let Err(err) = result {
            log::warn!("keystroke rejected: {err}");
        }
    }
}
