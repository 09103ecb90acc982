use egui::Color32;

use crate::app::{Mode, PageApp};
use crate::command::Command;
use crate::components::ToolButton;
use crate::page::PageSize;
use crate::text::StyleEvent;
use crate::tools::ToolKind;

pub fn tools_panel(app: &mut PageApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            // Mode switch
            ui.horizontal(|ui| {
                let mode = app.mode();
                if ui.selectable_label(mode == Mode::Text, "Write").clicked() {
                    app.set_mode(Mode::Text);
                }
                if ui.selectable_label(mode == Mode::Draw, "Draw").clicked() {
                    app.set_mode(Mode::Draw);
                }
            });
            ui.separator();

            // Ink shared by text and drawing
            let mut ink = app.composer().style().current().color;
            ui.horizontal(|ui| {
                ui.label("Ink");
                if ui.color_edit_button_srgba(&mut ink).changed() {
                    app.set_ink(ink);
                }
            });

            let mut page_size = app.page_size();
            egui::ComboBox::from_label("Page")
                .selected_text(page_size.id())
                .show_ui(ui, |ui| {
                    for size in PageSize::all() {
                        ui.selectable_value(&mut page_size, *size, size.id());
                    }
                });
            if page_size != app.page_size() {
                app.set_page_size(page_size);
            }
            ui.separator();

            // Controls for the active mode
            match app.mode() {
                Mode::Text => text_controls(app, ui),
                Mode::Draw => draw_controls(app, ui),
            }

            // Status line
            ui.separator();
            if let Some(status) = app.status() {
                ui.label(status);
            }
            if let Some(event) = app.last_event() {
                ui.small(event);
            }
        });
}

fn text_controls(app: &mut PageApp, ui: &mut egui::Ui) {
    ui.heading("Text");

    let current = app.composer().style().current().clone();
    let mut family = current.font_family.clone();
    let families: Vec<String> = app.composer().metrics().families().map(str::to_owned).collect();
    egui::ComboBox::from_label("Font")
        .selected_text(family.as_str())
        .show_ui(ui, |ui| {
            for candidate in &families {
                ui.selectable_value(&mut family, candidate.clone(), candidate.as_str());
            }
        });
    if family != current.font_family {
        app.composer_mut()
            .apply_style_event(StyleEvent::SetFontFamily(family));
    }

    // Style toggles for the next characters typed
    ui.horizontal(|ui| {
        if ui.selectable_label(current.bold, "B").clicked() {
            app.composer_mut().apply_style_event(StyleEvent::ToggleBold);
        }
        if ui.selectable_label(current.italic, "I").clicked() {
            app.composer_mut().apply_style_event(StyleEvent::ToggleItalic);
        }
        if ui.selectable_label(current.underline, "U").clicked() {
            app.composer_mut()
                .apply_style_event(StyleEvent::ToggleUnderline);
        }
    });

    let has_selection = app.composer().selection().is_some();
    if ui
        .add_enabled(has_selection, egui::Button::new("Style selection"))
        .clicked()
    {
        if let Err(err) = app.composer_mut().apply_style_to_selection() {
            log::warn!("could not restyle selection: {err}");
        }
    }

    ui.horizontal(|ui| {
        let can_undo = app.composer().can_undo();
        let can_redo = app.composer().can_redo();
        if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
            app.composer_mut().undo();
        }
        if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
            app.composer_mut().redo();
        }
        if ui.button("Clear").clicked() {
            app.composer_mut().clear();
        }
    });

    if ui.button("Export markup").clicked() {
        app.export_markup();
    }
}

fn draw_controls(app: &mut PageApp, ui: &mut egui::Ui) {
    ui.heading("Draw");

    // Tool grid
    let tool_state = *app.engine().tool_state();
    ui.horizontal_wrapped(|ui| {
        for tool in ToolKind::all() {
            let selected = tool_state.tool == *tool;
            if ToolButton::new(*tool, selected).show(ui).clicked() {
                log::info!("Tool selected from UI: {}", tool.label());
                app.execute_command(Command::SetTool(*tool));
            }
        }
    });

    // Stroke settings
    let mut width = tool_state.stroke_width();
    if ui
        .add(egui::Slider::new(&mut width, 0.5..=40.0).text("Width"))
        .changed()
    {
        app.execute_command(Command::SetStrokeWidth(width));
    }

    let mut opacity = tool_state.opacity();
    if ui
        .add(egui::Slider::new(&mut opacity, 0.0..=1.0).text("Opacity"))
        .changed()
    {
        app.execute_command(Command::SetOpacity(opacity));
    }

    let mut background: Color32 = app.engine().background();
    ui.horizontal(|ui| {
        ui.label("Background");
        if ui.color_edit_button_srgba(&mut background).changed() {
            app.execute_command(Command::SetBackground(background));
        }
    });

    ui.horizontal(|ui| {
        let can_undo = app.engine().can_undo();
        let can_redo = app.engine().can_redo();
        if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
            app.execute_command(Command::Undo);
        }
        if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
            app.execute_command(Command::Redo);
        }
        if ui.button("Clear").clicked() {
            app.execute_command(Command::Clear);
        }
    });

    let history = app.engine().history();
    ui.label(format!(
        "History: {} of {}",
        history.cursor() + 1,
        history.len()
    ));

    // Export
    ui.separator();
    if ui.button("Export PNG").clicked() {
        app.export_drawing(true);
    }
    if ui.button("Export transparent PNG").clicked() {
        app.export_drawing(false);
    }
    if ui.button("Export as page").clicked() {
        app.export_drawing_page();
    }
}
