use egui::Color32;
use std::path::Path;

use crate::command::Command;
use crate::config::Settings;
use crate::error::EngineError;
use crate::event::{EventLog, RepaintHandler};
use crate::file_handler::FileHandler;
use crate::input::InputHandler;
use crate::page::PageSize;
use crate::panels::{central_panel, tools_panel};
use crate::state::{DrawingEngine, SurfaceStatus};
use crate::text::TextComposer;
use crate::texture_manager::SurfaceTexture;

/// Typing and drawing are mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Text,
    Draw,
}

pub struct PageApp {
    settings: Settings,
    engine: DrawingEngine,
    composer: TextComposer,
    input: InputHandler,
    texture: SurfaceTexture,
    files: FileHandler,
    events: EventLog,
    mode: Mode,
    page_size: PageSize,
    status: Option<String>,
    last_event: Option<String>,
}

impl PageApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Result<Self, EngineError> {
        let engine = DrawingEngine::from_settings(&settings)?;
        let composer = TextComposer::from_settings(&settings);

        // Both halves of the page repaint and report through the same log
        let events = EventLog::new();
        engine.subscribe(Box::new(RepaintHandler::new(cc.egui_ctx.clone())));
        engine.subscribe(events.handler());
        composer.subscribe(Box::new(RepaintHandler::new(cc.egui_ctx.clone())));
        composer.subscribe(events.handler());

        Ok(Self {
            page_size: settings.page_size,
            settings,
            engine,
            composer,
            input: InputHandler::new(),
            texture: SurfaceTexture::new(),
            files: FileHandler::new(),
            events,
            mode: Mode::default(),
            status: None,
            last_event: None,
        })
    }

    pub fn engine(&self) -> &DrawingEngine {
        &self.engine
    }

    pub fn composer(&self) -> &TextComposer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut TextComposer {
        &mut self.composer
    }

    pub fn input_mut(&mut self) -> &mut InputHandler {
        &mut self.input
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            log::info!("switching to {mode:?} mode");
            // A gesture cannot continue once the surface stops receiving input
            self.engine.pointer_leave();
            self.mode = mode;
        }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn execute_command(&mut self, command: Command) {
        log::debug!("executing {}", command.label());
        if let Err(err) = command.execute(&mut self.engine) {
            log::warn!("{} failed: {err}", command.label());
            self.status = Some(format!("{} failed: {err}", command.label()));
        }
    }

    /// Page ink applies to the typing style and the drawing tools together
    pub fn set_ink(&mut self, color: Color32) {
        self.composer.set_color(color);
        self.execute_command(Command::SetColor(color));
    }

    /// Feeds this frame's pointer input to the drawing engine
    pub fn handle_surface_input(&mut self, ctx: &egui::Context) {
        let [width, height] = self.engine.surface().size();
        let events = self
            .input
            .process_input(ctx, egui::vec2(width as f32, height as f32));
        self.engine.handle_events(events);
    }

    /// Current surface texture, uploading it if the pixels changed
    pub fn surface_texture(&mut self, ctx: &egui::Context) -> egui::TextureId {
        self.texture
            .update(ctx, self.engine.surface(), self.engine.revision())
    }

    pub fn export_drawing(&mut self, with_background: bool) {
        let path = if with_background {
            "drawing.png"
        } else {
            "drawing-transparent.png"
        };
        let result = self
            .engine
            .export_png(with_background)
            .map_err(|err| err.to_string())
            .and_then(|bytes| std::fs::write(path, bytes).map_err(|err| err.to_string()));
        self.report_export(path, result);
    }

    pub fn export_drawing_page(&mut self) {
        let path = format!("drawing-{}.png", self.page_size.id());
        let page = self
            .engine
            .export_page(self.page_size, self.settings.export_resolution);
        let result = page.save(&path).map_err(|err| err.to_string());
        self.report_export(&path, result);
    }

    pub fn export_markup(&mut self) {
        let path = "page.html";
        let result = std::fs::write(path, self.composer.to_markup()).map_err(|err| err.to_string());
        self.report_export(path, result);
    }

    fn report_export(&mut self, path: impl AsRef<Path>, result: Result<(), String>) {
        let path = path.as_ref().display();
        self.status = Some(match result {
            Ok(()) => {
                log::info!("exported {path}");
                format!("Saved {path}")
            }
            Err(err) => {
                log::error!("export to {path} failed: {err}");
                format!("Could not save {path}: {err}")
            }
        });
    }

    fn poll_image(&mut self, ctx: &egui::Context) {
        // A dropped image switches to drawing
        if let Some(bytes) = self.files.take_dropped_image(ctx) {
            self.engine.load_image(bytes);
            self.set_mode(Mode::Draw);
        }
        match self.engine.poll_image() {
            Ok(true) => self.status = Some("Artwork imported".to_owned()),
            Ok(false) => {}
            Err(err) => self.status = Some(format!("Could not load image: {err}")),
        }
        // Keep polling until the decode finishes
        if self.engine.surface_status() == SurfaceStatus::AwaitingImage {
            ctx.request_repaint();
        }
    }

    /// Last engine or composer notification, for the status bar
    pub fn last_event(&self) -> Option<&str> {
        self.last_event.as_deref()
    }
}

impl eframe::App for PageApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_image(ctx);

        // Only the newest notification is shown
        if let Some(event) = self.events.drain().pop() {
            self.last_event = Some(format!("{event:?}"));
        }
        // Draw the UI
        tools_panel(self, ctx);
        central_panel(self, ctx);
        self.files.preview_files_being_dropped(ctx);
    }
}
