use eframe::egui;

/// Picks up image files dropped onto the window
#[derive(Debug, Default)]
pub struct FileHandler {
    processed_files: Vec<String>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the first newly dropped image, if any
    pub fn take_dropped_image(&mut self, ctx: &egui::Context) -> Option<Vec<u8>> {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in &dropped {
            // Native drops carry a path, web drops only a name
            let file_name = if let Some(path) = &file.path {
                path.display().to_string()
            } else if !file.name.is_empty() {
                file.name.clone()
            } else {
                "unknown".to_owned()
            };

            // Skip files already imported during this drop
            if self.processed_files.contains(&file_name) {
                continue;
            }
            if !is_image_file(file) {
                log::warn!("Dropped file is not a supported type: {file_name}");
                continue;
            }
            // Import the first readable image and leave the rest
            if let Some(bytes) = read_bytes(file, &file_name) {
                self.processed_files.push(file_name);
                return Some(bytes);
            }
        }
        // Drop finished, the same file may be dropped again
        if dropped.is_empty() {
            self.processed_files.clear();
        }
        None
    }

    /// Overlay shown while files hover over the window
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, FontId, Id, LayerId, Order};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }
        // List the hovered paths
        let text = ctx.input(|i| {
            let mut text = "Drop artwork to import:\n".to_owned();
            for file in &i.raw.hovered_files {
                if let Some(path) = &file.path {
                    text += &format!("\n{}", path.display());
                }
            }
            text
        });

        // Dim the whole window behind the list
        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(20.0),
            Color32::WHITE,
        );
    }
}

/// Check if a file is an image based on MIME type or extension
fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        file.mime.starts_with("image/")
    } else if let Some(ext) = file.path.as_ref().and_then(|path| path.extension()) {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp")
    } else {
        false
    }
}

fn read_bytes(file: &egui::DroppedFile, file_name: &str) -> Option<Vec<u8>> {
    // Web drops arrive with their bytes
    if let Some(bytes) = &file.bytes {
        log::info!("Importing image from memory: {file_name} ({} bytes)", bytes.len());
        return Some(bytes.to_vec());
    }
    // Native drops are read from disk
    let path = file.path.as_ref()?;
    match std::fs::read(path) {
        Ok(bytes) => {
            log::info!("Importing image from path: {}", path.display());
            Some(bytes)
        }
        Err(err) => {
            log::error!("Failed to read image file: {}: {err}", path.display());
            None
        }
    }
}
