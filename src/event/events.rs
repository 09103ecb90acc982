use crate::text::TextStyle;
use crate::tools::ToolKind;

/// Notifications emitted by the drawing engine and the text composer
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ToolChanged {
        old: ToolKind,
        new: ToolKind,
    },
    GestureStarted {
        tool: ToolKind,
    },
    /// A gesture or surface command was committed to history
    GestureCommitted {
        step: u64,
    },
    /// The pointer left the surface mid-gesture; nothing was committed
    GestureAbandoned,
    /// Undo or redo restored a committed snapshot
    HistoryRestored {
        step: u64,
    },
    SurfaceResized {
        width: u32,
        height: u32,
    },
    /// Decoded artwork was drawn onto the surface
    ImageReady {
        width: u32,
        height: u32,
    },
    ImageFailed {
        reason: String,
    },
    StyleChanged(TextStyle),
    DocumentChanged {
        step: u64,
        blocks: usize,
    },
}
