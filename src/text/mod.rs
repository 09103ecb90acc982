//! Styled text composition: the run model, the typing style and the composer
//! that turns keystrokes into document edits.

mod composer;
pub mod markup;
mod metrics;
mod run;
mod style;

pub use composer::{CaretMove, DocumentSnapshot, KeyInput, TextComposer};
pub use markup::{parse_markup, to_markup};
pub use metrics::{FontMetrics, FontMetricsTable};
pub use run::{Block, Cursor, Document, Run, Selection, TextPosition};
pub use style::{
    DEFAULT_FONT_FAMILY, DEFAULT_INK, StyleEvent, StyleState, TextStyle, canonical_color, color_to_hex,
    parse_hex_color,
};
