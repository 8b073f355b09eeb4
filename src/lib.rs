#![forbid(unsafe_code)]

pub mod ascii;
pub mod compose;
pub mod document;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod pipeline;
pub mod placement;
pub mod script;
pub mod session;

pub use ascii::{ASCII_RAMP, GridSize, MAX_TEXT_FRAMES, TextFrame, render_text_frames};
pub use compose::{ANIM_FIELD_NAME, AnimationMode, ComposeOptions, compose};
pub use document::{SourceDocument, check_gif_kind, check_pdf_kind};
pub use error::{FlipbookError, FlipbookResult};
pub use extract::{
    ExtractOptions, Frame, FrameSet, MAX_EXTRACT_FRAMES, MIN_FRAME_DELAY_MS,
    STATIC_FRAME_DELAY_MS, extract_frames,
};
pub use geometry::{Canvas, MIN_RECT_SIZE, Rect};
pub use pipeline::{PipelineOptions, run_pipeline};
pub use placement::{PageSize, Placement, map_to_canvas, map_to_page};
pub use session::{Session, Step};
