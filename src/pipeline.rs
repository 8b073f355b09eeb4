use crate::ascii::render_text_frames;
use crate::compose::{ComposeOptions, compose};
use crate::document::{SourceDocument, check_gif_kind};
use crate::error::{FlipbookError, FlipbookResult};
use crate::extract::{ExtractOptions, extract_frames};
use crate::geometry::Canvas;
use crate::placement::map_to_page;
use crate::session::Session;

#[derive(Clone, Debug, Default)]
pub struct PipelineOptions {
    pub extract: ExtractOptions,
    pub compose: ComposeOptions,
}

/// One full upload-to-output run: sniff -> extract -> convert -> compose.
///
/// Stages run strictly in sequence. The session latch rejects overlapping
/// runs; any failing stage unwinds through the single `fail_run` point so the
/// latch is never left set and no partial artifacts survive.
#[tracing::instrument(skip_all, fields(page = session.selected_page()))]
pub fn run_pipeline(
    session: &mut Session,
    source: &SourceDocument,
    image_bytes: &[u8],
    canvas: Canvas,
    opts: &PipelineOptions,
) -> FlipbookResult<Vec<u8>> {
    if session.is_busy() {
        return Err(FlipbookError::state("a run is already in progress"));
    }
    check_gif_kind(image_bytes)?;

    let frames = extract_frames(image_bytes, &opts.extract)?;
    session.attach_frames(frames)?;
    session.begin_run()?;

    match run_guarded(session, source, canvas, opts) {
        Ok(bytes) => {
            session.finish_run(bytes.clone());
            tracing::info!(bytes = bytes.len(), "composed output document");
            Ok(bytes)
        }
        Err(err) => {
            session.fail_run();
            Err(err)
        }
    }
}

fn run_guarded(
    session: &Session,
    source: &SourceDocument,
    canvas: Canvas,
    opts: &PipelineOptions,
) -> FlipbookResult<Vec<u8>> {
    let page_index = session
        .selected_page()
        .ok_or_else(|| FlipbookError::state("no page selected"))?;
    let rect = session
        .rect()
        .ok_or_else(|| FlipbookError::state("no placement rectangle set"))?;
    let frames = session
        .frames()
        .ok_or_else(|| FlipbookError::state("no frames attached"))?;

    let text_frames = render_text_frames(frames, opts.compose.grid);
    tracing::debug!(
        frames = frames.len(),
        text_frames = text_frames.len(),
        "converted frames to text"
    );

    let page = source.page_size(page_index)?;
    let placement = map_to_page(rect.clamped(canvas), canvas, page);

    compose(
        source,
        page_index,
        frames,
        &text_frames,
        &placement,
        &opts.compose,
    )
}
