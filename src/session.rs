use crate::error::{FlipbookError, FlipbookResult};
use crate::extract::FrameSet;
use crate::geometry::{Canvas, Rect};

/// Wizard position. Steps only advance when their prerequisite artifact is
/// populated; going back clears the artifacts the later steps depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    PageSelect = 1,
    PlacementEdit = 2,
    AnimationReady = 3,
    Generated = 4,
}

/// Mutable session state shared by every pipeline stage.
///
/// One run at a time: `begin_run` sets an in-progress latch that both the
/// success and failure paths release, so an aborted run never wedges the
/// session (a new upload mid-run is rejected instead of interleaved).
#[derive(Debug, Default)]
pub struct Session {
    step: Option<Step>,
    selected_page: Option<usize>,
    rect: Option<Rect>,
    frames: Option<FrameSet>,
    output: Option<Vec<u8>>,
    busy: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Option<Step> {
        self.step
    }

    pub fn selected_page(&self) -> Option<usize> {
        self.selected_page
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn frames(&self) -> Option<&FrameSet> {
        self.frames.as_ref()
    }

    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Enter step 1 for a freshly decoded document.
    pub fn document_loaded(&mut self) {
        self.reset();
        self.step = Some(Step::PageSelect);
    }

    /// Step 1 -> 2. Requires a page index valid for the loaded document.
    pub fn select_page(&mut self, index: usize, page_count: usize) -> FlipbookResult<()> {
        if self.step.is_none() {
            return Err(FlipbookError::state("no document loaded"));
        }
        if index >= page_count {
            return Err(FlipbookError::state(format!(
                "page index {index} out of range (document has {page_count} pages)"
            )));
        }
        self.selected_page = Some(index);
        self.step = Some(Step::PlacementEdit);
        Ok(())
    }

    /// Record a placement rectangle edit. Always re-clamped; cheap enough to
    /// run on every pointer movement, independent of any in-flight run.
    pub fn set_rect(&mut self, rect: Rect, canvas: Canvas) -> FlipbookResult<Rect> {
        if self.step < Some(Step::PlacementEdit) {
            return Err(FlipbookError::state("select a page before placing"));
        }
        let clamped = rect.clamped(canvas);
        self.rect = Some(clamped);
        Ok(clamped)
    }

    /// Step 2 -> 3. The `FrameSet` type already guarantees non-emptiness.
    pub fn attach_frames(&mut self, frames: FrameSet) -> FlipbookResult<()> {
        if self.step < Some(Step::PlacementEdit) {
            return Err(FlipbookError::state("select a page before uploading frames"));
        }
        self.frames = Some(frames);
        self.step = Some(Step::AnimationReady);
        Ok(())
    }

    /// Step 2 -> 1. Clears the frames and placement the later steps rely on.
    pub fn back_to_page_select(&mut self) {
        self.selected_page = None;
        self.frames = None;
        self.rect = None;
        self.output = None;
        self.step = Some(Step::PageSelect);
    }

    /// Acquire the in-progress latch before running the pipeline.
    pub fn begin_run(&mut self) -> FlipbookResult<()> {
        if self.busy {
            return Err(FlipbookError::state("a run is already in progress"));
        }
        if self.step < Some(Step::AnimationReady) {
            return Err(FlipbookError::state("frames not attached yet"));
        }
        self.busy = true;
        Ok(())
    }

    /// Step 3 -> 4 on a successful compose; releases the latch and replaces
    /// (thereby dropping) any previous output buffer.
    pub fn finish_run(&mut self, output: Vec<u8>) {
        self.output = Some(output);
        self.step = Some(Step::Generated);
        self.busy = false;
    }

    /// Unwind after a failed run: latch released, no half-built output kept.
    pub fn fail_run(&mut self) {
        self.output = None;
        self.busy = false;
    }

    /// "Start over": back to the pre-step-1 state, all artifacts discarded.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
