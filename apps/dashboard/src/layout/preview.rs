//! Paginated Preview Engine.
//!
//! # Architecture
//! - The host renders the document unclipped at the page's natural width and
//!   reports its height through a [`LayoutMonitor`].
//! - `PaginatedPreview::attach` subscribes a handler that recomputes
//!   [`PageGeometry`] and re-clamps the page cursor on every report. Dropping
//!   the preview drops the subscription.
//! - `present` turns a rendered document into a frame: in paginated mode a
//!   viewport-sized clip plus a scale/translate transform that shows only the
//!   current page's slice; in print mode the full document, untouched.
//!
//! Page height is fixed by the paper size. The viewport only affects scale.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::layout::geometry::PageGeometry;
use crate::layout::observer::{HeightChange, LayoutMonitor, Subscription};
use crate::layout::paper::{display_scale, PaperSize, Viewport};
use crate::render::{BlockKind, DocumentRenderer, Line, RenderedDocument, Theme};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewSettings {
    pub paper: PaperSize,
    pub viewport: Viewport,
    pub print_mode: bool,
}

/// Point-in-time view of the pagination state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationSnapshot {
    pub geometry: PageGeometry,
    pub current_page: u32,
    pub scale: f64,
    pub print_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub scale: f64,
    /// Vertical offset in screen px, applied after scaling.
    pub translate_y: f64,
}

/// A page boundary visible in the current slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakMarker {
    /// Position in unscaled content px.
    pub offset_px: f64,
    /// Position relative to the top of the clip container, in screen px.
    pub screen_y: f64,
}

#[derive(Debug, Clone)]
pub struct PageView {
    /// Backs both the hidden measurement layer and the visible layer.
    pub document: Arc<RenderedDocument>,
    pub clip: Viewport,
    pub transform: Transform,
    pub markers: Vec<BreakMarker>,
    pub page: u32,
    pub page_count: u32,
    pub page_height_px: f64,
}

impl PageView {
    /// Lines belonging to the current page's slice.
    pub fn page_lines(&self) -> Vec<(BlockKind, &Line)> {
        let top = f64::from(self.page - 1) * self.page_height_px;
        self.document.lines_in(top, top + self.page_height_px)
    }
}

#[derive(Debug, Clone)]
pub struct PrintView {
    pub document: Arc<RenderedDocument>,
}

#[derive(Debug, Clone)]
pub enum PreviewFrame {
    Paginated(PageView),
    Print(PrintView),
}

impl PreviewFrame {
    pub fn document(&self) -> &RenderedDocument {
        match self {
            PreviewFrame::Paginated(view) => &view.document,
            PreviewFrame::Print(view) => &view.document,
        }
    }
}

struct PaginationState {
    paper: PaperSize,
    viewport: Viewport,
    scale: f64,
    print_mode: bool,
    geometry: PageGeometry,
    current_page: u32,
    last_sequence: u64,
}

impl PaginationState {
    fn new(settings: PreviewSettings) -> Self {
        Self {
            paper: settings.paper,
            viewport: settings.viewport,
            scale: display_scale(settings.paper, settings.viewport).unwrap_or(1.0),
            print_mode: settings.print_mode,
            geometry: PageGeometry::compute(0.0, settings.paper.height_px()),
            current_page: 1,
            last_sequence: 0,
        }
    }

    /// Applies a height report. Older reports and unmeasurable heights leave
    /// the state untouched.
    fn apply_height(&mut self, change: HeightChange) -> bool {
        if change.sequence <= self.last_sequence {
            debug!(
                sequence = change.sequence,
                latest = self.last_sequence,
                "Ignoring stale height report"
            );
            return false;
        }
        self.last_sequence = change.sequence;

        let Some(height) = change.height_px.filter(|h| h.is_finite()) else {
            return false;
        };
        self.recompute(height);
        true
    }

    fn recompute(&mut self, content_height_px: f64) {
        self.geometry = PageGeometry::compute(content_height_px, self.paper.height_px());
        debug!(
            height = content_height_px,
            pages = self.geometry.page_count,
            "Pagination recomputed"
        );

        let clamped = self.geometry.clamp_page(self.current_page);
        if clamped != self.current_page {
            info!(
                from = self.current_page,
                to = clamped,
                "Current page clamped after content shrank"
            );
            self.current_page = clamped;
        }
    }

    fn go_to(&mut self, page: u32) -> u32 {
        self.current_page = self.geometry.clamp_page(page);
        self.current_page
    }
}

/// Presents a continuously rendered document as fixed-height pages.
pub struct PaginatedPreview {
    state: Arc<Mutex<PaginationState>>,
    _subscription: Subscription,
}

impl PaginatedPreview {
    /// Creates the engine and subscribes it to `monitor` for its whole lifetime.
    pub fn attach(monitor: &LayoutMonitor, settings: PreviewSettings) -> Self {
        let state = Arc::new(Mutex::new(PaginationState::new(settings)));
        let handler_state = Arc::clone(&state);
        let subscription = monitor.subscribe(Arc::new(move |change| {
            handler_state.lock().apply_height(change);
        }));
        Self {
            state,
            _subscription: subscription,
        }
    }

    pub fn snapshot(&self) -> PaginationSnapshot {
        let state = self.state.lock();
        PaginationSnapshot {
            geometry: state.geometry.clone(),
            current_page: state.current_page,
            scale: state.scale,
            print_mode: state.print_mode,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.state.lock().current_page
    }

    pub fn page_count(&self) -> u32 {
        self.state.lock().geometry.page_count
    }

    /// Width the measurement copy must be rendered at: one page, unscaled.
    pub fn natural_width_px(&self) -> f64 {
        self.state.lock().paper.width_px()
    }

    pub fn first_page(&self) -> u32 {
        self.state.lock().go_to(1)
    }

    pub fn last_page(&self) -> u32 {
        let mut state = self.state.lock();
        let last = state.geometry.page_count;
        state.go_to(last)
    }

    pub fn next_page(&self) -> u32 {
        let mut state = self.state.lock();
        let next = state.current_page.saturating_add(1);
        state.go_to(next)
    }

    pub fn prev_page(&self) -> u32 {
        let mut state = self.state.lock();
        let prev = state.current_page.saturating_sub(1);
        state.go_to(prev)
    }

    pub fn goto_page(&self, page: u32) -> u32 {
        self.state.lock().go_to(page)
    }

    /// Updates the viewport. Only the display scale changes; an unmeasurable
    /// viewport keeps the previous scale.
    pub fn set_viewport(&self, viewport: Viewport) {
        let mut state = self.state.lock();
        state.viewport = viewport;
        if let Some(scale) = display_scale(state.paper, viewport) {
            state.scale = scale;
        }
    }

    /// Switches paper size, re-deriving geometry from the last measured height.
    pub fn set_paper(&self, paper: PaperSize) {
        let mut state = self.state.lock();
        state.paper = paper;
        if let Some(scale) = display_scale(paper, state.viewport) {
            state.scale = scale;
        }
        let height = state.geometry.total_content_height_px;
        state.recompute(height);
    }

    pub fn set_print_mode(&self, print_mode: bool) {
        self.state.lock().print_mode = print_mode;
    }

    /// Renders `data` once at the natural page width and presents it.
    pub fn frame<R: DocumentRenderer + ?Sized>(
        &self,
        renderer: &R,
        data: &Value,
        theme: &Theme,
    ) -> PreviewFrame {
        let document = renderer.render(data, theme, self.natural_width_px());
        self.present(Arc::new(document))
    }

    /// Builds the frame for an already rendered document using the current state.
    pub fn present(&self, document: Arc<RenderedDocument>) -> PreviewFrame {
        let state = self.state.lock();

        if state.print_mode {
            return PreviewFrame::Print(PrintView { document });
        }

        let page_height = state.geometry.page_height_px;
        let page_top = state.geometry.page_top(state.current_page);
        let scale = state.scale;
        let clip = state.viewport;

        let visible_bottom = if clip.is_measurable() {
            page_top + clip.height / scale
        } else {
            page_top + page_height
        };
        let markers = state
            .geometry
            .break_offsets
            .iter()
            .copied()
            .filter(|offset| *offset >= page_top && *offset <= visible_bottom)
            .map(|offset_px| BreakMarker {
                offset_px,
                screen_y: (offset_px - page_top) * scale,
            })
            .collect();

        PreviewFrame::Paginated(PageView {
            document,
            clip,
            transform: Transform {
                scale,
                translate_y: -page_top * scale,
            },
            markers,
            page: state.current_page,
            page_count: state.geometry.page_count,
            page_height_px: page_height,
        })
    }
}
