// Page layout for the resume preview.
// Paper geometry, page-break math, height observation and the paginated
// preview engine that ties them together.

pub mod font_metrics;
pub mod geometry;
pub mod observer;
pub mod paper;
pub mod preview;

pub use font_metrics::{get_metrics, FontFamily, FontMetrics};
pub use geometry::{PageGeometry, MAX_PAGES};
pub use observer::{HeightChange, HeightHandler, LayoutMonitor, Subscription};
pub use paper::{display_scale, mm_to_px, PaperSize, Viewport};
pub use preview::{
    BreakMarker, PageView, PaginatedPreview, PaginationSnapshot, PreviewFrame, PreviewSettings,
    PrintView, Transform,
};
