// lib/src/render/mod.rs
//! Prescription rendering: one page at a time behind [`PageRenderer`], then
//! merged into a single PDF.

pub mod layout;
pub mod merge;
pub mod pdf;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use models::PrescriptionSnapshot;

use crate::errors::RenderError;
use crate::pagination::total_pages;

pub use layout::PageLayout;
pub use merge::{merge_pages, page_count};
pub use pdf::LopdfPageRenderer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageFormat {
    #[default]
    A4,
    A5,
}

impl PageFormat {
    /// Width and height in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageFormat::A4 => (595.0, 842.0),
            PageFormat::A5 => (420.0, 595.0),
        }
    }

    /// Unknown names fall back to A4.
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageFormat::A4 => "A4",
            PageFormat::A5 => "A5",
        }
    }
}

impl FromStr for PageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A4" => Ok(PageFormat::A4),
            "A5" => Ok(PageFormat::A5),
            other => Err(format!("unsupported page format: {}", other)),
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rendered page, a complete single-page PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageArtifact {
    pub page: usize,
    pub bytes: Vec<u8>,
}

/// Renders exactly one page per call. Implementations hold no per-document state.
pub trait PageRenderer: Send + Sync + 'static {
    fn render_page(&self, layout: &PageLayout, format: PageFormat) -> Result<PageArtifact, RenderError>;
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub format: PageFormat,
}

/// Drives a [`PageRenderer`] over every page of a prescription and merges the result.
#[derive(Clone)]
pub struct DocumentRenderer {
    renderer: Arc<dyn PageRenderer>,
    page_timeout: Duration,
}

impl DocumentRenderer {
    pub fn new(renderer: Arc<dyn PageRenderer>, page_timeout: Duration) -> Self {
        DocumentRenderer {
            renderer,
            page_timeout,
        }
    }

    pub fn lopdf(page_timeout: Duration) -> Self {
        Self::new(Arc::new(LopdfPageRenderer), page_timeout)
    }

    /// Renders pages in order on the blocking pool. Any page failure or
    /// timeout aborts the whole document.
    pub async fn render(
        &self,
        snapshot: &PrescriptionSnapshot,
        issued_on: NaiveDate,
        format: PageFormat,
    ) -> Result<RenderedDocument, RenderError> {
        let total = total_pages(snapshot.medications.len());
        let mut pages = Vec::with_capacity(total);

        for page in 1..=total {
            let layout = PageLayout::compose(snapshot, issued_on, page)?;
            let renderer = Arc::clone(&self.renderer);
            let job = tokio::task::spawn_blocking(move || renderer.render_page(&layout, format));
            let artifact = match timeout(self.page_timeout, job).await {
                Ok(Ok(result)) => result?,
                Ok(Err(join)) => {
                    return Err(RenderError::Page {
                        page,
                        reason: join.to_string(),
                    })
                }
                Err(_) => {
                    warn!(
                        "Page {} of {} for {} exceeded {:?}",
                        page, total, snapshot.prescription_id, self.page_timeout
                    );
                    return Err(RenderError::Timeout {
                        page,
                        budget_ms: self.page_timeout.as_millis() as u64,
                    });
                }
            };
            debug!("Rendered page {}/{} ({} bytes)", page, total, artifact.bytes.len());
            pages.push(artifact);
        }

        let bytes = tokio::task::spawn_blocking(move || merge_pages(&pages))
            .await
            .map_err(|e| RenderError::Merge(e.to_string()))??;

        Ok(RenderedDocument {
            bytes,
            page_count: total,
            format,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Wraps the lopdf backend; can be told to fail or stall.
    #[derive(Default)]
    pub struct ScriptedRenderer {
        pub fail: AtomicBool,
        pub stall: Option<Duration>,
        pub calls: AtomicUsize,
    }

    impl ScriptedRenderer {
        pub fn failing() -> Self {
            ScriptedRenderer {
                fail: AtomicBool::new(true),
                ..Default::default()
            }
        }

        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    impl PageRenderer for ScriptedRenderer {
        fn render_page(&self, layout: &PageLayout, format: PageFormat) -> Result<PageArtifact, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(stall) = self.stall {
                std::thread::sleep(stall);
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(RenderError::Page {
                    page: layout.page_number,
                    reason: "renderer unavailable".into(),
                });
            }
            LopdfPageRenderer.render_page(layout, format)
        }
    }
}
