//! Published status snapshot and the HTML page rendered from it.
//!
//! The controller thread is the only writer. Readers (the status web server)
//! load whole snapshots, never a partially updated record.

use std::fmt::Write as _;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::controller::{ControllerContext, ControllerState};

pub const PAGE_TITLE: &str = "CleanSweep 3D status";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub state: ControllerState,
    /// Empty when there is no error.
    pub last_error: String,
    pub collected_prints: u64,
    pub baseline_weight: i32,
}

impl Default for StatusView {
    fn default() -> Self {
        Self {
            state: ControllerState::Connecting,
            last_error: String::new(),
            collected_prints: 0,
            baseline_weight: 0,
        }
    }
}

impl From<&ControllerContext> for StatusView {
    fn from(ctx: &ControllerContext) -> Self {
        Self {
            state: ctx.state,
            last_error: ctx.error_message(),
            collected_prints: ctx.collected_prints,
            baseline_weight: ctx.baseline_weight,
        }
    }
}

/// Single-writer, many-reader handoff of the latest [`StatusView`].
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    inner: Arc<ArcSwap<StatusView>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, view: StatusView) {
        self.inner.store(Arc::new(view));
    }

    pub fn load(&self) -> Arc<StatusView> {
        self.inner.load_full()
    }
}

/// The status page body.
pub fn render_html(view: &StatusView) -> String {
    let mut page = String::with_capacity(384);
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    let _ = writeln!(page, "<title>{PAGE_TITLE}</title>");
    page.push_str("</head>\n<body>\n");
    let _ = writeln!(page, "<h1>{PAGE_TITLE}</h1>");
    let _ = writeln!(page, "<p>Current State: {}</p>", view.state.name());
    let _ = writeln!(page, "<p>Error: {}</p>", escape_html(&view.last_error));
    let _ = writeln!(page, "<p>Collected Prints: {}</p>", view.collected_prints);
    page.push_str("</body>\n</html>\n");
    page
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
