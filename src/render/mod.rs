//! Render pipeline: gateway responses -> chart datasets, table rows, summaries.
//!
//! Every function here is a full re-render of its target from the given data.
//! Nothing patches a previous result, so a second render with the same input
//! yields exactly the same rows and the chart slot still holds one chart.

pub mod chart;
pub mod format;
pub mod summary;
pub mod tables;

pub use chart::{ChartInstance, ChartSlot, ChartView, build_chart_view};
pub use summary::{VendorSummary, vendor_summary};
pub use tables::{RowMarker, TableRow, prediction_rows, rank_vendors, vendor_rows};

/// What a screen region currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Region<T> {
    /// Nothing rendered yet.
    Empty,
    Loading(String),
    /// Inline error text, mirrored from the notification.
    Error(String),
    Ready(T),
}

impl<T> Region<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Region::Loading(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Region::Ready(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> Default for Region<T> {
    fn default() -> Self {
        Region::Empty
    }
}
