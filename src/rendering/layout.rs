//! Grid sizing for the wallboard's status boxes.
//!
//! Reproduces the board's viewport-filling heuristic: divide the usable
//! area evenly across the boxes, shape each box to a 3:2 ratio, then
//! correct the column count when the computed grid would overflow the
//! viewport height.

use crate::Viewport;

/// Assumed glyph width for label measurement (px at the base font).
///
/// A headless client has no font metrics; labels are estimated the same
/// way the block layout estimates paragraph wrapping.
const GLYPH_WIDTH: f64 = 8.0;

/// Fraction of the box interior a label may occupy before shrinking.
const LABEL_FIT: f64 = 0.8;

/// Computed dimensions for one layout pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridMetrics {
    /// Box width in px
    pub box_width: i64,
    /// Box height in px
    pub box_height: i64,
    /// Margin around each box in px
    pub margin: i64,
    /// Line height of the box interior in px
    pub line_height: i64,
    /// Base font size of the box interior in px
    pub font_size: i64,
    /// Columns in the corrected grid
    pub columns: i64,
    /// Rows in the corrected grid
    pub rows: i64,
}

impl GridMetrics {
    /// Render the stylesheet rules for these metrics. The whole block is
    /// replaced on every pass; there is no incremental update.
    pub fn css(&self) -> String {
        format!(
            "body{{overflow:hidden}}\
             a.outer{{width:{}px;height:{}px}}\
             a.outer div.inner{{height:{}px;line-height:{}px;font-size:{}px}}",
            self.box_width, self.box_height, self.box_height, self.line_height, self.font_size
        )
    }
}

/// Size the status boxes to fill the viewport.
///
/// Returns `None` for an empty board: there is nothing to divide the area
/// by, and the previous stylesheet stays in place.
pub fn scale_boxes(viewport: Viewport, boxes: usize) -> Option<GridMetrics> {
    if boxes == 0 {
        return None;
    }
    let width = f64::from(viewport.width);
    let height = f64::from(viewport.height);
    let count = boxes as f64;

    // Vertical space not available to boxes (header line plus breathing
    // room), scaled slightly with the viewport.
    let view_width = width / 100.0;
    let chrome = 32.0 + view_width;

    let box_area = (height - chrome) * width;
    let per_box = box_area / count;

    let margin = (4.0 + view_width / 2.0).floor() as i64;
    let mut w = per_box.sqrt().floor() as i64 - margin;
    let mut h = ((w * 2) as f64 / 3.0).floor() as i64;

    // Correct if the grid would run past the bottom of the viewport.
    let mut columns = ((width - 1.0) / (w + margin * 2) as f64).floor();
    let mut rows = (count / columns).ceil();
    let height_required = rows * (h + margin * 2) as f64 + chrome;
    if !(height_required <= height) {
        rows = (rows - 1.0).max(1.0);
        columns = (count / rows).ceil();
        let total_margins = (margin * 2) as f64 * columns;
        w = ((width - total_margins) / columns).floor() as i64 - columns as i64;
        h = ((w * 2) as f64 / 3.0).floor() as i64;
    }

    let w = w.max(0);
    let h = h.max(0);

    Some(GridMetrics {
        box_width: w,
        box_height: h,
        margin,
        line_height: h / 4,
        font_size: h / 6,
        columns: (columns.max(1.0)) as i64,
        rows: (rows.max(1.0)) as i64,
    })
}

/// Shrink factor for a label, as a CSS font-size percentage.
///
/// Mirrors the post-layout fit pass: a label wider than [`LABEL_FIT`] of
/// its container is scaled down proportionally; labels that fit are left
/// at the base size (`None`).
pub fn label_scale(container_width: i64, label: &str) -> Option<f64> {
    let label_width = label.chars().count() as f64 * GLYPH_WIDTH;
    if label_width <= 0.0 {
        return None;
    }
    let scale = (container_width as f64 * LABEL_FIT) / label_width;
    if scale < 1.0 {
        Some(scale * 100.0)
    } else {
        None
    }
}
