//! Floating panel placement.
//!
//! The panel opens below-right of the pointer and flips to the other side of
//! the pointer on each axis where it would cross the padded viewport edge.
//! A final clamp keeps the top-left corner inside the padding. One pass per
//! axis, no iteration.
//!
//! Units are whatever the caller uses (pixels in a browser-like host, cells in
//! the terminal viewer).

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl PlacementRect {
    pub fn right(&self) -> i32 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.top.saturating_add(self.height)
    }
}

/// Fixed panel dimensions plus the pointer offset and viewport padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PanelGeometry {
    pub width: i32,
    pub height: i32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub padding: i32,
}

impl Default for PanelGeometry {
    fn default() -> Self {
        Self {
            width: 500,
            height: 400,
            offset_x: 20,
            offset_y: 10,
            padding: 20,
        }
    }
}

/// Arithmetic saturates, so extreme geometry never overflows.
pub fn place(pointer: Point, viewport: Size, geometry: &PanelGeometry) -> PlacementRect {
    let g = geometry;
    let mut left = pointer.x.saturating_add(g.offset_x);
    let mut top = pointer.y.saturating_add(g.offset_y);

    // Flip to the left of the pointer.
    if left.saturating_add(g.width) > viewport.width.saturating_sub(g.padding) {
        left = pointer.x.saturating_sub(g.width).saturating_sub(g.offset_x);
    }
    // Flip above the pointer.
    if top.saturating_add(g.height) > viewport.height.saturating_sub(g.padding) {
        top = pointer.y.saturating_sub(g.height).saturating_sub(g.offset_y);
    }

    left = left.max(g.padding);
    top = top.max(g.padding);

    PlacementRect {
        left,
        top,
        width: g.width,
        height: g.height,
    }
}
