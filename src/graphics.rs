//! Value types shared with the drawing backend.
//!
//! Actual rasterisation lives outside this crate; the placement engine only
//! needs positions, rectangles and enough paint metrics to size a text.

/// Pixel position in tile-local coordinates, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned pixel rectangle, y growing downwards (`top <= bottom`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rectangle {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        !(other.left > self.right
            || other.right < self.left
            || other.top > self.bottom
            || other.bottom < self.top)
    }

    pub fn inflate(&self, margin: f32) -> Rectangle {
        Rectangle::new(
            self.left - margin,
            self.top - margin,
            self.right + margin,
            self.bottom + margin,
        )
    }
}

/// Raster image stand-in; the backend owns the pixels, placement only needs
/// the dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: i32,
    pub height: i32,
}

impl Bitmap {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> f32 {
        self.width as f32
    }

    pub fn height(&self) -> f32 {
        self.height as f32
    }
}

/// Text style carrying the metrics the placement engine measures with.
/// Fixed-advance metrics; a drawing backend substitutes real ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub text_size: f32,
    pub stroke_width: f32,
    pub color: u32,
}

impl Paint {
    pub fn new(text_size: f32, stroke_width: f32, color: u32) -> Self {
        Self {
            text_size,
            stroke_width,
            color,
        }
    }

    pub fn measure_text(&self, text: &str) -> f32 {
        self.text_size * 0.5 * text.chars().count() as f32
    }

    pub fn text_height(&self) -> f32 {
        self.text_size
    }
}
