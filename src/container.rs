use std::sync::Arc;

use crate::graphics::{Bitmap, Paint, Rectangle};

/// Symbol queued for drawing; `(x, y)` is the top-left corner in tile-local
/// pixels.
#[derive(Debug, Clone)]
pub struct SymbolContainer {
    pub symbol: Arc<Bitmap>,
    pub x: f32,
    pub y: f32,
}

impl SymbolContainer {
    pub fn new(symbol: Arc<Bitmap>, x: f32, y: f32) -> Self {
        Self { symbol, x, y }
    }

    pub fn pixel_boundary(&self) -> Rectangle {
        Rectangle::new(
            self.x,
            self.y,
            self.x + self.symbol.width(),
            self.y + self.symbol.height(),
        )
    }

    /// Identity, not value equality: same bitmap instance at the same spot.
    pub(crate) fn is_same(&self, other: &SymbolContainer) -> bool {
        Arc::ptr_eq(&self.symbol, &other.symbol) && self.x == other.x && self.y == other.y
    }
}

/// Text label anchored at `(x, y)` = left end of the baseline, in tile-local
/// pixels. `boundary` is the text extent relative to the anchor.
#[derive(Debug, Clone)]
pub struct PointTextContainer {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub paint_front: Paint,
    pub paint_back: Option<Paint>,
    pub boundary: Rectangle,
    pub symbol: Option<SymbolContainer>,
}

impl PointTextContainer {
    pub fn new(
        text: impl Into<String>,
        x: f32,
        y: f32,
        paint_front: Paint,
        paint_back: Option<Paint>,
    ) -> Self {
        let text = text.into();
        // The back paint draws the halo and is the wider of the two.
        let measuring = paint_back.as_ref().unwrap_or(&paint_front);
        let boundary = Rectangle::new(
            0.0,
            0.0,
            measuring.measure_text(&text),
            measuring.text_height(),
        );
        Self {
            text,
            x,
            y,
            paint_front,
            paint_back,
            boundary,
            symbol: None,
        }
    }

    pub fn with_symbol(
        text: impl Into<String>,
        x: f32,
        y: f32,
        paint_front: Paint,
        paint_back: Option<Paint>,
        symbol: SymbolContainer,
    ) -> Self {
        let mut container = Self::new(text, x, y, paint_front, paint_back);
        container.symbol = Some(symbol);
        container
    }

    /// Occupied pixel rectangle: the text sits on its baseline anchor.
    pub fn pixel_boundary(&self) -> Rectangle {
        Rectangle::new(
            self.x,
            self.y - self.boundary.height(),
            self.x + self.boundary.width(),
            self.y,
        )
    }
}
