//! Layout boxes and viewport geometry.

use serde::{Deserialize, Serialize};

/// Axis-aligned layout box in document coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Shift the box by the given offset.
    ///
    /// Used to turn a document-space box into a client-space box
    /// (`rect.translate(0.0, -scroll)`).
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Visible area of the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440.0,
            height: 900.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10.0, 100.0, 50.0, 20.0);
        assert_eq!(rect.top(), 100.0);
        assert_eq!(rect.bottom(), 120.0);
        assert_eq!(rect.right(), 60.0);
    }

    #[test]
    fn test_rect_translate_keeps_size() {
        let rect = Rect::new(0.0, 500.0, 40.0, 40.0).translate(0.0, -200.0);
        assert_eq!(rect.y, 300.0);
        assert_eq!(rect.width, 40.0);
    }
}
