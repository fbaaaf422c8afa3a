//! Integer cell geometry shared by layout, painting, and hit-testing.
//!
//! Coordinates are signed so that offsets and anchors can move a point anywhere (including left
//! of or above its parent) without saturating. Conversion to and from `ratatui`'s unsigned
//! [`ratatui::layout::Rect`] happens at the edges only.

use ratatui::layout::Rect;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn translate(self, offset: Offset) -> Self {
        Self {
            x: self.x + offset.dx,
            y: self.y + offset.dy,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const ZERO: Offset = Offset { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn then(self, next: Offset) -> Self {
        Self {
            dx: self.dx + next.dx,
            dy: self.dy + next.dy,
        }
    }
}

impl std::ops::Neg for Offset {
    type Output = Offset;

    fn neg(self) -> Offset {
        Offset::new(-self.dx, -self.dy)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
        }
    }
}

/// An axis-aligned rectangle; `x`/`y` is the top-left cell, the right and bottom edges are
/// exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CellRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Containment test. Empty rectangles contain nothing.
    pub fn contains(&self, p: Point) -> bool {
        !self.is_empty()
            && p.x >= self.x
            && p.x < self.right()
            && p.y >= self.y
            && p.y < self.bottom()
    }

    pub fn translate(self, offset: Offset) -> Self {
        Self {
            x: self.x + offset.dx,
            y: self.y + offset.dy,
            ..self
        }
    }

    pub fn intersection(&self, other: &CellRect) -> Option<CellRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(CellRect::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Clips to the non-negative quadrant and converts to a ratatui [`Rect`].
    pub fn to_rect(&self) -> Option<Rect> {
        let max = i32::from(u16::MAX);
        let clipped = self.intersection(&CellRect::new(0, 0, max, max))?;
        Some(Rect::new(
            clipped.x as u16,
            clipped.y as u16,
            clipped.width as u16,
            clipped.height as u16,
        ))
    }
}

impl From<Rect> for CellRect {
    fn from(r: Rect) -> Self {
        CellRect::new(
            i32::from(r.x),
            i32::from(r.y),
            i32::from(r.width),
            i32::from(r.height),
        )
    }
}
