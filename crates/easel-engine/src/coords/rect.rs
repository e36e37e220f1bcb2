use glam::Vec2;

/// Axis-aligned rectangle in logical pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { origin: Vec2::new(x, y), size: Vec2::new(w, h) }
    }

    /// Builds a rectangle from `[min_x, min_y, max_x, max_y]`.
    #[inline]
    pub fn from_bounds([x0, y0, x1, y1]: [f32; 4]) -> Self {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    /// `[min_x, min_y, max_x, max_y]` of the normalized rectangle.
    #[inline]
    pub fn bounds(self) -> [f32; 4] {
        let r = self.normalized();
        let max = r.max();
        [r.origin.x, r.origin.y, max.x, max.y]
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let min = self.origin.min(self.origin + self.size);
        let max = self.origin.max(self.origin + self.size);
        Self { origin: min, size: max - min }
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let [x0, y0, x1, y1] = self.bounds();
        p.x >= x0 && p.y >= y0 && p.x < x1 && p.y < y1
    }

    /// Overlap of two rectangles; `None` when they only touch or are disjoint.
    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let [ax0, ay0, ax1, ay1] = self.bounds();
        let [bx0, by0, bx1, by1] = other.bounds();
        let r = Rect::from_bounds([ax0.max(bx0), ay0.max(by0), ax1.min(bx1), ay1.min(by1)]);
        if r.is_empty() { None } else { Some(r) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(x, y, w, h)
    }

    #[test]
    fn normalized_negative_size() {
        let n = r(10.0, 10.0, -4.0, -3.0).normalized();
        assert_eq!(n, r(6.0, 7.0, 4.0, 3.0));
    }

    #[test]
    fn bounds_round_trip() {
        let rect = r(1.0, 2.0, 10.0, 20.0);
        assert_eq!(rect.bounds(), [1.0, 2.0, 11.0, 22.0]);
        assert_eq!(Rect::from_bounds(rect.bounds()), rect);
    }

    #[test]
    fn contains_is_half_open() {
        let rect = r(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Vec2::new(0.0, 0.0)));
        assert!(!rect.contains(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn intersect_overlapping() {
        let i = r(0.0, 0.0, 10.0, 10.0).intersect(r(5.0, 5.0, 10.0, 10.0));
        assert_eq!(i, Some(r(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn intersect_touching_edge_returns_none() {
        assert!(r(0.0, 0.0, 10.0, 10.0).intersect(r(10.0, 0.0, 10.0, 10.0)).is_none());
    }
}
