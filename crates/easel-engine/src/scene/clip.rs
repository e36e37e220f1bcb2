use crate::coords::Rect;

/// Optional axis-aligned visibility restriction, in logical pixels.
///
/// `ClipArea::UNBOUNDED` draws everywhere.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ClipArea(Option<Rect>);

impl ClipArea {
    pub const UNBOUNDED: Self = Self(None);

    /// Bounds written for an unbounded clip.
    pub const SENTINEL: [f32; 4] = [-f32::MAX, -f32::MAX, f32::MAX, f32::MAX];

    #[inline]
    pub fn rect(rect: Rect) -> Self {
        Self(Some(rect.normalized()))
    }

    #[inline]
    pub fn get(self) -> Option<Rect> {
        self.0
    }

    #[inline]
    pub fn is_bounded(self) -> bool {
        self.0.is_some()
    }

    /// `[min_x, min_y, max_x, max_y]`, or [`ClipArea::SENTINEL`] when unbounded.
    #[inline]
    pub fn bounds(self) -> [f32; 4] {
        self.0.map_or(Self::SENTINEL, Rect::bounds)
    }

    /// Nested clip: the overlap of both areas. Disjoint areas produce an empty
    /// (zero-size) clip that hides everything.
    pub fn intersect(self, other: ClipArea) -> ClipArea {
        match (self.0, other.0) {
            (None, o) | (o, None) => Self(o),
            (Some(a), Some(b)) => Self(Some(a.intersect(b).unwrap_or(Rect::new(a.origin.x, a.origin.y, 0.0, 0.0)))),
        }
    }
}

impl From<Rect> for ClipArea {
    fn from(rect: Rect) -> Self {
        Self::rect(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_uses_sentinel() {
        assert_eq!(ClipArea::UNBOUNDED.bounds(), [-f32::MAX, -f32::MAX, f32::MAX, f32::MAX]);
    }

    #[test]
    fn bounded_reports_min_max() {
        let clip = ClipArea::rect(Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(clip.bounds(), [10.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn intersect_nests() {
        let outer = ClipArea::rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let inner = ClipArea::rect(Rect::new(50.0, 50.0, 100.0, 100.0));
        assert_eq!(outer.intersect(inner).bounds(), [50.0, 50.0, 100.0, 100.0]);
        assert_eq!(ClipArea::UNBOUNDED.intersect(inner), inner);
    }

    #[test]
    fn disjoint_intersection_hides_everything() {
        let a = ClipArea::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = ClipArea::rect(Rect::new(20.0, 20.0, 10.0, 10.0));
        assert!(a.intersect(b).get().unwrap().is_empty());
    }
}
