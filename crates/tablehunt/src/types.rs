use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Handle of a node inside a [`ContentTree`](crate::tree::ContentTree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// One of the two grid axes.  `X` dividers separate columns, `Y` dividers
/// separate rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Axis-aligned rectangle in page space.  `y` grows downward, so `y0` is the
/// top edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        !(self.x0 < self.x1 && self.y0 < self.y1)
    }

    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.x0 <= self.x1
            && self.y0 <= self.y1
    }

    pub fn lo(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x0,
            Axis::Y => self.y0,
        }
    }

    pub fn hi(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x1,
            Axis::Y => self.y1,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Union of an iterator of rectangles, `None` when it yields nothing.
    pub fn union_all<I: IntoIterator<Item = Rect>>(rects: I) -> Option<Rect> {
        rects.into_iter().reduce(|acc, r| acc.union(&r))
    }

    pub fn expand(&self, by: f64) -> Rect {
        Rect {
            x0: self.x0 - by,
            y0: self.y0 - by,
            x1: self.x1 + by,
            y1: self.y1 + by,
        }
    }

    /// Touching edges count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x0, self.y0, self.x1, self.y1)
    }
}

impl FromStr for Rect {
    type Err = InvalidRect;

    /// Parse `"x0,y0,x1,y1"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let vals: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>().map_err(|_| InvalidRect))
            .collect::<Result<_, _>>()?;
        if vals.len() != 4 {
            return Err(InvalidRect);
        }
        let rect = Rect::new(vals[0], vals[1], vals[2], vals[3]);
        if !rect.is_valid() {
            return Err(InvalidRect);
        }
        Ok(rect)
    }
}

#[derive(Debug, Error)]
#[error("Invalid rectangle (expected 'x0,y0,x1,y1' with x0 <= x1 and y0 <= y1)")]
pub struct InvalidRect;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_parse_valid() {
        let r: Rect = "0,10, 20.5,30".parse().unwrap();
        assert_eq!(r, Rect::new(0.0, 10.0, 20.5, 30.0));
    }

    #[test]
    fn test_rect_parse_invalid() {
        assert!("1,2,3".parse::<Rect>().is_err());
        assert!("a,b,c,d".parse::<Rect>().is_err());
        assert!("10,0,0,10".parse::<Rect>().is_err());
    }

    #[test]
    fn test_rect_union_and_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 5.0, 20.0, 30.0);
        assert!(a.intersects(&b));
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 20.0, 30.0));
        assert!(!a.intersects(&Rect::new(11.0, 0.0, 12.0, 1.0)));
    }

    #[test]
    fn test_rect_union_all_empty() {
        assert!(Rect::union_all(Vec::new()).is_none());
    }

    #[test]
    fn test_axis_accessors() {
        let r = Rect::new(1.0, 2.0, 5.0, 9.0);
        assert_eq!(r.lo(Axis::X), 1.0);
        assert_eq!(r.hi(Axis::Y), 9.0);
        assert_eq!(Axis::X.other(), Axis::Y);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId::new(7)), "n7");
    }
}
