//! # Geometry
//!
//! Screen-space and canvas-space primitives used by hit-testing, drop
//! indicators and canvas placement.
//!
//! - [`Point`]: a pointer position (client or model space)
//! - [`Rect`]: a client-space rectangle (left/top/width/height)
//! - [`Bound`]: a canvas model-space box, stored on blocks as `"[x,y,w,h]"`

use crate::{CommonError, CommonResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in client (view) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Build from left, width, top, height (argument order of the view layer)
    pub fn from_lwth(left: f64, width: f64, top: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }
}

/// Box in canvas model space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bound {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Bound {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Canonical `[x,y,w,h]` descriptor stored in the `xywh` prop
    pub fn serialize(&self) -> String {
        format!("[{},{},{},{}]", self.x, self.y, self.w, self.h)
    }

    /// Parse a `[x,y,w,h]` descriptor
    pub fn deserialize(descriptor: &str) -> CommonResult<Self> {
        let inner = descriptor
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| CommonError::MalformedBound(descriptor.to_string()))?;

        let values = inner
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| CommonError::MalformedBound(descriptor.to_string()))?;

        match values.as_slice() {
            [x, y, w, h] => Ok(Self::new(*x, *y, *w, *h)),
            _ => Err(CommonError::MalformedBound(descriptor.to_string())),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}
