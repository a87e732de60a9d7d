use thiserror::Error;

use crate::geometry::{ScreenCoordsXY, ZoomLevel};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("pixel buffer must be non-empty, got {width}x{height}")]
    ZeroSize { width: usize, height: usize },
    #[error("stride {stride} is narrower than width {width}")]
    StrideTooSmall { stride: usize, width: usize },
    #[error("pixel storage holds {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// 8-bit palette-indexed render target. `origin` is the screen position of
/// the first pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    origin: ScreenCoordsXY,
    width: usize,
    height: usize,
    stride: usize,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(origin: ScreenCoordsXY, width: usize, height: usize) -> Result<Self, BufferError> {
        Self::from_parts(origin, width, height, width, vec![0; width * height])
    }

    pub fn from_parts(
        origin: ScreenCoordsXY,
        width: usize,
        height: usize,
        stride: usize,
        pixels: Vec<u8>,
    ) -> Result<Self, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::ZeroSize { width, height });
        }
        if stride < width {
            return Err(BufferError::StrideTooSmall { stride, width });
        }
        let expected = stride * height;
        if pixels.len() != expected {
            return Err(BufferError::LengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            origin,
            width,
            height,
            stride,
            pixels,
        })
    }

    pub fn origin(&self) -> ScreenCoordsXY {
        self.origin
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.stride + x).copied()
    }

    pub fn fill(&mut self, colour: u8) {
        self.pixels.fill(colour);
    }

    /// Cuts the rows `top..top + rows` into one disjoint canvas per span.
    ///
    /// `spans` are sorted by `left` and non-overlapping, in native pixels
    /// already clipped to the buffer.
    pub(crate) fn split_columns(
        &mut self,
        top: usize,
        rows: usize,
        spans: &[ColumnSpan],
    ) -> Vec<ColumnCanvas<'_>> {
        let mut canvases: Vec<ColumnCanvas<'_>> = spans
            .iter()
            .map(|span| ColumnCanvas {
                rows: Vec::with_capacity(rows),
                width: span.width,
                view_origin: span.view_origin,
                skip: span.skip,
                zoom: span.zoom,
            })
            .collect();

        let width = self.width;
        for row in self.pixels.chunks_mut(self.stride).skip(top).take(rows) {
            let mut rest = &mut row[..width];
            let mut consumed = 0;
            for (span, canvas) in spans.iter().zip(canvases.iter_mut()) {
                let (_, tail) = std::mem::take(&mut rest).split_at_mut(span.left - consumed);
                let (column, tail) = tail.split_at_mut(span.width);
                canvas.rows.push(column);
                rest = tail;
                consumed = span.left + span.width;
            }
        }
        canvases
    }
}

/// Placement of one column inside the buffer and in view space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnSpan {
    pub left: usize,
    pub width: usize,
    pub view_origin: ScreenCoordsXY,
    pub skip: (i32, i32),
    pub zoom: ZoomLevel,
}

/// Mutable window onto one column of a [`PixelBuffer`].
#[derive(Debug)]
pub struct ColumnCanvas<'a> {
    rows: Vec<&'a mut [u8]>,
    width: usize,
    view_origin: ScreenCoordsXY,
    skip: (i32, i32),
    zoom: ZoomLevel,
}

impl<'a> ColumnCanvas<'a> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    /// View-space point drawn at canvas pixel (`x`, `y`).
    pub fn view_point(&self, x: usize, y: usize) -> ScreenCoordsXY {
        let cx = x as i32 + self.skip.0;
        let cy = y as i32 + self.skip.1;
        ScreenCoordsXY::new(
            self.view_origin.x + self.zoom.apply_to(cx),
            self.view_origin.y + self.zoom.apply_to(cy),
        )
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn set(&mut self, x: usize, y: usize, colour: u8) {
        if let Some(px) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *px = colour;
        }
    }

    pub fn clear(&mut self, colour: u8) {
        for row in &mut self.rows {
            row.fill(colour);
        }
    }

    pub fn remap(&mut self, map: impl Fn(u8) -> u8) {
        for row in &mut self.rows {
            for px in row.iter_mut() {
                *px = map(*px);
            }
        }
    }
}
