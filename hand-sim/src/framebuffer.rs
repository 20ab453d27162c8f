//! In-memory overlay layer standing in for the display controller.

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use hand_pipeline::dp::Compositor;
use hand_pipeline::Fatal;

pub struct FrameBuffer {
    size: Size,
    pixels: Vec<Rgb565>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            pixels: vec![Rgb565::BLACK; (width * height) as usize],
        }
    }

    fn offset(&self, point: Point) -> Option<usize> {
        let (x, y) = (u32::try_from(point.x).ok()?, u32::try_from(point.y).ok()?);
        (x < self.size.width && y < self.size.height).then(|| (y * self.size.width + x) as usize)
    }

    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        self.offset(point).map(|offset| self.pixels[offset])
    }

    /// Pixels of `color`
    pub fn count(&self, color: Rgb565) -> usize {
        self.pixels.iter().filter(|pixel| **pixel == color).count()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(offset) = self.offset(point) {
                self.pixels[offset] = color;
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };

        let width = self.size.width as usize;
        for y in area.top_left.y..=bottom_right.y {
            let row = y as usize * width;
            self.pixels[row + area.top_left.x as usize..=row + bottom_right.x as usize].fill(color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}

/// Two overlay layers, one drawn while the other is scanned out
pub struct SimCompositor {
    layers: [FrameBuffer; 2],
    back: usize,
    commits: u32,
}

impl SimCompositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layers: [FrameBuffer::new(width, height), FrameBuffer::new(width, height)],
            back: 0,
            commits: 0,
        }
    }

    /// Layer currently scanned out
    pub fn front(&self) -> &FrameBuffer {
        &self.layers[1 - self.back]
    }

    pub fn commits(&self) -> u32 {
        self.commits
    }
}

impl Compositor for SimCompositor {
    type Target = FrameBuffer;

    fn drawing_area(&mut self) -> (usize, &mut FrameBuffer) {
        (self.back, &mut self.layers[self.back])
    }

    fn commit(&mut self) -> Result<(), Fatal> {
        self.back = 1 - self.back;
        self.commits = self.commits.wrapping_add(1);
        Ok(())
    }
}
