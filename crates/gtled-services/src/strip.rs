//! In-memory LED strip.
//!
//! Holds the raw pixel values last written and derives the brightness-scaled
//! values a driver would push to the LEDs. Each refresh is logged, which is
//! the only visible output when running without hardware.

use anyhow::{bail, Result};

use crate::buffer::Rgb;
use crate::service::PixelOutput;

#[derive(Debug, Clone)]
pub struct LedStrip {
    pixels: Vec<Rgb>,
    brightness: u8,
    refreshes: u64,
}

impl LedStrip {
    pub fn new(led_count: usize, brightness: u8) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; led_count],
            brightness,
            refreshes: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Number of times the strip has been pushed out.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Raw pixel values, before brightness.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixel(&self, index: usize) -> Option<Rgb> {
        self.pixels.get(index).copied()
    }

    /// Pixel values after brightness scaling.
    pub fn output(&self) -> Vec<Rgb> {
        let scale = |v: u8| (v as u16 * self.brightness as u16 / 255) as u8;
        self.pixels
            .iter()
            .map(|p| Rgb::new(scale(p.r), scale(p.g), scale(p.b)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Rgb::BLACK);
    }

    pub fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<()> {
        let len = self.pixels.len();
        match self.pixels.get_mut(index) {
            Some(pixel) => {
                *pixel = color;
                Ok(())
            }
            None => bail!("pixel {index} out of range (strip has {len})"),
        }
    }

    /// Copy a packed RGB buffer onto the strip. Extra bytes past the strip
    /// are ignored; a short buffer leaves the remaining pixels as they were.
    pub fn show_frame(&mut self, rgb: &[u8]) {
        for (pixel, bytes) in self.pixels.iter_mut().zip(rgb.chunks_exact(3)) {
            *pixel = Rgb::new(bytes[0], bytes[1], bytes[2]);
        }
    }

    pub fn refresh(&mut self) {
        self.refreshes += 1;
        let lit = self.pixels.iter().filter(|p| **p != Rgb::BLACK).count();
        tracing::debug!(
            refresh = self.refreshes,
            lit,
            brightness = self.brightness,
            "strip refreshed"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let head: Vec<u8> = self
                .output()
                .iter()
                .take(8)
                .flat_map(|p| [p.r, p.g, p.b])
                .collect();
            tracing::trace!(head = %hex::encode(head), "scaled strip head");
        }
    }
}

impl PixelOutput for LedStrip {
    fn render_sparse(&mut self, indices: &[u16], color: Rgb) -> Result<()> {
        self.clear();
        let mut skipped = 0usize;
        for &index in indices {
            if self.set_pixel(index as usize, color).is_err() {
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::warn!(
                skipped,
                strip_len = self.pixels.len(),
                "sparse update names pixels past the end of the strip"
            );
        }
        self.refresh();
        Ok(())
    }

    fn render_frame(&mut self, rgb: &[u8]) -> Result<()> {
        if rgb.len() != self.pixels.len() * 3 {
            tracing::warn!(
                bytes = rgb.len(),
                expected = self.pixels.len() * 3,
                "frame size does not match strip"
            );
        }
        self.show_frame(rgb);
        self.refresh();
        Ok(())
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<()> {
        if brightness != self.brightness {
            tracing::info!(from = self.brightness, to = brightness, "brightness changed");
            self.brightness = brightness;
            self.refresh();
        }
        Ok(())
    }

    fn blank(&mut self) -> Result<()> {
        self.clear();
        self.refresh();
        Ok(())
    }
}
