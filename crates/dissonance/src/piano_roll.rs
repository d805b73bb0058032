//! Piano-roll rasterization.
//!
//! Time runs left to right, pitch 127 is the top row. Notes are gray bars
//! with black outlines over a pitch grid (a dark line every five pitches)
//! and a vertical marker every `beat_line_every` beats.

use crate::score::NoteRecord;
use crate::{Error, Result};
use std::path::Path;

const WHITE: [u8; 3] = [255, 255, 255];
const MINOR_GRID: [u8; 3] = [220, 220, 220];
const MAJOR_GRID: [u8; 3] = [90, 90, 90];
const BEAT_LINE: [u8; 3] = [160, 160, 160];
const NOTE_FILL: [u8; 3] = [128, 128, 128];
const NOTE_EDGE: [u8; 3] = [0, 0, 0];

const PITCH_ROWS: u32 = 128;

/// Upper bound on the raw RGB buffer (256 MiB).
pub const MAX_ROLL_BYTES: usize = 256 << 20;

#[derive(Debug, Clone)]
pub struct RollOptions {
    pub pixels_per_beat: u32,
    pub pixels_per_pitch: u32,
    pub beat_line_every: u32,
    pub major_pitch_every: u32,
}

impl Default for RollOptions {
    fn default() -> Self {
        Self {
            pixels_per_beat: 8,
            pixels_per_pitch: 4,
            beat_line_every: 100,
            major_pitch_every: 5,
        }
    }
}

/// An 8-bit RGB raster of a set of notes.
#[derive(Debug, Clone)]
pub struct PianoRoll {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PianoRoll {
    /// Rasterize `notes`; fails when the image would exceed [`MAX_ROLL_BYTES`].
    pub fn render(notes: &[NoteRecord], options: &RollOptions) -> Result<Self> {
        let ppb = options.pixels_per_beat.max(1) as f64;
        let ppp = options.pixels_per_pitch.max(1);

        // Last onset plus longest duration bounds every note end
        let max_time = notes.iter().map(|n| n.time).fold(0.0, f64::max)
            + notes.iter().map(|n| n.duration).fold(0.0, f64::max);
        let too_large = || Error::ImageTooLarge {
            width_beats: max_time,
            pixels_per_beat: options.pixels_per_beat,
        };

        let height = PITCH_ROWS.checked_mul(ppp).ok_or_else(too_large)?;
        let columns = (max_time * ppb).ceil();
        if !columns.is_finite() || columns > u32::MAX as f64 {
            return Err(too_large());
        }
        let width = (columns as u32).max(1);
        let bytes = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(3))
            .filter(|&b| b <= MAX_ROLL_BYTES)
            .ok_or_else(too_large)?;

        let mut roll = Self {
            width,
            height,
            pixels: vec![0; bytes],
        };
        for px in roll.pixels.chunks_exact_mut(3) {
            px.copy_from_slice(&WHITE);
        }

        for pitch in 0..PITCH_ROWS {
            let y = row_top(pitch, ppp) + ppp / 2;
            let color = if options.major_pitch_every > 0 && pitch % options.major_pitch_every == 0 {
                MAJOR_GRID
            } else {
                MINOR_GRID
            };
            roll.hline(y, 0, width, color);
        }

        if options.beat_line_every > 0 {
            let step = options.beat_line_every as f64 * ppb;
            let mut x = 0.0;
            while (x as u32) < width {
                roll.vline(x as u32, BEAT_LINE);
                x += step;
            }
        }

        let bar_height = (ppp * 4 / 5).max(1);
        for note in notes {
            let Ok(pitch) = u32::try_from(note.pitch) else {
                continue;
            };
            if pitch >= PITCH_ROWS {
                continue;
            }
            let x0 = (note.time * ppb).floor() as u32;
            let x1 = ((note.end_time() * ppb).ceil() as u32)
                .max(x0.saturating_add(1))
                .min(width);
            let y0 = row_top(pitch, ppp);
            roll.bar(x0, x1, y0, y0 + bar_height);
        }

        Ok(roll)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut data, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
        }
        Ok(data)
    }

    pub fn write_png(&self, path: &Path) -> Result<()> {
        let data = self.encode_png()?;
        std::fs::write(path, data)?;
        Ok(())
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    fn set(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x < self.width && y < self.height {
            let i = self.offset(x, y);
            self.pixels[i..i + 3].copy_from_slice(&color);
        }
    }

    fn hline(&mut self, y: u32, x0: u32, x1: u32, color: [u8; 3]) {
        for x in x0..x1 {
            self.set(x, y, color);
        }
    }

    fn vline(&mut self, x: u32, color: [u8; 3]) {
        for y in 0..self.height {
            self.set(x, y, color);
        }
    }

    fn bar(&mut self, x0: u32, x1: u32, y0: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                let edge = x == x0 || x + 1 == x1 || y == y0 || y + 1 == y1;
                self.set(x, y, if edge { NOTE_EDGE } else { NOTE_FILL });
            }
        }
    }
}

fn row_top(pitch: u32, pixels_per_pitch: u32) -> u32 {
    (PITCH_ROWS - 1 - pitch) * pixels_per_pitch
}
