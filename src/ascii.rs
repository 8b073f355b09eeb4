use image::RgbaImage;
use image::imageops::FilterType;

use crate::extract::{Frame, FrameSet};

/// Luminance ramp, increasing density. Dark pixels map to the low end.
pub const ASCII_RAMP: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Cap on frames converted to text. Deliberately tighter than the extraction
/// cap: conversion cost and script size grow with every grid.
pub const MAX_TEXT_FRAMES: usize = 10;

/// One character-grid approximation of a raster frame: `rows` newline-joined
/// lines of exactly `cols` ramp characters, no trailing newline.
pub type TextFrame = String;

/// Target character-grid resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridSize {
    pub cols: u32,
    pub rows: u32,
}

impl GridSize {
    pub const PRESETS: [GridSize; 4] = [
        GridSize { cols: 40, rows: 20 },
        GridSize { cols: 60, rows: 30 },
        GridSize { cols: 80, rows: 40 },
        GridSize { cols: 100, rows: 50 },
    ];
}

impl std::str::FromStr for GridSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cols, rows) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("invalid grid '{s}', expected COLSxROWS"))?;
        let cols: u32 = cols.trim().parse().map_err(|_| format!("invalid grid '{s}'"))?;
        let rows: u32 = rows.trim().parse().map_err(|_| format!("invalid grid '{s}'"))?;
        let grid = GridSize { cols, rows };
        if !GridSize::PRESETS.contains(&grid) {
            let presets = GridSize::PRESETS
                .iter()
                .map(|g| format!("{}x{}", g.cols, g.rows))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(format!("grid '{s}' is not one of: {presets}"));
        }
        Ok(grid)
    }
}

impl std::fmt::Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Convert the leading frames of `set` (at most [`MAX_TEXT_FRAMES`]) into
/// text grids. A frame that cannot be converted becomes an all-space grid;
/// conversion as a whole never fails.
pub fn render_text_frames(set: &FrameSet, grid: GridSize) -> Vec<TextFrame> {
    set.frames()
        .iter()
        .take(MAX_TEXT_FRAMES)
        .map(|frame| {
            frame_to_text(frame, grid).unwrap_or_else(|| {
                tracing::debug!("substituting blank text frame for unconvertible frame");
                blank_text_frame(grid)
            })
        })
        .collect()
}

fn frame_to_text(frame: &Frame, grid: GridSize) -> Option<TextFrame> {
    if grid.cols == 0 || grid.rows == 0 {
        return None;
    }
    let img = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())?;
    let small = image::imageops::resize(&img, grid.cols, grid.rows, FilterType::Nearest);

    let mut out = String::with_capacity((grid.cols as usize + 1) * grid.rows as usize);
    for y in 0..grid.rows {
        if y > 0 {
            out.push('\n');
        }
        for x in 0..grid.cols {
            let px = small.get_pixel(x, y).0;
            out.push(luminance_symbol(px[0], px[1], px[2]));
        }
    }
    Some(out)
}

fn luminance_symbol(r: u8, g: u8, b: u8) -> char {
    let l = (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0;
    let idx = (l * (ASCII_RAMP.len() - 1) as f64).floor() as usize;
    ASCII_RAMP[idx.min(ASCII_RAMP.len() - 1)]
}

fn blank_text_frame(grid: GridSize) -> TextFrame {
    let line = " ".repeat(grid.cols as usize);
    vec![line; grid.rows as usize].join("\n")
}
