use crate::surface::Raster;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// A raster cell shows as a dot once its alpha passes this
const LIT_THRESHOLD: f32 = 0.02;

/// Faint dots are brightened so the grid stays visible on a terminal
const MIN_VISIBILITY: f32 = 0.35;

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Convert a raster to Braille characters for a canvas of the given size.
/// The raster is sampled 2x4 per character; mismatched sizes are scaled.
pub fn render_to_braille(raster: &Raster, canvas_width: u16, canvas_height: u16, background: [u8; 3]) -> Vec<BrailleCell> {
    let (raster_cols, raster_rows) = raster.dimensions();

    // Braille effective resolution
    let braille_width = canvas_width as usize * 2;
    let braille_height = canvas_height as usize * 4;
    if braille_width == 0 || braille_height == 0 {
        return Vec::new();
    }

    // Scale factors (pre-calculated once)
    let scale_x = raster_cols as f32 / braille_width as f32;
    let scale_y = raster_rows as f32 / braille_height as f32;

    let mut cells = Vec::new();

    for cy in 0..canvas_height {
        for cx in 0..canvas_width {
            let mut pattern: u8 = 0;
            let mut color_sum = [0.0f32; 3];
            let mut alpha_sum = 0.0f32;
            let mut dot_count = 0usize;

            // Sample the 2x4 dots for this Braille character
            let base_bx = cx as usize * 2;
            let base_by = cy as usize * 4;

            for dx in 0..2 {
                for dy in 0..4 {
                    let col = ((base_bx + dx) as f32 * scale_x) as usize;
                    let row = ((base_by + dy) as f32 * scale_y) as usize;

                    let Some(cell) = raster.cell(col, row) else {
                        continue;
                    };
                    if cell[3] > LIT_THRESHOLD {
                        pattern |= BRAILLE_DOTS[dx][dy];
                        // Premultiplied, so the sum is already alpha-weighted
                        color_sum[0] += cell[0];
                        color_sum[1] += cell[1];
                        color_sum[2] += cell[2];
                        alpha_sum += cell[3];
                        dot_count += 1;
                    }
                }
            }

            // Only emit cells that have at least one dot
            if pattern != 0 {
                let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                let hue = color_sum.map(|c| c / alpha_sum);
                let intensity = alpha_sum / dot_count as f32;
                cells.push(BrailleCell {
                    x: cx,
                    y: cy,
                    char: braille_char,
                    color: shade(hue, intensity, background),
                });
            }
        }
    }

    cells
}

/// Blend a unit-range hue over the background at a boosted intensity
fn shade(hue: [f32; 3], intensity: f32, background: [u8; 3]) -> Color {
    let t = MIN_VISIBILITY + (1.0 - MIN_VISIBILITY) * intensity.clamp(0.0, 1.0);
    let mix = |fg: f32, bg: u8| {
        let bg = bg as f32 / 255.0;
        ((bg + (fg - bg) * t).clamp(0.0, 1.0) * 255.0).round() as u8
    };
    Color::Rgb(
        mix(hue[0], background[0]),
        mix(hue[1], background[1]),
        mix(hue[2], background[2]),
    )
}

/// Raster size in dots for a canvas of the given size in characters
pub fn dot_size(canvas_width: u16, canvas_height: u16) -> (u32, u32) {
    // Braille gives 2x4 resolution per character
    (canvas_width as u32 * 2, canvas_height as u32 * 4)
}
