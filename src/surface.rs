use glam::Vec2;

/// Straight (non-premultiplied) color with a fractional alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(rgb: [u8; 3], a: f32) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2], a)
    }

    /// Same hue with `alpha` clamped to `[0, 1]`
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// A drawable target addressed in logical pixels
pub trait Surface {
    /// Current size in logical pixels
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    /// Make every pixel fully transparent
    fn clear(&mut self);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
}

/// Premultiplied RGBA buffer with source-over compositing.
///
/// Each raster cell covers `scale x scale` logical pixels, which lets the
/// terminal view keep pixel-based distances while only storing one cell
/// per braille dot.
pub struct Raster {
    width: u32,
    height: u32,
    scale: f32,
    cols: usize,
    rows: usize,
    /// Premultiplied `[r, g, b, a]`, all in `[0, 1]`
    cells: Vec<[f32; 4]>,
}

impl Raster {
    /// One cell per logical pixel
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_scale(width, height, 1.0)
    }

    pub fn with_scale(width: u32, height: u32, scale: f32) -> Self {
        let mut raster = Self {
            width: 0,
            height: 0,
            scale: scale.max(1.0),
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        };
        raster.resize(width, height);
        raster
    }

    /// Size in cells
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Premultiplied cell value, `None` outside the raster
    pub fn cell(&self, col: usize, row: usize) -> Option<[f32; 4]> {
        if col < self.cols && row < self.rows {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn alpha_at(&self, col: usize, row: usize) -> f32 {
        self.cell(col, row).map_or(0.0, |c| c[3])
    }

    /// Flatten over an opaque background into row-major RGBA8
    pub fn to_rgba8(&self, background: [u8; 3]) -> Vec<u8> {
        let bg = background.map(|c| c as f32 / 255.0);
        let mut out = Vec::with_capacity(self.cells.len() * 4);
        for cell in &self.cells {
            let keep = 1.0 - cell[3];
            for ch in 0..3 {
                let value = cell[ch] + bg[ch] * keep;
                out.push((value.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
            out.push(255);
        }
        out
    }

    fn to_cell_space(&self, point: Vec2) -> Vec2 {
        point / self.scale
    }

    /// Composite `color` over one cell, scaled by `coverage`
    fn plot(&mut self, col: i64, row: i64, color: Rgba, coverage: f32) {
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return;
        }
        let alpha = (color.a * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let src = [
            color.r as f32 / 255.0 * alpha,
            color.g as f32 / 255.0 * alpha,
            color.b as f32 / 255.0 * alpha,
            alpha,
        ];
        let dst = &mut self.cells[row as usize * self.cols + col as usize];
        let keep = 1.0 - alpha;
        for ch in 0..4 {
            dst[ch] = src[ch] + dst[ch] * keep;
        }
    }
}

impl Surface for Raster {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.cols = (width as f32 / self.scale).ceil() as usize;
        self.rows = (height as f32 / self.scale).ceil() as usize;
        self.cells = vec![[0.0; 4]; self.cols * self.rows];
    }

    fn clear(&mut self) {
        self.cells.fill([0.0; 4]);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let c = self.to_cell_space(center);
        let r = radius / self.scale;

        let min_col = (c.x - r).floor() as i64;
        let max_col = (c.x + r).ceil() as i64;
        let min_row = (c.y - r).floor() as i64;
        let max_row = (c.y + r).ceil() as i64;

        let mut plotted = false;
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                let cell_center = Vec2::new(col as f32 + 0.5, row as f32 + 0.5);
                if cell_center.distance(c) <= r {
                    self.plot(col, row, color, 1.0);
                    plotted = true;
                }
            }
        }

        // Circles smaller than a cell still light the cell under their center
        if !plotted {
            self.plot(c.x.floor() as i64, c.y.floor() as i64, color, 1.0);
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        let a = self.to_cell_space(from);
        let b = self.to_cell_space(to);
        let coverage = width.min(1.0);
        let steps = a.distance(b).ceil().max(1.0) as usize;

        let mut last = None;
        for i in 0..=steps {
            let p = a.lerp(b, i as f32 / steps as f32);
            let cell = (p.x.floor() as i64, p.y.floor() as i64);
            if last == Some(cell) {
                continue;
            }
            last = Some(cell);
            self.plot(cell.0, cell.1, color, coverage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgba = Rgba::new(59, 130, 246, 1.0);

    #[test]
    fn test_with_alpha_clamps() {
        assert_eq!(BLUE.with_alpha(-0.2).a, 0.0);
        assert_eq!(BLUE.with_alpha(3.0).a, 1.0);
        assert_eq!(BLUE.with_alpha(0.25).a, 0.25);
    }

    #[test]
    fn test_scaled_dimensions() {
        let raster = Raster::with_scale(10, 9, 4.0);
        assert_eq!(raster.size(), (10, 9));
        assert_eq!(raster.dimensions(), (3, 3));
    }

    #[test]
    fn test_resize_clears_and_reallocates() {
        let mut raster = Raster::new(4, 4);
        raster.fill_circle(Vec2::new(2.0, 2.0), 1.0, BLUE);
        raster.resize(8, 2);
        assert_eq!(raster.size(), (8, 2));
        assert_eq!(raster.dimensions(), (8, 2));
        assert!((0..8).all(|c| raster.alpha_at(c, 0) == 0.0));
    }

    #[test]
    fn test_source_over_accumulates() {
        let mut raster = Raster::new(2, 2);
        let half = BLUE.with_alpha(0.5);
        raster.fill_circle(Vec2::new(0.5, 0.5), 0.1, half);
        assert!((raster.alpha_at(0, 0) - 0.5).abs() < 1e-6);
        raster.fill_circle(Vec2::new(0.5, 0.5), 0.1, half);
        assert!((raster.alpha_at(0, 0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_clear_resets_alpha() {
        let mut raster = Raster::new(3, 3);
        raster.fill_circle(Vec2::new(1.5, 1.5), 1.0, BLUE);
        raster.clear();
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(raster.alpha_at(col, row), 0.0);
            }
        }
    }

    #[test]
    fn test_out_of_bounds_draws_ignored() {
        let mut raster = Raster::new(4, 4);
        raster.fill_circle(Vec2::new(-10.0, -10.0), 2.0, BLUE);
        raster.stroke_line(Vec2::new(-5.0, 20.0), Vec2::new(20.0, 20.0), 1.0, BLUE);
        assert!(raster.cells.iter().all(|c| c[3] == 0.0));
    }

    #[test]
    fn test_circle_covers_its_disc() {
        let mut raster = Raster::new(10, 10);
        raster.fill_circle(Vec2::new(5.0, 5.0), 2.0, BLUE);
        assert_eq!(raster.alpha_at(4, 4), 1.0);
        assert_eq!(raster.alpha_at(5, 5), 1.0);
        assert_eq!(raster.alpha_at(0, 0), 0.0);
        assert_eq!(raster.alpha_at(9, 5), 0.0);
    }

    #[test]
    fn test_line_plots_each_cell_once() {
        let mut raster = Raster::new(10, 1);
        raster.stroke_line(Vec2::new(0.5, 0.5), Vec2::new(9.5, 0.5), 1.0, BLUE.with_alpha(0.5));
        for col in 0..10 {
            assert!((raster.alpha_at(col, 0) - 0.5).abs() < 1e-6, "col {}", col);
        }
    }

    #[test]
    fn test_thin_line_coverage() {
        let mut raster = Raster::new(4, 1);
        raster.stroke_line(Vec2::new(0.5, 0.5), Vec2::new(3.5, 0.5), 0.5, BLUE.with_alpha(0.4));
        assert!((raster.alpha_at(1, 0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_flatten_over_background() {
        let mut raster = Raster::new(2, 1);
        raster.fill_circle(Vec2::new(0.5, 0.5), 0.1, Rgba::new(255, 0, 0, 1.0));
        let rgba = raster.to_rgba8([0, 0, 255]);
        assert_eq!(&rgba[0..4], &[255, 0, 0, 255]);
        assert_eq!(&rgba[4..8], &[0, 0, 255, 255]);
    }
}
