use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Pointer position as a percentage of the viewport, each axis in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MousePosition {
    pub x: f32,
    pub y: f32,
}

impl MousePosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(0.0, 100.0),
            y: y.clamp(0.0, 100.0),
        }
    }

    /// Map a terminal cell inside `origin..origin+extent` to a percentage pair.
    /// Cells are sampled at their centers; cells outside the canvas pin to
    /// the nearest edge (0 or 100).
    pub fn from_cell(column: u16, row: u16, origin: (u16, u16), extent: (u16, u16)) -> Self {
        let pct = |pos: u16, start: u16, len: u16| {
            if len == 0 || pos < start {
                return 0.0;
            }
            let offset = (pos - start) as f32 + 0.5;
            offset / len as f32 * 100.0
        };
        Self::new(pct(column, origin.0, extent.0), pct(row, origin.1, extent.1))
    }

    /// Project onto a surface of the given pixel size
    pub fn to_pixels(self, width: f32, height: f32) -> glam::Vec2 {
        glam::Vec2::new(self.x / 100.0 * width, self.y / 100.0 * height)
    }

    fn pack(self) -> u64 {
        ((self.x.to_bits() as u64) << 32) | self.y.to_bits() as u64
    }

    fn unpack(bits: u64) -> Self {
        Self {
            x: f32::from_bits((bits >> 32) as u32),
            y: f32::from_bits(bits as u32),
        }
    }
}

/// Latest pointer position, shared between the input handler and the frame loop.
///
/// Both coordinates live in one 64-bit word so a reader never sees an `x`
/// from one update paired with a `y` from another.
#[derive(Debug, Clone, Default)]
pub struct SharedPointer(Arc<AtomicU64>);

impl SharedPointer {
    pub fn new(position: MousePosition) -> Self {
        Self(Arc::new(AtomicU64::new(position.pack())))
    }

    pub fn set(&self, position: MousePosition) {
        self.0.store(position.pack(), Ordering::Release);
    }

    pub fn get(&self) -> MousePosition {
        MousePosition::unpack(self.0.load(Ordering::Acquire))
    }
}
