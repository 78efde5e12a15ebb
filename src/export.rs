use crate::lifecycle::{EventLoopHost, FrameInput, GridBackground, Viewport};
use crate::pointer::MousePosition;
use crate::render::Palette;
use crate::settings::FieldSettings;
use crate::surface::Raster;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

/// GIF frame delay in hundredths of a second (~50 fps, the format's practical limit)
const GIF_FRAME_DELAY: u16 = 2;
/// NeuQuant speed used when quantizing frames (1 = best, 30 = fastest)
const GIF_QUANTIZE_SPEED: i32 = 10;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("GIF encoding failed: {0}")]
    Gif(#[from] gif::EncodingError),

    #[error("nothing to export: surface is {width}x{height}")]
    EmptyFrame { width: usize, height: usize },

    #[error("GIF frames are limited to 65535x65535, got {width}x{height}")]
    TooLarge { width: usize, height: usize },
}

/// Write the raster flattened over `background` as a PNG
pub fn save_png(raster: &Raster, background: [u8; 3], path: &Path) -> Result<(), ExportError> {
    let (cols, rows) = raster.dimensions();
    let image = image::RgbaImage::from_raw(cols as u32, rows as u32, raster.to_rgba8(background))
        .filter(|_| cols > 0 && rows > 0)
        .ok_or(ExportError::EmptyFrame { width: cols, height: rows })?;
    image.save(path)?;
    tracing::info!(path = %path.display(), width = cols, height = rows, "snapshot saved");
    Ok(())
}

/// Parameters for a headless recording
#[derive(Debug, Clone)]
pub struct Recording {
    pub settings: FieldSettings,
    pub seed: Option<u64>,
    pub width: u32,
    pub height: u32,
    pub frames: usize,
    pub palette: Palette,
    pub background: [u8; 3],
}

/// Run the background on an in-process host and encode every frame to a GIF.
/// The pointer rests at the center of the viewport for the whole run.
pub fn record_gif(recording: &Recording, path: &Path) -> Result<usize, ExportError> {
    let viewport = Viewport::new(recording.width, recording.height);
    let (width, height) = (recording.width as usize, recording.height as usize);
    if viewport.is_empty() {
        return Err(ExportError::EmptyFrame { width, height });
    }
    let (gif_width, gif_height) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(ExportError::TooLarge { width, height }),
    };

    let mut host = EventLoopHost::new(viewport);
    let mut grid = GridBackground::new(recording.settings.clone(), recording.seed);
    grid.activate(&mut host, Raster::new(recording.width, recording.height));

    let input = FrameInput {
        mouse: MousePosition::new(50.0, 50.0),
        palette: recording.palette,
        paused: false,
    };

    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = gif::Encoder::new(writer, gif_width, gif_height, &[])?;
    encoder.set_repeat(gif::Repeat::Infinite)?;

    let mut written = 0;
    while written < recording.frames {
        let due = host.take_due_frames();
        if due.is_empty() {
            break;
        }
        for handle in due {
            if grid.on_frame(&mut host, handle, input).is_none() {
                continue;
            }
            if let Some(surface) = grid.surface() {
                let mut pixels = surface.to_rgba8(recording.background);
                let mut frame = gif::Frame::from_rgba_speed(gif_width, gif_height, &mut pixels, GIF_QUANTIZE_SPEED);
                frame.delay = GIF_FRAME_DELAY;
                encoder.write_frame(&frame)?;
                written += 1;
            }
        }
        tracing::debug!(frame = written, total = recording.frames, "encoded frame");
    }

    grid.deactivate(&mut host);
    tracing::info!(path = %path.display(), frames = written, "recording saved");
    Ok(written)
}
