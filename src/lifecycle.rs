use crate::pointer::MousePosition;
use crate::render::{self, FrameStats, Palette};
use crate::settings::FieldSettings;
use crate::simulation::ParticleField;
use crate::surface::Surface;
use std::time::{Duration, Instant};

/// Viewport size in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Cancellation handle for one requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

/// Registration token for a resize listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The environment a background is mounted into: it hands out frames
/// and forwards viewport changes to registered listeners.
pub trait Host {
    fn viewport(&self) -> Viewport;
    /// Ask for one callback on the next frame
    fn request_frame(&mut self) -> FrameHandle;
    /// Drop a pending frame request; unknown handles are ignored
    fn cancel_frame(&mut self, handle: FrameHandle);
    fn add_resize_listener(&mut self) -> ListenerId;
    fn remove_resize_listener(&mut self, id: ListenerId);
}

/// Single-threaded host driven by an outer event loop.
///
/// The loop calls [`EventLoopHost::take_due_frames`] once per display tick
/// and delivers each handle to its owner; frames requested while those
/// callbacks run are due on the following tick.
#[derive(Debug, Default)]
pub struct EventLoopHost {
    viewport: Viewport,
    next_id: u64,
    pending_frames: Vec<FrameHandle>,
    resize_listeners: Vec<ListenerId>,
}

impl EventLoopHost {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn take_due_frames(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.pending_frames)
    }

    /// Record a new viewport and return the listeners to notify
    pub fn set_viewport(&mut self, viewport: Viewport) -> Vec<ListenerId> {
        self.viewport = viewport;
        self.resize_listeners.clone()
    }

    #[cfg(test)]
    pub fn pending_frames(&self) -> usize {
        self.pending_frames.len()
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.resize_listeners.len()
    }
}

impl Host for EventLoopHost {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.pending_frames.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending_frames.retain(|h| *h != handle);
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.resize_listeners.push(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.resize_listeners.retain(|l| *l != id);
    }
}

/// Display refresh pacing for the outer loop. Input events may wake the
/// loop at any time; frames are only delivered once per interval.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    interval: Duration,
    next_frame: Instant,
}

impl FrameClock {
    /// The first frame is due immediately
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_frame: now,
        }
    }

    /// True once per elapsed interval. A loop that fell behind resumes from
    /// `now` instead of delivering a burst of catch-up frames.
    pub fn frame_due(&mut self, now: Instant) -> bool {
        if now < self.next_frame {
            return false;
        }
        self.next_frame += self.interval;
        if self.next_frame <= now {
            self.next_frame = now + self.interval;
        }
        true
    }

    /// How long to wait for input before the next frame is due
    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_frame.saturating_duration_since(now)
    }
}

/// Per-frame inputs read by the background
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub mouse: MousePosition,
    pub palette: Palette,
    /// Keep drawing but do not advance the particles
    pub paused: bool,
}

struct Mounted<S> {
    field: ParticleField,
    surface: S,
    frame: FrameHandle,
    resize_listener: ListenerId,
    frames: u64,
    last_stats: FrameStats,
}

/// The animated particle grid as a mountable component.
///
/// While active it owns the particle store and the surface, keeps exactly
/// one frame request outstanding and listens for viewport changes.
/// Deactivation cancels both in one call.
pub struct GridBackground<S: Surface> {
    settings: FieldSettings,
    seed: Option<u64>,
    mounted: Option<Mounted<S>>,
}

impl<S: Surface> GridBackground<S> {
    pub fn new(settings: FieldSettings, seed: Option<u64>) -> Self {
        Self {
            settings,
            seed,
            mounted: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.mounted.is_some()
    }

    /// Settings apply on the next activation
    pub fn set_settings(&mut self, settings: FieldSettings) {
        self.settings = settings;
    }

    /// Mount onto `surface`: size it to the viewport, seed a fresh particle
    /// store and start the frame loop. An already active background is torn
    /// down first; its surface is dropped.
    pub fn activate<H: Host>(&mut self, host: &mut H, mut surface: S) {
        self.deactivate(host);

        let viewport = host.viewport();
        surface.resize(viewport.width, viewport.height);
        let field = ParticleField::seeded(
            self.settings.clone(),
            viewport.width as f32,
            viewport.height as f32,
            self.seed,
        );

        let frame = host.request_frame();
        let resize_listener = host.add_resize_listener();
        tracing::info!(
            particles = field.len(),
            width = viewport.width,
            height = viewport.height,
            "grid background activated"
        );

        self.mounted = Some(Mounted {
            field,
            surface,
            frame,
            resize_listener,
            frames: 0,
            last_stats: FrameStats::default(),
        });
    }

    /// Stop the frame loop and detach the resize listener, returning the
    /// surface. Does nothing when inactive.
    pub fn deactivate<H: Host>(&mut self, host: &mut H) -> Option<S> {
        let mounted = self.mounted.take()?;
        host.cancel_frame(mounted.frame);
        host.remove_resize_listener(mounted.resize_listener);
        tracing::info!(frames = mounted.frames, "grid background deactivated");
        Some(mounted.surface)
    }

    /// Frame callback: step, render, and request the next frame.
    ///
    /// Handles that are not the currently outstanding request are ignored
    /// and return `None`. A zero-sized surface skips both step and render.
    pub fn on_frame<H: Host>(&mut self, host: &mut H, handle: FrameHandle, input: FrameInput) -> Option<FrameStats> {
        let mounted = self.mounted.as_mut()?;
        if mounted.frame != handle {
            return None;
        }

        let (width, height) = mounted.surface.size();
        if width > 0 && height > 0 {
            if !input.paused {
                mounted.field.step(input.mouse, width as f32, height as f32);
            }
            mounted.last_stats = render::render_frame(
                mounted.field.particles(),
                mounted.field.settings(),
                input.palette,
                &mut mounted.surface,
            );
            mounted.frames += 1;
        }

        mounted.frame = host.request_frame();
        Some(mounted.last_stats)
    }

    /// Resize notification for `listener`. Particle positions are left as
    /// they are; stale listener ids are ignored.
    pub fn on_resize(&mut self, listener: ListenerId, viewport: Viewport) {
        if let Some(mounted) = self.mounted.as_mut() {
            if mounted.resize_listener == listener {
                mounted.surface.resize(viewport.width, viewport.height);
                tracing::debug!(width = viewport.width, height = viewport.height, "surface resized");
            }
        }
    }

    pub fn surface(&self) -> Option<&S> {
        self.mounted.as_ref().map(|m| &m.surface)
    }

    #[cfg(test)]
    pub fn field(&self) -> Option<&ParticleField> {
        self.mounted.as_ref().map(|m| &m.field)
    }

    pub fn frames(&self) -> u64 {
        self.mounted.as_ref().map_or(0, |m| m.frames)
    }

    pub fn last_stats(&self) -> FrameStats {
        self.mounted.as_ref().map_or_else(FrameStats::default, |m| m.last_stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Raster;

    fn background() -> GridBackground<Raster> {
        GridBackground::new(FieldSettings::default(), Some(17))
    }

    /// Deliver every due frame once, like one tick of the outer loop
    fn tick(host: &mut EventLoopHost, grid: &mut GridBackground<Raster>, input: FrameInput) -> Vec<FrameStats> {
        let mut stats = Vec::new();
        for handle in host.take_due_frames() {
            stats.extend(grid.on_frame(host, handle, input));
        }
        stats
    }

    #[test]
    fn test_frame_clock_ignores_extra_wakeups() {
        let start = Instant::now();
        let interval = Duration::from_millis(16);
        let mut clock = FrameClock::new(interval, start);

        // A burst of input events within one interval yields a single frame
        let frames = (0..16)
            .filter(|ms| clock.frame_due(start + Duration::from_millis(*ms)))
            .count();
        assert_eq!(frames, 1);
        assert_eq!(clock.until_next(start + Duration::from_millis(10)), Duration::from_millis(6));

        assert!(clock.frame_due(start + interval));
        assert!(!clock.frame_due(start + interval + Duration::from_millis(1)));
    }

    #[test]
    fn test_frame_clock_does_not_catch_up() {
        let start = Instant::now();
        let interval = Duration::from_millis(16);
        let mut clock = FrameClock::new(interval, start);
        assert!(clock.frame_due(start));

        // One late wakeup after a stall delivers one frame, not six
        let late = start + Duration::from_millis(100);
        assert!(clock.frame_due(late));
        assert!(!clock.frame_due(late));
        assert_eq!(clock.until_next(late), interval);
    }

    #[test]
    fn test_activate_sizes_surface_and_schedules() {
        let mut host = EventLoopHost::new(Viewport::new(800, 600));
        let mut grid = background();
        grid.activate(&mut host, Raster::with_scale(1, 1, 4.0));

        assert!(grid.is_active());
        assert_eq!(grid.surface().map(|s| s.size()), Some((800, 600)));
        assert_eq!(grid.field().map(|f| f.len()), Some(100));
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(host.listener_count(), 1);
    }

    #[test]
    fn test_frame_loop_resubmits_itself() {
        let mut host = EventLoopHost::new(Viewport::new(400, 300));
        let mut grid = background();
        grid.activate(&mut host, Raster::with_scale(0, 0, 4.0));

        for n in 1..=5 {
            let stats = tick(&mut host, &mut grid, FrameInput::default());
            assert_eq!(stats.len(), 1);
            assert_eq!(stats[0].particles, 100);
            assert_eq!(host.pending_frames(), 1);
            assert_eq!(grid.frames(), n);
        }
    }

    #[test]
    fn test_deactivate_tears_down_everything() {
        let mut host = EventLoopHost::new(Viewport::new(400, 300));
        let mut grid = background();
        grid.activate(&mut host, Raster::with_scale(0, 0, 4.0));
        tick(&mut host, &mut grid, FrameInput::default());

        let surface = grid.deactivate(&mut host);
        assert!(surface.is_some());
        assert!(!grid.is_active());
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.listener_count(), 0);

        // Nothing is scheduled any more, and a second teardown is a no-op
        assert!(tick(&mut host, &mut grid, FrameInput::default()).is_empty());
        assert!(grid.deactivate(&mut host).is_none());
    }

    #[test]
    fn test_stale_handle_ignored() {
        let mut host = EventLoopHost::new(Viewport::new(400, 300));
        let mut grid = background();
        grid.activate(&mut host, Raster::with_scale(0, 0, 4.0));
        let old = host.take_due_frames()[0];
        assert!(grid.on_frame(&mut host, old, FrameInput::default()).is_some());

        // The same handle is no longer the outstanding request
        assert!(grid.on_frame(&mut host, old, FrameInput::default()).is_none());
        assert_eq!(grid.frames(), 1);
    }

    #[test]
    fn test_reactivation_replaces_previous_mount() {
        let mut host = EventLoopHost::new(Viewport::new(400, 300));
        let mut grid = background();
        grid.activate(&mut host, Raster::with_scale(0, 0, 4.0));
        grid.activate(&mut host, Raster::with_scale(0, 0, 4.0));
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(host.listener_count(), 1);
    }

    #[test]
    fn test_resize_keeps_positions() {
        let mut host = EventLoopHost::new(Viewport::new(800, 600));
        let mut grid = background();
        grid.activate(&mut host, Raster::with_scale(0, 0, 8.0));
        tick(&mut host, &mut grid, FrameInput::default());
        let before = grid.field().map(|f| f.particles().to_vec()).unwrap_or_default();

        let viewport = Viewport::new(1920, 1080);
        for listener in host.set_viewport(viewport) {
            grid.on_resize(listener, viewport);
        }

        assert_eq!(grid.surface().map(|s| s.size()), Some((1920, 1080)));
        let after = grid.field().map(|f| f.particles().to_vec()).unwrap_or_default();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unknown_listener_ignored() {
        let mut host = EventLoopHost::new(Viewport::new(800, 600));
        let mut grid = background();
        grid.activate(&mut host, Raster::with_scale(0, 0, 8.0));
        grid.on_resize(ListenerId(999), Viewport::new(10, 10));
        assert_eq!(grid.surface().map(|s| s.size()), Some((800, 600)));
    }

    #[test]
    fn test_zero_sized_viewport_skips_but_keeps_looping() {
        let mut host = EventLoopHost::new(Viewport::new(0, 0));
        let mut grid = background();
        grid.activate(&mut host, Raster::with_scale(0, 0, 4.0));
        let before = grid.field().map(|f| f.particles().to_vec()).unwrap_or_default();

        tick(&mut host, &mut grid, FrameInput::default());
        assert_eq!(grid.frames(), 0);
        assert_eq!(host.pending_frames(), 1);
        let after = grid.field().map(|f| f.particles().to_vec()).unwrap_or_default();
        assert_eq!(before, after);
    }

    #[test]
    fn test_paused_renders_without_stepping() {
        let mut host = EventLoopHost::new(Viewport::new(400, 300));
        let mut grid = background();
        grid.activate(&mut host, Raster::with_scale(0, 0, 4.0));
        let before = grid.field().map(|f| f.particles().to_vec()).unwrap_or_default();

        let paused = FrameInput {
            paused: true,
            ..FrameInput::default()
        };
        tick(&mut host, &mut grid, paused);
        assert_eq!(grid.frames(), 1);
        let after = grid.field().map(|f| f.particles().to_vec()).unwrap_or_default();
        assert_eq!(before, after);
    }
}
