use crate::braille;
use crate::config::{self, AppConfig, MAX_PIXELS_PER_DOT, MIN_PIXELS_PER_DOT};
use crate::export;
use crate::lifecycle::{EventLoopHost, FrameInput, GridBackground, Viewport};
use crate::pointer::{MousePosition, SharedPointer};
use crate::render::{FrameStats, Palette};
use crate::settings::{FieldSettings, Theme};
use crate::surface::Raster;
use crate::ui;
use ratatui::layout::Rect;
use std::path::PathBuf;

/// Particle count step for +/- and the Particles parameter
const PARTICLE_STEP: i32 = 10;

/// Focus state for parameter editing in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    Particles,
    Scale,
    Theme,
    // Controls box (not a param)
    #[default]
    Controls,
}

impl Focus {
    /// Tab cycles through parameters in display order
    pub fn next(&self) -> Focus {
        match self {
            Focus::Controls => Focus::Particles,
            Focus::Particles => Focus::Scale,
            Focus::Scale => Focus::Theme,
            Focus::Theme => Focus::Particles,
        }
    }

    /// Shift+Tab cycles in reverse
    pub fn prev(&self) -> Focus {
        match self {
            Focus::Controls => Focus::Theme,
            Focus::Particles => Focus::Theme,
            Focus::Scale => Focus::Particles,
            Focus::Theme => Focus::Scale,
        }
    }

    /// Check if focus is on a parameter (not Controls)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::Controls)
    }

    /// Line of the focused parameter in the Parameters box
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::Controls | Focus::Particles => 0,
            Focus::Scale => 1,
            Focus::Theme => 2,
        }
    }
}

/// Main application state
pub struct App {
    pub settings: FieldSettings,
    pub theme: Theme,
    pub pixels_per_dot: u32,
    pub paused: bool,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    /// Last user-facing message (snapshot path, save errors)
    pub status_message: Option<String>,
    /// Save theme changes to the preference file
    pub persist_theme: bool,
    pointer: SharedPointer,
    host: EventLoopHost,
    background: GridBackground<Raster>,
    terminal_area: Rect,
    canvas: Rect,
}

impl App {
    pub fn new(config: &AppConfig, terminal_area: Rect) -> Self {
        let canvas = ui::get_canvas_area(terminal_area, false);
        let pixels_per_dot = config.pixels_per_dot.clamp(MIN_PIXELS_PER_DOT, MAX_PIXELS_PER_DOT);
        let mut app = Self {
            settings: config.settings.clone(),
            theme: config.theme,
            pixels_per_dot,
            paused: false,
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            status_message: None,
            persist_theme: false,
            pointer: SharedPointer::new(MousePosition::default()),
            host: EventLoopHost::new(viewport_for(canvas, pixels_per_dot)),
            background: GridBackground::new(config.settings.clone(), config.seed),
            terminal_area,
            canvas,
        };
        app.mount();
        app
    }

    /// Deliver due frames to the background
    pub fn tick(&mut self) {
        let input = FrameInput {
            mouse: self.pointer.get(),
            palette: self.palette(),
            paused: self.paused,
        };
        for handle in self.host.take_due_frames() {
            self.background.on_frame(&mut self.host, handle, input);
        }
    }

    pub fn palette(&self) -> Palette {
        Palette::from_alternate(self.theme.is_matrix())
    }

    /// Publish a pointer move given in terminal cells
    pub fn pointer_moved(&mut self, column: u16, row: u16) {
        let position = MousePosition::from_cell(
            column,
            row,
            (self.canvas.x, self.canvas.y),
            (self.canvas.width, self.canvas.height),
        );
        self.pointer.set(position);
    }

    #[cfg(test)]
    pub fn pointer(&self) -> MousePosition {
        self.pointer.get()
    }

    /// Canvas area (inside its border) in terminal cells
    #[cfg(test)]
    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    pub fn viewport(&self) -> Viewport {
        viewport_for(self.canvas, self.pixels_per_dot)
    }

    /// Terminal was resized
    pub fn resize(&mut self, width: u16, height: u16) {
        self.terminal_area = Rect::new(0, 0, width, height);
        self.apply_layout();
    }

    /// Recompute the canvas and notify resize listeners
    fn apply_layout(&mut self) {
        self.canvas = ui::get_canvas_area(self.terminal_area, self.fullscreen_mode);
        let viewport = self.viewport();
        for listener in self.host.set_viewport(viewport) {
            self.background.on_resize(listener, viewport);
        }
    }

    fn mount(&mut self) {
        self.background.set_settings(self.settings.clone());
        let raster = Raster::with_scale(0, 0, self.pixels_per_dot as f32);
        self.background.activate(&mut self.host, raster);
    }

    pub fn is_mounted(&self) -> bool {
        self.background.is_active()
    }

    /// Mount or unmount the background
    pub fn toggle_mount(&mut self) {
        if self.background.is_active() {
            self.background.deactivate(&mut self.host);
        } else {
            self.mount();
        }
    }

    /// Start over with fresh particles
    pub fn remount(&mut self) {
        tracing::info!(particles = self.settings.particle_count, scale = self.pixels_per_dot, "remounting");
        self.mount();
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn cycle_theme(&mut self) {
        self.set_theme(self.theme.next());
    }

    pub fn cycle_theme_prev(&mut self) {
        self.set_theme(self.theme.prev());
    }

    fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        if self.persist_theme {
            if let Err(e) = config::save_theme_preference(theme) {
                tracing::warn!(error = %e, "failed to save theme preference");
                self.status_message = Some(format!("Theme not saved: {}", e));
            }
        }
    }

    pub fn adjust_particles(&mut self, delta: i32) {
        let before = self.settings.particle_count;
        self.settings.adjust_particle_count(delta);
        if self.settings.particle_count != before && self.is_mounted() {
            self.remount();
        }
    }

    pub fn adjust_scale(&mut self, delta: i32) {
        let before = self.pixels_per_dot;
        self.pixels_per_dot = (self.pixels_per_dot as i32 + delta)
            .clamp(MIN_PIXELS_PER_DOT as i32, MAX_PIXELS_PER_DOT as i32) as u32;
        if self.pixels_per_dot != before {
            self.apply_layout();
            if self.is_mounted() {
                self.remount();
            }
        }
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_up(&mut self) {
        match self.focus {
            Focus::Controls => {}
            Focus::Particles => self.adjust_particles(PARTICLE_STEP),
            Focus::Scale => self.adjust_scale(1),
            Focus::Theme => self.cycle_theme(),
        }
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_down(&mut self) {
        match self.focus {
            Focus::Controls => {}
            Focus::Particles => self.adjust_particles(-PARTICLE_STEP),
            Focus::Scale => self.adjust_scale(-1),
            Focus::Theme => self.cycle_theme_prev(),
        }
    }

    pub fn increase_particles(&mut self) {
        self.adjust_particles(PARTICLE_STEP);
    }

    pub fn decrease_particles(&mut self) {
        self.adjust_particles(-PARTICLE_STEP);
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
        self.apply_layout();
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Scroll controls box up
    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    /// Scroll controls box down
    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }

    /// Save the current frame as `grid-<frame>.png` in the working directory
    pub fn save_snapshot(&mut self) {
        let Some(raster) = self.background.surface() else {
            self.status_message = Some("Nothing mounted".to_string());
            return;
        };
        let path = PathBuf::from(format!("grid-{:06}.png", self.background.frames()));
        self.status_message = Some(match export::save_png(raster, self.theme.background(), &path) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => {
                tracing::warn!(error = %e, "snapshot failed");
                format!("Snapshot failed: {}", e)
            }
        });
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.background.surface()
    }

    pub fn frames(&self) -> u64 {
        self.background.frames()
    }

    pub fn last_stats(&self) -> FrameStats {
        self.background.last_stats()
    }
}

/// Logical pixel size of a canvas: braille dots times the dot scale
fn viewport_for(canvas: Rect, pixels_per_dot: u32) -> Viewport {
    let (dots_x, dots_y) = braille::dot_size(canvas.width, canvas.height);
    Viewport::new(dots_x * pixels_per_dot, dots_y * pixels_per_dot)
}
