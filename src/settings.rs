use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Smallest and largest particle counts the UI allows
pub const MIN_PARTICLES: usize = 2;
pub const MAX_PARTICLES: usize = 500;

/// Smallest grid spacing and distance thresholds accepted from a config file (px)
pub const MIN_GRID_SPACING: f32 = 5.0;
pub const MIN_DISTANCE: f32 = 1.0;

/// Site theme. Only `Matrix` changes the particle palette; every theme
/// supplies its own canvas background and UI accent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    Matrix,
}

impl Theme {
    pub fn name(&self) -> &str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::Matrix => "Matrix",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Matrix,
            Theme::Matrix => Theme::Light,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Theme::Light => Theme::Matrix,
            Theme::Dark => Theme::Light,
            Theme::Matrix => Theme::Dark,
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Theme::Matrix)
    }

    /// Canvas background as RGB
    pub fn background(&self) -> [u8; 3] {
        match self {
            Theme::Light => [248, 250, 252],
            Theme::Dark => [15, 23, 42],
            Theme::Matrix => [0, 0, 0],
        }
    }

    /// Border and heading color for the sidebar
    pub fn accent(&self) -> Color {
        match self {
            Theme::Light => Color::Rgb(37, 99, 235),
            Theme::Dark => Color::Rgb(96, 165, 250),
            Theme::Matrix => Color::Rgb(74, 222, 128),
        }
    }

    /// Plain text color that stays readable on the theme background
    pub fn text(&self) -> Color {
        match self {
            Theme::Light => Color::Rgb(17, 24, 39),
            Theme::Dark => Color::White,
            Theme::Matrix => Color::Rgb(74, 222, 128),
        }
    }
}

/// Parse a theme name from the command line; unknown names fall back to Dark
pub fn parse_theme(s: &str) -> Theme {
    match s.to_lowercase().as_str() {
        "light" | "l" => Theme::Light,
        "matrix" | "m" | "green" => Theme::Matrix,
        _ => Theme::Dark,
    }
}

/// Tunables of the particle field. The defaults are the fixed parameters
/// of the decorative background and should rarely need changing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSettings {
    /// Number of particles, constant for the lifetime of a mount
    pub particle_count: usize,
    /// Pointer attraction only applies within this distance (px)
    pub capture_radius: f32,
    /// Velocity impulse per pixel of offset toward the pointer
    pub attraction: f32,
    /// Particles closer than this are joined by a line (px)
    pub connection_distance: f32,
    /// Particles respawn once their age exceeds this many frames
    pub max_age: u32,
    /// Spacing of the static background grid (px)
    pub grid_spacing: f32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            particle_count: 100,
            capture_radius: 150.0,
            attraction: 0.0001,
            connection_distance: 100.0,
            max_age: 200,
            grid_spacing: 50.0,
        }
    }
}

impl FieldSettings {
    /// Adjust particle count within bounds
    pub fn adjust_particle_count(&mut self, delta: i32) {
        let new_val = (self.particle_count as i32 + delta).clamp(MIN_PARTICLES as i32, MAX_PARTICLES as i32);
        self.particle_count = new_val as usize;
    }

    /// Bring values loaded from outside back into range. Non-finite numbers
    /// fall back to the defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };
        Self {
            particle_count: self.particle_count.clamp(MIN_PARTICLES, MAX_PARTICLES),
            capture_radius: finite_or(self.capture_radius, defaults.capture_radius).max(MIN_DISTANCE),
            attraction: finite_or(self.attraction, defaults.attraction),
            connection_distance: finite_or(self.connection_distance, defaults.connection_distance).max(MIN_DISTANCE),
            max_age: self.max_age.max(1),
            grid_spacing: finite_or(self.grid_spacing, defaults.grid_spacing).max(MIN_GRID_SPACING),
        }
    }

    /// Number of unordered pairs the connection scan checks every frame
    pub fn pair_checks(&self) -> usize {
        self.particle_count * self.particle_count.saturating_sub(1) / 2
    }
}
