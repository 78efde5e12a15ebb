use crate::settings::FieldSettings;
use crate::simulation::Particle;
use crate::surface::{Rgba, Surface};
use glam::Vec2;

/// Particle fill alpha at age 0
const PARTICLE_BASE_ALPHA: f32 = 0.6;
/// Connection stroke alpha at distance 0
const CONNECTION_BASE_ALPHA: f32 = 0.3;
/// Distance over which a connection fades by one unit of alpha
const CONNECTION_FADE_DISTANCE: f32 = 300.0;
const CONNECTION_WIDTH: f32 = 0.5;
const GRID_ALPHA: f32 = 0.1;
const GRID_WIDTH: f32 = 1.0;
/// Grids finer than this are skipped rather than drawn line by line
const MIN_GRID_SPACING: f32 = 1.0;

/// Particle hue. The alternate palette is used by the Matrix theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    #[default]
    Primary,
    Alternate,
}

impl Palette {
    pub fn from_alternate(alternate: bool) -> Self {
        if alternate {
            Palette::Alternate
        } else {
            Palette::Primary
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Palette::Primary => [59, 130, 246],
            Palette::Alternate => [0, 255, 0],
        }
    }

    pub fn color(&self, alpha: f32) -> Rgba {
        Rgba::rgb(self.rgb(), 0.0).with_alpha(alpha)
    }
}

/// Fill alpha for a particle of the given age, non-increasing and clamped
/// to `[0, 1]` (it reaches zero well before the respawn age).
pub fn particle_alpha(age: u32, max_age: u32) -> f32 {
    (PARTICLE_BASE_ALPHA - age as f32 / max_age.max(1) as f32).clamp(0.0, 1.0)
}

/// Stroke alpha for a connection of the given length, clamped to `[0, 1]`
pub fn connection_alpha(distance: f32) -> f32 {
    (CONNECTION_BASE_ALPHA - distance / CONNECTION_FADE_DISTANCE).clamp(0.0, 1.0)
}

/// An unordered particle pair closer than the connection threshold, `i < j`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub i: usize,
    pub j: usize,
    pub distance: f32,
}

/// Every pair `(i, j)` with `i < j` closer than `threshold`.
///
/// This is a plain O(n^2) scan: 4,950 checks at the default 100 particles.
/// Counts beyond a few hundred will need a spatial index.
pub fn connections(particles: &[Particle], threshold: f32) -> impl Iterator<Item = Connection> + '_ {
    particles.iter().enumerate().flat_map(move |(i, p)| {
        particles[i + 1..]
            .iter()
            .enumerate()
            .filter_map(move |(offset, q)| {
                let distance = p.distance_to(q);
                (distance < threshold).then_some(Connection {
                    i,
                    j: i + 1 + offset,
                    distance,
                })
            })
    })
}

/// What one frame drew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub particles: usize,
    pub connections: usize,
    pub grid_lines: usize,
}

/// Draw one full frame: clear, particles, connections, then the static grid
pub fn render_frame<S: Surface + ?Sized>(
    particles: &[Particle],
    settings: &FieldSettings,
    palette: Palette,
    surface: &mut S,
) -> FrameStats {
    surface.clear();

    for particle in particles {
        let alpha = particle_alpha(particle.age, settings.max_age);
        surface.fill_circle(particle.position, particle.radius, palette.color(alpha));
    }

    let mut connection_count = 0;
    for link in connections(particles, settings.connection_distance) {
        surface.stroke_line(
            particles[link.i].position,
            particles[link.j].position,
            CONNECTION_WIDTH,
            palette.color(connection_alpha(link.distance)),
        );
        connection_count += 1;
    }

    let grid_lines = draw_grid(surface, settings.grid_spacing, palette.color(GRID_ALPHA));

    FrameStats {
        particles: particles.len(),
        connections: connection_count,
        grid_lines,
    }
}

/// Vertical then horizontal lines every `spacing` pixels, starting at 0
fn draw_grid<S: Surface + ?Sized>(surface: &mut S, spacing: f32, color: Rgba) -> usize {
    let (width, height) = surface.size();
    let (width, height) = (width as f32, height as f32);
    if !spacing.is_finite() || spacing < MIN_GRID_SPACING {
        return 0;
    }

    let mut count = 0;
    let mut x = 0.0;
    while x < width {
        surface.stroke_line(Vec2::new(x, 0.0), Vec2::new(x, height), GRID_WIDTH, color);
        x += spacing;
        count += 1;
    }
    let mut y = 0.0;
    while y < height {
        surface.stroke_line(Vec2::new(0.0, y), Vec2::new(width, y), GRID_WIDTH, color);
        y += spacing;
        count += 1;
    }
    count
}
