use crate::pointer::MousePosition;
use crate::settings::FieldSettings;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Initial ages are drawn from `0..INITIAL_AGE_SPAN`
const INITIAL_AGE_SPAN: u32 = 100;

/// A single drifting point of the background
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Surface pixel coordinates
    pub position: Vec2,
    /// Pixels per frame
    pub velocity: Vec2,
    /// Fixed at creation, in `[1, 4)`
    pub radius: f32,
    /// Frames since (re)spawn
    pub age: u32,
}

impl Particle {
    pub fn distance_to(&self, other: &Particle) -> f32 {
        self.position.distance(other.position)
    }
}

/// Fixed-size particle store advanced one frame at a time.
///
/// Particles are recycled in place: the count never changes after
/// construction. The random source is owned by the store so tests can
/// inject a seeded generator.
pub struct ParticleField<R: Rng = StdRng> {
    particles: Vec<Particle>,
    settings: FieldSettings,
    rng: R,
}

impl ParticleField<StdRng> {
    /// Create a field with a seeded generator, or an entropy-seeded one
    pub fn seeded(settings: FieldSettings, width: f32, height: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(settings, width, height, rng)
    }
}

impl<R: Rng> ParticleField<R> {
    pub fn new(settings: FieldSettings, width: f32, height: f32, mut rng: R) -> Self {
        let particles = (0..settings.particle_count)
            .map(|_| Particle {
                position: random_point(&mut rng, width, height),
                velocity: Vec2::new(
                    (rng.gen::<f32>() - 0.5) * 2.0,
                    (rng.gen::<f32>() - 0.5) * 2.0,
                ),
                radius: rng.gen::<f32>() * 3.0 + 1.0,
                age: rng.gen_range(0..INITIAL_AGE_SPAN),
            })
            .collect();

        Self {
            particles,
            settings,
            rng,
        }
    }

    /// Build a field from explicit particles (the count is taken from `particles`)
    #[cfg(test)]
    pub fn from_particles(mut settings: FieldSettings, particles: Vec<Particle>, rng: R) -> Self {
        settings.particle_count = particles.len();
        Self {
            particles,
            settings,
            rng,
        }
    }

    /// Advance every particle by one frame.
    ///
    /// Per particle, in index order: move, age, pull toward the pointer if it
    /// is within the capture radius, reflect velocity at the surface edges,
    /// then respawn if too old. Respawn keeps the velocity.
    ///
    /// The pull is `offset * attraction`, not normalized, so inside the
    /// capture radius farther particles are pulled harder than nearer ones.
    ///
    /// Returns false (and changes nothing) while the surface has no area.
    pub fn step(&mut self, mouse: MousePosition, width: f32, height: f32) -> bool {
        if width <= 0.0 || height <= 0.0 {
            return false;
        }

        let target = mouse.to_pixels(width, height);
        let capture_radius = self.settings.capture_radius;
        let attraction = self.settings.attraction;
        let max_age = self.settings.max_age;

        for particle in &mut self.particles {
            particle.position += particle.velocity;
            particle.age += 1;

            let offset = target - particle.position;
            if offset.length() < capture_radius {
                particle.velocity += offset * attraction;
            }

            // Velocity only; a particle may sit just outside the edge for a frame
            if particle.position.x < 0.0 || particle.position.x > width {
                particle.velocity.x = -particle.velocity.x;
            }
            if particle.position.y < 0.0 || particle.position.y > height {
                particle.velocity.y = -particle.velocity.y;
            }

            if particle.age > max_age {
                particle.position = random_point(&mut self.rng, width, height);
                particle.age = 0;
            }
        }

        true
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }
}

/// Uniform point in `[0, width) x [0, height)`; degenerate extents give 0
fn random_point<R: Rng>(rng: &mut R, width: f32, height: f32) -> Vec2 {
    Vec2::new(rng.gen::<f32>() * width.max(0.0), rng.gen::<f32>() * height.max(0.0))
}
