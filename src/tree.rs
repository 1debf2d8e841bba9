//! Particle tree engine for Yuletide
//! Generates the cone body, spiral garland and apex glow populations, then
//! integrates every particle toward the current display mode each frame.

use crate::config::{Palette, TreeConfig};
use crate::projection::{Camera, Vec3};
use egui::{Color32, Painter, Rect, Vec2};
use rand::Rng;
use rayon::prelude::*;
use std::f32::consts::TAU;

/// Population a particle belongs to; selects its target formula, alpha
/// formula and sparkle behavior.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParticleKind {
    Body,
    Ornament,
    Ribbon,
    GlowCore,
}

/// Individual particle data
#[derive(Clone)]
pub struct Particle {
    /// Current simulated position; written only by the smoothing step.
    pub pos: Vec3,
    /// Rest position defining the closed-tree shape. Never changes after
    /// generation.
    pub base: Vec3,
    pub color: Color32,
    pub size: f32,
    /// Phase used to desynchronize the open-mode wobble.
    pub random_offset: f32,
    pub sparkle_speed: f32,
    pub sparkle_phase: f32,
    /// Baseline opacity multiplier; below 1.0 only for the flare bleed.
    pub opacity: f32,
    pub kind: ParticleKind,
}

impl Particle {
    /// Where this particle is easing toward under the given mode.
    fn target(&self, open: bool, t: f32, cfg: &TreeConfig) -> Vec3 {
        if !open {
            return self.base;
        }
        let f = cfg.explode_factor;
        match self.kind {
            ParticleKind::Ribbon => {
                // The garland unravels wider than the body, phased by
                // height so it peels off as a sheet rather than a blob.
                let phase = t * 2.0 + self.base.y * 0.01;
                Vec3::new(
                    self.base.x * f * cfg.ribbon_explode_boost
                        + phase.cos() * cfg.ribbon_scatter_amplitude,
                    self.base.y * f,
                    self.base.z * f * cfg.ribbon_explode_boost
                        + phase.sin() * cfg.ribbon_scatter_amplitude,
                )
            }
            _ => {
                let phase = t + self.random_offset;
                Vec3::new(
                    self.base.x * f + phase.sin() * cfg.scatter_amplitude,
                    self.base.y * f + phase.cos() * cfg.scatter_amplitude,
                    self.base.z * f,
                )
            }
        }
    }
}

/// Uniform-by-volume sample inside a sphere (cube-root radial transform).
fn sample_in_sphere(radius: f32, rng: &mut impl Rng) -> Vec3 {
    let theta = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
    let r = rng.gen::<f32>().cbrt() * radius;
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

fn pick(colors: &[[u8; 3]], rng: &mut impl Rng) -> Color32 {
    let c = colors[rng.gen_range(0..colors.len())];
    Color32::from_rgb(c[0], c[1], c[2])
}

/// The whole particle field plus the loop state that drives it. Rotation,
/// wobble and sparkle clocks live here, not in module statics.
pub struct TreeField {
    pub particles: Vec<Particle>,
    rotation: f32,
    wobble_clock: f32,
    sparkle_clock: f32,
}

impl TreeField {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            rotation: 0.0,
            wobble_clock: 0.0,
            sparkle_clock: 0.0,
        }
    }

    pub fn is_generated(&self) -> bool {
        !self.particles.is_empty()
    }

    /// Populate the field. Idempotent: a non-empty field is left alone,
    /// positions are only mutated in place afterwards.
    pub fn generate(&mut self, cfg: &TreeConfig, palette: &Palette, rng: &mut impl Rng) {
        if self.is_generated() {
            return;
        }
        self.particles.reserve(
            cfg.body_count + cfg.ribbon_count + cfg.glow_count + cfg.flare_count,
        );

        // --- Part 1: the high-density cone body ---
        for _ in 0..cfg.body_count {
            // Height from base (bottom) to tip; progress 0 at base, 1 at tip.
            let y = cfg.y_base - rng.gen::<f32>() * cfg.tree_height;
            let progress = (cfg.y_base - y) / cfg.tree_height;
            let max_radius = cfg.peak_radius * (1.0 - progress);

            let angle = rng.gen::<f32>() * TAU;
            // sqrt keeps the disc cross-section area-uniform instead of
            // clumping at the trunk.
            let r = max_radius * rng.gen::<f32>().sqrt();
            let base = Vec3::new(angle.cos() * r, y, angle.sin() * r);

            let is_ornament = rng.gen::<f32>() < cfg.ornament_ratio;
            let (kind, color, size, sparkle_speed) = if is_ornament {
                (
                    ParticleKind::Ornament,
                    pick(&palette.ornaments, rng),
                    rng.gen::<f32>() * 5.0 + 3.0,
                    50.0 + rng.gen::<f32>() * 50.0,
                )
            } else {
                (
                    ParticleKind::Body,
                    pick(&palette.tree_greens, rng),
                    rng.gen::<f32>() * 2.0 + 1.0,
                    5.0,
                )
            };

            self.particles.push(Particle {
                pos: base,
                base,
                color,
                size,
                random_offset: rng.gen::<f32>() * 100.0,
                sparkle_speed,
                sparkle_phase: rng.gen::<f32>() * TAU,
                opacity: 1.0,
                kind,
            });
        }

        // --- Part 2: the fuzzy volumetric golden garland ---
        for i in 0..cfg.ribbon_count {
            let p = i as f32 / cfg.ribbon_count as f32;

            // Spiral center path, floating just outside the cone.
            let y_center = cfg.y_base - p * cfg.tree_height;
            let radius_center = cfg.ribbon_outer_radius * (1.0 - p) + cfg.ribbon_radius_pad;
            let angle = p * TAU * cfg.ribbon_turns;

            // Scatter around the path point instead of sitting on the wire.
            let offset = sample_in_sphere(cfg.ribbon_thickness, rng);
            let base = Vec3::new(
                angle.cos() * radius_center + offset.x,
                y_center + offset.y,
                angle.sin() * radius_center + offset.z,
            );

            self.particles.push(Particle {
                pos: base,
                base,
                color: pick(&palette.ribbon_golds, rng),
                size: rng.gen::<f32>() * 2.5 + 1.0,
                random_offset: rng.gen::<f32>() * 100.0,
                sparkle_speed: 100.0 + rng.gen::<f32>() * 100.0,
                sparkle_phase: rng.gen::<f32>() * TAU,
                opacity: 1.0,
                kind: ParticleKind::Ribbon,
            });
        }

        // --- Part 3: the apex glow sphere ---
        let apex_y = cfg.y_base - cfg.tree_height - cfg.glow_apex_gap;
        let glow = Color32::from_rgb(
            palette.glow_core[0],
            palette.glow_core[1],
            palette.glow_core[2],
        );
        for _ in 0..cfg.glow_count {
            let offset = sample_in_sphere(cfg.glow_radius, rng);
            let base = Vec3::new(offset.x, apex_y + offset.y, offset.z);
            self.particles.push(Particle {
                pos: base,
                base,
                color: glow,
                size: rng.gen::<f32>() * 4.0 + 2.0,
                random_offset: 0.0,
                sparkle_speed: 100.0,
                sparkle_phase: rng.gen::<f32>() * TAU,
                opacity: 1.0,
                kind: ParticleKind::GlowCore,
            });
        }

        // Oversized, faint particles at the exact center fake the lens
        // flare bleeding out of the star.
        for _ in 0..cfg.flare_count {
            let base = Vec3::new(0.0, apex_y, 0.0);
            self.particles.push(Particle {
                pos: base,
                base,
                color: glow,
                size: 30.0 + rng.gen::<f32>() * 30.0,
                random_offset: 0.0,
                sparkle_speed: 0.0,
                sparkle_phase: 0.0,
                opacity: 0.15,
                kind: ParticleKind::GlowCore,
            });
        }
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// One integrator step: advance the clocks, then ease every particle
    /// toward its mode target. Rotation is applied at render time only.
    pub fn update(&mut self, open: bool, dt: f32, cfg: &TreeConfig) {
        self.rotation += cfg.rotation_speed * dt;
        self.wobble_clock += cfg.wobble_clock_rate * dt;
        self.sparkle_clock += dt;

        // dt-corrected low-pass filter; never overshoots.
        let k = 1.0 - (-cfg.smoothing_rate * dt).exp();
        let t = self.wobble_clock;

        self.particles.par_iter_mut().for_each(|p| {
            let target = p.target(open, t, cfg);
            p.pos.x += (target.x - p.pos.x) * k;
            p.pos.y += (target.y - p.pos.y) * k;
            p.pos.z += (target.z - p.pos.z) * k;
        });
    }

    /// Draw the field as additively-blended discs. Overlap brightens
    /// instead of occluding, so no depth sort is needed.
    pub fn render(&self, painter: &Painter, rect: Rect, camera: &Camera, cfg: &TreeConfig) {
        let view = rect.width().min(rect.height()) / cfg.reference_size;
        if view <= 0.0 {
            return;
        }
        let center = rect.center();
        let (rot_sin, rot_cos) = self.rotation.sin_cos();

        for p in &self.particles {
            let rotated = Vec3::new(
                p.pos.x * rot_cos - p.pos.z * rot_sin,
                p.pos.y,
                p.pos.x * rot_sin + p.pos.z * rot_cos,
            );
            let Some(proj) = camera.project(rotated) else {
                continue;
            };

            let pulse = (self.sparkle_clock * p.sparkle_speed + p.sparkle_phase).sin();
            let alpha = match p.kind {
                // Garland and ornaments shimmer hard; the body stays solid.
                ParticleKind::Ribbon => proj.scale * (0.7 + pulse * 0.3),
                ParticleKind::Ornament => proj.scale * (0.8 + pulse * 0.5),
                _ => proj.scale * (0.7 + pulse * 0.1),
            };
            let a = ((alpha * p.opacity).clamp(0.0, 1.0) * 255.0) as u8;
            if a < 2 {
                continue;
            }

            let pos = center
                + (proj.offset + Vec2::new(0.0, cfg.vertical_offset)) * view;
            let color = Color32::from_rgba_premultiplied(
                p.color.r(),
                p.color.g(),
                p.color.b(),
                a,
            );
            painter.circle_filled(pos, (p.size * proj.scale * view).max(0.2), color);
        }
    }
}
