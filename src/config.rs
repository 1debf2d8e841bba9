//! Configuration for Yuletide
//! Every tunable for the tree field, starfield, gesture adapter and photo ring

use serde::{Deserialize, Serialize};

use crate::projection::Camera;

// ============================================================================
// Palette
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Palette {
    /// Dense cone body. Bright, vivid greens that pop against black.
    pub tree_greens: Vec<[u8; 3]>,
    /// Saturated ornament accents scattered through the body.
    pub ornaments: Vec<[u8; 3]>,
    /// Gold shades for the spiral garland.
    pub ribbon_golds: Vec<[u8; 3]>,
    /// Apex glow sphere.
    pub glow_core: [u8; 3],
    pub background: [u8; 3],
    /// Twinkling idle stars (warm white).
    pub star_idle: [u8; 3],
    /// Warp streaks (bluish white).
    pub star_streak: [u8; 3],
    /// Photo ring frames and greeting text.
    pub gold_trim: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            tree_greens: vec![
                [0, 100, 0],
                [0, 128, 0],
                [34, 139, 34],
                [50, 205, 50],
                [0, 255, 0],
                [60, 179, 113],
                [46, 139, 87],
                [124, 252, 0],
            ],
            ornaments: vec![
                [255, 0, 0],
                [255, 215, 0],
                [0, 255, 255],
                [255, 0, 255],
                [255, 255, 255],
                [255, 69, 0],
                [255, 105, 180],
            ],
            ribbon_golds: vec![
                [255, 215, 0],
                [253, 185, 49],
                [255, 255, 224],
                [218, 165, 32],
            ],
            glow_core: [255, 255, 255],
            background: [2, 3, 8],
            star_idle: [255, 255, 230],
            star_streak: [200, 230, 255],
            gold_trim: [255, 215, 0],
        }
    }
}

// ============================================================================
// Tree Configuration
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct TreeConfig {
    pub body_count: usize,
    pub ribbon_count: usize,
    pub glow_count: usize,
    /// Oversized low-opacity particles at the glow center (lens-flare bleed).
    pub flare_count: usize,

    /// Vertical extent of the cone in world units.
    pub tree_height: f32,
    /// Y of the cone base; positive Y is the bottom of the canvas.
    pub y_base: f32,
    /// Cone radius at the base, shrinking linearly to 0 at the tip.
    pub peak_radius: f32,
    /// Fraction of body particles re-rolled as ornaments (0.0-1.0).
    pub ornament_ratio: f32,

    /// Garland radius at the base; floats slightly outside the cone.
    pub ribbon_outer_radius: f32,
    pub ribbon_radius_pad: f32,
    /// Full turns the garland makes from base to tip.
    pub ribbon_turns: f32,
    /// Radius of the fuzzy scatter sphere around the garland path.
    pub ribbon_thickness: f32,

    pub glow_radius: f32,
    /// Gap between the tree tip and the glow sphere center.
    pub glow_apex_gap: f32,

    /// Outward scaling of base positions in open mode.
    pub explode_factor: f32,
    /// Extra lateral factor for the ribbon so it unravels wider.
    pub ribbon_explode_boost: f32,
    /// Wobble amplitude for body/glow particles in open mode.
    pub scatter_amplitude: f32,
    /// Wobble amplitude for ribbon particles in open mode.
    pub ribbon_scatter_amplitude: f32,

    /// Exponential smoothing rate toward the target, per second.
    /// 3.6 matches ~6% per frame at 60 Hz; the transition spans about a second.
    pub smoothing_rate: f32,
    /// Field rotation about the vertical axis, radians per second.
    pub rotation_speed: f32,
    /// Advance rate of the open-mode wobble clock.
    pub wobble_clock_rate: f32,

    /// Screen-space downward shift of the projected tree, world units.
    pub vertical_offset: f32,
    /// World size mapped onto the smaller canvas dimension.
    pub reference_size: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            body_count: 15000,
            ribbon_count: 10000,
            glow_count: 400,
            flare_count: 6,
            tree_height: 1700.0,
            y_base: 900.0,
            peak_radius: 800.0,
            ornament_ratio: 0.10,
            ribbon_outer_radius: 850.0,
            ribbon_radius_pad: 30.0,
            ribbon_turns: 8.0,
            ribbon_thickness: 35.0,
            glow_radius: 50.0,
            glow_apex_gap: 20.0,
            explode_factor: 5.0,
            ribbon_explode_boost: 1.5,
            scatter_amplitude: 200.0,
            ribbon_scatter_amplitude: 300.0,
            smoothing_rate: 3.6,
            rotation_speed: 0.18,
            wobble_clock_rate: 0.5,
            vertical_offset: 100.0,
            reference_size: 2000.0,
        }
    }
}

// ============================================================================
// Starfield Configuration
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct StarfieldConfig {
    pub star_count: usize,
    /// Drift rate while the tree is closed, canvas px/s.
    pub idle_speed: f32,
    /// Warp rate while the tree is open.
    pub warp_speed: f32,
    /// Exponential easing rate between the two targets, per second.
    pub ease_rate: f32,
    /// Above this computed speed stars render as streaks instead of dots.
    pub streak_threshold: f32,
    /// Depth at which a star is recycled to the far plane.
    pub near_plane: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            star_count: 400,
            idle_speed: 6.0,
            warp_speed: 900.0,
            ease_rate: 3.0,
            streak_threshold: 120.0,
            near_plane: 1.0,
        }
    }
}

// ============================================================================
// Gesture Configuration
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GestureConfig {
    /// Normalized thumb-to-pinky span above which a hand reads as OPEN.
    /// Calibration value, not a contract; observed working range 1.1-1.2.
    pub open_threshold: f32,
    /// Span below which a hand reads as CLOSE; working range 0.8-0.9.
    pub close_threshold: f32,
    /// Minimum interval between emitted events, ms.
    pub cooldown_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            open_threshold: 1.1,
            close_threshold: 0.9,
            cooldown_ms: 300,
        }
    }
}

// ============================================================================
// Photo Ring Configuration
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PhotoConfig {
    /// The ring always shows at most this many cards.
    pub max_photos: usize,
    /// Ring radius in world units.
    pub ring_radius: f32,
    pub card_width: f32,
    pub card_height: f32,
    /// Ring rotation, radians per second.
    pub spin_speed: f32,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            max_photos: 6,
            ring_radius: 560.0,
            card_width: 224.0,
            card_height: 288.0,
            spin_speed: 0.12,
        }
    }
}

// ============================================================================
// Main App Configuration
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    pub camera: Camera,
    pub tree: TreeConfig,
    pub starfield: StarfieldConfig,
    pub gesture: GestureConfig,
    pub photos: PhotoConfig,
    pub palette: Palette,
    /// Looping background track; silent when unset.
    #[serde(default)]
    pub music_path: Option<String>,
}

impl AppConfig {
    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tree.body_count, config.tree.body_count);
        assert_eq!(back.gesture.cooldown_ms, config.gesture.cooldown_ms);
        assert_eq!(back.palette.tree_greens.len(), config.palette.tree_greens.len());
    }

    #[test]
    fn thresholds_leave_an_ambiguous_band() {
        let g = GestureConfig::default();
        assert!(g.close_threshold < g.open_threshold);
    }
}
