//! Shared 3D-to-2D perspective projection.
//!
//! The tree engine and the starfield both map simulated space onto the
//! canvas with the same pinhole model: a point's screen offset and size
//! shrink with its distance from the camera plane.

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

/// A point in simulated space. Y grows downward to match canvas
/// coordinates; Z grows away from the viewer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    /// Rotate about the vertical (y) axis.
    pub fn rotated_y(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.z * sin,
            y: self.y,
            z: self.x * sin + self.z * cos,
        }
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Pinhole camera constants shared by the tree and the photo ring.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Camera {
    /// Focal length in world units.
    pub fov: f32,
    /// Pushes the whole scene away from the camera plane so the field
    /// never straddles it while rotating.
    pub depth_offset: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: 800.0,
            depth_offset: 200.0,
        }
    }
}

/// A projected point: offset from the vanishing point, plus the
/// perspective factor applied to sizes at that depth.
#[derive(Clone, Copy, Debug)]
pub struct Projected {
    pub offset: Vec2,
    pub scale: f32,
}

impl Camera {
    /// Project a point relative to the vanishing point. Points at or
    /// behind the camera plane are culled.
    pub fn project(&self, p: Vec3) -> Option<Projected> {
        if p.z <= -self.fov {
            return None;
        }
        let scale = self.fov / (self.fov + p.z + self.depth_offset);
        if scale <= 0.0 {
            return None;
        }
        Some(Projected {
            offset: Vec2::new(p.x * scale, p.y * scale),
            scale,
        })
    }
}

/// Plane-divide variant used by the starfield: the focal length equals the
/// canvas half-extent, so depth runs from the near plane out to the canvas
/// width. `depth` must be positive.
pub fn project_depth(x: f32, y: f32, depth: f32, center: Vec2) -> Pos2 {
    Pos2::new(
        x / depth * center.x + center.x,
        y / depth * center.y + center.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_projects_to_vanishing_point() {
        let cam = Camera::default();
        let p = cam.project(Vec3::ZERO).unwrap();
        assert_eq!(p.offset, Vec2::ZERO);
        assert!(p.scale > 0.0);
    }

    #[test]
    fn behind_camera_is_culled() {
        let cam = Camera::default();
        assert!(cam.project(Vec3::new(0.0, 0.0, -cam.fov)).is_none());
        assert!(cam.project(Vec3::new(100.0, 100.0, -cam.fov - 1.0)).is_none());
    }

    #[test]
    fn nearer_points_project_larger() {
        let cam = Camera::default();
        let near = cam.project(Vec3::new(10.0, 0.0, -100.0)).unwrap();
        let far = cam.project(Vec3::new(10.0, 0.0, 500.0)).unwrap();
        assert!(near.scale > far.scale);
        assert!(near.offset.x > far.offset.x);
    }

    #[test]
    fn rotation_preserves_height_and_length() {
        let p = Vec3::new(3.0, 7.0, 4.0);
        let r = p.rotated_y(1.234);
        assert_eq!(r.y, p.y);
        let len = (p.x * p.x + p.z * p.z).sqrt();
        let rlen = (r.x * r.x + r.z * r.z).sqrt();
        assert!((len - rlen).abs() < 1e-4);
    }

    #[test]
    fn depth_divide_centers_distant_points() {
        let center = Vec2::new(400.0, 300.0);
        // A point on the view axis lands on the canvas center at any depth.
        let p = project_depth(0.0, 0.0, 123.0, center);
        assert_eq!(p, Pos2::new(400.0, 300.0));
        // Deeper points pull toward the center.
        let near = project_depth(100.0, 0.0, 10.0, center);
        let far = project_depth(100.0, 0.0, 100.0, center);
        assert!((near.x - center.x).abs() > (far.x - center.x).abs());
    }
}
