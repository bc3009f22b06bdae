use glam::{Mat4, Quat, Vec3};

use crate::camera::Camera;
use crate::config::AppConfig;

/// Rotation of `degrees` about `axis`; the axis does not need to be normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub axis: Vec3,
    pub degrees: f32,
}

impl Rotation {
    pub fn new(axis: Vec3, degrees: f32) -> Self {
        Self { axis, degrees }
    }

    fn matrix(&self) -> Mat4 {
        let axis = self.axis.normalize_or_zero();
        if axis == Vec3::ZERO {
            return Mat4::IDENTITY;
        }
        Mat4::from_quat(Quat::from_axis_angle(axis, self.degrees.to_radians()))
    }
}

/// World placement of a drawable: translate, then rotate in order, then scale uniformly.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub translation: Vec3,
    pub rotations: Vec<Rotation>,
    pub scale: f32,
}

impl Placement {
    pub fn model_matrix(&self) -> Mat4 {
        let rotation = self
            .rotations
            .iter()
            .fold(Mat4::IDENTITY, |acc, rotation| acc * rotation.matrix());
        Mat4::from_translation(self.translation) * rotation * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotations: Vec::new(),
            scale: default_scale(),
        }
    }
}

fn default_scale() -> f32 {
    1.0
}

/// What a slot in the offscreen pass draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawableKind {
    Ground,
    /// Index into [`AppConfig::models`].
    Model(usize),
}

/// One opaque draw in the offscreen pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub name: String,
    pub kind: DrawableKind,
    pub model: Mat4,
}

/// Opaque draws in submission order: the ground platform first, then each model.
pub fn draw_list(config: &AppConfig) -> Vec<Drawable> {
    let mut drawables = Vec::with_capacity(config.models.len() + 1);
    drawables.push(Drawable {
        name: "ground".to_string(),
        kind: DrawableKind::Ground,
        model: config.ground.placement.model_matrix(),
    });
    for (index, model) in config.models.iter().enumerate() {
        drawables.push(Drawable {
            name: model.name.clone(),
            kind: DrawableKind::Model(index),
            model: model.placement.model_matrix(),
        });
    }
    drawables
}

/// Per-frame camera transforms shared by every pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub skybox_view: Mat4,
    pub eye: Vec3,
}

impl FrameTransforms {
    pub fn new(camera: &Camera, config: &AppConfig, width: u32, height: u32) -> Self {
        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        Self {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(
                aspect,
                config.projection.near,
                config.projection.far,
            ),
            skybox_view: camera.skybox_view_matrix(),
            eye: camera.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn placement_applies_translation_rotation_scale() {
        let placement = Placement {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotations: vec![Rotation::new(Vec3::Y, 90.0)],
            scale: 2.0,
        };
        let point = placement.model_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        // (1,0,0) scaled to (2,0,0), rotated about +Y to (0,0,-2), then translated.
        assert!(point.truncate().abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), 1e-5));
    }

    #[test]
    fn rotations_apply_right_to_left() {
        let placement = Placement {
            translation: Vec3::ZERO,
            rotations: vec![
                Rotation::new(Vec3::Z, 90.0),
                Rotation::new(Vec3::Y, 90.0),
            ],
            scale: 1.0,
        };
        let point = placement.model_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        // +X about Y gives -Z; -Z about Z stays -Z.
        assert!(point.truncate().abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn unnormalized_axis_is_normalized() {
        let a = Rotation::new(Vec3::new(1.0, 0.2, 0.3), 10.0).matrix();
        let b = Rotation::new(Vec3::new(1.0, 0.2, 0.3).normalize(), 10.0).matrix();
        assert!(a.abs_diff_eq(b, 1e-6));
    }

    #[test]
    fn zero_axis_is_identity() {
        assert_eq!(Rotation::new(Vec3::ZERO, 45.0).matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn ground_is_drawn_before_models() {
        let config = AppConfig::default();
        let drawables = draw_list(&config);
        assert_eq!(drawables.len(), config.models.len() + 1);
        assert_eq!(drawables[0].kind, DrawableKind::Ground);
        assert_eq!(drawables[1].kind, DrawableKind::Model(0));
        assert_eq!(drawables[1].name, "dog");
        assert_eq!(drawables[2].name, "statue");
    }

    #[test]
    fn frame_transforms_follow_camera() {
        let config = AppConfig::default();
        let camera = Camera::new(config.camera.start_position);
        let frame = FrameTransforms::new(&camera, &config, 800, 600);
        assert_eq!(frame.eye, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(frame.view, camera.view_matrix());
        assert!(frame.skybox_view.w_axis.truncate().abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn zero_height_falls_back_to_square_aspect() {
        let config = AppConfig::default();
        let camera = Camera::default();
        let frame = FrameTransforms::new(&camera, &config, 800, 0);
        let square = camera.projection_matrix(1.0, config.projection.near, config.projection.far);
        assert_eq!(frame.projection, square);
    }
}
