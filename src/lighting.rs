//! Light parameter sets and their GPU uniform layouts.
//!
//! Each lit program receives a complete [`LightingUniform`] before its draw.
//! The CPU-side structs stay in glam types; conversion to the padded
//! `#[repr(C)]` layout happens in one place so the WGSL declaration and the
//! Rust struct cannot drift apart field by field.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Infinitely distant light shining along `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, -1.0, -1.0),
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.5),
            specular: Vec3::splat(0.5),
        }
    }
}

/// Omnidirectional light with constant/linear/quadratic distance falloff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl PointLight {
    /// Intensity multiplier at `distance` world units from the light.
    pub fn attenuation(&self, distance: f32) -> f32 {
        let denominator = self.constant + self.linear * distance + self.quadratic * distance * distance;
        if denominator <= f32::EPSILON {
            return 1.0;
        }
        1.0 / denominator
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(4.0, 4.0, 0.0),
            ambient: Vec3::new(1.0, 0.6, 0.2),
            diffuse: Vec3::new(0.9, 0.5, 0.6),
            specular: Vec3::ONE,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightUniform {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl From<&DirectionalLight> for DirectionalLightUniform {
    fn from(light: &DirectionalLight) -> Self {
        Self {
            direction: light.direction.extend(0.0).into(),
            ambient: light.ambient.extend(0.0).into(),
            diffuse: light.diffuse.extend(0.0).into(),
            specular: light.specular.extend(0.0).into(),
        }
    }
}

/// Attenuation terms ride in the `w` lanes of the color vectors.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl From<&PointLight> for PointLightUniform {
    fn from(light: &PointLight) -> Self {
        Self {
            position: light.position.extend(1.0).into(),
            ambient: light.ambient.extend(light.constant).into(),
            diffuse: light.diffuse.extend(light.linear).into(),
            specular: light.specular.extend(light.quadratic).into(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightingUniform {
    pub directional: DirectionalLightUniform,
    pub point: PointLightUniform,
    pub view_position: [f32; 4],
}

impl LightingUniform {
    pub fn new(directional: &DirectionalLight, point: &PointLight, view_position: Vec3) -> Self {
        Self {
            directional: directional.into(),
            point: point.into(),
            view_position: view_position.extend(1.0).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn attenuation_is_one_at_the_light() {
        assert_relative_eq!(PointLight::default().attenuation(0.0), 1.0);
    }

    #[test]
    fn attenuation_falls_off_with_distance() {
        let light = PointLight::default();
        let mut previous = light.attenuation(0.0);
        for step in 1..50 {
            let current = light.attenuation(step as f32 * 0.5);
            assert!(current < previous);
            previous = current;
        }
        assert_relative_eq!(light.attenuation(10.0), 1.0 / (1.0 + 0.9 + 3.2), epsilon = 1e-6);
    }

    #[test]
    fn uniform_packs_attenuation_into_w_lanes() {
        let uniform = LightingUniform::new(
            &DirectionalLight::default(),
            &PointLight::default(),
            Vec3::new(0.0, 0.0, 3.0),
        );
        assert_eq!(uniform.point.ambient[3], 1.0);
        assert_eq!(uniform.point.diffuse[3], 0.09);
        assert_eq!(uniform.point.specular[3], 0.032);
        assert_eq!(uniform.view_position, [0.0, 0.0, 3.0, 1.0]);
        assert_eq!(uniform.directional.direction, [0.0, -1.0, -1.0, 0.0]);
    }

    #[test]
    fn uniform_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<LightingUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 144);
    }
}
