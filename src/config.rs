use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};

use crate::camera::{DEFAULT_SENSITIVITY, DEFAULT_SPEED};
use crate::lighting::{DirectionalLight, PointLight};
use crate::scene::{Placement, Rotation};

/// Cubemap face file names in +X, -X, +Y, -Y, +Z, -Z order.
pub const SKYBOX_FACE_NAMES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

/// Everything the demo needs to know before opening a window.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub clear_color: Vec3,
    pub directional_light: DirectionalLight,
    pub point_light: PointLight,
    pub resource_root: PathBuf,
    pub ground: GroundConfig,
    pub models: Vec<ModelConfig>,
    pub skybox_faces: [PathBuf; 6],
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub start_position: Vec3,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    /// Multiplier applied to frame time before WASD movement.
    pub keyboard_time_scale: f32,
    /// Look offset fed to the camera per frame while an arrow key is held.
    pub arrow_look_step: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundConfig {
    pub texture: PathBuf,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub path: PathBuf,
    pub placement: Placement,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig {
                width: 800,
                height: 600,
                title: "PET SIMS".to_string(),
            },
            camera: CameraConfig {
                start_position: Vec3::new(0.0, 0.0, 3.0),
                movement_speed: DEFAULT_SPEED,
                mouse_sensitivity: DEFAULT_SENSITIVITY,
                keyboard_time_scale: 0.5,
                arrow_look_step: 30.0,
            },
            projection: ProjectionConfig {
                near: 1.1,
                far: 100.0,
            },
            clear_color: Vec3::splat(0.1),
            directional_light: DirectionalLight::default(),
            point_light: PointLight::default(),
            resource_root: PathBuf::from("resources"),
            ground: GroundConfig {
                texture: PathBuf::from("textures/wood3.jpg"),
                placement: Placement {
                    translation: Vec3::new(0.95, -0.5, 0.1),
                    rotations: vec![Rotation::new(Vec3::new(1.0, 0.2, 0.3), 10.0)],
                    scale: 0.45,
                },
            },
            models: vec![
                ModelConfig {
                    name: "dog".to_string(),
                    path: PathBuf::from("objects/dog/source/dog.obj"),
                    placement: Placement {
                        translation: Vec3::new(-0.25, -1.0, 0.0),
                        rotations: vec![Rotation::new(Vec3::NEG_Y, 60.0)],
                        scale: 0.01,
                    },
                },
                ModelConfig {
                    name: "statue".to_string(),
                    path: PathBuf::from(
                        "objects/wooden-statue-of-the-owl/source/drevena_sova_ratibor/drevena_sova_ratibor.obj",
                    ),
                    placement: Placement {
                        translation: Vec3::new(0.8, 0.2, 0.5),
                        rotations: vec![
                            Rotation::new(Vec3::NEG_Y, 260.0),
                            Rotation::new(Vec3::Z, 180.0),
                        ],
                        scale: 0.07,
                    },
                },
            ],
            skybox_faces: SKYBOX_FACE_NAMES.map(|face| PathBuf::from(format!("textures/cube/{face}.jpg"))),
        }
    }
}

impl AppConfig {
    /// Reads an XML scene file and layers it over the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        let mut config = Self::from_xml(&xml)
            .with_context(|| format!("invalid scene file {}", path.display()))?;
        if config.resource_root.is_relative() {
            if let Some(parent) = path.parent() {
                config.resource_root = parent.join(&config.resource_root);
            }
        }
        Ok(config)
    }

    /// Parses the scene XML. Elements that are absent keep their default value.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        let mut config = Self::default();

        if let Some(window) = child(&root, "window") {
            config.window.width = parse_u32(optional_text(&window, "width"), config.window.width)?;
            config.window.height =
                parse_u32(optional_text(&window, "height"), config.window.height)?;
            if let Some(title) = optional_text(&window, "title") {
                config.window.title = title;
            }
        }
        if config.window.width == 0 || config.window.height == 0 {
            return Err(anyhow!("window dimensions must be non-zero"));
        }

        if let Some(camera) = child(&root, "camera") {
            let c = &mut config.camera;
            c.start_position = parse_vec3(optional_text(&camera, "position"), c.start_position)?;
            c.movement_speed = parse_f32(optional_text(&camera, "speed"), c.movement_speed)?;
            c.mouse_sensitivity =
                parse_f32(optional_text(&camera, "sensitivity"), c.mouse_sensitivity)?;
            c.keyboard_time_scale =
                parse_f32(optional_text(&camera, "time_scale"), c.keyboard_time_scale)?;
            c.arrow_look_step = parse_f32(optional_text(&camera, "look_step"), c.arrow_look_step)?;
        }

        if let Some(projection) = child(&root, "projection") {
            let p = &mut config.projection;
            p.near = parse_f32(optional_text(&projection, "near"), p.near)?;
            p.far = parse_f32(optional_text(&projection, "far"), p.far)?;
        }
        if !(config.projection.near > 0.0 && config.projection.far > config.projection.near) {
            return Err(anyhow!(
                "projection planes must satisfy 0 < near < far (got {} / {})",
                config.projection.near,
                config.projection.far
            ));
        }

        config.clear_color = parse_vec3(optional_text(&root, "clear_color"), config.clear_color)?;

        if let Some(light) = child(&root, "directional_light") {
            let d = &mut config.directional_light;
            d.direction = parse_vec3(optional_text(&light, "direction"), d.direction)?;
            d.ambient = parse_vec3(optional_text(&light, "ambient"), d.ambient)?;
            d.diffuse = parse_vec3(optional_text(&light, "diffuse"), d.diffuse)?;
            d.specular = parse_vec3(optional_text(&light, "specular"), d.specular)?;
        }

        if let Some(light) = child(&root, "point_light") {
            let p = &mut config.point_light;
            p.position = parse_vec3(optional_text(&light, "position"), p.position)?;
            p.ambient = parse_vec3(optional_text(&light, "ambient"), p.ambient)?;
            p.diffuse = parse_vec3(optional_text(&light, "diffuse"), p.diffuse)?;
            p.specular = parse_vec3(optional_text(&light, "specular"), p.specular)?;
            p.constant = parse_f32(optional_text(&light, "constant"), p.constant)?;
            p.linear = parse_f32(optional_text(&light, "linear"), p.linear)?;
            p.quadratic = parse_f32(optional_text(&light, "quadratic"), p.quadratic)?;
        }

        if let Some(resources) = optional_text(&root, "resources") {
            config.resource_root = PathBuf::from(resources);
        }

        if let Some(ground) = child(&root, "ground") {
            if let Some(texture) = optional_text(&ground, "texture") {
                config.ground.texture = PathBuf::from(texture);
            }
            config.ground.placement = parse_placement(&ground, &config.ground.placement)
                .context("invalid <ground> placement")?;
        }

        let models: Vec<_> = root.children().filter(|n| n.has_tag_name("model")).collect();
        if !models.is_empty() {
            config.models = models
                .iter()
                .map(parse_model)
                .collect::<Result<Vec<_>>>()?;
        }

        if let Some(skybox) = child(&root, "skybox") {
            for (slot, face) in config.skybox_faces.iter_mut().zip(SKYBOX_FACE_NAMES) {
                if let Some(path) = optional_text(&skybox, face) {
                    *slot = PathBuf::from(path);
                }
            }
        }

        Ok(config)
    }

    /// Resolves a path relative to the resource root; absolute paths pass through.
    pub fn resource_path(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.resource_root.join(relative)
        }
    }
}

fn parse_model(node: &Node<'_, '_>) -> Result<ModelConfig> {
    let name = required_text(node, "name")?;
    let path = required_text(node, "path").with_context(|| format!("model {name}"))?;
    let placement = parse_placement(node, &Placement::default())
        .with_context(|| format!("invalid placement for model {name}"))?;
    Ok(ModelConfig {
        name,
        path: PathBuf::from(path),
        placement,
    })
}

/// Reads `<position>`, `<scale>` and any number of `<rotation axis="x y z">deg</rotation>`.
fn parse_placement(node: &Node<'_, '_>, defaults: &Placement) -> Result<Placement> {
    let translation = parse_vec3(optional_text(node, "position"), defaults.translation)?;
    let scale = parse_f32(optional_text(node, "scale"), defaults.scale)?;
    let rotation_nodes: Vec<_> = node
        .children()
        .filter(|n| n.has_tag_name("rotation"))
        .collect();
    let rotations = if rotation_nodes.is_empty() {
        defaults.rotations.clone()
    } else {
        rotation_nodes
            .iter()
            .map(|rotation| -> Result<Rotation> {
                let axis = parse_vec3(rotation.attribute("axis").map(str::to_string), Vec3::Y)?;
                let degrees = parse_f32(
                    rotation.text().map(str::trim).map(str::to_string),
                    0.0,
                )?;
                Ok(Rotation::new(axis, degrees))
            })
            .collect::<Result<Vec<_>>>()?
    };
    Ok(Placement {
        translation,
        rotations,
        scale,
    })
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid vector component {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!(
            "vector needs exactly 3 components, got {}",
            numbers.len()
        )),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float {value:?}: {err}")),
        None => Ok(default),
    }
}

fn parse_u32(value: Option<String>, default: u32) -> Result<u32> {
    match value {
        Some(value) => value
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse integer {value:?}: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <window>
            <width>1024</width>
            <title>Kennel</title>
        </window>
        <camera>
            <position>1 2 5</position>
            <speed>4</speed>
        </camera>
        <point_light>
            <position>0 5 0</position>
            <linear>0.5</linear>
        </point_light>
        <resources>assets</resources>
        <model>
            <name>cube</name>
            <path>meshes/cube.obj</path>
            <position>0 1 0</position>
            <rotation axis="0 1 0">45</rotation>
            <rotation axis="1 0 0">-30</rotation>
            <scale>0.5</scale>
        </model>
        <skybox>
            <top>sky/up.png</top>
        </skybox>
    </scene>
    "#;

    #[test]
    fn defaults_match_the_demo_scene() {
        let config = AppConfig::default();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.camera.start_position, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(config.projection.near, 1.1);
        assert_eq!(config.projection.far, 100.0);
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.point_light.quadratic, 0.032);
        assert_eq!(
            config.skybox_faces[2],
            PathBuf::from("textures/cube/top.jpg")
        );
    }

    #[test]
    fn xml_overrides_only_given_fields() {
        let config = AppConfig::from_xml(SAMPLE).unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.title, "Kennel");
        assert_eq!(config.camera.start_position, Vec3::new(1.0, 2.0, 5.0));
        assert_eq!(config.camera.movement_speed, 4.0);
        assert_eq!(config.camera.mouse_sensitivity, DEFAULT_SENSITIVITY);
        assert_eq!(config.point_light.position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(config.point_light.linear, 0.5);
        assert_eq!(config.point_light.constant, 1.0);
        assert_eq!(config.resource_root, PathBuf::from("assets"));
        assert_eq!(config.skybox_faces[2], PathBuf::from("sky/up.png"));
        assert_eq!(
            config.skybox_faces[0],
            PathBuf::from("textures/cube/right.jpg")
        );
    }

    #[test]
    fn model_list_replaces_defaults() {
        let config = AppConfig::from_xml(SAMPLE).unwrap();
        assert_eq!(config.models.len(), 1);
        let model = &config.models[0];
        assert_eq!(model.name, "cube");
        assert_eq!(model.placement.scale, 0.5);
        assert_eq!(model.placement.rotations.len(), 2);
        assert_eq!(model.placement.rotations[1].axis, Vec3::X);
        assert_eq!(model.placement.rotations[1].degrees, -30.0);
    }

    #[test]
    fn model_without_path_is_an_error() {
        let bad = "<scene><model><name>ghost</name></model></scene>";
        assert!(AppConfig::from_xml(bad).is_err());
    }

    #[test]
    fn malformed_vector_is_an_error() {
        let bad = "<scene><camera><position>1 2</position></camera></scene>";
        assert!(AppConfig::from_xml(bad).is_err());
        let bad = "<scene><camera><position>1 two 3</position></camera></scene>";
        assert!(AppConfig::from_xml(bad).is_err());
    }

    #[test]
    fn inverted_clip_planes_are_rejected() {
        let bad = "<scene><projection><near>10</near><far>1</far></projection></scene>";
        assert!(AppConfig::from_xml(bad).is_err());
    }

    #[test]
    fn resource_paths_join_relative_entries() {
        let config = AppConfig::default();
        assert_eq!(
            config.resource_path(Path::new("textures/wood3.jpg")),
            PathBuf::from("resources/textures/wood3.jpg")
        );
    }
}
