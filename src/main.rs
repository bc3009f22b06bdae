use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use log::info;

use pet_sims::scene::{draw_list, DrawableKind};
use pet_sims::AppConfig;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let config = match &options.scene {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => AppConfig::default(),
    };

    if options.summary_only {
        print_summary(&config);
        return Ok(());
    }

    info!(
        "Opening '{}' at {}x{}",
        config.window.title, config.window.width, config.window.height
    );
    pet_sims::app::run(config)
}

fn print_summary(config: &AppConfig) {
    println!(
        "Window: {} ({}x{})",
        config.window.title, config.window.width, config.window.height
    );
    println!(
        "Camera: start={} speed={:.2} sensitivity={:.2}",
        fmt_vec3(config.camera.start_position),
        config.camera.movement_speed,
        config.camera.mouse_sensitivity
    );
    println!(
        "Projection: near={:.2} far={:.2}",
        config.projection.near, config.projection.far
    );
    let directional = &config.directional_light;
    println!(
        "Directional light: direction={} diffuse={}",
        fmt_vec3(directional.direction),
        fmt_vec3(directional.diffuse)
    );
    let point = &config.point_light;
    println!(
        "Point light: position={} attenuation=({:.3}, {:.3}, {:.3})",
        fmt_vec3(point.position),
        point.constant,
        point.linear,
        point.quadratic
    );

    let drawables = draw_list(config);
    println!("Draw list ({} entries):", drawables.len());
    for drawable in &drawables {
        let source = match drawable.kind {
            DrawableKind::Ground => config.resource_path(&config.ground.texture),
            DrawableKind::Model(index) => config.resource_path(&config.models[index].path),
        };
        let translation = drawable.model.w_axis.truncate();
        println!(
            " - {} at {} from {}",
            drawable.name,
            fmt_vec3(translation),
            source.display()
        );
    }

    println!("Skybox faces:");
    for (face, path) in pet_sims::config::SKYBOX_FACE_NAMES
        .iter()
        .zip(&config.skybox_faces)
    {
        println!(" - {face}: {}", config.resource_path(path).display());
    }
}

fn fmt_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

struct CliOptions {
    scene: Option<PathBuf>,
    summary_only: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut scene = None;
        let mut summary_only = false;
        for arg in env::args().skip(1) {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "-h" | "--help" => {
                    return Err(anyhow!("Usage: pet-sims [scene.xml] [--summary-only]"));
                }
                flag if flag.starts_with("--") => {
                    return Err(anyhow!(
                        "Unknown argument: {flag}. Expected --summary-only"
                    ));
                }
                path if scene.is_none() => scene = Some(PathBuf::from(path)),
                extra => {
                    return Err(anyhow!(
                        "Unexpected argument: {extra}. Usage: pet-sims [scene.xml] [--summary-only]"
                    ));
                }
            }
        }
        Ok(Self {
            scene,
            summary_only,
        })
    }
}
