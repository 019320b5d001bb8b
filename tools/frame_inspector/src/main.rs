use std::env;
use std::path::Path;

use aperture_core::{evaluate, FrameInputs, Outcome, Scene, SceneConfig};
use aperture_shared::frustum::Frustum;
use aperture_shared::uniform::CameraUniform;
use glam::Mat4;
use tracing::info;

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("Usage: frame_inspector <path/to/scene.toml>");
        std::process::exit(2);
    };

    if let Err(err) = run(Path::new(&path)) {
        eprintln!("frame_inspector error: {err}");
        std::process::exit(1);
    }
}

fn run(path: &Path) -> Result<(), String> {
    let config = SceneConfig::load(path).map_err(|err| err.to_string())?;
    let scene = Scene::from_config(&config)
        .map_err(|err| format!("invalid scene {}: {err}", path.display()))?;

    let Some(viewer) = &config.viewer else {
        return Err(format!("{} has no [viewer] section", path.display()));
    };
    let viewer = viewer.camera().map_err(|err| err.to_string())?;
    let inputs = FrameInputs {
        viewer,
        render_target: config.render_target.map(|target| target.size()),
    };

    let frustum = Frustum::from_camera(&viewer).map_err(|err| format!("viewer frustum: {err}"))?;
    println!("Viewer frustum:");
    for (index, corner) in frustum.corners.iter().enumerate() {
        println!("  corner {index}: ({:.3}, {:.3}, {:.3})", corner.x, corner.y, corner.z);
    }

    let outputs = evaluate(&scene, &inputs);
    info!(
        "Evaluated {} portals and {} windows",
        outputs.portals.len(),
        outputs.windows.len()
    );

    for (id, outcome) in &outputs.portals {
        match outcome {
            Outcome::Ready(frame) => {
                let view = &frame.view;
                println!("Portal {}: near {:.3}", id.0, view.near_distance);
                print_rect("viewport", view.viewport.x, view.viewport.y, view.viewport.width, view.viewport.height);
                println!(
                    "  pixels: {}x{} at ({}, {})",
                    frame.pixels.width, frame.pixels.height, frame.pixels.x, frame.pixels.y
                );
                print_matrix("world_to_portal", view.world_to_portal);
                print_matrix("projection", view.projection);
                for (corner, point) in view.corner_points.iter().enumerate() {
                    match point {
                        Some(point) => println!("  corner {corner} uv: ({:.4}, {:.4})", point.x, point.y),
                        None => println!("  corner {corner} uv: behind viewer"),
                    }
                }
                let uniform = CameraUniform::from(view);
                println!("  uniform position: {:?}", uniform.position);
            }
            Outcome::Skipped(reason) => println!("Portal {}: skipped ({reason:?})", id.0),
        }
    }

    for (id, outcome) in &outputs.windows {
        match outcome {
            Outcome::Ready(frame) => {
                let camera = &frame.camera;
                println!("Window {}:", id.0);
                print_rect("viewport", camera.viewport.x, camera.viewport.y, camera.viewport.width, camera.viewport.height);
                print_matrix("projection", camera.projection);
                let uniform = CameraUniform::from(camera);
                println!("  uniform position: {:?}", uniform.position);
            }
            Outcome::Skipped(reason) => println!("Window {}: skipped ({reason:?})", id.0),
        }
    }

    Ok(())
}

fn print_rect(label: &str, x: f32, y: f32, width: f32, height: f32) {
    println!("  {label}: x {x:.4} y {y:.4} w {width:.4} h {height:.4}");
}

fn print_matrix(label: &str, matrix: Mat4) {
    println!("  {label}:");
    for row in 0..4 {
        let r = matrix.row(row);
        println!("    [{:>9.4} {:>9.4} {:>9.4} {:>9.4}]", r.x, r.y, r.z, r.w);
    }
}
