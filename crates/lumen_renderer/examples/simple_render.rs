//! Simple ReSTIR example.
//!
//! Renders the Cornell box over a few frames (exercising temporal reuse) and
//! saves the last frame as a PNG.

use anyhow::Result;
use lumen_renderer::{render, Bvh, Camera, Film, RenderConfig, Scene, Vec3};

fn main() -> Result<()> {
    env_logger::init();

    println!("Lumen - ReSTIR example");
    println!("======================");

    let scene = Scene::cornell_box();
    let config = RenderConfig {
        initial_light_samples: 16,
        spatial_resampling_passes: 1,
        seed: 7,
        ..Default::default()
    };
    config.validate()?;

    let start = std::time::Instant::now();
    let bvh = Bvh::new(&scene, config.use_accel_structure)
        .with_interpolation(config.normal_interp, config.texture_mapping);
    println!("BVH built in {:?}", start.elapsed());

    let mut camera = Camera::new()
        .with_resolution(320, 240)
        .with_position(
            Vec3::new(0.0, 1.0, 2.8), // look_from
            Vec3::new(0.0, 1.0, 0.0), // look_at
            Vec3::Y,                  // vup
        )
        .with_vfov(45.0);
    camera.initialize();

    let mut film = Film::new(camera.image_width, camera.image_height);
    let mut previous = None;

    println!(
        "Rendering {}x{} over 4 frames...",
        camera.image_width, camera.image_height
    );
    let start = std::time::Instant::now();
    for frame in 0..4 {
        previous = render(
            &scene,
            &camera,
            &bvh,
            &config,
            &mut film,
            frame,
            previous.as_ref(),
        )?;
    }
    println!("Rendered in {:?}", start.elapsed());

    let filename = "output.png";
    film.save_png(filename)?;
    println!("Saved to {filename}");
    Ok(())
}
