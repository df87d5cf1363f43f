use std::time::Duration;

use texgraph::prelude::*;
use texgraph_examples::{layer_to_png, settle, PngConfig};

fn main() -> anyhow::Result<()> {
    let mut scene = Scene::new(Graph::with_builtins(), SceneSettings::new(128, 128))?;

    // noise -> blur -> invert
    let noise = scene.create_node("noise");
    let blur = scene.create_node("blur");
    let invert = scene.create_node("invert");
    scene.update_setting(noise, "seed", 42u32)?;
    scene.update_setting(blur, "passes", 6u32)?;
    scene.connect(ConnectorId::output(noise, 0), ConnectorId::input(blur, 0));
    scene.connect(ConnectorId::output(blur, 0), ConnectorId::input(invert, 0));

    scene.start_processing()?;
    settle(&scene, invert, Duration::from_secs(10))?;

    let config = PngConfig::default().with_scale(4);
    layer_to_png(&scene, noise, DEFAULT_LAYER, &config, "chain-noise.png")?;
    layer_to_png(&scene, blur, DEFAULT_LAYER, &config, "chain-blur.png")?;
    layer_to_png(&scene, invert, DEFAULT_LAYER, &config, "chain-invert.png")?;

    // Changing an upstream setting invalidates the chain; the worker re-runs it.
    scene.update_setting(noise, "seed", 7u32)?;
    settle(&scene, invert, Duration::from_secs(10))?;
    layer_to_png(&scene, invert, DEFAULT_LAYER, &config, "chain-invert-reseeded.png")?;

    scene.stop_processing();
    Ok(())
}
