use std::time::Duration;

use texgraph::prelude::*;
use texgraph_examples::{layer_to_png, settle, PngConfig};

/// Builds a small graph, saves it to JSON, loads it into a fresh scene and renders both.
fn main() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join("texgraph-scene.json");

    let mut original = Scene::new(Graph::with_builtins(), SceneSettings::new(64, 48))?;
    let noise = original.create_node("noise");
    let channel = original.create_node("channel");
    original.update_setting(noise, "seed", 1234u32)?;
    original.update_setting(channel, "channel", 1)?;
    original.connect(ConnectorId::output(noise, 0), ConnectorId::input(channel, 0));
    original.save(&path)?;

    original.start_processing()?;
    settle(&original, channel, Duration::from_secs(10))?;
    let config = PngConfig::default().with_scale(4);
    layer_to_png(&original, channel, DEFAULT_LAYER, &config, "save-load-original.png")?;
    original.stop_processing();

    let mut restored = Scene::with_builtins();
    restored.load(&path)?;
    let size = restored.settings().size();
    anyhow::ensure!(size.x == 64 && size.y == 48, "scene size was not restored");

    restored.start_processing()?;
    settle(&restored, channel, Duration::from_secs(10))?;
    layer_to_png(&restored, channel, DEFAULT_LAYER, &config, "save-load-restored.png")?;
    restored.stop_processing();
    Ok(())
}
