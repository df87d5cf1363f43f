use std::time::Duration;

use glam::Vec4;
use texgraph::operator::builtin::Gradient;
use texgraph::prelude::*;
use texgraph_examples::{layer_to_png, settle, PngConfig};

fn main() -> anyhow::Result<()> {
    let mut scene = Scene::new(Graph::with_builtins(), SceneSettings::new(96, 96))?;

    let base = scene.create_node("gradient");
    let overlay = scene.create_node("solid");
    let blend = scene.create_node("blend");
    scene.update_setting(base, "direction", Gradient::VERTICAL)?;
    scene.update_setting(overlay, "color", Vec4::new(0.9, 0.3, 0.1, 1.0))?;
    scene.update_setting(blend, "opacity", 0.75f32)?;
    scene.connect(ConnectorId::output(base, 0), ConnectorId::input(blend, 0));
    scene.connect(ConnectorId::output(overlay, 0), ConnectorId::input(blend, 1));

    scene.start_processing()?;
    let config = PngConfig::default().with_scale(2);
    for (index, mode) in BlendMode::ALL.iter().enumerate() {
        scene.update_setting(blend, "mode", index as i32)?;
        settle(&scene, blend, Duration::from_secs(10))?;
        let out = format!("blend-{}.png", mode.label());
        layer_to_png(&scene, blend, DEFAULT_LAYER, &config, out)?;
    }

    scene.stop_processing();
    Ok(())
}
