use texgraph::prelude::*;

/// Drives a scene by hand, one tick at a time, and reports each transition.
fn main() -> anyhow::Result<()> {
    let scene = Scene::new(Graph::with_builtins(), SceneSettings::new(32, 32))?;
    let (tx, rx) = crossbeam_channel::unbounded();

    let solid = scene.create_node("solid");
    let blur = scene.create_node("blur");
    let channel = scene.create_node("channel");
    scene.update_setting(blur, "passes", 3u32)?;
    scene.connect(ConnectorId::output(solid, 0), ConnectorId::input(blur, 0));
    scene.connect(ConnectorId::output(blur, 0), ConnectorId::input(channel, 0));
    scene.set_event_sink(ChannelSink::new(tx));
    scene.set_view_node(Some(channel))?;

    let mut ticks = 0usize;
    while let Tick::Stepped { node, state } = scene.step() {
        ticks += 1;
        let ty = scene
            .with_graph(|g| g.node(node).map(|n| n.type_name().to_owned()))
            .unwrap_or_default();
        println!("tick {ticks:>2}: {ty} ({node}) -> {state}");
    }

    let events: Vec<SceneEvent> = rx.try_iter().collect();
    for event in &events {
        println!("  {event:?}");
    }
    let failures = events
        .iter()
        .filter(|e| matches!(e, SceneEvent::NodeFailed { .. }))
        .count();
    println!("{} event(s), {failures} failure(s)", events.len());
    println!("settled after {ticks} ticks");
    Ok(())
}
