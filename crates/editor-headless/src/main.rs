//! Headless editor host
//!
//! Mounts one node-editor view against the recording engine, replays a short
//! input session through the router and runtime, then prints every engine
//! call as JSON.
//!
//! Usage: `editor-headless [CONFIG_DIR]` (reads `CONFIG_DIR/bridge.json`,
//! defaults apply when it is missing)

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use editor_commands::builders as cmd;
use editor_commands::{
    route_add_node_action, CanvasRect, CommandResult, DeltaMode, InputContext, InputSource, Key,
    KeyInput, Modifiers, PointerButton, UniformValue, WheelInput,
};
use editor_runtime::recording::{FixedDisplay, RecordingCanvas, RecordingLoader};
use editor_runtime::{
    generate_panel_id, generate_view_id, init_logging, BridgeConfig, BridgeError,
    IntervalFrameClock, MountStatus, PointerAction, RuntimeContext, ViewEvent, ViewHost,
};

const DOCUMENT_ID: &str = "graph-main";
const DEVICE_PIXEL_RATIO: f64 = 2.0;

#[tokio::main]
async fn main() -> ExitCode {
    let config_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let config = match BridgeConfig::load(&config_dir).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {:?}: {}", config_dir, e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Headless session failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn report(label: &str, result: Option<CommandResult>) {
    match result {
        Some(CommandResult::Ok) => log::info!("{}: applied", label),
        Some(CommandResult::Failed { error }) => log::warn!("{}: rejected ({})", label, error),
        None => log::info!("{}: no command", label),
    }
}

fn wheel(delta_x: f64, delta_y: f64, mode: DeltaMode, modifiers: Modifiers) -> WheelInput {
    WheelInput {
        delta_x,
        delta_y,
        delta_mode: mode,
        client_x: 480.0,
        client_y: 320.0,
        modifiers,
    }
}

async fn run(config: BridgeConfig) -> editor_runtime::Result<()> {
    let frame_period = Duration::from_millis(config.frame_interval_ms.max(1));
    let frames = Arc::new(IntervalFrameClock::from_config(&config));
    let loader = Arc::new(RecordingLoader::new());
    let engine = loader.engine();
    let context = RuntimeContext::new(
        loader,
        Arc::new(FixedDisplay::new(DEVICE_PIXEL_RATIO)),
        config,
    );

    let view_id = generate_view_id(DOCUMENT_ID, &generate_panel_id());
    let canvas = Arc::new(RecordingCanvas::new("node-editor-canvas", 960.0, 640.0));
    let host = Arc::new(ViewHost::new(
        context.clone(),
        view_id.as_str(),
        canvas.clone(),
        frames,
    )?);

    let status = host.mount().await?;
    if status != MountStatus::Mounted {
        return Err(BridgeError::InvalidView(format!(
            "view '{}' did not mount: {:?}",
            view_id, status
        )));
    }
    let pump = host.spawn_frame_pump();

    // Pointer input goes straight to the engine
    host.handle_pointer(PointerAction::Enter(0), 480.0, 320.0, Modifiers::NONE);
    host.handle_pointer(PointerAction::Down(0), 480.0, 320.0, Modifiers::NONE);
    host.handle_pointer(PointerAction::Move, 500.0, 330.0, Modifiers::NONE);
    host.handle_pointer(PointerAction::Up(0), 500.0, 330.0, Modifiers::NONE);

    // Routed input becomes commands
    let rect = CanvasRect::new(0.0, 0.0, 960.0, 640.0);
    report(
        "wheel zoom",
        host.handle_wheel(&wheel(0.0, -3.0, DeltaMode::Line, Modifiers::NONE), &rect)
            .await,
    );
    report(
        "trackpad pan",
        host.handle_wheel(&wheel(4.0, 12.0, DeltaMode::Pixel, Modifiers::NONE), &rect)
            .await,
    );
    report(
        "pinch zoom",
        host.handle_wheel(&wheel(0.0, 8.0, DeltaMode::Pixel, Modifiers::ctrl()), &rect)
            .await,
    );
    report(
        "middle drag",
        host.handle_drag(15.0, -5.0, PointerButton::Middle, Modifiers::NONE)
            .await,
    );
    report(
        "escape",
        host.handle_key(&KeyInput::new(Key::from_dom("Escape"), Modifiers::NONE))
            .await,
    );

    // Editor-issued commands
    let input = InputContext::new(view_id.as_str(), InputSource::Mouse, Modifiers::NONE);
    let edits = [
        route_add_node_action("math.add", (120.0, 80.0), &input),
        route_add_node_action("output.color", (360.0, 80.0), &input),
        cmd::connect_nodes(view_id.as_str(), "node-1", "out", "node-2", "color"),
        cmd::set_uniform(view_id.as_str(), "u_time", UniformValue::Number(0.5)),
        cmd::set_selection(view_id.as_str(), ["node-1", "node-2"]),
    ];
    for edit in &edits {
        let result = context.bridge().dispatch_command(edit).await;
        report(edit.command_type().as_str(), Some(result));
    }

    // Window-level shortcuts go to the active view
    for key in ["=", "-", "0"] {
        let shortcut = KeyInput::new(Key::from_dom(key), Modifiers::ctrl());
        if !context.handle_window_key(&shortcut) {
            log::warn!("Shortcut ctrl+{} was not delivered", key);
        }
    }

    // Container resizes, then collapses to nothing
    canvas.set_container_size(1200.0, 800.0);
    host.push_event(ViewEvent::Resized {
        width: 1200.0,
        height: 800.0,
    });
    tokio::time::sleep(frame_period * 2).await;
    host.push_event(ViewEvent::Resized {
        width: 0.0,
        height: 0.0,
    });
    tokio::time::sleep(frame_period * 2).await;

    host.unmount();
    if let Err(e) = pump.await {
        log::warn!("Frame pump ended abnormally: {}", e);
    }
    context.shutdown();

    let calls = engine.calls();
    log::info!("Session finished with {} engine calls", calls.len());
    println!("{}", serde_json::to_string_pretty(&calls)?);
    Ok(())
}
