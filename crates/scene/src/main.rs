//! Phone Scene - headless driver for the hand-and-phone scene.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use assets::{AssetCache, FileAssetSource};
use common::{Point, Size};
use input::{InputEvent, PointerEvent, WheelEvent};
use scene::{FrameLoop, FrameOutput, Scene, SceneConfig};
use serde_json::{json, Value};

/// Phone Scene - drive the scene headlessly with a synthetic pointer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene asset to load (defaults to the configured asset path)
    asset: Option<String>,

    /// Number of frames to run
    #[arg(long, default_value = "120")]
    frames: u64,

    /// Viewport width
    #[arg(long)]
    width: Option<f32>,

    /// Viewport height
    #[arg(long)]
    height: Option<f32>,

    /// Frames per second of the virtual clock
    #[arg(long, default_value = "60")]
    fps: f64,

    /// Frame to press the screen at
    #[arg(long)]
    press_at: Option<u64>,

    /// Frame to release the screen at
    #[arg(long)]
    release_at: Option<u64>,

    /// Wheel event as FRAME:DELTA, repeatable
    #[arg(long, value_parser = parse_wheel)]
    wheel_at: Vec<(u64, f32)>,

    /// Scale lerp factors by frame time
    #[arg(long)]
    frame_rate_independent: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print overlay placements of the last frame as JSON
    #[arg(long)]
    dump_overlay: bool,
}

fn parse_wheel(value: &str) -> Result<(u64, f32), String> {
    let (frame, delta) = value
        .split_once(':')
        .ok_or_else(|| format!("expected FRAME:DELTA, got {value}"))?;
    let frame = frame.trim().parse().map_err(|_| format!("invalid frame {frame}"))?;
    let delta = delta.trim().parse().map_err(|_| format!("invalid delta {delta}"))?;
    Ok((frame, delta))
}

/// Pointer position for a frame along a slow figure-eight.
fn pointer_path(frame: u64, config: &SceneConfig) -> Point {
    let t = frame as f32 / 90.0;
    let size = config.viewport;
    Point::new(
        size.width / 2.0 + size.width / 3.0 * t.cos(),
        size.height / 2.0 + size.height / 3.0 * (2.0 * t).sin(),
    )
}

/// Overlay placements with the inline styles for their outer and inner
/// elements.
fn overlay_dump(output: &FrameOutput, viewport: Size) -> serde_json::Result<Value> {
    output
        .overlays
        .iter()
        .map(|placement| {
            Ok(json!({
                "placement": serde_json::to_value(placement)?,
                "outer_style": placement.outer_style(viewport),
                "inner_style": placement.inner_style(),
            }))
        })
        .collect::<serde_json::Result<Vec<Value>>>()
        .map(Value::from)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Phone Scene v{}", scene::VERSION);

    // Build configuration
    let mut config = match &args.config {
        Some(path) => SceneConfig::from_file(path).with_context(|| format!("reading config {path}"))?,
        None => SceneConfig::default(),
    };
    if args.frame_rate_independent {
        config = config.with_timing(animator::FrameTiming::delta_scaled());
    }
    if let Some(width) = args.width {
        config.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.viewport.height = height;
    }
    if let Some(asset) = &args.asset {
        config.asset_path = asset.clone();
    }

    // Load the asset graph
    let cache = AssetCache::new(FileAssetSource::new("."));
    let graph = cache
        .load(&config.asset_path)
        .await
        .with_context(|| format!("loading {}", config.asset_path))?;

    // Mount the scene and schedule input
    let scene = Scene::mount(graph, config.clone())?;
    let screen = scene.screen_rect().center();
    let mut frame_loop = FrameLoop::new(scene);
    frame_loop.set_frame_rate(args.fps);

    for frame in 0..args.frames {
        let event = PointerEvent::new(1, pointer_path(frame, &config));
        frame_loop.schedule(frame, InputEvent::PointerMove(event));
    }
    if let Some(frame) = args.press_at {
        frame_loop.schedule(frame, InputEvent::PointerDown(PointerEvent::new(1, screen)));
    }
    if let Some(frame) = args.release_at {
        frame_loop.schedule(frame, InputEvent::PointerUp(PointerEvent::new(1, screen)));
    }
    for &(frame, delta) in &args.wheel_at {
        frame_loop.schedule(frame, InputEvent::Wheel(WheelEvent::new(screen, delta)));
    }

    // Run
    let log_every = (args.fps.round() as u64).max(1);
    let mut last: Option<FrameOutput> = None;
    let ran = frame_loop.run(args.frames, |output| {
        if output.frame % log_every == 0 {
            info!(
                "frame {}: camera {:?} zoom {:.3} hand {:?} rotation {:.3} pressed {}",
                output.frame,
                output.camera_position,
                output.camera_zoom,
                output.state.hand_position,
                output.state.hand_rotation,
                output.state.pressed
            );
        }
        last = Some(output.clone());
    });

    if args.dump_overlay {
        if let Some(output) = &last {
            println!("{}", serde_json::to_string_pretty(&overlay_dump(output, config.viewport)?)?);
        }
    }

    // Cleanup
    frame_loop.stop();
    info!("Ran {} frames", ran);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_args_default() {
        let args = Args::parse_from(["phone-scene"]);
        assert!(args.asset.is_none());
        assert_eq!(args.frames, 120);
        assert!(!args.frame_rate_independent);
        assert!(args.wheel_at.is_empty());
    }

    #[test]
    fn test_args_with_events() {
        let args = Args::parse_from([
            "phone-scene",
            "assets/scroll.json",
            "--press-at",
            "10",
            "--wheel-at",
            "5:200",
            "--wheel-at",
            "8:-40.5",
        ]);
        assert_eq!(args.asset.as_deref(), Some("assets/scroll.json"));
        assert_eq!(args.press_at, Some(10));
        assert_eq!(args.wheel_at, vec![(5, 200.0), (8, -40.5)]);
    }

    #[test]
    fn test_parse_wheel_rejects_garbage() {
        assert!(parse_wheel("5").is_err());
        assert!(parse_wheel("x:1").is_err());
        assert!(parse_wheel("1:y").is_err());
    }

    #[test]
    fn test_overlay_dump_includes_styles() {
        let graph = assets::loader::parse_export(include_bytes!("../../../assets/scroll.json")).unwrap();
        let config = SceneConfig::default();
        let mut scene = Scene::mount(std::sync::Arc::new(graph), config.clone()).unwrap();
        let output = scene.frame(Duration::from_millis(16), Duration::from_millis(16)).unwrap();

        let dump = overlay_dump(&output, config.viewport).unwrap();
        let entry = &dump[0];
        assert!(entry["outer_style"].as_str().unwrap().contains("z-index:"));
        assert!(entry["inner_style"].as_str().unwrap().contains("matrix3d("));
        assert_eq!(entry["placement"]["mask"], 1);
    }

    #[test]
    fn test_pointer_path_stays_in_viewport() {
        let config = SceneConfig::default();
        for frame in 0..600 {
            let p = pointer_path(frame, &config);
            assert!(p.x >= 0.0 && p.x <= config.viewport.width);
            assert!(p.y >= 0.0 && p.y <= config.viewport.height);
        }
    }
}
