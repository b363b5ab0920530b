use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use meshgrad_engine::device::{GpuInit, HeadlessGpu};
use meshgrad_engine::input::{Key, Modifiers};
use meshgrad_engine::logging::{init_logging, LoggingConfig};
use meshgrad_engine::paint::Color;
use meshgrad_engine::render::render_snapshot;
use meshgrad_engine::time::FrameClock;
use meshgrad_ui::{Application, KeyCtx, MeshGradientProps, MeshGradientView, Prop};

/// Animated mesh gradient preview.
#[derive(Debug, Parser)]
#[command(name = "meshgrad-studio")]
#[command(about = "Preview the mesh gradient in a window or render it to a PNG")]
struct Cli {
    /// Props file (JSON). Missing fields take the component defaults.
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Render one frame to this PNG instead of opening a window.
    #[arg(long, value_name = "PNG")]
    snapshot: Option<PathBuf>,

    /// Window width (logical px) or snapshot width (px).
    #[arg(long, default_value_t = 420)]
    width: u32,

    /// Window height (logical px) or snapshot height (px).
    #[arg(long, default_value_t = 860)]
    height: u32,

    /// Animation time of the snapshot, in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f32,

    /// Log filter in env_logger syntax, overriding RUST_LOG.
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

/// Props shown when no config file is given.
fn studio_props() -> MeshGradientProps {
    MeshGradientProps {
        colors: [
            Color::from_argb_u32(0xFF76_9CDF),
            Color::from_argb_u32(0xFF89_91A2),
            Color::from_argb_u32(0xFFA2_88A6),
            Color::from_argb_u32(0xFFFF_5449),
        ],
        speed: 5.0,
        brightness: 0.7,
        contrast: 1.3,
        ..MeshGradientProps::default()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = match &cli.log {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    };
    init_logging(logging);

    let props = match &cli.config {
        Some(path) => MeshGradientProps::load(path)
            .with_context(|| format!("failed to load props from {}", path.display()))?,
        None => studio_props(),
    };

    match &cli.snapshot {
        Some(path) => snapshot(&props, path, cli.width, cli.height, cli.time),
        None => preview(props, cli.width, cli.height),
    }
}

fn snapshot(props: &MeshGradientProps, path: &Path, width: u32, height: u32, time: f32) -> Result<()> {
    if let Err(errors) = props.validate() {
        for e in &errors {
            log::error!("{e}");
        }
        anyhow::bail!("props are invalid ({} problems)", errors.len());
    }

    let time = FrameClock::fixed(time).elapsed;
    let gpu = HeadlessGpu::new_blocking(&GpuInit::default())?;
    let img = render_snapshot(&gpu, &props.to_params(), time, width, height)?;

    image::save_buffer(path, &img.pixels, img.width, img.height, image::ColorType::Rgba8)
        .with_context(|| format!("failed to write {}", path.display()))?;

    log::info!(
        "wrote {}x{} snapshot at t={time}s to {} ({})",
        width,
        height,
        path.display(),
        gpu.adapter().get_info().name
    );
    Ok(())
}

// ── Interactive preview ───────────────────────────────────────────────────

/// Numeric keys: `(key, prop, step)`. Shift reverses the step, except for
/// the arrow pair which already covers both directions.
const NUDGES: [(Key, Prop, f32); 6] = [
    (Key::ArrowUp,   Prop::Speed,      0.5),
    (Key::ArrowDown, Prop::Speed,     -0.5),
    (Key::B,         Prop::Brightness, 0.1),
    (Key::C,         Prop::Contrast,   0.1),
    (Key::F,         Prop::Frequency,  0.5),
    (Key::A,         Prop::Amplitude,  2.0),
];

fn step_for(key: Key, base: f32, modifiers: Modifiers) -> f32 {
    let arrow = matches!(key, Key::ArrowUp | Key::ArrowDown);
    if modifiers.shift && !arrow { -base } else { base }
}

/// Shifts every color one slot towards the front; the first wraps to the end.
fn rotate_colors(colors: [Color; 4]) -> [Color; 4] {
    let mut out = colors;
    out.rotate_left(1);
    out
}

fn rotate_view_colors(view: &mut MeshGradientView) {
    let colors = rotate_colors(view.props().colors);
    match view.set_colors(&colors) {
        Ok(()) => log::info!("colors rotated"),
        Err(e) => log::warn!("colors unchanged: {e}"),
    }
}

fn preview(props: MeshGradientProps, width: u32, height: u32) -> Result<()> {
    log::info!(
        "keys: up/down speed, [shift+]B brightness, [shift+]C contrast, \
         [shift+]F frequency, [shift+]A amplitude, R reset, space rotate colors, esc quit"
    );

    let mut app = Application::new()
        .title("Mesh Gradient Studio")
        .size(f64::from(width), f64::from(height))
        .props(props);

    for (key, prop, base) in NUDGES {
        app = app.on_key(key, move |ctx: &mut KeyCtx<'_>| {
            let step = step_for(key, base, ctx.modifiers);
            match ctx.view.nudge(prop, step) {
                Ok(v) => log::info!("{prop} = {v:.2}"),
                Err(_) => {
                    let current = ctx.view.props().number(prop).unwrap_or_default();
                    log::info!("{prop} stays at {current:.2}");
                }
            }
        });
    }

    app.on_key(Key::R, move |ctx| {
        if ctx.view.set_props(props).is_ok() {
            log::info!("props reset");
        }
    })
    .on_key(Key::Space, |ctx| rotate_view_colors(ctx.view))
    .on_key(Key::Escape, |ctx| ctx.exit())
    .run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn studio_props_are_valid() {
        let p = studio_props();
        assert!(p.validate().is_ok());
        assert_eq!(p.frequency, 5.0);
        assert_eq!(p.amplitude, 30.0);
        assert_eq!(p.colors[0].to_argb_u32(), 0xFF76_9CDF);
    }

    #[test]
    fn shift_reverses_letter_steps_only() {
        assert_eq!(step_for(Key::B, 0.1, Modifiers::NONE), 0.1);
        assert_eq!(step_for(Key::B, 0.1, Modifiers::SHIFT), -0.1);
        assert_eq!(step_for(Key::ArrowDown, -0.5, Modifiers::SHIFT), -0.5);
    }

    #[test]
    fn rotation_cycles_through_all_slots() {
        let start = studio_props().colors;
        let once = rotate_colors(start);
        assert_eq!(once[0], start[1]);
        assert_eq!(once[3], start[0]);

        let back = (0..4).fold(start, |c, _| rotate_colors(c));
        assert_eq!(back, start);
    }

    #[test]
    fn space_rotates_view_colors() {
        let mut view = MeshGradientView::new(studio_props());
        let start = view.props().colors;

        rotate_view_colors(&mut view);
        assert_eq!(view.props().colors, rotate_colors(start));
    }

    #[test]
    fn cli_defaults_and_flags() {
        let cli = Cli::try_parse_from(["meshgrad-studio"]).unwrap();
        assert_eq!((cli.width, cli.height, cli.time), (420, 860, 0.0));
        assert!(cli.snapshot.is_none());

        let cli = Cli::try_parse_from([
            "meshgrad-studio",
            "--snapshot", "out.png",
            "--width", "64",
            "--height", "32",
            "--time", "1.5",
            "--log", "debug",
        ])
        .unwrap();
        assert_eq!(cli.snapshot.as_deref(), Some(Path::new("out.png")));
        assert_eq!((cli.width, cli.height, cli.time), (64, 32, 1.5));
        assert_eq!(cli.log.as_deref(), Some("debug"));
    }

    #[test]
    fn cli_rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["meshgrad-studio", "--fps", "60"]).is_err());
    }
}
