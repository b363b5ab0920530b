use winit::dpi::LogicalSize;

use meshgrad_engine::core::{App as EngineApp, AppControl, FrameCtx};
use meshgrad_engine::device::GpuInit;
use meshgrad_engine::input::{Key, Modifiers};
use meshgrad_engine::paint::Color;
use meshgrad_engine::window::{Runtime, RuntimeConfig};

use crate::props::MeshGradientProps;
use crate::view::MeshGradientView;

// ── KeyCtx ────────────────────────────────────────────────────────────────

/// Handle passed to [`Application::on_key`] callbacks.
///
/// Changes made through `view` take effect on the frame being drawn.
pub struct KeyCtx<'a> {
    pub view: &'a mut MeshGradientView,
    /// Modifiers held when the key went down.
    pub modifiers: Modifiers,
    exit: bool,
}

impl KeyCtx<'_> {
    /// Closes the window and ends [`Application::run`].
    pub fn exit(&mut self) {
        self.exit = true;
    }
}

type KeyHandler = Box<dyn FnMut(&mut KeyCtx<'_>)>;

// ── Application ───────────────────────────────────────────────────────────

/// One-window mesh gradient preview.
///
/// The gradient fills the window, is redrawn every frame over a black clear
/// and animates with the window's frame clock.
///
/// ```rust,ignore
/// Application::new()
///     .title("gradient")
///     .props(props)
///     .on_key(Key::ArrowUp, |ctx| { let _ = ctx.view.nudge(Prop::Speed, 0.5); })
///     .on_key(Key::Escape, |ctx| ctx.exit())
///     .run()?;
/// ```
pub struct Application {
    title:    String,
    width:    f64,
    height:   f64,
    props:    MeshGradientProps,
    gpu_init: GpuInit,
    keys:     Vec<(Key, KeyHandler)>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        let defaults = RuntimeConfig::default();
        Self {
            title:    defaults.title,
            width:    defaults.initial_size.width,
            height:   defaults.initial_size.height,
            props:    MeshGradientProps::default(),
            gpu_init: GpuInit::default(),
            keys:     Vec::new(),
        }
    }

    /// Set the window title.
    pub fn title(mut self, t: impl Into<String>) -> Self {
        self.title = t.into();
        self
    }

    /// Set the initial window size in logical pixels.
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width  = width;
        self.height = height;
        self
    }

    /// Initial gradient props. Invalid props fall back to the defaults.
    pub fn props(mut self, props: MeshGradientProps) -> Self {
        self.props = props;
        self
    }

    /// Override GPU/surface preferences.
    pub fn gpu_init(mut self, init: GpuInit) -> Self {
        self.gpu_init = init;
        self
    }

    /// Register a callback for presses (and auto-repeats) of `key`.
    ///
    /// Several callbacks may share a key; they run in registration order.
    pub fn on_key<F>(mut self, key: Key, f: F) -> Self
    where
        F: FnMut(&mut KeyCtx<'_>) + 'static,
    {
        self.keys.push((key, Box::new(f)));
        self
    }

    /// Opens the window and runs until it is closed or a handler exits.
    pub fn run(self) -> anyhow::Result<()> {
        let config = RuntimeConfig {
            title:        self.title,
            initial_size: LogicalSize::new(self.width, self.height),
        };

        let app = GradientApp {
            view: MeshGradientView::new(self.props),
            keys: self.keys,
        };

        Runtime::run(config, self.gpu_init, app)
    }
}

// ── GradientApp (internal) ────────────────────────────────────────────────

struct GradientApp {
    view: MeshGradientView,
    keys: Vec<(Key, KeyHandler)>,
}

impl GradientApp {
    /// Runs the handlers bound to `key`; returns `true` if one asked to exit.
    fn dispatch_key(&mut self, key: Key, modifiers: Modifiers) -> bool {
        let mut ctx = KeyCtx {
            view: &mut self.view,
            modifiers,
            exit: false,
        };
        for (bound, handler) in self.keys.iter_mut() {
            if *bound == key {
                handler(&mut ctx);
            }
        }
        ctx.exit
    }
}

impl EngineApp for GradientApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let presses: Vec<_> = ctx.input_frame.presses().collect();
        for (key, modifiers) in presses {
            if self.dispatch_key(key, modifiers) {
                return AppControl::Exit;
            }
        }

        let time = ctx.time.elapsed;
        let view = &mut self.view;
        ctx.render(Color::BLACK, |rctx, target| view.draw(rctx, target, time))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::props::Prop;

    fn gradient_app(builder: Application) -> GradientApp {
        GradientApp {
            view: MeshGradientView::new(builder.props),
            keys: builder.keys,
        }
    }

    #[test]
    fn builder_defaults() {
        let app = Application::new();
        assert_eq!(app.title, "mesh gradient");
        assert_eq!(app.props, MeshGradientProps::default());
        assert!(app.keys.is_empty());

        let app = app.title("x").size(100.0, 200.0);
        assert_eq!((app.title.as_str(), app.width, app.height), ("x", 100.0, 200.0));
    }

    #[test]
    fn handlers_run_for_their_key_only() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();

        let mut app = gradient_app(
            Application::new()
                .on_key(Key::ArrowUp, |ctx| {
                    let _ = ctx.view.nudge(Prop::Speed, 0.5);
                })
                .on_key(Key::ArrowUp, move |_| h.set(h.get() + 1)),
        );

        assert!(!app.dispatch_key(Key::ArrowUp, Modifiers::NONE));
        assert!(!app.dispatch_key(Key::ArrowDown, Modifiers::NONE));

        assert_eq!(app.view.props().speed, 2.5);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn handlers_see_modifiers_and_can_exit() {
        let mut app = gradient_app(
            Application::new()
                .on_key(Key::B, |ctx| {
                    let step = if ctx.modifiers.shift { -0.1 } else { 0.1 };
                    let _ = ctx.view.nudge(Prop::Brightness, step);
                })
                .on_key(Key::Escape, |ctx| ctx.exit()),
        );

        app.dispatch_key(Key::B, Modifiers::SHIFT);
        assert!((app.view.props().brightness - 0.9).abs() < 1e-6);

        assert!(app.dispatch_key(Key::Escape, Modifiers::NONE));
    }
}
