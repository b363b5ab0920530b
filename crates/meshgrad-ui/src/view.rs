use meshgrad_engine::coords::Rect;
use meshgrad_engine::paint::Color;
use meshgrad_engine::render::{MeshGradientRenderer, RenderCtx, RenderTarget};

use crate::bridge::{self, PropValue};
use crate::error::PropError;
use crate::props::{MeshGradientProps, Prop};

/// [`MeshGradientView::nudge`] results are rounded to `1 / NUDGE_SCALE`.
pub const NUDGE_SCALE: f32 = 1e4;

/// Name under which the view is registered with a host toolkit.
pub const VIEW_NAME: &str = "MeshGradientView";

/// A mesh gradient surface: current props plus the renderer that draws them.
///
/// Every setter validates its input. A rejected value is logged, reported
/// as a [`PropError`] and the previous value stays in effect, so a drawing
/// view never holds props the shader cannot use.
pub struct MeshGradientView {
    props: MeshGradientProps,
    renderer: MeshGradientRenderer,
}

impl Default for MeshGradientView {
    fn default() -> Self {
        Self::new(MeshGradientProps::default())
    }
}

impl MeshGradientView {
    /// Creates a view; props that fail validation are replaced by the defaults.
    pub fn new(props: MeshGradientProps) -> Self {
        let props = match props.validate() {
            Ok(()) => props,
            Err(errors) => {
                for e in &errors {
                    log::warn!("{VIEW_NAME}: {e}");
                }
                log::warn!("{VIEW_NAME}: falling back to default props");
                MeshGradientProps::default()
            }
        };

        Self {
            props,
            renderer: MeshGradientRenderer::new(),
        }
    }

    pub fn props(&self) -> &MeshGradientProps {
        &self.props
    }

    /// Replaces all props at once, or none if any is invalid.
    pub fn set_props(&mut self, props: MeshGradientProps) -> Result<(), PropError> {
        if let Err(mut errors) = props.validate() {
            let first = errors.remove(0);
            return Err(self.rejected(first));
        }
        self.props = props;
        Ok(())
    }

    pub fn set_colors(&mut self, colors: &[Color]) -> Result<(), PropError> {
        let res = self.props.set_colors(colors);
        res.map_err(|e| self.rejected(e))
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<(), PropError> {
        self.set_number(Prop::Speed, speed)
    }

    pub fn set_brightness(&mut self, brightness: f32) -> Result<(), PropError> {
        self.set_number(Prop::Brightness, brightness)
    }

    pub fn set_contrast(&mut self, contrast: f32) -> Result<(), PropError> {
        self.set_number(Prop::Contrast, contrast)
    }

    pub fn set_frequency(&mut self, frequency: f32) -> Result<(), PropError> {
        self.set_number(Prop::Frequency, frequency)
    }

    pub fn set_amplitude(&mut self, amplitude: f32) -> Result<(), PropError> {
        self.set_number(Prop::Amplitude, amplitude)
    }

    /// Adds `delta` to a numeric prop. Out-of-range results are rejected.
    ///
    /// The sum is rounded to four decimals so repeated steps land exactly
    /// on the range ends.
    pub fn nudge(&mut self, prop: Prop, delta: f32) -> Result<f32, PropError> {
        let Some(current) = self.props.number(prop) else {
            return Err(self.rejected(PropError::TypeMismatch {
                prop: prop.name(),
                expected: "a list of 4 colors",
            }));
        };
        let next = ((current + delta) * NUDGE_SCALE).round() / NUDGE_SCALE;
        self.set_number(prop, next)?;
        Ok(next)
    }

    /// Host entry point: sets the prop called `name`.
    pub fn apply_prop(&mut self, name: &str, value: PropValue) -> Result<(), PropError> {
        match bridge::apply_prop(&mut self.props, name, value) {
            Ok(prop) => {
                log::debug!("{VIEW_NAME}: {prop} updated");
                Ok(())
            }
            Err(e) => Err(self.rejected(e)),
        }
    }

    /// Draws the gradient over the whole target at `time` seconds.
    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, time: f32) {
        let params = self.props.to_params();
        self.renderer.render(ctx, target, &params, time);
    }

    /// Draws the gradient into `rect` (physical px) of the target.
    pub fn draw_in(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        time: f32,
        rect: Rect,
    ) {
        let params = self.props.to_params();
        self.renderer.render_in(ctx, target, &params, time, rect);
    }

    fn set_number(&mut self, prop: Prop, value: f32) -> Result<(), PropError> {
        let res = self.props.set_number(prop, f64::from(value));
        res.map_err(|e| self.rejected(e))
    }

    fn rejected(&self, err: PropError) -> PropError {
        log::warn!("{VIEW_NAME}: rejected update: {err}");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_validate_and_keep_previous() {
        let mut view = MeshGradientView::default();

        view.set_speed(5.0).unwrap();
        assert!(view.set_speed(0.0).is_err());
        assert!(view.set_speed(f32::NAN).is_err());
        assert_eq!(view.props().speed, 5.0);

        view.set_brightness(0.7).unwrap();
        assert!(view.set_brightness(2.5).is_err());
        assert_eq!(view.props().brightness, 0.7);

        view.set_contrast(1.3).unwrap();
        assert!(view.set_contrast(-0.1).is_err());
        assert_eq!(view.props().contrast, 1.3);

        assert!(view.set_frequency(-5.0).is_err());
        assert_eq!(view.props().frequency, 5.0);

        assert!(view.set_amplitude(0.0).is_err());
        assert_eq!(view.props().amplitude, 30.0);

        assert!(view.set_colors(&[Color::WHITE; 5]).is_err());
        assert_eq!(view.props().colors[0], Color::RED);
    }

    #[test]
    fn invalid_initial_props_fall_back_to_defaults() {
        let props = MeshGradientProps {
            amplitude: 0.0,
            ..MeshGradientProps::default()
        };
        let view = MeshGradientView::new(props);
        assert_eq!(*view.props(), MeshGradientProps::default());
    }

    #[test]
    fn set_props_is_all_or_nothing() {
        let mut view = MeshGradientView::default();
        let bad = MeshGradientProps {
            speed: 9.0,
            contrast: 3.0,
            ..MeshGradientProps::default()
        };
        assert!(view.set_props(bad).is_err());
        assert_eq!(view.props().speed, 2.0);
    }

    #[test]
    fn nudge_steps_and_stops_at_range() {
        let mut view = MeshGradientView::default();
        assert_eq!(view.nudge(Prop::Speed, 0.5).unwrap(), 2.5);
        assert_eq!(view.nudge(Prop::Amplitude, -2.0).unwrap(), 28.0);

        view.set_brightness(0.05).unwrap();
        assert!(view.nudge(Prop::Brightness, -0.1).is_err());
        assert_eq!(view.props().brightness, 0.05);

        assert!(view.nudge(Prop::Colors, 1.0).is_err());
    }

    #[test]
    fn repeated_nudges_reach_range_ends() {
        let mut view = MeshGradientView::default();
        for _ in 0..10 {
            view.nudge(Prop::Brightness, 0.1).unwrap();
        }
        assert_eq!(view.props().brightness, 2.0);
        assert!(view.nudge(Prop::Brightness, 0.1).is_err());

        for _ in 0..20 {
            view.nudge(Prop::Brightness, -0.1).unwrap();
        }
        assert_eq!(view.props().brightness, 0.0);

        view.set_contrast(1.3).unwrap();
        for _ in 0..7 {
            view.nudge(Prop::Contrast, 0.1).unwrap();
        }
        assert_eq!(view.props().contrast, 2.0);
    }

    #[test]
    fn apply_prop_dispatches_by_name() {
        let mut view = MeshGradientView::default();
        view.apply_prop("frequency", PropValue::Number(7.0)).unwrap();
        view.apply_prop("amplitude", PropValue::Number(12.0)).unwrap();
        view.apply_prop(
            "colors",
            PropValue::colors(["#769CDF", "#8991A2", "#A288A6", "#FF5449"]),
        )
        .unwrap();

        assert_eq!(view.props().frequency, 7.0);
        assert_eq!(view.props().amplitude, 12.0);
        assert_eq!(view.props().colors[2].to_argb_u32(), 0xFFA2_88A6);

        assert!(matches!(
            view.apply_prop("hue", PropValue::Number(1.0)),
            Err(PropError::UnknownProp(_))
        ));
    }

    #[test]
    fn view_name_is_stable() {
        assert_eq!(VIEW_NAME, "MeshGradientView");
    }
}
