//! Name-keyed property updates, as a host toolkit delivers them.
//!
//! Hosts address props by string name and hand over loosely typed values:
//! numbers as doubles and colors either as packed `0xAARRGGBB` integers
//! (often sign-extended to a negative 32-bit value) or as CSS strings.

use serde::{Deserialize, Serialize};

use meshgrad_engine::paint::{Color, ColorParseError};

use crate::error::PropError;
use crate::props::{MeshGradientProps, Prop};

/// One color as received from a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorInput {
    /// Packed `0xAARRGGBB`, unsigned or sign-extended `i32`.
    Argb(i64),
    /// Any CSS color syntax.
    Css(String),
}

impl ColorInput {
    pub fn resolve(&self) -> Result<Color, PropError> {
        match self {
            ColorInput::Argb(v) => {
                let packed = if (0..=i64::from(u32::MAX)).contains(v) {
                    *v as u32
                } else if (i64::from(i32::MIN)..0).contains(v) {
                    *v as i32 as u32
                } else {
                    return Err(ColorParseError {
                        input: v.to_string(),
                        reason: "packed color does not fit in 32 bits".to_string(),
                    }
                    .into());
                };
                Ok(Color::from_argb_u32(packed))
            }
            ColorInput::Css(s) => Ok(Color::parse(s)?),
        }
    }
}

impl From<Color> for ColorInput {
    fn from(c: Color) -> Self {
        ColorInput::Argb(i64::from(c.to_argb_u32()))
    }
}

impl From<&str> for ColorInput {
    fn from(s: &str) -> Self {
        ColorInput::Css(s.to_string())
    }
}

/// A loosely typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Number(f64),
    Colors(Vec<ColorInput>),
}

impl PropValue {
    /// Converts a JSON value such as `5`, `0.7` or `["red", -16776961, ...]`.
    pub fn from_json(value: serde_json::Value) -> Result<Self, PropError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn colors<I, C>(colors: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColorInput>,
    {
        PropValue::Colors(colors.into_iter().map(Into::into).collect())
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Number(v)
    }
}

impl From<f32> for PropValue {
    fn from(v: f32) -> Self {
        PropValue::Number(f64::from(v))
    }
}

/// Applies `value` to the prop called `name`.
///
/// On error `props` is left untouched. Returns the prop that changed.
pub fn apply_prop(
    props: &mut MeshGradientProps,
    name: &str,
    value: PropValue,
) -> Result<Prop, PropError> {
    let prop = Prop::from_name(name).ok_or_else(|| PropError::UnknownProp(name.to_string()))?;

    match (prop, value) {
        (Prop::Colors, PropValue::Colors(inputs)) => {
            let colors = inputs
                .iter()
                .map(ColorInput::resolve)
                .collect::<Result<Vec<_>, _>>()?;
            props.set_colors(&colors)?;
        }
        (Prop::Colors, PropValue::Number(_)) => {
            return Err(PropError::TypeMismatch {
                prop: prop.name(),
                expected: "a list of 4 colors",
            });
        }
        (_, PropValue::Number(v)) => props.set_number(prop, v)?,
        (_, PropValue::Colors(_)) => {
            return Err(PropError::TypeMismatch {
                prop: prop.name(),
                expected: "a number",
            });
        }
    }

    Ok(prop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn packed_colors_accept_both_signs() {
        let unsigned = ColorInput::Argb(0xFF00_00FF).resolve().unwrap();
        let signed = ColorInput::Argb(-16_776_961).resolve().unwrap();
        assert_eq!(unsigned, Color::BLUE);
        assert_eq!(signed, Color::BLUE);

        assert!(ColorInput::Argb(1 << 33).resolve().is_err());
        assert!(ColorInput::Argb(i64::from(i32::MIN) - 1).resolve().is_err());
    }

    #[test]
    fn packed_alpha_is_kept_but_rgb_is_exact() {
        let c = ColorInput::Argb(0x8076_9CDF).resolve().unwrap();
        assert_eq!(c.r, 0x76 as f32 / 255.0);
        assert_eq!(c.g, 0x9C as f32 / 255.0);
        assert_eq!(c.b, 0xDF as f32 / 255.0);
        assert_eq!(c.a, 0x80 as f32 / 255.0);
    }

    #[test]
    fn css_colors_resolve() {
        assert_eq!(ColorInput::from("blue").resolve().unwrap(), Color::BLUE);
        assert_eq!(ColorInput::from("#ff0000").resolve().unwrap(), Color::RED);
        assert!(matches!(
            ColorInput::from("not a color").resolve(),
            Err(PropError::InvalidColor(_))
        ));
    }

    #[test]
    fn json_values_map_to_prop_values() {
        assert_eq!(PropValue::from_json(json!(5)).unwrap(), PropValue::Number(5.0));
        assert_eq!(
            PropValue::from_json(json!(["red", -1])).unwrap(),
            PropValue::Colors(vec![ColorInput::from("red"), ColorInput::Argb(-1)])
        );
        assert!(PropValue::from_json(json!({ "r": 1 })).is_err());
    }

    #[test]
    fn apply_by_name() {
        let mut props = MeshGradientProps::default();
        assert_eq!(apply_prop(&mut props, "speed", PropValue::Number(5.0)).unwrap(), Prop::Speed);
        assert_eq!(props.speed, 5.0);

        let colors = PropValue::colors(["#769CDF", "#8991A2", "#A288A6", "#FF5449"]);
        assert_eq!(apply_prop(&mut props, "colors", colors).unwrap(), Prop::Colors);
        assert_eq!(props.colors[0].to_argb_u32(), 0xFF76_9CDF);
    }

    #[test]
    fn apply_rejects_without_side_effects() {
        let mut props = MeshGradientProps::default();
        let before = props;

        assert!(matches!(
            apply_prop(&mut props, "sped", PropValue::Number(1.0)),
            Err(PropError::UnknownProp(name)) if name == "sped"
        ));
        assert!(matches!(
            apply_prop(&mut props, "colors", PropValue::Number(1.0)),
            Err(PropError::TypeMismatch { prop: "colors", .. })
        ));
        assert!(matches!(
            apply_prop(&mut props, "speed", PropValue::colors([Color::RED])),
            Err(PropError::TypeMismatch { prop: "speed", .. })
        ));
        assert!(apply_prop(&mut props, "brightness", PropValue::Number(-0.1)).is_err());
        assert!(apply_prop(
            &mut props,
            "colors",
            PropValue::colors(["red", "red", "red", "bogus"])
        )
        .is_err());

        assert_eq!(props, before);
    }
}
