//! Component props and their valid ranges.

use std::path::Path;

use serde::{Deserialize, Serialize};

use meshgrad_engine::paint::Color;
use meshgrad_engine::render::MeshGradientParams;

use crate::bridge::ColorInput;
use crate::error::PropError;

/// Names a numeric or color property of the gradient.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Prop {
    Colors,
    Speed,
    Brightness,
    Contrast,
    Frequency,
    Amplitude,
}

impl Prop {
    pub const ALL: [Prop; 6] = [
        Prop::Colors,
        Prop::Speed,
        Prop::Brightness,
        Prop::Contrast,
        Prop::Frequency,
        Prop::Amplitude,
    ];

    /// Property name as used by hosts and in props documents.
    pub fn name(self) -> &'static str {
        match self {
            Prop::Colors => "colors",
            Prop::Speed => "speed",
            Prop::Brightness => "brightness",
            Prop::Contrast => "contrast",
            Prop::Frequency => "frequency",
            Prop::Amplitude => "amplitude",
        }
    }

    pub fn from_name(name: &str) -> Option<Prop> {
        Prop::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Human-readable valid range, `None` for colors.
    pub fn expected(self) -> Option<&'static str> {
        match self {
            Prop::Colors => None,
            Prop::Speed | Prop::Frequency | Prop::Amplitude => Some("> 0"),
            Prop::Brightness | Prop::Contrast => Some("within 0..=2"),
        }
    }

    /// Validates a numeric value for this property.
    pub fn check(self, value: f64) -> Result<f32, PropError> {
        let Some(expected) = self.expected() else {
            return Err(PropError::TypeMismatch {
                prop: self.name(),
                expected: "a list of 4 colors",
            });
        };

        let ok = value.is_finite()
            && match self {
                Prop::Brightness | Prop::Contrast => (0.0..=2.0).contains(&value),
                _ => value > 0.0,
            };

        // The narrowing must not turn a tiny positive value into zero.
        let narrowed = value as f32;
        if ok && (narrowed > 0.0 || matches!(self, Prop::Brightness | Prop::Contrast)) {
            Ok(narrowed)
        } else {
            Err(PropError::OutOfRange {
                prop: self.name(),
                value,
                expected,
            })
        }
    }
}

impl std::fmt::Display for Prop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Gradient props with their defaults.
///
/// | prop | default | valid |
/// |------|---------|-------|
/// | `colors` | red, yellow, green, blue | exactly 4 |
/// | `speed` | 2 | > 0 |
/// | `brightness` | 1 | 0..=2 |
/// | `contrast` | 1 | 0..=2 |
/// | `frequency` | 5 | > 0 |
/// | `amplitude` | 30 | > 0 |
///
/// Fields are public for direct construction; [`MeshGradientProps::validate`]
/// checks such values. The setters validate eagerly and keep the previous
/// value on rejection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MeshGradientProps {
    pub colors: [Color; 4],
    pub speed: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub frequency: f32,
    pub amplitude: f32,
}

impl Default for MeshGradientProps {
    fn default() -> Self {
        let p = MeshGradientParams::default();
        Self {
            colors: p.colors,
            speed: p.speed,
            brightness: p.brightness,
            contrast: p.contrast,
            frequency: p.frequency,
            amplitude: p.amplitude,
        }
    }
}

impl MeshGradientProps {
    /// Reads a numeric property.
    pub fn number(&self, prop: Prop) -> Option<f32> {
        match prop {
            Prop::Colors => None,
            Prop::Speed => Some(self.speed),
            Prop::Brightness => Some(self.brightness),
            Prop::Contrast => Some(self.contrast),
            Prop::Frequency => Some(self.frequency),
            Prop::Amplitude => Some(self.amplitude),
        }
    }

    /// Sets a numeric property after validation.
    pub fn set_number(&mut self, prop: Prop, value: f64) -> Result<(), PropError> {
        let v = prop.check(value)?;
        if let Some(slot) = self.number_mut(prop) {
            *slot = v;
        }
        Ok(())
    }

    fn number_mut(&mut self, prop: Prop) -> Option<&mut f32> {
        match prop {
            Prop::Colors => None,
            Prop::Speed => Some(&mut self.speed),
            Prop::Brightness => Some(&mut self.brightness),
            Prop::Contrast => Some(&mut self.contrast),
            Prop::Frequency => Some(&mut self.frequency),
            Prop::Amplitude => Some(&mut self.amplitude),
        }
    }

    /// Replaces the four gradient colors.
    pub fn set_colors(&mut self, colors: &[Color]) -> Result<(), PropError> {
        let colors: [Color; 4] = colors
            .try_into()
            .map_err(|_| PropError::ColorCount(colors.len()))?;
        self.colors = colors.map(Color::clamped);
        Ok(())
    }

    /// Returns every violated constraint; empty when the props are usable.
    pub fn violations(&self) -> Vec<PropError> {
        let mut errors: Vec<PropError> = Prop::ALL
            .into_iter()
            .filter_map(|p| self.number(p).map(|v| (p, v)))
            .filter_map(|(p, v)| p.check(v as f64).err())
            .collect();

        if self.colors.iter().any(|c| !c.is_finite()) {
            errors.push(PropError::TypeMismatch {
                prop: Prop::Colors.name(),
                expected: "finite color channels",
            });
        }
        errors
    }

    pub fn validate(&self) -> Result<(), Vec<PropError>> {
        let errors = self.violations();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Shader-facing snapshot of the props.
    pub fn to_params(&self) -> MeshGradientParams {
        MeshGradientParams {
            colors: self.colors,
            speed: self.speed,
            brightness: self.brightness,
            contrast: self.contrast,
            frequency: self.frequency,
            amplitude: self.amplitude,
        }
    }

    /// Parses a props document; absent fields keep their defaults.
    ///
    /// ```json
    /// { "speed": 5, "brightness": 0.7, "colors": ["#769CDF", "red", 4294901760, "hsl(200, 50%, 40%)"] }
    /// ```
    pub fn from_json(src: &str) -> Result<Self, PropError> {
        let doc: PropsDoc = serde_json::from_str(src)?;
        let mut props = Self::default();

        if let Some(colors) = doc.colors {
            let resolved = colors
                .iter()
                .map(ColorInput::resolve)
                .collect::<Result<Vec<_>, _>>()?;
            props.set_colors(&resolved)?;
        }

        let numbers = [
            (Prop::Speed, doc.speed),
            (Prop::Brightness, doc.brightness),
            (Prop::Contrast, doc.contrast),
            (Prop::Frequency, doc.frequency),
            (Prop::Amplitude, doc.amplitude),
        ];
        for (prop, value) in numbers {
            if let Some(v) = value {
                props.set_number(prop, v)?;
            }
        }

        Ok(props)
    }

    /// Reads and parses a props file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PropError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| PropError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let props = Self::from_json(&src)?;
        log::info!("loaded props from {}", path.display());
        Ok(props)
    }

    /// Serializes the props with colors as `#rrggbb` strings.
    pub fn to_json(&self) -> String {
        let doc = PropsDoc {
            colors: Some(
                self.colors
                    .iter()
                    .map(|c| ColorInput::Css(hex(*c)))
                    .collect(),
            ),
            speed: Some(self.speed as f64),
            brightness: Some(self.brightness as f64),
            contrast: Some(self.contrast as f64),
            frequency: Some(self.frequency as f64),
            amplitude: Some(self.amplitude as f64),
        };
        // A struct of strings and numbers always serializes.
        serde_json::to_string_pretty(&doc).unwrap_or_default()
    }
}

fn hex(c: Color) -> String {
    format!("#{:06x}", c.to_argb_u32() & 0x00FF_FFFF)
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PropsDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    colors: Option<Vec<ColorInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    brightness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contrast: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    amplitude: Option<f64>,
}
