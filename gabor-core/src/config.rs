use crate::{BlendMode, Choices, ConfigError, CssColor};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STIMULUS_SIZE: u32 = 200;
pub const DEFAULT_STIMULUS_DENSITY: f32 = 5.0;
pub const DEFAULT_ANIMATION_FPS: f32 = 60.0;
pub const DEFAULT_NOISE_FRAME_COUNT: usize = 100;
pub const DEFAULT_NOISE_FPS: f32 = 12.0;
pub const DEFAULT_FIXATION_SIZE: f32 = 30.0;
pub const DEFAULT_FIXATION_WEIGHT: f32 = 5.0;

// ---------------------------------------------------------------------------
// Provided (partial) configuration, as written by the experimenter
// ---------------------------------------------------------------------------

/// A possibly incomplete configuration. Every field is optional; a field that
/// is present is honored as-is, including `0`, `false` and empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stimulus: Option<ProvidedStimulus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<ProvidedAperture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<ProvidedBackground>,
    /// Presence alone switches the cross on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixation_cross: Option<ProvidedFixationCross>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Choices>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<ProvidedTiming>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedStimulus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_offset: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<String>,
}

/// Negative values are the legacy "unset" sentinel and behave like an
/// omitted field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedAperture {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f32>,
}

/// Untyped background object; which fields matter depends on `type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedBackground {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(alias = "imageSrc", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedFixationCross {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedTiming {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stimulus_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_ends_trial: Option<bool>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved, immutable configuration of one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusConfig {
    pub stimulus: StimulusParams,
    pub aperture: Aperture,
    pub background: Background,
    pub fixation_cross: FixationCross,
    pub choices: Choices,
    pub timing: Timing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StimulusParams {
    /// Edge length of the square stimulus area in pixels.
    pub size: u32,
    /// Spatial frequency multiplier of the sinusoid.
    pub density: f32,
    /// Degrees, added to the sine argument.
    pub phase_offset: f32,
    pub opacity: f32,
    /// Extra alpha factor applied on top of `opacity`.
    pub visibility: f32,
    /// Degrees, clockwise about the stimulus center.
    pub rotation: f32,
    pub blend_mode: BlendMode,
}

impl StimulusParams {
    pub fn effective_alpha(&self) -> f32 {
        self.opacity * self.visibility
    }
}

/// A negative `radius` or `blur` is the legacy "unset" value. It is kept
/// as written and resolved against the rendered size when the mask is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Aperture {
    pub radius: f32,
    /// Standard deviation of the gaussian edge, in pixels.
    pub blur: f32,
}

impl Aperture {
    pub fn default_for(size: u32) -> Self {
        Self {
            radius: size as f32 / 4.0,
            blur: size as f32 / 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Animation { frames: Vec<String>, fps: f32 },
    CssColor { color: CssColor },
    Image { source: String },
    Noise { frame_count: usize, fps: f32 },
}

impl Default for Background {
    fn default() -> Self {
        Background::CssColor {
            color: CssColor::transparent(),
        }
    }
}

impl Background {
    pub fn tag(&self) -> &'static str {
        match self {
            Background::Animation { .. } => "animation",
            Background::CssColor { .. } => "css-color",
            Background::Image { .. } => "image",
            Background::Noise { .. } => "noise",
        }
    }

    /// Rate of the frame pacer, if this background cycles frames.
    pub fn fps(&self) -> Option<f32> {
        match self {
            Background::Animation { fps, .. } | Background::Noise { fps, .. } => Some(*fps),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixationCross {
    pub display: bool,
    pub size: f32,
    pub weight: f32,
    pub color: CssColor,
}

impl Default for FixationCross {
    fn default() -> Self {
        Self {
            display: false,
            size: DEFAULT_FIXATION_SIZE,
            weight: DEFAULT_FIXATION_WEIGHT,
            color: CssColor::white(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    /// 0 keeps the stimulus visible until the trial ends.
    pub stimulus_duration_ms: u64,
    /// 0 never ends the trial on a timer.
    pub trial_duration_ms: u64,
    pub response_ends_trial: bool,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            stimulus_duration_ms: 0,
            trial_duration_ms: 0,
            response_ends_trial: true,
        }
    }
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            stimulus: StimulusParams {
                size: DEFAULT_STIMULUS_SIZE,
                density: DEFAULT_STIMULUS_DENSITY,
                phase_offset: 0.0,
                opacity: 1.0,
                visibility: 1.0,
                rotation: 0.0,
                blend_mode: BlendMode::Normal,
            },
            aperture: Aperture::default_for(DEFAULT_STIMULUS_SIZE),
            background: Background::default(),
            fixation_cross: FixationCross::default(),
            choices: Choices::default(),
            timing: Timing::default(),
        }
    }
}

impl StimulusConfig {
    /// A trial showing nothing but the fixation cross for `duration_ms`,
    /// accepting no keys.
    pub fn fixation_only(
        stimulus_size: u32,
        cross: ProvidedFixationCross,
        duration_ms: u64,
    ) -> Result<Self, ConfigError> {
        resolve(&ProvidedConfig {
            stimulus: Some(ProvidedStimulus {
                size: Some(stimulus_size),
                opacity: Some(0.0),
                ..Default::default()
            }),
            fixation_cross: Some(cross),
            choices: Some(Choices::none()),
            timing: Some(ProvidedTiming {
                trial_duration: Some(duration_ms),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    /// The fully-specified partial config that resolves back to `self`.
    pub fn to_provided(&self) -> ProvidedConfig {
        let s = &self.stimulus;
        let background = match &self.background {
            Background::Animation { frames, fps } => ProvidedBackground {
                kind: Some("animation".into()),
                frames: Some(frames.clone()),
                fps: Some(*fps),
                ..Default::default()
            },
            Background::CssColor { color } => ProvidedBackground {
                kind: Some("css-color".into()),
                color: Some(color.as_str().to_string()),
                ..Default::default()
            },
            Background::Image { source } => ProvidedBackground {
                kind: Some("image".into()),
                source: Some(source.clone()),
                ..Default::default()
            },
            Background::Noise { frame_count, fps } => ProvidedBackground {
                kind: Some("noise".into()),
                frame_count: Some(*frame_count),
                fps: Some(*fps),
                ..Default::default()
            },
        };
        let cross = &self.fixation_cross;

        ProvidedConfig {
            stimulus: Some(ProvidedStimulus {
                size: Some(s.size),
                density: Some(s.density),
                phase_offset: Some(s.phase_offset),
                opacity: Some(s.opacity),
                visibility: Some(s.visibility),
                rotation: Some(s.rotation),
                blend_mode: Some(s.blend_mode.as_str().to_string()),
            }),
            aperture: Some(ProvidedAperture {
                radius: Some(self.aperture.radius),
                blur: Some(self.aperture.blur),
            }),
            background: Some(background),
            fixation_cross: cross.display.then(|| ProvidedFixationCross {
                size: Some(cross.size),
                weight: Some(cross.weight),
                color: Some(cross.color.as_str().to_string()),
            }),
            choices: Some(self.choices.clone()),
            timing: Some(ProvidedTiming {
                stimulus_duration: Some(self.timing.stimulus_duration_ms),
                trial_duration: Some(self.timing.trial_duration_ms),
                response_ends_trial: Some(self.timing.response_ends_trial),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Fills every omitted field with its default and validates the result.
/// Pure; the same input always yields the same output.
pub fn resolve(provided: &ProvidedConfig) -> Result<StimulusConfig, ConfigError> {
    let defaults = StimulusConfig::default();

    let stimulus = resolve_stimulus(provided.stimulus.as_ref(), defaults.stimulus)?;
    let aperture = resolve_aperture(provided.aperture.as_ref(), stimulus.size)?;
    let background = resolve_background(provided.background.as_ref())?;
    let fixation_cross = resolve_fixation(provided.fixation_cross.as_ref())?;
    let choices = provided.choices.clone().unwrap_or(defaults.choices);
    let timing = resolve_timing(provided.timing.as_ref());

    if choices.is_empty() && timing.response_ends_trial && timing.trial_duration_ms == 0 {
        return Err(ConfigError::NeverEnds);
    }

    Ok(StimulusConfig {
        stimulus,
        aperture,
        background,
        fixation_cross,
        choices,
        timing,
    })
}

fn resolve_stimulus(
    provided: Option<&ProvidedStimulus>,
    defaults: StimulusParams,
) -> Result<StimulusParams, ConfigError> {
    let Some(p) = provided else {
        return Ok(defaults);
    };

    let size = p.size.unwrap_or(defaults.size);
    if size == 0 {
        return Err(ConfigError::InvalidStimulus {
            field: "size",
            expected: "greater than 0",
            value: 0.0,
        });
    }
    let density = p.density.unwrap_or(defaults.density);
    if !(density.is_finite() && density > 0.0) {
        return Err(ConfigError::InvalidStimulus {
            field: "density",
            expected: "a positive number",
            value: density,
        });
    }
    let phase_offset = finite("phaseOffset", p.phase_offset.unwrap_or(defaults.phase_offset))?;
    let rotation = finite("rotation", p.rotation.unwrap_or(defaults.rotation))?;
    let opacity = unit_interval("opacity", p.opacity.unwrap_or(defaults.opacity))?;
    let visibility = unit_interval("visibility", p.visibility.unwrap_or(defaults.visibility))?;
    let blend_mode = match p.blend_mode.as_deref().map(str::trim) {
        Some("") | None => defaults.blend_mode,
        Some(mode) => mode.parse()?,
    };

    Ok(StimulusParams {
        size,
        density,
        phase_offset,
        opacity,
        visibility,
        rotation,
        blend_mode,
    })
}

fn finite(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidStimulus {
            field,
            expected: "a finite number",
            value,
        })
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidStimulus {
            field,
            expected: "between 0 and 1",
            value,
        })
    }
}

fn resolve_aperture(provided: Option<&ProvidedAperture>, size: u32) -> Result<Aperture, ConfigError> {
    let defaults = Aperture::default_for(size);
    let pick = |field: &'static str, value: Option<f32>, default: f32| match value {
        Some(v) if v.is_nan() || v.is_infinite() => {
            Err(ConfigError::InvalidAperture { field, value: v })
        }
        Some(v) => Ok(v),
        None => Ok(default),
    };
    let provided = provided.cloned().unwrap_or_default();

    Ok(Aperture {
        radius: pick("radius", provided.radius, defaults.radius)?,
        blur: pick("blur", provided.blur, defaults.blur)?,
    })
}

fn resolve_background(provided: Option<&ProvidedBackground>) -> Result<Background, ConfigError> {
    let Some(p) = provided else {
        return Ok(Background::default());
    };
    let Some(kind) = p.kind.as_deref() else {
        return Ok(Background::default());
    };

    match kind {
        "animation" => {
            let frames = p.frames.clone().ok_or(ConfigError::MissingField {
                background: "animation",
                field: "frames",
            })?;
            if frames.is_empty() {
                return Err(ConfigError::EmptyFrames("animation"));
            }
            let fps = positive_fps(p.fps.unwrap_or(DEFAULT_ANIMATION_FPS))?;
            Ok(Background::Animation { frames, fps })
        }
        "css-color" => {
            let color = match &p.color {
                Some(text) => CssColor::parse(text)?,
                None => CssColor::transparent(),
            };
            Ok(Background::CssColor { color })
        }
        "image" => {
            let source = p.source.clone().ok_or(ConfigError::MissingField {
                background: "image",
                field: "source",
            })?;
            Ok(Background::Image { source })
        }
        "noise" => {
            let frame_count = p.frame_count.unwrap_or(DEFAULT_NOISE_FRAME_COUNT);
            if frame_count == 0 {
                return Err(ConfigError::EmptyFrames("noise"));
            }
            let fps = positive_fps(p.fps.unwrap_or(DEFAULT_NOISE_FPS))?;
            Ok(Background::Noise { frame_count, fps })
        }
        other => Err(ConfigError::UnknownBackground(other.to_string())),
    }
}

fn positive_fps(fps: f32) -> Result<f32, ConfigError> {
    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(ConfigError::InvalidFps(fps))
    }
}

fn resolve_fixation(provided: Option<&ProvidedFixationCross>) -> Result<FixationCross, ConfigError> {
    let defaults = FixationCross::default();
    let Some(p) = provided else {
        return Ok(defaults);
    };
    let positive = |field: &'static str, value: Option<f32>, default: f32| {
        let v = value.unwrap_or(default);
        if v.is_finite() && v > 0.0 {
            Ok(v)
        } else {
            Err(ConfigError::InvalidFixation { field, value: v })
        }
    };

    Ok(FixationCross {
        display: true,
        size: positive("size", p.size, defaults.size)?,
        weight: positive("weight", p.weight, defaults.weight)?,
        color: match &p.color {
            Some(text) => CssColor::parse(text)?,
            None => defaults.color,
        },
    })
}

fn resolve_timing(provided: Option<&ProvidedTiming>) -> Timing {
    let defaults = Timing::default();
    let Some(p) = provided else {
        return defaults;
    };
    Timing {
        stimulus_duration_ms: p.stimulus_duration.unwrap_or(defaults.stimulus_duration_ms),
        trial_duration_ms: p.trial_duration.unwrap_or(defaults.trial_duration_ms),
        response_ends_trial: p.response_ends_trial.unwrap_or(defaults.response_ends_trial),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_json(json: &str) -> ProvidedConfig {
        serde_json::from_str(json).expect("valid provided config")
    }

    #[test]
    fn empty_config_resolves_to_documented_defaults() {
        let config = resolve(&ProvidedConfig::default()).unwrap();
        assert_eq!(config.stimulus.size, 200);
        assert_eq!(config.stimulus.density, 5.0);
        assert_eq!(config.stimulus.blend_mode, BlendMode::Normal);
        assert_eq!(config.aperture, Aperture { radius: 50.0, blur: 25.0 });
        assert_eq!(config.background.tag(), "css-color");
        assert!(!config.fixation_cross.display);
        assert!(config.choices.accepts(" "));
        assert_eq!(config.timing, Timing::default());
    }

    #[test]
    fn aperture_tracks_stimulus_size() {
        let config = resolve(&from_json(r#"{"stimulus":{"size":400}}"#)).unwrap();
        assert_eq!(config.aperture.radius, 100.0);
        assert_eq!(config.aperture.blur, 50.0);

        let config = resolve(&from_json(
            r#"{"stimulus":{"size":400},"aperture":{"radius":70}}"#,
        ))
        .unwrap();
        assert_eq!(config.aperture.radius, 70.0);
        assert_eq!(config.aperture.blur, 50.0);
    }

    #[test]
    fn legacy_sentinel_is_kept_for_the_mask() {
        let json = r#"{"stimulus":{"size":320},"aperture":{"radius":-1,"blur":-1}}"#;
        let config = resolve(&from_json(json)).unwrap();
        assert_eq!(config.aperture, Aperture { radius: -1.0, blur: -1.0 });
        assert_eq!(resolve(&config.to_provided()).unwrap(), config);
    }

    #[test]
    fn explicit_falsy_values_are_honored() {
        let config = resolve(&from_json(
            r#"{
                "stimulus": {"phaseOffset": 0, "opacity": 0, "rotation": 0},
                "aperture": {"radius": 0, "blur": 0},
                "background": {"type": "css-color", "color": "transparent"},
                "timing": {"stimulusDuration": 0, "trialDuration": 500, "responseEndsTrial": false}
            }"#,
        ))
        .unwrap();
        assert_eq!(config.stimulus.opacity, 0.0);
        assert_eq!(config.aperture, Aperture { radius: 0.0, blur: 0.0 });
        assert!(!config.timing.response_ends_trial);
        assert_eq!(config.timing.trial_duration_ms, 500);
    }

    #[test]
    fn fixation_presence_toggles_display() {
        let config = resolve(&from_json(r#"{"fixationCross":{}}"#)).unwrap();
        assert!(config.fixation_cross.display);
        assert_eq!(config.fixation_cross.size, 30.0);
        assert_eq!(config.fixation_cross.weight, 5.0);
        assert_eq!(config.fixation_cross.color, CssColor::white());
    }

    #[test]
    fn background_variants() {
        let image = resolve(&from_json(r#"{"background":{"type":"image","source":"x.png"}}"#))
            .unwrap();
        assert_eq!(
            image.background,
            Background::Image {
                source: "x.png".into()
            }
        );

        let legacy = resolve(&from_json(r#"{"background":{"type":"image","imageSrc":"y.png"}}"#))
            .unwrap();
        assert_eq!(legacy.background, Background::Image { source: "y.png".into() });

        let animation = resolve(&from_json(
            r#"{"background":{"type":"animation","frames":["a","b"]}}"#,
        ))
        .unwrap();
        assert_eq!(animation.background.fps(), Some(60.0));

        let color = resolve(&from_json(r#"{"background":{"type":"css-color"}}"#)).unwrap();
        assert_eq!(color.background, Background::default());

        let noise = resolve(&from_json(r#"{"background":{"type":"noise"}}"#)).unwrap();
        assert_eq!(
            noise.background,
            Background::Noise {
                frame_count: 100,
                fps: 12.0
            }
        );
    }

    #[test]
    fn rejects_malformed_backgrounds() {
        assert_eq!(
            resolve(&from_json(r#"{"background":{"type":"video"}}"#)),
            Err(ConfigError::UnknownBackground("video".into()))
        );
        assert_eq!(
            resolve(&from_json(r#"{"background":{"type":"image"}}"#)),
            Err(ConfigError::MissingField {
                background: "image",
                field: "source"
            })
        );
        assert_eq!(
            resolve(&from_json(r#"{"background":{"type":"animation","frames":[]}}"#)),
            Err(ConfigError::EmptyFrames("animation"))
        );
        assert!(matches!(
            resolve(&from_json(
                r#"{"background":{"type":"animation","frames":["a"],"fps":0}}"#
            )),
            Err(ConfigError::InvalidFps(_))
        ));
    }

    #[test]
    fn any_css_color_is_accepted() {
        for text in ["navy", "darkgray", "hsl(0, 0%, 50%)", "rgb(50%, 50%, 50%)", "rgb(10 20 30)"] {
            let json = format!(r#"{{"background":{{"type":"css-color","color":"{text}"}}}}"#);
            let config = resolve(&from_json(&json)).unwrap();
            let Background::CssColor { color } = &config.background else {
                panic!("{text} resolved to {:?}", config.background);
            };
            assert_eq!(color.as_str(), text);
            assert_eq!(color.rgba()[3], 255);

            let json = format!(r#"{{"fixationCross":{{"color":"{text}"}}}}"#);
            assert!(resolve(&from_json(&json)).is_ok(), "{text}");
        }

        let empty = resolve(&from_json(r#"{"background":{"type":"css-color","color":""}}"#))
            .unwrap();
        assert!(matches!(
            &empty.background,
            Background::CssColor { color } if color.is_transparent()
        ));
    }

    #[test]
    fn empty_blend_mode_is_normal() {
        for text in ["", "   "] {
            let json = format!(r#"{{"stimulus":{{"blendMode":"{text}"}}}}"#);
            let config = resolve(&from_json(&json)).unwrap();
            assert_eq!(config.stimulus.blend_mode, BlendMode::Normal);
        }
    }

    #[test]
    fn rejects_a_trial_that_could_never_end() {
        assert_eq!(
            resolve(&from_json(r#"{"choices":"NO_KEYS"}"#)),
            Err(ConfigError::NeverEnds)
        );
        assert!(resolve(&from_json(r#"{"choices":[],"timing":{"trialDuration":1000}}"#)).is_ok());
    }

    #[test]
    fn rejects_out_of_range_stimulus_values() {
        assert!(resolve(&from_json(r#"{"stimulus":{"size":0}}"#)).is_err());
        assert!(resolve(&from_json(r#"{"stimulus":{"density":0}}"#)).is_err());
        assert!(resolve(&from_json(r#"{"stimulus":{"opacity":1.5}}"#)).is_err());
        assert!(resolve(&from_json(r#"{"stimulus":{"blendMode":"glitter"}}"#)).is_err());
        assert!(resolve(&from_json(r#"{"fixationCross":{"color":"nope"}}"#)).is_err());
    }

    #[test]
    fn resolve_is_idempotent() {
        let inputs = [
            "{}",
            r#"{"stimulus":{"size":400,"density":2.5,"phaseOffset":90}}"#,
            r##"{"aperture":{"blur":3},"fixationCross":{"color":"#ff0000"}}"##,
            r#"{"background":{"type":"animation","frames":["a","b","c"],"fps":7}}"#,
            r#"{"background":{"type":"noise","frameCount":12}}"#,
            r#"{"choices":["f","j"],"timing":{"stimulusDuration":100,"responseEndsTrial":false}}"#,
        ];
        for json in inputs {
            let once = resolve(&from_json(json)).unwrap();
            let twice = resolve(&once.to_provided()).unwrap();
            assert_eq!(once, twice, "not idempotent for {json}");
        }
    }

    #[test]
    fn provided_form_survives_json() {
        let config = resolve(&from_json(
            r#"{"background":{"type":"animation","frames":["a","b"]},"fixationCross":{}}"#,
        ))
        .unwrap();
        let json = serde_json::to_string(&config.to_provided()).unwrap();
        let back = resolve(&from_json(&json)).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn fixation_only_trial() {
        let config = StimulusConfig::fixation_only(300, ProvidedFixationCross::default(), 500)
            .unwrap();
        assert_eq!(config.stimulus.opacity, 0.0);
        assert!(config.fixation_cross.display);
        assert!(config.choices.is_empty());
        assert_eq!(config.timing.trial_duration_ms, 500);
        assert!(StimulusConfig::fixation_only(300, ProvidedFixationCross::default(), 0).is_err());
    }
}
