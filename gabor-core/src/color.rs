use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// A css color as written by the caller, together with its straight-alpha
/// RGBA value. Any css color syntax is accepted: every named color, hex,
/// `rgb`/`rgba`, `hsl`/`hsla` and `hwb`, with comma or space separated
/// arguments. An empty string means no color and is transparent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CssColor {
    text: String,
    rgba: [u8; 4],
}

impl CssColor {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let trimmed = text.trim();
        let rgba = if trimmed.is_empty() {
            [0, 0, 0, 0]
        } else {
            csscolorparser::parse(trimmed)
                .map_err(|_| ConfigError::InvalidColor(text.to_string()))?
                .to_rgba8()
        };
        Ok(Self {
            text: text.to_string(),
            rgba,
        })
    }

    pub fn transparent() -> Self {
        Self {
            text: "transparent".to_string(),
            rgba: [0, 0, 0, 0],
        }
    }

    pub fn white() -> Self {
        Self {
            text: "white".to_string(),
            rgba: [255, 255, 255, 255],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Straight (non-premultiplied) RGBA.
    pub fn rgba(&self) -> [u8; 4] {
        self.rgba
    }

    pub fn is_transparent(&self) -> bool {
        self.rgba[3] == 0
    }
}

impl TryFrom<String> for CssColor {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CssColor::parse(&value)
    }
}

impl From<CssColor> for String {
    fn from(value: CssColor) -> Self {
        value.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_hex_forms() {
        assert_eq!(CssColor::parse("White").unwrap().rgba(), [255, 255, 255, 255]);
        assert_eq!(CssColor::parse("#f00").unwrap().rgba(), [255, 0, 0, 255]);
        assert_eq!(CssColor::parse("#00ff0080").unwrap().rgba(), [0, 255, 0, 128]);
        assert!(CssColor::parse("transparent").unwrap().is_transparent());
    }

    #[test]
    fn functional_forms() {
        assert_eq!(
            CssColor::parse("rgb(10, 20, 30)").unwrap().rgba(),
            [10, 20, 30, 255]
        );
        let [r, g, b, a] = CssColor::parse("rgba(128,128,128,0.5)").unwrap().rgba();
        assert_eq!([r, g, b], [128, 128, 128]);
        assert!((127..=128).contains(&a), "alpha {a}");
    }

    #[test]
    fn full_css_color_syntax() {
        assert_eq!(CssColor::parse("navy").unwrap().rgba(), [0, 0, 128, 255]);
        assert_eq!(
            CssColor::parse("darkgray").unwrap().rgba(),
            [169, 169, 169, 255]
        );
        assert_eq!(
            CssColor::parse("rgb(10 20 30)").unwrap().rgba(),
            [10, 20, 30, 255]
        );
        for text in ["hsl(0, 0%, 50%)", "rgb(50%, 50%, 50%)"] {
            let [r, g, b, a] = CssColor::parse(text).unwrap().rgba();
            assert!((127..=128).contains(&r), "{text}: {r}");
            assert_eq!((r, a), (g, 255));
            assert_eq!(r, b);
        }
    }

    #[test]
    fn empty_text_is_no_color() {
        for text in ["", "  "] {
            let c = CssColor::parse(text).unwrap();
            assert!(c.is_transparent());
            assert_eq!(c.as_str(), text);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(CssColor::parse("not-a-color").is_err());
        assert!(CssColor::parse("#12").is_err());
    }

    #[test]
    fn keeps_the_written_text() {
        let c = CssColor::parse("#FFF").unwrap();
        assert_eq!(c.as_str(), "#FFF");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"#FFF\"");
    }
}
