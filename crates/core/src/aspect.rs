//! Output aspect ratios and the render resolution each one maps to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Supported output aspect ratios.
///
/// Serialized as the conventional `W:H` string (`"9:16"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    /// Vertical short-form video (1080x1920).
    #[default]
    Portrait,
    /// Horizontal video (1920x1080).
    Landscape,
    /// Square video (1080x1080).
    Square,
    /// Feed-friendly vertical video (1080x1350).
    Feed,
}

/// Pixel dimensions of a rendered cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "9:16",
            Self::Landscape => "16:9",
            Self::Square => "1:1",
            Self::Feed => "4:5",
        }
    }

    /// Render resolution used when composing the final cut.
    pub fn resolution(self) -> Resolution {
        let (width, height) = match self {
            Self::Portrait => (1080, 1920),
            Self::Landscape => (1920, 1080),
            Self::Square => (1080, 1080),
            Self::Feed => (1080, 1350),
        };
        Resolution { width, height }
    }
}

impl FromStr for AspectRatio {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "9:16" => Ok(Self::Portrait),
            "16:9" => Ok(Self::Landscape),
            "1:1" => Ok(Self::Square),
            "4:5" => Ok(Self::Feed),
            other => Err(CoreError::Validation(format!(
                "unsupported aspect ratio '{other}' (expected 9:16, 16:9, 1:1 or 4:5)"
            ))),
        }
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_is_vertical() {
        assert_eq!(AspectRatio::default(), AspectRatio::Portrait);
        assert_eq!(
            AspectRatio::default().resolution(),
            Resolution { width: 1080, height: 1920 }
        );
    }

    #[test]
    fn parses_known_ratios() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape);
        assert_eq!(" 1:1 ".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert_eq!("4:5".parse::<AspectRatio>().unwrap().resolution().height, 1350);
    }

    #[test]
    fn rejects_unknown_ratio() {
        assert_matches!("21:9".parse::<AspectRatio>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn serde_uses_ratio_string() {
        let json = serde_json::to_string(&AspectRatio::Landscape).unwrap();
        assert_eq!(json, "\"16:9\"");
        let back: AspectRatio = serde_json::from_str("\"9:16\"").unwrap();
        assert_eq!(back, AspectRatio::Portrait);
        assert!(serde_json::from_str::<AspectRatio>("\"3:2\"").is_err());
    }
}
