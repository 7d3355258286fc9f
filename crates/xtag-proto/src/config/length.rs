use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

/// Pixels per `em`/`rem`, matching the default root font size of a page.
const FONT_SIZE_PX: f32 = 16.;

/// Pixels per point (CSS defines 1pt as 1/72in and 1px as 1/96in).
const PX_PER_PT: f32 = 96. / 72.;

static LENGTH_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?|\.\d+)\s*(px|pt|em|rem)?\s*$"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Pt,
    Em,
    Rem,
}

impl LengthUnit {
    fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Pt => "pt",
            Self::Em => "em",
            Self::Rem => "rem",
        }
    }
}

/// A non-negative CSS length as written in element attributes, e.g. `"100px"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssLength {
    value: f32,
    unit: LengthUnit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CssLengthError {
    #[error("`{input}` is not a CSS length (expected e.g. `100px`, `12pt`, `2em`)")]
    Malformed { input: String },
    #[error("length pattern failed to compile: {reason}")]
    Pattern { reason: String },
}

impl CssLength {
    pub const fn new(value: f32, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub const fn px(value: f32) -> Self {
        Self::new(value, LengthUnit::Px)
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    /// Resolves the length to logical pixels.
    pub fn to_pixels(&self) -> f32 {
        match self.unit {
            LengthUnit::Px => self.value,
            LengthUnit::Pt => self.value * PX_PER_PT,
            LengthUnit::Em | LengthUnit::Rem => self.value * FONT_SIZE_PX,
        }
    }
}

impl FromStr for CssLength {
    type Err = CssLengthError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let pattern = LENGTH_PATTERN
            .as_ref()
            .map_err(|err| CssLengthError::Pattern {
                reason: err.to_string(),
            })?;

        let malformed = || CssLengthError::Malformed {
            input: input.to_owned(),
        };

        let captures = pattern.captures(input).ok_or_else(malformed)?;
        let value = captures[1]
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(malformed)?;
        let unit = match captures.get(2).map(|unit| unit.as_str()) {
            None | Some("px") => LengthUnit::Px,
            Some("pt") => LengthUnit::Pt,
            Some("em") => LengthUnit::Em,
            Some("rem") => LengthUnit::Rem,
            Some(_) => return Err(malformed()),
        };

        Ok(Self { value, unit })
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pixel_lengths() {
        let length: CssLength = "100px".parse().expect("valid length");

        assert_eq!(length, CssLength::px(100.));
        assert_eq!(length.to_pixels(), 100.);
        assert_eq!(length.to_string(), "100px");
    }

    #[test]
    fn unitless_values_are_pixels() {
        let length: CssLength = " 42 ".parse().expect("valid length");

        assert_eq!(length.unit(), LengthUnit::Px);
        assert_eq!(length.value(), 42.);
    }

    #[test]
    fn resolves_relative_units() {
        let em: CssLength = "2em".parse().expect("valid length");
        let rem: CssLength = ".5rem".parse().expect("valid length");
        let pt: CssLength = "72pt".parse().expect("valid length");

        assert_eq!(em.to_pixels(), 32.);
        assert_eq!(rem.to_pixels(), 8.);
        assert!((pt.to_pixels() - 96.).abs() < 1e-4);
    }

    #[test]
    fn rejects_malformed_lengths() {
        let overflowing = format!("1{}px", "0".repeat(64));

        for input in [
            "",
            "px",
            "-10px",
            "10vh",
            "ten",
            "10 px px",
            "1.2.3px",
            overflowing.as_str(),
        ] {
            let result = input.parse::<CssLength>();
            assert!(
                matches!(result, Err(CssLengthError::Malformed { .. })),
                "{input:?} should be rejected, got {result:?}"
            );
        }
    }
}
