use std::collections::BTreeMap;

use hex_color::HexColor;
use iced::{Color, theme::Palette};
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

mod length;
mod validation;

pub use length::{CssLength, CssLengthError, LengthUnit};
pub use validation::{ConfigValidationError, is_valid_custom_element_name};

pub const DEFAULT_CONFIG_FILE_PATH: &str = "~/.config/xtag/page.toml";

pub const CLOCK_TAG: &str = "x-clock";
pub const MATH_TAG: &str = "x-math";

/// One entry of the page description: a tagged element with its attributes and
/// text content.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ElementDef {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub content: String,
}

impl ElementDef {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            attributes: BTreeMap::new(),
            content: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Looks up an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Identity of the element on the page: the explicit `id`, or the tag
    /// suffixed with the element's position.
    pub fn key(&self, index: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}-{index}", self.tag),
        }
    }
}

#[serde_as]
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct PageConfig {
    #[serde(default = "default_page_title")]
    pub title: String,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_page_width")]
    pub width: CssLength,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_page_height")]
    pub height: CssLength,
    #[serde(default = "default_page_spacing")]
    pub spacing: f32,
    #[serde(default = "default_page_padding")]
    pub padding: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: default_page_title(),
            width: default_page_width(),
            height: default_page_height(),
            spacing: default_page_spacing(),
            padding: default_page_padding(),
        }
    }
}

fn default_page_title() -> String {
    "xtag".to_string()
}

fn default_page_width() -> CssLength {
    CssLength::px(480.)
}

fn default_page_height() -> CssLength {
    CssLength::px(360.)
}

fn default_page_spacing() -> f32 {
    12.
}

fn default_page_padding() -> f32 {
    16.
}

/// Settings for the external typesetting engine used by math elements.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TypesetConfig {
    /// Shell command receiving the source on stdin and printing the rendered
    /// text on stdout. The built-in Unicode typesetter is used when unset.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default = "default_typeset_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TypesetConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_ms: default_typeset_timeout_ms(),
        }
    }
}

fn default_typeset_timeout_ms() -> u64 {
    5000
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Appearance {
    #[serde(default)]
    pub font_name: Option<String>,
    #[serde(
        deserialize_with = "scale_factor_deserializer",
        default = "default_scale_factor"
    )]
    pub scale_factor: f64,
    #[serde(default = "default_background_color")]
    pub background_color: HexColor,
    #[serde(default = "default_face_color")]
    pub face_color: HexColor,
    #[serde(default = "default_text_color")]
    pub text_color: HexColor,
    #[serde(default = "default_primary_color")]
    pub primary_color: HexColor,
    #[serde(default = "default_success_color")]
    pub success_color: HexColor,
    #[serde(default = "default_danger_color")]
    pub danger_color: HexColor,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            font_name: None,
            scale_factor: default_scale_factor(),
            background_color: default_background_color(),
            face_color: default_face_color(),
            text_color: default_text_color(),
            primary_color: default_primary_color(),
            success_color: default_success_color(),
            danger_color: default_danger_color(),
        }
    }
}

impl Appearance {
    pub fn palette(&self) -> Palette {
        Palette {
            background: to_color(self.background_color),
            text: to_color(self.text_color),
            primary: to_color(self.primary_color),
            success: to_color(self.success_color),
            danger: to_color(self.danger_color),
        }
    }

    pub fn face(&self) -> Color {
        to_color(self.face_color)
    }
}

fn to_color(color: HexColor) -> Color {
    Color::from_rgb8(color.r, color.g, color.b)
}

fn scale_factor_deserializer<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = f64::deserialize(deserializer)?;

    if v <= 0.0 {
        return Err(serde::de::Error::custom(
            "Scale factor must be greater than 0.0",
        ));
    }

    if v > 2.0 {
        return Err(serde::de::Error::custom(
            "Scale factor cannot be greater than 2.0",
        ));
    }

    Ok(v)
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_background_color() -> HexColor {
    HexColor::rgb(30, 30, 46)
}

fn default_face_color() -> HexColor {
    HexColor::rgb(49, 50, 68)
}

fn default_text_color() -> HexColor {
    HexColor::rgb(205, 214, 244)
}

fn default_primary_color() -> HexColor {
    HexColor::rgb(250, 179, 135)
}

fn default_success_color() -> HexColor {
    HexColor::rgb(166, 227, 161)
}

fn default_danger_color() -> HexColor {
    HexColor::rgb(243, 139, 168)
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub typeset: TypesetConfig,
    #[serde(default)]
    pub appearance: Appearance,
    #[serde(default, rename = "element")]
    pub elements: Vec<ElementDef>,
}

fn default_log_level() -> String {
    "warn".to_owned()
}

fn default_elements() -> Vec<ElementDef> {
    vec![
        ElementDef::new(CLOCK_TAG)
            .with_attribute("width", "200px")
            .with_attribute("height", "200px"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            page: PageConfig::default(),
            typeset: TypesetConfig::default(),
            appearance: Appearance::default(),
            elements: default_elements(),
        }
    }
}
