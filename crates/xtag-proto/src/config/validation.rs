use std::collections::HashSet;

use super::Config;

/// Hyphenated names HTML reserves for built-in elements.
const RESERVED_NAMES: [&str; 8] = [
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Errors returned when validating a [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Two elements resolve to the same identity on the page.
    DuplicateElementId { id: String },

    /// An element uses a tag that is not a valid custom element name.
    InvalidTagName { index: usize, tag: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateElementId { id } => {
                write!(f, "duplicate element id '{}'", id)
            }
            Self::InvalidTagName { index, tag } => {
                write!(
                    f,
                    "element #{} uses '{}', which is not a valid custom element name",
                    index, tag
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Checks a tag against the custom element naming rules: lowercase ASCII
/// start, at least one hyphen, restricted alphabet, not reserved.
pub fn is_valid_custom_element_name(tag: &str) -> bool {
    let mut chars = tag.chars();

    let Some(first) = chars.next() else {
        return false;
    };

    first.is_ascii_lowercase()
        && tag.contains('-')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_'))
        && !RESERVED_NAMES.contains(&tag)
}

impl Config {
    /// Validates the configuration, ensuring element definitions are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] if an element tag is not a valid
    /// custom element name or if two elements share the same identity.
    ///
    /// # Examples
    ///
    /// ```
    /// use xtag_proto::config::Config;
    ///
    /// let config = Config::default();
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let mut seen_ids = HashSet::new();

        for (index, element) in self.elements.iter().enumerate() {
            if !is_valid_custom_element_name(&element.tag) {
                return Err(ConfigValidationError::InvalidTagName {
                    index,
                    tag: element.tag.clone(),
                });
            }

            let id = element.key(index);
            if !seen_ids.insert(id.clone()) {
                return Err(ConfigValidationError::DuplicateElementId { id });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{super::ElementDef, *};

    fn config_with(elements: Vec<ElementDef>) -> Config {
        Config {
            elements,
            ..Config::default()
        }
    }

    #[test]
    fn validate_accepts_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_explicit_ids() {
        let config = config_with(vec![
            ElementDef::new("x-clock").with_id("main"),
            ElementDef::new("x-math").with_id("main"),
        ]);

        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::DuplicateElementId {
                id: "main".to_owned()
            })
        );
    }

    #[test]
    fn validate_rejects_explicit_id_shadowing_generated_one() {
        let config = config_with(vec![
            ElementDef::new("x-clock"),
            ElementDef::new("x-clock").with_id("x-clock-0"),
        ]);

        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::DuplicateElementId { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_tag_names() {
        let config = config_with(vec![ElementDef::new("clock")]);

        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidTagName {
                index: 0,
                tag: "clock".to_owned()
            })
        );
    }

    #[test]
    fn custom_element_name_rules() {
        assert!(is_valid_custom_element_name("x-clock"));
        assert!(is_valid_custom_element_name("my-widget.v2_beta"));
        assert!(!is_valid_custom_element_name("X-clock"));
        assert!(!is_valid_custom_element_name("1-clock"));
        assert!(!is_valid_custom_element_name("clock"));
        assert!(!is_valid_custom_element_name("x-Clock"));
        assert!(!is_valid_custom_element_name("font-face"));
        assert!(!is_valid_custom_element_name(""));
    }
}
