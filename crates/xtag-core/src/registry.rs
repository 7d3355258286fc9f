//! Tag-to-constructor table consulted when a page instantiates its elements.

use std::{collections::BTreeMap, sync::OnceLock};

use log::debug;
use thiserror::Error;
use xtag_proto::config::{CLOCK_TAG, ElementDef, MATH_TAG, is_valid_custom_element_name};

use crate::{
    ElementContext,
    elements::{ClockWidget, ElementError, ElementId, ElementInstance, MathWidget},
};

/// Builds and attaches an element instance for a page entry.
pub type ElementConstructor =
    fn(ElementId, &ElementDef, &ElementContext) -> Result<ElementInstance, ElementError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{tag}` is not a valid custom element name")]
    InvalidName { tag: String },
    #[error("`{tag}` is already defined")]
    AlreadyDefined { tag: String },
}

#[derive(Debug, Clone, Default)]
pub struct ElementRegistry {
    definitions: BTreeMap<String, ElementConstructor>,
}

static GLOBAL: OnceLock<ElementRegistry> = OnceLock::new();

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry defining `x-clock` and `x-math`.
    pub fn with_builtins() -> Self {
        let mut definitions = BTreeMap::new();
        definitions.insert(CLOCK_TAG.to_owned(), construct_clock as ElementConstructor);
        definitions.insert(MATH_TAG.to_owned(), construct_math as ElementConstructor);

        Self { definitions }
    }

    /// Process-wide registry holding the built-in elements. Initialized on first
    /// use and immutable afterwards.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            debug!("Defining built-in elements");
            Self::with_builtins()
        })
    }

    /// Associates `tag` with `constructor`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidName`] when `tag` is not a valid custom
    /// element name and [`RegistryError::AlreadyDefined`] when the tag is taken.
    pub fn define(
        &mut self,
        tag: impl Into<String>,
        constructor: ElementConstructor,
    ) -> Result<(), RegistryError> {
        let tag = tag.into();

        if !is_valid_custom_element_name(&tag) {
            return Err(RegistryError::InvalidName { tag });
        }

        if self.definitions.contains_key(&tag) {
            return Err(RegistryError::AlreadyDefined { tag });
        }

        debug!("Defining <{tag}>");
        self.definitions.insert(tag, constructor);

        Ok(())
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Runs the constructor registered for `def.tag`. Returns `None` for
    /// undefined tags.
    pub fn construct(
        &self,
        id: ElementId,
        def: &ElementDef,
        ctx: &ElementContext,
    ) -> Option<Result<ElementInstance, ElementError>> {
        self.definitions
            .get(&def.tag)
            .map(|constructor| constructor(id, def, ctx))
    }
}

fn construct_clock(
    id: ElementId,
    def: &ElementDef,
    ctx: &ElementContext,
) -> Result<ElementInstance, ElementError> {
    ClockWidget::create(id, def, ctx).map(ElementInstance::Clock)
}

fn construct_math(
    id: ElementId,
    def: &ElementDef,
    ctx: &ElementContext,
) -> Result<ElementInstance, ElementError> {
    Ok(ElementInstance::Math(MathWidget::create(id, def, ctx)))
}
