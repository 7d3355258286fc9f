use std::fmt;

use crate::elements::ElementError;

pub const CONTAINER_CLASS: &str = "x-clock-container";

/// The three hands of the clock face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Hour,
    Minute,
    Second,
}

impl Hand {
    pub const ALL: [Hand; 3] = [Hand::Hour, Hand::Minute, Hand::Second];

    /// Class name of the sub-element that draws this hand.
    pub fn class_name(self) -> &'static str {
        match self {
            Hand::Hour => "x-clock-hour",
            Hand::Minute => "x-clock-minute",
            Hand::Second => "x-clock-second",
        }
    }
}

/// A 2D rotation around the element centre, in degrees clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation(f32);

impl Rotation {
    pub fn degrees(degrees: f32) -> Self {
        Self(degrees)
    }

    pub fn as_degrees(&self) -> f32 {
        self.0
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rotate({}deg)", self.0)
    }
}

/// One sub-element of the scaffold.
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    class_name: &'static str,
    transform: Option<Rotation>,
}

impl Indicator {
    fn new(class_name: &'static str) -> Self {
        Self {
            class_name,
            transform: None,
        }
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// The rotation last written to this sub-element, if any.
    pub fn transform(&self) -> Option<Rotation> {
        self.transform
    }

    pub(super) fn set_transform(&mut self, rotation: Rotation) {
        self.transform = Some(rotation);
    }
}

/// Handle to a child of a [`Scaffold`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef(usize);

/// References to the three hand sub-elements, resolved once after the scaffold
/// is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorRefs {
    hour: NodeRef,
    minute: NodeRef,
    second: NodeRef,
}

impl IndicatorRefs {
    pub fn get(&self, hand: Hand) -> NodeRef {
        match hand {
            Hand::Hour => self.hour,
            Hand::Minute => self.minute,
            Hand::Second => self.second,
        }
    }
}

/// Fixed internal structure of a clock: a container with one child per hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaffold {
    container_class: &'static str,
    children: Vec<Indicator>,
}

impl Scaffold {
    pub fn build() -> Self {
        Self {
            container_class: CONTAINER_CLASS,
            children: Hand::ALL
                .iter()
                .map(|hand| Indicator::new(hand.class_name()))
                .collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_children(class_names: &[&'static str]) -> Self {
        Self {
            container_class: CONTAINER_CLASS,
            children: class_names.iter().copied().map(Indicator::new).collect(),
        }
    }

    pub fn container_class(&self) -> &'static str {
        self.container_class
    }

    pub fn children(&self) -> &[Indicator] {
        &self.children
    }

    /// First child carrying `class_name`.
    pub fn query(&self, class_name: &str) -> Option<NodeRef> {
        self.children
            .iter()
            .position(|child| child.class_name == class_name)
            .map(NodeRef)
    }

    /// Looks up every hand sub-element.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::MissingSubElement`] naming the first hand whose
    /// sub-element is absent.
    pub fn resolve(&self) -> Result<IndicatorRefs, ElementError> {
        let find = |hand: Hand| {
            self.query(hand.class_name())
                .ok_or(ElementError::MissingSubElement {
                    class_name: hand.class_name(),
                })
        };

        Ok(IndicatorRefs {
            hour: find(Hand::Hour)?,
            minute: find(Hand::Minute)?,
            second: find(Hand::Second)?,
        })
    }

    pub fn get(&self, node: NodeRef) -> Option<&Indicator> {
        self.children.get(node.0)
    }

    pub(super) fn get_mut(&mut self, node: NodeRef) -> Option<&mut Indicator> {
        self.children.get_mut(node.0)
    }
}
