//! Analog clock element: three hands re-oriented from wall-clock time once per
//! second.

mod angles;
mod scaffold;
mod timer;

use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use log::debug;
use xtag_proto::config::{CssLength, ElementDef};

pub use angles::{DEGREES_PER_TICK, HOUR_HAND_OFFSET, HandAngles};
pub use scaffold::{CONTAINER_CLASS, Hand, Indicator, IndicatorRefs, NodeRef, Rotation, Scaffold};

use self::timer::TickTimer;
use super::{ElementError, ElementEvent, ElementId};
use crate::ElementContext;

/// Fixed update cadence of every clock.
pub const TICK_PERIOD: Duration = Duration::from_millis(1000);

/// Edge length used when the page leaves `width` or `height` unset.
pub const DEFAULT_SIZE_PX: f32 = 150.;

/// Dimensions of the clock's own box, taken from its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxSize {
    pub width: Option<CssLength>,
    pub height: Option<CssLength>,
}

impl BoxSize {
    /// Reads the `width` and `height` attributes.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::InvalidLength`] when either attribute is present
    /// but is not a CSS length.
    pub fn from_element(def: &ElementDef) -> Result<Self, ElementError> {
        Ok(Self {
            width: parse_length(def, "width")?,
            height: parse_length(def, "height")?,
        })
    }

    pub fn width_px(&self) -> f32 {
        self.width.map_or(DEFAULT_SIZE_PX, |width| width.to_pixels())
    }

    pub fn height_px(&self) -> f32 {
        self.height.map_or(DEFAULT_SIZE_PX, |height| height.to_pixels())
    }
}

fn parse_length(def: &ElementDef, name: &'static str) -> Result<Option<CssLength>, ElementError> {
    def.attribute(name)
        .map(|value| {
            value
                .parse::<CssLength>()
                .map_err(|source| ElementError::InvalidLength { name, source })
        })
        .transpose()
}

#[derive(Debug, Clone)]
pub enum Message {
    /// Wall-clock time captured when the timer fired.
    Tick(DateTime<Local>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Scaffold built, no time written yet and no timer running.
    Uninitialized,
    /// Hands are current and the timer is active.
    Running,
    /// Detached from the page; the timer is gone and ticks are ignored.
    Stopped,
}

#[derive(Debug)]
pub struct ClockWidget {
    id: ElementId,
    size: BoxSize,
    scaffold: Scaffold,
    indicators: IndicatorRefs,
    lifecycle: Lifecycle,
    timer: Option<TickTimer>,
}

impl ClockWidget {
    /// Applies the box size and builds the scaffold. The clock stays
    /// [`Lifecycle::Uninitialized`] until [`attach`](Self::attach) is called.
    pub fn new(id: ElementId, def: &ElementDef) -> Result<Self, ElementError> {
        let size = BoxSize::from_element(def)?;

        Self::with_scaffold(id, size, Scaffold::build())
    }

    fn with_scaffold(id: ElementId, size: BoxSize, scaffold: Scaffold) -> Result<Self, ElementError> {
        let indicators = scaffold.resolve()?;

        Ok(Self {
            id,
            size,
            scaffold,
            indicators,
            lifecycle: Lifecycle::Uninitialized,
            timer: None,
        })
    }

    /// Builds a clock and attaches it: the hands show the current time as soon as
    /// this returns, and the timer is running.
    pub fn create(id: ElementId, def: &ElementDef, ctx: &ElementContext) -> Result<Self, ElementError> {
        let mut clock = Self::new(id, def)?;
        clock.attach(ctx);

        Ok(clock)
    }

    /// Renders the current time and starts the recurring timer. Re-attaching
    /// replaces the previous timer.
    pub fn attach(&mut self, ctx: &ElementContext) {
        self.timer = None;
        self.update_clock();

        let sender = ctx.element_sender(self.id.clone(), ElementEvent::Clock);
        self.timer = Some(TickTimer::start(ctx, sender, TICK_PERIOD));
        self.lifecycle = Lifecycle::Running;

        debug!("Clock {} running", self.id);
    }

    /// Cancels the timer. Ticks already queued are ignored from now on.
    pub fn detach(&mut self) {
        if self.timer.take().is_some() {
            debug!("Clock {} stopped", self.id);
        }

        if self.lifecycle == Lifecycle::Running {
            self.lifecycle = Lifecycle::Stopped;
        }
    }

    /// Re-orients the hands from the current wall-clock time.
    pub fn update_clock(&mut self) {
        self.update_at(&Local::now());
    }

    /// Re-orients the hands for `time`. The result depends on nothing but `time`.
    pub fn update_at<T: Timelike>(&mut self, time: &T) {
        let angles = HandAngles::at(time);

        for hand in Hand::ALL {
            if let Some(indicator) = self.scaffold.get_mut(self.indicators.get(hand)) {
                indicator.set_transform(Rotation::degrees(angles.get(hand)));
            }
        }
    }

    /// Applies a timer message. Returns whether the hands were updated.
    pub fn update(&mut self, message: Message) -> bool {
        if self.lifecycle != Lifecycle::Running {
            debug!("Ignoring tick for clock {} in state {:?}", self.id, self.lifecycle);
            return false;
        }

        match message {
            Message::Tick(time) => self.update_at(&time),
        }

        true
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn size(&self) -> BoxSize {
        self.size
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn scaffold(&self) -> &Scaffold {
        &self.scaffold
    }

    pub fn indicator(&self, hand: Hand) -> Option<&Indicator> {
        self.scaffold.get(self.indicators.get(hand))
    }

    /// Angles currently written to the three hands, once all have been set.
    pub fn angles(&self) -> Option<HandAngles> {
        let angle = |hand| {
            self.indicator(hand)
                .and_then(Indicator::transform)
                .map(|rotation| rotation.as_degrees())
        };

        Some(HandAngles {
            hour: angle(Hand::Hour)?,
            minute: angle(Hand::Minute)?,
            second: angle(Hand::Second)?,
        })
    }
}
