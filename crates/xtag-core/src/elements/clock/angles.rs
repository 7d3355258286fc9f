use chrono::Timelike;

use super::scaffold::Hand;

/// Sweep of the second hand per second, and of the minute hand per minute.
pub const DEGREES_PER_TICK: f32 = 360. / 60.;

/// Constant term of the hour hand angle.
///
/// The other two hands have no such term. It pairs with an hour indicator whose
/// resting orientation points at 9 o'clock, see [`Hand::rest_angle`].
pub const HOUR_HAND_OFFSET: f32 = 90.;

/// Hand orientations in degrees, clockwise from 12 o'clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandAngles {
    pub hour: f32,
    pub minute: f32,
    pub second: f32,
}

impl HandAngles {
    /// Angles for a wall-clock time given as hour (0-23), minute and second.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Self {
        let hour = (hour % 12) as f32;
        let minute = minute as f32;
        let second = second as f32;

        Self {
            second: second * DEGREES_PER_TICK,
            minute: minute * DEGREES_PER_TICK + second / 10.,
            hour: hour / 12. * 360. + HOUR_HAND_OFFSET + minute / 12.,
        }
    }

    pub fn at<T: Timelike>(time: &T) -> Self {
        Self::from_hms(time.hour(), time.minute(), time.second())
    }

    pub fn get(&self, hand: Hand) -> f32 {
        match hand {
            Hand::Hour => self.hour,
            Hand::Minute => self.minute,
            Hand::Second => self.second,
        }
    }
}

impl Hand {
    /// Orientation of the hand's artwork before any rotation is applied, in
    /// degrees clockwise from 12 o'clock.
    pub fn rest_angle(self) -> f32 {
        match self {
            Hand::Hour => -HOUR_HAND_OFFSET,
            Hand::Minute | Hand::Second => 0.,
        }
    }
}
