//! Analog face drawn on a canvas from the rotations a clock element holds.

use iced::{
    Color, Element, Length, Point, Rectangle, Renderer, Theme,
    mouse::Cursor,
    widget::canvas::{self, Cache, Geometry, LineCap, Path, Program, Stroke},
};
use xtag_core::elements::clock::{ClockWidget, Hand, Indicator};

use crate::app::Message;

#[derive(Debug, Clone, Copy)]
struct HandStyle {
    length: f32,
    width: f32,
}

impl HandStyle {
    fn of(hand: Hand) -> Self {
        match hand {
            Hand::Hour => Self {
                length: 0.5,
                width: 4.,
            },
            Hand::Minute => Self {
                length: 0.75,
                width: 3.,
            },
            Hand::Second => Self {
                length: 0.9,
                width: 1.5,
            },
        }
    }
}

/// Snapshot of a clock: the face colour and each hand's on-screen angle,
/// clockwise from 12 o'clock.
#[derive(Debug, Clone)]
struct ClockFace {
    face: Color,
    hands: Vec<(Hand, f32)>,
}

impl ClockFace {
    fn new(clock: &ClockWidget, face: Color) -> Self {
        let hands = Hand::ALL
            .into_iter()
            .map(|hand| {
                let rotation = clock
                    .indicator(hand)
                    .and_then(Indicator::transform)
                    .map_or(0., |rotation| rotation.as_degrees());

                (hand, hand.rest_angle() + rotation)
            })
            .collect();

        Self { face, hands }
    }
}

impl<Message> Program<Message> for ClockFace {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<Geometry> {
        let cache = Cache::new();
        let palette = theme.palette();

        vec![cache.draw(renderer, bounds.size(), |frame| {
            let center = frame.center();
            let radius = (bounds.width.min(bounds.height) / 2. - 2.).max(0.);

            frame.fill(&Path::circle(center, radius), self.face);
            frame.stroke(
                &Path::circle(center, radius),
                Stroke::default().with_width(2.).with_color(palette.text),
            );

            for mark in 0..12u8 {
                let degrees = f32::from(mark) * 30.;
                frame.stroke(
                    &Path::line(
                        hand_tip(center, radius * 0.85, degrees),
                        hand_tip(center, radius * 0.95, degrees),
                    ),
                    Stroke::default()
                        .with_width(if mark % 3 == 0 { 2.5 } else { 1. })
                        .with_color(palette.text),
                );
            }

            for &(hand, degrees) in &self.hands {
                let style = HandStyle::of(hand);
                let color = match hand {
                    Hand::Second => palette.danger,
                    Hand::Hour | Hand::Minute => palette.text,
                };

                frame.stroke(
                    &Path::line(center, hand_tip(center, radius * style.length, degrees)),
                    Stroke::default()
                        .with_width(style.width)
                        .with_color(color)
                        .with_line_cap(LineCap::Round),
                );
            }

            frame.fill(&Path::circle(center, 3.), palette.primary);
        })]
    }
}

/// Point `length` away from `center` at `degrees` clockwise from 12 o'clock.
fn hand_tip(center: Point, length: f32, degrees: f32) -> Point {
    let radians = degrees.to_radians();

    Point::new(
        center.x + length * radians.sin(),
        center.y - length * radians.cos(),
    )
}

pub fn render_clock<'a>(clock: &ClockWidget, face: Color) -> Element<'a, Message> {
    let size = clock.size();

    canvas::Canvas::new(ClockFace::new(clock, face))
        .width(Length::Fixed(size.width_px()))
        .height(Length::Fixed(size.height_px()))
        .into()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use xtag_core::elements::ElementId;
    use xtag_proto::config::ElementDef;

    use super::*;

    fn assert_close(actual: Point, expected: Point) {
        assert!(
            (actual.x - expected.x).abs() < 1e-4 && (actual.y - expected.y).abs() < 1e-4,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn hand_tip_runs_clockwise_from_twelve() {
        let center = Point::new(50., 50.);

        assert_close(hand_tip(center, 10., 0.), Point::new(50., 40.));
        assert_close(hand_tip(center, 10., 90.), Point::new(60., 50.));
        assert_close(hand_tip(center, 10., 180.), Point::new(50., 60.));
        assert_close(hand_tip(center, 10., 270.), Point::new(40., 50.));
    }

    #[test]
    fn face_points_hands_at_the_displayed_time() {
        let mut clock = ClockWidget::new(ElementId::from("c"), &ElementDef::new("x-clock"))
            .expect("valid clock");
        clock.update_at(&NaiveTime::from_hms_opt(3, 0, 15).expect("valid time"));

        let face = ClockFace::new(&clock, Color::BLACK);

        assert_eq!(
            face.hands,
            vec![(Hand::Hour, 90.), (Hand::Minute, 1.5), (Hand::Second, 90.)]
        );
    }
}
