//! Math element view: source while pending, engine output once typeset.

use iced::{
    Element, Length, Theme,
    widget::{container, text},
};
use xtag_core::elements::math::{MathState, MathWidget};
use xtag_proto::ports::typeset::MathMode;

use crate::app::Message;

const DISPLAY_TEXT_SIZE: f32 = 22.;

fn pending(theme: &Theme) -> text::Style {
    text::Style {
        color: Some(theme.palette().text.scale_alpha(0.5)),
    }
}

pub fn render_math(math: &MathWidget) -> Element<'_, Message> {
    let content = match math.state() {
        MathState::Pending => text(math.source().trim()).style(pending),
        MathState::Rendered(output) => text(output.rendered.as_str()),
        MathState::Failed(err) => text(format!("{}: {err}", math.source().trim())).style(text::danger),
    };

    match math.mode() {
        MathMode::Display => container(content.size(DISPLAY_TEXT_SIZE))
            .center_x(Length::Fill)
            .into(),
        MathMode::Inline => content.into(),
    }
}
