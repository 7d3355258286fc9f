use iced::{
    Element, Length, Theme,
    daemon::Appearance,
    widget::{Column, container, scrollable, text},
    window::Id,
};
use xtag_core::{
    elements::ElementInstance,
    page::{ElementNode, MountedElement},
};

use super::state::{App, Message};
use crate::views::{clock::render_clock, math::render_math};

impl App {
    pub fn title(&self, _id: Id) -> String {
        self.config.page.title.clone()
    }

    pub fn theme(&self, _id: Id) -> Theme {
        Theme::custom("xtag".to_string(), self.config.appearance.palette())
    }

    pub fn style(&self, theme: &Theme) -> Appearance {
        Appearance {
            background_color: theme.palette().background,
            text_color: theme.palette().text,
            icon_color: theme.palette().text,
        }
    }

    pub fn scale_factor(&self, _id: Id) -> f64 {
        self.config.appearance.scale_factor
    }

    pub fn view(&self, _id: Id) -> Element<'_, Message> {
        let page = &self.config.page;
        let elements = self
            .page
            .elements()
            .iter()
            .map(|element| self.render_element(element));

        container(scrollable(
            Column::with_children(elements)
                .spacing(page.spacing)
                .padding(page.padding)
                .width(Length::Fill),
        ))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    fn render_element<'a>(&'a self, element: &'a MountedElement) -> Element<'a, Message> {
        match element.node() {
            ElementNode::Custom(ElementInstance::Clock(clock)) => {
                render_clock(clock, self.config.appearance.face())
            }
            ElementNode::Custom(ElementInstance::Math(math)) => render_math(math),
            ElementNode::Unknown => text(element.def().content.as_str()).into(),
            ElementNode::Broken(err) => text(format!(
                "<{}> {}: {err}",
                element.def().tag,
                element.id()
            ))
            .style(text::danger)
            .into(),
        }
    }
}
