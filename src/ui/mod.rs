//! UI components

pub mod modal;
pub mod search_bar;
pub mod table;
pub mod theme;
pub mod thumbnails;
pub mod toast;

use iced::widget::{column, container, text, Space};
use iced::{Element, Length};

use theme::DarkTheme;

pub fn heading<'a, Message: 'a>(title: &'a str) -> Element<'a, Message> {
    text(title).size(24).color(DarkTheme::TEXT).into()
}

pub fn card<'a, Message: 'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .padding(20)
        .width(Length::Fill)
        .style(theme::card)
        .into()
}

/// Form field: label, input, and the validation message under it
pub fn field<'a, Message: 'a>(
    label: &'a str,
    input: impl Into<Element<'a, Message>>,
    error: Option<&'a str>,
) -> Element<'a, Message> {
    let error: Element<'a, Message> = match error {
        Some(message) => text(message).size(12).color(DarkTheme::DANGER).into(),
        None => Space::with_height(0).into(),
    };
    column![text(label).size(13).color(DarkTheme::TEXT_MUTED), input.into(), error]
        .spacing(6)
        .into()
}

pub fn error_banner<'a, Message: 'a>(message: String) -> Element<'a, Message> {
    container(text(message).size(14).color(DarkTheme::TEXT))
        .padding(12)
        .width(Length::Fill)
        .style(theme::banner)
        .into()
}

pub fn loading<'a, Message: 'a>(label: &'a str) -> Element<'a, Message> {
    container(text(label).color(DarkTheme::TEXT_MUTED))
        .center_x(Length::Fill)
        .padding(32)
        .into()
}
