//! Toast stack, bottom-right

use iced::alignment::{Horizontal, Vertical};
use iced::widget::{button, container, row, text, Column};
use iced::{Alignment, Background, Border, Color, Element, Length};
use uuid::Uuid;

use super::theme::DarkTheme;
use crate::notify::{Toasts, ToastVariant};

fn accent(variant: ToastVariant) -> Color {
    match variant {
        ToastVariant::Success => DarkTheme::SUCCESS,
        ToastVariant::Error => DarkTheme::DANGER,
        ToastVariant::Info => DarkTheme::PRIMARY,
        ToastVariant::Warning => DarkTheme::WARNING,
    }
}

pub fn view<'a, Message: Clone + 'a>(
    toasts: &'a Toasts,
    on_dismiss: impl Fn(Uuid) -> Message,
) -> Element<'a, Message> {
    let items = toasts.iter().map(|toast| {
        let color = accent(toast.variant);
        container(
            row![
                text(&toast.message).size(14).color(DarkTheme::TEXT).width(Length::Fill),
                button(text("×").size(14))
                    .style(button::text)
                    .on_press(on_dismiss(toast.id)),
            ]
            .spacing(8)
            .align_y(Alignment::Center),
        )
        .width(320)
        .padding(12)
        .style(move |_theme| container::Style {
            background: Some(Background::Color(DarkTheme::SURFACE)),
            border: Border {
                color,
                width: 1.0,
                radius: 8.0.into(),
            },
            ..Default::default()
        })
        .into()
    });

    container(Column::with_children(items).spacing(8))
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(20)
        .align_x(Horizontal::Right)
        .align_y(Vertical::Bottom)
        .into()
}
