//! Table and pager widgets

use iced::widget::{button, column, container, row, text, Column as Rows, Row};
use iced::{Alignment, Element, Length, Padding};
use serde::Serialize;

use super::theme::{self, DarkTheme};
use super::thumbnails::Thumbnails;
use crate::table::{rows, CellContent, Column, Pagination};

const THUMBNAIL_SIZE: f32 = 48.0;

/// Rows of `items` under a header; `actions` renders the Actions cell
pub fn view<'a, T, Message>(
    columns: &[Column<T>],
    items: &'a [T],
    thumbnails: &Thumbnails,
    empty: &'a str,
    actions: impl Fn(&'a T) -> Element<'a, Message>,
) -> Element<'a, Message>
where
    T: Serialize,
    Message: Clone + 'a,
{
    let header = Row::with_children(columns.iter().map(|c| {
        container(text(c.header).size(13).color(DarkTheme::TEXT_MUTED))
            .width(width(c.header))
            .into()
    }))
    .spacing(12)
    .padding(Padding::from([8, 12]));

    let mut body = Rows::new().spacing(4);
    if items.is_empty() {
        body = body.push(
            container(text(empty).color(DarkTheme::TEXT_MUTED))
                .center_x(Length::Fill)
                .padding(24),
        );
    }
    for (item, cells) in items.iter().zip(rows(columns, items)) {
        let cells = columns.iter().zip(cells).map(|(c, content)| {
            let cell: Element<'a, Message> = match content {
                CellContent::Text(s) => text(s).size(14).color(DarkTheme::TEXT).into(),
                CellContent::Muted(s) => text(s).size(14).color(DarkTheme::TEXT_MUTED).into(),
                CellContent::Image(url) => thumbnails.view(url.as_deref(), THUMBNAIL_SIZE),
                CellContent::Actions => actions(item),
            };
            container(cell).width(width(c.header)).into()
        });
        body = body.push(
            Row::with_children(cells)
                .spacing(12)
                .padding(Padding::from([6, 12]))
                .align_y(Alignment::Center),
        );
    }

    column![container(header).style(theme::table_header), body]
        .spacing(6)
        .into()
}

fn width(header: &str) -> Length {
    match header {
        "Image" => Length::Fixed(THUMBNAIL_SIZE + 8.0),
        "Description" => Length::FillPortion(3),
        "Actions" => Length::Fixed(220.0),
        _ => Length::FillPortion(2),
    }
}

/// "Showing X to Y of Z results" with previous/next buttons
pub fn pager<'a, Message: Clone + 'a>(
    pagination: Pagination,
    on_page: impl Fn(u32, u32) -> Message,
) -> Element<'a, Message> {
    let limit = pagination.limit;
    row![
        text(pagination.summary()).size(13).color(DarkTheme::TEXT_MUTED),
        iced::widget::horizontal_space(),
        button(text("Previous").size(13))
            .style(button::secondary)
            .on_press_maybe(pagination.previous_offset().map(|o| on_page(o, limit))),
        text(pagination.page_label()).size(13).color(DarkTheme::TEXT),
        button(text("Next").size(13))
            .style(button::secondary)
            .on_press_maybe(pagination.next_offset().map(|o| on_page(o, limit))),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}
