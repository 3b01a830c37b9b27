//! Summary counts and quick actions

use iced::widget::{button, column, row, text};
use iced::{Element, Length};

use crate::app::Message;
use crate::backend::types::{paths, Category, ListPage, Product};
use crate::query::{QueryKey, QueryState};
use crate::routes::Route;
use crate::ui::{self, theme::DarkTheme};

pub struct DashboardPage {
    pub products: QueryState<ListPage<Product>>,
    pub categories: QueryState<ListPage<Category>>,
}

impl DashboardPage {
    pub fn new() -> Self {
        Self {
            products: QueryState::loading(),
            categories: QueryState::loading(),
        }
    }

    /// Unfiltered lists whose lengths are the totals
    pub fn products_key() -> QueryKey {
        QueryKey::path(paths::PRODUCTS)
    }

    pub fn categories_key() -> QueryKey {
        QueryKey::path(paths::CATEGORIES)
    }

    pub fn view(&self) -> Element<'_, Message> {
        let stats = row![
            stat("Total Products", &self.products, "Active products in inventory"),
            stat("Total Categories", &self.categories, "Product categories available"),
        ]
        .spacing(20);

        let add = button(
            column![
                text("Add New Product").size(16).color(DarkTheme::TEXT),
                text("Create a new product listing").size(13).color(DarkTheme::TEXT_MUTED),
            ]
            .spacing(4),
        )
        .width(Length::Fill)
        .padding(16)
        .style(button::secondary)
        .on_press(Message::Navigate(Route::NewProduct));

        column![
            ui::heading("Dashboard"),
            text("Manage your inventory and product categories efficiently")
                .size(14)
                .color(DarkTheme::TEXT_MUTED),
            stats,
            text("Quick Actions").size(18).color(DarkTheme::TEXT),
            row![add].width(Length::Fill),
        ]
        .spacing(20)
        .into()
    }
}

impl Default for DashboardPage {
    fn default() -> Self {
        Self::new()
    }
}

/// Count shown on the dashboard; the reported total wins over the page size
pub fn count<T>(state: &QueryState<ListPage<T>>) -> Option<u64> {
    state
        .data
        .as_ref()
        .map(|page| page.total.unwrap_or(page.items.len() as u64))
}

fn stat<'a, T>(title: &'a str, state: &QueryState<ListPage<T>>, description: &'a str) -> Element<'a, Message> {
    let value = match (count(state), &state.error) {
        (Some(n), _) => n.to_string(),
        (None, Some(_)) => "-".to_string(),
        (None, None) => "...".to_string(),
    };
    ui::card(
        column![
            text(title).size(13).color(DarkTheme::TEXT_MUTED),
            text(value).size(30).color(DarkTheme::TEXT),
            text(description).size(12).color(DarkTheme::TEXT_MUTED),
        ]
        .spacing(6),
    )
}
