//! Products list with search, category filter, details and delete dialogs

use std::time::Duration;

use iced::widget::{button, column, container, horizontal_space, pick_list, row, scrollable, text, Row};
use iced::{Alignment, Element, Length};

use super::list::{CategoryChoice, ListView};
use super::Ctx;
use crate::app::Message;
use crate::backend::types::{paths, Product};
use crate::forms::format_price;
use crate::query::{Mutation, QueryKey};
use crate::routes::{ListQuery, Route};
use crate::table::{CellContent, Column};
use crate::ui::{self, modal::modal, search_bar, theme::DarkTheme};

#[derive(Debug, Clone)]
pub enum ProductModal {
    Details(Product),
    Delete(Product),
}

pub struct ProductsPage {
    pub list: ListView<Product>,
    pub modal: Option<ProductModal>,
    pub delete: Mutation,
}

pub fn columns() -> Vec<Column<Product>> {
    vec![
        Column::render("Image", |p| CellContent::Image(p.thumbnail().map(str::to_string))),
        Column::value("Name", "name"),
        Column::value("Description", "description"),
        Column::formatted("Price", "price", |v, _| {
            CellContent::Text(format!("${}", format_price(v.as_f64().unwrap_or_default())))
        }),
        Column::render("Category", |p| CellContent::Text(p.category_name().to_string())),
        Column::render("Actions", |_| CellContent::Actions),
    ]
}

impl ProductsPage {
    pub fn new(query: ListQuery, delay: Duration, delete: Mutation) -> Self {
        Self {
            list: ListView::new(query, delay),
            modal: None,
            delete,
        }
    }

    pub fn key(&self) -> QueryKey {
        self.list.key(paths::PRODUCTS)
    }

    pub fn view<'a>(&'a self, ctx: Ctx<'a>) -> Element<'a, Message> {
        let options = CategoryChoice::options(ctx.categories);
        let selected = CategoryChoice::selected(&options, self.list.query.category_id.as_deref());
        let filter = pick_list(options, Some(selected), Message::CategoryFilter)
            .placeholder("All Categories")
            .width(Length::FillPortion(1));

        let toolbar = row![
            search_bar::view("Search products...", self.list.search.value(), Message::SearchChanged),
            filter,
        ]
        .spacing(12)
        .align_y(Alignment::Center);

        let body: Element<'a, Message> = if let Some(err) = &self.list.state.error {
            ui::error_banner(format!("Failed to load products: {}", err.user_message()))
        } else if self.list.state.is_loading {
            ui::loading("Loading products...")
        } else {
            let columns = columns();
            column![
                ui::table::view(&columns, self.list.items(), ctx.thumbnails, "No products found", actions),
                ui::table::pager(self.list.pagination(), Message::Paginate),
            ]
            .spacing(16)
            .into()
        };

        let page = column![
            row![
                ui::heading("Products"),
                horizontal_space(),
                button(text("Add Product"))
                    .style(button::primary)
                    .on_press(Message::Navigate(Route::NewProduct)),
            ]
            .align_y(Alignment::Center),
            toolbar,
            ui::card(scrollable(body).height(Length::Fill)),
        ]
        .spacing(20);

        match &self.modal {
            None => page.into(),
            Some(ProductModal::Details(product)) => modal(page, details(product, ctx), Message::CloseModal),
            Some(ProductModal::Delete(product)) => {
                modal(page, confirm_delete(product, self.delete.is_pending()), Message::CloseModal)
            }
        }
    }
}

fn actions(product: &Product) -> Element<'_, Message> {
    row![
        button(text("View").size(13))
            .style(button::secondary)
            .on_press(Message::ShowDetails(product.clone())),
        button(text("Edit").size(13))
            .style(button::secondary)
            .on_press(Message::Navigate(Route::EditProduct {
                slug: product.slug.clone(),
            })),
        button(text("Delete").size(13))
            .style(button::danger)
            .on_press(Message::AskDelete(product.clone())),
    ]
    .spacing(6)
    .into()
}

fn dialog<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .width(480)
        .padding(24)
        .style(ui::theme::card)
        .into()
}

fn confirm_delete(product: &Product, pending: bool) -> Element<'_, Message> {
    let confirm = button(text(if pending { "Deleting..." } else { "Delete" }))
        .style(button::danger)
        .on_press_maybe((!pending).then_some(Message::ConfirmDelete));
    let cancel = button(text("Cancel"))
        .style(button::secondary)
        .on_press_maybe((!pending).then_some(Message::CloseModal));

    dialog(
        column![
            text("Delete Product").size(20).color(DarkTheme::TEXT),
            text(format!(
                "Are you sure you want to delete \"{}\"? This action cannot be undone.",
                product.name
            ))
            .size(14)
            .color(DarkTheme::TEXT_MUTED),
            row![horizontal_space(), cancel, confirm].spacing(10),
        ]
        .spacing(16),
    )
}

fn details<'a>(product: &'a Product, ctx: Ctx<'a>) -> Element<'a, Message> {
    let detail = |label: &'a str, value: String| {
        column![
            text(label).size(12).color(DarkTheme::TEXT_MUTED),
            text(value).size(14).color(DarkTheme::TEXT),
        ]
        .spacing(2)
    };

    let images: Element<'a, Message> = if product.images.is_empty() {
        text("No images").size(13).color(DarkTheme::TEXT_MUTED).into()
    } else {
        Row::with_children(
            product
                .images
                .iter()
                .map(|url| ctx.thumbnails.view(Some(url.as_str()), 96.0)),
        )
        .spacing(8)
        .into()
    };

    dialog(
        column![
            text(&product.name).size(20).color(DarkTheme::TEXT),
            images,
            detail("Description", product.description.clone()),
            row![
                detail("Price", format!("${}", format_price(product.price))).width(Length::Fill),
                detail("Category", product.category_name().to_string()).width(Length::Fill),
            ],
            detail("Slug", product.slug.clone()),
            detail("ID", product.id.clone()),
            row![
                horizontal_space(),
                button(text("Close"))
                    .style(button::secondary)
                    .on_press(Message::CloseModal),
            ],
        ]
        .spacing(14),
    )
}
