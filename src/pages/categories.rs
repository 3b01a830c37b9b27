//! Categories list

use std::time::Duration;

use iced::widget::{column, row, scrollable, Space};
use iced::{Element, Length};

use super::list::ListView;
use super::Ctx;
use crate::app::Message;
use crate::backend::types::{paths, Category};
use crate::query::QueryKey;
use crate::routes::ListQuery;
use crate::table::{plain, CellContent, Column};
use crate::ui::{self, search_bar};

pub struct CategoriesPage {
    pub list: ListView<Category>,
}

pub fn columns() -> Vec<Column<Category>> {
    vec![
        Column::render("Image", |c| CellContent::Image(c.image.clone())),
        Column::value("Name", "name"),
        Column::formatted("Description", "description", |v, _| {
            let description = plain(v);
            if description.trim().is_empty() {
                CellContent::Muted("No description".to_string())
            } else {
                CellContent::Text(description)
            }
        }),
    ]
}

impl CategoriesPage {
    pub fn new(query: ListQuery, delay: Duration) -> Self {
        Self {
            list: ListView::new(query, delay),
        }
    }

    pub fn key(&self) -> QueryKey {
        self.list.key(paths::CATEGORIES)
    }

    pub fn view<'a>(&'a self, ctx: Ctx<'a>) -> Element<'a, Message> {
        let body: Element<'a, Message> = if let Some(err) = &self.list.state.error {
            ui::error_banner(format!("Failed to load categories: {}", err.user_message()))
        } else if self.list.state.is_loading {
            ui::loading("Loading categories...")
        } else {
            let columns = columns();
            column![
                ui::table::view(&columns, self.list.items(), ctx.thumbnails, "No categories found", |_| {
                    Space::with_width(0).into()
                }),
                ui::table::pager(self.list.pagination(), Message::Paginate),
            ]
            .spacing(16)
            .into()
        };

        column![
            ui::heading("Categories"),
            row![
                search_bar::view("Search categories...", self.list.search.value(), Message::SearchChanged),
                Space::with_width(Length::FillPortion(1)),
            ]
            .spacing(12),
            ui::card(scrollable(body).height(Length::Fill)),
        ]
        .spacing(20)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::rows;

    #[test]
    fn test_missing_description() {
        let items = vec![
            Category {
                id: "c1".into(),
                name: "Shoes".into(),
                description: Some("Footwear".into()),
                image: Some("https://img/shoes.png".into()),
            },
            Category {
                id: "c2".into(),
                name: "Hats".into(),
                description: None,
                image: None,
            },
        ];
        let rows = rows(&columns(), &items);
        assert_eq!(rows[0][2], CellContent::Text("Footwear".into()));
        assert_eq!(rows[1][0], CellContent::Image(None));
        assert_eq!(rows[1][2], CellContent::Muted("No description".into()));
    }
}
