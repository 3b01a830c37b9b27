//! Create and edit product screens

use iced::widget::{button, column, container, horizontal_space, pick_list, row, scrollable, text, text_input, Column};
use iced::{Alignment, Element, Length};
use serde_json::json;

use super::list::CategoryChoice;
use super::Ctx;
use crate::app::Message;
use crate::backend::types::{paths, Product};
use crate::forms::{Field, FieldErrors, ProductForm};
use crate::query::{Mutation, MutationRequest, QueryKey, QueryState};
use crate::ui::{self, theme::DarkTheme};
use crate::upload::public_id_from_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    New,
    Edit { slug: String },
}

/// One field changed in the product form
#[derive(Debug, Clone)]
pub enum FormEdit {
    Name(String),
    Description(String),
    Price(String),
    Category(CategoryChoice),
}

pub struct EditorPage {
    pub mode: EditorMode,
    /// Product being edited; unused when creating
    pub product: QueryState<Product>,
    pub form: ProductForm,
    pub errors: FieldErrors,
    pub upload_path: String,
    pub uploading: bool,
    pub save: Mutation,
    prefilled: bool,
}

impl EditorPage {
    pub fn new(mode: EditorMode, save: Mutation) -> Self {
        let product = match mode {
            EditorMode::New => QueryState::default(),
            EditorMode::Edit { .. } => QueryState::loading(),
        };
        Self {
            mode,
            product,
            form: ProductForm::default(),
            errors: FieldErrors::default(),
            upload_path: String::new(),
            uploading: false,
            save,
            prefilled: false,
        }
    }

    /// `products/{slug}` in edit mode
    pub fn key(&self) -> Option<QueryKey> {
        match &self.mode {
            EditorMode::New => None,
            EditorMode::Edit { slug } => Some(QueryKey::path(paths::product(slug))),
        }
    }

    /// Store the fetched product; the form is filled from the first copy
    /// only, so a refetch does not discard edits
    pub fn set_product(&mut self, state: QueryState<Product>) {
        if !self.prefilled {
            if let Some(product) = &state.data {
                self.form = ProductForm::from_product(product);
                self.prefilled = true;
            }
        }
        self.product = state;
    }

    pub fn edit(&mut self, edit: FormEdit) {
        match edit {
            FormEdit::Name(name) => {
                self.form.name = name;
                self.errors.remove(Field::Name);
            }
            FormEdit::Description(description) => {
                self.form.description = description;
                self.errors.remove(Field::Description);
            }
            FormEdit::Price(price) => {
                self.form.price = price;
                self.errors.remove(Field::Price);
            }
            FormEdit::Category(choice) => {
                self.form.category_id = choice.id.unwrap_or_default();
                self.errors.remove(Field::Category);
            }
        }
    }

    /// Validate and build the write; validation messages are kept on the page
    pub fn submit(&mut self) -> Option<MutationRequest> {
        let payload = match self.form.validate() {
            Ok(payload) => payload,
            Err(errors) => {
                self.errors = errors;
                return None;
            }
        };
        self.errors = FieldErrors::default();
        let body = json!(payload);
        match &self.mode {
            EditorMode::New => Some(MutationRequest::create(paths::PRODUCTS, body)),
            EditorMode::Edit { .. } => {
                let id = &self.product.data.as_ref()?.id;
                Some(MutationRequest::replace(paths::product(id), body))
            }
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self.mode {
            EditorMode::New => "Product created successfully",
            EditorMode::Edit { .. } => "Product updated successfully",
        }
    }

    pub fn view<'a>(&'a self, ctx: Ctx<'a>) -> Element<'a, Message> {
        let back = button(text("← Back to Products"))
            .style(button::text)
            .on_press(Message::ShowProducts);

        if let EditorMode::Edit { .. } = self.mode {
            if self.product.is_loading {
                return column![back, ui::loading("Loading product...")].spacing(12).into();
            }
            if self.product.data.is_none() {
                return column![
                    back,
                    container(text("Product not found").size(24).color(DarkTheme::TEXT))
                        .center_x(Length::Fill)
                        .padding(40),
                ]
                .spacing(12)
                .into();
            }
        }

        let (title, subtitle, submit_label) = match (&self.mode, &self.product.data) {
            (EditorMode::Edit { .. }, Some(product)) => (
                "Edit Product",
                format!("Update product information for {}", product.name),
                "Update Product",
            ),
            _ => (
                "Create New Product",
                "Add a new product to your inventory".to_string(),
                "Create Product",
            ),
        };

        let busy = self.save.is_pending();
        let input = |placeholder: &str, value: &str, on_input: fn(String) -> FormEdit| {
            let input = text_input(placeholder, value).padding(10);
            if busy {
                input
            } else {
                input.on_input(move |s| Message::Form(on_input(s)))
            }
        };

        let options: Vec<CategoryChoice> = CategoryChoice::options(ctx.categories).into_iter().skip(1).collect();
        let selected = options
            .iter()
            .find(|c| c.id.as_deref() == Some(self.form.category_id.as_str()))
            .cloned();
        let category = pick_list(options, selected, |c| Message::Form(FormEdit::Category(c)))
            .placeholder("Select a category")
            .width(Length::Fill);

        let submit = button(text(if busy { "Submitting..." } else { submit_label }))
            .style(button::primary)
            .padding(10)
            .on_press_maybe((!busy && !self.uploading).then_some(Message::SaveProduct));

        let form = column![
            ui::field("Product Images", self.images(ctx, busy), self.errors.get(Field::Images)),
            ui::field(
                "Product Name",
                input("Enter product name", &self.form.name, FormEdit::Name),
                self.errors.get(Field::Name),
            ),
            ui::field(
                "Price",
                input("0.00", &self.form.price, FormEdit::Price),
                self.errors.get(Field::Price),
            ),
            ui::field("Category", category, self.errors.get(Field::Category)),
            ui::field(
                "Description",
                input("Enter product description", &self.form.description, FormEdit::Description),
                self.errors.get(Field::Description),
            ),
            submit,
        ]
        .spacing(18);

        scrollable(
            column![
                back,
                ui::heading(title),
                text(subtitle).size(14).color(DarkTheme::TEXT_MUTED),
                ui::card(form),
            ]
            .spacing(12)
            .max_width(720),
        )
        .into()
    }

    fn images<'a>(&'a self, ctx: Ctx<'a>, busy: bool) -> Element<'a, Message> {
        let thumbnails = self.form.images.iter().enumerate().map(|(i, url)| {
            column![
                ctx.thumbnails.view(Some(url.as_str()), 96.0),
                text(image_label(url)).size(11).color(DarkTheme::TEXT_MUTED),
                button(text("Remove").size(12))
                    .style(button::danger)
                    .on_press_maybe((!busy).then_some(Message::RemoveImage(i))),
            ]
            .spacing(4)
            .align_x(Alignment::Center)
            .into()
        });
        let gallery = iced::widget::Row::with_children(thumbnails).spacing(10);

        let uploader: Element<'a, Message> = if ctx.upload_enabled {
            let path = text_input("Path to an image file", &self.upload_path).padding(8);
            let path = if self.uploading || busy {
                path
            } else {
                path.on_input(Message::UploadPathChanged)
                    .on_submit(Message::UploadImage)
            };
            let ready = !self.uploading && !busy && !self.upload_path.trim().is_empty();
            row![
                path,
                button(text(if self.uploading { "Uploading..." } else { "Upload Image" }))
                    .style(button::secondary)
                    .on_press_maybe(ready.then_some(Message::UploadImage)),
            ]
            .spacing(8)
            .into()
        } else {
            text("Image upload is not configured")
                .size(13)
                .color(DarkTheme::TEXT_MUTED)
                .into()
        };

        Column::new()
            .push_maybe((!self.form.images.is_empty()).then_some(gallery))
            .push(row![uploader, horizontal_space()].width(Length::Fill))
            .spacing(10)
            .into()
    }
}

/// Caption under an attached image: its hosted public id when it has one
fn image_label(url: &str) -> String {
    public_id_from_url(url).unwrap_or_else(|| "External image".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::Category;
    use crate::backend::WriteMethod;
    use crate::query::{MutationOptions, QueryClient};
    use std::sync::Arc;

    fn page(mode: EditorMode) -> EditorPage {
        let client = QueryClient::new(Arc::new(crate::backend::ApiClient::new(
            "http://127.0.0.1:1/",
            crate::backend::Session::in_memory(),
        )
        .unwrap()));
        EditorPage::new(mode, Mutation::new(client, MutationOptions::new()))
    }

    fn product() -> Product {
        Product {
            id: "p7".into(),
            name: "Runner".into(),
            description: "Light shoe".into(),
            price: 49.5,
            slug: "runner".into(),
            images: vec!["https://img/runner.png".into()],
            category: Some(Category {
                id: "c1".into(),
                name: "Shoes".into(),
                description: None,
                image: None,
            }),
        }
    }

    #[test]
    fn test_new_product_request() {
        let mut page = page(EditorMode::New);
        assert_eq!(page.key(), None);
        assert!(page.submit().is_none());
        assert_eq!(page.errors.get(Field::Name), Some("Product name is required"));
        assert_eq!(page.errors.get(Field::Category), Some("Category is required"));

        page.edit(FormEdit::Name("Boot".into()));
        assert_eq!(page.errors.get(Field::Name), None);
        page.edit(FormEdit::Description("Warm".into()));
        page.edit(FormEdit::Price("20".into()));
        page.edit(FormEdit::Category(CategoryChoice {
            id: Some("c1".into()),
            name: "Shoes".into(),
        }));

        let request = page.submit().unwrap();
        assert_eq!(request.method, WriteMethod::Post);
        assert_eq!(request.path, "products");
        let body = request.body.unwrap();
        assert_eq!(body["categoryId"], "c1");
        assert_eq!(body["price"], 20.0);
        assert!(page.errors.is_empty());
    }

    #[test]
    fn test_edit_prefills_once_and_puts_by_id() {
        let mut page = page(EditorMode::Edit { slug: "runner".into() });
        assert_eq!(page.key(), Some(QueryKey::path("products/runner")));
        assert!(page.submit().is_none());

        let loaded = QueryState {
            data: Some(product()),
            is_success: true,
            ..QueryState::default()
        };
        page.set_product(loaded.clone());
        assert_eq!(page.form.price, "49.50");

        page.edit(FormEdit::Name("Runner II".into()));
        page.set_product(loaded);
        assert_eq!(page.form.name, "Runner II");

        let request = page.submit().unwrap();
        assert_eq!(request.method, WriteMethod::Put);
        assert_eq!(request.path, "products/p7");
        assert_eq!(page.success_message(), "Product updated successfully");
    }

    #[test]
    fn test_image_label() {
        assert_eq!(
            image_label("https://res.cloudinary.com/demo/image/upload/v1712/catalog/shoe.jpg"),
            "catalog/shoe"
        );
        assert_eq!(image_label("https://example.com/shoe"), "External image");
    }
}
