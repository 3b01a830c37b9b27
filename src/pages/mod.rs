//! Screens: state that lives while a route is shown, and its view

pub mod categories;
pub mod dashboard;
pub mod editor;
pub mod list;
pub mod login;
pub mod products;

use crate::backend::types::Category;
use crate::ui::thumbnails::Thumbnails;

pub use categories::CategoriesPage;
pub use dashboard::DashboardPage;
pub use editor::{EditorMode, EditorPage, FormEdit};
pub use list::{CategoryChoice, ListView};
pub use login::LoginPage;
pub use products::{ProductModal, ProductsPage};

/// Current screen
pub enum Page {
    Login(LoginPage),
    Dashboard(DashboardPage),
    Products(ProductsPage),
    Categories(CategoriesPage),
    Editor(EditorPage),
}

/// App-wide data a view may read
#[derive(Clone, Copy)]
pub struct Ctx<'a> {
    pub thumbnails: &'a Thumbnails,
    /// Every category, for filters and the product form
    pub categories: &'a [Category],
    pub upload_enabled: bool,
}
