//! Core application state and Iced Application implementation
//!
//! Every screen is a function of the current [`Route`]. Navigation rebuilds
//! the page from the route, seeds it from the read cache, and issues the
//! reads it needs; responses come back as [`Message::Loaded`] tagged with
//! their cache identity and are dropped when the page no longer shows it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use iced::keyboard::{self, key::Named, Key, Modifiers};
use iced::widget::{button, column, container, image, row, stack, text, Space};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::backend::types::{paths, Category, ListPage, LoginResponse, Product};
use crate::backend::{ApiClient, Session};
use crate::config::Config;
use crate::debounce::{Debounce, Ticket};
use crate::forms::{Field, FieldErrors};
use crate::notify::{Toast, Toasts};
use crate::pages::{
    CategoriesPage, CategoryChoice, Ctx, DashboardPage, EditorMode, EditorPage, FormEdit, LoginPage, Page,
    ProductModal, ProductsPage,
};
use crate::query::{Callbacks, Mutation, MutationOptions, MutationOutcome, MutationRequest, QueryClient, QueryKey, QueryState};
use crate::routes::{guard, History, ListQuery, Route};
use crate::ui::{self, theme::{self, DarkTheme}, thumbnails::Thumbnails};
use crate::upload::{UploadError, Uploader};

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone)]
pub enum Message {
    // Navigation
    Navigate(Route),
    ShowDashboard,
    ShowProducts,
    ShowCategories,
    Back,
    Forward,
    SessionChanged(Option<String>),
    Logout,

    // Reads
    Loaded(QueryKey, QueryState<Value>),
    ThumbnailLoaded(String, Option<image::Handle>),

    // Lists
    SearchChanged(String),
    SearchSettled(Ticket),
    CategoryFilter(CategoryChoice),
    Paginate(u32, u32),
    ShowDetails(Product),
    AskDelete(Product),
    CloseModal,
    ConfirmDelete,
    Deleted(MutationOutcome),

    // Login
    EmailChanged(String),
    SubmitLogin,
    LoggedIn(MutationOutcome),

    // Product editor
    Form(FormEdit),
    UploadPathChanged(String),
    UploadImage,
    ImageUploaded(Result<String, UploadError>),
    RemoveImage(usize),
    SaveProduct,
    Saved(MutationOutcome, &'static str),

    // Toasts
    Tick,
    DismissToast(Uuid),
}

// ============================================================================
// Application State
// ============================================================================

pub struct Stockroom {
    config: Config,
    session: Session,
    queries: QueryClient,
    uploader: Uploader,
    history: History,
    page: Page,
    /// Every category, for the products filter and the product form
    categories: QueryState<ListPage<Category>>,
    thumbnails: Thumbnails,
    toasts: Toasts,
}

impl Stockroom {
    pub fn new(config: Config, api: ApiClient, start: Route) -> (Self, Task<Message>) {
        let session = api.session().clone();
        let queries = QueryClient::new(Arc::new(api))
            .with_defaults(config.query_options())
            .with_gc_time(config.gc_time());
        let start = guard(start, session.is_authenticated());

        let mut app = Self {
            uploader: Uploader::new(config.upload.clone()),
            config,
            session,
            queries,
            history: History::new(start),
            page: Page::Dashboard(DashboardPage::new()),
            categories: QueryState::default(),
            thumbnails: Thumbnails::new(),
            toasts: Toasts::default(),
        };
        let task = app.enter();
        (app, task)
    }

    pub fn route(&self) -> &Route {
        self.history.current()
    }

    pub fn title(&self) -> String {
        format!("Stockroom - {}", self.route().title())
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Navigate(route) => self.navigate(route),
            Message::ShowDashboard => self.navigate(Route::Dashboard),
            Message::ShowProducts => self.navigate(Route::Products(self.first_page())),
            Message::ShowCategories => self.navigate(Route::Categories(self.first_page())),
            Message::Back => {
                if self.history.back().is_some() {
                    self.reenter()
                } else {
                    Task::none()
                }
            }
            Message::Forward => {
                if self.history.forward().is_some() {
                    self.reenter()
                } else {
                    Task::none()
                }
            }
            Message::SessionChanged(token) => {
                let on_login = matches!(self.route(), Route::Login);
                match token {
                    None if !on_login => {
                        tracing::info!("Signed out, returning to login");
                        self.queries.clear();
                        self.navigate(Route::Login)
                    }
                    Some(_) if on_login => self.navigate(Route::Dashboard),
                    _ => Task::none(),
                }
            }
            Message::Logout => {
                self.session.clear();
                self.queries.clear();
                self.navigate(Route::Login)
            }

            Message::Loaded(key, state) => self.loaded(key, state),
            Message::ThumbnailLoaded(url, handle) => {
                self.thumbnails.loaded(url, handle);
                Task::none()
            }

            Message::SearchChanged(value) => {
                let search = match &mut self.page {
                    Page::Products(page) => &mut page.list.search,
                    Page::Categories(page) => &mut page.list.search,
                    _ => return Task::none(),
                };
                let ticket = search.set(value);
                Task::perform(Debounce::wait(search.delay(), ticket), Message::SearchSettled)
            }
            Message::SearchSettled(ticket) => {
                let reset = self.config.reset_offset_on_search;
                let next = match &mut self.page {
                    Page::Products(page) => page
                        .list
                        .search
                        .settle(ticket)
                        .map(|keyword| Route::Products(page.list.query.with_search(keyword, reset))),
                    Page::Categories(page) => page
                        .list
                        .search
                        .settle(ticket)
                        .map(|keyword| Route::Categories(page.list.query.with_search(keyword, reset))),
                    _ => None,
                };
                match next {
                    Some(route) if route != *self.route() => self.navigate(route),
                    _ => Task::none(),
                }
            }
            Message::CategoryFilter(choice) => match self.route() {
                Route::Products(query) => {
                    let route = Route::Products(query.with_category(choice.id));
                    self.navigate(route)
                }
                _ => Task::none(),
            },
            Message::Paginate(offset, limit) => match self.route().list_query() {
                Some(query) => {
                    let route = self.route().with_list_query(query.with_page(offset, limit));
                    self.navigate(route)
                }
                None => Task::none(),
            },
            Message::ShowDetails(product) => {
                if let Page::Products(page) = &mut self.page {
                    page.modal = Some(ProductModal::Details(product));
                }
                self.request_thumbnails()
            }
            Message::AskDelete(product) => {
                if let Page::Products(page) = &mut self.page {
                    page.modal = Some(ProductModal::Delete(product));
                }
                Task::none()
            }
            Message::CloseModal => {
                if let Page::Products(page) = &mut self.page {
                    if !page.delete.is_pending() {
                        page.modal = None;
                    }
                }
                Task::none()
            }
            Message::ConfirmDelete => {
                let Page::Products(page) = &self.page else {
                    return Task::none();
                };
                match &page.modal {
                    Some(ProductModal::Delete(product)) if !page.delete.is_pending() => {
                        tracing::info!("Deleting product {} ({})", product.name, product.id);
                        let request = MutationRequest::delete(paths::product(&product.id));
                        Task::perform(page.delete.mutate(request, Callbacks::default()), Message::Deleted)
                    }
                    _ => Task::none(),
                }
            }
            Message::Deleted(outcome) => {
                match &outcome.result {
                    Ok(_) => {
                        self.toasts.push(Toast::success("Product deleted successfully"));
                        if let Page::Products(page) = &mut self.page {
                            page.modal = None;
                        }
                    }
                    Err(err) => self.toasts.push(Toast::error(err.user_message())),
                }
                self.refresh()
            }

            Message::EmailChanged(email) => {
                if let Page::Login(page) = &mut self.page {
                    page.form.email = email;
                    page.errors.remove(Field::Email);
                }
                Task::none()
            }
            Message::SubmitLogin => {
                let Page::Login(page) = &mut self.page else {
                    return Task::none();
                };
                if page.submit.is_pending() {
                    return Task::none();
                }
                let request = match page.form.validate() {
                    Ok(request) => request,
                    Err(errors) => {
                        page.errors = errors;
                        return Task::none();
                    }
                };
                page.errors = FieldErrors::default();

                let session = self.session.clone();
                let callbacks = Callbacks::default().on_success(move |body| {
                    let response: LoginResponse = serde_json::from_value(body.clone())?;
                    session.sign_in(&response.token)?;
                    Ok(())
                });
                let request = MutationRequest::create(paths::AUTH, json!(request));
                Task::perform(page.submit.mutate(request, callbacks), Message::LoggedIn)
            }
            Message::LoggedIn(outcome) => match outcome.result {
                Ok(_) if self.session.is_authenticated() => {
                    self.toasts.push(Toast::success("Logged in successfully"));
                    if matches!(self.route(), Route::Login) {
                        self.navigate(Route::Dashboard)
                    } else {
                        Task::none()
                    }
                }
                Ok(_) => {
                    self.toasts.push(Toast::error("Sign-in response did not include a token"));
                    Task::none()
                }
                Err(err) => {
                    self.toasts.push(Toast::error(err.user_message()));
                    Task::none()
                }
            },

            Message::Form(edit) => {
                if let Page::Editor(page) = &mut self.page {
                    page.edit(edit);
                }
                Task::none()
            }
            Message::UploadPathChanged(path) => {
                if let Page::Editor(page) = &mut self.page {
                    page.upload_path = path;
                }
                Task::none()
            }
            Message::UploadImage => {
                let Page::Editor(page) = &mut self.page else {
                    return Task::none();
                };
                let path = PathBuf::from(page.upload_path.trim());
                if page.uploading || path.as_os_str().is_empty() {
                    return Task::none();
                }
                page.uploading = true;
                let uploader = self.uploader.clone();
                Task::perform(async move { uploader.upload(&path).await }, Message::ImageUploaded)
            }
            Message::ImageUploaded(result) => {
                let Page::Editor(page) = &mut self.page else {
                    return Task::none();
                };
                page.uploading = false;
                match result {
                    Ok(url) => {
                        page.form.add_image(url);
                        page.upload_path.clear();
                        page.errors.remove(Field::Images);
                        self.request_thumbnails()
                    }
                    Err(err) => {
                        tracing::warn!("Image upload failed: {}", err);
                        page.errors.insert(Field::Images, err.to_string());
                        self.toasts.push(Toast::error(err.to_string()));
                        Task::none()
                    }
                }
            }
            Message::RemoveImage(index) => {
                if let Page::Editor(page) = &mut self.page {
                    page.form.remove_image(index);
                }
                Task::none()
            }
            Message::SaveProduct => {
                let Page::Editor(page) = &mut self.page else {
                    return Task::none();
                };
                if page.save.is_pending() {
                    return Task::none();
                }
                let Some(request) = page.submit() else {
                    return Task::none();
                };
                let message = page.success_message();
                Task::perform(page.save.mutate(request, Callbacks::default()), move |outcome| {
                    Message::Saved(outcome, message)
                })
            }
            Message::Saved(outcome, message) => match &outcome.result {
                Ok(_) => {
                    self.toasts.push(Toast::success(message));
                    if matches!(self.page, Page::Editor(_)) {
                        self.navigate(Route::Products(self.first_page()))
                    } else {
                        self.refresh()
                    }
                }
                Err(err) => {
                    self.toasts.push(Toast::error(err.user_message()));
                    Task::none()
                }
            },

            Message::Tick => {
                self.toasts.prune(Instant::now());
                Task::none()
            }
            Message::DismissToast(id) => {
                self.toasts.dismiss(id);
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let ctx = Ctx {
            thumbnails: &self.thumbnails,
            categories: self
                .categories
                .data
                .as_ref()
                .map(|page| page.items.as_slice())
                .unwrap_or_default(),
            upload_enabled: self.uploader.is_configured(),
        };

        let content: Element<'_, Message> = match &self.page {
            Page::Login(page) => page.view(),
            Page::Dashboard(page) => self.shell(page.view()),
            Page::Products(page) => self.shell(page.view(ctx)),
            Page::Categories(page) => self.shell(page.view(ctx)),
            Page::Editor(page) => self.shell(page.view(ctx)),
        };

        let base = container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(theme::app_background);

        stack![base, ui::toast::view(&self.toasts, Message::DismissToast)].into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let session = Subscription::run_with_id(
            "session",
            WatchStream::new(self.session.subscribe()).map(Message::SessionChanged),
        );
        let keys = keyboard::on_key_press(shortcut);

        let mut subscriptions = vec![session, keys];
        if !self.toasts.is_empty() {
            subscriptions.push(iced::time::every(Duration::from_millis(250)).map(|_| Message::Tick));
        }
        Subscription::batch(subscriptions)
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Sidebar and header around a signed-in screen
    fn shell<'a>(&'a self, content: Element<'a, Message>) -> Element<'a, Message> {
        let route = self.route();
        let nav = |label: &'a str, active: bool, message: Message| {
            button(text(label).size(14))
                .width(Length::Fill)
                .padding(10)
                .style(if active { button::primary } else { button::text })
                .on_press(message)
        };

        let sidebar = container(
            column![
                text("Product Management").size(18).color(DarkTheme::TEXT),
                Space::with_height(16),
                nav("Dashboard", matches!(route, Route::Dashboard), Message::ShowDashboard),
                nav(
                    "Products",
                    matches!(route, Route::Products(_) | Route::NewProduct | Route::EditProduct { .. }),
                    Message::ShowProducts,
                ),
                nav("Categories", matches!(route, Route::Categories(_)), Message::ShowCategories),
                Space::with_height(Length::Fill),
                nav("Log out", false, Message::Logout),
            ]
            .spacing(4),
        )
        .width(220)
        .height(Length::Fill)
        .padding(16)
        .style(theme::sidebar);

        let header = row![
            button(text("←"))
                .style(button::text)
                .on_press_maybe(self.history.can_go_back().then_some(Message::Back)),
            button(text("→"))
                .style(button::text)
                .on_press_maybe(self.history.can_go_forward().then_some(Message::Forward)),
            text(route.to_string()).size(13).color(DarkTheme::TEXT_MUTED),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        row![
            sidebar,
            column![header, container(content).height(Length::Fill)]
                .spacing(16)
                .padding(24)
                .width(Length::Fill),
        ]
        .into()
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    fn first_page(&self) -> ListQuery {
        ListQuery {
            limit: self.config.page_size,
            ..ListQuery::default()
        }
    }

    fn navigate(&mut self, route: Route) -> Task<Message> {
        let target = guard(route.clone(), self.session.is_authenticated());
        if target != route {
            tracing::info!("Redirecting {} to {}", route, target);
        }
        self.history.push(target);
        self.enter()
    }

    /// Show the history entry the cursor moved to, redirecting if the
    /// signed-in state no longer allows it
    fn reenter(&mut self) -> Task<Message> {
        let current = self.route().clone();
        let target = guard(current.clone(), self.session.is_authenticated());
        if target != current {
            self.history.replace(target);
        }
        self.enter()
    }

    /// Build the page for the current route and start its reads
    fn enter(&mut self) -> Task<Message> {
        let route = self.route().clone();
        tracing::info!("Showing {}", route);
        let delay = self.config.search_debounce();

        let previous = std::mem::replace(&mut self.page, Page::Dashboard(DashboardPage::new()));
        let typed = match previous {
            Page::Products(page) if matches!(route, Route::Products(_)) => Some(page.list.search),
            Page::Categories(page) if matches!(route, Route::Categories(_)) => Some(page.list.search),
            _ => None,
        };

        self.page = match route {
            Route::Login => Page::Login(LoginPage::new(self.mutation(MutationOptions::new().quiet()))),
            Route::Dashboard => {
                let mut page = DashboardPage::new();
                page.products = self.cached(&DashboardPage::products_key());
                page.categories = self.cached(&DashboardPage::categories_key());
                Page::Dashboard(page)
            }
            Route::Products(query) => {
                let delete = self.mutation(MutationOptions::new().invalidate(paths::PRODUCTS).quiet());
                let mut page = ProductsPage::new(query, delay, delete);
                if let Some(search) = typed {
                    page.list.carry_search(search);
                }
                page.list.state = self.cached(&page.key());
                Page::Products(page)
            }
            Route::Categories(query) => {
                let mut page = CategoriesPage::new(query, delay);
                if let Some(search) = typed {
                    page.list.carry_search(search);
                }
                page.list.state = self.cached(&page.key());
                Page::Categories(page)
            }
            Route::NewProduct => self.editor(EditorMode::New),
            Route::EditProduct { slug } => self.editor(EditorMode::Edit { slug }),
        };

        Task::batch([self.refresh(), self.request_thumbnails()])
    }

    fn editor(&self, mode: EditorMode) -> Page {
        let save = self.mutation(MutationOptions::new().invalidate(paths::PRODUCTS).quiet());
        let mut page = EditorPage::new(mode, save);
        if let Some(key) = page.key() {
            page.set_product(self.cached(&key));
        }
        Page::Editor(page)
    }

    // ========================================================================
    // Data
    // ========================================================================

    fn mutation(&self, options: MutationOptions) -> Mutation {
        Mutation::new(self.queries.clone(), options)
    }

    /// Cached state of `key`, marked as fetching when a read will follow
    fn cached<T: DeserializeOwned>(&self, key: &QueryKey) -> QueryState<T> {
        let mut state = self.queries.snapshot(key);
        if self.queries.is_stale(key, self.queries.defaults()) {
            state.is_fetching = true;
            state.is_loading = state.data.is_none();
            state.error = None;
        }
        state.decode()
    }

    fn load(&self, key: QueryKey) -> Task<Message> {
        let queries = self.queries.clone();
        Task::perform(
            async move {
                let state = queries.fetch_default(key.clone()).await;
                (key, state)
            },
            |(key, state)| Message::Loaded(key, state),
        )
    }

    /// Reads the current page depends on; fresh ones resolve from the cache
    fn refresh(&self) -> Task<Message> {
        let all_categories = DashboardPage::categories_key();
        let keys = match &self.page {
            Page::Login(_) => vec![],
            Page::Dashboard(_) => vec![DashboardPage::products_key(), all_categories],
            Page::Products(page) => vec![page.key(), all_categories],
            Page::Categories(page) => vec![page.key()],
            Page::Editor(page) => page.key().into_iter().chain([all_categories]).collect(),
        };
        Task::batch(keys.into_iter().map(|key| self.load(key)))
    }

    fn loaded(&mut self, key: QueryKey, state: QueryState<Value>) -> Task<Message> {
        let all_categories = DashboardPage::categories_key();
        if key == all_categories {
            self.categories = state.clone().decode();
        }

        let shown = match &mut self.page {
            Page::Dashboard(page) if key == DashboardPage::products_key() => {
                page.products = state.decode();
                true
            }
            Page::Dashboard(page) if key == all_categories => {
                page.categories = state.decode();
                true
            }
            Page::Products(page) if key == page.key() => {
                page.list.state = state.decode();
                true
            }
            Page::Categories(page) if key == page.key() => {
                page.list.state = state.decode();
                true
            }
            Page::Editor(page) if page.key().as_ref() == Some(&key) => {
                page.set_product(state.decode());
                true
            }
            _ => key == all_categories,
        };
        if !shown {
            tracing::debug!("Dropping response for {} (no longer shown)", key);
        }
        self.request_thumbnails()
    }

    /// Fetch images the current page shows and nobody asked for yet,
    /// forgetting the ones it no longer shows
    fn request_thumbnails(&mut self) -> Task<Message> {
        let urls: Vec<String> = match &self.page {
            Page::Products(page) => {
                let mut urls: Vec<String> = page
                    .list
                    .items()
                    .iter()
                    .filter_map(Product::thumbnail)
                    .map(str::to_string)
                    .collect();
                if let Some(ProductModal::Details(product)) = &page.modal {
                    urls.extend(product.images.iter().cloned());
                }
                urls
            }
            Page::Categories(page) => page.list.items().iter().filter_map(|c| c.image.clone()).collect(),
            Page::Editor(page) => page.form.images.clone(),
            Page::Login(_) | Page::Dashboard(_) => vec![],
        };

        self.thumbnails.retain_only(urls.iter().map(String::as_str));
        let missing = self.thumbnails.missing(urls.iter().map(String::as_str));
        Task::batch(missing.into_iter().map(|url| {
            Task::perform(self.thumbnails.fetch(url), |(url, handle)| {
                Message::ThumbnailLoaded(url, handle)
            })
        }))
    }
}

/// Alt+Left / Alt+Right walk the history; Escape closes a dialog
fn shortcut(key: Key, modifiers: Modifiers) -> Option<Message> {
    match key {
        Key::Named(Named::ArrowLeft) if modifiers.alt() => Some(Message::Back),
        Key::Named(Named::ArrowRight) if modifiers.alt() => Some(Message::Forward),
        Key::Named(Named::Escape) => Some(Message::CloseModal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ApiError;

    fn app(signed_in: bool, start: &str) -> Stockroom {
        let session = Session::in_memory();
        if signed_in {
            session.sign_in("token-1").unwrap();
        }
        let api = ApiClient::new("http://127.0.0.1:1/api/", session).unwrap();
        let (app, _) = Stockroom::new(Config::default(), api, Route::parse(start));
        app
    }

    fn products(app: &mut Stockroom) -> &mut ProductsPage {
        match &mut app.page {
            Page::Products(page) => page,
            _ => panic!("not on the products page"),
        }
    }

    #[test]
    fn test_start_requires_sign_in() {
        let app = app(false, "/products?offset=10");
        assert_eq!(app.route(), &Route::Login);
        assert!(matches!(app.page, Page::Login(_)));

        let app = app_signed_in("/login");
        assert_eq!(app.route(), &Route::Dashboard);
    }

    fn app_signed_in(start: &str) -> Stockroom {
        app(true, start)
    }

    #[test]
    fn test_search_keeps_offset() {
        let mut app = app_signed_in("/products?offset=20&limit=10");
        let ticket = products(&mut app).list.search.set("shoe");
        let _ = app.update(Message::SearchSettled(ticket));

        assert_eq!(app.route(), &Route::parse("/products?search=shoe&offset=20&limit=10"));
        let page = products(&mut app);
        assert_eq!(page.key().params.get("searchedText"), Some("shoe"));
        assert_eq!(page.list.search.value(), "shoe");
    }

    #[test]
    fn test_superseded_search_is_ignored() {
        let mut app = app_signed_in("/products");
        let first = products(&mut app).list.search.set("sh");
        let _ = products(&mut app).list.search.set("shoe");
        let _ = app.update(Message::SearchSettled(first));
        assert_eq!(app.route(), &Route::products());
    }

    #[test]
    fn test_category_filter_resets_offset() {
        let mut app = app_signed_in("/products?offset=30&limit=25");
        let _ = app.update(Message::CategoryFilter(CategoryChoice {
            id: Some("c9".into()),
            name: "Shoes".into(),
        }));
        assert_eq!(app.route(), &Route::parse("/products?categoryId=c9&offset=0&limit=25"));

        let _ = app.update(Message::Paginate(25, 25));
        assert_eq!(app.route(), &Route::parse("/products?categoryId=c9&offset=25&limit=25"));

        let _ = app.update(Message::Back);
        assert_eq!(app.route(), &Route::parse("/products?categoryId=c9&offset=0&limit=25"));
    }

    #[test]
    fn test_stale_response_dropped() {
        let mut app = app_signed_in("/products?offset=10");
        let old = QueryKey::new(paths::PRODUCTS, ListQuery::default().api_params());
        let _ = app.update(Message::Loaded(
            old,
            QueryState {
                data: Some(json!([{ "id": "p1", "name": "Old", "price": 1.0 }])),
                is_success: true,
                ..QueryState::default()
            },
        ));
        assert!(products(&mut app).list.state.data.is_none());

        let current = products(&mut app).key();
        let _ = app.update(Message::Loaded(
            current,
            QueryState {
                data: Some(json!([{ "id": "p2", "name": "New", "price": 2.0 }])),
                is_success: true,
                ..QueryState::default()
            },
        ));
        assert_eq!(products(&mut app).list.items()[0].name, "New");
    }

    #[test]
    fn test_signed_out_goes_to_login() {
        let mut app = app_signed_in("/categories");
        app.session.clear();
        let _ = app.update(Message::SessionChanged(None));
        assert_eq!(app.route(), &Route::Login);

        let _ = app.update(Message::Back);
        assert_eq!(app.route(), &Route::Login);
    }

    #[test]
    fn test_delete_toast_only_on_success() {
        let mut app = app_signed_in("/products");
        let failed = MutationOutcome {
            result: Err(ApiError::Transport("connection refused".into())),
            toast: None,
        };
        let _ = app.update(Message::Deleted(failed));
        let messages: Vec<_> = app.toasts.iter().map(|t| t.message.clone()).collect();
        assert_eq!(messages, vec!["connection refused".to_string()]);

        let ok = MutationOutcome {
            result: Ok(json!({})),
            toast: None,
        };
        let _ = app.update(Message::Deleted(ok));
        assert!(app.toasts.iter().any(|t| t.message == "Product deleted successfully"));
    }

    #[test]
    fn test_login_validation() {
        let mut app = app(false, "/");
        let _ = app.update(Message::EmailChanged("not-an-email".into()));
        let _ = app.update(Message::SubmitLogin);
        match &app.page {
            Page::Login(page) => {
                assert_eq!(page.errors.get(Field::Email), Some("Please enter a valid email address"));
                assert!(!page.submit.is_pending());
            }
            _ => panic!("not on the login page"),
        }
    }
}
