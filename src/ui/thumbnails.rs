//! Remote product images, fetched once per URL and kept while on screen

use std::collections::{HashMap, HashSet};
use std::future::Future;

use iced::widget::{container, image, text};
use iced::{ContentFit, Element, Length};

use super::theme::{self, DarkTheme};

#[derive(Debug, Clone)]
enum Thumb {
    Loading,
    Ready(image::Handle),
    Failed,
}

#[derive(Debug, Default)]
pub struct Thumbnails {
    client: reqwest::Client,
    cache: HashMap<String, Thumb>,
}

impl Thumbnails {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs never requested before; they are marked as loading
    pub fn missing<'a>(&mut self, urls: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut out = Vec::new();
        for url in urls {
            if !self.cache.contains_key(url) {
                self.cache.insert(url.to_string(), Thumb::Loading);
                out.push(url.to_string());
            }
        }
        out
    }

    /// Forget every image not in `urls`; one shown again later is refetched
    pub fn retain_only<'a>(&mut self, urls: impl IntoIterator<Item = &'a str>) {
        let keep: HashSet<&str> = urls.into_iter().collect();
        let before = self.cache.len();
        self.cache.retain(|url, _| keep.contains(url.as_str()));
        if self.cache.len() < before {
            tracing::debug!("Dropped {} off-screen thumbnails", before - self.cache.len());
        }
    }

    pub fn fetch(&self, url: String) -> impl Future<Output = (String, Option<image::Handle>)> + Send + 'static {
        let client = self.client.clone();
        async move {
            let handle = match download(&client, &url).await {
                Ok(bytes) => Some(image::Handle::from_bytes(bytes)),
                Err(e) => {
                    tracing::debug!("Image {} unavailable: {}", url, e);
                    None
                }
            };
            (url, handle)
        }
    }

    /// Store a finished download; ignored if the image left the screen meanwhile
    pub fn loaded(&mut self, url: String, handle: Option<image::Handle>) {
        let Some(slot) = self.cache.get_mut(&url) else {
            return;
        };
        *slot = match handle {
            Some(handle) => Thumb::Ready(handle),
            None => Thumb::Failed,
        };
    }

    pub fn is_ready(&self, url: &str) -> bool {
        matches!(self.cache.get(url), Some(Thumb::Ready(_)))
    }

    /// Square image, or a "No Image" box while missing or broken
    pub fn view<'a, Message: 'a>(&self, url: Option<&str>, size: f32) -> Element<'a, Message> {
        match url.and_then(|u| self.cache.get(u)) {
            Some(Thumb::Ready(handle)) => image(handle.clone())
                .width(size)
                .height(size)
                .content_fit(ContentFit::Cover)
                .into(),
            state => {
                let label = match state {
                    Some(Thumb::Loading) => "...",
                    _ => "No Image",
                };
                container(text(label).size(10).color(DarkTheme::TEXT_MUTED))
                    .center(Length::Fixed(size))
                    .style(theme::placeholder)
                    .into()
            }
        }
    }
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
