use super::image_url::is_valid_image_url;
use super::message::InboundMessage;
use super::surface::{DetailModal, ImageSlot, Page, PageBody, PreviewCard, Surface, SubmitForm, Visibility};
use crate::article::Article;
use crate::host::{HostAction, HostTransport};
use std::collections::HashSet;
use std::sync::Arc;

pub const INVALID_IMAGE_WARNING: &str =
    "Please provide a valid image URL (jpg, png, gif, etc.) or leave blank";

/// Presentation knobs, usually taken from the `[overlay]` config table.
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    pub excerpt_chars: usize,
    pub placeholder: String,
    pub date_format: String,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            excerpt_chars: 100,
            placeholder: "No news yet, partner!".to_string(),
            date_format: "%x".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayState {
    pub is_open: bool,
    /// Set once the display has finished its first frame.
    pub is_ready: bool,
    pub current_page: usize,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    InvalidImageUrl,
    MissingFields,
    NoHost,
}

/// Owns the overlay state and its rendered surface. Every handler runs to
/// completion and never fails; missing targets turn the handler into a no-op.
pub struct OverlayController {
    state: OverlayState,
    surface: Surface,
    options: OverlayOptions,
    host: Option<Arc<dyn HostTransport>>,
    failed_images: HashSet<String>,
    probed_images: HashSet<String>,
    probe_queue: Vec<String>,
}

impl OverlayController {
    pub fn new(options: OverlayOptions, host: Option<Arc<dyn HostTransport>>) -> Self {
        let mut controller = Self {
            state: OverlayState::default(),
            surface: Surface::default(),
            options,
            host,
            failed_images: HashSet::new(),
            probed_images: HashSet::new(),
            probe_queue: Vec::new(),
        };
        controller.initialize();
        controller
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    /// Startup guard: nothing is visible until the host explicitly opens us.
    pub fn initialize(&mut self) {
        self.force_hidden();
        self.state.is_open = false;
    }

    /// Display finished loading. Re-applies the startup guard, then starts
    /// accepting messages.
    pub fn mark_ready(&mut self) {
        self.initialize();
        self.state.is_ready = true;
        tracing::debug!("overlay ready");
    }

    /// Apply an inbound message. Returns whether it changed anything.
    pub fn handle_message(&mut self, msg: InboundMessage) -> bool {
        if !self.state.is_ready {
            tracing::debug!(?msg, "dropping message received before display ready");
            return false;
        }

        match msg {
            InboundMessage::Open { articles } => {
                self.state.is_open = true;
                self.surface.background_active = true;
                self.surface.container_visible = true;
                self.state.current_page = 0;
                self.state.articles = articles;
                self.render_pages();
                tracing::info!(count = self.state.articles.len(), "overlay opened");
                true
            }
            InboundMessage::Update { articles } => {
                if !self.state.is_open || articles.is_empty() {
                    tracing::debug!(
                        open = self.state.is_open,
                        count = articles.len(),
                        "ignoring update"
                    );
                    return false;
                }
                self.state.articles = articles;
                self.render_pages();
                if self.state.current_page >= self.state.articles.len() {
                    tracing::warn!(
                        page = self.state.current_page,
                        count = self.state.articles.len(),
                        "page index past end after update"
                    );
                }
                true
            }
            InboundMessage::Hide => {
                self.state.is_open = false;
                self.force_hidden();
                tracing::info!("overlay hidden by host");
                true
            }
            InboundMessage::Unknown(kind) => {
                tracing::debug!(kind = %kind, "ignoring unknown message type");
                false
            }
        }
    }

    /// Hides the container and everything that lives inside it. Form input
    /// is kept for the next open.
    fn force_hidden(&mut self) {
        self.surface.container_visible = false;
        self.surface.background_active = false;
        self.surface.modal = None;
        self.surface.form.visible = false;
    }

    fn render_pages(&mut self) {
        let pages = if self.state.articles.is_empty() {
            vec![Page {
                body: PageBody::Placeholder(self.options.placeholder.clone()),
                visibility: Visibility::Hidden,
            }]
        } else {
            self.state
                .articles
                .iter()
                .map(|article| Page {
                    body: PageBody::Preview(self.preview_card(article)),
                    visibility: Visibility::Hidden,
                })
                .collect()
        };
        self.surface.pages = pages;
        self.update_page_display();
        self.enqueue_probes();
    }

    fn preview_card(&self, article: &Article) -> PreviewCard {
        let excerpt: String = article
            .content()
            .unwrap_or_default()
            .chars()
            .take(self.options.excerpt_chars)
            .collect();
        PreviewCard {
            article_id: article.id,
            headline: article.headline().unwrap_or("No Title").to_string(),
            excerpt: format!("{}...", excerpt),
            image: self.image_slot(article.image_url()),
            author: article.author_name().map(|name| format!("By: {}", name)),
            date: article.formatted_date(&self.options.date_format),
        }
    }

    fn image_slot(&self, url: Option<&str>) -> Option<ImageSlot> {
        url.filter(|u| is_valid_image_url(u)).map(|u| ImageSlot {
            url: u.to_string(),
            hidden: self.failed_images.contains(u),
        })
    }

    /// Marks exactly the page at `current_page` active. A stale index past the
    /// end leaves every page hidden.
    fn update_page_display(&mut self) {
        let current = self.state.current_page;
        for (idx, page) in self.surface.pages.iter_mut().enumerate() {
            page.visibility = if idx == current {
                Visibility::Active
            } else {
                Visibility::Hidden
            };
        }

        let total = self.state.articles.len();
        self.surface.prev_disabled = current == 0;
        self.surface.next_disabled = total == 0 || current + 1 >= total;
        self.surface.page_readout = if total > 0 {
            format!("Page {} of {}", current + 1, total)
        } else {
            "No Pages".to_string()
        };
    }

    pub fn next_page(&mut self) -> bool {
        let total = self.state.articles.len();
        if self.state.current_page + 1 < total {
            self.state.current_page += 1;
            self.update_page_display();
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.state.current_page == 0 {
            return false;
        }
        let last = self.state.articles.len();
        self.state.current_page = self.state.current_page.min(last).saturating_sub(1);
        self.update_page_display();
        true
    }

    /// Article id shown on the active page, if any.
    pub fn current_article_id(&self) -> Option<i64> {
        self.surface.active_page().and_then(Page::article_id)
    }

    pub fn open_detail(&mut self, article_id: i64) -> bool {
        let Some(article) = self.state.articles.iter().find(|a| a.id == article_id) else {
            tracing::debug!(article_id, "detail requested for unknown article");
            return false;
        };
        let modal = DetailModal {
            article_id,
            headline: article.headline().unwrap_or("No Title").to_string(),
            content: article.content().unwrap_or("No Content").to_string(),
            image: self.image_slot(article.image_url()),
        };
        self.surface.modal = Some(modal);
        self.enqueue_probes();
        true
    }

    pub fn close_detail(&mut self) {
        self.surface.modal = None;
    }

    pub fn toggle_form(&mut self) {
        self.surface.form.visible = !self.surface.form.visible;
    }

    pub fn cancel_form(&mut self) {
        self.surface.form.visible = false;
    }

    pub fn form_mut(&mut self) -> &mut SubmitForm {
        &mut self.surface.form
    }

    pub fn dismiss_warning(&mut self) {
        self.surface.warning = None;
    }

    pub fn submit_article(&mut self) -> SubmitOutcome {
        let form = &self.surface.form;
        let image_url = form.image_url.clone();
        if !image_url.trim().is_empty() && !is_valid_image_url(&image_url) {
            tracing::debug!(url = %image_url, "rejecting submission with invalid image url");
            self.surface.warning = Some(INVALID_IMAGE_WARNING.to_string());
            return SubmitOutcome::InvalidImageUrl;
        }
        if form.headline.is_empty() || form.content.is_empty() {
            return SubmitOutcome::MissingFields;
        }
        let Some(host) = &self.host else {
            tracing::debug!("no host transport, submission not sent");
            return SubmitOutcome::NoHost;
        };

        host.send(HostAction::SubmitNews {
            headline: form.headline.clone(),
            content: form.content.clone(),
            image_url: Some(image_url).filter(|u| !u.trim().is_empty()),
        });

        let form = &mut self.surface.form;
        form.clear();
        form.visible = false;
        SubmitOutcome::Sent
    }

    /// Ask the host to delete an article. Local state waits for the host to
    /// send a fresh collection.
    pub fn delete_article(&mut self, id: i64) {
        if let Some(host) = &self.host {
            host.send(HostAction::DeleteArticle { id });
        }
    }

    /// Notify the host, then close locally without waiting for it.
    pub fn close_overlay(&mut self) {
        if let Some(host) = &self.host {
            host.send(HostAction::CloseUi);
        }
        self.force_hidden();
        self.state.is_open = false;
    }

    pub fn handle_escape(&mut self) -> bool {
        if self.state.is_open {
            self.close_overlay();
            true
        } else {
            false
        }
    }

    /// An image resource failed to load; hide every slot showing it.
    pub fn image_failed(&mut self, url: &str) {
        tracing::debug!(url, "image failed to load, hiding");
        self.failed_images.insert(url.to_string());
        let slots = self
            .surface
            .pages
            .iter_mut()
            .filter_map(|page| match &mut page.body {
                PageBody::Preview(card) => card.image.as_mut(),
                PageBody::Placeholder(_) => None,
            })
            .chain(self.surface.modal.as_mut().and_then(|m| m.image.as_mut()));
        for slot in slots {
            if slot.url == url {
                slot.hidden = true;
            }
        }
    }

    /// Image URLs rendered since the last call that have not been checked yet.
    pub fn take_image_probes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.probe_queue)
    }

    fn enqueue_probes(&mut self) {
        let urls: Vec<String> = self
            .surface
            .pages
            .iter()
            .filter_map(|page| match &page.body {
                PageBody::Preview(card) => card.image.as_ref(),
                PageBody::Placeholder(_) => None,
            })
            .chain(self.surface.modal.as_ref().and_then(|m| m.image.as_ref()))
            .filter(|slot| !slot.hidden)
            .map(|slot| slot.url.clone())
            .collect();
        for url in urls {
            if self.probed_images.insert(url.clone()) {
                self.probe_queue.push(url);
            }
        }
    }
}
