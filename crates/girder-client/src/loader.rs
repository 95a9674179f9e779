//! Stale-response-safe content loading for the file and artifact viewers.
//!
//! The selection can change while a fetch is in flight, so every new
//! selection cancels the previous request and bumps a generation counter.
//! A completed fetch is only committed if its generation still matches;
//! anything else is discarded without touching the visible view.

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use girder_wire::ErrorBody;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "svg", "webp"];

/// Identity of one viewable resource: the workspace path plus file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub path: String,
    pub filename: String,
}

impl ResourceRef {
    pub fn new(path: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filename: filename.into(),
        }
    }

    /// Images are previewed from the raw endpoint; no text fetch happens.
    pub fn is_image(&self) -> bool {
        let extension = self
            .filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        IMAGE_EXTENSIONS.contains(&extension.as_str())
    }
}

/// What the viewer renders. Only [`ContentLoader::commit`] mutates it, so
/// the visible content always reflects the latest selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentView {
    pub loading: bool,
    pub content: Option<String>,
    pub error: Option<String>,
    /// Raw-preview URL for image selections.
    pub raw_preview: Option<String>,
    /// A load was cancelled before anything replaced the placeholder.
    pub interrupted: bool,
}

impl ContentView {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Handle for one load attempt, valid for the selection that created it.
#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
    cancel: CancellationToken,
    resource: ResourceRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded(String),
    /// First-class outcome, not an error: the selection moved on or was
    /// cleared while the request was in flight.
    Cancelled,
    Failed(String),
}

/// One loader slot per viewer instance. Both the workspace file viewer
/// and the generated-artifact viewer are driven through this type.
pub struct ContentLoader {
    client: Client,
    base_url: String,
    generation: u64,
    inflight: Option<CancellationToken>,
}

impl ContentLoader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            generation: 0,
            inflight: None,
        }
    }

    /// Begin loading a new selection. Any in-flight load is cancelled
    /// outright rather than merely ignored. Returns `None` for images,
    /// which resolve synchronously to a raw-preview URL.
    pub fn select(&mut self, resource: ResourceRef, view: &mut ContentView) -> Option<LoadTicket> {
        self.supersede();
        view.reset();

        if resource.is_image() {
            view.raw_preview = Some(format!(
                "{}/api/workspace/raw?path={}/{}",
                self.base_url, resource.path, resource.filename
            ));
            return None;
        }

        view.loading = true;
        let cancel = CancellationToken::new();
        self.inflight = Some(cancel.clone());
        Some(LoadTicket {
            generation: self.generation,
            cancel,
            resource,
        })
    }

    /// Drop the current selection (viewer closed). Cancels any in-flight
    /// load and invalidates outstanding tickets.
    pub fn clear(&mut self, view: &mut ContentView) {
        self.supersede();
        view.reset();
    }

    fn supersede(&mut self) {
        if let Some(cancel) = self.inflight.take() {
            cancel.cancel();
        }
        self.generation += 1;
    }

    /// Run the fetch for a ticket, racing it against cancellation.
    pub async fn fetch(&self, ticket: &LoadTicket) -> FetchOutcome {
        let url = format!(
            "{}/file-content?path={}&filename={}",
            self.base_url, ticket.resource.path, ticket.resource.filename
        );
        tokio::select! {
            _ = ticket.cancel.cancelled() => FetchOutcome::Cancelled,
            outcome = self.request(&url) => outcome,
        }
    }

    async fn request(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => return FetchOutcome::Failed(err.to_string()),
        };
        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("failed to fetch file content ({status})"));
            return FetchOutcome::Failed(message);
        }
        match response.text().await {
            Ok(text) => FetchOutcome::Loaded(text),
            Err(err) => FetchOutcome::Failed(err.to_string()),
        }
    }

    /// Apply a completed load to the view, unless a newer selection has
    /// superseded it. A stale result never overwrites newer content.
    pub fn commit(&mut self, ticket: LoadTicket, outcome: FetchOutcome, view: &mut ContentView) {
        if ticket.generation != self.generation {
            debug!(
                filename = ticket.resource.filename,
                "discarding stale load result"
            );
            return;
        }
        self.inflight = None;
        match outcome {
            FetchOutcome::Loaded(text) => {
                view.loading = false;
                view.content = Some(text);
                view.error = None;
            }
            FetchOutcome::Cancelled => {
                // Mark the interruption only while the loading placeholder
                // is still what the user sees.
                if view.loading {
                    view.loading = false;
                    view.interrupted = true;
                }
            }
            FetchOutcome::Failed(message) => {
                view.loading = false;
                view.error = Some(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> ContentLoader {
        ContentLoader::new("http://127.0.0.1:8766")
    }

    #[test]
    fn image_selection_short_circuits_to_raw_preview() {
        let mut loader = loader();
        let mut view = ContentView::default();
        let ticket = loader.select(ResourceRef::new("t-1", "chart.PNG"), &mut view);
        assert!(ticket.is_none());
        assert!(!view.loading);
        assert_eq!(
            view.raw_preview.as_deref(),
            Some("http://127.0.0.1:8766/api/workspace/raw?path=t-1/chart.PNG")
        );
    }

    #[test]
    fn stale_result_never_overwrites_newer_content() {
        let mut loader = loader();
        let mut view = ContentView::default();

        let ticket_a = loader.select(ResourceRef::new("t-1", "a.txt"), &mut view).unwrap();
        let ticket_b = loader.select(ResourceRef::new("t-1", "b.txt"), &mut view).unwrap();

        // B commits first, then A's late network response arrives.
        loader.commit(ticket_b, FetchOutcome::Loaded("contents of b".into()), &mut view);
        loader.commit(ticket_a, FetchOutcome::Loaded("contents of a".into()), &mut view);

        assert_eq!(view.content.as_deref(), Some("contents of b"));
    }

    #[test]
    fn superseded_ticket_is_cancelled_eagerly() {
        let mut loader = loader();
        let mut view = ContentView::default();
        let ticket_a = loader.select(ResourceRef::new("t-1", "a.txt"), &mut view).unwrap();
        let _ticket_b = loader.select(ResourceRef::new("t-1", "b.txt"), &mut view).unwrap();
        assert!(ticket_a.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_fetch_resolves_without_touching_the_network() {
        let mut loader = loader();
        let mut view = ContentView::default();
        let ticket = loader.select(ResourceRef::new("t-1", "a.txt"), &mut view).unwrap();
        ticket.cancel.cancel();
        assert_eq!(loader.fetch(&ticket).await, FetchOutcome::Cancelled);
    }

    #[test]
    fn clear_interrupts_the_pending_load() {
        let mut loader = loader();
        let mut view = ContentView::default();
        let ticket = loader.select(ResourceRef::new("t-1", "a.txt"), &mut view).unwrap();
        loader.clear(&mut view);
        assert!(ticket.cancel.is_cancelled());

        // The late cancellation result is stale and changes nothing.
        loader.commit(ticket, FetchOutcome::Cancelled, &mut view);
        assert_eq!(view, ContentView::default());
    }

    #[test]
    fn current_cancellation_marks_interrupted_only_over_the_placeholder() {
        let mut loader = loader();
        let mut view = ContentView::default();
        let ticket = loader.select(ResourceRef::new("t-1", "a.txt"), &mut view).unwrap();
        assert!(view.loading);
        loader.commit(ticket, FetchOutcome::Cancelled, &mut view);
        assert!(!view.loading);
        assert!(view.interrupted);
        assert_eq!(view.content, None);

        // Committed content is not replaced by a later spurious cancel.
        let ticket = loader.select(ResourceRef::new("t-1", "b.txt"), &mut view).unwrap();
        loader.commit(ticket, FetchOutcome::Loaded("b".into()), &mut view);
        assert_eq!(view.content.as_deref(), Some("b"));
        assert!(!view.interrupted);
    }

    #[test]
    fn failure_surfaces_the_message() {
        let mut loader = loader();
        let mut view = ContentView::default();
        let ticket = loader.select(ResourceRef::new("t-1", "a.txt"), &mut view).unwrap();
        loader.commit(
            ticket,
            FetchOutcome::Failed("File not found".into()),
            &mut view,
        );
        assert_eq!(view.error.as_deref(), Some("File not found"));
        assert!(!view.loading);
    }
}
