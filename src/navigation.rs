//! The single detail view and the actions embedded in it.

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    model::{DetailDocument, EntityReference},
    resolve::{DetailUnavailable, Resolver},
    slot::{Slot, Ticket},
};

/// Identifies one embedded reference of one opened document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionHandle {
    document: u64,
    index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("no detail view is open")]
    Closed,
    #[error("action belongs to a view that is no longer open")]
    Stale,
    #[error("action has already been used")]
    Spent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState<'a> {
    Closed,
    Open(&'a DetailDocument),
}

#[derive(Debug)]
struct OpenDetail {
    id: u64,
    document: DetailDocument,
    /// One entry per embedded reference; taken when the action fires.
    bindings: Vec<Option<EntityReference>>,
}

/// Owns at most one open [`DetailDocument`].
#[derive(Debug, Default)]
pub struct Navigator {
    view: Slot<OpenDetail>,
    opened: u64,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ViewState<'_> {
        match self.view.get() {
            None => ViewState::Closed,
            Some(open) => ViewState::Open(&open.document),
        }
    }

    #[must_use]
    pub fn document(&self) -> Option<&DetailDocument> {
        self.view.get().map(|o| &o.document)
    }

    /// Show `document`, discarding whatever was open. Returns the actions bound for it.
    pub fn open(&mut self, document: DetailDocument) -> Vec<ActionHandle> {
        let open = self.bind(document);
        let handles = Self::handles_of(&open);
        info!(subject = %open.document.subject, actions = handles.len(), "Opening detail view");
        self.view.replace(open);
        handles
    }

    pub fn close(&mut self) {
        if self.view.clear().is_some() {
            info!("Detail view closed");
        }
    }

    /// Handle of the `index`-th embedded reference of the open document.
    #[must_use]
    pub fn handle(&self, index: usize) -> Option<ActionHandle> {
        let open = self.view.get()?;
        (index < open.bindings.len()).then_some(ActionHandle {
            document: open.id,
            index,
        })
    }

    /// Fire an action: hands out its reference once, then the binding is spent.
    ///
    /// # Errors
    ///
    /// [`NavigationError::Closed`], [`NavigationError::Stale`] for a handle of a
    /// document no longer open, or [`NavigationError::Spent`] on a second use.
    pub fn trigger(&mut self, handle: ActionHandle) -> Result<EntityReference, NavigationError> {
        let open = self.view.get_mut().ok_or(NavigationError::Closed)?;
        if open.id != handle.document {
            return Err(NavigationError::Stale);
        }
        open.bindings
            .get_mut(handle.index)
            .and_then(Option::take)
            .ok_or(NavigationError::Spent)
    }

    /// Start resolving a view whose result should only be shown if nothing newer
    /// was started, opened or closed in the meantime.
    pub fn begin(&mut self) -> Ticket {
        self.view.begin()
    }

    /// Show a document resolved under `ticket`. `None` means it was superseded.
    pub fn finish(&mut self, ticket: Ticket, document: DetailDocument) -> Option<Vec<ActionHandle>> {
        if self.view.is_current(&ticket) {
            Some(self.open(document))
        } else {
            debug!(subject = %document.subject, "Resolved view superseded, not shown");
            None
        }
    }

    /// Settle a resolution that failed. Returns whether it was still the newest one,
    /// i.e. whether the failure should be reported.
    pub fn abandon(&self, ticket: Ticket) -> bool {
        let current = self.view.is_current(&ticket);
        if !current {
            debug!("Failed resolution was already superseded");
        }
        current
    }

    /// Resolve `reference` and show it. On failure the current state is left as it was.
    ///
    /// # Errors
    ///
    /// [`DetailUnavailable`] when the resolver could not build the document.
    pub async fn open_reference(
        &mut self,
        resolver: &Resolver,
        reference: &EntityReference,
    ) -> Result<Option<Vec<ActionHandle>>, DetailUnavailable> {
        let ticket = self.begin();
        let document = resolver.resolve(reference).await?;
        Ok(self.finish(ticket, document))
    }

    pub async fn on_open_artist(
        &mut self,
        resolver: &Resolver,
        name: &str,
    ) -> Result<Option<Vec<ActionHandle>>, DetailUnavailable> {
        self.open_reference(resolver, &EntityReference::artist(name))
            .await
    }

    pub async fn on_open_track(
        &mut self,
        resolver: &Resolver,
        artist: &str,
        title: &str,
    ) -> Result<Option<Vec<ActionHandle>>, DetailUnavailable> {
        self.open_reference(resolver, &EntityReference::track(artist, title))
            .await
    }

    pub async fn on_open_album(
        &mut self,
        resolver: &Resolver,
        artist: &str,
        title: &str,
    ) -> Result<Option<Vec<ActionHandle>>, DetailUnavailable> {
        self.open_reference(resolver, &EntityReference::album(artist, title))
            .await
    }

    /// The `open-artist-top` action of an artist card.
    pub async fn on_open_artist_top(
        &mut self,
        resolver: &Resolver,
        artist: &str,
    ) -> Result<Option<Vec<ActionHandle>>, DetailUnavailable> {
        let ticket = self.begin();
        let document = resolver.resolve_top_tracks(artist).await?;
        Ok(self.finish(ticket, document))
    }

    fn bind(&mut self, document: DetailDocument) -> OpenDetail {
        self.opened += 1;
        let bindings = document.references().into_iter().cloned().map(Some).collect();
        OpenDetail {
            id: self.opened,
            document,
            bindings,
        }
    }

    fn handles_of(open: &OpenDetail) -> Vec<ActionHandle> {
        (0..open.bindings.len())
            .map(|index| ActionHandle {
                document: open.id,
                index,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future::join;
    use serde_json::json;

    use super::*;
    use crate::{
        model::{PrimarySection, SectionKind},
        provider::{
            mock::{MockTransport, Reply},
            Method,
        },
    };

    fn document(title: &str) -> DetailDocument {
        DetailDocument {
            subject: EntityReference::artist(title),
            primary: PrimarySection {
                title: title.to_owned(),
                image_url: None,
                facts: Vec::new(),
                tags: Vec::new(),
            },
            sections: Vec::new(),
        }
    }

    fn artist_resolver() -> Resolver {
        Resolver::new(
            MockTransport::new()
                .on(
                    Method::ArtistInfo,
                    Reply::Json(json!({ "artist": { "name": "Low" } })),
                )
                .on(
                    Method::ArtistTopTracks,
                    Reply::Json(json!({ "toptracks": { "track": [
                        { "name": "Sunflower", "artist": { "name": "Low" } },
                        { "name": "Lullaby", "artist": { "name": "Low" } }
                    ] } })),
                )
                .on(
                    Method::TrackInfo,
                    Reply::Json(json!({ "track": { "name": "Sunflower", "artist": { "name": "Low" } } })),
                )
                .gateway(),
        )
    }

    #[test]
    fn open_replaces_and_close_is_idempotent() {
        let mut navigator = Navigator::new();
        assert_eq!(navigator.state(), ViewState::Closed);

        navigator.open(document("first"));
        navigator.open(document("second"));
        assert_eq!(
            navigator.document().map(|d| d.primary.title.as_str()),
            Some("second")
        );

        navigator.close();
        assert_eq!(navigator.state(), ViewState::Closed);
        navigator.close();
        assert_eq!(navigator.state(), ViewState::Closed);
    }

    #[tokio::test]
    async fn failed_primary_leaves_closed() {
        let resolver = Resolver::new(
            MockTransport::new()
                .on(Method::ArtistInfo, Reply::Status(500))
                .gateway(),
        );
        let mut navigator = Navigator::new();

        let err = navigator
            .on_open_artist(&resolver, "Low")
            .await
            .unwrap_err();
        assert_eq!(err.reference, EntityReference::artist("Low"));
        assert_eq!(navigator.state(), ViewState::Closed);
    }

    #[tokio::test]
    async fn failed_follow_keeps_current_view() {
        let resolver = Resolver::new(
            MockTransport::new()
                .on(Method::ArtistInfo, Reply::Json(json!({ "artist": { "name": "Low" } })))
                .on(
                    Method::ArtistSimilar,
                    Reply::Json(json!({ "similarartists": { "artist": [{ "name": "Codeine" }] } })),
                )
                .gateway(),
        );
        let mut navigator = Navigator::new();
        let handles = navigator
            .on_open_artist(&resolver, "Low")
            .await
            .unwrap()
            .unwrap();

        // No routes: every lookup for the followed artist fails.
        let failing = Resolver::new(MockTransport::new().gateway());
        let reference = navigator.trigger(handles[0]).unwrap();
        assert_eq!(reference, EntityReference::artist("Codeine"));
        assert!(navigator.open_reference(&failing, &reference).await.is_err());
        assert_eq!(
            navigator.document().map(|d| &d.subject),
            Some(&EntityReference::artist("Low"))
        );
        assert_eq!(
            navigator.trigger(handles[0]),
            Err(NavigationError::Spent)
        );
    }

    #[tokio::test]
    async fn recursive_navigation_replaces_document() {
        let resolver = artist_resolver();
        let mut navigator = Navigator::new();

        let artist_handles = navigator
            .on_open_artist(&resolver, "Low")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(artist_handles.len(), 2);
        let artist_doc = navigator.document().cloned().unwrap();
        assert!(artist_doc.section(SectionKind::TopTracks).is_some());

        let reference = navigator.trigger(artist_handles[0]).unwrap();
        navigator.open_reference(&resolver, &reference).await.unwrap();

        match navigator.state() {
            ViewState::Open(doc) => {
                assert_eq!(doc.subject, EntityReference::track("Low", "Sunflower"));
                assert_ne!(doc, &artist_doc);
            }
            ViewState::Closed => panic!("track view should be open"),
        }
        // Handles of the replaced artist document are dead.
        assert_eq!(
            navigator.trigger(artist_handles[1]),
            Err(NavigationError::Stale)
        );
    }

    #[test]
    fn each_action_fires_once() {
        let mut navigator = Navigator::new();
        let mut doc = document("Low");
        doc.sections.push(crate::model::Section {
            kind: SectionKind::SimilarArtists,
            body: crate::model::SectionBody::Links(vec![crate::model::Link {
                label: "Codeine".to_owned(),
                reference: EntityReference::artist("Codeine"),
            }]),
        });
        let handles = navigator.open(doc);

        assert_eq!(
            navigator.trigger(handles[0]),
            Ok(EntityReference::artist("Codeine"))
        );
        assert_eq!(navigator.trigger(handles[0]), Err(NavigationError::Spent));
        assert_eq!(navigator.handle(0), Some(handles[0]));
        assert_eq!(navigator.handle(1), None);

        navigator.close();
        assert_eq!(navigator.trigger(handles[0]), Err(NavigationError::Closed));
        assert_eq!(navigator.handle(0), None);
    }

    #[test]
    fn reopening_same_document_gets_fresh_bindings() {
        let mut navigator = Navigator::new();
        let mut doc = document("Low");
        doc.sections.push(crate::model::Section {
            kind: SectionKind::SimilarArtists,
            body: crate::model::SectionBody::Links(vec![crate::model::Link {
                label: "Codeine".to_owned(),
                reference: EntityReference::artist("Codeine"),
            }]),
        });
        let old = navigator.open(doc.clone());
        let new = navigator.open(doc);

        assert_eq!(navigator.trigger(old[0]), Err(NavigationError::Stale));
        assert!(navigator.trigger(new[0]).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn later_request_wins_over_slower_earlier_one() {
        let slow = Resolver::new(
            MockTransport::new()
                .on_delayed(
                    Method::TrackInfo,
                    Duration::from_millis(500),
                    Reply::Json(json!({ "track": { "name": "Slow" } })),
                )
                .gateway(),
        );
        let fast = Resolver::new(
            MockTransport::new()
                .on(Method::AlbumInfo, Reply::Json(json!({ "album": { "name": "Fast", "artist": "X" } })))
                .gateway(),
        );
        let mut navigator = Navigator::new();

        let first = navigator.begin();
        let second = navigator.begin();
        let track = EntityReference::track("X", "Slow");
        let album = EntityReference::album("X", "Fast");
        let (slow_doc, fast_doc) = join(slow.resolve(&track), fast.resolve(&album)).await;

        assert!(navigator.finish(second, fast_doc.unwrap()).is_some());
        assert!(navigator.finish(first, slow_doc.unwrap()).is_none());
        assert_eq!(
            navigator.document().map(|d| d.primary.title.as_str()),
            Some("Fast")
        );
    }

    #[tokio::test]
    async fn close_discards_in_flight_view() {
        let resolver = artist_resolver();
        let mut navigator = Navigator::new();

        let ticket = navigator.begin();
        let doc = resolver
            .resolve(&EntityReference::artist("Low"))
            .await
            .unwrap();
        navigator.close();
        assert!(navigator.finish(ticket, doc).is_none());
        assert_eq!(navigator.state(), ViewState::Closed);
    }

    #[test]
    fn failures_report_only_when_newest() {
        let mut navigator = Navigator::new();
        let first = navigator.begin();
        let second = navigator.begin();
        assert!(!navigator.abandon(first));
        assert!(navigator.abandon(second));

        let pending = navigator.begin();
        navigator.open(document("Low"));
        assert!(!navigator.abandon(pending));
    }
}
