//! Search fan-out across categories.

use std::sync::Arc;

use futures::future::{join, join_all, BoxFuture, FutureExt as _};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    model::{AggregateResult, Category, CategoryResult, Charts, DisplayRecord, SearchScope},
    normalize,
    provider::{Gateway, GatewayError, Method, RawPayload, Request},
};

/// Records requested from the provider per category lookup.
const SEARCH_LIMIT: usize = 12;
/// Entries per top chart.
const CHART_LIMIT: usize = 10;

type Normalizer = fn(&RawPayload, usize) -> Vec<DisplayRecord>;

/// Single-call categories: provider method, query parameter and normalizer.
const SEARCHES: [(Category, Method, &str, Normalizer); 3] = [
    (Category::Artist, Method::ArtistSearch, "artist", normalize::artist_matches),
    (Category::Track, Method::TrackSearch, "track", normalize::track_matches),
    (Category::Album, Method::AlbumSearch, "album", normalize::album_matches),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search query is empty")]
    EmptyQuery,
    #[error("every category lookup failed")]
    AllCategoriesFailed,
}

/// Terminal, non-error outcomes of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(AggregateResult),
    NoResults,
}

/// What one launched lookup contributed to the aggregate.
struct Lookup {
    results: Vec<CategoryResult>,
    failed: bool,
}

pub struct Dispatcher {
    gateway: Arc<Gateway>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Search every category `scope` selects, concurrently, and wait for all of them.
    ///
    /// A failing category comes back empty and flagged; the search itself only
    /// fails when the query is blank or every lookup failed.
    ///
    /// # Errors
    ///
    /// [`SearchError::EmptyQuery`] before any lookup is issued, or
    /// [`SearchError::AllCategoriesFailed`].
    pub async fn search(&self, query: &str, scope: SearchScope) -> Result<SearchOutcome, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        info!(query, ?scope, "Searching");

        // Launch order is display order; join_all keeps it regardless of completion order.
        let mut lookups: Vec<BoxFuture<'_, Lookup>> = Vec::new();
        for (category, method, param, normalizer) in SEARCHES {
            if scope.includes(category) {
                let request = Request::new(method)
                    .param(param, query)
                    .limit(SEARCH_LIMIT);
                lookups.push(self.search_category(category, request, normalizer).boxed());
            }
        }
        if scope.includes(Category::GenreArtist) {
            lookups.push(self.search_genre(query).boxed());
        }

        let lookups = join_all(lookups).await;
        if lookups.iter().all(|l| l.failed) {
            warn!(query, "Every category lookup failed");
            return Err(SearchError::AllCategoriesFailed);
        }

        let result = AggregateResult {
            query: query.to_owned(),
            categories: lookups.into_iter().flat_map(|l| l.results).collect(),
        };
        if result.is_empty() {
            info!(query, "Search found nothing");
            return Ok(SearchOutcome::NoResults);
        }
        Ok(SearchOutcome::Found(result))
    }

    async fn search_category(
        &self,
        category: Category,
        request: Request,
        normalizer: Normalizer,
    ) -> Lookup {
        let result = self.fetch_category(category, &request, normalizer).await;
        Lookup {
            failed: result.is_err(),
            results: vec![absorb(category, result)],
        }
    }

    /// The query read as a tag: its top artists and top tracks. Only fails if both do.
    async fn search_genre(&self, query: &str) -> Lookup {
        let artists = Request::new(Method::TagTopArtists)
            .param("tag", query)
            .limit(SEARCH_LIMIT);
        let tracks = Request::new(Method::TagTopTracks)
            .param("tag", query)
            .limit(SEARCH_LIMIT);
        let (artists, tracks) = join(
            self.fetch_category(Category::GenreArtist, &artists, normalize::tag_top_artists),
            self.fetch_category(Category::GenreTrack, &tracks, normalize::top_chart_tracks),
        )
        .await;

        Lookup {
            failed: artists.is_err() && tracks.is_err(),
            results: vec![
                absorb(Category::GenreArtist, artists),
                absorb(Category::GenreTrack, tracks),
            ],
        }
    }

    async fn fetch_category(
        &self,
        category: Category,
        request: &Request,
        normalizer: Normalizer,
    ) -> Result<CategoryResult, GatewayError> {
        let payload = self.gateway.send(request).await?;
        let records = normalizer(&payload, category.display_cap());
        debug!(?category, count = records.len(), "Category lookup finished");
        Ok(CategoryResult::new(category, records))
    }

    /// Global top artists and top tracks, fetched concurrently.
    ///
    /// # Errors
    ///
    /// [`SearchError::AllCategoriesFailed`] when both charts fail.
    pub async fn charts(&self) -> Result<Charts, SearchError> {
        let artists = Request::new(Method::ChartTopArtists).limit(CHART_LIMIT);
        let tracks = Request::new(Method::ChartTopTracks).limit(CHART_LIMIT);
        let (artists, tracks) = join(self.gateway.send(&artists), self.gateway.send(&tracks)).await;

        if artists.is_err() && tracks.is_err() {
            warn!("Both chart lookups failed");
            return Err(SearchError::AllCategoriesFailed);
        }
        Ok(Charts {
            artists: absorb(
                Category::Artist,
                artists.map(|p| {
                    CategoryResult::new(
                        Category::Artist,
                        normalize::top_chart_artists(&p, CHART_LIMIT),
                    )
                }),
            ),
            tracks: absorb(
                Category::Track,
                tracks.map(|p| {
                    CategoryResult::new(Category::Track, normalize::top_chart_tracks(&p, CHART_LIMIT))
                }),
            ),
        })
    }
}

/// Turn a failed category lookup into an empty, flagged result.
fn absorb(category: Category, result: Result<CategoryResult, GatewayError>) -> CategoryResult {
    result.unwrap_or_else(|e| {
        warn!(?category, "Category lookup failed: {e}");
        CategoryResult::failed(category)
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value};
    use tokio::time::Instant;

    use super::*;
    use crate::provider::mock::{MockTransport, Reply};

    fn artists() -> Value {
        json!({ "results": { "artistmatches": { "artist": [{ "name": "Aphex Twin", "listeners": "1000" }] } } })
    }

    fn tracks() -> Value {
        json!({ "results": { "trackmatches": { "track": [{ "name": "Xtal", "artist": "Aphex Twin" }] } } })
    }

    fn albums() -> Value {
        json!({ "results": { "albummatches": { "album": [{ "name": "Drukqs", "artist": "Aphex Twin" }] } } })
    }

    fn tag_tracks() -> Value {
        json!({ "tracks": { "track": [{ "name": "An Ending (Ascent)", "artist": { "name": "Brian Eno" } }] } })
    }

    fn tag_artists() -> Value {
        json!({ "topartists": { "artist": [{ "name": "Brian Eno" }, { "name": "Stars of the Lid" }] } })
    }

    fn categories(result: &SearchOutcome) -> Vec<Category> {
        match result {
            SearchOutcome::Found(r) => r.categories.iter().map(|c| c.category).collect(),
            SearchOutcome::NoResults => Vec::new(),
        }
    }

    fn found(outcome: SearchOutcome) -> AggregateResult {
        match outcome {
            SearchOutcome::Found(r) => r,
            SearchOutcome::NoResults => panic!("expected results"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn order_is_fixed_regardless_of_latency() {
        let mock = Arc::new(
            MockTransport::new()
                .on_delayed(Method::ArtistSearch, Duration::from_millis(400), Reply::Json(artists()))
                .on_delayed(Method::TrackSearch, Duration::from_millis(300), Reply::Json(tracks()))
                .on_delayed(Method::AlbumSearch, Duration::from_millis(200), Reply::Json(albums()))
                .on_delayed(Method::TagTopArtists, Duration::from_millis(100), Reply::Json(tag_artists()))
                .on_delayed(Method::TagTopTracks, Duration::from_millis(10), Reply::Json(tag_tracks())),
        );
        let dispatcher = Dispatcher::new(MockTransport::gateway_for(Arc::clone(&mock)));

        let start = Instant::now();
        let outcome = dispatcher.search("aphex", SearchScope::All).await.unwrap();

        // Concurrent fan-out: total time is the slowest lookup, not the sum.
        assert!(start.elapsed() < Duration::from_millis(450));
        assert_eq!(
            categories(&outcome),
            [
                Category::Artist,
                Category::Track,
                Category::Album,
                Category::GenreArtist,
                Category::GenreTrack
            ]
        );
        assert_eq!(mock.calls().len(), 5);
    }

    #[tokio::test]
    async fn failed_category_is_isolated() {
        let dispatcher = Dispatcher::new(
            MockTransport::new()
                .on(Method::ArtistSearch, Reply::Status(500))
                .on(Method::TrackSearch, Reply::Json(tracks()))
                .on(Method::AlbumSearch, Reply::Json(albums()))
                .on(Method::TagTopArtists, Reply::Json(json!({})))
                .on(Method::TagTopTracks, Reply::Json(json!({})))
                .gateway(),
        );

        let result = found(dispatcher.search("aphex", SearchScope::All).await.unwrap());
        let artist = result.get(Category::Artist).unwrap();
        assert!(artist.is_empty());
        assert!(artist.failed);
        assert_eq!(result.get(Category::Track).unwrap().records[0].name, "Xtal");
        assert_eq!(result.get(Category::Album).unwrap().records[0].name, "Drukqs");
        assert!(!result.get(Category::Track).unwrap().failed);
    }

    #[tokio::test]
    async fn empty_query_issues_no_lookup() {
        let mock = Arc::new(MockTransport::new());
        let dispatcher = Dispatcher::new(MockTransport::gateway_for(Arc::clone(&mock)));

        assert_eq!(
            dispatcher.search("   ", SearchScope::All).await,
            Err(SearchError::EmptyQuery)
        );
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn all_failed() {
        // No routes: every call fails at the transport.
        let dispatcher = Dispatcher::new(MockTransport::new().gateway());
        assert_eq!(
            dispatcher.search("aphex", SearchScope::All).await,
            Err(SearchError::AllCategoriesFailed)
        );
    }

    #[tokio::test]
    async fn no_results_is_not_failure() {
        let dispatcher = Dispatcher::new(
            MockTransport::new()
                .on(Method::ArtistSearch, Reply::Json(json!({ "results": {} })))
                .on(Method::TrackSearch, Reply::Fail)
                .gateway(),
        );
        assert_eq!(
            dispatcher.search("zzzz", SearchScope::Artist).await,
            Ok(SearchOutcome::NoResults)
        );
    }

    #[tokio::test]
    async fn scope_limits_lookups() {
        let mock = Arc::new(MockTransport::new().on(Method::AlbumSearch, Reply::Json(albums())));
        let dispatcher = Dispatcher::new(MockTransport::gateway_for(Arc::clone(&mock)));

        let outcome = dispatcher.search("drukqs", SearchScope::Album).await.unwrap();
        assert_eq!(categories(&outcome), [Category::Album]);
        assert_eq!(mock.methods(), ["album.search"]);
        assert!(mock.calls()[0].contains(&("album".to_owned(), "drukqs".to_owned())));
        assert!(mock.calls()[0].contains(&("limit".to_owned(), "12".to_owned())));
    }

    #[tokio::test]
    async fn genre_survives_one_empty_half() {
        let dispatcher = Dispatcher::new(
            MockTransport::new()
                .on(Method::TagTopTracks, Reply::Json(json!({ "tracks": { "track": [] } })))
                .on(Method::TagTopArtists, Reply::Json(tag_artists()))
                .gateway(),
        );

        let result = found(dispatcher.search("ambient", SearchScope::Genre).await.unwrap());
        assert_eq!(
            result.categories.iter().map(|c| c.category).collect::<Vec<_>>(),
            [Category::GenreArtist, Category::GenreTrack]
        );
        assert_eq!(result.get(Category::GenreArtist).unwrap().records.len(), 2);
        assert!(result.get(Category::GenreTrack).unwrap().is_empty());
    }

    #[tokio::test]
    async fn genre_survives_one_failed_half() {
        let dispatcher = Dispatcher::new(
            MockTransport::new()
                .on(Method::TagTopTracks, Reply::Json(tag_tracks()))
                .on(Method::TagTopArtists, Reply::Status(404))
                .gateway(),
        );

        let result = found(dispatcher.search("ambient", SearchScope::Genre).await.unwrap());
        assert!(result.get(Category::GenreArtist).unwrap().failed);
        assert_eq!(
            result.get(Category::GenreTrack).unwrap().records[0].name,
            "An Ending (Ascent)"
        );
    }

    #[tokio::test]
    async fn results_are_capped() {
        let many: Vec<_> = (0..12).map(|i| json!({ "name": format!("Artist {i}") })).collect();
        let dispatcher = Dispatcher::new(
            MockTransport::new()
                .on(Method::TagTopArtists, Reply::Json(json!({ "topartists": { "artist": many } })))
                .on(Method::TagTopTracks, Reply::Fail)
                .gateway(),
        );
        let result = found(dispatcher.search("drone", SearchScope::Genre).await.unwrap());
        let records = &result.get(Category::GenreArtist).unwrap().records;
        assert_eq!(records.len(), 6);
        assert_eq!(records[5].name, "Artist 5");
    }

    #[tokio::test]
    async fn charts_tolerate_one_failure() {
        let dispatcher = Dispatcher::new(
            MockTransport::new()
                .on(Method::ChartTopArtists, Reply::Fail)
                .on(Method::ChartTopTracks, Reply::Json(tag_tracks()))
                .gateway(),
        );
        let charts = dispatcher.charts().await.unwrap();
        assert!(charts.artists.failed);
        assert_eq!(charts.tracks.records.len(), 1);

        let dispatcher = Dispatcher::new(MockTransport::new().gateway());
        assert_eq!(dispatcher.charts().await, Err(SearchError::AllCategoriesFailed));
    }
}
