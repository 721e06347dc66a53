//! Integration tests for channel resolution, the fetch orchestrator and the
//! two-phase service, against wiremock hosts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use voices_content::{
    ChannelIdCache, ChannelResolver, ContentCache, ContentError, ContentFetcher, LatestArticle,
    LatestContent, LatestContentService, ManualClock, MemorySlot, SlotStorage,
};
use voices_core::{Commentator, CommentatorId};
use voices_feeds::{FeedLocator, YoutubeClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHANNEL: &str = "UCabcdefghijklmnopqrstuv";

const BLOG_RSS: &str = r#"<rss><channel><title>Blog</title>
<item><title>Latest essay</title><link>https://blog.test/p/latest</link>
<pubDate>Mon, 09 Jun 2025 10:00:00 GMT</pubDate></item>
<item><title>Older essay</title><link>https://blog.test/p/older</link></item>
</channel></rss>"#;

const VIDEO_ATOM: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom">
<entry><id>yt:video:vid00000001</id><title>Newest upload</title>
<link rel="alternate" href="https://www.youtube.com/watch?v=vid00000001"/>
<published>2025-06-08T15:00:00+00:00</published></entry>
<entry><id>yt:video:vid00000000</id><title>Older upload</title></entry>
</feed>"#;

struct Harness {
    fetcher: Arc<ContentFetcher>,
    clock: Arc<ManualClock>,
}

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
}

fn resolver(api_base: Option<&str>) -> ChannelResolver {
    let ids = ChannelIdCache::new(Arc::new(MemorySlot::new()));
    let client = api_base.map(|base| YoutubeClient::with_base_url("yt-key", 5, base).unwrap());
    ChannelResolver::new(ids, client)
}

fn harness(api_base: Option<&str>, video_base: &str, batch_size: usize) -> Harness {
    let clock = Arc::new(ManualClock::new(start()));
    let cache = ContentCache::new(Arc::new(MemorySlot::new()), clock.clone());
    let locator = FeedLocator::new(5, "VoicesTest/1.0").unwrap();
    let fetcher = ContentFetcher::new(locator, resolver(api_base), cache, batch_size)
        .with_video_feed_base(&format!("{video_base}/feeds/videos.xml"));
    Harness {
        fetcher: Arc::new(fetcher),
        clock,
    }
}

fn commentator(id: u64, blog: Option<&str>, video: Option<&str>) -> Commentator {
    let mut c = Commentator::new(id, &format!("Commentator {id}"), "20R");
    c.substack_url = blog.map(str::to_string);
    c.youtube_url = video.map(str::to_string);
    c
}

async fn mount_blog(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BLOG_RSS))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn handle_is_resolved_once_then_served_from_mapping() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("forHandle", "host"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "items": [{ "id": CHANNEL }] })),
        )
        .expect(1)
        .mount(&api)
        .await;

    let resolver = resolver(Some(&api.uri()));
    let url = "https://www.youtube.com/@host";
    assert_eq!(resolver.resolve(url).await.as_deref(), Some(CHANNEL));
    assert_eq!(resolver.resolve(url).await.as_deref(), Some(CHANNEL));
}

#[tokio::test]
async fn channel_id_urls_need_no_lookup_or_key() {
    let resolver = resolver(None);
    let url = format!("https://www.youtube.com/channel/{CHANNEL}");
    assert_eq!(resolver.resolve(&url).await.as_deref(), Some(CHANNEL));
}

#[tokio::test]
async fn missing_api_key_fails_closed() {
    let resolver = resolver(None);
    assert_eq!(resolver.resolve("https://www.youtube.com/@host").await, None);
    assert_eq!(resolver.resolve("https://www.youtube.com/SomeShow").await, None);
}

#[tokio::test]
async fn lookup_errors_become_none_and_are_not_cached() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": { "message": "quota exceeded" }
        })))
        .expect(2)
        .mount(&api)
        .await;

    let resolver = resolver(Some(&api.uri()));
    assert_eq!(resolver.resolve("https://www.youtube.com/SomeShow").await, None);
    assert_eq!(resolver.resolve("https://www.youtube.com/SomeShow").await, None);
}

#[tokio::test]
async fn snapshot_channel_id_seeds_the_mapping() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&api)
        .await;

    let resolver = resolver(Some(&api.uri()));
    resolver.seed("https://www.youtube.com/@host", CHANNEL).await;
    assert_eq!(
        resolver.resolve("https://www.youtube.com/@host").await.as_deref(),
        Some(CHANNEL)
    );
}

#[tokio::test]
async fn video_failure_keeps_article_and_caches_as_success() {
    let blog = MockServer::start().await;
    mount_blog(&blog, 1).await;
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&api)
        .await;

    let h = harness(Some(&api.uri()), &api.uri(), 5);
    let people = [commentator(
        1,
        Some(&blog.uri()),
        Some("https://www.youtube.com/@host"),
    )];

    let out = h.fetcher.fetch_latest(&people).await;
    let content = &out[&CommentatorId::Number(1)];
    assert!(content.video.is_none());
    let article = content.article.as_ref().expect("article");
    assert_eq!(article.title, "Latest essay");
    assert_eq!(article.url.as_deref(), Some("https://blog.test/p/latest"));

    // Non-empty payload: still served from cache well past the failure TTL.
    h.clock.advance(Duration::hours(23));
    let again = h.fetcher.fetch_latest(&people).await;
    assert_eq!(again[&CommentatorId::Number(1)], *content);
}

#[tokio::test]
async fn video_path_builds_thumbnail_and_watch_url() {
    let video = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feeds/videos.xml"))
        .and(query_param("channel_id", CHANNEL))
        .respond_with(ResponseTemplate::new(200).set_body_string(VIDEO_ATOM))
        .expect(1)
        .mount(&video)
        .await;

    let h = harness(None, &video.uri(), 5);
    let mut person = commentator(7, None, Some("https://www.youtube.com/@host"));
    person.youtube_channel_id = Some(CHANNEL.to_string());

    let out = h.fetcher.fetch_latest(&[person]).await;
    let latest = out[&CommentatorId::Number(7)].video.clone().expect("video");
    assert_eq!(latest.title, "Newest upload");
    assert_eq!(latest.video_id, "vid00000001");
    assert_eq!(
        latest.thumbnail_url,
        "https://i.ytimg.com/vi/vid00000001/mqdefault.jpg"
    );
    assert_eq!(latest.url, "https://www.youtube.com/watch?v=vid00000001");
    assert!(latest.published_at.is_some());
}

#[tokio::test]
async fn dead_video_feed_is_requested_once_without_fallback_paths() {
    let video = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&video)
        .await;

    let h = harness(None, &video.uri(), 5);
    let mut person = commentator(8, None, Some("https://www.youtube.com/@host"));
    person.youtube_channel_id = Some(CHANNEL.to_string());

    let out = h.fetcher.fetch_latest(&[person]).await;
    assert!(out[&CommentatorId::Number(8)].video.is_none());

    let requested: Vec<String> = video
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(requested, ["/feeds/videos.xml"]);
}

/// Memory slot that counts reads.
#[derive(Default)]
struct CountingSlot {
    inner: MemorySlot,
    reads: AtomicUsize,
}

impl SlotStorage for CountingSlot {
    fn read(&self) -> Result<Option<String>, ContentError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read()
    }

    fn write(&self, contents: &str) -> Result<(), ContentError> {
        self.inner.write(contents)
    }
}

#[tokio::test]
async fn partition_reads_the_cache_slot_once() {
    let clock = Arc::new(ManualClock::new(start()));
    let slot = Arc::new(CountingSlot::default());
    let cache = ContentCache::new(slot.clone(), clock);
    let article = LatestContent {
        video: None,
        article: Some(LatestArticle {
            title: "Cached".to_string(),
            url: None,
            published_at: None,
        }),
    };
    cache
        .set_many((1..=3).map(|i| (CommentatorId::Number(i), article.clone())))
        .await
        .unwrap();

    let locator = FeedLocator::new(5, "VoicesTest/1.0").unwrap();
    let fetcher = ContentFetcher::new(locator, resolver(None), cache, 5);
    let people: Vec<_> = (1..=4)
        .map(|i| commentator(i, Some("https://blog.test"), None))
        .collect();

    slot.reads.store(0, Ordering::SeqCst);
    let (cached, pending) = fetcher.partition(&people).await;
    assert_eq!(cached.len(), 3);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, CommentatorId::Number(4));
    assert_eq!(slot.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn entities_without_sources_are_skipped_entirely() {
    let h = harness(None, "http://127.0.0.1:9", 5);
    let people = [commentator(1, None, None), commentator(2, Some("  "), Some(""))];
    let out = h.fetcher.fetch_latest(&people).await;
    assert!(out.is_empty());
    assert!(h.fetcher.cache().live_entries().await.is_empty());
}

#[tokio::test]
async fn empty_results_are_cached_for_the_failure_ttl_only() {
    let blog = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&blog)
        .await;

    let h = harness(None, "http://127.0.0.1:9", 5);
    let people = [commentator(3, Some(&blog.uri()), None)];

    let first = h.fetcher.fetch_latest(&people).await;
    assert!(!first[&CommentatorId::Number(3)].has_content());
    let after_first = blog.received_requests().await.unwrap_or_default().len();
    assert_eq!(after_first, 5, "every candidate path tried once");

    h.clock.advance(Duration::minutes(30));
    h.fetcher.fetch_latest(&people).await;
    assert_eq!(
        blog.received_requests().await.unwrap_or_default().len(),
        after_first,
        "served from cache inside the failure TTL"
    );

    h.clock.advance(Duration::minutes(31));
    h.fetcher.fetch_latest(&people).await;
    assert_eq!(
        blog.received_requests().await.unwrap_or_default().len(),
        after_first * 2
    );
}

#[tokio::test]
async fn all_entities_are_fetched_across_batches() {
    let blog = MockServer::start().await;
    mount_blog(&blog, 5).await;

    let h = harness(None, "http://127.0.0.1:9", 2);
    let people: Vec<_> = (1..=5)
        .map(|i| commentator(i, Some(&blog.uri()), None))
        .collect();

    let out = h.fetcher.fetch_latest(&people).await;
    assert_eq!(out.len(), 5);
    assert!(out.values().all(|c| c.article.is_some()));
    assert_eq!(h.fetcher.cache().live_entries().await.len(), 5);
}

#[tokio::test]
async fn two_phase_read_serves_cache_then_refreshes_in_background() {
    let blog = MockServer::start().await;
    mount_blog(&blog, 1).await;

    let h = harness(None, "http://127.0.0.1:9", 5);
    let service = LatestContentService::new(h.fetcher.clone());
    let people = [commentator(1, Some(&blog.uri()), None)];

    let first = service.read(&people).await;
    assert!(first.refreshing);
    assert!(first.content.is_empty());

    let refreshed = service.wait_for_refresh().await.expect("refresh completes");
    assert_eq!(refreshed.len(), 1);

    let second = service.read(&people).await;
    assert!(!second.refreshing);
    assert_eq!(
        second.content["1"].article.as_ref().map(|a| a.title.as_str()),
        Some("Latest essay")
    );
}

#[tokio::test]
async fn only_one_refresh_runs_at_a_time() {
    let blog = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(BLOG_RSS)
                .set_delay(StdDuration::from_millis(300)),
        )
        .expect(1)
        .mount(&blog)
        .await;

    let h = harness(None, "http://127.0.0.1:9", 5);
    let service = LatestContentService::new(h.fetcher.clone());
    let people = [commentator(1, Some(&blog.uri()), None)];

    assert!(service.read(&people).await.refreshing);
    assert!(service.read(&people).await.refreshing);
    service.wait_for_refresh().await.expect("refresh completes");
}

#[tokio::test]
async fn aborted_refresh_writes_nothing() {
    let blog = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(BLOG_RSS)
                .set_delay(StdDuration::from_secs(3)),
        )
        .mount(&blog)
        .await;

    let h = harness(None, "http://127.0.0.1:9", 5);
    let service = LatestContentService::new(h.fetcher.clone());
    let people = [commentator(1, Some(&blog.uri()), None)];

    assert!(service.read(&people).await.refreshing);
    tokio::time::sleep(StdDuration::from_millis(100)).await;
    assert!(service.abort_refresh());
    tokio::time::sleep(StdDuration::from_millis(100)).await;

    assert!(h.fetcher.cache().live_entries().await.is_empty());
    assert!(service.wait_for_refresh().await.is_none());
}
