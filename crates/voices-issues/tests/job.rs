//! Generation job and text-generation client tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use voices_content::{CommentatorArticles, ContentAggregator, LeanGroups, ManualClock};
use voices_core::{Bucket, Commentator};
use voices_feeds::{Article, FeedLocator};
use voices_issues::{
    AnthropicClient, GenerationOutcome, IssueStore, IssuesError, KeyIssuesJob, MemoryIssueStore,
    TextGenerator,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_OUTPUT: &str = r#"Here you go:
{"topics":[
  {"id":"budget","title":"Budget standoff","description":"Shutdown looms",
   "perspectives":{"left":{"summary":"Blame the majority","keyVoices":["Ana"]},
                   "center":{"summary":"Both sides","keyVoices":[]},
                   "right":{"summary":"Cut spending","keyVoices":["Ben"]}}},
  {"title":"Tariffs","description":"Prices"}
]}"#;

struct FakeGenerator {
    output: String,
    calls: AtomicUsize,
}

impl FakeGenerator {
    fn new(output: &str) -> Arc<Self> {
        Arc::new(Self {
            output: output.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, IssuesError> {
        assert!(prompt.contains("COMMENTATORS"));
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 6, 0, 0).unwrap()
}

fn article(title: &str) -> Article {
    Article {
        title: title.to_string(),
        description: format!("About {title}"),
        link: None,
        published_at: Some(now() - chrono::Duration::days(1)),
        guid: None,
    }
}

fn groups_with(left: usize, right: usize) -> LeanGroups {
    let entry = |name: &str, bucket: Bucket, count: usize| CommentatorArticles {
        id: name.into(),
        name: name.to_string(),
        score: String::new(),
        bucket,
        articles: (0..count).map(|i| article(&format!("{name} {i}"))).collect(),
    };
    LeanGroups {
        left: vec![entry("Ana", Bucket::Left, left)],
        center: Vec::new(),
        right: vec![entry("Ben", Bucket::Right, right)],
    }
}

struct Setup {
    job: KeyIssuesJob,
    store: Arc<MemoryIssueStore>,
}

fn setup(generator: Option<Arc<dyn TextGenerator>>) -> Setup {
    let clock = Arc::new(ManualClock::new(now()));
    let store = Arc::new(MemoryIssueStore::new(clock.clone()));
    let aggregator = ContentAggregator::new(FeedLocator::new(5, "VoicesTest/1.0").unwrap());
    let job = KeyIssuesJob::new(aggregator, generator, store.clone(), clock);
    Setup { job, store }
}

#[tokio::test]
async fn below_threshold_never_calls_generator() {
    let fake = FakeGenerator::new(MODEL_OUTPUT);
    let Setup { job, store } = setup(Some(fake.clone()));

    let outcome = job.generate_from_groups(&groups_with(2, 2)).await.unwrap();

    assert_eq!(outcome, GenerationOutcome::NotEnoughContent { articles_found: 4 });
    assert_eq!(fake.calls(), 0);
    assert_eq!(store.get().await.unwrap(), None);
}

#[tokio::test]
async fn enough_content_generates_and_stores() {
    let fake = FakeGenerator::new(MODEL_OUTPUT);
    let Setup { job, store } = setup(Some(fake.clone()));

    let outcome = job.generate_from_groups(&groups_with(3, 3)).await.unwrap();

    assert_eq!(
        outcome,
        GenerationOutcome::Generated {
            topics_generated: 2,
            generated_at: now()
        }
    );
    assert_eq!(fake.calls(), 1);

    let stored = store.get().await.unwrap().unwrap();
    assert_eq!(stored.generated_at, Some(now()));
    assert_eq!(stored.topics[0].id, "budget");
    assert_eq!(stored.topics[1].id, "topic-2");
    assert_eq!(stored.topics[0].perspectives.right.key_voices, ["Ben"]);
}

#[tokio::test]
async fn exactly_five_articles_is_enough() {
    let fake = FakeGenerator::new(MODEL_OUTPUT);
    let Setup { job, .. } = setup(Some(fake.clone()));

    let outcome = job.generate_from_groups(&groups_with(5, 0)).await.unwrap();

    assert!(matches!(outcome, GenerationOutcome::Generated { .. }));
}

#[tokio::test]
async fn missing_generator_fails_closed() {
    let Setup { job, store } = setup(None);

    let err = job.generate_from_groups(&groups_with(3, 3)).await.unwrap_err();

    assert!(matches!(err, IssuesError::MissingCredential("ANTHROPIC_API_KEY")));
    assert_eq!(store.get().await.unwrap(), None);
}

#[tokio::test]
async fn malformed_output_leaves_store_untouched() {
    let fake = FakeGenerator::new("I'd rather not.");
    let Setup { job, store } = setup(Some(fake));

    let err = job.generate_from_groups(&groups_with(3, 3)).await.unwrap_err();

    assert!(matches!(err, IssuesError::MalformedOutput(_)));
    assert_eq!(store.get().await.unwrap(), None);
}

#[tokio::test]
async fn run_aggregates_blog_feeds_before_generating() {
    let server = MockServer::start().await;
    let rss = r"<rss><channel>
<item><title>One</title></item><item><title>Two</title></item><item><title>Three</title></item>
</channel></rss>";
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss))
        .expect(2)
        .mount(&server)
        .await;

    let mut left = Commentator::new(1_u64, "Ana", "30D");
    left.substack_url = Some(server.uri());
    let mut right = Commentator::new(2_u64, "Ben", "30R");
    right.substack_url = Some(server.uri());
    let video_only = {
        let mut c = Commentator::new(3_u64, "Cy", "0");
        c.youtube_url = Some("https://www.youtube.com/@cy".to_string());
        c
    };

    let fake = FakeGenerator::new(MODEL_OUTPUT);
    let Setup { job, store } = setup(Some(fake.clone()));

    let outcome = job.run(&[left, right, video_only]).await.unwrap();

    assert!(matches!(outcome, GenerationOutcome::Generated { topics_generated: 2, .. }));
    assert_eq!(fake.calls(), 1);
    assert!(store.get().await.unwrap().is_some());
}

#[tokio::test]
async fn anthropic_client_sends_messages_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(serde_json::json!({
            "model": "claude-test",
            "max_tokens": 2000,
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "{\"topics\":[]}"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicClient::with_base_url("sk-test", "claude-test", &server.uri()).unwrap();

    assert_eq!(client.generate("hello").await.unwrap(), "{\"topics\":[]}");
}

#[tokio::test]
async fn anthropic_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = AnthropicClient::with_base_url("sk-test", "claude-test", &server.uri()).unwrap();
    let err = client.generate("hello").await.unwrap_err();

    assert!(
        matches!(err, IssuesError::Api { status: 529, ref body } if body == "overloaded"),
        "got {err:?}"
    );
}

#[test]
fn blank_api_key_is_rejected() {
    assert!(matches!(
        AnthropicClient::new("  ", "claude-test"),
        Err(IssuesError::MissingCredential(_))
    ));
}
