use std::time::Duration;

use voices_core::Commentator;
use voices_feeds::{ChannelPageScraper, SocialClient, YoutubeClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const CHANNEL: &str = "UCabcdefghijklmnopqrstuv";

fn with_video(id: u64, url: Option<String>) -> Commentator {
    let mut c = Commentator::new(id, &format!("Commentator {id}"), "");
    c.youtube_url = url;
    c
}

#[tokio::test]
async fn populate_fills_missing_ids_and_skips_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/@found"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><script>var x = {{"externalId":"{CHANNEL}"}};</script></html>"#
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/@missing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/@already"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut already = with_video(3, Some(format!("{}/@already", server.uri())));
    already.youtube_channel_id = Some("UCzzzzzzzzzzzzzzzzzzzzzz".to_string());
    let mut list = vec![
        with_video(1, Some(format!("{}/@found", server.uri()))),
        with_video(2, Some(format!("{}/@missing", server.uri()))),
        already,
        with_video(4, None),
        with_video(5, Some(format!("{}/@gone", server.uri()))),
    ];

    let scraper = ChannelPageScraper::new(5).unwrap();
    let found = populate_channel_ids(&mut list, &scraper, Duration::ZERO).await;

    assert_eq!(found, 1);
    assert_eq!(list[0].youtube_channel_id.as_deref(), Some(CHANNEL));
    assert_eq!(list[1].youtube_channel_id, None);
    assert_eq!(list[2].youtube_channel_id.as_deref(), Some("UCzzzzzzzzzzzzzzzzzzzzzz"));
    assert_eq!(list[4].youtube_channel_id, None);
}

#[tokio::test]
async fn followers_update_counts_and_preserve_on_failure() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", CHANNEL))
        .and(query_param("part", "statistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{ "statistics": { "subscriberCount": "5000" } }]
        })))
        .expect(1)
        .mount(&api)
        .await;

    let social = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live/twitter/user/ana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "followers": 1200 })))
        .expect(1)
        .mount(&social)
        .await;
    Mock::given(method("GET"))
        .and(path("/live/instagram/user/ana.gram"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&social)
        .await;

    let mut ana = Commentator::new(1_u64, "Ana", "30D");
    ana.youtube_channel_id = Some(CHANNEL.to_string());
    ana.x_url = Some("https://x.com/ana".to_string());
    ana.instagram_url = Some("https://instagram.com/ana.gram".to_string());
    ana.instagram_followers = Some(77);
    ana.youtube_subscribers = Some(1);
    let mut list = vec![ana, Commentator::new(2_u64, "Ben", "30R")];

    let youtube = YoutubeClient::with_base_url("yt-key", 5, &api.uri()).unwrap();
    let social_client = SocialClient::with_base_url("rk", "social.test", &social.uri(), 5).unwrap();

    let report = update_followers(
        &mut list,
        Some(&youtube),
        Some(&social_client),
        Duration::ZERO,
    )
    .await;

    assert_eq!(report, FollowerReport { youtube: 1, social: 1 });
    assert_eq!(list[0].youtube_subscribers, Some(5000));
    assert_eq!(list[0].x_followers, Some(1200));
    assert_eq!(list[0].instagram_followers, Some(77));
    assert_eq!(list[1], Commentator::new(2_u64, "Ben", "30R"));
}

#[tokio::test]
async fn followers_without_clients_change_nothing() {
    let mut ana = Commentator::new(1_u64, "Ana", "30D");
    ana.x_url = Some("https://x.com/ana".to_string());
    ana.x_followers = Some(10);
    let before = ana.clone();
    let mut list = vec![ana];

    let report = update_followers(&mut list, None, None, Duration::ZERO).await;

    assert_eq!(report, FollowerReport::default());
    assert_eq!(list[0], before);
}
