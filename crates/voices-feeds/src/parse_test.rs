use super::*;

fn rss(items: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Blog</title><link>https://example.com</link>{items}</channel></rss>"#
    )
}

#[test]
fn single_titled_item_gets_defaults() {
    let out = parse_articles("<item><title>Hello</title></item>", 5).unwrap();
    assert_eq!(
        out,
        vec![Article {
            title: "Hello".to_string(),
            description: String::new(),
            link: None,
            published_at: None,
            guid: None,
        }]
    );
}

#[test]
fn returns_min_of_titled_items_and_cap_in_source_order() {
    let items: String = (1..=8)
        .map(|i| format!("<item><title>Post {i}</title><link>https://example.com/{i}</link></item>"))
        .collect();
    let out = parse_articles(&rss(&items), 5).unwrap();
    let titles: Vec<_> = out.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, ["Post 1", "Post 2", "Post 3", "Post 4", "Post 5"]);

    let out = parse_articles(&rss(&items), 20).unwrap();
    assert_eq!(out.len(), 8);
}

#[test]
fn untitled_items_are_dropped_not_defaulted() {
    let items = "<item><link>https://example.com/a</link></item>\
                 <item><title>   </title></item>\
                 <item><title>Kept</title></item>";
    let out = parse_articles(&rss(items), 5).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].title, "Kept");
}

#[test]
fn channel_title_is_not_an_item() {
    let out = parse_feed(&rss(""), 5).unwrap();
    assert_eq!(out, ParsedFeed::Empty);
}

#[test]
fn cdata_html_is_stripped_and_trimmed() {
    let items = r#"<item>
        <title><![CDATA[ <b>Big</b> news ]]></title>
        <description><![CDATA[<p>First <em>paragraph</em>.</p>
            <p>Second&nbsp;one &amp; more</p>]]></description>
        <link> https://example.com/big </link>
    </item>"#;
    let out = parse_articles(&rss(items), 5).unwrap();
    assert_eq!(out[0].title, "Big news");
    assert_eq!(out[0].description, "First paragraph. Second one & more");
    assert_eq!(out[0].link.as_deref(), Some("https://example.com/big"));
}

#[test]
fn escaped_html_description_is_stripped() {
    let items = "<item><title>T</title><description>&lt;p&gt;Hi &lt;a href=\"x\"&gt;there&lt;/a&gt;&lt;/p&gt;</description></item>";
    let out = parse_articles(&rss(items), 5).unwrap();
    assert_eq!(out[0].description, "Hi there");
}

#[test]
fn description_is_capped_at_500_chars() {
    let long = "é".repeat(800);
    let items = format!("<item><title>T</title><description>{long}</description></item>");
    let out = parse_articles(&rss(&items), 5).unwrap();
    assert_eq!(out[0].description.chars().count(), DESCRIPTION_MAX_CHARS);
}

#[test]
fn rss_dates_parse_and_bad_dates_become_none() {
    let items = "<item><title>A</title><pubDate>Tue, 10 Jun 2025 14:30:00 GMT</pubDate></item>\
                 <item><title>B</title><pubDate>sometime last week</pubDate></item>";
    let out = parse_articles(&rss(items), 5).unwrap();
    assert_eq!(
        out[0].published_at.map(|d| d.to_rfc3339()),
        Some("2025-06-10T14:30:00+00:00".to_string())
    );
    assert_eq!(out[1].published_at, None);
}

#[test]
fn namespaced_children_do_not_clobber_fields() {
    let items = r#"<item>
        <title>Real title</title>
        <media:title>Media title</media:title>
        <atom:link href="https://example.com/self" rel="self"/>
        <link>https://example.com/real</link>
    </item>"#;
    let out = parse_articles(&rss(items), 5).unwrap();
    assert_eq!(out[0].title, "Real title");
    assert_eq!(out[0].link.as_deref(), Some("https://example.com/real"));
}

const ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:yt="http://www.youtube.com/xml/schemas/2015">
  <title>Channel</title>
  <entry>
    <id>yt:video:abc123DEF45</id>
    <yt:videoId>abc123DEF45</yt:videoId>
    <title>Newest video</title>
    <link rel="self" href="https://example.com/self"/>
    <link rel="alternate" href="https://www.youtube.com/watch?v=abc123DEF45"/>
    <published>2025-06-01T12:00:00+00:00</published>
    <updated>2025-06-02T08:00:00+00:00</updated>
    <content type="html">&lt;p&gt;Full body&lt;/p&gt;</content>
  </entry>
  <entry>
    <title type="html">Older</title>
    <link href="https://example.com/older"/>
    <summary>Short summary</summary>
    <content>Long content</content>
    <updated>2025-05-01T00:00:00Z</updated>
  </entry>
</feed>"#;

#[test]
fn atom_is_used_when_no_rss_items() {
    let out = parse_feed(ATOM, 5).unwrap();
    assert_eq!(out.kind(), Some(FeedKind::Atom));
    let articles = out.articles();
    assert_eq!(articles.len(), 2);

    assert_eq!(articles[0].title, "Newest video");
    assert_eq!(
        articles[0].link.as_deref(),
        Some("https://www.youtube.com/watch?v=abc123DEF45")
    );
    assert_eq!(articles[0].description, "Full body");
    assert_eq!(articles[0].guid.as_deref(), Some("yt:video:abc123DEF45"));
    assert_eq!(
        articles[0].published_at.map(|d| d.to_rfc3339()),
        Some("2025-06-01T12:00:00+00:00".to_string())
    );

    assert_eq!(articles[1].description, "Short summary");
    assert_eq!(articles[1].link.as_deref(), Some("https://example.com/older"));
    assert_eq!(
        articles[1].published_at.map(|d| d.to_rfc3339()),
        Some("2025-05-01T00:00:00+00:00".to_string())
    );
}

#[test]
fn rss_items_win_over_atom_entries() {
    let xml = "<root><entry><title>Atom</title></entry><item><title>Rss</title></item></root>";
    let out = parse_feed(xml, 5).unwrap();
    assert_eq!(out.kind(), Some(FeedKind::Rss));
    assert_eq!(out.articles()[0].title, "Rss");
}

#[test]
fn untitled_rss_items_fall_back_to_atom() {
    let xml = "<root><item><link>x</link></item><entry><title>Atom</title></entry></root>";
    let out = parse_feed(xml, 5).unwrap();
    assert_eq!(out.kind(), Some(FeedKind::Atom));
}

#[test]
fn truncated_document_keeps_records_read_so_far() {
    let xml = "<rss><channel><item><title>Survivor</title></item><item><title>Cut";
    let out = parse_articles(xml, 5).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].title, "Survivor");
}

#[test]
fn garbage_is_empty_or_error_never_panics() {
    for input in ["", "not xml at all", "<html><body>hi</body></html>", "<<<>>>"] {
        match parse_feed(input, 5) {
            Ok(feed) => assert!(feed.articles().is_empty(), "input = {input:?}"),
            Err(FeedError::Xml(_)) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
}

#[test]
fn bare_angle_brackets_in_text_are_kept() {
    let out = parse_articles(
        "<item><title><![CDATA[5 < 6 reasons to vote]]></title>\
         <description>x &lt; y and more text</description></item>",
        5,
    )
    .unwrap();
    assert_eq!(out[0].title, "5 < 6 reasons to vote");
    assert_eq!(out[0].description, "x < y and more text");
    assert_eq!(strip_html("a <b>bold</b> < c"), "a bold < c");
}

#[test]
fn strip_html_normalizes_whitespace() {
    assert_eq!(strip_html("<p>a\n\n  <br/>b</p>"), "a b");
}

#[test]
fn bare_dates_are_midnight_utc() {
    assert_eq!(
        parse_date("2025-01-15").map(|d| d.to_rfc3339()),
        Some("2025-01-15T00:00:00+00:00".to_string())
    );
    assert_eq!(parse_date(""), None);
}
