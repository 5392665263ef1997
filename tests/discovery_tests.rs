//! Discovery over a canned site map.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{article_html, body_of_length, FakePage, FakePageSource};
use siteharvest::config::CrawlConfig;
use siteharvest::crawl::{discover, run_discovery};
use siteharvest::embed::DEFAULT_EMBEDDING_DIMENSION;
use siteharvest::is_likely_content_url;
use siteharvest::model::{JobStatus, KnowledgeBase, ScrapeJob};
use siteharvest::store::memory::MemoryStore;
use siteharvest::store::{JobStore, KnowledgeBaseStore};
use uuid::Uuid;

fn page(body_len: usize) -> String {
    article_html("page", &body_of_length(body_len))
}

fn three_page_site() -> FakePageSource {
    FakePageSource::new()
        .with_page(
            "https://site.test/",
            FakePage::html(page(600)).with_hrefs(&["/a", "/b"]),
        )
        .with_page(
            "https://site.test/a",
            FakePage::html(page(600)).with_hrefs(&["/b", "https://other.test/x"]),
        )
        .with_page("https://site.test/b", FakePage::html(page(600)))
}

async fn seeded_job(store: &MemoryStore, max_pages: usize) -> ScrapeJob {
    let kb = store
        .create_knowledge_base(KnowledgeBase::new(Uuid::new_v4(), "t"))
        .await
        .unwrap();
    store
        .create_job(ScrapeJob::new(
            "https://site.test/".to_string(),
            kb.id,
            Uuid::new_v4(),
            max_pages,
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn three_page_site_discovers_all_and_stays_on_origin() {
    let source = three_page_site();
    let config = CrawlConfig::default();

    let outcome = discover(&source, &config, "https://site.test/", 50, None)
        .await
        .unwrap();

    let expected: BTreeSet<String> = ["https://site.test/", "https://site.test/a", "https://site.test/b"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(outcome.urls, expected);
    assert!(!outcome.urls.iter().any(|u| u.contains("other.test")));
}

#[tokio::test]
async fn results_all_pass_the_classifier_and_share_origin() {
    let source = FakePageSource::new().with_page(
        "https://site.test/",
        FakePage::html(page(600)).with_hrefs(&[
            "/blog/post",
            "/wp-admin/index.php",
            "/logo.png",
            "/docs#section",
            "mailto:x@site.test",
        ]),
    );
    let outcome = discover(&source, &CrawlConfig::default(), "https://site.test/", 50, None)
        .await
        .unwrap();

    assert!(outcome.urls.contains("https://site.test/"));
    for url in &outcome.urls {
        assert!(url.starts_with("https://site.test/"), "left origin: {url}");
        assert!(is_likely_content_url(url, None), "classifier fails: {url}");
        assert!(!url.contains('#'), "fragment kept: {url}");
    }
    assert!(outcome.urls.contains("https://site.test/blog/post"));
    assert!(outcome.urls.contains("https://site.test/docs"));
    assert!(!outcome.urls.contains("https://site.test/wp-admin/index.php"));
}

#[tokio::test]
async fn page_cap_bounds_the_crawl() {
    // A chain of pages each linking to the next.
    let mut source = FakePageSource::new();
    for i in 0..30 {
        let url = if i == 0 {
            "https://site.test/".to_string()
        } else {
            format!("https://site.test/p{i}")
        };
        let next = format!("/p{}", i + 1);
        source = source.with_page(&url, FakePage::html(page(600)).with_hrefs(&[next.as_str()]));
    }

    let outcome = discover(&source, &CrawlConfig::default(), "https://site.test/", 5, None)
        .await
        .unwrap();
    assert_eq!(outcome.pages_visited, 5);
    assert!(outcome.urls.len() <= 6);
}

#[tokio::test]
async fn single_page_failure_does_not_abort_discovery() {
    let source = FakePageSource::new()
        .with_page(
            "https://site.test/",
            FakePage::html(page(600)).with_hrefs(&["/dead", "/alive"]),
        )
        .with_failing("https://site.test/dead")
        .with_page("https://site.test/alive", FakePage::html(page(600)));

    let outcome = discover(&source, &CrawlConfig::default(), "https://site.test/", 50, None)
        .await
        .unwrap();
    // The dead URL stays discovered; discovery itself carries on.
    assert!(outcome.urls.contains("https://site.test/dead"));
    assert!(outcome.urls.contains("https://site.test/alive"));
}

#[tokio::test]
async fn non_html_content_type_is_not_expanded() {
    let source = FakePageSource::new()
        .with_page(
            "https://site.test/",
            FakePage::html(page(600)).with_hrefs(&["/data"]),
        )
        .with_page(
            "https://site.test/data",
            FakePage::html("").with_content_type("application/json").with_hrefs(&["/hidden"]),
        );

    let outcome = discover(&source, &CrawlConfig::default(), "https://site.test/", 50, None)
        .await
        .unwrap();
    assert!(!outcome.urls.contains("https://site.test/hidden"));
}

#[tokio::test]
async fn script_urls_are_discovered() {
    let html = format!(
        "<html><body><article><p>{}</p></article>\
         <script>const next = \"/from-script\"; fetch('https://site.test/also-script');</script>\
         </body></html>",
        body_of_length(600)
    );
    let source = FakePageSource::new()
        .with_page("https://site.test/", FakePage::html(html))
        .with_page("https://site.test/from-script", FakePage::html(page(600)))
        .with_page("https://site.test/also-script", FakePage::html(page(600)));

    let outcome = discover(&source, &CrawlConfig::default(), "https://site.test/", 50, None)
        .await
        .unwrap();
    assert!(outcome.urls.contains("https://site.test/from-script"));
    assert!(outcome.urls.contains("https://site.test/also-script"));
}

#[tokio::test]
async fn run_discovery_moves_job_to_pending_with_urls() {
    let store = Arc::new(MemoryStore::new(DEFAULT_EMBEDDING_DIMENSION));
    let job = seeded_job(&store, 0).await;
    let source = three_page_site();

    run_discovery(&source, &CrawlConfig::default(), store.clone(), job.id)
        .await
        .unwrap();

    let job = store.find_job(job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.discovered_urls.len(), 3);
    assert_eq!(job.total_urls, 3);
    assert!(job.discovered_urls.contains("https://site.test/"));
}

#[tokio::test]
async fn browser_failure_degrades_to_pending_with_base_url() {
    let store = Arc::new(MemoryStore::new(DEFAULT_EMBEDDING_DIMENSION));
    let job = seeded_job(&store, 0).await;
    let source = FakePageSource::new().with_browser_down();

    run_discovery(&source, &CrawlConfig::default(), store.clone(), job.id)
        .await
        .unwrap();

    let job = store.find_job(job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(
        job.discovered_urls,
        BTreeSet::from(["https://site.test/".to_string()])
    );
}

#[tokio::test]
async fn progress_is_written_in_batches() {
    // A hub page linking to 25 targets forces at least two progress writes
    // before the final transition.
    let hrefs: Vec<String> = (0..25).map(|i| format!("/t{i}")).collect();
    let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
    let mut source = FakePageSource::new().with_page(
        "https://site.test/",
        FakePage::html(page(600)).with_hrefs(&href_refs),
    );
    for href in &hrefs {
        source = source.with_page(
            &format!("https://site.test{href}"),
            FakePage::html(page(600)),
        );
    }

    let store = Arc::new(MemoryStore::new(DEFAULT_EMBEDDING_DIMENSION));
    let job = seeded_job(&store, 0).await;

    let config = CrawlConfig::default();
    let outcome = discover(
        &source,
        &config,
        "https://site.test/",
        3,
        Some((job.id, store.clone() as Arc<dyn JobStore>)),
    )
    .await
    .unwrap();
    assert_eq!(outcome.urls.len(), 26);

    // Progress was flushed while the job was still DISCOVERING.
    let job = store.find_job(job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Discovering);
    assert!(job.total_urls >= 20, "expected batched progress, saw {}", job.total_urls);
}
