//! URL classifier behavior across content types, paths, extensions, and
//! query shapes.

use siteharvest::is_likely_content_url;

#[test]
fn accepts_blog_post() {
    assert!(is_likely_content_url("https://ex.com/blog/post-1", None));
}

#[test]
fn rejects_wp_admin() {
    assert!(!is_likely_content_url("https://ex.com/wp-admin/edit.php", None));
}

#[test]
fn rejects_stylesheet() {
    assert!(!is_likely_content_url("https://ex.com/style.css", None));
}

#[test]
fn rejects_six_query_parameters() {
    assert!(!is_likely_content_url(
        "https://ex.com/x?a=1&b=2&c=3&d=4&e=5&f=6",
        None
    ));
}

#[test]
fn content_type_gate() {
    assert!(is_likely_content_url("https://ex.com/p", Some("text/html")));
    assert!(is_likely_content_url(
        "https://ex.com/p",
        Some("text/html; charset=utf-8")
    ));
    assert!(is_likely_content_url("https://ex.com/p", Some("text/plain")));
    assert!(!is_likely_content_url("https://ex.com/p", Some("application/pdf")));
    assert!(!is_likely_content_url("https://ex.com/p", Some("image/png")));
}

#[test]
fn is_deterministic() {
    let cases = [
        ("https://ex.com/blog/post-1", None),
        ("https://ex.com/wp-admin/x", None),
        ("https://ex.com/a.json", Some("text/html")),
        ("not-a-url", None),
    ];
    for (url, ct) in cases {
        let first = is_likely_content_url(url, ct);
        for _ in 0..10 {
            assert_eq!(is_likely_content_url(url, ct), first, "flaky for {url}");
        }
    }
}

#[test]
fn system_segment_coverage() {
    for path in [
        "/wp-login",
        "/wp-includes/js",
        "/wp-json/wp/v2",
        "/login",
        "/logout",
        "/signin",
        "/signup",
        "/dashboard/home",
        "/panel",
        "/cpanel",
        "/node_modules/react",
        "/.git/config",
        "/.env",
        "/cgi-bin/run",
        "/rest/v2/items",
        "/graphql",
        "/rss",
        "/atom",
        "/cart",
        "/checkout",
        "/payment",
        "/ajax/load",
    ] {
        assert!(
            !is_likely_content_url(&format!("https://ex.com{path}"), None),
            "{path} should be rejected"
        );
    }
}

#[test]
fn extension_coverage() {
    for file in [
        "a.jpg", "a.jpeg", "a.png", "a.gif", "a.webp", "a.ico", "a.scss", "a.mjs", "a.docx",
        "a.zip", "a.tar", "a.gz", "a.mp4", "a.webm", "a.xml", "a.json", "a.txt", "a.csv",
        "a.woff2", "a.eot", "a.map",
    ] {
        assert!(
            !is_likely_content_url(&format!("https://ex.com/{file}"), None),
            "{file} should be rejected"
        );
    }
    for file in ["a.html", "a.htm", "about", "post-1"] {
        assert!(
            is_likely_content_url(&format!("https://ex.com/{file}"), None),
            "{file} should be accepted"
        );
    }
}
