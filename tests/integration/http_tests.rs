//! Full crawl over HTTP against a wiremock server

use crate::common::{listing_page, product_page, review_page, test_config};
use review_harvest::crawler::run_crawl_until;
use review_harvest::output::StopReason;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_over_http() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_html(&server, "/list", listing_page(&[1, 2], Some("/list/2"))).await;
    mount_html(&server, "/list/2", listing_page(&[3], Some("disabled"))).await;

    mount_html(&server, "/p/1", product_page(1)).await;
    mount_html(
        &server,
        "/r/1",
        review_page(1, &[5, 4], Some("/r/1/page/2")),
    )
    .await;
    mount_html(&server, "/r/1/page/2", review_page(1, &[3], Some("disabled"))).await;

    // product 2 is down
    Mock::given(method("GET"))
        .and(path("/p/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    mount_html(&server, "/p/3", product_page(3)).await;
    mount_html(&server, "/r/3", review_page(3, &[2], None)).await;

    let products_path = dir.path().join("out/products_skipped{skip}.csv");
    let reviews_path = dir.path().join("out/reviews_skipped{skip}.csv");
    let output = format!(
        "products-path = \"{}\"\nreviews-path = \"{}\"",
        products_path.display(),
        reviews_path.display()
    );
    let config = test_config(&format!("{}/list", server.uri()), "", &output);

    let report = run_crawl_until(config, std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.items_extracted, 2);
    assert_eq!(report.items_failed, 1);
    assert_eq!(report.reviews_extracted, 4);
    assert_eq!(report.stop, Some(StopReason::LastPage));

    let products_file = dir.path().join("out/products_skipped0.csv");
    let mut products = csv::Reader::from_path(&products_file).unwrap();
    let headers: Vec<String> = products
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(
        headers,
        vec!["name", "model", "sku_model", "price", "savings", "comp_value"]
    );
    let names: Vec<String> = products
        .records()
        .map(|r| r.unwrap()[0].to_string())
        .collect();
    assert_eq!(names, vec!["Product 1", "Product 3"]);

    let reviews_file = dir.path().join("out/reviews_skipped0.csv");
    let mut reviews = csv::Reader::from_path(&reviews_file).unwrap();
    let headers = reviews.headers().unwrap().clone();
    assert_eq!(&headers[0], "product_name");
    assert_eq!(&headers[2], "review_index");
    assert_eq!(&headers[5], "review_title");

    let rows: Vec<(String, String, String)> = reviews
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[2].to_string(), r[4].to_string())
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Product 1".to_string(), "1".to_string(), "5".to_string()),
            ("Product 1".to_string(), "2".to_string(), "4".to_string()),
            ("Product 1".to_string(), "3".to_string(), "3".to_string()),
            ("Product 3".to_string(), "1".to_string(), "2".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_unreachable_start_page_reports_start_failure() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let output = format!(
        "products-path = \"{}\"\nreviews-path = \"{}\"",
        dir.path().join("p.csv").display(),
        dir.path().join("r.csv").display()
    );
    let config = test_config(&format!("{}/missing", server.uri()), "", &output);

    let report = run_crawl_until(config, std::future::pending::<()>())
        .await
        .unwrap();

    assert!(matches!(report.stop, Some(StopReason::StartFailed(_))));
    assert!(!dir.path().join("p.csv").exists());
}
