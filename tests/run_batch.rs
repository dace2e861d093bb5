//! End-to-end tests of the library entry point against a mock server.

use httptest::{matchers::*, responders::*, Expectation, Server};
use tempfile::TempDir;

use urlup::{run_batch_until, Config};

#[tokio::test]
async fn test_input_file_to_csv() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/old"))
            .respond_with(status_code(301).insert_header("Location", "/new")),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/new")).respond_with(status_code(200)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/missing"))
            .respond_with(status_code(404)),
    );

    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("urls.txt");
    let output = dir.path().join("results.csv");
    std::fs::write(
        &input,
        format!(
            "# links to check\n{}\n\n{}\nftp://example.org/file\n",
            server.url_str("/old"),
            server.url_str("/missing")
        ),
    )
    .unwrap();

    let config = Config {
        input: Some(input),
        output: Some(output.clone()),
        quiet: true,
        use_keyring: false,
        ..Config::default()
    };
    let report = run_batch_until(config, std::future::pending()).await.unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 2);
    assert!(!report.interrupted);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], server.url_str("/old").as_str());
    assert_eq!(&rows[0][1], server.url_str("/new").as_str());
    assert_eq!(&rows[0][2], "301");
    assert_eq!(&rows[1][2], "404");
    assert_eq!(&rows[1][3], "No content found at this location");
    assert_eq!(&rows[2][0], "ftp://example.org/file");
    assert_eq!(&rows[2][3], "Unsupported network protocol");
}

#[tokio::test]
async fn test_urls_from_config() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/")).respond_with(status_code(200)),
    );

    let config = Config {
        urls: vec![format!("  {}  ", server.url_str("/")), "   ".to_string()],
        quiet: true,
        use_keyring: false,
        ..Config::default()
    };
    let report = run_batch_until(config, std::future::pending()).await.unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.results[0].original, server.url_str("/"));
    assert!(report.results[0].is_success());
}

#[tokio::test]
async fn test_multiple_proxies_fail_the_run() {
    let config = Config {
        urls: vec![
            "https://proxy.one.example.edu/login?url=https://a.org/".to_string(),
            "https://proxy.two.example.edu/login?url=https://b.org/".to_string(),
        ],
        quiet: true,
        use_keyring: false,
        ..Config::default()
    };
    let error = run_batch_until(config, std::future::pending())
        .await
        .unwrap_err();
    assert!(error.to_string().contains("Only one proxy host"), "{error}");
}
