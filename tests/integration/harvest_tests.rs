//! Integration tests for the harvester
//!
//! These tests use wiremock to serve entry and series index pages and run
//! the full extraction pipeline end-to-end over HTTP.

use scp_harvest::config::{load_config_with_hash, Config};
use scp_harvest::output::{write_json_output, RunRange};
use scp_harvest::{EntryId, HarvestError, Harvester, StructureError};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.site.entry_base_url = format!("{}/scp-", base_url);
    config.site.series_base_url = format!("{}/scp-series", base_url);
    config.fetch.user_agent = "scp-harvest-test/1.0".to_string();
    config.fetch.timeout_secs = 5;
    config.fetch.max_retries = 1;
    config.fetch.backoff_ms = 10;
    config.batch.max_concurrent = 4;
    config
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn entry_page(padded: &str, class: &str, description: &str) -> String {
    format!(
        r#"<html><head><title>SCP-{padded}</title></head><body>
        <div id="main-content">
          <div id="page-content">
            <div class="scp-image-block">
              <img src="/local--files/scp-{padded}/scp-{padded}.jpg" alt="SCP-{padded}">
            </div>
            <img src="/common--images/banner.png" alt="banner">
            <p><strong>项目编号：</strong>SCP-{padded}</p>
            <p><strong>项目等级：</strong>{class}</p>
            <p><strong>特殊收容措施：</strong>保存在标准收容柜中。</p>
            <p><strong>描述：</strong>{description}</p>
            <h2>附录{padded}-1</h2>
            <p>补充记录。</p>
          </div>
          <div class="page-tags"><span>
            <a href="/system:page-tags/tag/scp">scp</a>
            <a href="/system:page-tags/tag/{tag}">{tag}</a>
            <a href="/system:page-tags/tag/object">object</a>
          </span></div>
        </div>
        </body></html>"#,
        padded = padded,
        class = class,
        description = description,
        tag = class.to_lowercase(),
    )
}

fn series_page() -> String {
    r#"<html><body><div id="page-content">
        <ul>
          <li><a href="/scp-001">SCP-001</a> - 提案</li>
          <li><a href="/scp-002">SCP-002</a> - 活体房间</li>
          <li><a href="/scp-003">SCP-003</a> - 生物主板</li>
        </ul>
        </div></body></html>"#
        .to_string()
}

#[tokio::test]
async fn test_full_harvest_with_failing_entry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/scp-001"))
        .respond_with(html(entry_page("001", "Thaumiel", "第一个条目。")))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Retryable failure: one initial attempt plus one retry
    Mock::given(method("GET"))
        .and(path("/scp-002"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/scp-003"))
        .respond_with(html(entry_page("003", "Euclid", "第三个条目。")))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Shared by every entry of series 1
    Mock::given(method("GET"))
        .and(path("/scp-series"))
        .respond_with(html(series_page()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let harvester = Harvester::from_config(&config).expect("Failed to build harvester");
    let outcome = harvester.run(1, 3).await.expect("Run failed");

    assert_eq!(outcome.records.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(outcome.failed_ids, vec![2]);
    assert!(!outcome.cancelled);
    assert_eq!(harvester.series_cache().len(), 1);

    let first = &outcome.records[&1];
    assert_eq!(first.id, "SCP-001");
    assert_eq!(first.series, 1);
    assert_eq!(first.name.as_deref(), Some("提案"));
    assert_eq!(first.class.as_deref(), Some("Thaumiel"));
    assert_eq!(first.containment.as_deref(), Some("保存在标准收容柜中。"));
    assert_eq!(first.description.as_deref(), Some("第一个条目。"));
    assert_eq!(
        first.images,
        vec![format!("{}/local--files/scp-001/scp-001.jpg", base_url)]
    );
    assert_eq!(first.tags.iter().collect::<Vec<_>>(), vec!["object"]);
    assert_eq!(first.more_info.get("附录001-1"), Some("补充记录。"));
    assert!(first.missing_fields.is_empty());
    assert!(first.warning.is_none());

    assert_eq!(outcome.records[&3].name.as_deref(), Some("生物主板"));

    // Persist and read back the output document
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output_path = dir.path().join("scp_database_cn.json");
    write_json_output(&outcome, RunRange { start: 1, end: 3 }, "test-hash", &output_path)
        .expect("Failed to write output");

    let text = std::fs::read_to_string(&output_path).expect("Failed to read output");
    assert!(text.contains("第一个条目"));

    let value: serde_json::Value = serde_json::from_str(&text).expect("Invalid JSON");
    assert_eq!(value["config_hash"], "test-hash");
    assert_eq!(value["failed_ids"], serde_json::json!([2]));
    assert_eq!(value["records"]["3"]["class"], "Euclid");
    assert!(value["records"].get("2").is_none());
}

#[tokio::test]
async fn test_unreachable_series_index_degrades_to_no_name() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/scp-1001"))
        .respond_with(html(entry_page("1001", "Safe", "第二系列的条目。")))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/scp-series-2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let harvester = Harvester::from_config(&config).expect("Failed to build harvester");

    let id = EntryId::new(1001).unwrap();
    let record = harvester.extract_one(id).await.expect("Extraction failed");

    assert_eq!(record.id, "SCP-1001");
    assert_eq!(record.series, 2);
    assert!(record.name.is_none());
    assert_eq!(record.class.as_deref(), Some("Safe"));
    assert!(harvester.series_cache().peek(2).is_none());
}

#[tokio::test]
async fn test_page_without_content_container_fails_entry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/scp-005"))
        .respond_with(html(
            "<html><body><div id=\"main-content\"><p>页面不存在</p></div></body></html>"
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/scp-series"))
        .respond_with(html(series_page()))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let harvester = Harvester::from_config(&config).expect("Failed to build harvester");

    let result = harvester.extract_one(EntryId::new(5).unwrap()).await;
    assert!(matches!(
        result,
        Err(HarvestError::Structure(StructureError::ContentContainerMissing))
    ));

    let outcome = harvester.run(5, 5).await.expect("Run failed");
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.failed_ids, vec![5]);
}

#[tokio::test]
async fn test_not_found_entry_is_not_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/scp-004"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let harvester = Harvester::from_config(&config).expect("Failed to build harvester");

    match harvester.extract_one(EntryId::new(4).unwrap()).await {
        Err(HarvestError::Transport(e)) => {
            assert_eq!(e.status, Some(404));
            assert!(!e.retryable);
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_harvest_from_config_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/scp-002"))
        .respond_with(html(entry_page("002", "Keter", "第二个条目。")))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/scp-series"))
        .respond_with(html(series_page()))
        .mount(&mock_server)
        .await;

    let toml = format!(
        r#"
[site]
entry-base-url = "{base}/scp-"
series-base-url = "{base}/scp-series"

[fetch]
max-retries = 0

[batch]
start-id = 2
end-id = 2
max-concurrent = 1

[extract]
excluded-tags = ["scp", "keter", "object"]
"#,
        base = base_url
    );
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(toml.as_bytes()).unwrap();
    file.flush().unwrap();

    let (config, hash) = load_config_with_hash(Some(file.path())).expect("Failed to load config");
    assert_eq!(hash.len(), 64);

    let harvester = Harvester::from_config(&config).expect("Failed to build harvester");
    let outcome = harvester
        .run(config.batch.start_id, config.batch.end_id)
        .await
        .expect("Run failed");

    let record = &outcome.records[&2];
    assert_eq!(record.name.as_deref(), Some("活体房间"));
    assert_eq!(record.class.as_deref(), Some("Keter"));
    assert!(record.tags.is_empty());
}
