//! End-to-end tests of the HTTP transport against a mock IPUMS API.
//!
//! The client is blocking, so every call runs on `spawn_blocking` while the
//! mock server lives on the async runtime.

use nhgis_extract::{
    ApiConfig, DatasetRequest, ErrorKind, ExtractClient, ExtractRequest, ExtractStatus,
    GeogLevels, MetadataClient, TimeSeriesRequest,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn config(server: &MockServer) -> ApiConfig {
    ApiConfig::builder(API_KEY)
        .base_url(server.uri())
        .timeout_secs(5)
        .build()
        .expect("valid config")
}

fn dataset_metadata() -> serde_json::Value {
    json!({
        "name": "1990_STF1",
        "description": "STF 1 - 100% Data",
        "data_tables": [
            {"name": "NP1", "nhgis_code": "ET1", "description": "Persons"},
            {"name": "NP2", "nhgis_code": "ET2", "description": "Families"}
        ],
        "geog_levels": [
            {"name": "state", "description": "State", "has_geog_extent_selection": false},
            {"name": "blck_grp", "description": "Block Group", "has_geog_extent_selection": true}
        ]
    })
}

async fn mount_dataset(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/metadata/nhgis/datasets/1990_STF1"))
        .and(query_param("version", "v1"))
        .and(header("authorization", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(dataset_metadata()))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dataset_selection_over_http() {
    let server = MockServer::start().await;
    mount_dataset(&server).await;
    let config = config(&server);

    let selection = tokio::task::spawn_blocking(move || {
        let metadata = MetadataClient::from_config(&config)?;
        DatasetRequest::new("1990_STF1")
            .with_data_tables(["NP1"])
            .with_geog_levels(["blck_grp"])
            .validate(&metadata)
    })
    .await
    .expect("blocking task")
    .expect("valid selection");

    assert!(selection.extent_required());
    assert_eq!(
        selection.to_payload(),
        json!({
            "1990_STF1": {
                "years": [],
                "breakdown_values": [],
                "data_tables": ["NP1"],
                "geog_levels": ["blck_grp"]
            }
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_metadata_error_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/nhgis/datasets/1990_STF1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let config = config(&server);

    let err = tokio::task::spawn_blocking(move || {
        let metadata = MetadataClient::from_config(&config)?;
        DatasetRequest::new("1990_STF1")
            .with_data_tables(["NP1"])
            .with_geog_levels(["state"])
            .validate(&metadata)
    })
    .await
    .expect("blocking task")
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    let message = err.to_string();
    assert!(message.contains("403"));
    assert!(message.contains("Forbidden"));
    assert!(message.contains("https://account.ipums.org/api_keys"));
    assert!(message.contains("https://developer.ipums.org/docs/get-started/"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_submit_and_poll() {
    let server = MockServer::start().await;
    mount_dataset(&server).await;

    Mock::given(method("GET"))
        .and(path("/metadata/nhgis/time_series_tables/A00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "A00",
            "geog_levels": [{"name": "nation"}, {"name": "state"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/extracts/"))
        .and(query_param("product", "nhgis"))
        .and(query_param("version", "v1"))
        .and(header("authorization", API_KEY))
        .and(body_json(json!({
            "datasets": {
                "1990_STF1": {
                    "years": [],
                    "breakdown_values": [],
                    "data_tables": ["NP1"],
                    "geog_levels": ["blck_grp"]
                }
            },
            "time_series_tables": {"A00": {"geog_levels": ["nation"]}},
            "time_series_table_layout": "time_by_column_layout",
            "geographic_extents": ["*"],
            "data_format": "csv_no_header",
            "breakdown_and_data_type_layout": "separate_files",
            "description": "integration test"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"number": 17, "status": "queued"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/extracts/17"))
        .and(query_param("product", "nhgis"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"number": 17, "status": "started"})),
        )
        .mount(&server)
        .await;

    let config = config(&server);
    let (number, status) = tokio::task::spawn_blocking(move || {
        let mut client = ExtractClient::from_config(&config)?;
        let dataset = DatasetRequest::new("1990_STF1")
            .with_data_tables(["NP1"])
            .with_geog_levels(["blck_grp"])
            .validate(client.metadata())?;
        let table = TimeSeriesRequest::new("A00")
            .with_geog_levels(GeogLevels::macro_level())
            .validate(client.metadata())?;

        let request = ExtractRequest::new()
            .dataset(dataset)
            .time_series_table(table)
            .description("integration test");
        client.create_extract(&request)?;

        let number = client.last_extract().map(ToString::to_string);
        let status = client.status(None)?;
        Ok::<_, nhgis_extract::ExtractError>((number, status))
    })
    .await
    .expect("blocking task")
    .expect("submission succeeds");

    assert_eq!(number.as_deref(), Some("17"));
    assert_eq!(status, ExtractStatus::Started);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_shapefile_never_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/nhgis/shapefiles"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([
                {"name": "us_state_1990_tl2008", "year": "1990", "geographic_level": "State"}
            ])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"number": 1})))
        .expect(0)
        .mount(&server)
        .await;

    let config = config(&server);
    let err = tokio::task::spawn_blocking(move || {
        let mut client = ExtractClient::from_config(&config)?;
        client.create_extract(
            &ExtractRequest::new().shapefiles(["us_state_1990_tl2008", "us_county_1890"]),
        )
    })
    .await
    .expect("blocking task")
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedValue);
    assert!(err.to_string().contains("us_county_1890"));
}
