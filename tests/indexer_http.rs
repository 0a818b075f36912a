// HTTP adapters against a local mock server.
//
// Run with: cargo test --test indexer_http

use chrono::{TimeZone, Utc};
use ethers::types::Address;
use rootstock_identity_sdk::error::SourceError;
use rootstock_identity_sdk::holding_period::{max_holding_days, reconstruct, TransactionLog};
use rootstock_identity_sdk::indexers::blockscout::blockscout_client;
use rootstock_identity_sdk::indexers::{DirectNameIndexer, RegistrationEvidenceIndexer, TransactionHistory};
use rootstock_identity_sdk::name_resolution::NameIndexer;
use rootstock_identity_sdk::paginated_indexer::BackoffPolicy;
use rootstock_identity_sdk::price_cache::{CoinGeckoQuoteSource, QuoteSource};
use rootstock_identity_sdk::types::{IdentitySource, NameMatch};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";
const REGISTRAR: &str = "0xd9c79ced86ecf49f5e4a973594634c83197c35ab";
const STAKING: &str = "0x5db91e24bd32059584bbdb831a901f1199f3d459";
const TX_PATH: &str = "/api/v2/addresses/0x1111111111111111111111111111111111111111/transactions";

fn account() -> Address {
    ACCOUNT.parse().unwrap()
}

fn tx(method: &str, to: &str, timestamp: &str) -> serde_json::Value {
    json!({
        "hash": "0xabc",
        "method": method,
        "to": { "hash": to },
        "timestamp": timestamp,
        "status": "ok"
    })
}

fn first_page() -> serde_json::Value {
    json!({
        "items": [tx("depositAndDelegate", STAKING, "2024-01-10T00:00:00Z")],
        "next_page_params": { "block_number": 5794523, "index": 3, "items_count": 50 }
    })
}

fn second_page() -> serde_json::Value {
    json!({
        "items": [
            tx("register", REGISTRAR, "2023-06-01T00:00:00Z"),
            tx("withdraw", STAKING, "2023-05-01T00:00:00Z")
        ],
        "next_page_params": null
    })
}

fn http() -> reqwest::Client {
    reqwest::Client::new()
}

/// Mounts page two before page one: the page-one matcher would also accept the
/// cursor request, and mocks are tried in mount order.
async fn mount_second_page(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(TX_PATH))
        .and(query_param("index", "3"))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_first_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(TX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_history_follows_cursor_and_retries_failed_page() {
    let server = MockServer::start().await;

    // First attempt at page two fails, the retry succeeds.
    Mock::given(method("GET"))
        .and(path(TX_PATH))
        .and(query_param("index", "3"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_second_page(&server, ResponseTemplate::new(200).set_body_json(second_page())).await;
    mount_first_page(&server).await;

    let client = blockscout_client(http(), &server.uri(), 0, BackoffPolicy::none()).unwrap();
    let history = TransactionHistory::new(client, 3);

    let events = history.events(account()).await;
    // oldest-first
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].method, "withdraw");
    assert_eq!(events[2].method, "depositAndDelegate");
}

#[tokio::test]
async fn test_history_is_partial_when_budget_runs_out() {
    let server = MockServer::start().await;
    mount_second_page(&server, ResponseTemplate::new(500)).await;
    mount_first_page(&server).await;

    let client = blockscout_client(http(), &server.uri(), 0, BackoffPolicy::none()).unwrap();
    let history = TransactionHistory::new(client, 2);

    let events = history.events(account()).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].method, "depositAndDelegate");

    // 1 first page + 3 attempts at page two (initial + 2 retries)
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_all_null_cursor_ends_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [tx("depositAndDelegate", STAKING, "2024-01-10T00:00:00Z")],
            "next_page_params": { "block_number": null, "index": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = blockscout_client(http(), &server.uri(), 0, BackoffPolicy::none()).unwrap();
    let history = TransactionHistory::new(client, 3);

    let events = tokio::time::timeout(std::time::Duration::from_secs(5), history.events(account()))
        .await
        .expect("history traversal must terminate");
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_newest_first_same_second_restake_stays_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                tx("depositAndDelegate", STAKING, "2024-04-10T00:00:00Z"),
                tx("withdrawTo", STAKING, "2024-04-10T00:00:00Z"),
                tx("depositAndDelegate", STAKING, "2024-01-01T00:00:00Z")
            ],
            "next_page_params": null
        })))
        .mount(&server)
        .await;

    let client = blockscout_client(http(), &server.uri(), 0, BackoffPolicy::none()).unwrap();
    let events = TransactionHistory::new(client, 3).events(account()).await;
    let intervals = reconstruct(&events, STAKING.parse().unwrap());

    let restaked = Utc.with_ymd_and_hms(2024, 4, 10, 0, 0, 0).unwrap();
    assert_eq!(intervals.len(), 2);
    assert!(intervals[1].is_open());
    assert_eq!(intervals[1].start, Some(restaked));
    let now = restaked + chrono::Duration::days(200);
    assert_eq!(max_holding_days(&intervals, now), 200);
}

#[tokio::test]
async fn test_registration_evidence_stops_at_matching_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [tx("register", REGISTRAR, "2023-06-01T00:00:00Z")],
            "next_page_params": { "index": 3 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = blockscout_client(http(), &server.uri(), 0, BackoffPolicy::none()).unwrap();
    let indexer = RegistrationEvidenceIndexer::new(client, vec![REGISTRAR.parse().unwrap()], 3);

    assert_eq!(indexer.source(), IdentitySource::IndexerB);
    assert_eq!(indexer.lookup(account()).await.unwrap(), NameMatch::Inferred);
}

#[tokio::test]
async fn test_registration_evidence_walks_all_pages() {
    let server = MockServer::start().await;
    mount_second_page(&server, ResponseTemplate::new(200).set_body_json(second_page())).await;
    mount_first_page(&server).await;

    let client = blockscout_client(http(), &server.uri(), 0, BackoffPolicy::none()).unwrap();

    let found = RegistrationEvidenceIndexer::new(client.clone(), vec![REGISTRAR.parse().unwrap()], 3);
    assert_eq!(found.lookup(account()).await.unwrap(), NameMatch::Inferred);

    let other: Address = "0x2222222222222222222222222222222222222222".parse().unwrap();
    let missing = RegistrationEvidenceIndexer::new(client, vec![other], 3);
    assert_eq!(missing.lookup(account()).await.unwrap(), NameMatch::NoMatch);
}

#[tokio::test]
async fn test_registration_evidence_reports_exhausted_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TX_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = blockscout_client(http(), &server.uri(), 0, BackoffPolicy::none()).unwrap();
    let indexer = RegistrationEvidenceIndexer::new(client, vec![REGISTRAR.parse().unwrap()], 1);

    match indexer.lookup(account()).await {
        Err(SourceError::RetriesExhausted { retries, .. }) => assert_eq!(retries, 1),
        other => panic!("expected exhausted retries, got {:?}", other),
    }
}

#[tokio::test]
async fn test_direct_name_lookup_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/names"))
        .and(query_param("address", ACCOUNT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "name": "alice.rsk", "address": ACCOUNT }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/names"))
        .and(query_param("address", "0x2222222222222222222222222222222222222222"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/names"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let template = format!("{}/names?address={{address}}", server.uri());
    let indexer = DirectNameIndexer::new(http(), template, IdentitySource::IndexerA, 0).unwrap();

    assert_eq!(
        indexer.lookup(account()).await.unwrap(),
        NameMatch::Named("alice.rsk".to_string())
    );
    assert_eq!(
        indexer
            .lookup("0x2222222222222222222222222222222222222222".parse().unwrap())
            .await
            .unwrap(),
        NameMatch::NoMatch
    );
    let err = indexer
        .lookup("0x3333333333333333333333333333333333333333".parse().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "upstream");
}

#[tokio::test]
async fn test_coingecko_quote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .and(query_param("ids", "rif-token"))
        .and(query_param("vs_currencies", "usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rif-token": { "usd": 0.0812 } })))
        .mount(&server)
        .await;

    let source = CoinGeckoQuoteSource::new(http(), format!("{}/simple/price", server.uri()), "rif-token");
    assert_eq!(source.fetch_usd().await.unwrap(), 0.0812);
}

#[tokio::test]
async fn test_coingecko_rejects_rate_limit_and_bad_prices() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("ids", "limited"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("ids", "zero"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "zero": { "usd": 0.0 } })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("ids", "absent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let url = format!("{}/simple/price", server.uri());
    for token in ["limited", "zero", "absent"] {
        let source = CoinGeckoQuoteSource::new(http(), url.clone(), token);
        assert!(source.fetch_usd().await.is_err(), "{} should fail", token);
    }
}
