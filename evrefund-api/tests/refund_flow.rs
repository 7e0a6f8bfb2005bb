use chrono::NaiveDate;
use evrefund_api::{
    ApiError, BatchOptions, ClientOptions, HeaderProfile, PortalClient, endpoints, run_refunds,
};
use evrefund_core::{BillQuery, Credentials, DateWindow, QueryFilter, RunOutcome, WindowStrategy};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn creds(server: &MockServer) -> Credentials {
    Credentials::new(server.uri(), "ops@example.com", "5f4dcc3b5aa765d61d8327deb882cf99")
        .with_seller_number("S-001")
        .with_cookie("cookie-abc")
}

fn query() -> BillQuery {
    let window = DateWindow::resolve(WindowStrategy::SinceYesterday, run_date());
    BillQuery::new(&QueryFilter::default(), &window)
}

fn opts() -> BatchOptions {
    BatchOptions::new("auto-refund", run_date())
}

async fn mount_login(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path(endpoints::LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path(endpoints::BILL_PAGE))
        .and(header("authorization", "tok_abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_refund(server: &MockServer, status: u16, calls: u64) {
    Mock::given(method("POST"))
        .and(path(endpoints::BILL_REFUND))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"code": 0, "msg": "ok"})))
        .expect(calls)
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, p: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == p)
        .collect()
}

fn cookie_header(r: &Request) -> String {
    r.headers
        .get("cookie")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default()
}

fn client(server: &MockServer) -> PortalClient {
    PortalClient::new(&creds(server), ClientOptions::default()).unwrap()
}

#[tokio::test]
async fn test_refunds_only_positive_bills() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    mount_page(
        &server,
        json!({"totalCount": 2, "data": [{"id": 501, "actualMoney": 100}, {"id": 502, "actualMoney": 0}]}),
    )
    .await;
    mount_refund(&server, 200, 1).await;

    let outcome = run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RunOutcome {
            success: 1,
            failed: 0,
            skipped: 1
        }
    );

    let refunds = requests_to(&server, endpoints::BILL_REFUND).await;
    assert_eq!(refunds.len(), 1);
    let body: Value = refunds[0].body_json().unwrap();
    assert_eq!(
        body,
        json!({
            "billId": 501,
            "memberId": null,
            "refundMoney": 100,
            "note": "auto-refund-501-20261017",
            "refundPowerDiscount": 0
        })
    );
    assert_eq!(refunds[0].headers.get("authorization").unwrap(), "tok_abc123");
}

#[tokio::test]
async fn test_rejected_refund_counts_as_failure() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    mount_page(
        &server,
        json!({"totalCount": 2, "data": [{"id": 501, "actualMoney": 100}, {"id": 502, "actualMoney": 0}]}),
    )
    .await;
    mount_refund(&server, 500, 1).await;

    let outcome = run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap();
    assert_eq!(outcome.success, 0);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.skipped, 1);
}

#[tokio::test]
async fn test_failures_do_not_stop_the_batch() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    mount_page(
        &server,
        json!({"totalCount": 3, "data": [
            {"id": 1, "actualMoney": 10},
            {"id": 2, "actualMoney": 20},
            {"id": 3, "actualMoney": 30}
        ]}),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(endpoints::BILL_REFUND))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_refund(&server, 200, 2).await;

    let outcome = run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RunOutcome {
            success: 2,
            failed: 1,
            skipped: 0
        }
    );

    // Received order, one call per bill.
    let ids: Vec<i64> = requests_to(&server, endpoints::BILL_REFUND)
        .await
        .iter()
        .map(|r| r.body_json::<Value>().unwrap()["billId"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_empty_token_aborts_before_fetch() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "", "msg": "captcha required"})).await;
    Mock::given(method("POST"))
        .and(path(endpoints::BILL_PAGE))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_refund(&server, 200, 0).await;

    let err = run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MissingToken));
}

#[tokio::test]
async fn test_missing_data_field_is_auth_failure() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"code": 401})).await;

    let err = client(&server).login(&creds(&server)).await.unwrap_err();
    assert!(matches!(err, ApiError::MissingToken));
}

#[tokio::test]
async fn test_login_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::LOGIN))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;
    mount_refund(&server, 200, 0).await;

    let err = run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    assert!(err.to_string().contains("bad credentials"));
}

#[tokio::test]
async fn test_login_request_shape() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;

    let session = client(&server).login(&creds(&server)).await.unwrap();
    assert_eq!(session.token(), "tok_abc123");

    let logins = requests_to(&server, endpoints::LOGIN).await;
    assert_eq!(logins.len(), 1);
    let login = &logins[0];
    assert_eq!(
        login.body_json::<Value>().unwrap(),
        json!({
            "account": "ops@example.com",
            "password": "5f4dcc3b5aa765d61d8327deb882cf99",
            "sellerNumber": "S-001",
            "smsCaptchaPass": true
        })
    );
    assert!(cookie_header(login).contains("LIFF_STORE=cookie-abc"));
    assert_eq!(login.headers.get("origin").unwrap().to_str().unwrap(), server.uri());
    assert_eq!(
        login.headers.get("referer").unwrap().to_str().unwrap(),
        format!("{}/login", server.uri())
    );
    assert!(login.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_fetch_failure_processes_nothing() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    Mock::given(method("POST"))
        .and(path(endpoints::BILL_PAGE))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    mount_refund(&server, 200, 0).await;

    let outcome = run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::default());
}

#[tokio::test]
async fn test_malformed_page_processes_nothing() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    mount_page(&server, json!({"totalCount": 1, "data": {"id": 501}})).await;
    mount_refund(&server, 200, 0).await;

    let outcome = run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap();
    assert_eq!(outcome.total(), 0);
}

#[tokio::test]
async fn test_query_body_and_headers() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    mount_page(&server, json!({"totalCount": 0, "data": []})).await;

    run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap();

    let pages = requests_to(&server, endpoints::BILL_PAGE).await;
    assert_eq!(pages.len(), 1);
    let body: Value = pages[0].body_json().unwrap();
    assert_eq!(body["timeS"], "2026-10-16 00:00:00");
    assert_eq!(body["timeE"], "2026-10-17 23:59:59");
    assert_eq!(body["billStatus"], json!([14]));
    assert_eq!(body["stationIds"], json!([1227]));
    assert_eq!(body["pageSize"], 50);
    assert!(cookie_header(&pages[0]).contains("LIFF_STORE=cookie-abc"));
}

#[tokio::test]
async fn test_tally_covers_every_bill() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    mount_page(
        &server,
        json!({"totalCount": 7, "data": [
            {"id": 10, "actualMoney": 150},
            {"id": 11, "actualMoney": 0},
            {"id": 12, "actualMoney": null},
            {"actualMoney": 40},
            {"id": "not-a-number", "actualMoney": 40},
            {"id": "13", "actualMoney": 75},
            {"id": 14, "actualMoney": -3}
        ]}),
    )
    .await;
    mount_refund(&server, 200, 2).await;

    let outcome = run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap();
    assert_eq!(outcome.total(), 7);
    assert_eq!(outcome.success, 2);
    assert_eq!(outcome.failed, 0);
    assert!(outcome.skipped >= 2);
    assert_eq!(outcome.skipped, 5);
}

#[tokio::test]
async fn test_null_total_count_still_refunds() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    mount_page(
        &server,
        json!({"totalCount": null, "data": [{"id": 601, "actualMoney": 80}]}),
    )
    .await;
    mount_refund(&server, 200, 1).await;

    let outcome = run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RunOutcome {
            success: 1,
            failed: 0,
            skipped: 0
        }
    );
}

#[tokio::test]
async fn test_non_object_entries_are_skipped_not_fatal() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    mount_page(
        &server,
        json!({"totalCount": 3, "data": [null, {"id": 1, "actualMoney": 10}, 5]}),
    )
    .await;
    mount_refund(&server, 200, 1).await;

    let outcome = run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RunOutcome {
            success: 1,
            failed: 0,
            skipped: 2
        }
    );
    assert_eq!(outcome.total(), 3);
}

#[tokio::test]
async fn test_dry_run_never_refunds() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    mount_page(
        &server,
        json!({"totalCount": 2, "data": [{"id": 501, "actualMoney": 100}, {"id": 502, "actualMoney": 0}]}),
    )
    .await;
    mount_refund(&server, 200, 0).await;

    let outcome = run_refunds(
        &client(&server),
        &creds(&server),
        &query(),
        &opts().with_dry_run(true),
    )
    .await
    .unwrap();
    assert_eq!(outcome.skipped, 2);
    assert_eq!(outcome.success, 0);
}

#[tokio::test]
async fn test_login_cookies_are_replayed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::LOGIN))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "SESSIONID=xyz789; Path=/")
                .set_body_json(json!({"data": "tok_abc123"})),
        )
        .mount(&server)
        .await;
    mount_page(&server, json!({"totalCount": 0, "data": null})).await;

    run_refunds(&client(&server), &creds(&server), &query(), &opts())
        .await
        .unwrap();

    let pages = requests_to(&server, endpoints::BILL_PAGE).await;
    let cookies = cookie_header(&pages[0]);
    assert!(cookies.contains("SESSIONID=xyz789"));
    assert!(cookies.contains("LIFF_STORE=cookie-abc"));
}

#[tokio::test]
async fn test_browser_profile_headers() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"data": "tok_abc123"})).await;
    mount_page(&server, json!({"totalCount": 0, "data": []})).await;

    let options = ClientOptions {
        header_profile: HeaderProfile::Browser,
        ..ClientOptions::default()
    };
    let client = PortalClient::new(&creds(&server), options).unwrap();
    run_refunds(&client, &creds(&server), &query(), &opts())
        .await
        .unwrap();

    let pages = requests_to(&server, endpoints::BILL_PAGE).await;
    let headers = &pages[0].headers;
    assert_eq!(
        headers.get("referer").unwrap().to_str().unwrap(),
        format!("{}/Operation/ChargingOrder/OrderManagement", server.uri())
    );
    assert_eq!(headers.get("accept-language").unwrap().to_str().unwrap(), "zh-TW");
    assert!(headers.get("user-agent").unwrap().to_str().unwrap().contains("Chrome/144"));
}
