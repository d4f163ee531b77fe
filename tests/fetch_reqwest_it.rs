// crates.io
use httpmock::prelude::*;
// self
use tweetvac::{
	_preludet::*,
	error::{AuthError, Error, HttpError},
	fetch::{FetchRequest, StopReason},
};

const TIMELINE: &str = "/1.1/statuses/user_timeline.json";

#[tokio::test]
async fn pages_backwards_with_max_id() {
	let server = MockServer::start_async().await;
	let first = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(TIMELINE)
				.query_param("screen_name", "cash")
				.query_param_missing("max_id")
				.header_exists("authorization");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"[{"id":120,"text":"newest"},{"id":100,"text":"older"}]"#);
		})
		.await;
	let second = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(TIMELINE)
				.query_param("screen_name", "cash")
				.query_param("max_id", "99");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let mut fetcher = build_reqwest_test_fetcher(&server.base_url());
	let set = fetcher
		.fetch(FetchRequest::new("statuses/user_timeline").param("screen_name", "cash"))
		.await
		.expect("Paginated fetch should succeed.");

	first.assert_async().await;
	second.assert_async().await;
	assert_eq!(set.iter().map(|item| item.id).collect::<Vec<_>>(), vec![120, 100]);
	assert_eq!(set[1].get("text").and_then(|text| text.as_str()), Some("older"));
	assert_eq!(set.stop, StopReason::Exhausted);
}

#[tokio::test]
async fn too_many_requests_keeps_earlier_pages() {
	let server = MockServer::start_async().await;
	let _first = server
		.mock_async(|when, then| {
			when.method(GET).path(TIMELINE).query_param_missing("max_id");
			then.status(200).header("content-type", "application/json").body(r#"[{"id":10}]"#);
		})
		.await;
	let _limited = server
		.mock_async(|when, then| {
			when.method(GET).path(TIMELINE).query_param("max_id", "9");
			then.status(429)
				.header("retry-after", "900")
				.body(r#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#);
		})
		.await;
	let mut fetcher = build_reqwest_test_fetcher(&server.base_url());
	let set = fetcher
		.fetch(FetchRequest::new("statuses/user_timeline"))
		.await
		.expect("Rate limiting should not fail the fetch.");

	assert_eq!(set.len(), 1);
	assert!(fetcher.hit_rate_limit());
	assert_eq!(
		fetcher.last_response().and_then(|meta| meta.retry_after),
		Some(Duration::seconds(900))
	);
}

#[tokio::test]
async fn remaining_budget_header_stops_early() {
	let server = MockServer::start_async().await;
	let page = server
		.mock_async(|when, then| {
			when.method(GET).path(TIMELINE);
			then.status(200)
				.header("content-type", "application/json")
				.header("x-rate-limit-remaining", "0")
				.header("x-rate-limit-reset", "4102444800")
				.body(r#"[{"id":5},{"id":4}]"#);
		})
		.await;
	let mut fetcher = build_reqwest_test_fetcher(&server.base_url());
	let set = fetcher
		.fetch(FetchRequest::new("statuses/user_timeline"))
		.await
		.expect("Fetch should succeed.");

	page.assert_async().await;
	assert_eq!(set.len(), 2);
	assert_eq!(set.stop, StopReason::RateLimited);
	assert_eq!(set.next_max_id, Some(3));
	assert!(fetcher.hit_rate_limit());
}

#[tokio::test]
async fn unauthorized_is_an_auth_error() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path(TIMELINE);
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"errors":[{"code":89,"message":"Invalid or expired token."}]}"#);
		})
		.await;
	let mut fetcher = build_reqwest_test_fetcher(&server.base_url());
	let err = fetcher
		.fetch(FetchRequest::new("statuses/user_timeline"))
		.await
		.expect_err("Rejected token should fail the fetch.");

	assert!(matches!(
		err,
		Error::Auth(AuthError::Rejected { status: Some(401), ref reason })
			if reason == "Invalid or expired token."
	));
}

#[tokio::test]
async fn server_error_is_an_http_error() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path(TIMELINE);
			then.status(503).body("Service Unavailable");
		})
		.await;
	let mut fetcher = build_reqwest_test_fetcher(&server.base_url());
	let err = fetcher
		.fetch(FetchRequest::new("statuses/user_timeline"))
		.await
		.expect_err("Unavailable service should fail the fetch.");

	assert!(matches!(err, Error::Http(HttpError::Status { status: 503, .. })));
	assert!(!fetcher.hit_rate_limit());
}

#[tokio::test]
async fn search_endpoint_unwraps_statuses() {
	let server = MockServer::start_async().await;
	let first = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/1.1/search/tweets.json")
				.query_param("q", "#rustlang")
				.query_param_missing("max_id");
			then.status(200).header("content-type", "application/json").body(
				r#"{"statuses":[{"id":31},{"id":30}],"search_metadata":{"count":2}}"#,
			);
		})
		.await;
	let second = server
		.mock_async(|when, then| {
			when.method(GET).path("/1.1/search/tweets.json").query_param("max_id", "29");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"statuses":[],"search_metadata":{"count":0}}"#);
		})
		.await;
	let mut fetcher = build_reqwest_test_fetcher(&server.base_url());
	let set = fetcher
		.fetch(FetchRequest::new("search/tweets").param("q", "#rustlang"))
		.await
		.expect("Search fetch should succeed.");

	first.assert_async().await;
	second.assert_async().await;
	assert_eq!(set.into_items().len(), 2);
}
