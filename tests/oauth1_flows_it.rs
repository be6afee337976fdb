mod common;

// self
use common::*;
use oauth_relay::{
	cache::MemoryCache,
	client::OAuthClient,
	error::{ConfigError, Error},
	flows::OAuth1,
	params::{Params, params},
};

const TEMPORARY: &str = "oauth_token=tmp&oauth_token_secret=tmp-secret&oauth_callback_confirmed=true";
const GRANTED: &str = "oauth_token=final&oauth_token_secret=final-secret&user_id=42&screen_name=ada";

fn engine(provider: &FakeProvider) -> OAuth1<FakeProvider> {
	OAuth1::new(config(
		endpoint_builder("twitter").build().expect("Endpoint fixture should build."),
		provider,
	))
}

#[tokio::test]
async fn handshake_and_exchange_sign_every_leg() {
	let provider = FakeProvider::new();
	let engine = engine(&provider);
	let cache = MemoryCache::default();

	provider.reply(200, "text/plain", TEMPORARY);

	let url = engine
		.authorize(Some("/home"), Some(&cache), Params::new())
		.await
		.expect("Authorize should run the handshake.");
	let query = query_of(&url);

	assert_eq!(query.get("oauth_token").map(String::as_str), Some("tmp"));
	assert_eq!(query.get("display").map(String::as_str), Some("page"));
	assert!(!query.contains_key("oauth_token_secret"));

	provider.reply(200, "application/x-www-form-urlencoded", GRANTED);

	let callback = params([("oauth_token", "tmp"), ("oauth_verifier", "verifier-1")]);
	let exchanged = engine
		.exchange::<String>(&callback, Some(&cache), Params::new())
		.await
		.expect("Exchange should succeed.");
	let token = exchanged.token;

	assert_eq!(exchanged.payload.as_deref(), Some("/home"));
	assert_eq!(token.access_token.expose(), "final");
	assert_eq!(token.token_secret.as_ref().map(|s| s.expose()), Some("final-secret"));
	assert_eq!(token.client_id, CLIENT_ID);
	assert_eq!(token.raw.get("user_id").and_then(|v| v.as_str()), Some("42"));
	assert!(!token.raw.contains_key("oauth_token"));

	let requests = provider.requests();
	let handshake = requests[0].authorization();
	let access = requests[1].authorization();

	assert_eq!(requests.len(), 2);
	assert_eq!(requests[0].method, "POST");
	assert_eq!(requests[0].uri, "https://provider.test/oauth/request_token");
	assert!(requests[0].body.is_empty());
	assert!(handshake.starts_with("OAuth oauth_callback=\"https%3A%2F%2Fapp.test%2Fcallback\", "));
	assert!(handshake.contains("oauth_consumer_key=\"client-id\""));
	assert!(handshake.contains("oauth_signature_method=\"HMAC-SHA1\""));
	assert!(!handshake.contains("oauth_token="));
	assert_eq!(requests[1].uri, "https://provider.test/oauth/token");
	assert!(access.contains("oauth_token=\"tmp\""));
	assert!(access.contains("oauth_verifier=\"verifier-1\""));
	assert!(access.contains("oauth_signature=\""));
	assert!(!requests[1].body.contains("oauth_token_secret"));

	let replay = engine
		.exchange::<String>(&callback, Some(&cache), Params::new())
		.await
		.expect_err("Replayed exchange should fail.");

	assert!(matches!(replay, Error::Denied));
	assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn exchange_without_cache_uses_the_supplied_secret() {
	let provider = FakeProvider::new();
	let engine = engine(&provider);

	provider.reply(200, "text/plain", GRANTED);

	let callback = params([("oauth_token", "tmp"), ("oauth_verifier", "verifier-1")]);
	let exchanged = engine
		.exchange::<()>(&callback, None, params([("oauth_token_secret", "tmp-secret")]))
		.await
		.expect("Exchange should succeed with a caller-held secret.");

	assert_eq!(exchanged.token.access_token.expose(), "final");
	assert!(exchanged.payload.is_none());

	let err = engine
		.exchange::<()>(&callback, None, Params::new())
		.await
		.expect_err("Exchanges without any token secret should fail.");

	assert!(matches!(err, Error::Denied));
	assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn missing_verifier_cancels() {
	let provider = FakeProvider::new();
	let engine = engine(&provider);
	let cache = MemoryCache::default();

	provider.reply(200, "text/plain", TEMPORARY);
	engine.authorize::<()>(None, Some(&cache), Params::new()).await.expect("Authorize should succeed.");

	let incomplete = params([("oauth_token", "tmp")]);
	let err = engine
		.exchange::<()>(&incomplete, Some(&cache), Params::new())
		.await
		.expect_err("Callbacks without a verifier should fail.");

	assert!(matches!(err, Error::Cancelled));

	let err = engine
		.exchange::<()>(&incomplete, None, Params::new())
		.await
		.expect_err("Callbacks without a verifier should fail without a cache too.");

	assert!(matches!(err, Error::Cancelled));
	assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn denied_callbacks_consume_the_record() {
	let provider = FakeProvider::new();
	let engine = engine(&provider);
	let cache = MemoryCache::default();

	provider.reply(200, "text/plain", TEMPORARY);
	engine.authorize::<()>(None, Some(&cache), Params::new()).await.expect("Authorize should succeed.");

	let err = engine
		.exchange::<()>(&params([("denied", "tmp")]), Some(&cache), Params::new())
		.await
		.expect_err("Denied callbacks should fail.");

	assert!(matches!(err, Error::Denied));
	assert_eq!(err.status(), 403);

	let err = engine
		.exchange::<()>(
			&params([("oauth_token", "tmp"), ("oauth_verifier", "late")]),
			Some(&cache),
			Params::new(),
		)
		.await
		.expect_err("The consumed record cannot be reused.");

	assert!(matches!(err, Error::Denied));

	let err = engine
		.exchange::<()>(&Params::new(), Some(&cache), Params::new())
		.await
		.expect_err("Empty callbacks should fail.");

	assert!(matches!(err, Error::Denied));
	assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn unconfirmed_callbacks_abort_the_handshake() {
	let provider = FakeProvider::new();
	let engine = engine(&provider);
	let cache = MemoryCache::default();

	provider
		.reply(200, "text/plain", "oauth_token=tmp&oauth_token_secret=tmp-secret")
		.reply(200, "text/plain", "oauth_token=tmp&oauth_callback_confirmed=true");

	let err = engine
		.authorize::<()>(None, Some(&cache), Params::new())
		.await
		.expect_err("Unconfirmed callbacks should fail.");

	assert!(matches!(err, Error::Handshake { .. }));
	assert_eq!(err.to_string(), "oauth_callback_confirmed was not true");
	assert_eq!(err.status(), 500);

	let err = engine
		.authorize::<()>(None, Some(&cache), Params::new())
		.await
		.expect_err("Missing secrets should fail.");

	assert_eq!(err.to_string(), "oauth_token_secret not string");
	assert!(cache.is_empty());
}

#[tokio::test]
async fn handshake_requires_a_request_token_url() {
	let provider = FakeProvider::new();
	let endpoint = oauth_relay::provider::Endpoint::builder(
		oauth_relay::auth::ProviderId::new("bare").expect("Provider identifier should be valid."),
	)
	.authorize_url(url("https://provider.test/authorize"))
	.access_token_url(url("https://provider.test/token"))
	.build()
	.expect("Endpoint fixture should build.");
	let engine = OAuth1::new(config(endpoint, &provider));
	let err = engine
		.authorize::<()>(None, None, Params::new())
		.await
		.expect_err("Handshakes need a request-token URL.");

	assert!(matches!(
		err,
		Error::Config(ConfigError::MissingEndpoint { endpoint: "request_token" })
	));
	assert!(provider.requests().is_empty());
}
