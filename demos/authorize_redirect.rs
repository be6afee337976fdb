//! Runs one OAuth 2.0 redirect round trip against a local mock provider: build the authorize
//! URL, store the correlation record, then exchange the simulated callback for a token.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth_relay::{
	auth::ProviderId,
	cache::MemoryCache,
	client::OAuthClient,
	config::Config,
	flows::OAuth2,
	params::{Params, params, parse_query},
	provider::Endpoint,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900,\"scope\":\"read write\"}",
			);
		})
		.await;
	let endpoint = Endpoint::builder(ProviderId::new("demo-provider")?)
		.authorize_url(Url::parse(&server.url("/authorize"))?)
		.access_token_url(Url::parse(&server.url("/token"))?)
		.scope_separator(" ")
		.build()?;
	let engine = OAuth2::new(
		Config::new(endpoint, "demo-client")
			.with_client_secret("demo-secret")
			.with_redirect_uri("https://app.example.com/oauth/callback")
			.with_scopes(["read", "write"]),
	);
	let cache = MemoryCache::default();
	let redirect = engine.authorize(Some("/dashboard"), Some(&cache), Params::new()).await?;

	println!("Send your user to {redirect}.");

	let state =
		redirect.query().map(parse_query).unwrap_or_default().remove("state").unwrap_or_default();
	let callback = params([("code", "demo-code"), ("state", state.as_str())]);
	let exchanged = engine.exchange::<String>(&callback, Some(&cache), Params::new()).await?;

	println!(
		"Access token {} expires at {:?}; return to {:?}.",
		exchanged.token.access_token.expose(),
		exchanged.token.expires_at,
		exchanged.payload
	);

	token_mock.assert_async().await;

	Ok(())
}
