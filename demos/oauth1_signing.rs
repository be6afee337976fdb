//! Signs an API request with HMAC-SHA1 the way an OAuth 1.0a provider expects and prints the
//! resulting `Authorization` header.

// crates.io
use color_eyre::Result;
// self
use oauth_relay::{
	auth::{ProviderId, Token},
	config::Config,
	flows::OAuth1,
	http::{Method, Request, header},
	provider::Endpoint,
	url::Url,
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let endpoint = Endpoint::builder(ProviderId::new("twitter")?)
		.request_token_url(Url::parse("https://api.twitter.com/oauth/request_token")?)
		.authorize_url(Url::parse("https://api.twitter.com/oauth/authenticate")?)
		.access_token_url(Url::parse("https://api.twitter.com/oauth/access_token")?)
		.build()?;
	let engine = OAuth1::new(
		Config::new(endpoint, "xvz1evFS4wEEPTGEFPHBog")
			.with_client_secret("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"),
	);
	let token = Token::builder("370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb")
		.token_secret("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE")
		.build()?;
	let mut request = Request::builder()
		.method(Method::GET)
		.uri("https://api.twitter.com/1.1/account/verify_credentials.json")
		.body(Vec::new())?;

	engine.signature_at(
		&mut request,
		Some(&token),
		None,
		1318622958,
		"kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
	)?;

	println!("Authorization: {}", request.headers()[header::AUTHORIZATION].to_str()?);

	Ok(())
}
