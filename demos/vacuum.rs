//! Vacuums up a user's recent timeline.
//!
//! Loads `tweetvac.cfg` from the working directory, or walks through the PIN flow and saves
//! the result when the file is missing. Then pages backwards through the timeline of the
//! screen name given as the first argument, keeping only original tweets, and prints one
//! line per tweet.

// std
use std::env;
// crates.io
use color_eyre::Result;
// self
use tweetvac::{
	fetch::{FetchRequest, ReqwestFetcher},
	helper::{ConsolePrompt, CredentialHelper},
	http::ReqwestTransport,
	store::CredentialStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let screen_name = env::args().nth(1).unwrap_or_else(|| "twitterapi".into());
	let mut store = CredentialStore::default();

	if store.load().is_err() {
		println!("No usable credentials in {}; starting the PIN flow.", store.location().display());

		let credentials =
			CredentialHelper::new().run(&ReqwestTransport::new(), &mut ConsolePrompt::stdio()).await?;

		store.set(credentials);
		store.save()?;
	}

	let mut fetcher = ReqwestFetcher::new(store)?;
	let request = FetchRequest::new("statuses/user_timeline")
		.param("screen_name", &screen_name)
		.param("count", 200)
		.filter(|tweet| tweet.get("retweeted_status").is_none())
		.max_requests(5);
	let tweets = fetcher.fetch(request).await?;

	for tweet in tweets.iter() {
		let text = tweet.get("text").and_then(|text| text.as_str()).unwrap_or_default();

		println!("{}: {}", tweet.id, text.replace('\n', " "));
	}

	println!(
		"Fetched {} tweets from @{screen_name} in {} requests ({}).",
		tweets.len(),
		tweets.requests,
		tweets.stop
	);

	if let Some(max_id) = tweets.next_max_id {
		println!("Resume with max_id={max_id}.");
	}
	if fetcher.hit_rate_limit() {
		println!("Stopped by the rate limit; try again after the window resets.");
	}

	Ok(())
}
