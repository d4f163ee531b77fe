//! Interactive PIN-based acquisition of a full credential tuple.
//!
//! The operator supplies the consumer pair (or it is passed in), opens the authorization
//! page, and types back the PIN the service shows. The resulting tuple is returned, never
//! persisted; hand it to [`crate::store::CredentialStore::set`] to keep it.

// std
use std::io::{self, BufRead, StdinLock, Stdout, Write};
// self
use crate::{
	_prelude::*,
	auth::{ConsumerPair, Credentials},
	error::AuthError,
	http::{CallError, TokenExchange},
	obs::{self, OpSpan, Operation, Outcome},
};

/// Shown before asking for a consumer pair the helper was not given.
pub const REGISTRATION_NOTICE: &str =
	"Register this application with Twitter at https://dev.twitter.com/apps";

/// Line-oriented operator interaction.
pub trait Prompt {
	/// Shows `question` and returns the operator's answer without the line terminator.
	fn ask(&mut self, question: &str) -> io::Result<String>;

	/// Shows an informational message.
	fn notify(&mut self, message: &str) -> io::Result<()>;
}

/// [`Prompt`] over any buffered reader and writer; [`ConsolePrompt::stdio`] uses the
/// terminal.
#[derive(Debug)]
pub struct ConsolePrompt<R, W> {
	input: R,
	output: W,
}
impl ConsolePrompt<StdinLock<'static>, Stdout> {
	/// Prompts on stdout and reads answers from stdin.
	pub fn stdio() -> Self {
		Self::new(io::stdin().lock(), io::stdout())
	}
}
impl<R, W> ConsolePrompt<R, W>
where
	R: BufRead,
	W: Write,
{
	/// Wraps the provided streams.
	pub fn new(input: R, output: W) -> Self {
		Self { input, output }
	}

	/// Returns the wrapped streams.
	pub fn into_inner(self) -> (R, W) {
		(self.input, self.output)
	}
}
impl<R, W> Prompt for ConsolePrompt<R, W>
where
	R: BufRead,
	W: Write,
{
	fn ask(&mut self, question: &str) -> io::Result<String> {
		self.output.write_all(question.as_bytes())?;
		self.output.flush()?;

		let mut line = String::new();

		if self.input.read_line(&mut line)? == 0 {
			return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed before an answer"));
		}

		Ok(line.trim_end_matches(['\r', '\n']).to_owned())
	}

	fn notify(&mut self, message: &str) -> io::Result<()> {
		writeln!(self.output, "{message}")?;

		self.output.flush()
	}
}

/// Walks the operator through the out-of-band PIN flow.
#[derive(Clone, Default)]
pub struct CredentialHelper {
	consumer_key: Option<String>,
	consumer_secret: Option<String>,
}
impl CredentialHelper {
	/// Helper that asks for both halves of the consumer pair.
	pub fn new() -> Self {
		Self::default()
	}

	/// Helper that starts from a known consumer pair; nothing is asked for it.
	pub fn with_consumer(key: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { consumer_key: Some(key.into()), consumer_secret: Some(secret.into()) }
	}

	/// Supplies only the consumer key; the secret is still asked for.
	pub fn consumer_key(mut self, key: impl Into<String>) -> Self {
		self.consumer_key = Some(key.into());

		self
	}

	/// Supplies only the consumer secret; the key is still asked for.
	pub fn consumer_secret(mut self, secret: impl Into<String>) -> Self {
		self.consumer_secret = Some(secret.into());

		self
	}

	/// Runs the flow and returns the full credential tuple.
	///
	/// Fails with [`AuthError::Rejected`] when the service refuses the consumer pair or the
	/// PIN, with [`Error::Http`] on transport failures, and with [`Error::Prompt`] when the
	/// console cannot be read or written.
	pub async fn run<E, P>(&self, exchange: &E, prompt: &mut P) -> Result<Credentials>
	where
		E: TokenExchange,
		P: Prompt,
	{
		if self.consumer_key.is_none() || self.consumer_secret.is_none() {
			prompt.notify(REGISTRATION_NOTICE).map_err(Error::Prompt)?;
		}

		let consumer = ConsumerPair::new(
			answer_or_ask(self.consumer_key.as_deref(), prompt, "Enter your consumer key: ")?,
			answer_or_ask(self.consumer_secret.as_deref(), prompt, "Enter your consumer secret: ")?,
		);
		let request = exchange_step(
			Operation::RequestToken,
			exchange.request_token(&consumer),
			"invalid consumer key or consumer secret",
		)
		.await?;

		prompt
			.notify(&format!(
				"Go to the following link in your browser and authorize this application:\n{}\n",
				request.authorize_url
			))
			.map_err(Error::Prompt)?;

		let pin = prompt.ask("What is the PIN? ").map_err(Error::Prompt)?;
		let access = exchange_step(
			Operation::AccessToken,
			exchange.access_token(&consumer, &request.pair, pin.trim()),
			"invalid PIN",
		)
		.await?;

		Ok(consumer.with_token(access))
	}
}
impl Debug for CredentialHelper {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialHelper")
			.field("has_consumer_key", &self.consumer_key.is_some())
			.field("has_consumer_secret", &self.consumer_secret.is_some())
			.finish()
	}
}

fn answer_or_ask<P>(known: Option<&str>, prompt: &mut P, question: &str) -> Result<String>
where
	P: Prompt,
{
	match known {
		Some(value) => Ok(value.to_owned()),
		None => prompt.ask(question).map(|answer| answer.trim().to_owned()).map_err(Error::Prompt),
	}
}

async fn exchange_step<T, Fut>(op: Operation, call: Fut, rejection: &str) -> Result<T>
where
	Fut: Future<Output = Result<T, CallError>>,
{
	let span = OpSpan::new(op, "exchange");

	obs::record_outcome(op, Outcome::Attempt);

	let result = span.instrument(call).await.map_err(|e| match e {
		CallError::Unauthorized { status, .. } =>
			AuthError::Rejected { status: Some(status), reason: rejection.to_owned() }.into(),
		CallError::RateLimited { .. } =>
			AuthError::Rejected { status: None, reason: "rate limit exceeded".into() }.into(),
		CallError::Failed(e) => Error::from(e),
	});

	obs::record_outcome(op, if result.is_ok() { Outcome::Success } else { Outcome::Failure });

	result
}

#[cfg(test)]
mod tests {
	// std
	use std::{collections::VecDeque, io::Cursor};
	// crates.io
	use url::Url;
	// self
	use super::*;
	use crate::{
		auth::TokenPair,
		error::HttpError,
		http::{RequestToken, TransportFuture},
	};

	#[derive(Default)]
	struct ScriptedPrompt {
		answers: VecDeque<String>,
		questions: Vec<String>,
		notices: Vec<String>,
	}
	impl ScriptedPrompt {
		fn answering(answers: &[&str]) -> Self {
			Self { answers: answers.iter().map(|a| (*a).to_owned()).collect(), ..Default::default() }
		}
	}
	impl Prompt for ScriptedPrompt {
		fn ask(&mut self, question: &str) -> io::Result<String> {
			self.questions.push(question.to_owned());
			self.answers
				.pop_front()
				.ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
		}

		fn notify(&mut self, message: &str) -> io::Result<()> {
			self.notices.push(message.to_owned());

			Ok(())
		}
	}

	#[derive(Clone, Copy)]
	enum Reject {
		Nothing,
		Consumer,
		Pin,
		Network,
	}

	struct FakeExchange {
		reject: Reject,
		seen: Mutex<Vec<String>>,
	}
	impl FakeExchange {
		fn new(reject: Reject) -> Self {
			Self { reject, seen: Mutex::new(Vec::new()) }
		}
	}
	impl TokenExchange for FakeExchange {
		fn request_token<'a>(&'a self, consumer: &'a ConsumerPair) -> TransportFuture<'a, RequestToken> {
			Box::pin(async move {
				self.seen.lock().push(format!("request:{}", consumer.key.expose()));

				match self.reject {
					Reject::Consumer =>
						Err(CallError::Unauthorized { status: 401, message: "bad key".into() }),
					Reject::Network => Err(HttpError::Status { status: 503, message: "down".into() }.into()),
					_ => Ok(RequestToken {
						pair: TokenPair::new("req-token", "req-secret"),
						authorize_url: Url::parse(
							"https://api.twitter.com/oauth/authenticate?oauth_token=req-token",
						)
						.expect("Fixture URL should parse."),
					}),
				}
			})
		}

		fn access_token<'a>(
			&'a self,
			_consumer: &'a ConsumerPair,
			request: &'a TokenPair,
			pin: &'a str,
		) -> TransportFuture<'a, TokenPair> {
			Box::pin(async move {
				self.seen.lock().push(format!("access:{}:{pin}", request.token.expose()));

				match self.reject {
					Reject::Pin => Err(CallError::Unauthorized { status: 401, message: "bad pin".into() }),
					_ => Ok(TokenPair::new("access-token", "access-secret")),
				}
			})
		}
	}

	#[tokio::test]
	async fn asks_for_missing_consumer_pair_and_returns_tuple() {
		let exchange = FakeExchange::new(Reject::Nothing);
		let mut prompt = ScriptedPrompt::answering(&["ck", " cs ", " 1234\n"]);
		let credentials = CredentialHelper::new()
			.run(&exchange, &mut prompt)
			.await
			.expect("Scripted flow should succeed.");

		assert_eq!(credentials.expose(), ("ck", "cs", "access-token", "access-secret"));
		assert_eq!(prompt.questions.len(), 3);
		assert_eq!(prompt.notices[0], REGISTRATION_NOTICE);
		assert!(prompt.notices[1].contains("oauth_token=req-token"));
		assert_eq!(*exchange.seen.lock(), vec!["request:ck".to_owned(), "access:req-token:1234".to_owned()]);
	}

	#[tokio::test]
	async fn known_consumer_pair_is_not_asked_for() {
		let exchange = FakeExchange::new(Reject::Nothing);
		let mut prompt = ScriptedPrompt::answering(&["9999"]);
		let credentials = CredentialHelper::new()
			.consumer_key("ck")
			.consumer_secret("cs")
			.run(&exchange, &mut prompt)
			.await
			.expect("Scripted flow should succeed.");

		assert_eq!(prompt.questions, vec!["What is the PIN? ".to_owned()]);
		assert_eq!(prompt.notices.len(), 1);
		assert!(!prompt.notices[0].contains(REGISTRATION_NOTICE));
		assert!(credentials.is_complete());
	}

	#[tokio::test]
	async fn missing_consumer_secret_shows_registration_notice() {
		let exchange = FakeExchange::new(Reject::Nothing);
		let mut prompt = ScriptedPrompt::answering(&["cs", "4321"]);

		CredentialHelper::new()
			.consumer_key("ck")
			.run(&exchange, &mut prompt)
			.await
			.expect("Scripted flow should succeed.");

		assert_eq!(prompt.notices.first().map(String::as_str), Some(REGISTRATION_NOTICE));
		assert_eq!(prompt.questions[0], "Enter your consumer secret: ");
	}

	#[tokio::test]
	async fn rejected_consumer_pair_is_an_auth_error() {
		let exchange = FakeExchange::new(Reject::Consumer);
		let mut prompt = ScriptedPrompt::default();
		let err = CredentialHelper::with_consumer("ck", "cs")
			.run(&exchange, &mut prompt)
			.await
			.expect_err("Rejected consumer pair should fail.");

		match err {
			Error::Auth(AuthError::Rejected { status, reason }) => {
				assert_eq!(status, Some(401));
				assert_eq!(reason, "invalid consumer key or consumer secret");
			},
			other => panic!("Expected a rejection, got {other:?}."),
		}
		assert!(prompt.notices.is_empty());
	}

	#[tokio::test]
	async fn rejected_pin_is_an_auth_error() {
		let exchange = FakeExchange::new(Reject::Pin);
		let mut prompt = ScriptedPrompt::answering(&["0000"]);
		let err = CredentialHelper::with_consumer("ck", "cs")
			.run(&exchange, &mut prompt)
			.await
			.expect_err("Rejected PIN should fail.");

		assert!(matches!(
			err,
			Error::Auth(AuthError::Rejected { ref reason, .. }) if reason == "invalid PIN"
		));
	}

	#[tokio::test]
	async fn transport_failures_stay_http_errors() {
		let exchange = FakeExchange::new(Reject::Network);
		let err = CredentialHelper::with_consumer("ck", "cs")
			.run(&exchange, &mut ScriptedPrompt::default())
			.await
			.expect_err("Unavailable service should fail.");

		assert!(matches!(err, Error::Http(HttpError::Status { status: 503, .. })));
	}

	#[tokio::test]
	async fn closed_console_is_a_prompt_error() {
		let exchange = FakeExchange::new(Reject::Nothing);
		let mut prompt = ConsolePrompt::new(Cursor::new(Vec::new()), Vec::new());
		let err = CredentialHelper::new()
			.run(&exchange, &mut prompt)
			.await
			.expect_err("Empty stdin should fail.");

		assert!(matches!(err, Error::Prompt(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
		assert!(exchange.seen.lock().is_empty());
	}

	#[test]
	fn console_prompt_strips_line_endings() {
		let mut prompt = ConsolePrompt::new(Cursor::new(b"answer\r\n".to_vec()), Vec::new());

		assert_eq!(prompt.ask("Q? ").expect("Answer should be read."), "answer");

		prompt.notify("done").expect("Notice should be written.");

		let (_, output) = prompt.into_inner();

		assert_eq!(String::from_utf8(output).expect("Output should be UTF-8."), "Q? done\n");
	}
}
