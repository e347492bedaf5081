//! Success/error callbacks layered over the result-returning grant operations.

// self
use crate::{_prelude::*, auth::TokenResponse, grant::AuthorizationCodeToken};

type SuccessFn<'a> = Box<dyn FnOnce(&TokenResponse, Option<&str>) + 'a + Send>;
type ErrorFn<'a> = Box<dyn FnOnce(Error) + 'a + Send>;

/// Value a grant operation resolves to, as seen by [`Callbacks::dispatch`].
pub trait CallbackOutcome {
	/// Splits the value into the issued token and the `state` echoed by the callback.
	fn into_parts(self) -> (Option<TokenResponse>, Option<String>);
}
impl CallbackOutcome for TokenResponse {
	fn into_parts(self) -> (Option<TokenResponse>, Option<String>) {
		(Some(self), None)
	}
}
impl CallbackOutcome for Option<TokenResponse> {
	fn into_parts(self) -> (Option<TokenResponse>, Option<String>) {
		(self, None)
	}
}
impl CallbackOutcome for AuthorizationCodeToken {
	fn into_parts(self) -> (Option<TokenResponse>, Option<String>) {
		(Some(self.token), self.state)
	}
}

/// Optional `on_success`/`on_error` handlers for a single grant operation.
///
/// `on_success` receives the raw token response and, for
/// [`AuthorizationCodeGrant::exchange`](crate::grant::AuthorizationCodeGrant::exchange), the
/// `state` the callback returned. When `on_error` is set every failure is routed to it and the
/// dispatched call resolves to `Ok(None)`; otherwise the failure propagates unchanged.
///
/// ```no_run
/// # async fn run(
/// # 	grant: &oauth2_grant_control::PasswordGrant<oauth2_grant_control::http::ReqwestHttpClient>,
/// # ) -> oauth2_grant_control::error::Result<()> {
/// use oauth2_grant_control::grant::{Callbacks, PasswordTokenParams};
///
/// Callbacks::default()
/// 	.on_success(|token, _| println!("issued {:?}", token.token_type()))
/// 	.on_error(|err| eprintln!("{err}"))
/// 	.dispatch(grant.get_token(PasswordTokenParams::default()))
/// 	.await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Callbacks<'a> {
	on_success: Option<SuccessFn<'a>>,
	on_error: Option<ErrorFn<'a>>,
}
impl<'a> Callbacks<'a> {
	/// Sets the handler invoked with the raw token response and the returned `state`.
	pub fn on_success(
		mut self,
		f: impl FnOnce(&TokenResponse, Option<&str>) + 'a + Send,
	) -> Self {
		self.on_success = Some(Box::new(f));

		self
	}

	/// Sets the handler that receives every failure instead of the caller.
	pub fn on_error(mut self, f: impl FnOnce(Error) + 'a + Send) -> Self {
		self.on_error = Some(Box::new(f));

		self
	}

	/// Awaits `fut` and routes its outcome to the configured handlers.
	pub async fn dispatch<F, T>(self, fut: F) -> Result<Option<TokenResponse>>
	where
		F: Future<Output = Result<T>>,
		T: CallbackOutcome,
	{
		match fut.await {
			Ok(value) => {
				let (token, state) = value.into_parts();

				if let (Some(on_success), Some(token)) = (self.on_success, token.as_ref()) {
					on_success(token, state.as_deref());
				}

				Ok(token)
			},
			Err(e) => match self.on_error {
				Some(on_error) => {
					on_error(e);

					Ok(None)
				},
				None => Err(e),
			},
		}
	}
}
impl Debug for Callbacks<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Callbacks")
			.field("on_success", &self.on_success.is_some())
			.field("on_error", &self.on_error.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn token() -> TokenResponse {
		serde_json::from_value(json!({"access_token": "a"}))
			.expect("Token fixture should deserialize.")
	}

	#[tokio::test]
	async fn success_reaches_the_handler_and_the_caller() {
		let seen = Mutex::new(None);
		let result = Callbacks::default()
			.on_success(|token, state| {
				assert_eq!(state, None);

				*seen.lock() = token.access_token().map(str::to_owned);
			})
			.dispatch(async { Ok(token()) })
			.await
			.expect("Dispatch should succeed.");

		assert_eq!(result.and_then(|t| t.access_token().map(str::to_owned)).as_deref(), Some("a"));
		assert_eq!(seen.lock().as_deref(), Some("a"));
	}

	#[tokio::test]
	async fn errors_are_swallowed_when_a_handler_is_set() {
		let seen = Mutex::new(false);
		let result = Callbacks::default()
			.on_error(|err| *seen.lock() = matches!(err, Error::MissingRefreshToken))
			.dispatch(async { Err::<TokenResponse, _>(Error::MissingRefreshToken) })
			.await
			.expect("Handled errors should not propagate.");

		assert!(result.is_none());
		assert!(*seen.lock());
	}

	#[tokio::test]
	async fn errors_propagate_without_a_handler() {
		let err = Callbacks::default()
			.on_success(|_, _| panic!("Success handler must not run on failure."))
			.dispatch(async { Err::<Option<TokenResponse>, _>(Error::MissingRefreshToken) })
			.await
			.expect_err("Unhandled errors should propagate.");

		assert!(matches!(err, Error::MissingRefreshToken));
	}

	#[tokio::test]
	async fn skipped_refresh_does_not_call_on_success() {
		let called = Mutex::new(false);
		let result = Callbacks::default()
			.on_success(|_, _| *called.lock() = true)
			.dispatch(async { Ok::<Option<TokenResponse>, Error>(None) })
			.await
			.expect("Skipped refresh should not fail.");

		assert!(result.is_none());
		assert!(!*called.lock());
	}

	#[tokio::test]
	async fn authorization_code_state_reaches_the_handler() {
		let seen = Mutex::new(None);
		let result = Callbacks::default()
			.on_success(|_, state| *seen.lock() = state.map(str::to_owned))
			.dispatch(async {
				Ok(AuthorizationCodeToken { token: token(), state: Some("s1".into()) })
			})
			.await
			.expect("Dispatch should succeed.");

		assert!(result.is_some());
		assert_eq!(seen.lock().as_deref(), Some("s1"));
	}
}
