//! Refresh capability shared by the grants that support a refresh step.

// self
use crate::{_prelude::*, auth::TokenResponse, executor::RefreshParams};

/// Boxed future returned by grant trait objects.
pub type GrantFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Grants whose tokens can be renewed with a `refresh_token` exchange.
pub trait TokenRefreshable
where
	Self: Send + Sync,
{
	/// Exchanges the stored refresh token for a new token record.
	///
	/// Resolves to `Ok(None)` when the grant skipped the exchange and reported the reason
	/// instead of failing.
	fn refresh(&self, params: RefreshParams) -> GrantFuture<'_, Option<TokenResponse>>;
}
