//! Grant controls: one state machine per RFC 6749 grant type built on a shared [`GrantControl`].

pub mod authorization_code;
pub mod callback;
pub mod client_credentials;
pub mod control;
pub mod jwt;
pub mod password;
pub mod refreshable;

pub use authorization_code::*;
pub use callback::*;
pub use client_credentials::*;
pub use control::*;
pub use jwt::*;
pub use password::*;
pub use refreshable::*;

// self
use crate::{_prelude::*, http::TokenHttpClient, obs::FlowKind};

/// Tagged union over every grant variant.
///
/// The refresh capability is looked up per variant through [`Grant::refreshable`] instead of
/// being assumed, since Client Credentials tokens are never refreshed.
pub enum Grant<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Authorization Code (+ PKCE).
	AuthorizationCode(AuthorizationCodeGrant<C>),
	/// JWT bearer assertion.
	Jwt(JwtGrant<C>),
	/// Resource-owner password credentials.
	Password(PasswordGrant<C>),
	/// Client Credentials.
	ClientCredentials(ClientCredentialsGrant<C>),
}
impl<C> Grant<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Flow label of the wrapped variant.
	pub fn kind(&self) -> FlowKind {
		match self {
			Self::AuthorizationCode(_) => FlowKind::AuthorizationCode,
			Self::Jwt(_) => FlowKind::JwtBearer,
			Self::Password(_) => FlowKind::Password,
			Self::ClientCredentials(_) => FlowKind::ClientCredentials,
		}
	}

	/// Shared state of the wrapped variant.
	pub fn control(&self) -> &GrantControl<C> {
		match self {
			Self::AuthorizationCode(grant) => grant.control(),
			Self::Jwt(grant) => grant.control(),
			Self::Password(grant) => grant.control(),
			Self::ClientCredentials(grant) => grant.control(),
		}
	}

	/// Refresh capability, when the variant supports one.
	pub fn refreshable(&self) -> Option<&dyn TokenRefreshable> {
		match self {
			Self::AuthorizationCode(grant) => Some(grant),
			Self::Jwt(grant) => Some(grant),
			Self::Password(grant) => Some(grant),
			Self::ClientCredentials(_) => None,
		}
	}
}
impl<C> Debug for Grant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Grant").field(&self.kind()).field(self.control()).finish()
	}
}
impl<C> From<AuthorizationCodeGrant<C>> for Grant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn from(grant: AuthorizationCodeGrant<C>) -> Self {
		Self::AuthorizationCode(grant)
	}
}
impl<C> From<JwtGrant<C>> for Grant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn from(grant: JwtGrant<C>) -> Self {
		Self::Jwt(grant)
	}
}
impl<C> From<PasswordGrant<C>> for Grant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn from(grant: PasswordGrant<C>) -> Self {
		Self::Password(grant)
	}
}
impl<C> From<ClientCredentialsGrant<C>> for Grant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn from(grant: ClientCredentialsGrant<C>) -> Self {
		Self::ClientCredentials(grant)
	}
}
