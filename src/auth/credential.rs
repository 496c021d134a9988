//! The credential value held by the store and the wire payload that produces it.

// self
use crate::{
	_prelude::*,
	auth::{PermissionSet, TokenSecret, UserId, Username},
};

/// Identity of the authenticated user, carried through untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
	/// Backend identifier.
	pub id: UserId,
	/// Login name.
	pub username: Username,
	/// Permissions granted to the user.
	#[serde(default)]
	pub permissions: PermissionSet,
}

/// Immutable credential value; the store replaces it wholesale and never edits fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
	/// Short-lived token attached to every authenticated call.
	///
	/// Absent when persistence held only a refresh token. Calls then go out without
	/// `Authorization`, and the resulting `401` renews the credential.
	pub access_token: Option<TokenSecret>,
	/// Longer-lived token exchanged for a new access token on expiry.
	pub refresh_token: Option<TokenSecret>,
	/// Identity of the authenticated user.
	///
	/// Absent when the credential was restored from persistence, which only keeps the tokens.
	pub user: Option<UserIdentity>,
}
impl Credential {
	/// Creates a credential from a fresh grant.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: Option<String>,
		user: Option<UserIdentity>,
	) -> Self {
		Self {
			access_token: Some(TokenSecret::new(access_token)),
			refresh_token: refresh_token.map(TokenSecret::new),
			user,
		}
	}

	/// Rebuilds a credential from persisted tokens; each one is restored on its own.
	///
	/// Returns `None` when neither token was persisted.
	pub fn restored(access_token: Option<String>, refresh_token: Option<String>) -> Option<Self> {
		if access_token.is_none() && refresh_token.is_none() {
			return None;
		}

		Some(Self {
			access_token: access_token.map(TokenSecret::new),
			refresh_token: refresh_token.map(TokenSecret::new),
			user: None,
		})
	}

	/// Returns true if the credential carries an access token.
	pub fn has_access_token(&self) -> bool {
		self.access_token.is_some()
	}

	/// Builds the credential that results from a renewal.
	///
	/// Backends that do not rotate refresh tokens omit them from the response; the previous
	/// refresh token stays valid in that case.
	pub fn renewed(&self, grant: SessionGrant) -> Self {
		let refresh_token =
			grant.refresh_token.map(TokenSecret::new).or_else(|| self.refresh_token.clone());

		Self {
			access_token: Some(TokenSecret::new(grant.access_token)),
			refresh_token,
			user: Some(grant.user),
		}
	}
}
impl From<SessionGrant> for Credential {
	fn from(grant: SessionGrant) -> Self {
		Self::new(grant.access_token, grant.refresh_token, Some(grant.user))
	}
}

/// Payload returned by the login and refresh endpoints.
#[derive(Clone, Deserialize)]
pub struct SessionGrant {
	/// Newly issued access token.
	pub access_token: String,
	/// Newly issued refresh token, when the backend rotates it.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// Authenticated user.
	pub user: UserIdentity,
}
impl Debug for SessionGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token_set", &self.refresh_token.is_some())
			.field("user", &self.user)
			.finish()
	}
}
