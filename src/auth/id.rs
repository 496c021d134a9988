//! User identifiers carried inside a credential.
//!
//! The backend owns the format of these values. They are stored and handed back verbatim; any
//! string the backend sends, including one with spaces, is a valid identifier here.

// self
use crate::_prelude::*;

macro_rules! def_id {
	($(#[$meta:meta])* $name:ident($kind:literal)) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);
		impl $name {
			/// Wraps `value` as sent by the backend.
			pub fn new(value: impl Into<String>) -> Self {
				Self(value.into())
			}
		}
		impl From<String> for $name {
			fn from(value: String) -> Self {
				Self(value)
			}
		}
		impl From<&str> for $name {
			fn from(value: &str) -> Self {
				Self(value.to_owned())
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

def_id! {
	/// Backend-assigned identifier of the authenticated user.
	UserId("User")
}
def_id! {
	/// Login name of the authenticated user.
	Username("Username")
}
