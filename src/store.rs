//! Credential store and the persistence backends it writes through to.
//!
//! [`CredentialStore`] owns the single shared credential of a session. Reads are lock-cheap
//! snapshots of an `Arc`, while [`replace`](CredentialStore::replace) and
//! [`clear`](CredentialStore::clear) swap the whole value under a write lock and persist the
//! token pair before the lock is released, so the in-memory value and the persisted copy never
//! disagree about ordering. Every mutation bumps a generation counter that the request pipeline
//! uses to recognise credentials that changed while a request was in flight.

pub mod file;
pub mod memory;

pub use file::FilePersistence;
pub use memory::MemoryPersistence;

// self
use crate::{_prelude::*, auth::Credential, obs};

/// Persistence key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Persistence key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Key/value contract implemented by credential persistence backends.
///
/// Calls happen while the credential store holds its write lock, so implementations must be
/// quick and must not block on the async runtime.
pub trait CredentialPersistence
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

	/// Removes `key`; missing keys are not an error.
	fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`CredentialPersistence`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Consistent view of the store at one instant.
#[derive(Clone, Debug, Default)]
pub struct CredentialSnapshot {
	/// Credential installed at that instant, if any.
	pub credential: Option<Arc<Credential>>,
	/// Mutation counter at that instant.
	pub generation: u64,
}

#[derive(Default)]
struct StoreState {
	credential: Option<Arc<Credential>>,
	generation: u64,
}

/// Process- or session-wide holder of the current [`Credential`].
pub struct CredentialStore {
	persistence: Arc<dyn CredentialPersistence>,
	state: RwLock<StoreState>,
}
impl CredentialStore {
	/// Opens a store over `persistence`, restoring whichever tokens were persisted.
	///
	/// A refresh token without an access token still restores: the first call goes out
	/// unauthenticated and its `401` renews the credential.
	pub fn open(persistence: Arc<dyn CredentialPersistence>) -> Result<Self, StoreError> {
		let credential = Credential::restored(
			persistence.get(ACCESS_TOKEN_KEY)?,
			persistence.get(REFRESH_TOKEN_KEY)?,
		)
		.map(Arc::new);

		Ok(Self { persistence, state: RwLock::new(StoreState { credential, generation: 0 }) })
	}

	/// Creates an empty store backed by a fresh [`MemoryPersistence`].
	pub fn in_memory() -> Self {
		Self { persistence: Arc::new(MemoryPersistence::default()), state: Default::default() }
	}

	/// Returns the current credential.
	pub fn read(&self) -> Option<Arc<Credential>> {
		self.state.read().credential.clone()
	}

	/// Returns the current credential together with its generation.
	pub fn snapshot(&self) -> CredentialSnapshot {
		let state = self.state.read();

		CredentialSnapshot { credential: state.credential.clone(), generation: state.generation }
	}

	/// Returns the number of mutations applied since the store was opened.
	pub fn generation(&self) -> u64 {
		self.state.read().generation
	}

	/// Returns true while an installed credential carries an access token.
	pub fn is_authenticated(&self) -> bool {
		self.state.read().credential.as_deref().is_some_and(Credential::has_access_token)
	}

	/// Atomically installs `credential` and persists its tokens.
	///
	/// Persistence failures are logged; the in-memory value is authoritative either way.
	pub fn replace(&self, credential: Credential) -> Arc<Credential> {
		let mut state = self.state.write();

		self.install(&mut state, Arc::new(credential))
	}

	/// Installs `credential` only if the store is still at `generation`.
	///
	/// Returns `None` without touching the store when another mutation (a logout, a login)
	/// happened after `generation` was read.
	pub fn replace_if(&self, generation: u64, credential: Credential) -> Option<Arc<Credential>> {
		let mut state = self.state.write();

		if state.generation != generation {
			return None;
		}

		Some(self.install(&mut state, Arc::new(credential)))
	}

	/// Atomically removes the credential and its persisted copies.
	pub fn clear(&self) {
		let mut state = self.state.write();

		self.evict(&mut state);
	}

	/// Clears the store only if it is still at `generation`; returns whether it did.
	pub fn clear_if(&self, generation: u64) -> bool {
		let mut state = self.state.write();

		if state.generation != generation {
			return false;
		}

		self.evict(&mut state);

		true
	}

	fn install(&self, state: &mut StoreState, credential: Arc<Credential>) -> Arc<Credential> {
		if let Err(e) = self.persist(&credential) {
			obs::log_store_failure("replace", &e);
		}

		state.credential = Some(credential.clone());
		state.generation += 1;

		credential
	}

	fn evict(&self, state: &mut StoreState) {
		for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
			if let Err(e) = self.persistence.remove(key) {
				obs::log_store_failure("clear", &e);
			}
		}

		state.credential = None;
		state.generation += 1;
	}

	fn persist(&self, credential: &Credential) -> Result<(), StoreError> {
		for (key, token) in [
			(ACCESS_TOKEN_KEY, &credential.access_token),
			(REFRESH_TOKEN_KEY, &credential.refresh_token),
		] {
			match token {
				Some(token) => self.persistence.set(key, token.expose())?,
				None => self.persistence.remove(key)?,
			}
		}

		Ok(())
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.read();

		f.debug_struct("CredentialStore")
			.field("credential_set", &state.credential.is_some())
			.field("generation", &state.generation)
			.finish()
	}
}
