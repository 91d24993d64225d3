// Authentication state: token storage, refresh coordination, session status.

pub mod credentials;
pub mod refresh_gate;
pub mod session;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TokenPair};
pub use refresh_gate::{Admission, RefreshGate, RefreshOutcome};
pub use session::{AuthSession, SessionStatus};
