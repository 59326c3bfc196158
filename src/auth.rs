//! Identity data resolved from an OAuth provider.

// self
use crate::_prelude::*;

/// Resolved identity returned by a successful code exchange.
///
/// The email address is treated as the canonical identifier for the authenticated user; the
/// crate performs no uniqueness or lifecycle enforcement, so mutation and persistence stay with
/// the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetails {
	/// Display name reported by the provider.
	pub name: String,
	/// Primary email address reported by the provider.
	pub email: String,
}
