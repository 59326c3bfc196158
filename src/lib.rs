//! Identity provider abstraction and service discovery for a Terraform-style artifact
//! registry. Pluggable OAuth adapters, login session payloads, and a well-known document in
//! one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod discovery;
pub mod error;
pub mod http;
pub mod obs;
pub mod provider;
pub mod session;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::time::Duration;
	// self
	use crate::http::ExchangeHttpClient;

	/// Builds an exchange client with a short request timeout so stalled mock servers fail the
	/// test quickly instead of hanging it.
	pub fn test_exchange_client() -> ExchangeHttpClient {
		let client = ReqwestClient::builder()
			.timeout(Duration::from_secs(5))
			.build()
			.expect("Failed to build Reqwest client for tests.");

		ExchangeHttpClient::with_client(client)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		sync::Arc,
	};

	pub use async_trait::async_trait;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _, tokio as _};
