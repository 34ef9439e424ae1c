//! kakao_client - Kakao token lifecycle and message delivery
//!
//! The pieces, leaf-first:
//! - `store` - persisted token record (single JSON file, opaque mergeable map)
//! - `auth` - one-time authorization-code exchange and refresh-token renewal
//! - `notify` - "memo to self" message delivery with a single refresh-and-retry
//!   cycle when the provider signals token expiry

pub mod auth;
pub mod error;
pub mod http;
pub mod notify;
pub mod store;

pub use auth::issuer::TokenIssuer;
pub use auth::refresher::TokenRefresher;
pub use error::{AuthError, RefreshError, SendError, StoreError};
pub use notify::{NotificationOutcome, Notifier};
pub use store::{FileTokenStore, MemoryTokenStore, TokenRecord, TokenStore};
