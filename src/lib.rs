//! Back-end tracking client for the Woopra analytics service.
//!
//! A [`Tracker`] holds the identity and properties of one visitor and
//! reports identification and events to the collection host over HTTP GET.
//! Delivery is best-effort: failures are logged and returned, never
//! panicked on, so callers can ignore the result when fire-and-forget
//! semantics are enough.
//!
//! # Example
//!
//! ```rust,no_run
//! use woopra::{Identity, Properties, Tracker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut tracker = Tracker::new("mybusiness.com");
//!
//!     let mut profile = Properties::new();
//!     profile.set("name", "John Doe");
//!     tracker.identify(Identity::email("johndoe@mybusiness.com"), profile, None, None);
//!
//!     let mut event = Properties::new();
//!     event.set("plan", "Gold");
//!     if let Err(error) = tracker.track(Some("signup"), &event, None).await {
//!         eprintln!("tracking failed: {error}");
//!     }
//! }
//! ```

pub mod models;

mod error;
mod request;
mod tracker;

pub use error::Error;
pub use models::{Identity, Properties, PropertyValue};
pub use tracker::{Tracker, TrackerBuilder};
