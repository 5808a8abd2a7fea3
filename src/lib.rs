//! LaMetric metrics relay.
//!
//! Polls a Mixpanel saved report and GitHub repository stats on every device
//! request and reshapes the numbers into LaMetric frames:
//!
//! ```text
//! GET /metrics
//! {"frames": [{"icon": "i1", "text": "120"},
//!             {"icon": "i2", "text": "500"},
//!             {"icon": "i3", "text": "12.3K"}]}
//! ```
//!
//! The frame count and icons are fixed by the configured layout. Upstream
//! failures turn into placeholder text, never into missing frames or 5xx.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`analytics`]: Mixpanel client and the analytics seam
//! - [`repo`]: GitHub client and the repository seam
//! - [`frames`]: Frame layout and formatting
//! - [`api`]: HTTP routes
//! - [`telemetry`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod frames;
pub mod repo;
pub mod telemetry;
pub mod utils;

pub use config::Config;
pub use error::{RelayError, Result};
