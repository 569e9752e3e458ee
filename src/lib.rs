//! # exam-dashboard-kit
//!
//! Client-side data access for an exam dashboard: a TTL read-through cache in
//! front of the exam service's REST API, plus polling and action primitives
//! for the UI on top of it.
//!
//! ## Features
//!
//! - **Read-through cache:** stats, exam lists, exam details, activity logs
//!   and analytics are served from memory for the cache duration (5 minutes
//!   by default)
//! - **Write invalidation:** create, update, delete and publish drop every
//!   entry that could show the old exam
//! - **Transport agnostic:** the service runs against any [`RemoteApi`]; use
//!   [`ApiClient`] for HTTP and [`api::InMemoryApi`] in tests
//! - **Bearer auth:** the token is read from [`SessionStorage`] on every request
//! - **Hooks:** [`hooks::Poller`] keeps a query fresh on an interval,
//!   [`hooks::ExamActions`] tracks loading/error/success of mutations
//!
//! ## Quick Start
//!
//! ```no_run
//! use exam_dashboard_kit::{ClientConfig, DashboardService, ExamQuery, SessionStorage};
//! use exam_dashboard_kit::hooks::{ExamActions, PollOptions, Poller};
//!
//! # async fn run() -> exam_dashboard_kit::Result<()> {
//! // 1. Configure the client and store the credential
//! let config = ClientConfig::new("https://exams.example.com/api");
//! let session = SessionStorage::with_item("token", "abc123");
//!
//! // 2. Build the service - Clone for sharing, clones share the cache
//! let service = DashboardService::connect(&config, session)?;
//!
//! // 3. Read through the cache
//! let page = service.get_exams(&ExamQuery::new("org1").page(1)).await?;
//! println!("{} exams", page.total);
//!
//! // 4. Keep the stats fresh in the background
//! let stats = Poller::start(service.clone(), PollOptions::default(), |service| async move {
//!     service.get_stats("org1").await
//! });
//!
//! // 5. Mutations invalidate what they change
//! let actions = ExamActions::new(service);
//! actions.publish_exam("e1").await?;
//! stats.refetch().await;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod expander;
pub mod hooks;
pub mod invitations;
pub mod key;
pub mod models;
pub mod observability;
pub mod service;
pub mod session;
pub mod strategy;

// Re-exports for convenience
pub use api::{ApiClient, RemoteApi};
pub use cache::TtlCache;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use expander::CacheExpander;
pub use invitations::{CandidateService, TeacherService};
pub use key::CacheKeyBuilder;
pub use models::ExamQuery;
pub use service::DashboardService;
pub use session::SessionStorage;
pub use strategy::CacheStrategy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
