//! `iterion-lib` - in-memory agile delivery core.
//!
//! Organizations, users, sprints, epics, stories and tasks live in a single
//! [`Workspace`] owned by the caller. Views over it (org scoping, dashboard
//! metrics, discovery search, kanban board) are pure functions recomputed
//! on demand; all writes go through `Workspace` methods, which keep the
//! denormalized epic counters consistent.
//!
//! # Quick Start
//!
//! ```no_run
//! use iterion_lib::{DashboardMetrics, OrgScope, StoryStatus, seed};
//!
//! let mut ws = seed::demo_workspace();
//! ws.set_story_status("s1", StoryStatus::Closed).unwrap();
//!
//! let scope = OrgScope::resolve(&ws, "p_1");
//! let metrics = DashboardMetrics::compute(&scope, ws.sprints(), 6);
//! println!("{}% complete", metrics.completion_rate);
//! ```

pub mod access;
pub mod assistant;
pub mod board;
pub mod discovery;
pub mod error;
pub mod metrics;
pub mod model;
pub mod query;
pub mod resolve;
pub mod seed;
pub mod store;
pub mod util;
pub mod validation;

pub use board::Board;
pub use discovery::{DetailView, WorkItem};
pub use error::{IterionError, Result};
pub use metrics::DashboardMetrics;
pub use model::{
    Epic, EpicStatus, ItemKind, Organization, Priority, Role, Sprint, SprintStatus, Story,
    StoryStatus, Task, TaskKind, TaskStatus, User,
};
pub use query::{BoardFilters, DiscoveryFilters, SprintFilter, StoryUpdate};
pub use resolve::OrgScope;
pub use store::Workspace;

/// Version of this library crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
