pub mod dashboard;

pub use dashboard::{DashboardConfig, SourceKind};
