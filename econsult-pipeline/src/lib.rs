//! eConsult Pipeline - Comment Analysis Orchestration
//!
//! [`AnalysisService`] turns a stakeholder comment into a stored record with
//! a sentiment label and a short summary, using cached artifacts where it can
//! and a bounded [`WorkerPool`] for the blocking analyzer calls where it
//! cannot.
//!
//! # Example
//! ```ignore
//! let gateway = Arc::new(SqliteGateway::connect(&StorageConfig::from_env()).await?);
//! let service = AnalysisService::from_config(
//!     PipelineConfig::from_env(),
//!     &ProvidersConfig::from_env(),
//!     gateway,
//! )?;
//! let record = service.submit("citizen", "More cycle lanes, please").await?;
//! ```

pub mod pool;
pub mod service;
pub mod stats;

pub use pool::{PoolStatsSnapshot, WorkerPool};
pub use service::{AnalysisService, BatchReport, ProcessOutcome, SkippedRow, DASHBOARD_RECENT_LIMIT};
pub use stats::{ArtifactSource, PipelineStats, PipelineStatsSnapshot};
