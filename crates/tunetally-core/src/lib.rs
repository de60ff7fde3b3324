pub mod aggregate;
pub mod cache;
pub mod combine;
pub mod config;
pub mod derived;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod smoothing;
pub mod types;

pub use aggregate::{AggregateSeries, AggregateSet, CountSeries};
pub use cache::PreparedCache;
pub use config::{PipelineConfig, SelectionParams, SmoothingConfig};
pub use error::{PipelineError, PipelineWarning, Result};
pub use pipeline::{aggregate_prepared, prepare, run_pipeline, PipelineOutput, PreparedDataset};
pub use smoothing::SmoothedSeries;
pub use types::{Granularity, Segment, TimeBucket};
