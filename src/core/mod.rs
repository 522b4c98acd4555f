//! Core module - measurement algorithms and shared types

pub mod aggregate;
pub mod config;
pub mod evaluate;
pub mod processor;
pub mod pulltest;
pub mod region;
pub mod stats;
pub mod summary;
pub mod tolerance;
pub mod variant;

pub use aggregate::{
    aggregate_metrology, aggregate_pull_test, lookup_carrier, lookup_mass, resolve_identity,
    ComponentDirectory, LookupError,
};
pub use config::Config;
pub use evaluate::{evaluate, EvaluationError};
pub use processor::{VariantProcessor, VariantScan};
pub use pulltest::{analyze, PullCriteria, PullCriteriaOverride, PullTestError};
pub use region::{
    classify, classify_region, mad_filter, ClassifiedRegion, EmptyRegionError, FilterStage,
    MeasurementRow, RegionDefinition, RegionGroup, RegionPredicate, ScanWindow,
};
pub use stats::StatsError;
pub use summary::{
    AssembledSummary, BareSummary, ExtractionError, FlexSummary, SummaryRow, Trailer,
};
pub use tolerance::{BandOverride, ToleranceBand, ToleranceTable, Unit};
pub use variant::ComponentVariant;
