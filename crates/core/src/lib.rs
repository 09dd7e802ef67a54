pub mod config;
pub mod mileage;
pub mod money;
pub mod task;

pub use config::{
    AdvisoryConfig, AppConfig, ConfigError, ProviderKind, ProviderSection, ResolvedProvider,
    RoutingConfig, ServerConfig, SummarizerConfig, UploadConfig,
};
pub use mileage::{
    reconcile, reconcile_readings, MileageConfig, OdometerReading, TripClaim, TripReconciliation,
};
pub use money::Money;
pub use task::TaskType;
