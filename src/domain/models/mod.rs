pub mod config;
pub mod feedback;
pub mod hyperedge;
pub mod trajectory;

pub use config::{
    Config, DatabaseConfig, EventsConfig, FeedbackConfig, HyperedgeBackend, HyperedgeConfig,
    LoggingConfig, StorageConfig, TrajectoryStoreConfig,
};
pub use feedback::{Feedback, FeedbackSignal};
pub use hyperedge::{CausalHyperedge, HyperedgeId, HyperedgeNodes, HyperedgeWeight};
pub use trajectory::{
    CausalInference, InferenceId, Pattern, PatternId, ResponseData, Route, Trajectory,
    TrajectoryId, TrajectoryMetadata,
};
