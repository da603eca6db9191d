pub mod cluster;
pub mod context;
pub mod expression;
pub mod extractor;
pub mod mapping;

pub use cluster::ClusterModel;
pub use context::InferenceContext;
pub use expression::ExpressionModel;
pub use extractor::FeatureExtractor;
pub use mapping::ClusterLabelMap;
