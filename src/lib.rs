pub mod config;
pub mod dataset;
pub mod image;
pub mod models;
pub mod pipeline;
pub mod utils;

// 重新导出主要类型
pub use config::Config;
pub use models::InferenceContext;
pub use pipeline::{ExpressionPrediction, SkinPrediction};
pub use utils::error::InferenceError;

pub type Result<T> = std::result::Result<T, InferenceError>;
