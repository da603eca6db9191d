pub mod expression;
pub mod skin;
pub mod types;

pub use expression::ExpressionClassifier;
pub use skin::SkinClassifier;
pub use types::{ExpressionPrediction, SkinPrediction};
