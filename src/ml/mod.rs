pub mod scaler;
pub mod window;
pub mod predictor;
pub mod forecaster;
pub mod model;
pub mod evaluation;
#[cfg(feature = "onnx")]
pub mod onnx_model;

pub use scaler::{MinMaxScaler, ScalerState};
pub use window::{WindowBuilder, DEFAULT_WINDOW_SIZE};
pub use predictor::{FnPredictor, PersistencePredictor, Predictor};
pub use forecaster::{smooth, Forecaster};
pub use model::LinearPredictor;
pub use evaluation::{evaluate, ErrorMetrics};
#[cfg(feature = "onnx")]
pub use onnx_model::OnnxPredictor;
