pub mod error;
pub mod kpi;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod radar;
pub mod scoring;
pub mod weights;

pub use error::EngineError;
pub use kpi::*;
pub use metrics::*;
pub use model::*;
pub use normalize::*;
pub use radar::*;
pub use scoring::*;
pub use weights::*;
