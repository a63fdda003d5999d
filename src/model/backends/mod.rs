mod stub;
#[cfg(feature = "model-tract")]
mod tract;

pub use stub::StubModel;
#[cfg(feature = "model-tract")]
pub use tract::TractModel;
