pub mod progress;
pub mod timing;
