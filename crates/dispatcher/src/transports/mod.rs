//! Analyzer transport implementations
//!
//! Contains GrpcAnalyzerTransport, LogTransport, and RecordingTransport.

mod grpc;
mod log;
pub mod proto;
mod recording;

pub use self::grpc::GrpcAnalyzerTransport;
pub use self::log::LogTransport;
pub use self::recording::RecordingTransport;
