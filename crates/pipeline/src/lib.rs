#![doc = include_str!("../README.md")]

pub mod handle;
pub mod pipeline;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LogPipeline, LogPipelineBuilder};

// 핸들
pub use handle::{FilterHandle, SinkHandle};
