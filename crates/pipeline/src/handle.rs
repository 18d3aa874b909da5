//! 등록 해제 토큰 -- 필터/싱크 하나에 묶인 일회성 핸들
//!
//! [`add_filter`](crate::pipeline::LogPipeline::add_filter) /
//! [`add_sink`](crate::pipeline::LogPipeline::add_sink)가 반환하는
//! 핸들입니다. 해제하면 묶인 항목 하나만 파이프라인에서 제거되며,
//! 그 외에 파이프라인에 대한 어떤 권한도 부여하지 않습니다.

use std::sync::Arc;

use logfan_core::error::PipelineError;
use logfan_core::pipeline::{Filter, LogSink};

use crate::pipeline::PipelineInner;

/// 필터 등록 해제 토큰
///
/// [`release`](Self::release)의 첫 호출만 실제 제거(드레인 후 재시작)를
/// 수행하고, 이후 호출은 no-op입니다. 해제하지 않고 드롭하면 필터는
/// 등록된 채 남습니다 (Rust에는 비동기 Drop이 없습니다).
pub struct FilterHandle {
    pipeline: Arc<PipelineInner>,
    filter: Option<Filter>,
}

impl FilterHandle {
    pub(crate) fn new(pipeline: Arc<PipelineInner>, filter: Filter) -> Self {
        Self {
            pipeline,
            filter: Some(filter),
        }
    }

    /// 묶인 필터를 파이프라인에서 제거합니다.
    ///
    /// # Errors
    /// 파이프라인이 이미 해제되었으면 [`PipelineError::Disposed`].
    /// 이 경우에도 핸들은 소진된 것으로 간주됩니다.
    pub async fn release(&mut self) -> Result<(), PipelineError> {
        match self.filter.take() {
            Some(filter) => self.pipeline.remove_filter_entry(&filter).await,
            None => Ok(()),
        }
    }

    /// 핸들이 이미 해제되었는지 확인합니다.
    pub fn is_released(&self) -> bool {
        self.filter.is_none()
    }
}

/// 싱크 등록 해제 토큰
///
/// 동작은 [`FilterHandle`]과 동일합니다.
pub struct SinkHandle {
    pipeline: Arc<PipelineInner>,
    sink: Option<Arc<dyn LogSink>>,
}

impl SinkHandle {
    pub(crate) fn new(pipeline: Arc<PipelineInner>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            pipeline,
            sink: Some(sink),
        }
    }

    /// 묶인 싱크를 파이프라인에서 제거합니다.
    ///
    /// 제거 전에 드레인이 일어나므로, 이미 기록된 이벤트는 이 싱크까지
    /// 전달된 뒤에 제거됩니다.
    ///
    /// # Errors
    /// 파이프라인이 이미 해제되었으면 [`PipelineError::Disposed`].
    pub async fn release(&mut self) -> Result<(), PipelineError> {
        match self.sink.take() {
            Some(sink) => self.pipeline.remove_sink_entry(&sink).await,
            None => Ok(()),
        }
    }

    /// 핸들이 이미 해제되었는지 확인합니다.
    pub fn is_released(&self) -> bool {
        self.sink.is_none()
    }
}
