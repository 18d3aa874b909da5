//! 메트릭 상수 — 이름과 설명을 중앙에서 정의
//!
//! 파이프라인 엔진은 이 상수를 사용하여 `metrics::counter!()` 매크로를
//! 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logfan_`
//! - 접미어: `_total` (counter)

/// 파이프라인에 접수된 전체 이벤트 수 (counter)
pub const PIPELINE_EVENTS_ENQUEUED_TOTAL: &str = "logfan_pipeline_events_enqueued_total";

/// 필터/트랜스폼/팬아웃을 끝까지 통과한 이벤트 수 (counter)
pub const PIPELINE_EVENTS_PROCESSED_TOTAL: &str = "logfan_pipeline_events_processed_total";

/// 필터에서 탈락한 이벤트 수 (counter)
pub const PIPELINE_EVENTS_FILTERED_TOTAL: &str = "logfan_pipeline_events_filtered_total";

/// 싱크 process/flush 실패 수 (counter)
pub const PIPELINE_SINK_ERRORS_TOTAL: &str = "logfan_pipeline_sink_errors_total";

/// 드레인 후 재시작된 소비 태스크 세대 수 (counter)
pub const PIPELINE_RESTARTS_TOTAL: &str = "logfan_pipeline_restarts_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_names_follow_convention() {
        let counters = [
            PIPELINE_EVENTS_ENQUEUED_TOTAL,
            PIPELINE_EVENTS_PROCESSED_TOTAL,
            PIPELINE_EVENTS_FILTERED_TOTAL,
            PIPELINE_SINK_ERRORS_TOTAL,
            PIPELINE_RESTARTS_TOTAL,
        ];
        for name in counters {
            assert!(name.starts_with("logfan_"));
            assert!(name.ends_with("_total"));
        }
    }
}
