//! 파이프라인 확장 포인트 — 싱크/필터/트랜스폼 계약
//!
//! 파이프라인 엔진(`logfan-pipeline`)이 소비하는 세 가지 기능 계약을
//! 정의합니다. 필터와 트랜스폼은 부수 효과 없는 순수 함수여야 하고,
//! 싱크는 이벤트를 비동기로 처리하는 외부 협력자입니다.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::event::LogEvent;

/// 로그 싱크 trait
///
/// 파이프라인을 통과한 이벤트를 소비합니다. 엔진은 살아남은 이벤트마다
/// [`process`](Self::process)를 호출하고, 플러시 시점에
/// [`flush`](Self::flush)를 호출합니다.
///
/// 엔진은 싱크를 해제하지 않습니다 — 싱크의 수명과 정리는 전적으로
/// 호출자 소유입니다.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// 이벤트 하나를 비동기로 처리합니다.
    ///
    /// 팬아웃 중에는 같은 이벤트가 모든 싱크에 공유되므로 읽기 전용으로
    /// 취급해야 합니다.
    async fn process(&self, event: &LogEvent) -> Result<(), SinkError>;

    /// 버퍼링된 출력을 모두 내보냅니다.
    async fn flush(&self) -> Result<(), SinkError>;
}

/// 이벤트 승인 필터
///
/// `Arc` 기반 동일성을 갖는 순수 술어입니다. 클론은 동일성을 공유하므로
/// 등록할 때 쓴 클론으로 제거할 수 있습니다.
#[derive(Clone)]
pub struct Filter(Arc<dyn Fn(&LogEvent) -> bool + Send + Sync>);

impl Filter {
    /// 술어 함수로 새 필터를 만듭니다.
    pub fn new(predicate: impl Fn(&LogEvent) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// 이벤트가 이 필터를 통과하는지 평가합니다.
    pub fn accepts(&self, event: &LogEvent) -> bool {
        (self.0)(event)
    }

    /// 두 필터가 같은 등록 항목인지 (동일성) 확인합니다.
    pub fn same_as(&self, other: &Filter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({:p})", Arc::as_ptr(&self.0))
    }
}

/// 이벤트 트랜스폼
///
/// 팬아웃 직전에 이벤트를 한 번 재작성하는 순수 함수입니다.
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(LogEvent) -> LogEvent + Send + Sync>);

impl Transform {
    /// 변환 함수로 새 트랜스폼을 만듭니다.
    pub fn new(func: impl Fn(LogEvent) -> LogEvent + Send + Sync + 'static) -> Self {
        Self(Arc::new(func))
    }

    /// 이벤트에 변환을 적용합니다.
    pub fn apply(&self, event: LogEvent) -> LogEvent {
        (self.0)(event)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transform({:p})", Arc::as_ptr(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Payload;
    use crate::level::LevelRegistry;

    #[test]
    fn filter_evaluates_predicate() {
        let registry = LevelRegistry::new();
        let filter = Filter::new(|event| event.payload() != &Payload::None);

        let empty = LogEvent::new(registry.info(), Payload::None);
        let text = LogEvent::new(registry.info(), "hello");

        assert!(!filter.accepts(&empty));
        assert!(filter.accepts(&text));
    }

    #[test]
    fn filter_clones_share_identity() {
        let filter = Filter::new(|_| true);
        let clone = filter.clone();
        let other = Filter::new(|_| true);

        assert!(filter.same_as(&clone));
        assert!(!filter.same_as(&other));
    }

    #[test]
    fn transform_rewrites_event() {
        let registry = LevelRegistry::new();
        let transform = Transform::new(|event| {
            LogEvent::new(event.level().clone(), "rewritten")
                .with_timestamp(event.timestamp())
                .with_senders(event.senders().to_vec())
        });

        let event = LogEvent::new(registry.info(), "original").with_sender("test");
        let rewritten = transform.apply(event.clone());

        assert_eq!(rewritten.payload(), &Payload::Text("rewritten".to_owned()));
        assert_eq!(rewritten.senders(), event.senders());
        assert_eq!(rewritten.timestamp(), event.timestamp());
    }
}
