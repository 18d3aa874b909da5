//! 로그 이벤트 — 파이프라인을 흐르는 불변 값 타입
//!
//! [`LogEvent`]는 타임스탬프, 레벨, 페이로드, 발신자 태그 네 필드로
//! 구성되며 생성 이후 변경되지 않습니다. 동등성과 해시는 네 필드
//! 전체에 대해 구조적으로 정의됩니다. 팬아웃 중에는 모든 싱크가 같은
//! 이벤트를 공유하므로 읽기 전용으로 취급해야 합니다.

use std::fmt;
use std::time::SystemTime;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::level::Level;

/// 이벤트 페이로드
///
/// 호출자가 정의하는 불투명 데이터입니다. 구조적 동등성과 해시가
/// 정의되어야 하므로 닫힌 enum으로 표현합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Payload {
    /// 페이로드 없음
    #[default]
    None,
    /// 텍스트 페이로드
    Text(String),
    /// 정수 페이로드
    Integer(i64),
    /// 바이너리 페이로드
    Binary(Bytes),
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Payload {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Self::Binary(value)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "<none>"),
            Self::Text(text) => write!(f, "{text}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// 로그 이벤트
///
/// 생성 시점에 모든 필드가 확정되는 불변 레코드입니다.
/// 레벨은 호출자가 레지스트리에서 가져와 명시적으로 전달합니다
/// (보통 `registry.info()`).
///
/// # 사용 예시
/// ```
/// use logfan_core::event::LogEvent;
/// use logfan_core::level::LevelRegistry;
///
/// let registry = LevelRegistry::new();
/// let event = LogEvent::new(registry.warning(), "disk almost full")
///     .with_sender("disk-monitor");
///
/// assert_eq!(event.senders(), ["disk-monitor"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEvent {
    /// 발생 시각 (기본값: 생성 시각)
    timestamp: SystemTime,
    /// 심각도 레벨
    level: Level,
    /// 페이로드
    payload: Payload,
    /// 발신자 태그 (순서 유지)
    senders: Vec<String>,
}

impl LogEvent {
    /// 현재 시각과 빈 발신자 목록으로 새 이벤트를 생성합니다.
    pub fn new(level: Level, payload: impl Into<Payload>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            payload: payload.into(),
            senders: Vec::new(),
        }
    }

    /// 타임스탬프를 지정합니다.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 발신자 태그를 하나 추가합니다.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.senders.push(sender.into());
        self
    }

    /// 발신자 태그 목록을 통째로 지정합니다.
    pub fn with_senders(mut self, senders: Vec<String>) -> Self {
        self.senders = senders;
        self
    }

    /// 발생 시각을 반환합니다.
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// 심각도 레벨을 반환합니다.
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// 페이로드를 반환합니다.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// 발신자 태그를 반환합니다.
    pub fn senders(&self) -> &[String] {
        &self.senders
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.payload)?;
        if !self.senders.is_empty() {
            write!(f, " ({})", self.senders.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelRegistry;

    #[test]
    fn new_event_defaults() {
        let registry = LevelRegistry::new();
        let event = LogEvent::new(registry.info(), Payload::None);

        assert_eq!(event.level(), &registry.info());
        assert_eq!(event.payload(), &Payload::None);
        assert!(event.senders().is_empty());
        assert!(event.timestamp() <= SystemTime::now());
    }

    #[test]
    fn equality_is_structural_over_all_fields() {
        let registry = LevelRegistry::new();
        let timestamp = SystemTime::now();

        let left = LogEvent::new(registry.info(), "payload")
            .with_timestamp(timestamp)
            .with_sender("a");
        let right = LogEvent::new(registry.info(), "payload")
            .with_timestamp(timestamp)
            .with_sender("a");

        assert_eq!(left, right);

        let different_sender = right.clone().with_sender("b");
        assert_ne!(left, different_sender);
    }

    #[test]
    fn equality_distinguishes_levels() {
        let registry = LevelRegistry::new();
        let timestamp = SystemTime::now();

        let info = LogEvent::new(registry.info(), "x").with_timestamp(timestamp);
        let warning = LogEvent::new(registry.warning(), "x").with_timestamp(timestamp);

        assert_ne!(info, warning);
    }

    #[test]
    fn payload_conversions() {
        assert_eq!(Payload::from("text"), Payload::Text("text".to_owned()));
        assert_eq!(Payload::from(42), Payload::Integer(42));
        assert_eq!(
            Payload::from(Bytes::from_static(b"raw")),
            Payload::Binary(Bytes::from_static(b"raw"))
        );
    }

    #[test]
    fn sender_order_is_preserved() {
        let registry = LevelRegistry::new();
        let event = LogEvent::new(registry.info(), Payload::None)
            .with_sender("first")
            .with_sender("second");

        assert_eq!(event.senders(), ["first", "second"]);
    }

    #[test]
    fn display_contains_level_and_payload() {
        let registry = LevelRegistry::new();
        let event = LogEvent::new(registry.warning(), "disk almost full").with_sender("monitor");

        let display = event.to_string();
        assert!(display.contains("Warning"));
        assert!(display.contains("disk almost full"));
        assert!(display.contains("monitor"));
    }

    #[test]
    fn serialize_roundtrip_preserves_equality() {
        let registry = LevelRegistry::new();
        let event = LogEvent::new(registry.error(), Payload::Integer(7)).with_sender("core");

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: LogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn events_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<LogEvent>();
        assert_send_sync::<Payload>();
    }
}
