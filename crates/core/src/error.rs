//! 에러 타입 — 도메인별 에러 정의

/// Logfan 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogfanError {
    /// 레벨 레지스트리 에러
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// 파이프라인 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 싱크 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// 레벨 레지스트리 에러
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// 같은 이름의 레벨이 이미 존재함
    #[error("level '{name}' already exists")]
    DuplicateName {
        /// 중복된 레벨 이름
        name: String,
    },

    /// 기준 레벨이 레지스트리에 없음
    #[error("level '{name}' does not exist")]
    NotFound {
        /// 찾지 못한 레벨 이름
        name: String,
    },
}

/// 파이프라인 에러
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// 이미 해제된 파이프라인에 대한 호출
    #[error("pipeline is disposed")]
    Disposed,

    /// 내부 채널 통신 실패
    #[error("channel error: {0}")]
    Channel(String),
}

/// 싱크 처리 에러
///
/// 싱크 구현이 [`process`](crate::pipeline::LogSink::process) /
/// [`flush`](crate::pipeline::LogSink::flush)에서 반환하는 에러입니다.
/// 소비 루프는 이 에러를 로깅하고 계속 진행합니다.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 기타 싱크 에러
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_display() {
        let err = RegistryError::DuplicateName {
            name: "Fatal".to_owned(),
        };
        assert!(err.to_string().contains("Fatal"));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn pipeline_error_display() {
        assert_eq!(PipelineError::Disposed.to_string(), "pipeline is disposed");
        assert!(
            PipelineError::Channel("flush task dropped".to_owned())
                .to_string()
                .contains("flush task dropped")
        );
    }

    #[test]
    fn sink_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: SinkError = io_err.into();
        assert!(matches!(err, SinkError::Io(_)));
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn converts_to_top_level_error() {
        let err: LogfanError = PipelineError::Disposed.into();
        assert!(matches!(err, LogfanError::Pipeline(_)));

        let err: LogfanError = RegistryError::NotFound {
            name: "Trace".to_owned(),
        }
        .into();
        assert!(matches!(err, LogfanError::Registry(_)));
    }
}
