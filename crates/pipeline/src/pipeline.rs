//! 파이프라인 엔진 -- 단일 소비 루프와 드레인 후 재시작 재구성
//!
//! [`LogPipeline`]은 무제한 ingress 큐, 세대별 단일 소비 태스크,
//! copy-on-write 구성 스냅샷으로 이루어집니다.
//!
//! # 내부 아키텍처
//! ```text
//! write() -> mpsc(unbounded) -> consume task -> filters -> transform -> join_all(sinks)
//! ```
//!
//! 재구성은 모두 내부의 "드레인 후 재시작" 시퀀스 하나로 수렴합니다:
//! (1) 큐를 새 세대로 교체, (2) 이전 소비 태스크의
//! 자연 종료 대기, (3) 싱크 플러시, (4) 스냅샷 변경 적용, (5) 새 소비
//! 태스크 시작. 이 순서 덕분에 어떤 이벤트도 커밋되지 않은 구성으로
//! 처리되지 않고, 세대 N의 이벤트는 세대 N+1의 어떤 이벤트보다 먼저
//! 싱크까지 전달됩니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use futures::future::join_all;
use metrics::counter;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use logfan_core::error::PipelineError;
use logfan_core::event::LogEvent;
use logfan_core::metrics::{
    PIPELINE_EVENTS_ENQUEUED_TOTAL, PIPELINE_EVENTS_FILTERED_TOTAL,
    PIPELINE_EVENTS_PROCESSED_TOTAL, PIPELINE_RESTARTS_TOTAL, PIPELINE_SINK_ERRORS_TOTAL,
};
use logfan_core::pipeline::{Filter, LogSink, Transform};

use crate::handle::{FilterHandle, SinkHandle};

/// 한 세대의 소비 태스크가 관찰하는 불변 구성 스냅샷
///
/// 재구성 시 통째로 교체되므로, 소비 태스크가 부분 갱신된 구성을
/// 보는 일은 없습니다.
#[derive(Clone, Default)]
pub(crate) struct Snapshot {
    /// 승인 필터 (등록 순서 유지, 전부 통과해야 함)
    pub(crate) filters: Vec<Filter>,
    /// 팬아웃 직전에 적용되는 트랜스폼 (None이면 통과)
    pub(crate) transform: Option<Transform>,
    /// 등록된 싱크
    pub(crate) sinks: Vec<Arc<dyn LogSink>>,
}

/// 소비 루프 -- 세대당 정확히 하나만 실행됩니다.
///
/// 큐가 닫히고 비워지면 정상 종료합니다. 싱크 에러는 로깅 후 계속
/// 진행하지만, 필터/트랜스폼/싱크의 패닉은 이 태스크를 종료시키고
/// 해당 세대를 멈춥니다.
async fn consume(mut receiver: UnboundedReceiver<LogEvent>, snapshot: Arc<Snapshot>) {
    while let Some(event) = receiver.recv().await {
        // 논리적 AND — 등록 순서로 평가하고 첫 탈락에서 중단한다
        if !snapshot.filters.iter().all(|filter| filter.accepts(&event)) {
            counter!(PIPELINE_EVENTS_FILTERED_TOTAL).increment(1);
            continue;
        }

        let event = match &snapshot.transform {
            Some(transform) => transform.apply(event),
            None => event,
        };

        // 모든 싱크에 동시 디스패치하고, 전부 끝나야 다음 이벤트로 넘어간다
        let results = join_all(snapshot.sinks.iter().map(|sink| sink.process(&event))).await;
        for (index, result) in results.into_iter().enumerate() {
            if let Err(error) = result {
                counter!(PIPELINE_SINK_ERRORS_TOTAL).increment(1);
                tracing::warn!(sink = index, %error, "sink failed to process event");
            }
        }

        counter!(PIPELINE_EVENTS_PROCESSED_TOTAL).increment(1);
    }
}

/// 스냅샷의 모든 싱크를 동시에 플러시합니다. 에러는 로깅만 합니다.
async fn flush_sinks(snapshot: &Snapshot) {
    let results = join_all(snapshot.sinks.iter().map(|sink| sink.flush())).await;
    for (index, result) in results.into_iter().enumerate() {
        if let Err(error) = result {
            counter!(PIPELINE_SINK_ERRORS_TOTAL).increment(1);
            tracing::warn!(sink = index, %error, "sink flush failed");
        }
    }
}

pub(crate) struct PipelineInner {
    /// 해제 플래그 — 전이는 `consumer` 뮤텍스 안에서만 일어난다
    disposed: AtomicBool,
    /// 현재 세대 큐의 송신측. 해제 후에는 None.
    ///
    /// 프로듀서는 읽기 잠금 아래에서 send하고, 세대 교체는 쓰기 잠금
    /// 아래에서 일어나므로 교체 이후 이전 송신측으로의 send는 없다.
    sender: RwLock<Option<UnboundedSender<LogEvent>>>,
    /// 현재 구성 스냅샷 (copy-on-write)
    snapshot: RwLock<Arc<Snapshot>>,
    /// 현재 소비 태스크 핸들. 재구성/해제의 직렬화 지점이기도 하다.
    consumer: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    /// 생성 시점에 캡처한 런타임 핸들 (`flush_blocking`용)
    runtime: tokio::runtime::Handle,
}

impl PipelineInner {
    fn ensure_open(&self) -> Result<(), PipelineError> {
        if self.disposed.load(Ordering::Acquire) {
            Err(PipelineError::Disposed)
        } else {
            Ok(())
        }
    }

    /// 드레인 후 재시작 -- 모든 재구성이 거치는 의사 트랜잭션
    async fn drain_and_restart(
        self: &Arc<Self>,
        mutate: impl FnOnce(&mut Snapshot),
    ) -> Result<(), PipelineError> {
        let mut consumer = self.consumer.lock().await;
        self.ensure_open()?;

        // 1. 큐를 새 세대로 교체 — 이후의 write는 새 큐에 쌓인다
        let (sender, receiver) = mpsc::unbounded_channel();
        let outgoing = {
            let mut guard = self.sender.write().expect("sender lock poisoned");
            guard.replace(sender)
        };
        // 이전 송신측을 닫아 소비 태스크가 드레인 후 자연 종료하게 한다
        drop(outgoing);

        // 2. 이전 소비 태스크가 남은 이벤트를 전부 처리할 때까지 대기
        if let Some(handle) = consumer.take() {
            if let Err(error) = handle.await {
                tracing::error!(%error, "outgoing consumer task failed");
            }
        }

        // 3. 변경 전 스냅샷의 싱크 전체 플러시
        let current = self
            .snapshot
            .read()
            .expect("snapshot lock poisoned")
            .clone();
        flush_sinks(&current).await;

        // 4. 구성 변경 적용
        let mut next = (*current).clone();
        mutate(&mut next);
        let next = Arc::new(next);
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::clone(&next);

        // 5. 새 세대 소비 태스크 시작
        *consumer = Some(self.runtime.spawn(consume(receiver, next)));
        counter!(PIPELINE_RESTARTS_TOTAL).increment(1);

        Ok(())
    }

    pub(crate) async fn remove_filter_entry(
        self: &Arc<Self>,
        filter: &Filter,
    ) -> Result<(), PipelineError> {
        let target = filter.clone();
        self.drain_and_restart(move |snapshot| {
            snapshot
                .filters
                .retain(|candidate| !candidate.same_as(&target));
        })
        .await
    }

    pub(crate) async fn remove_sink_entry(
        self: &Arc<Self>,
        sink: &Arc<dyn LogSink>,
    ) -> Result<(), PipelineError> {
        let target = Arc::clone(sink);
        self.drain_and_restart(move |snapshot| {
            snapshot
                .sinks
                .retain(|candidate| !Arc::ptr_eq(candidate, &target));
        })
        .await
    }
}

/// 로그 이벤트 분배 파이프라인
///
/// 프로듀서는 임의의 스레드/태스크에서 [`write`](Self::write)를 호출하고,
/// 엔진의 단일 소비 태스크가 필터 체인 -> 트랜스폼 -> 싱크 팬아웃 순으로
/// 이벤트를 처리합니다. 클론은 같은 파이프라인을 공유합니다.
///
/// # 수명
///
/// `Open`에서 시작해 [`dispose`](Self::dispose)로 단 한 번 `Disposed`로
/// 전이합니다. 해제는 이미 접수된 이벤트를 모두 전달한 뒤 완료되지만,
/// 싱크 플러시는 하지 않습니다 — 명시적 드레인이 필요하면
/// [`flush`](Self::flush)를 먼저 호출하십시오. 싱크의 해제 역시
/// 파이프라인 소관이 아니라 호출자 소유입니다.
///
/// # 실패 모드
///
/// 싱크의 process/flush 에러는 격리됩니다: 로깅/카운팅 후 나머지 싱크와
/// 이후 이벤트 처리는 계속됩니다. 반면 필터/트랜스폼/싱크의 **패닉**은
/// 소비 태스크를 죽이고, 다음 재구성 전까지 해당 세대의 처리를 멈춥니다
/// (write는 계속 접수만 됩니다).
///
/// # 사용 예시
/// ```
/// use logfan_core::{LevelRegistry, LogEvent};
/// use logfan_pipeline::LogPipeline;
///
/// # #[tokio::main(flavor = "multi_thread")]
/// # async fn main() -> Result<(), logfan_core::PipelineError> {
/// let registry = LevelRegistry::new();
/// let pipeline = LogPipeline::new();
///
/// pipeline.write(LogEvent::new(registry.info(), "hello"))?;
/// pipeline.flush().await?;
/// pipeline.dispose().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LogPipeline {
    inner: Arc<PipelineInner>,
}

impl LogPipeline {
    /// 필터/싱크/트랜스폼이 없는 빈 파이프라인을 생성합니다.
    ///
    /// # Panics
    /// Tokio 런타임 밖에서 호출하면 패닉합니다.
    pub fn new() -> Self {
        LogPipelineBuilder::new().build()
    }

    /// 일괄 등록 빌더를 반환합니다.
    pub fn builder() -> LogPipelineBuilder {
        LogPipelineBuilder::new()
    }

    fn with_snapshot(snapshot: Snapshot) -> Self {
        let runtime = tokio::runtime::Handle::current();
        let (sender, receiver) = mpsc::unbounded_channel();
        let snapshot = Arc::new(snapshot);
        let consumer = runtime.spawn(consume(receiver, Arc::clone(&snapshot)));

        Self {
            inner: Arc::new(PipelineInner {
                disposed: AtomicBool::new(false),
                sender: RwLock::new(Some(sender)),
                snapshot: RwLock::new(snapshot),
                consumer: tokio::sync::Mutex::new(Some(consumer)),
                runtime,
            }),
        }
    }

    /// 이벤트를 파이프라인에 기록합니다.
    ///
    /// 무제한 큐에 넣고 즉시 반환하며, 처리 결과를 기다리지 않습니다
    /// (fire-and-forget). 용량 때문에 거부되는 일은 없습니다.
    ///
    /// # Errors
    /// 해제된 파이프라인이면 [`PipelineError::Disposed`].
    pub fn write(&self, event: LogEvent) -> Result<(), PipelineError> {
        self.inner.ensure_open()?;

        let guard = self.inner.sender.read().expect("sender lock poisoned");
        let sender = guard.as_ref().ok_or(PipelineError::Disposed)?;
        sender.send(event).map_err(|_| PipelineError::Disposed)?;

        counter!(PIPELINE_EVENTS_ENQUEUED_TOTAL).increment(1);
        Ok(())
    }

    /// 승인 필터를 추가합니다.
    ///
    /// 드레인 후 재시작을 거치므로, 이 호출이 반환되면 이전에 기록된
    /// 이벤트는 모두 이전 필터 구성으로 처리가 끝난 상태입니다.
    /// 반환된 핸들을 해제하면 이 필터만 등록 해제됩니다.
    ///
    /// # Errors
    /// 해제된 파이프라인이면 [`PipelineError::Disposed`].
    pub async fn add_filter(&self, filter: Filter) -> Result<FilterHandle, PipelineError> {
        let registered = filter.clone();
        self.inner
            .drain_and_restart(move |snapshot| snapshot.filters.push(filter))
            .await?;

        tracing::debug!("filter added");
        Ok(FilterHandle::new(Arc::clone(&self.inner), registered))
    }

    /// 필터를 동일성 기준으로 제거합니다. 등록되어 있지 않으면
    /// 드레인만 수행하고 아무 것도 제거하지 않습니다.
    ///
    /// # Errors
    /// 해제된 파이프라인이면 [`PipelineError::Disposed`].
    pub async fn remove_filter(&self, filter: &Filter) -> Result<(), PipelineError> {
        self.inner.remove_filter_entry(filter).await
    }

    /// 싱크를 추가합니다.
    ///
    /// 프로토콜은 [`add_filter`](Self::add_filter)와 동일합니다.
    ///
    /// # Errors
    /// 해제된 파이프라인이면 [`PipelineError::Disposed`].
    pub async fn add_sink(&self, sink: Arc<dyn LogSink>) -> Result<SinkHandle, PipelineError> {
        let registered = Arc::clone(&sink);
        self.inner
            .drain_and_restart(move |snapshot| snapshot.sinks.push(sink))
            .await?;

        tracing::debug!("sink added");
        Ok(SinkHandle::new(Arc::clone(&self.inner), registered))
    }

    /// 싱크를 동일성(`Arc::ptr_eq`) 기준으로 제거합니다.
    ///
    /// # Errors
    /// 해제된 파이프라인이면 [`PipelineError::Disposed`].
    pub async fn remove_sink(&self, sink: &Arc<dyn LogSink>) -> Result<(), PipelineError> {
        self.inner.remove_sink_entry(sink).await
    }

    /// 트랜스폼을 설정하거나 (`None`으로) 해제합니다.
    ///
    /// `None`은 "변경 없이 통과"를 뜻합니다. 설정/해제 모두 드레인 후
    /// 재시작을 먼저 수행합니다.
    ///
    /// # Errors
    /// 해제된 파이프라인이면 [`PipelineError::Disposed`].
    pub async fn set_transform(&self, transform: Option<Transform>) -> Result<(), PipelineError> {
        self.inner
            .drain_and_restart(move |snapshot| snapshot.transform = transform)
            .await
    }

    /// 지금까지 기록된 이벤트를 모두 싱크까지 밀어내고, 모든 싱크의
    /// flush 훅을 호출합니다.
    ///
    /// 구성 변경 없는 드레인 후 재시작입니다.
    ///
    /// # Errors
    /// 해제된 파이프라인이면 [`PipelineError::Disposed`].
    pub async fn flush(&self) -> Result<(), PipelineError> {
        self.inner.drain_and_restart(|_| {}).await
    }

    /// [`flush`](Self::flush)의 동기 변형 -- 비동기 플러시가 완료될
    /// 때까지 호출 스레드를 블록합니다.
    ///
    /// 런타임 밖의 일반 스레드(예: 종료 경로)용입니다. 소비 태스크
    /// 안에서 호출하면 데드락입니다.
    ///
    /// # Errors
    /// 해제된 파이프라인이면 [`PipelineError::Disposed`], 런타임이 먼저
    /// 종료되어 플러시 태스크가 유실되면 [`PipelineError::Channel`].
    pub fn flush_blocking(&self) -> Result<(), PipelineError> {
        let inner = Arc::clone(&self.inner);
        let (tx, rx) = std::sync::mpsc::channel();

        self.inner.runtime.spawn(async move {
            let result = inner.drain_and_restart(|_| {}).await;
            let _ = tx.send(result);
        });

        rx.recv()
            .map_err(|_| PipelineError::Channel("flush task dropped before completion".to_owned()))?
    }

    /// 파이프라인을 해제합니다.
    ///
    /// 정확히 한 번의 호출만 성공합니다. ingress 큐를 닫고 소비 태스크의
    /// 자연 종료를 기다리므로, 이미 접수된 이벤트는 모두 전달됩니다.
    /// 싱크 플러시는 하지 않으며, 싱크 해제도 호출자 몫입니다.
    ///
    /// # Errors
    /// 두 번째 이후의 호출은 [`PipelineError::Disposed`].
    pub async fn dispose(&self) -> Result<(), PipelineError> {
        let mut consumer = self.inner.consumer.lock().await;
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return Err(PipelineError::Disposed);
        }

        let outgoing = self
            .inner
            .sender
            .write()
            .expect("sender lock poisoned")
            .take();
        drop(outgoing);

        if let Some(handle) = consumer.take() {
            if let Err(error) = handle.await {
                tracing::error!(%error, "consumer task failed during dispose");
            }
        }

        tracing::info!("pipeline disposed");
        Ok(())
    }

    /// 현재 등록된 필터의 시점 스냅샷을 반환합니다.
    ///
    /// 호출할 때마다 그 시점의 상태를 새로 읽습니다.
    ///
    /// # Errors
    /// 해제된 파이프라인이면 [`PipelineError::Disposed`].
    pub fn filters(&self) -> Result<Vec<Filter>, PipelineError> {
        self.inner.ensure_open()?;
        Ok(self
            .inner
            .snapshot
            .read()
            .expect("snapshot lock poisoned")
            .filters
            .clone())
    }

    /// 현재 등록된 싱크의 시점 스냅샷을 반환합니다.
    ///
    /// # Errors
    /// 해제된 파이프라인이면 [`PipelineError::Disposed`].
    pub fn sinks(&self) -> Result<Vec<Arc<dyn LogSink>>, PipelineError> {
        self.inner.ensure_open()?;
        Ok(self
            .inner
            .snapshot
            .read()
            .expect("snapshot lock poisoned")
            .sinks
            .clone())
    }

    /// 파이프라인이 해제되었는지 확인합니다.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl Default for LogPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// 파이프라인 일괄 등록 빌더
///
/// 생성 시점에 필터/싱크/트랜스폼을 함께 등록합니다. 첫 이벤트가
/// 기록되기 전에 `add_filter`/`add_sink`를 한 번씩 호출한 것과
/// 동등합니다.
#[derive(Default)]
pub struct LogPipelineBuilder {
    snapshot: Snapshot,
}

impl LogPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 승인 필터를 등록합니다.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.snapshot.filters.push(filter);
        self
    }

    /// 싱크를 등록합니다.
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.snapshot.sinks.push(sink);
        self
    }

    /// 트랜스폼을 설정합니다.
    pub fn transform(mut self, transform: Transform) -> Self {
        self.snapshot.transform = Some(transform);
        self
    }

    /// 파이프라인을 생성하고 소비 태스크를 시작합니다.
    ///
    /// # Panics
    /// Tokio 런타임 밖에서 호출하면 패닉합니다.
    pub fn build(self) -> LogPipeline {
        LogPipeline::with_snapshot(self.snapshot)
    }
}
