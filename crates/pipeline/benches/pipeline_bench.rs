//! 파이프라인 벤치마크
//!
//! write -> 소비 -> 팬아웃 처리량과 필터 체인 오버헤드를 측정합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use logfan_core::error::SinkError;
use logfan_core::event::LogEvent;
use logfan_core::level::LevelRegistry;
use logfan_core::pipeline::{Filter, LogSink};
use logfan_pipeline::LogPipeline;

/// 수신 개수만 세는 벤치마크용 싱크
#[derive(Default)]
struct CountingSink {
    received: AtomicUsize,
}

#[async_trait]
impl LogSink for CountingSink {
    async fn process(&self, _event: &LogEvent) -> Result<(), SinkError> {
        self.received.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

fn bench_write_throughput(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let registry = LevelRegistry::new();

    let mut group = c.benchmark_group("pipeline_throughput");
    group.throughput(Throughput::Elements(1000));

    for sink_count in [1_usize, 4] {
        group.bench_function(format!("write_flush_1000_events_{sink_count}_sinks"), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let mut builder = LogPipeline::builder();
                    for _ in 0..sink_count {
                        builder = builder.sink(Arc::new(CountingSink::default()));
                    }
                    let pipeline = builder.build();

                    for i in 0..1000_i64 {
                        pipeline
                            .write(LogEvent::new(registry.info(), black_box(i)))
                            .unwrap();
                    }
                    pipeline.dispose().await.unwrap();
                })
            })
        });
    }

    group.finish();
}

fn bench_filter_chain(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let registry = LevelRegistry::new();

    let mut group = c.benchmark_group("filter_chain");
    group.throughput(Throughput::Elements(1000));

    for filter_count in [0_usize, 4] {
        group.bench_function(format!("write_1000_events_{filter_count}_filters"), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let mut builder =
                        LogPipeline::builder().sink(Arc::new(CountingSink::default()));
                    for _ in 0..filter_count {
                        builder = builder.filter(Filter::new(|_| true));
                    }
                    let pipeline = builder.build();

                    for i in 0..1000_i64 {
                        pipeline
                            .write(LogEvent::new(registry.info(), black_box(i)))
                            .unwrap();
                    }
                    pipeline.dispose().await.unwrap();
                })
            })
        });
    }

    group.finish();
}

fn bench_reconfiguration(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("reconfiguration");
    group.throughput(Throughput::Elements(1));

    group.bench_function("add_then_release_filter", |b| {
        b.iter(|| {
            rt.block_on(async {
                let pipeline = LogPipeline::builder()
                    .sink(Arc::new(CountingSink::default()))
                    .build();

                let mut handle = pipeline.add_filter(Filter::new(|_| true)).await.unwrap();
                handle.release().await.unwrap();
                pipeline.dispose().await.unwrap();
            })
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_write_throughput,
    bench_filter_chain,
    bench_reconfiguration
);
criterion_main!(benches);
