// tests/pipelines.rs
mod common;
use crate::common::{Capture, Recorder, context_at, init_tracing, with_timeout};

use std::time::Duration;

use pipeshell::errors::ErrorKind;
use pipeshell::exec::{ExecutionUnit, InputBinding, OutputBinding, UnitStatus};

const LINES: &[&str] = &["ehlo", "mydarling", "seeyou"];

#[tokio::test]
async fn two_stage_pipeline_delivers_every_line() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let rec = Recorder::new();
        let out = Capture::new();

        let report = rec
            .emitter(&ctx, "p1", LINES, Duration::ZERO)
            .pipe(rec.tester(&ctx, "p2").set_output(out.binding()))
            .sh()
            .await;

        assert!(report.is_success());
        let mut ran = rec.ran();
        ran.sort();
        assert_eq!(ran, vec!["p1", "p2"]);
        assert_eq!(rec.lines_of("p2"), LINES);
        assert_eq!(out.lines(), LINES);
    })
    .await
}

#[tokio::test]
async fn three_stage_pipeline_drains_through_the_middle() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let rec = Recorder::new();
        let out = Capture::new();

        let report = rec
            .emitter(&ctx, "p1", LINES, Duration::ZERO)
            .pipe(rec.tester(&ctx, "p2"))
            .pipe(rec.tester(&ctx, "p3").set_output(out.binding()))
            .sh()
            .await;

        assert!(report.is_success());
        assert_eq!(rec.ran().len(), 3);
        assert_eq!(rec.lines_of("p2").len(), 3);
        assert_eq!(rec.lines_of("p3").len(), 3);
        assert_eq!(out.lines(), LINES);
    })
    .await
}

#[tokio::test]
async fn consumer_waits_for_slow_producer() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let rec = Recorder::new();

        let report = rec
            .emitter(&ctx, "p1", LINES, Duration::from_millis(300))
            .pipe(rec.tester(&ctx, "p2").to_null())
            .sh()
            .await;

        assert!(report.is_success());
        assert_eq!(rec.lines_of("p2"), LINES);
    })
    .await
}

#[tokio::test]
async fn producer_waits_for_slow_consumer() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let rec = Recorder::new();

        let report = rec
            .emitter(&ctx, "p1", LINES, Duration::ZERO)
            .pipe(
                rec.slow_tester(&ctx, "p2", Duration::from_millis(300))
                    .to_null(),
            )
            .sh()
            .await;

        assert!(report.is_success());
        assert_eq!(rec.lines_of("p2"), LINES);
    })
    .await
}

#[tokio::test]
async fn tiny_pipe_carries_large_output_in_order() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let out = Capture::new();

        let producer = ExecutionUnit::with_context(ctx.clone(), |io| {
            Box::pin(async move {
                for i in 0..2000 {
                    io.println(&format!("line {i}")).await?;
                }
                Ok(())
            })
        });
        let consumer = ExecutionUnit::with_context(ctx.clone(), |io| {
            Box::pin(async move {
                let lines = io.read_lines().await?;
                io.println(&lines.len().to_string()).await?;
                io.println(&lines[1999]).await?;
                Ok(())
            })
        })
        .set_output(out.binding());

        let report = producer.pipe_with_capacity(consumer, 7).sh().await;
        assert!(report.is_success(), "{report:?}");
        assert_eq!(out.lines(), vec!["2000", "line 1999"]);
    })
    .await
}

#[tokio::test]
async fn early_exit_downstream_breaks_the_producer_only() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let out = Capture::new();

        let producer = ExecutionUnit::with_context(ctx.clone(), |io| {
            Box::pin(async move {
                // Far more than the pipe holds; the write fails once `head` exits.
                for _ in 0..1_000_000 {
                    io.println("y").await?;
                }
                Ok(())
            })
        })
        .named("yes")
        .set_error(OutputBinding::Null);
        let head = ExecutionUnit::with_context(ctx.clone(), |io| {
            Box::pin(async move {
                if let Some(line) = io.read_line().await? {
                    io.println(&line).await?;
                }
                Ok(())
            })
        })
        .named("head")
        .set_output(out.binding());

        let reports = producer.pipe(head).start().wait_all().await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].unit.as_str(), "yes");
        assert_eq!(reports[0].error_kind(), Some(ErrorKind::Io));
        assert!(reports[1].is_success());
        assert_eq!(out.lines(), vec!["y"]);
    })
    .await
}

#[tokio::test]
async fn failing_midstream_unit_closes_the_stream_for_downstream() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let rec = Recorder::new();

        let reports = rec
            .emitter(&ctx, "p1", LINES, Duration::ZERO)
            .pipe(rec.failing(&ctx, "p2").set_error(OutputBinding::Null))
            .pipe(rec.tester(&ctx, "p3").to_null())
            .start()
            .wait_all()
            .await;

        assert_eq!(reports.len(), 3);
        assert!(matches!(
            reports[1].status,
            UnitStatus::Failed {
                kind: ErrorKind::State,
                ..
            }
        ));
        assert!(reports[2].is_success());
        assert!(rec.lines_of("p3").is_empty());
    })
    .await
}

#[tokio::test]
async fn pipe_returns_the_tail_with_its_predecessor() {
    init_tracing();
    let ctx = context_at(&std::env::temp_dir());
    let rec = Recorder::new();

    let head = rec.emitter(&ctx, "a", LINES, Duration::ZERO);
    let tail = rec.tester(&ctx, "b");
    assert!(!tail.has_predecessor());

    let chain = head.pipe(tail);
    assert_eq!(chain.id().as_str(), "b");
    assert!(chain.has_predecessor());
}

#[tokio::test]
async fn input_can_come_from_any_reader() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let rec = Recorder::new();
        let out = Capture::new();

        let report = rec
            .tester(&ctx, "t")
            .set_input(InputBinding::reader(&b"one\r\ntwo\nthree"[..]))
            .set_output(out.binding())
            .sh()
            .await;

        assert!(report.is_success());
        assert_eq!(rec.lines_of("t"), vec!["one", "two", "three"]);
        assert_eq!(out.contents(), "one\ntwo\nthree\n");
    })
    .await
}
