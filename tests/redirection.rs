// tests/redirection.rs
mod common;
use crate::common::{Capture, CollectingDiagnostics, context_at, init_tracing, with_timeout};

use std::fs;

use pipeshell::errors::ErrorKind;
use pipeshell::exec::{ExecutionUnit, UnitStatus};

fn writer(ctx: &std::sync::Arc<pipeshell::context::ExecutionContext>, text: &'static str) -> ExecutionUnit {
    ExecutionUnit::with_context(ctx.clone(), move |io| {
        Box::pin(async move {
            io.println(text).await?;
            Ok(())
        })
    })
}

#[tokio::test]
async fn redirect_truncates_and_append_extends() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context_at(tmp.path());
        fs::write(tmp.path().join("out.txt"), "old contents\n").unwrap();

        assert!(writer(&ctx, "one").redirect("out.txt").unwrap().sh().await.is_success());
        assert!(writer(&ctx, "two").append("out.txt").unwrap().sh().await.is_success());

        let written = fs::read_to_string(tmp.path().join("out.txt")).unwrap();
        assert_eq!(written, "one\ntwo\n");
    })
    .await
}

#[tokio::test]
async fn redirect_resolves_against_the_context_folder() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        let ctx = context_at(tmp.path());
        ctx.set_current_folder(tmp.path().join("sub"));

        let report = writer(&ctx, "here").redirect("note.txt").unwrap().sh().await;
        assert!(report.is_success());
        assert_eq!(
            fs::read_to_string(tmp.path().join("sub/note.txt")).unwrap(),
            "here\n"
        );
    })
    .await
}

#[tokio::test]
async fn last_redirect_wins() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context_at(tmp.path());

        let report = writer(&ctx, "payload")
            .redirect("first.txt")
            .unwrap()
            .redirect("second.txt")
            .unwrap()
            .sh()
            .await;

        assert!(report.is_success());
        assert_eq!(fs::read_to_string(tmp.path().join("first.txt")).unwrap(), "");
        assert_eq!(
            fs::read_to_string(tmp.path().join("second.txt")).unwrap(),
            "payload\n"
        );
    })
    .await
}

#[tokio::test]
async fn redirect_from_feeds_file_lines() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("in.txt"), "a\nb\n").unwrap();
        let ctx = context_at(tmp.path());
        let out = Capture::new();

        let upper = ExecutionUnit::with_context(ctx.clone(), |io| {
            Box::pin(async move {
                while let Some(line) = io.read_line().await? {
                    io.println(&line.to_uppercase()).await?;
                }
                Ok(())
            })
        });

        let report = upper
            .redirect_from("in.txt")
            .unwrap()
            .set_output(out.binding())
            .sh()
            .await;
        assert!(report.is_success());
        assert_eq!(out.lines(), vec!["A", "B"]);
    })
    .await
}

#[tokio::test]
async fn redirect_from_missing_file_fails_before_start() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let ctx = context_at(tmp.path());

    let err = writer(&ctx, "x").redirect_from("absent.txt").unwrap_err();
    assert!(matches!(err, pipeshell::errors::ShellError::Io(_)));
}

#[tokio::test]
async fn blank_redirect_target_is_a_usage_error() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let ctx = context_at(tmp.path());

    let err = writer(&ctx, "x").redirect("  ").unwrap_err();
    assert!(matches!(err, pipeshell::errors::ShellError::Usage(_)));
}

#[tokio::test]
async fn body_error_is_reported_once_and_written_to_the_error_stream() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context_at(tmp.path());
        let diagnostics = CollectingDiagnostics::new();

        let failing = ExecutionUnit::with_context(ctx.clone(), |io| {
            Box::pin(async move {
                io.println("partial").await?;
                Err(anyhow::Error::new(pipeshell::errors::ShellError::usage("bad flag")))
            })
        })
        .named("broken")
        .with_diagnostics(diagnostics.clone())
        .redirect("out.txt")
        .unwrap()
        .redirect_err("err.txt")
        .unwrap();

        let report = failing.sh().await;

        assert_eq!(report.error_kind(), Some(ErrorKind::Usage));
        assert_eq!(diagnostics.count(), 1);
        let (unit, kind, message) = &diagnostics.reports()[0];
        assert_eq!(unit.as_str(), "broken");
        assert_eq!(*kind, ErrorKind::Usage);
        assert!(message.contains("bad flag"));

        // Output written before the failure is still flushed and closed.
        assert_eq!(fs::read_to_string(tmp.path().join("out.txt")).unwrap(), "partial\n");
        let err_text = fs::read_to_string(tmp.path().join("err.txt")).unwrap();
        assert!(err_text.starts_with("broken: usage error: bad flag"));
        assert_eq!(err_text.lines().count(), 1);
    })
    .await
}

#[tokio::test]
async fn panicking_body_becomes_a_panic_report() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let diagnostics = CollectingDiagnostics::new();
        let err = Capture::new();

        let report = ExecutionUnit::with_context(ctx.clone(), |_io| {
            Box::pin(async move {
                let explode = true;
                if explode {
                    panic!("boom");
                }
                Ok(())
            })
        })
        .with_diagnostics(diagnostics.clone())
        .set_error(err.binding())
        .sh()
        .await;

        match report.status {
            UnitStatus::Failed { kind, message } => {
                assert_eq!(kind, ErrorKind::Panic);
                assert!(message.contains("boom"));
            }
            UnitStatus::Succeeded => panic!("expected a failure"),
        }
        assert_eq!(diagnostics.count(), 1);
        assert!(err.contents().contains("boom"));
    })
    .await
}

#[tokio::test]
async fn failure_does_not_abort_sibling_units() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let out = Capture::new();

        let failing = ExecutionUnit::with_context(ctx.clone(), |_io| {
            Box::pin(async move { Err(anyhow::anyhow!("nope")) })
        })
        .set_error(pipeshell::exec::OutputBinding::Null)
        .start();
        let healthy = ExecutionUnit::with_context(ctx.clone(), |io| {
            Box::pin(async move {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                io.println("still here").await?;
                Ok(())
            })
        })
        .set_output(out.binding())
        .start();

        let failed = failing.wait().await;
        assert_eq!(failed.error_kind(), Some(ErrorKind::Other));
        assert!(healthy.wait().await.is_success());
        assert_eq!(out.lines(), vec!["still here"]);
    })
    .await
}

#[tokio::test]
async fn each_line_is_written_in_one_piece() {
    with_timeout(async {
        init_tracing();
        let ctx = context_at(&std::env::temp_dir());
        let out = Capture::new();
        let err = Capture::new();

        let report = ExecutionUnit::with_context(ctx.clone(), |io| {
            Box::pin(async move {
                io.println("one").await?;
                io.println("two").await?;
                io.eprintln("warning").await?;
                Ok(())
            })
        })
        .set_output(out.binding())
        .set_error(err.binding())
        .sh()
        .await;

        assert!(report.is_success());
        assert_eq!(out.writes(), vec!["one\n", "two\n"]);
        assert_eq!(err.writes(), vec!["warning\n"]);
    })
    .await
}
