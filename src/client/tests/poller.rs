use super::*;
use std::time::Duration;

#[tokio::test]
async fn test_status_parses_snapshot() {
    let transport = ScriptedTransport::new();
    transport.script(
        STATUS_PATH,
        [Reply::json(
            200,
            json!({
                "Status": "PROCESSING",
                "JobId": "job-1",
                "WalletId": "w-9",
                "CreatedAt": "2024-05-01T10:00:00Z",
                "IsActive": true,
                "SourceDocuments": [{"name": "resume.pdf"}]
            }),
        )],
    );
    let client = test_client(transport.clone());

    let snapshot = client.poller().status(&job(Some("v-1"))).await.unwrap();

    assert_eq!(snapshot.status, JobStatus::Processing);
    assert_eq!(snapshot.wallet_id, "w-9");
    assert_eq!(snapshot.wallet_version_id.as_deref(), Some("v-1"));
    assert_eq!(snapshot.is_active, Some(true));
    assert!(snapshot.created_at_utc().is_some());
    assert_eq!(snapshot.source_documents, Some(json!([{"name": "resume.pdf"}])));
}

#[tokio::test]
async fn test_status_falls_back_to_job_fields() {
    let transport = ScriptedTransport::new();
    transport.script(STATUS_PATH, [Reply::json(200, json!({"Status": "COMPLETED"}))]);
    let client = test_client(transport.clone());

    let snapshot = client.poller().status(&job(Some("v-1"))).await.unwrap();

    assert_eq!(snapshot.job_id, "job-1");
    assert_eq!(snapshot.wallet_id, "w-1");
    assert_eq!(snapshot.wallet_version_id.as_deref(), Some("v-1"));
}

#[tokio::test]
async fn test_status_prefers_service_wallet_version() {
    let transport = ScriptedTransport::new();
    transport.script(
        STATUS_PATH,
        [Reply::json(
            200,
            json!({"Status": "COMPLETED", "WalletVersionId": "v-2"}),
        )],
    );
    let client = test_client(transport.clone());

    let snapshot = client.poller().status(&job(Some("v-1"))).await.unwrap();

    assert_eq!(snapshot.wallet_version_id.as_deref(), Some("v-2"));
}

#[tokio::test]
async fn test_status_non_success_is_rejected() {
    let transport = ScriptedTransport::new();
    transport.script(STATUS_PATH, [Reply::text(503, "busy")]);
    let client = test_client(transport.clone());

    let err = client.poller().status(&job(None)).await.unwrap_err();

    assert!(matches!(err, Error::StatusRejected { status: 503, .. }));
}

#[tokio::test]
async fn test_poll_survives_transient_failures() {
    let transport = ScriptedTransport::new();
    transport.script(
        STATUS_PATH,
        [
            Reply::text(503, "Service Unavailable"),
            Reply::Drop,
            Reply::text(200, "<html>gateway</html>"),
            status("COMPLETED"),
        ],
    );
    let client = test_client(transport.clone());

    let snapshot = client
        .poller()
        .poll_until_terminal(&job(None), &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(transport.count(STATUS_PATH), 4);
}

#[tokio::test]
async fn test_poll_survives_any_transport_error() {
    let transport = ScriptedTransport::new();
    transport.script(
        STATUS_PATH,
        [
            Reply::Fail(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "proxy tunnel closed",
                ))
            }),
            Reply::Fail(|| Error::config("proxy", "host stack misconfigured")),
            status("COMPLETED"),
        ],
    );
    let client = test_client(transport.clone());

    let snapshot = client
        .poller()
        .poll_until_terminal(&job(None), &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(transport.count(STATUS_PATH), 3);
}

#[tokio::test]
async fn test_single_status_query_surfaces_transport_error() {
    let transport = ScriptedTransport::new();
    transport.script(STATUS_PATH, [Reply::Drop]);
    let client = test_client(transport.clone());

    let err = client.poller().status(&job(None)).await.unwrap_err();

    assert!(matches!(err, Error::Io(_)));
}

#[tokio::test]
async fn test_poll_reports_each_non_terminal_tick() {
    let transport = ScriptedTransport::new();
    transport.script(
        STATUS_PATH,
        [status("PENDING"), status("PROCESSING"), status("COMPLETED")],
    );
    let client = test_client(transport.clone());

    let mut seen = Vec::new();
    client
        .poller()
        .poll_until_terminal(&job(None), &CancellationToken::new(), |s| {
            seen.push(s.substatus())
        })
        .await
        .unwrap();

    assert_eq!(seen, vec!["pending", "processing"]);
}

#[tokio::test]
async fn test_poll_failed_status_is_processing_error() {
    let transport = ScriptedTransport::new();
    transport.script(STATUS_PATH, [status("PROCESSING"), status("failed")]);
    let client = test_client(transport.clone());

    let err = client
        .poller()
        .poll_until_terminal(&job(None), &CancellationToken::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Processing { .. }));
    assert_eq!(transport.count(STATUS_PATH), 2);
}

#[tokio::test]
async fn test_poll_fails_fast_on_unknown_job() {
    let transport = ScriptedTransport::new();
    transport.script(STATUS_PATH, [Reply::text(404, "no such job")]);
    let client = test_client(transport.clone());

    let err = client
        .poller()
        .poll_until_terminal(&job(None), &CancellationToken::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StatusRejected { status: 404, .. }));
    assert_eq!(transport.count(STATUS_PATH), 1);
}

#[tokio::test]
async fn test_poll_keeps_going_on_client_error_when_configured() {
    let transport = ScriptedTransport::new();
    transport.script(
        STATUS_PATH,
        [
            Reply::text(404, "not yet"),
            Reply::text(404, "not yet"),
            status("COMPLETED"),
        ],
    );
    let mut config = test_config();
    config.polling.fail_fast_on_client_error = false;
    let client = test_client_with(config, transport.clone());

    client
        .poller()
        .poll_until_terminal(&job(None), &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(transport.count(STATUS_PATH), 3);
}

#[tokio::test(start_paused = true)]
async fn test_poll_gives_up_after_max_wait() {
    let transport = ScriptedTransport::new();
    transport.script(STATUS_PATH, [status("PROCESSING")]);
    let mut config = test_config();
    config.polling.interval = Duration::from_secs(3);
    config.polling.max_wait = Some(Duration::from_secs(10));
    let client = test_client_with(config, transport.clone());

    let err = client
        .poller()
        .poll_until_terminal(&job(None), &CancellationToken::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PollTimeout { .. }));
    // Ticks at 3s, 6s and 9s; a fourth at 12s would exceed the bound
    assert_eq!(transport.count(STATUS_PATH), 3);
}

#[tokio::test(start_paused = true)]
async fn test_poll_waits_one_interval_before_first_request() {
    let transport = ScriptedTransport::new();
    transport.script(STATUS_PATH, [status("COMPLETED")]);
    let mut config = test_config();
    config.polling.interval = Duration::from_secs(3);
    let client = test_client_with(config, transport.clone());

    let started = tokio::time::Instant::now();
    client
        .poller()
        .poll_until_terminal(&job(None), &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(transport.count(STATUS_PATH), 1);
}

#[tokio::test]
async fn test_poll_stops_when_cancelled() {
    let transport = ScriptedTransport::new();
    transport.script(STATUS_PATH, [status("PROCESSING")]);
    let client = test_client(transport.clone());
    let cancel = CancellationToken::new();

    let mut ticks = 0;
    let err = client
        .poller()
        .poll_until_terminal(&job(None), &cancel, |_| {
            ticks += 1;
            if ticks == 2 {
                cancel.cancel();
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(transport.count(STATUS_PATH), 2);
}

#[tokio::test]
async fn test_poll_already_cancelled_sends_nothing() {
    let transport = ScriptedTransport::new();
    let client = test_client(transport.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client
        .poller()
        .poll_until_terminal(&job(None), &cancel, |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(transport.requests().is_empty());
}
