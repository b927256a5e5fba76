//! Execution, classification and statistics.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{CountingOffload, FakeTransport, Script};
use smtpc::{
    Environment, Error, ExecuteOutcome, ReplyCode, Request, STATUS_FAILED, Stat, TransportCode,
};

const TIMEOUT: Duration = Duration::from_secs(30);

fn request(env: &Arc<Environment>) -> Request {
    let mut request = Request::new(env, "smtp://localhost:2525", "me@example.com").unwrap();
    request.add_recipient("you@example.com").unwrap();
    request
}

#[tokio::test]
async fn success_reports_response_code_and_ok() {
    let transport = FakeTransport::scripted([Script::ok(250)]);
    let ledger = transport.ledger();
    let env = Environment::new(Arc::new(transport));

    let mut req = request(&env);
    req.add_recipient("other@example.com").unwrap();
    req.set_body(b"Subject: hi\r\n\r\nHello there, this body spans chunks.\r\n")
        .unwrap();

    let ExecuteOutcome::Completed(done) = req.execute(Duration::from_millis(2500)).await else {
        panic!("expected completed outcome");
    };
    assert_eq!(done.status(), 250);
    assert_eq!(done.reason(), "Ok");
    assert_eq!(done.reply_code(), Some(ReplyCode::OK));
    assert!(done.is_success());

    let performed = ledger.performed();
    assert_eq!(performed.len(), 1);
    assert_eq!(
        performed[0].recipients,
        ["you@example.com", "other@example.com"]
    );
    assert_eq!(
        performed[0].body,
        b"Subject: hi\r\n\r\nHello there, this body spans chunks.\r\n"
    );
    assert_eq!(performed[0].timeout, Duration::from_millis(2500));

    assert_eq!(
        env.stat(),
        Stat {
            active_requests: 0,
            total_requests: 1,
            failed_requests: 0,
        }
    );

    assert_eq!(ledger.closed(), 0);
    done.delete().await;
    assert_eq!(ledger.closed(), 1);
}

#[tokio::test]
async fn missing_body_reads_as_empty() {
    let transport = FakeTransport::new();
    let ledger = transport.ledger();
    let env = Environment::new(Arc::new(transport));

    let outcome = request(&env).execute(TIMEOUT).await;
    assert!(outcome.is_completed());
    assert!(ledger.performed()[0].body.is_empty());
    outcome.into_request().unwrap().delete().await;
}

#[tokio::test]
async fn certificate_failure_keeps_request_for_inspection() {
    let transport = FakeTransport::scripted([Script::fail(TransportCode::SSL_CACERT)]);
    let ledger = transport.ledger();
    let env = Environment::new(Arc::new(transport));

    let ExecuteOutcome::Failed(failed) = request(&env).execute(TIMEOUT).await else {
        panic!("expected recoverable failure");
    };
    assert_eq!(failed.status(), STATUS_FAILED);
    assert_eq!(
        failed.reason(),
        "SSL peer certificate or SSH remote key was not OK"
    );
    assert_eq!(failed.code(), TransportCode::SSL_CACERT);
    assert_eq!(failed.reply_code(), None);

    // Still owned by the caller until deleted.
    assert_eq!(ledger.closed(), 0);
    assert_eq!(env.stat().failed_requests, 1);
    failed.delete().await;
    assert_eq!(ledger.closed(), 1);
}

#[tokio::test]
async fn network_failures_are_recoverable() {
    let cases = [
        (TransportCode::OPERATION_TIMEDOUT, "Timeout was reached"),
        (
            TransportCode::GOT_NOTHING,
            "Server returned nothing (no headers, no data)",
        ),
        (TransportCode::COULDNT_CONNECT, "Couldn't connect to server"),
        (TransportCode::COULDNT_RESOLVE_HOST, "Couldn't resolve host name"),
    ];
    let transport = FakeTransport::scripted(cases.map(|(code, _)| Script::fail(code)));
    let env = Environment::new(Arc::new(transport));

    for (code, reason) in cases {
        let ExecuteOutcome::Failed(failed) = request(&env).execute(TIMEOUT).await else {
            panic!("expected recoverable failure for {code}");
        };
        assert_eq!(failed.status(), -1);
        assert_eq!(failed.reason(), reason);
        failed.delete().await;
    }

    let stat = env.stat();
    assert_eq!(stat.total_requests, 4);
    assert_eq!(stat.failed_requests, 4);
    assert_eq!(stat.active_requests, 0);
}

#[tokio::test]
async fn send_error_reason_carries_transport_diagnostic() {
    let transport = FakeTransport::scripted([
        Script::fail(TransportCode::SEND_ERROR).diagnostic("RCPT failed: 550"),
        Script::fail(TransportCode::SEND_ERROR),
    ]);
    let env = Environment::new(Arc::new(transport));

    let ExecuteOutcome::Failed(failed) = request(&env).execute(TIMEOUT).await else {
        panic!("expected recoverable failure");
    };
    assert_eq!(failed.status(), -1);
    assert_eq!(failed.reason(), "SMTP error: RCPT failed: 550");
    failed.delete().await;

    let ExecuteOutcome::Failed(failed) = request(&env).execute(TIMEOUT).await else {
        panic!("expected recoverable failure");
    };
    assert_eq!(failed.reason(), "SMTP error: Failed sending data to the peer");
    failed.delete().await;

    assert_eq!(env.stat().failed_requests, 2);
}

#[tokio::test]
async fn out_of_memory_consumes_the_request() {
    let transport = FakeTransport::scripted([Script::fail(TransportCode::OUT_OF_MEMORY)]);
    let ledger = transport.ledger();
    let env = Environment::new(Arc::new(transport));

    let outcome = request(&env).execute(TIMEOUT).await;
    assert!(outcome.request().is_none());
    let ExecuteOutcome::Fatal(err) = outcome else {
        panic!("expected fatal outcome");
    };
    assert!(matches!(err, Error::OutOfMemory));
    assert!(err.is_fatal());

    // Torn down by the engine, exactly once.
    assert_eq!(ledger.opened(), 1);
    assert_eq!(ledger.closed(), 1);
    assert_eq!(
        env.stat(),
        Stat {
            active_requests: 0,
            total_requests: 1,
            failed_requests: 1,
        }
    );
}

#[tokio::test]
async fn unknown_code_reports_code_and_errno() {
    let transport = FakeTransport::scripted([
        Script::fail(TransportCode::BAD_FUNCTION_ARGUMENT),
        Script::fail(TransportCode::new(56)).os_errno(104),
    ]);
    let ledger = transport.ledger();
    let env = Environment::new(Arc::new(transport));

    let ExecuteOutcome::Fatal(Error::Unknown { code, os_errno }) =
        request(&env).execute(TIMEOUT).await
    else {
        panic!("expected unknown fatal outcome");
    };
    assert_eq!(code, TransportCode::BAD_FUNCTION_ARGUMENT);
    assert_eq!(os_errno, 22);

    let ExecuteOutcome::Fatal(Error::Unknown { code, os_errno }) =
        request(&env).execute(TIMEOUT).await
    else {
        panic!("expected unknown fatal outcome");
    };
    assert_eq!(code.as_i32(), 56);
    assert_eq!(os_errno, 104);

    assert_eq!(ledger.closed(), 2);
    assert_eq!(env.stat().failed_requests, 2);
}

#[tokio::test]
async fn statistics_after_mixed_outcomes() {
    let transport = FakeTransport::scripted([
        Script::ok(250),
        Script::fail(TransportCode::OPERATION_TIMEDOUT),
        Script::ok(250),
        Script::fail(TransportCode::COULDNT_CONNECT),
        Script::ok(251),
    ]);
    let ledger = transport.ledger();
    let env = Environment::new(Arc::new(transport));

    for _ in 0..5 {
        let done = request(&env).execute(TIMEOUT).await.into_request().unwrap();
        done.delete().await;
    }

    assert_eq!(
        env.stat(),
        Stat {
            active_requests: 0,
            total_requests: 5,
            failed_requests: 2,
        }
    );
    assert_eq!(ledger.opened(), ledger.closed());
}

#[tokio::test]
async fn execute_and_delete_are_the_offloaded_steps() {
    let offload = Arc::new(CountingOffload::default());
    let env = Environment::with_offload(Arc::new(FakeTransport::new()), offload.clone());

    let done = request(&env).execute(TIMEOUT).await.into_request().unwrap();
    assert_eq!(offload.jobs(), 1);
    done.delete().await;
    assert_eq!(offload.jobs(), 2);
}

#[tokio::test]
async fn fatal_outcome_offloads_its_own_teardown() {
    let offload = Arc::new(CountingOffload::default());
    let transport = FakeTransport::scripted([Script::fail(TransportCode::OUT_OF_MEMORY)]);
    let env = Environment::with_offload(Arc::new(transport), offload.clone());

    let outcome = request(&env).execute(TIMEOUT).await;
    assert!(matches!(outcome, ExecuteOutcome::Fatal(Error::OutOfMemory)));
    assert_eq!(offload.jobs(), 2);
}

#[tokio::test]
async fn worker_panic_is_fatal_and_releases_the_session() {
    let transport = FakeTransport::scripted([Script::ok(250).panics()]);
    let ledger = transport.ledger();
    let env = Environment::new(Arc::new(transport));

    let outcome = request(&env).execute(TIMEOUT).await;
    assert!(outcome.request().is_none());
    let ExecuteOutcome::Fatal(err) = outcome else {
        panic!("expected fatal outcome");
    };
    assert!(matches!(err, Error::Worker(_)));
    assert!(err.is_fatal());
    assert_eq!(
        env.stat(),
        Stat {
            active_requests: 0,
            total_requests: 1,
            failed_requests: 1,
        }
    );

    ledger.wait_closed(1).await;
    assert_eq!(ledger.closed(), 1);
    assert!(ledger.performed().is_empty());
}

#[tokio::test]
async fn dropped_completed_request_is_torn_down_off_the_caller_thread() {
    let transport = FakeTransport::new();
    let ledger = transport.ledger();
    let env = Environment::new(Arc::new(transport));
    let caller = std::thread::current().id();

    let done = request(&env).execute(TIMEOUT).await.into_request().unwrap();
    assert_eq!(done.status(), 250);
    drop(done);

    ledger.wait_closed(1).await;
    let closed_on = ledger.closed_on();
    assert_eq!(closed_on.len(), 1);
    assert_ne!(closed_on[0], caller);
}

#[tokio::test]
async fn dropped_request_uses_the_environment_offload() {
    let offload = Arc::new(CountingOffload::default());
    let transport = FakeTransport::new();
    let ledger = transport.ledger();
    let env = Environment::with_offload(Arc::new(transport), offload.clone());

    drop(request(&env));
    assert_eq!(offload.jobs(), 1);
    ledger.wait_closed(1).await;

    let done = request(&env).execute(TIMEOUT).await.into_request().unwrap();
    drop(done);
    assert_eq!(offload.jobs(), 3);
    ledger.wait_closed(2).await;
    assert_eq!(ledger.opened(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_share_counters() {
    const REQUESTS: u64 = 8;

    let transport = FakeTransport::always(Script::ok(250).delay(Duration::from_millis(300)));
    let ledger = transport.ledger();
    let env = Environment::new(Arc::new(transport));

    let handles: Vec<_> = (0..REQUESTS)
        .map(|_| {
            let env = Arc::clone(&env);
            tokio::spawn(async move {
                let done = request(&env).execute(TIMEOUT).await.into_request().unwrap();
                let status = done.status();
                done.delete().await;
                status
            })
        })
        .collect();

    // The runtime stays responsive while every transaction is blocked.
    let mut peak = 0;
    for _ in 0..100 {
        peak = peak.max(env.stat().active_requests);
        if peak == REQUESTS {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(peak, REQUESTS);

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 250);
    }

    assert_eq!(
        env.stat(),
        Stat {
            active_requests: 0,
            total_requests: REQUESTS,
            failed_requests: 0,
        }
    );
    assert_eq!(ledger.closed(), 8);
}
