//! Scripted fake transport shared by the integration tests.

#![allow(dead_code)]

use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use smtpc::{
    Error, Job, JobHandle, Offload, Result, Session, SessionOption, Submission, TokioOffload,
    Transport, TransportCode, Version,
};

/// What one session does when performed.
#[derive(Debug, Clone, Copy)]
pub struct Script {
    pub code: TransportCode,
    pub response_code: i64,
    pub diagnostic: &'static str,
    pub os_errno: i32,
    pub chunk: usize,
    pub delay: Duration,
    pub panics: bool,
}

impl Script {
    pub const fn ok(response_code: i64) -> Self {
        Self {
            code: TransportCode::OK,
            response_code,
            diagnostic: "",
            os_errno: 0,
            chunk: 7,
            delay: Duration::ZERO,
            panics: false,
        }
    }

    pub const fn fail(code: TransportCode) -> Self {
        Self {
            code,
            response_code: 0,
            diagnostic: "",
            os_errno: 0,
            chunk: 7,
            delay: Duration::ZERO,
            panics: false,
        }
    }

    pub const fn diagnostic(mut self, text: &'static str) -> Self {
        self.diagnostic = text;
        self
    }

    pub const fn os_errno(mut self, errno: i32) -> Self {
        self.os_errno = errno;
        self
    }

    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Perform panics instead of returning a code.
    pub const fn panics(mut self) -> Self {
        self.panics = true;
        self
    }
}

/// One perform call as observed by the fake.
#[derive(Debug, Clone)]
pub struct Performed {
    pub recipients: Vec<String>,
    pub body: Vec<u8>,
    pub timeout: Duration,
    pub options: Vec<String>,
}

/// Counters and captures shared between the fake and the test.
#[derive(Debug, Default)]
pub struct Ledger {
    opened: AtomicUsize,
    closed: AtomicUsize,
    performed: Mutex<Vec<Performed>>,
    options: Mutex<Vec<String>>,
    closed_on: Mutex<Vec<ThreadId>>,
}

impl Ledger {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn performed(&self) -> Vec<Performed> {
        self.performed.lock().unwrap().clone()
    }

    /// Threads sessions were dropped on, in order.
    pub fn closed_on(&self) -> Vec<ThreadId> {
        self.closed_on.lock().unwrap().clone()
    }

    /// Waits until `n` sessions have been dropped.
    pub async fn wait_closed(&self, n: usize) {
        for _ in 0..200 {
            if self.closed() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {n} closed sessions, saw {}", self.closed());
    }

    /// Options set on the most recently opened session.
    pub fn options(&self) -> Vec<String> {
        self.options.lock().unwrap().clone()
    }
}

#[derive(Debug)]
pub struct FakeTransport {
    scripts: Mutex<VecDeque<Script>>,
    fallback: Script,
    ledger: Arc<Ledger>,
    fail_open: bool,
}

impl FakeTransport {
    /// Every session succeeds with 250.
    pub fn new() -> Self {
        Self::scripted([])
    }

    /// Sessions follow `scripts` in order, then succeed with 250.
    pub fn scripted(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            fallback: Script::ok(250),
            ledger: Arc::new(Ledger::default()),
            fail_open: false,
        }
    }

    /// Every session uses `script`.
    pub fn always(script: Script) -> Self {
        Self {
            fallback: script,
            ..Self::new()
        }
    }

    /// Sessions can never be created.
    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::new()
        }
    }

    pub fn ledger(&self) -> Arc<Ledger> {
        Arc::clone(&self.ledger)
    }
}

impl Transport for FakeTransport {
    fn open(&self) -> Result<Box<dyn Session>> {
        if self.fail_open {
            return Err(Error::Alloc("transport handle"));
        }
        self.ledger.opened.fetch_add(1, Ordering::SeqCst);
        self.ledger.options.lock().unwrap().clear();
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        Ok(Box::new(FakeSession {
            script,
            ledger: Arc::clone(&self.ledger),
            options: Vec::new(),
        }))
    }

    fn describe(&self, code: TransportCode) -> Cow<'static, str> {
        Cow::Borrowed(match code.as_i32() {
            6 => "Couldn't resolve host name",
            7 => "Couldn't connect to server",
            28 => "Timeout was reached",
            52 => "Server returned nothing (no headers, no data)",
            55 => "Failed sending data to the peer",
            60 => "SSL peer certificate or SSH remote key was not OK",
            _ => "Unknown error",
        })
    }

    fn version(&self) -> Version {
        Version::new(8, 5, 0)
    }
}

struct FakeSession {
    script: Script,
    ledger: Arc<Ledger>,
    options: Vec<String>,
}

impl Session for FakeSession {
    fn set_option(&mut self, option: SessionOption<'_>) -> Result<()> {
        let rendered = format!("{option:?}");
        self.ledger.options.lock().unwrap().push(rendered.clone());
        self.options.push(rendered);
        Ok(())
    }

    fn perform(&mut self, submission: &mut Submission<'_>) -> TransportCode {
        thread::sleep(self.script.delay);
        assert!(!self.script.panics, "transport crashed mid-transfer");

        let mut body = Vec::new();
        let mut chunk = vec![0u8; self.script.chunk];
        loop {
            let n = submission.body.read(&mut chunk);
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }

        let text = self.script.diagnostic.as_bytes();
        submission.errors.as_mut_bytes()[..text.len()].copy_from_slice(text);

        self.ledger.performed.lock().unwrap().push(Performed {
            recipients: submission.recipients.to_vec(),
            body,
            timeout: submission.timeout,
            options: self.options.clone(),
        });
        self.script.code
    }

    fn response_code(&self) -> i64 {
        self.script.response_code
    }

    fn os_errno(&self) -> i32 {
        self.script.os_errno
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.ledger
            .closed_on
            .lock()
            .unwrap()
            .push(thread::current().id());
        self.ledger.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Offload that counts the jobs it is given.
#[derive(Debug, Default)]
pub struct CountingOffload {
    jobs: AtomicUsize,
}

impl CountingOffload {
    pub fn jobs(&self) -> usize {
        self.jobs.load(Ordering::SeqCst)
    }
}

impl Offload for CountingOffload {
    fn spawn(&self, job: Job) -> JobHandle {
        self.jobs.fetch_add(1, Ordering::SeqCst);
        TokioOffload.spawn(job)
    }
}
