//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use claim_tracker::blockchain::{ChainError, ChainReader, ChainResult, Receipt};
use claim_tracker::claims::Event;
use claim_tracker::config::ReconcilerConfig;
use claim_tracker::queue::{
    ClaimAck, DeliveryQueueClient, DeliveryResult, QueueError, QueueRecord, QueueResult,
    QueueStatus,
};

pub const ALICE: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const BOB: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

pub fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

/// An active event where every given address is eligible for claim 1.
pub fn event(key: &str, eligible: &[&str]) -> Event {
    let mut event = Event {
        key: key.to_string(),
        active: true,
        ..Event::default()
    };
    for a in eligible {
        event.addresses.insert(a.to_lowercase(), vec![1]);
    }
    event
}

/// Fast cadence so loop tests finish quickly.
pub fn fast_reconciler() -> ReconcilerConfig {
    ReconcilerConfig {
        poll_interval_ms: 20,
        request_timeout_secs: 1,
    }
}

pub fn finished(hash: &str) -> QueueRecord {
    record(QueueStatus::Finished, Some(hash))
}

pub fn in_process() -> QueueRecord {
    record(QueueStatus::Pending, None)
}

pub fn finished_with_error() -> QueueRecord {
    record(QueueStatus::FinishedWithError, None)
}

fn record(status: QueueStatus, hash: Option<&str>) -> QueueRecord {
    QueueRecord {
        uid: None,
        status,
        result: Some(DeliveryResult {
            tx_hash: hash.map(str::to_string),
        }),
    }
}

pub fn mined(success: bool) -> Receipt {
    Receipt {
        status: success,
        block_number: Some(1),
    }
}

/// In-memory delivery queue with scripted answers and call counters.
#[derive(Default)]
pub struct FakeQueue {
    next_uid: Mutex<Vec<QueueResult<ClaimAck>>>,
    records: Mutex<HashMap<String, QueueRecord>>,
    failing: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
    submit_delay: Mutex<Option<Duration>>,
    pub submissions: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl FakeQueue {
    /// Queue the acknowledgement returned by the next submission.
    pub fn ack(&self, queue_uid: &str) {
        self.next_uid.lock().unwrap().push(Ok(ClaimAck {
            queue_uid: queue_uid.to_string(),
        }));
    }

    pub fn reject_next(&self) {
        self.next_uid.lock().unwrap().push(Err(QueueError::Rejected {
            status: 500,
            body: "boom".to_string(),
        }));
    }

    pub fn set(&self, queue_uid: &str, record: QueueRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(queue_uid.to_string(), record);
    }

    /// Make lookups of `queue_uid` fail until [`FakeQueue::heal`].
    pub fn fail(&self, queue_uid: &str) {
        self.failing.lock().unwrap().push(queue_uid.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Slow down claim submissions.
    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = Some(delay);
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryQueueClient for FakeQueue {
    async fn submit_claim(&self, _delivery_id: u64, _address: Address) -> QueueResult<ClaimAck> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let delay = *self.submit_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut replies = self.next_uid.lock().unwrap();
        if replies.is_empty() {
            return Err(QueueError::Malformed("no scripted reply".to_string()));
        }
        replies.remove(0)
    }

    async fn queue_status(&self, queue_uid: &str) -> QueueResult<QueueRecord> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().iter().any(|u| u == queue_uid) {
            return Err(QueueError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(queue_uid)
            .cloned()
            .unwrap_or_else(in_process))
    }
}

/// In-memory chain with scripted receipts, names and call counters.
#[derive(Default)]
pub struct FakeChain {
    pub connected: bool,
    names: Mutex<HashMap<String, Address>>,
    receipts: Mutex<HashMap<String, Receipt>>,
    failing: Mutex<bool>,
    pub receipt_calls: AtomicUsize,
}

impl FakeChain {
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn name(&self, name: &str, address: Address) {
        self.names.lock().unwrap().insert(name.to_string(), address);
    }

    pub fn mine(&self, hash: &str, receipt: Receipt) {
        self.receipts
            .lock()
            .unwrap()
            .insert(hash.to_string(), receipt);
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    fn has_identity_provider(&self) -> bool {
        self.connected
    }

    async fn resolve_name(&self, name: &str) -> ChainResult<Option<Address>> {
        Ok(self.names.lock().unwrap().get(name).copied())
    }

    async fn get_transaction_receipt(&self, hash: &str) -> ChainResult<Option<Receipt>> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        if *self.failing.lock().unwrap() {
            return Err(ChainError::Rpc("All RPC providers failed".to_string()));
        }
        Ok(self.receipts.lock().unwrap().get(hash).cloned())
    }
}

/// A request as seen by the programmable backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Start a programmable mock backend on an ephemeral port.
///
/// Reads each request in full before handing it to `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    Some(RecordedRequest { method, path, body })
}
