//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;

use content_saver::config::SaverConfig;
use content_saver::remote::{
    CommitInfo, CommitRef, FileWrite, RemoteError, RemoteRepository, RemoteResult, RevisionToken,
};
use content_saver::resilience::Delay;
use content_saver::{HttpServer, Shutdown};

pub const PASSWORD: &str = "correct horse";

/// A write the server issued against the fake repository.
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub path: String,
    pub message: String,
    pub content: String,
    pub revision: Option<String>,
}

/// In-memory repository with scripted conflicts.
#[derive(Default)]
pub struct FakeRepository {
    revision: Mutex<Option<String>>,
    latest: Mutex<Option<CommitInfo>>,
    conflicts_remaining: AtomicU32,
    writes: Mutex<Vec<RecordedWrite>>,
}

impl FakeRepository {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_revision(sha: &str) -> Arc<Self> {
        let repo = Self::default();
        *repo.revision.lock().unwrap() = Some(sha.to_string());
        Arc::new(repo)
    }

    pub fn set_latest_commit(&self, info: CommitInfo) {
        *self.latest.lock().unwrap() = Some(info);
    }

    /// Reject the next `n` writes as revision conflicts.
    pub fn fail_next_writes(&self, n: u32) {
        self.conflicts_remaining.store(n, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteRepository for FakeRepository {
    async fn read_revision(&self, _path: &str) -> RemoteResult<Option<RevisionToken>> {
        Ok(self
            .revision
            .lock()
            .unwrap()
            .as_deref()
            .map(RevisionToken::from))
    }

    async fn latest_commit(&self, _path: &str) -> RemoteResult<Option<CommitInfo>> {
        Ok(self.latest.lock().unwrap().clone())
    }

    async fn write_file(&self, write: &FileWrite<'_>) -> RemoteResult<CommitRef> {
        let pending = self.conflicts_remaining.load(Ordering::SeqCst);
        if pending > 0 {
            self.conflicts_remaining.store(pending - 1, Ordering::SeqCst);
            return Err(RemoteError::Conflict("sha does not match".into()));
        }

        let mut writes = self.writes.lock().unwrap();
        writes.push(RecordedWrite {
            path: write.path.to_string(),
            message: write.message.to_string(),
            content: write.content.to_string(),
            revision: write.revision.map(|r| r.as_str().to_string()),
        });
        let sha = format!("commit-{}", writes.len());
        *self.revision.lock().unwrap() = Some(format!("blob-{}", writes.len()));
        Ok(CommitRef { sha })
    }
}

/// Delay that returns immediately.
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self, _duration: Duration) {}
}

/// Fully configured settings pointing at a repository that is never dialed.
pub fn configured() -> SaverConfig {
    let mut config = SaverConfig::default();
    config.remote.token = Some("ghp_test".into());
    config.remote.repo = Some("alice/wiki".into());
    config.auth.save_password = Some(PASSWORD.into());
    config
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the server on an ephemeral port.
pub async fn start_server(
    config: SaverConfig,
    remote: Option<Arc<dyn RemoteRepository>>,
) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::with_parts(config, remote, Arc::new(NoDelay));
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestServer {
        addr,
        client: reqwest::Client::new(),
        shutdown,
    }
}

/// Start a fully configured server backed by `repo`.
pub async fn start_with(repo: &Arc<FakeRepository>) -> TestServer {
    let remote: Arc<dyn RemoteRepository> = repo.clone();
    start_server(configured(), Some(remote)).await
}
