#![allow(dead_code)]

// Tiny fixture server: each test hands in a router (usually one inline HTML
// page) and gets an ephemeral localhost origin back.

use std::net::SocketAddr;

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use uilab::{BrowserSession, LabConfig};

pub struct Fixture {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Fixture {
    pub async fn serve(router: Router) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("Failed to bind the fixture server");
        let addr = listener.local_addr().expect("Failed to read the bound address");
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await;
        });
        Self {
            addr,
            shutdown: Some(tx),
            task,
        }
    }

    /// One static page at `/`.
    pub async fn page(html: &'static str) -> Self {
        Self::serve(Router::new().route("/", get(move || async move { Html(html) }))).await
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.abort();
    }
}

pub async fn launch() -> BrowserSession {
    uilab::init_tracing();
    BrowserSession::launch(&LabConfig::from_env())
        .await
        .expect("Failed to launch browser")
}
