// The lab's two demo applications behind one listener.
//
// `/` serves the component playground, `/app` the article app, `/api/*` the
// article REST API. Suites spawn an instance per test so nothing is shared
// across tests; the `testbed` binary serves the same router for manual
// exploration.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

pub mod conduit;
pub mod playground;

/// Both applications merged into one router with a fresh article store.
pub fn router() -> Router {
    playground::router().merge(conduit::router())
}

/// A running in-process testbed.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Origin of the running server, e.g. `http://127.0.0.1:49231`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops the server. Dropping the handle has the same effect.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.abort();
    }
}

/// Binds an ephemeral port on localhost and serves the testbed from it.
pub async fn spawn() -> std::io::Result<ServerHandle> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let serve = axum::serve(listener, router()).with_graceful_shutdown(async {
            let _ = rx.await;
        });
        if let Err(error) = serve.await {
            tracing::warn!(target: "testbed", %error, "server stopped");
        }
    });
    info!(target: "testbed", %addr, "testbed listening");
    Ok(ServerHandle {
        addr,
        shutdown: Some(tx),
        task,
    })
}
