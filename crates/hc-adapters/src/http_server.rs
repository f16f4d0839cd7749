//! Servidor HTTP de archivos para la instancia que se está instalando
//! (kickstart, preseed, etc.).
//!
//! Corre en su propio runtime tokio; el step que lo crea es su dueño y lo
//! baja en su cleanup con `shutdown()` (también en `Drop`).

use std::io;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::{debug, info, warn};
use tokio::runtime::Runtime;
use tokio::sync::oneshot;

pub struct HttpServer {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    runtime: Option<Runtime>,
}

impl HttpServer {
    /// Sirve `root` en `listen`. Falla enseguida si el puerto está tomado.
    pub fn start(listen: SocketAddr, root: PathBuf) -> io::Result<Self> {
        let std_listener = StdTcpListener::bind(listen)?;
        std_listener.set_nonblocking(true)?;
        let local_addr = std_listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(1)
                                                                 .thread_name("hc-http")
                                                                 .enable_all()
                                                                 .build()?;
        let listener = {
            let _guard = runtime.enter();
            tokio::net::TcpListener::from_std(std_listener)?
        };
        let app = Router::new().route("/*path", get(serve_file))
                               .with_state(Arc::new(root.clone()));
        let (tx, rx) = oneshot::channel::<()>();
        runtime.spawn(async move {
                   let served = axum::serve(listener, app).with_graceful_shutdown(async {
                                                               let _ = rx.await;
                                                           })
                                                           .await;
                   if let Err(e) = served {
                       warn!("http server stopped with error: {e}");
                   }
               });
        info!("serving {} on {local_addr}", root.display());

        Ok(Self { local_addr,
                  shutdown: Some(tx),
                  runtime: Some(runtime) })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Idempotente.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            debug!("http server on {} stopped", self.local_addr);
        }
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sólo componentes normales: nada de `..` ni rutas absolutas.
fn resolve(root: &FsPath, requested: &str) -> Option<PathBuf> {
    let rel = FsPath::new(requested);
    if rel.components().all(|c| matches!(c, Component::Normal(_))) {
        Some(root.join(rel))
    } else {
        None
    }
}

async fn serve_file(State(root): State<Arc<PathBuf>>, Path(requested): Path<String>) -> Response {
    let Some(path) = resolve(&root, &requested) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("GET /{requested} -> {} bytes", bytes.len());
            (StatusCode::OK, bytes).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_components_are_refused() {
        let root = FsPath::new("/srv/http");
        assert_eq!(resolve(root, "ks/ks.cfg"), Some(PathBuf::from("/srv/http/ks/ks.cfg")));
        assert_eq!(resolve(root, "../etc/passwd"), None);
        assert_eq!(resolve(root, "a/../../b"), None);
    }
}
