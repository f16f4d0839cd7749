//! Proxy TCP local -> websocket de la consola remota.
//!
//! La consola VNC de HyperCloud sólo se expone como websocket; el cliente
//! RFB habla TCP. Cada conexión aceptada en el listener local abre su propio
//! websocket y copia bytes en ambos sentidos (frames binarios).
//!
//! El proxy es dueño de su runtime tokio; `shutdown()` (o `Drop`) cierra el
//! listener vía un canal `oneshot` y baja el runtime.

use std::net::{SocketAddr, TcpListener as StdTcpListener};

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

use crate::VncError;

pub struct WsProxy {
    local_addr: SocketAddr,
    ws_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    runtime: Option<Runtime>,
}

impl WsProxy {
    /// Escucha en `listen` y puentea cada conexión a `ws_url`.
    pub fn start(listen: SocketAddr, ws_url: &str) -> Result<Self, VncError> {
        let std_listener = StdTcpListener::bind(listen)?;
        std_listener.set_nonblocking(true)?;
        let local_addr = std_listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(1)
                                                                 .thread_name("hc-vnc-proxy")
                                                                 .enable_all()
                                                                 .build()?;
        let (tx, rx) = oneshot::channel();
        let url = ws_url.to_string();
        let listener = {
            let _guard = runtime.enter();
            TcpListener::from_std(std_listener)?
        };
        runtime.spawn(accept_loop(listener, url, rx));
        info!("vnc proxy listening on {local_addr} -> {ws_url}");

        Ok(Self { local_addr,
                  ws_url: ws_url.to_string(),
                  shutdown: Some(tx),
                  runtime: Some(runtime) })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Idempotente.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            debug!("vnc proxy on {} stopped", self.local_addr);
        }
    }
}

impl Drop for WsProxy {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn accept_loop(listener: TcpListener, url: String, mut shutdown: oneshot::Receiver<()>) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((tcp, peer)) => {
                    debug!("vnc proxy accepted {peer}");
                    let url = url.clone();
                    tokio::spawn(async move {
                        if let Err(e) = bridge(tcp, &url).await {
                            warn!("vnc proxy connection from {peer} ended: {e}");
                        }
                    });
                }
                Err(e) => warn!("vnc proxy accept failed: {e}"),
            },
        }
    }
}

async fn bridge(tcp: TcpStream, url: &str) -> Result<(), VncError> {
    let (ws, _) = tokio_tungstenite::connect_async(url).await
                                                      .map_err(|e| VncError::Proxy(format!("{url}: {e}")))?;
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (mut tcp_rx, mut tcp_tx) = tcp.into_split();

    let upstream = async {
        let mut buf = vec![0u8; 16 * 1024];
        loop {
            let n = tcp_rx.read(&mut buf).await?;
            if n == 0 {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
            ws_tx.send(Message::binary(buf[..n].to_vec()))
                 .await
                 .map_err(|e| VncError::Proxy(e.to_string()))?;
        }
        Ok::<(), VncError>(())
    };

    let downstream = async {
        while let Some(msg) = ws_rx.next().await {
            match msg.map_err(|e| VncError::Proxy(e.to_string()))? {
                Message::Close(_) => break,
                Message::Binary(data) => tcp_tx.write_all(&data).await?,
                Message::Text(text) => tcp_tx.write_all(text.as_bytes()).await?,
                _ => {}
            }
        }
        tcp_tx.shutdown().await?;
        Ok::<(), VncError>(())
    };

    tokio::select! {
        r = upstream => r,
        r = downstream => r,
    }
}
