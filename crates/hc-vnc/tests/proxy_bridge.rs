use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use hc_vnc::WsProxy;
use tokio_tungstenite::tungstenite::Message;

/// Servidor websocket de eco en su propio runtime; devuelve la URL.
fn spawn_echo_server() -> (tokio::runtime::Runtime, String) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let listener = rt.block_on(tokio::net::TcpListener::bind("127.0.0.1:0")).expect("bind");
    let addr = listener.local_addr().expect("addr");
    rt.spawn(async move {
          while let Ok((tcp, _)) = listener.accept().await {
              tokio::spawn(async move {
                  let mut ws = tokio_tungstenite::accept_async(tcp).await.expect("handshake ws");
                  while let Some(Ok(msg)) = ws.next().await {
                      if let Message::Binary(data) = msg {
                          let mut reply = b"echo:".to_vec();
                          reply.extend_from_slice(&data);
                          if ws.send(Message::binary(reply)).await.is_err() {
                              break;
                          }
                      }
                  }
              });
          }
      });
    (rt, format!("ws://{addr}/console"))
}

#[test]
fn bytes_round_trip_through_the_websocket() {
    let (_server, url) = spawn_echo_server();
    let mut proxy = WsProxy::start("127.0.0.1:0".parse().expect("addr"), &url).expect("proxy");

    let mut tcp = TcpStream::connect(proxy.local_addr()).expect("conectar al proxy");
    tcp.set_read_timeout(Some(Duration::from_secs(5))).expect("timeout");
    tcp.write_all(b"RFB").expect("escribir");

    let mut buf = [0u8; 8];
    tcp.read_exact(&mut buf).expect("leer eco");
    assert_eq!(&buf, b"echo:RFB");

    proxy.shutdown();
    proxy.shutdown(); // idempotente
}

#[test]
fn binding_an_occupied_port_fails_upfront() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = taken.local_addr().expect("addr");
    assert!(WsProxy::start(addr, "ws://127.0.0.1:1/").is_err());
}
