//! Browser socket driver for the live channel.
//!
//! Owns the `gloo-net` WebSocket and feeds its events into [`Transport`].
//! The transport decides what happens after a close; this loop only waits
//! as told, listening on the waker so a disconnect or reconnect can cut a
//! backoff short.

use std::rc::Rc;

use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use gloo_net::websocket::Message;
use gloo_net::websocket::futures::WebSocket;

use super::transport::Transport;
use crate::util::clock::now_ms;

/// Start the connect/reconnect loop as a local task.
pub fn spawn_live_socket(transport: Rc<Transport>, url: String) {
    let (waker, wake) = mpsc::unbounded::<()>();
    transport.set_waker(waker);
    wasm_bindgen_futures::spawn_local(socket_loop(transport, url, wake));
}

async fn socket_loop(transport: Rc<Transport>, url: String, mut wake: mpsc::UnboundedReceiver<()>) {
    loop {
        if transport.begin_connect() {
            if let Err(e) = connect_and_run(&transport, &url).await {
                transport.on_error(&e);
            }
        }

        let plan = transport.on_close(now_ms());
        if !transport.wait_to_redial(plan, &mut wake, gloo_timers::future::TimeoutFuture::new).await {
            return;
        }
    }
}

/// Connect and pump messages until either direction finishes.
async fn connect_and_run(transport: &Transport, url: &str) -> Result<(), String> {
    let ws = WebSocket::open(url).map_err(|e| e.to_string())?;
    let (mut ws_write, mut ws_read) = ws.split();

    let (tx, mut rx) = mpsc::unbounded::<String>();
    transport.on_open(tx, now_ms());

    // Ends when the transport drops its sender (disconnect / reconnect).
    let send_task = async {
        while let Some(text) = rx.next().await {
            if ws_write.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    };

    let recv_task = async {
        while let Some(msg) = ws_read.next().await {
            match msg {
                Ok(Message::Text(text)) => transport.on_message(&text, now_ms()),
                Ok(Message::Bytes(bytes)) => log::debug!("ignoring {} byte binary message", bytes.len()),
                Err(e) => {
                    transport.on_error(&e.to_string());
                    break;
                }
            }
        }
    };

    futures::future::select(Box::pin(send_task), Box::pin(recv_task)).await;
    Ok(())
}
