//! Native driver for the live channel.
//!
//! Feeds a tokio-tungstenite socket into the client [`Transport`] the same
//! way the browser socket loop does, and prints the status line on a fixed
//! interval. The transport decides reconnect timing; this loop only waits.

use std::rc::Rc;
use std::time::Duration;

use client::config::ClientConfig;
use client::net::transport::{ReconnectPlan, Transport};
use client::util::clock::now_ms;
use client::util::stats::{StatusLine, status_line};
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use store::Store;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::{CliError, WatchArgs, live_url};

pub(crate) async fn run(base_url: &str, args: WatchArgs) -> Result<(), CliError> {
    let config = ClientConfig { max_reconnect_attempts: args.max_attempts, ..ClientConfig::default() };
    let url = live_url(base_url, &config)?;
    let transport = Transport::new(Rc::new(Store::new()), config);
    let (waker, mut wake) = mpsc::unbounded::<()>();
    transport.set_waker(waker);
    tracing::info!(%url, "watching live channel");

    let watching = follow(&transport, &url, &args, &mut wake);
    let Some(seconds) = args.seconds else {
        return watching.await;
    };
    match tokio::time::timeout(Duration::from_secs(seconds), watching).await {
        Ok(result) => result,
        Err(_) => {
            transport.disconnect();
            print_status(&transport);
            Ok(())
        }
    }
}

/// Dial, pump and redial until the transport stops or gives up.
async fn follow(
    transport: &Transport,
    url: &str,
    args: &WatchArgs,
    wake: &mut mpsc::UnboundedReceiver<()>,
) -> Result<(), CliError> {
    loop {
        if transport.begin_connect() {
            match pump(transport, url, args).await {
                Ok(()) => {}
                Err(CliError::Ws(e)) => transport.on_error(&e.to_string()),
                Err(other) => return Err(other),
            }
        }

        let plan = transport.on_close(now_ms());
        match plan {
            ReconnectPlan::After(ms) => {
                tracing::info!(delay_ms = ms, attempt = transport.attempts(), "reconnecting");
            }
            ReconnectPlan::Stop => return Ok(()),
            ReconnectPlan::GiveUp => return Err(CliError::GaveUp(transport.config().max_reconnect_attempts)),
        }
        let sleep = |ms: u32| tokio::time::sleep(Duration::from_millis(u64::from(ms)));
        if !transport.wait_to_redial(plan, wake, sleep).await {
            return Ok(());
        }
    }
}

/// Connect and pump both directions until the link closes.
async fn pump(transport: &Transport, url: &str, args: &WatchArgs) -> Result<(), CliError> {
    let (stream, _) = connect_async(url).await.map_err(CliError::ws)?;
    let (mut ws_write, mut ws_read) = stream.split();

    let (tx, mut rx) = mpsc::unbounded::<String>();
    transport.on_open(tx, now_ms());

    let mut ticker = tokio::time::interval(Duration::from_millis(u64::from(args.interval_ms.max(1))));
    loop {
        tokio::select! {
            _ = ticker.tick() => print_status(transport),
            outbound = rx.next() => match outbound {
                Some(text) => ws_write.send(Message::Text(text.into())).await.map_err(CliError::ws)?,
                // Transport dropped its sender: disconnect or forced reconnect.
                None => return Ok(()),
            },
            inbound = ws_read.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if args.strict {
                        wire::decode_message(text.as_str())?;
                    }
                    transport.on_message(text.as_str(), now_ms());
                }
                Some(Ok(Message::Binary(bytes))) => tracing::debug!(len = bytes.len(), "ignoring binary message"),
                Some(Ok(Message::Close(_))) | None => return Ok(()),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(CliError::ws(e)),
            },
        }
    }
}

fn print_status(transport: &Transport) {
    let store = transport.store();
    println!("{}", render_status(&status_line(store, now_ms())));
    if let Some(error) = store.link_error() {
        tracing::warn!(%error, "live channel");
    }
}

/// One console line for a status snapshot; stale ages are flagged.
pub(crate) fn render_status(line: &StatusLine) -> String {
    let age = if line.age_class.is_empty() {
        line.age.clone()
    } else {
        format!("{} ({})", line.age, line.age_class)
    };
    format!("[{}] {} {} {} {}", line.connection, line.frame, age, line.fps, line.counters)
}
