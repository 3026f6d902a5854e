use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use agent_timeline::{logging, ClientConfig, Session};
use anyhow::{Context, Result};
use timeline_client::console::{Console, Flow};
use timeline_client::runtime::RuntimeController;
use timeline_client::transports::transport_for_id;
use tracing::info;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

fn main() -> Result<()> {
    let config = ClientConfig::from_env()?;
    logging::init(&config.log_filter)?;

    let transport = transport_for_id(&config.transport_id)?;
    let profile = transport.profile();
    info!(
        transport = %profile.transport_id,
        assistant = %profile.assistant_id,
        persona = %config.persona,
        reasoning_model = %config.reasoning_model,
        "client starting"
    );

    let session = Arc::new(Mutex::new(Session::new()));
    let host = RuntimeController::new(session, transport);
    let mut console = Console::new(host, &config, io::stdout());
    console.greet(&profile)?;

    let lines = spawn_stdin_reader()?;
    loop {
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                if console.handle_line(&line)? == Flow::Quit {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // stdin closed: let the in-flight turn finish, then leave.
                if !console.is_busy() {
                    break;
                }
                thread::sleep(POLL_INTERVAL);
            }
        }

        console.poll()?;
    }

    info!("client exiting");
    Ok(())
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if sender.send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn stdin reader")?;
    Ok(receiver)
}
