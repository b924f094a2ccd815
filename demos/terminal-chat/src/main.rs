//! Terminal host for a parley session backed by Gemini.
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! RUST_LOG=parley_session=debug cargo run -p terminal-chat
//! ```
//!
//! Optional: `PARLEY_MODEL`, `PARLEY_SYSTEM_INSTRUCTION`. Type `/quit` to leave.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use parley::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Prints the assistant reply as it streams in.
#[derive(Default)]
struct TerminalRenderer {
    state: Mutex<RenderState>,
}

#[derive(Default)]
struct RenderState {
    id: Option<MessageId>,
    printed: usize,
    done: bool,
}

impl SessionObserver for TerminalRenderer {
    fn on_change(&self, view: &SessionView) {
        let Some(last) = view.messages.last() else {
            return;
        };
        if last.role != Role::Assistant {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.id.as_ref() != Some(&last.id) {
            *state = RenderState {
                id: Some(last.id.clone()),
                printed: 0,
                done: false,
            };
            print!("assistant> ");
        }
        if state.done {
            return;
        }
        if let Some(new) = last.content.get(state.printed..) {
            print!("{new}");
            state.printed = last.content.len();
        }
        if !last.streaming {
            println!();
            state.done = true;
        }
        let _ = std::io::stdout().flush();
    }
}

fn chat_config_from_env() -> ChatConfig {
    let mut config = ChatConfig::default();
    if let Ok(model) = std::env::var("PARLEY_MODEL") {
        config = config.model(model);
    }
    if let Ok(instruction) = std::env::var("PARLEY_SYSTEM_INSTRUCTION") {
        config = config.system_instruction(instruction);
    }
    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let provider = Gemini::from_env();
    let config = SessionConfig::default().chat(chat_config_from_env());
    let mut session = Session::start(&provider, config);

    if let Some(error) = session.error() {
        eprintln!("{error}");
        std::process::exit(1);
    }
    for message in session.transcript().iter() {
        println!("assistant> {}", message.content);
    }
    session.observe(TerminalRenderer::default());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }
        if let Err(e) = session.submit(&line).await {
            tracing::debug!(error = %e, "turn failed");
            println!();
            eprintln!("{}", session.error().map_or_else(|| e.to_string(), str::to_owned));
            session.dismiss_error();
        }
    }
    Ok(())
}
