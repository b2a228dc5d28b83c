//! Console transport: stdin/stdout, one conversation, handy for local use.

use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::{Agent, ConversationId, InboundEvent, Transport, TransportError};

pub const CONSOLE_CONVERSATION: &str = "console";

pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_text(
        &self,
        _conversation: &ConversationId,
        text: &str,
    ) -> Result<(), TransportError> {
        println!("{text}\n");
        Ok(())
    }
}

/// Feeds stdin lines to `agent` until EOF, `/quit` or `/exit`.
pub async fn run(agent: &Agent) -> std::io::Result<()> {
    tracing::info!("Starting console session, type /quit to leave");
    agent.handle_event(InboundEvent::SessionReset).await;

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }
        agent
            .handle_event(InboundEvent::message(CONSOLE_CONVERSATION, line))
            .await;
    }
    Ok(())
}
