//! Telegram transport.
//!
//! Chat ids become conversation ids; every start of the dispatcher is treated
//! as a transport reset, so no confirmation survives a reconnect.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatId, User},
};

use crate::{Agent, AgentBuilder, ConversationId, InboundEvent, Transport, TransportError};

#[derive(Clone)]
struct TelegramParameters {
    allowed_users: Option<Vec<UserId>>,
    agent: Agent,
}

/// Sends replies through the Bot API.
pub struct TelegramTransport {
    bot: teloxide::Bot,
}

impl TelegramTransport {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<(), TransportError> {
        let chat_id: i64 = conversation
            .as_str()
            .parse()
            .map_err(|_| TransportError::Send(format!("invalid chat id: {conversation}")))?;

        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map(|_| ())
            .map_err(|err| TransportError::Send(err.to_string()))
    }
}

pub struct TelegramBot {
    token: String,
    allowed_users: Option<Vec<UserId>>,
}

impl TelegramBot {
    pub fn builder() -> TelegramBotBuilder {
        TelegramBotBuilder::default()
    }

    /// Runs the dispatcher until ctrl-c, feeding every text message to an
    /// agent built from `agent` with the Telegram transport.
    pub async fn run(&self, agent: AgentBuilder) -> Result<(), String> {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        let agent = agent
            .transport(Arc::new(TelegramTransport::new(bot.clone())))
            .build()?;
        agent.handle_event(InboundEvent::SessionReset).await;

        let parameters = TelegramParameters {
            allowed_users: self.allowed_users.clone(),
            agent,
        };

        let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::debug!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

#[derive(Default, Debug)]
pub struct TelegramBotBuilder {
    token: String,
    allowed_users: Option<Vec<UserId>>,
}

impl TelegramBotBuilder {
    pub fn token(mut self, token: &str) -> TelegramBotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn allowed_users(mut self, allowed_users: Vec<u64>) -> TelegramBotBuilder {
        if !allowed_users.is_empty() {
            self.allowed_users = Some(allowed_users.into_iter().map(UserId).collect());
        }
        self
    }

    pub fn build(self) -> Result<TelegramBot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.token.trim().is_empty() {
            return Err("telegram token is empty".to_string());
        }
        Ok(TelegramBot {
            token: self.token,
            allowed_users: self.allowed_users,
        })
    }
}

async fn handle_message(msg: Message, params: TelegramParameters) -> ResponseResult<()> {
    if !is_allowed(&params, msg.from.as_ref()) {
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    let event = InboundEvent::Message {
        conversation: ConversationId::from(msg.chat.id.0),
        text: text.to_string(),
        is_outgoing_echo: msg.from.as_ref().is_some_and(|u| u.is_bot),
    };
    params.agent.handle_event(event).await;
    Ok(())
}

fn is_allowed(params: &TelegramParameters, from: Option<&User>) -> bool {
    let Some(from) = from else {
        return false;
    };
    match &params.allowed_users {
        None => true,
        Some(ids) => ids.contains(&from.id),
    }
}
