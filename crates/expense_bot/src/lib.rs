//! Conversational expense tracking.
//!
//! The [`Agent`] reads free text from a conversation, runs the yes/no
//! confirmation dialogue and writes confirmed expenses to the ledger. It only
//! talks to the outside world through a [`Transport`]; the Telegram and
//! console transports live in [`telegram`] and [`console`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use ledger::LedgerStore;
use tokio::sync::Mutex;

pub use categories::{CategoryDictionary, CategoryLookup};
pub use error::BotError;
pub use parsing::{ExpenseDraft, ParseError, TRIGGER_WORD, parse_expense};
pub use state::SessionKind;
pub use transport::{ConversationId, InboundEvent, Transport, TransportError};

pub mod console;
pub mod telegram;

mod categories;
mod error;
mod handlers;
mod parsing;
mod state;
mod transport;
mod ui;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

/// Source of the current time, in the agent's time zone.
pub type Clock = Arc<dyn Fn() -> DateTime<Tz> + Send + Sync>;

#[derive(Clone)]
pub struct Agent {
    ledger: Arc<Mutex<LedgerStore>>,
    categories: Arc<dyn CategoryLookup>,
    transport: Arc<dyn Transport>,
    sessions: state::SessionStore,
    timezone: Tz,
    clock: Clock,
}

impl Agent {
    /// Return a builder for `Agent`. Help to build the struct.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    /// Handles one inbound event to completion.
    ///
    /// Events of the same conversation are processed one at a time; events of
    /// different conversations may run concurrently.
    pub async fn handle_event(&self, event: InboundEvent) {
        handlers::handle_event(self, event).await;
    }

    pub async fn session_kind(&self, conversation: &ConversationId) -> SessionKind {
        self.sessions.kind(conversation).await
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn now(&self) -> DateTime<Tz> {
        (self.clock)()
    }
}

#[derive(Default)]
pub struct AgentBuilder {
    ledger: Option<LedgerStore>,
    categories: Option<Arc<dyn CategoryLookup>>,
    transport: Option<Arc<dyn Transport>>,
    timezone: Option<Tz>,
    clock: Option<Clock>,
}

impl AgentBuilder {
    pub fn ledger(mut self, ledger: LedgerStore) -> AgentBuilder {
        self.ledger = Some(ledger);
        self
    }

    pub fn categories(mut self, categories: impl CategoryLookup + 'static) -> AgentBuilder {
        self.categories = Some(Arc::new(categories));
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> AgentBuilder {
        self.transport = Some(transport);
        self
    }

    pub fn timezone(mut self, timezone: Tz) -> AgentBuilder {
        self.timezone = Some(timezone);
        self
    }

    /// Overrides the wall clock, mostly for tests.
    pub fn clock<F>(mut self, clock: F) -> AgentBuilder
    where
        F: Fn() -> DateTime<Tz> + Send + Sync + 'static,
    {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn build(self) -> Result<Agent, String> {
        let ledger = self.ledger.ok_or("missing ledger store")?;
        let transport = self.transport.ok_or("missing transport")?;
        let timezone = self.timezone.unwrap_or(DEFAULT_TIMEZONE);
        let categories = self
            .categories
            .unwrap_or_else(|| Arc::new(CategoryDictionary::builtin()));
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(move || Utc::now().with_timezone(&timezone)));

        tracing::info!(
            "Initializing expense agent (ledger: {}, transport: {}, timezone: {timezone})",
            ledger.path().display(),
            transport.name()
        );

        Ok(Agent {
            ledger: Arc::new(Mutex::new(ledger)),
            categories,
            transport,
            sessions: state::SessionStore::default(),
            timezone,
            clock,
        })
    }
}
