use ledger::{CategoryUpdate, ClearOutcome, ExpenseRecord, LedgerError, reports};
use unicode_normalization::UnicodeNormalization;

use crate::{
    Agent,
    error::BotError,
    parsing::{Command, ParseError, YesNo, parse_command, parse_expense, parse_yes_no},
    state::{PendingCommit, PendingExpense, Session},
    transport::{ConversationId, InboundEvent},
    ui,
};

const WEEK_DAYS: u32 = 7;

/// Outcome of handling one message: what to answer and where to go next.
struct Step {
    reply: Option<String>,
    next: Next,
}

enum Next {
    Idle,
    /// A question was asked; only wait for the answer if it was delivered.
    Prompt(Session),
    /// Stay in the current session whatever happens to the reply.
    Keep(Session),
}

impl Step {
    fn silent() -> Self {
        Self {
            reply: None,
            next: Next::Idle,
        }
    }

    fn idle(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            next: Next::Idle,
        }
    }

    fn prompt(reply: impl Into<String>, session: Session) -> Self {
        Self {
            reply: Some(reply.into()),
            next: Next::Prompt(session),
        }
    }

    fn keep(reply: impl Into<String>, session: Session) -> Self {
        Self {
            reply: Some(reply.into()),
            next: Next::Keep(session),
        }
    }
}

pub(crate) async fn handle_event(agent: &Agent, event: InboundEvent) {
    match event {
        InboundEvent::SessionReset => {
            let dropped = agent.sessions.reset_all().await;
            tracing::info!("Session reset: dropped {dropped} pending session(s)");
        }
        InboundEvent::Message {
            is_outgoing_echo: true,
            ..
        } => {}
        InboundEvent::Message {
            conversation, text, ..
        } => handle_message(agent, &conversation, &text).await,
    }
}

async fn handle_message(agent: &Agent, conversation: &ConversationId, text: &str) {
    let text: String = text.nfc().collect();
    let text = text.trim();
    let normalized = text.to_lowercase();

    {
        let slot = agent.sessions.slot(conversation).await;
        let mut session = slot.lock().await;

        // If we are waiting for a yes/no, the message can only be the answer.
        let result = match session.take() {
            Some(pending) => handle_pending(agent, pending, &normalized).await,
            None => handle_idle(agent, text, &normalized).await,
        };

        let step = result.unwrap_or_else(|err| {
            match &err {
                BotError::Ledger(_) => {
                    tracing::error!("Ledger failure in conversation {conversation}: {err}")
                }
                _ => tracing::debug!("Rejected message in conversation {conversation}: {err}"),
            }
            Step::idle(user_message_for_error(&err))
        });

        *session = deliver(agent, conversation, step).await;
    }

    agent.sessions.release(conversation).await;
}

async fn deliver(agent: &Agent, conversation: &ConversationId, step: Step) -> Option<Session> {
    let delivered = match &step.reply {
        Some(reply) => match agent.transport.send_text(conversation, reply).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    "Failed to send reply to {conversation} via {}: {err}",
                    agent.transport.name()
                );
                false
            }
        },
        None => true,
    };

    match step.next {
        Next::Idle => None,
        Next::Keep(session) => Some(session),
        Next::Prompt(session) if delivered => {
            tracing::debug!("Conversation {conversation} now waiting: {session:?}");
            Some(session)
        }
        Next::Prompt(_) => {
            tracing::warn!("Prompt for {conversation} not delivered, back to idle");
            None
        }
    }
}

async fn handle_idle(agent: &Agent, text: &str, normalized: &str) -> Result<Step, BotError> {
    if let Some(cmd) = parse_command(normalized) {
        return handle_command(agent, cmd).await;
    }

    let draft = match parse_expense(text) {
        Ok(draft) => draft,
        Err(ParseError::NotAnExpense) => return Ok(Step::silent()),
        Err(err) => return Err(err.into()),
    };

    let suggested_category = agent.categories.suggest(&draft.description);
    Ok(Step::prompt(
        ui::expense_confirmation(draft.value, &draft.description),
        Session::AwaitingExpenseConfirmation(PendingExpense {
            value: draft.value,
            description: draft.description,
            suggested_category,
        }),
    ))
}

async fn handle_command(agent: &Agent, cmd: Command) -> Result<Step, BotError> {
    let step = match cmd {
        Command::Help => Step::idle(ui::help_text()),
        Command::Total => {
            let records = snapshot(agent).await?;
            if records.is_empty() {
                Step::idle(ui::no_expenses())
            } else {
                Step::idle(ui::render_total(reports::total(&records)?))
            }
        }
        Command::Today => {
            let records = snapshot(agent).await?;
            let now = agent.now();
            let today = reports::today(&records, &now);
            let total = reports::total(&today)?;
            Step::idle(ui::render_today(&today, total, &agent.timezone, now.date_naive()))
        }
        Command::Week => {
            let records = snapshot(agent).await?;
            let report = reports::last_n_days(&records, &agent.now(), WEEK_DAYS)?;
            Step::idle(ui::render_week(&report, &agent.timezone))
        }
        Command::Report => {
            let records = snapshot(agent).await?;
            let report = reports::full_report(&records, &agent.timezone)?;
            Step::idle(ui::render_full_report(&report, &agent.timezone))
        }
        Command::Clear => {
            let records = snapshot(agent).await?;
            if records.is_empty() {
                Step::idle(ui::already_empty())
            } else {
                Step::prompt(
                    ui::clear_prompt(records.len()),
                    Session::AwaitingClearConfirmation,
                )
            }
        }
    };
    Ok(step)
}

async fn snapshot(agent: &Agent) -> Result<Vec<ExpenseRecord>, BotError> {
    Ok(agent.ledger.lock().await.read_all()?)
}

async fn handle_pending(
    agent: &Agent,
    session: Session,
    normalized: &str,
) -> Result<Step, BotError> {
    match (session, parse_yes_no(normalized)) {
        (session, YesNo::Invalid) => Ok(Step::keep(ui::invalid_reply(), session)),
        (Session::AwaitingExpenseConfirmation(pending), YesNo::Yes) => {
            commit_expense(agent, pending).await
        }
        (Session::AwaitingExpenseConfirmation(_), YesNo::No) => Ok(Step::idle(ui::cancelled())),
        (Session::AwaitingCategoryConfirmation(commit), YesNo::Yes) => {
            apply_category(agent, commit).await
        }
        (Session::AwaitingCategoryConfirmation(_), YesNo::No) => {
            Ok(Step::idle(ui::category_kept()))
        }
        (Session::AwaitingClearConfirmation, YesNo::Yes) => clear_ledger(agent).await,
        (Session::AwaitingClearConfirmation, YesNo::No) => Ok(Step::idle(ui::cancelled())),
    }
}

/// Writes the expense as `Other` and asks about the suggested category.
///
/// Once the append succeeded the record stays, even if the question cannot
/// be delivered.
async fn commit_expense(agent: &Agent, pending: PendingExpense) -> Result<Step, BotError> {
    let record = ExpenseRecord::new(
        agent.now().fixed_offset(),
        pending.value,
        &pending.description,
    )?;
    agent.ledger.lock().await.append(&record)?;
    tracing::info!(
        "Expense {} committed ({})",
        record.id.map(|id| id.to_string()).unwrap_or_default(),
        record.value.to_ledger_string()
    );

    let reply = ui::category_prompt(&record, &pending.suggested_category);
    Ok(Step::prompt(
        reply,
        Session::AwaitingCategoryConfirmation(PendingCommit {
            key: record.key(),
            suggested_category: pending.suggested_category,
        }),
    ))
}

async fn apply_category(agent: &Agent, commit: PendingCommit) -> Result<Step, BotError> {
    let outcome = agent
        .ledger
        .lock()
        .await
        .update_category(&commit.key, &commit.suggested_category)?;

    match outcome {
        CategoryUpdate::Updated(record) => Ok(Step::idle(ui::category_updated(&record))),
        CategoryUpdate::NotFound => {
            tracing::warn!("No uncategorized record matches {:?}", commit.key);
            Ok(Step::idle(ui::category_not_found()))
        }
    }
}

async fn clear_ledger(agent: &Agent) -> Result<Step, BotError> {
    let outcome = agent.ledger.lock().await.clear()?;
    Ok(match outcome {
        ClearOutcome::Removed => Step::idle(ui::cleared()),
        ClearOutcome::AlreadyEmpty => Step::idle(ui::already_empty()),
    })
}

fn user_message_for_error(err: &BotError) -> String {
    match err {
        BotError::Parse(_) => ui::format_help(),
        BotError::Validation(ParseError::InvalidAmount) => ui::invalid_amount(),
        BotError::Validation(_) => ui::empty_description(),
        BotError::Ledger(LedgerError::Overflow(_)) => ui::totals_overflow().to_string(),
        BotError::Ledger(_) => ui::ledger_unavailable().to_string(),
    }
}
