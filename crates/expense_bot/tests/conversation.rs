use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::{America::Sao_Paulo, Tz};
use expense_bot::{
    Agent, CategoryDictionary, ConversationId, InboundEvent, SessionKind, Transport,
    TransportError,
};
use ledger::{DEFAULT_CATEGORY, ExpenseRecord, LedgerStore, MoneyCents};
use uuid::Uuid;

const CHAT: &str = "chat-1";

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(ConversationId, String)>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    fn sent_to(&self, conversation: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c.as_str() == conversation)
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_text(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Send("network down".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((conversation.clone(), text.to_string()));
        Ok(())
    }
}

fn ledger_path() -> PathBuf {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_ledgers");
    std::fs::create_dir_all(&root).unwrap();
    root.join(format!("bot_{}.txt", Uuid::new_v4()))
}

fn fixed_now() -> DateTime<Tz> {
    DateTime::parse_from_rfc3339("2026-10-19T10:00:00-03:00")
        .unwrap()
        .with_timezone(&Sao_Paulo)
}

struct Harness {
    agent: Agent,
    transport: Arc<RecordingTransport>,
    store: LedgerStore,
}

impl Harness {
    fn new() -> Self {
        Self::at(ledger_path())
    }

    fn at(path: PathBuf) -> Self {
        let transport = Arc::new(RecordingTransport::default());
        let agent = Agent::builder()
            .ledger(LedgerStore::new(&path))
            .categories(CategoryDictionary::builtin())
            .transport(transport.clone())
            .timezone(Sao_Paulo)
            .clock(fixed_now)
            .build()
            .unwrap();
        Self {
            agent,
            transport,
            store: LedgerStore::new(path),
        }
    }

    /// Sends `text` in `conversation` and returns the reply it produced.
    async fn say_in(&self, conversation: &str, text: &str) -> Option<String> {
        let before = self.transport.sent_to(conversation).len();
        self.agent
            .handle_event(InboundEvent::message(conversation, text))
            .await;
        let sent = self.transport.sent_to(conversation);
        assert!(sent.len() <= before + 1, "more than one reply to one message");
        sent.get(before).cloned()
    }

    async fn say(&self, text: &str) -> Option<String> {
        self.say_in(CHAT, text).await
    }

    async fn kind(&self) -> SessionKind {
        self.agent.session_kind(&CHAT.into()).await
    }

    fn seed(&self, ts: &str, cents: i64, description: &str) {
        let record = ExpenseRecord::new(
            DateTime::parse_from_rfc3339(ts).unwrap(),
            MoneyCents::new(cents),
            description,
        )
        .unwrap();
        self.store.append(&record).unwrap();
    }
}

#[tokio::test]
async fn total_on_empty_ledger_reports_no_expenses() {
    let h = Harness::new();
    assert_eq!(h.say("/total").await.as_deref(), Some("Nenhum gasto encontrado."));
    assert_eq!(h.kind().await, SessionKind::Idle);
}

#[tokio::test]
async fn expense_then_category_confirmation_flow() {
    let h = Harness::new();

    let reply = h.say("gastei 25,50 no cinema").await.unwrap();
    assert!(reply.contains("cinema"));
    assert!(reply.contains("25,50"));
    assert_eq!(h.kind().await, SessionKind::AwaitingExpenseConfirmation);
    assert!(h.store.read_all().unwrap().is_empty());

    let reply = h.say("sim").await.unwrap();
    assert!(reply.contains("Entertainment"));
    assert_eq!(h.kind().await, SessionKind::AwaitingCategoryConfirmation);

    let records = h.store.read_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value, MoneyCents::new(2550));
    assert_eq!(records[0].description, "cinema");
    assert_eq!(records[0].category, DEFAULT_CATEGORY);

    let reply = h.say("  SIM ").await.unwrap();
    assert!(reply.contains("Entertainment"));
    assert_eq!(h.kind().await, SessionKind::Idle);

    let records = h.store.read_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, "Entertainment");
}

#[tokio::test]
async fn declining_the_expense_writes_nothing() {
    let h = Harness::new();
    h.say("gastei 10 no bar").await;
    assert_eq!(h.say("não").await.as_deref(), Some("Operação cancelada."));
    assert_eq!(h.kind().await, SessionKind::Idle);
    assert!(h.store.read_all().unwrap().is_empty());
}

#[tokio::test]
async fn declining_the_category_keeps_other() {
    let h = Harness::new();
    h.say("gastei 10 no mercado").await;
    h.say("s").await;
    let reply = h.say("n").await.unwrap();
    assert!(reply.contains(DEFAULT_CATEGORY));

    let records = h.store.read_all().unwrap();
    assert_eq!(records[0].category, DEFAULT_CATEGORY);
    assert_eq!(h.kind().await, SessionKind::Idle);
}

#[tokio::test]
async fn invalid_answer_keeps_the_session() {
    let h = Harness::new();
    h.say("gastei 10 no bar").await;

    let reply = h.say("talvez").await.unwrap();
    assert_eq!(reply, "Resposta inválida. Responda sim ou não.");
    assert_eq!(h.kind().await, SessionKind::AwaitingExpenseConfirmation);

    // Commands are answers too while a confirmation is pending.
    h.say("/total").await;
    assert_eq!(h.kind().await, SessionKind::AwaitingExpenseConfirmation);

    h.say("nao").await;
    assert_eq!(h.kind().await, SessionKind::Idle);
}

#[tokio::test]
async fn clear_declined_leaves_ledger_untouched() {
    let h = Harness::new();
    h.seed("2026-10-18T12:00:00-03:00", 1000, "mercado");

    let reply = h.say("/clear").await.unwrap();
    assert!(reply.contains("apagar 1 gasto"));
    assert_eq!(h.kind().await, SessionKind::AwaitingClearConfirmation);

    assert_eq!(h.say("não").await.as_deref(), Some("Operação cancelada."));
    assert_eq!(h.store.read_all().unwrap().len(), 1);
    assert_eq!(h.kind().await, SessionKind::Idle);
}

#[tokio::test]
async fn clear_confirmed_empties_ledger() {
    let h = Harness::new();
    h.seed("2026-10-18T12:00:00-03:00", 1000, "mercado");

    h.say("/clear").await;
    assert_eq!(
        h.say("sim").await.as_deref(),
        Some("🗑 Todos os gastos foram apagados.")
    );
    assert!(h.store.read_all().unwrap().is_empty());

    // Nothing left: no confirmation is asked.
    assert_eq!(
        h.say("/clear").await.as_deref(),
        Some("Não há gastos para apagar.")
    );
    assert_eq!(h.kind().await, SessionKind::Idle);
}

#[tokio::test]
async fn week_groups_by_day_with_totals() {
    let h = Harness::new();
    h.seed("2026-10-19T09:00:00-03:00", 2550, "cinema");
    h.seed("2026-10-17T12:00:00-03:00", 1000, "mercado");
    h.seed("2026-10-01T12:00:00-03:00", 9999, "fora da semana");

    let reply = h.say("/week").await.unwrap();
    let day17 = reply.find("📅 17/10/2026").unwrap();
    let day19 = reply.find("📅 19/10/2026").unwrap();
    assert!(day17 < day19);
    assert!(reply.contains("Subtotal: R$ 10,00"));
    assert!(reply.contains("Subtotal: R$ 25,50"));
    assert!(reply.ends_with("Total: R$ 35,50"));
    assert!(!reply.contains("fora da semana"));
}

#[tokio::test]
async fn today_lists_only_today() {
    let h = Harness::new();
    h.seed("2026-10-19T08:30:00-03:00", 800, "padaria");
    h.seed("2026-10-18T08:30:00-03:00", 1200, "ontem");

    let reply = h.say("/today").await.unwrap();
    assert!(reply.contains("padaria"));
    assert!(!reply.contains("ontem"));
    assert!(reply.ends_with("Total: R$ 8,00"));
}

#[tokio::test]
async fn report_ranks_categories() {
    let h = Harness::new();
    h.say("gastei 30 no mercado").await;
    h.say("sim").await;
    h.say("sim").await;
    h.say("gastei 12,50 no uber").await;
    h.say("sim").await;
    h.say("não").await;

    let reply = h.say("/report").await.unwrap();
    assert!(reply.contains("outubro de 2026"));
    assert!(reply.contains("1. Food - R$ 30,00"));
    assert!(reply.contains("2. Other - R$ 12,50"));
    assert!(reply.ends_with("Total geral: R$ 42,50"));
}

#[tokio::test]
async fn malformed_ledger_lines_are_ignored_by_reports() {
    let path = ledger_path();
    std::fs::write(
        &path,
        "2026-10-19T08:00:00.000-03:00;10.00;pão;Food\n\
         lixo\n\
         2026-10-19T09:00:00.000-03:00;5.50;café\n",
    )
    .unwrap();
    let h = Harness::at(path);

    assert_eq!(
        h.say("/total").await.as_deref(),
        Some("💰 Total gasto: R$ 15,50")
    );
}

#[tokio::test]
async fn category_answer_after_record_vanished_reports_not_found() {
    let h = Harness::new();
    h.say("gastei 25,50 no cinema").await;
    h.say("sim").await;
    h.store.clear().unwrap();

    let reply = h.say("sim").await.unwrap();
    assert!(reply.starts_with("Não encontrei"));
    assert_eq!(h.kind().await, SessionKind::Idle);
    assert!(h.store.read_all().unwrap().is_empty());
}

#[tokio::test]
async fn append_failure_apologizes_and_resets() {
    let dir = ledger_path();
    std::fs::create_dir_all(&dir).unwrap();
    let h = Harness::at(dir);

    h.say("gastei 10 no bar").await;
    let reply = h.say("sim").await.unwrap();
    assert!(reply.starts_with("Desculpe"));
    assert_eq!(h.kind().await, SessionKind::Idle);
}

#[tokio::test]
async fn category_rewrite_failure_apologizes_and_keeps_other() {
    let path = ledger_path();
    let h = Harness::at(path.clone());
    h.say("gastei 25,50 no cinema").await;
    h.say("sim").await;
    assert_eq!(h.kind().await, SessionKind::AwaitingCategoryConfirmation);

    // The rewrite goes through `<ledger>.tmp`; a directory there breaks it.
    std::fs::create_dir_all(path.with_extension("tmp")).unwrap();
    let reply = h.say("sim").await.unwrap();

    assert!(reply.starts_with("Desculpe"));
    assert_eq!(h.kind().await, SessionKind::Idle);
    let records = h.store.read_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, DEFAULT_CATEGORY);
}

#[tokio::test]
async fn undeliverable_category_prompt_keeps_record_as_other() {
    let h = Harness::new();
    h.say("gastei 25,50 no cinema").await;

    h.transport.fail(true);
    h.say("sim").await;
    h.transport.fail(false);

    let records = h.store.read_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, DEFAULT_CATEGORY);
    assert_eq!(h.kind().await, SessionKind::Idle);
}

#[tokio::test]
async fn session_reset_drops_pending_confirmation() {
    let h = Harness::new();
    h.say("gastei 10 no bar").await;
    assert_eq!(h.kind().await, SessionKind::AwaitingExpenseConfirmation);

    h.agent.handle_event(InboundEvent::SessionReset).await;
    assert_eq!(h.kind().await, SessionKind::Idle);

    assert_eq!(h.say("sim").await, None);
    assert!(h.store.read_all().unwrap().is_empty());
}

#[tokio::test]
async fn echoes_and_chatter_are_ignored() {
    let h = Harness::new();
    h.agent
        .handle_event(InboundEvent::Message {
            conversation: CHAT.into(),
            text: "gastei 10 no bar".to_string(),
            is_outgoing_echo: true,
        })
        .await;
    assert_eq!(h.kind().await, SessionKind::Idle);
    assert!(h.transport.sent_to(CHAT).is_empty());

    assert_eq!(h.say("oi, tudo bem?").await, None);
    assert_eq!(h.say("/desconhecido").await, None);
}

#[tokio::test]
async fn malformed_and_invalid_expenses_get_a_hint() {
    let h = Harness::new();
    let reply = h.say("gastei muito no bar").await.unwrap();
    assert!(reply.starts_with("Formato inválido"));

    let reply = h.say("gastei 0 no bar").await.unwrap();
    assert_eq!(
        reply,
        "O valor precisa ser maior que zero e no máximo R$ 1.000.000.000,00."
    );
    assert_eq!(h.kind().await, SessionKind::Idle);
}

#[tokio::test]
async fn amount_above_the_entry_cap_is_refused() {
    let h = Harness::new();
    let reply = h.say("gastei 90000000000000000 no bar").await.unwrap();
    assert!(reply.starts_with("O valor precisa ser maior que zero"));
    assert_eq!(h.kind().await, SessionKind::Idle);
    assert!(h.store.read_all().unwrap().is_empty());
}

#[tokio::test]
async fn reports_over_huge_stored_values_answer_instead_of_panicking() {
    let path = ledger_path();
    std::fs::write(
        &path,
        "2026-10-19T08:00:00.000-03:00;90000000000000000.00;iate;Other\n\
         2026-10-19T09:00:00.000-03:00;90000000000000000.00;iate;Other\n",
    )
    .unwrap();
    let h = Harness::at(path);

    for command in ["/total", "/today", "/week", "/report"] {
        let reply = h.say(command).await.unwrap();
        assert!(
            reply.starts_with("Os valores registrados são grandes demais"),
            "{command}: {reply}"
        );
    }
    assert_eq!(h.kind().await, SessionKind::Idle);
}

#[tokio::test]
async fn conversations_do_not_share_sessions() {
    let h = Harness::new();
    h.say_in("a", "gastei 10 no bar").await;

    let reply = h.say_in("b", "sim").await;
    assert_eq!(reply, None);
    assert_eq!(
        h.agent.session_kind(&"a".into()).await,
        SessionKind::AwaitingExpenseConfirmation
    );

    h.say_in("a", "sim").await;
    assert_eq!(h.store.read_all().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_conversations_both_commit() {
    let h = Harness::new();
    tokio::join!(
        h.say_in("a", "gastei 10 no bar"),
        h.say_in("b", "gastei 20 na farmácia"),
    );
    tokio::join!(h.say_in("a", "sim"), h.say_in("b", "sim"));
    tokio::join!(h.say_in("a", "sim"), h.say_in("b", "sim"));

    let mut categories: Vec<String> = h
        .store
        .read_all()
        .unwrap()
        .into_iter()
        .map(|r| r.category)
        .collect();
    categories.sort();
    assert_eq!(categories, vec!["Entertainment", "Health"]);
}
