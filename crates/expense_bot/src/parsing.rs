use ledger::MoneyCents;

/// Word that opens an expense message.
pub const TRIGGER_WORD: &str = "gastei";

/// Words accepted between the amount and the description.
const CONNECTORS: &[&str] = &[
    "no", "na", "nos", "nas", "em", "com", "de", "do", "da", "dos", "das", "pro", "pra", "para",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub value: MoneyCents,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("não é um gasto")]
    NotAnExpense,
    #[error("formato inválido")]
    Format,
    #[error("valor inválido")]
    InvalidAmount,
    #[error("descrição vazia")]
    EmptyDescription,
}

impl ParseError {
    /// The message has the expense shape but carries an unusable value.
    pub fn is_validation(self) -> bool {
        matches!(self, ParseError::InvalidAmount | ParseError::EmptyDescription)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum YesNo {
    Yes,
    No,
    Invalid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    Total,
    Today,
    Week,
    Report,
    Clear,
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses `<trigger> <amount> <connector> <description>`.
///
/// Rules:
/// - the trigger word is matched case-insensitively
/// - the amount is an integer or has up to 2 decimals, `,` or `.` separated
/// - the description is everything after the connector, trimmed
///
/// Text that does not start with the trigger word yields
/// [`ParseError::NotAnExpense`] so the caller can ignore it.
pub fn parse_expense(input: &str) -> Result<ExpenseDraft, ParseError> {
    let collapsed = collapse_whitespace(input);
    let mut parts = collapsed.splitn(4, ' ');

    let trigger = parts.next().unwrap_or("");
    if trigger.to_lowercase() != TRIGGER_WORD {
        return Err(ParseError::NotAnExpense);
    }

    let amount_str = parts.next().ok_or(ParseError::Format)?;
    if !amount_str.starts_with(|c: char| c.is_ascii_digit())
        || !amount_str
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return Err(ParseError::Format);
    }
    let value: MoneyCents = amount_str.parse().map_err(|_| ParseError::Format)?;

    let connector = parts.next().ok_or(ParseError::Format)?;
    if !CONNECTORS.contains(&connector.to_lowercase().as_str()) {
        return Err(ParseError::Format);
    }

    let description = parts.next().unwrap_or("").trim();
    if !value.is_positive() || value > MoneyCents::MAX_ENTRY {
        return Err(ParseError::InvalidAmount);
    }
    if description.is_empty() {
        return Err(ParseError::EmptyDescription);
    }

    Ok(ExpenseDraft {
        value,
        description: description.to_string(),
    })
}

/// Classifies a normalized (trimmed, lowercased) reply.
pub(crate) fn parse_yes_no(normalized: &str) -> YesNo {
    match normalized {
        "sim" | "s" => YesNo::Yes,
        "não" | "nao" | "n" => YesNo::No,
        _ => YesNo::Invalid,
    }
}

/// Recognizes a normalized slash command, with or without a `@bot` suffix.
pub(crate) fn parse_command(normalized: &str) -> Option<Command> {
    if !normalized.starts_with('/') {
        return None;
    }
    let word = normalized.split_whitespace().next().unwrap_or("");
    let word = word.split('@').next().unwrap_or(word);

    match word {
        "/help" | "/start" => Some(Command::Help),
        "/total" => Some(Command::Total),
        "/today" => Some(Command::Today),
        "/week" => Some(Command::Week),
        "/report" => Some(Command::Report),
        "/clear" => Some(Command::Clear),
        _ => None,
    }
}
