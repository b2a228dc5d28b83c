use std::fmt::Write;

use chrono_tz::Tz;
use ledger::{
    DEFAULT_CATEGORY, ExpenseRecord, MoneyCents,
    reports::{DayGroup, FullReport, PeriodReport},
};

use crate::parsing::TRIGGER_WORD;

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M";

pub(crate) fn help_text() -> String {
    format!(
        "Comandos disponíveis:\n\n\
         /help - mostra esta mensagem\n\
         /total - total gasto\n\
         /today - gastos de hoje\n\
         /week - gastos dos últimos 7 dias\n\
         /report - relatório por mês, dia e categoria\n\
         /clear - apaga todos os gastos\n\n\
         Para registrar um gasto escreva, por exemplo:\n\n\
         {TRIGGER_WORD} 25,50 no cinema\n\
         {TRIGGER_WORD} 100 com presente"
    )
}

pub(crate) fn format_help() -> String {
    format!(
        "Formato inválido. Use: {TRIGGER_WORD} <valor> no <descrição>\n\
         Ex: {TRIGGER_WORD} 25,50 no cinema"
    )
}

pub(crate) fn no_expenses() -> &'static str {
    "Nenhum gasto encontrado."
}

pub(crate) fn render_total(total: MoneyCents) -> String {
    format!("💰 Total gasto: {total}")
}

pub(crate) fn expense_confirmation(value: MoneyCents, description: &str) -> String {
    format!(
        "Confirma o gasto?\n\n📝 Descrição: {description}\n💵 Valor: {value}\n\nResponda sim ou não."
    )
}

pub(crate) fn category_prompt(record: &ExpenseRecord, suggested: &str) -> String {
    format!(
        "✅ Gasto registrado: {} - {} ({DEFAULT_CATEGORY}).\n\n\
         Categoria sugerida: {suggested}\nDeseja aplicar? Responda sim ou não.",
        record.description, record.value
    )
}

pub(crate) fn category_updated(record: &ExpenseRecord) -> String {
    format!(
        "🏷 Categoria de \"{}\" atualizada para {}.",
        record.description, record.category
    )
}

pub(crate) fn category_not_found() -> String {
    format!("Não encontrei o gasto para atualizar; a categoria continua {DEFAULT_CATEGORY}.")
}

pub(crate) fn category_kept() -> String {
    format!("Ok, o gasto foi mantido como {DEFAULT_CATEGORY}.")
}

pub(crate) fn cancelled() -> &'static str {
    "Operação cancelada."
}

pub(crate) fn invalid_reply() -> &'static str {
    "Resposta inválida. Responda sim ou não."
}

pub(crate) fn clear_prompt(count: usize) -> String {
    format!("⚠️ Isso vai apagar {count} gasto(s). Tem certeza? Responda sim ou não.")
}

pub(crate) fn cleared() -> &'static str {
    "🗑 Todos os gastos foram apagados."
}

pub(crate) fn already_empty() -> &'static str {
    "Não há gastos para apagar."
}

pub(crate) fn ledger_unavailable() -> &'static str {
    "Desculpe, não consegui acessar os seus gastos agora. Tente novamente."
}

pub(crate) fn invalid_amount() -> String {
    format!(
        "O valor precisa ser maior que zero e no máximo {}.",
        MoneyCents::MAX_ENTRY
    )
}

pub(crate) fn totals_overflow() -> &'static str {
    "Os valores registrados são grandes demais para somar. Use /clear para recomeçar."
}

pub(crate) fn empty_description() -> String {
    format!("Informe uma descrição. Ex: {TRIGGER_WORD} 25,50 no cinema")
}

pub(crate) fn render_today(
    records: &[ExpenseRecord],
    total: MoneyCents,
    tz: &Tz,
    date: chrono::NaiveDate,
) -> String {
    if records.is_empty() {
        return "Nenhum gasto registrado hoje.".to_string();
    }

    let mut text = format!("📅 Gastos de hoje ({}):\n", date.format(DATE_FORMAT));
    for record in records {
        let _ = write!(text, "\n{}", record_line(record, tz));
    }
    let _ = write!(text, "\n\nTotal: {total}");
    text
}

pub(crate) fn render_week(report: &PeriodReport, tz: &Tz) -> String {
    if report.days.is_empty() {
        return "Nenhum gasto nos últimos 7 dias.".to_string();
    }

    let mut text = String::from("📊 Gastos dos últimos 7 dias:\n");
    for day in &report.days {
        render_day(&mut text, day, tz, "");
    }
    let _ = write!(text, "\n\nTotal: {}", report.total);
    text
}

pub(crate) fn render_full_report(report: &FullReport, tz: &Tz) -> String {
    if report.months.is_empty() {
        return no_expenses().to_string();
    }

    let mut text = String::from("📈 Relatório completo\n");
    for month in &report.months {
        let _ = write!(text, "\n🗓 {}", month.label);
        for day in &month.days {
            render_day(&mut text, day, tz, "  ");
        }
        let _ = write!(text, "\nTotal do mês: {}\n", month.total);
    }

    text.push_str("\n🏷 Por categoria:");
    for (idx, category) in report.categories.iter().enumerate() {
        let _ = write!(text, "\n{}. {} - {}", idx + 1, category.category, category.total);
    }
    let _ = write!(text, "\n\nTotal geral: {}", report.total);
    text
}

fn render_day(text: &mut String, day: &DayGroup, tz: &Tz, indent: &str) {
    let _ = write!(text, "\n{indent}📅 {}", day.date.format(DATE_FORMAT));
    for record in &day.records {
        let _ = write!(text, "\n{indent}{}", record_line(record, tz));
    }
    let _ = write!(text, "\n{indent}Subtotal: {}", day.total);
}

fn record_line(record: &ExpenseRecord, tz: &Tz) -> String {
    format!(
        "• {} {} - {} ({})",
        record.timestamp.with_timezone(tz).format(TIME_FORMAT),
        record.description,
        record.value,
        record.category
    )
}
