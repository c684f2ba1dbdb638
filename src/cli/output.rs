use colored::Colorize;

use crate::ledger::{
    format_iso_date, format_minor_units, money::format_money, EventKind, Timeline, TimelineRow,
};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
}

pub fn styled(kind: MessageKind, message: &str) -> String {
    match kind {
        MessageKind::Info => format!("[i] {message}"),
        MessageKind::Success => format!("{} {message}", "[ok]".green()),
        MessageKind::Warning => format!("{} {message}", "[!]".yellow()),
        MessageKind::Error => format!("{} {message}", "[x]".red().bold()),
    }
}

pub fn info(message: &str) {
    println!("{}", styled(MessageKind::Info, message));
}

pub fn success(message: &str) {
    println!("{}", styled(MessageKind::Success, message));
}

pub fn warning(message: &str) {
    println!("{}", styled(MessageKind::Warning, message));
}

pub fn error(message: &str) {
    eprintln!("{}", styled(MessageKind::Error, message));
}

fn row_line(row: &TimelineRow) -> String {
    let kind = match row.kind {
        EventKind::Income => row.kind.to_string().green(),
        EventKind::Bill => row.kind.to_string().yellow(),
        EventKind::Misc => row.kind.to_string().normal(),
    };
    let balance = format_minor_units(row.running_balance);
    let balance = if row.running_balance < 0 {
        balance.red().bold()
    } else {
        balance.normal()
    };
    format!(
        "{:<10}  {:<6}  {:<24}  {:>12}  {:>12}",
        format_iso_date(row.date),
        kind,
        row.label,
        format_minor_units(row.delta),
        balance
    )
}

/// Renders rows plus a footer with totals and the lowest point.
pub fn render_timeline(timeline: &Timeline, currency: &str) -> String {
    let mut lines = vec![format!(
        "{:<10}  {:<6}  {:<24}  {:>12}  {:>12}",
        "Date", "Kind", "Label", "Delta", "Balance"
    )];
    lines.push(format!(
        "{:<10}  {:<6}  {:<24}  {:>12}  {:>12}",
        "",
        "",
        "(starting balance)",
        "",
        format_minor_units(timeline.starting_balance)
    ));
    lines.extend(timeline.rows.iter().map(row_line));
    lines.push(format!(
        "{} events, in {} out {} net {}, final balance {}",
        timeline.totals.events,
        format_minor_units(timeline.totals.inflow),
        format_minor_units(timeline.totals.outflow),
        format_minor_units(timeline.totals.net),
        format_money(timeline.final_balance, currency)
    ));
    if let Some(lowest) = timeline.lowest_balance().filter(|row| row.running_balance < 0) {
        lines.push(format!(
            "lowest balance {} on {} after {}",
            format_minor_units(lowest.running_balance),
            format_iso_date(lowest.date),
            lowest.label
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{DateWindow, OneOffEntry, OpeningBalance};
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn render_flags_negative_lowest_balance() {
        colored::control::set_override(false);
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let opening = OpeningBalance::new(100, day);
        let misc = vec![OneOffEntry::new(Uuid::nil(), day, 250, "Groceries")];
        let timeline = crate::ledger::project(&opening, &[], &[], &misc, DateWindow::single_day(day));
        let rendered = render_timeline(&timeline, "USD");
        assert!(rendered.contains("Groceries"));
        assert!(rendered.contains("-1.50"));
        assert!(rendered.contains("lowest balance -1.50 on 2025-01-02"));
        assert!(rendered.contains("final balance USD -1.50"));
    }
}
