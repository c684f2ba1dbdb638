use chrono::NaiveDate;
use uuid::Uuid;

use super::{output, CliError};
use crate::{
    config::{ConfigManager, Settings},
    ledger::{
        dates::{next_weekday_on_or_after, parse_weekday},
        format_iso_date, format_minor_units, next_occurrence, parse_amount, parse_iso_date,
        parse_signed_amount, Action, BudgetState, DateWindow, DefinitionChanges, DeleteRequest,
        DeleteScope, EditRequest, EditScope, FlowRole, OneOffEntry, OpeningBalance,
        RecurringDefinition, Schedule,
    },
    storage::{load_state, persist, state_warnings, JsonStore, LedgerStore},
    utils::{Clock, IdGenerator, SystemClock, UuidGenerator},
};

const MIN_ID_PREFIX: usize = 4;

pub enum LoopControl {
    Continue,
    Exit,
}

struct CommandInfo {
    name: &'static str,
    usage: &'static str,
}

const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "add-income",
        usage: "add-income <label> <amount> <schedule> <date|weekday>",
    },
    CommandInfo {
        name: "add-bill",
        usage: "add-bill <label> <amount> <schedule> <date|weekday> [autopay]",
    },
    CommandInfo {
        name: "add-misc",
        usage: "add-misc <date> <amount> <description>",
    },
    CommandInfo {
        name: "list",
        usage: "list",
    },
    CommandInfo {
        name: "timeline",
        usage: "timeline <start> <end>",
    },
    CommandInfo {
        name: "on",
        usage: "on <date>",
    },
    CommandInfo {
        name: "delete-series",
        usage: "delete-series <id>",
    },
    CommandInfo {
        name: "delete-occurrence",
        usage: "delete-occurrence <id> <date>",
    },
    CommandInfo {
        name: "delete-misc",
        usage: "delete-misc <id>",
    },
    CommandInfo {
        name: "edit",
        usage: "edit <id> <date> <this|future> [label=..] [amount=..] [schedule=..]",
    },
    CommandInfo {
        name: "opening",
        usage: "opening <amount> <date>",
    },
    CommandInfo {
        name: "help",
        usage: "help",
    },
    CommandInfo {
        name: "exit",
        usage: "exit",
    },
];

pub struct ShellContext {
    pub(super) state: BudgetState,
    settings: Settings,
    config: Option<ConfigManager>,
    store: Box<dyn LedgerStore>,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl ShellContext {
    /// Context over the JSON store and settings in the application data dir.
    pub fn new() -> Result<Self, CliError> {
        let config = ConfigManager::new()?;
        let clock = SystemClock;
        let settings = config.load(&clock)?;
        let store = JsonStore::in_dir(config.base_dir())?;
        let mut context = Self::with_parts(
            settings,
            Box::new(store),
            Box::new(UuidGenerator),
            Box::new(clock),
        )?;
        context.config = Some(config);
        Ok(context)
    }

    pub fn with_parts(
        settings: Settings,
        store: Box<dyn LedgerStore>,
        ids: Box<dyn IdGenerator>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CliError> {
        let state = load_state(store.as_ref(), settings.opening())?;
        Ok(Self {
            state,
            settings,
            config: None,
            store,
            ids,
            clock,
        })
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        COMMANDS.iter().map(|info| info.name).collect()
    }

    pub fn report_error(&self, err: CliError) -> Result<(), CliError> {
        output::error(&err.to_string());
        Ok(())
    }

    pub fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<LoopControl, CliError> {
        match command {
            "add-income" => self.cmd_add_definition(FlowRole::Income, args)?,
            "add-bill" => self.cmd_add_definition(FlowRole::Bill, args)?,
            "add-misc" => self.cmd_add_misc(args)?,
            "list" => self.cmd_list(),
            "timeline" => self.cmd_timeline(args)?,
            "on" => self.cmd_on(args)?,
            "delete-series" => self.cmd_delete_series(args)?,
            "delete-occurrence" => self.cmd_delete_occurrence(args)?,
            "delete-misc" => self.cmd_delete_misc(args)?,
            "edit" => self.cmd_edit(args)?,
            "opening" => self.cmd_opening(args)?,
            "help" => print_help(),
            "exit" | "quit" => return Ok(LoopControl::Exit),
            other => {
                return Err(CliError::Input(format!(
                    "unknown command `{other}` (try `help`)"
                )))
            }
        }
        Ok(LoopControl::Continue)
    }

    fn run_action(&mut self, action: Action) -> Result<(), CliError> {
        let mutations = self.state.apply(action, self.ids.as_ref())?;
        persist(self.store.as_ref(), &mutations)?;
        Ok(())
    }

    fn cmd_add_definition(&mut self, role: FlowRole, args: &[&str]) -> Result<(), CliError> {
        let usage = if role == FlowRole::Income { 0 } else { 1 };
        let [label, amount, schedule, when, rest @ ..] = args else {
            return Err(usage_error(COMMANDS[usage].usage));
        };
        let amount = parse_amount(amount)?;
        let schedule: Schedule = schedule.parse()?;
        let start_date = self.resolve_start(schedule, when)?;
        let mut definition =
            RecurringDefinition::new(self.ids.next_id(), *label, amount, schedule, start_date);
        definition.autopay = rest.iter().any(|flag| flag.eq_ignore_ascii_case("autopay"));
        let id = definition.id;
        self.run_action(Action::AddDefinition { role, definition })?;
        output::success(&format!(
            "Added {role} `{label}` {} {schedule} from {} ({id})",
            format_minor_units(amount),
            format_iso_date(start_date)
        ));
        Ok(())
    }

    /// One-offs take a calendar date; recurring schedules also accept a weekday
    /// name, resolved to the next matching day from today.
    fn resolve_start(&self, schedule: Schedule, when: &str) -> Result<NaiveDate, CliError> {
        match parse_iso_date(when) {
            Ok(date) => Ok(date),
            Err(err) if schedule == Schedule::OneOff => Err(err.into()),
            Err(err) => match parse_weekday(when) {
                Ok(weekday) => Ok(next_weekday_on_or_after(self.clock.today(), weekday)),
                Err(_) => Err(err.into()),
            },
        }
    }

    fn cmd_add_misc(&mut self, args: &[&str]) -> Result<(), CliError> {
        let [date, amount, description @ ..] = args else {
            return Err(usage_error(COMMANDS[2].usage));
        };
        if description.is_empty() {
            return Err(usage_error(COMMANDS[2].usage));
        }
        let entry = OneOffEntry::new(
            self.ids.next_id(),
            parse_iso_date(date)?,
            parse_amount(amount)?,
            description.join(" "),
        );
        let id = entry.id;
        self.run_action(Action::AddOneOff(entry))?;
        output::success(&format!("Recorded misc spending ({id})"));
        Ok(())
    }

    fn cmd_list(&self) {
        let today = self.clock.today();
        for role in [FlowRole::Income, FlowRole::Bill] {
            for def in self.state.definitions(role) {
                let next = next_occurrence(def, today)
                    .map(format_iso_date)
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{}  {:<6}  {:<24}  {:>12}  {:<12}  next {}",
                    def.id,
                    role.to_string(),
                    def.label,
                    format_minor_units(def.amount),
                    def.schedule,
                    next
                );
            }
        }
        for entry in &self.state.misc {
            println!(
                "{}  {:<6}  {:<24}  {:>12}  {}",
                entry.id,
                "misc",
                entry.description,
                format_minor_units(entry.amount),
                format_iso_date(entry.date)
            );
        }
        for warning in state_warnings(&self.state) {
            output::warning(&warning);
        }
    }

    fn cmd_timeline(&self, args: &[&str]) -> Result<(), CliError> {
        let [start, end] = args else {
            return Err(usage_error(COMMANDS[4].usage));
        };
        let window = DateWindow::parse(start, end)?;
        let timeline = self.state.timeline(window);
        println!("{}", output::render_timeline(&timeline, &self.settings.currency));
        Ok(())
    }

    fn cmd_on(&self, args: &[&str]) -> Result<(), CliError> {
        let [date] = args else {
            return Err(usage_error(COMMANDS[5].usage));
        };
        let date = parse_iso_date(date)?;
        let rows = self.state.events_on(date);
        if rows.is_empty() {
            output::info(&format!("Nothing scheduled on {}", format_iso_date(date)));
        }
        for row in rows {
            println!(
                "{:<6}  {:<24}  {:>12}  balance {}",
                row.kind.to_string(),
                row.label,
                format_minor_units(row.delta),
                format_minor_units(row.running_balance)
            );
        }
        Ok(())
    }

    fn cmd_delete_series(&mut self, args: &[&str]) -> Result<(), CliError> {
        let [id] = args else {
            return Err(usage_error(COMMANDS[6].usage));
        };
        let definition_id = self.resolve_definition(id)?;
        self.run_action(Action::Delete(DeleteRequest {
            definition_id,
            scope: DeleteScope::EntireSeries,
        }))?;
        output::success(&format!("Deleted series {definition_id}"));
        Ok(())
    }

    fn cmd_delete_occurrence(&mut self, args: &[&str]) -> Result<(), CliError> {
        let [id, date] = args else {
            return Err(usage_error(COMMANDS[7].usage));
        };
        let definition_id = self.resolve_definition(id)?;
        let date = parse_iso_date(date)?;
        self.run_action(Action::Delete(DeleteRequest {
            definition_id,
            scope: DeleteScope::ThisOccurrence(date),
        }))?;
        output::success(&format!(
            "Skipped {} for {definition_id}",
            format_iso_date(date)
        ));
        Ok(())
    }

    fn cmd_delete_misc(&mut self, args: &[&str]) -> Result<(), CliError> {
        let [id] = args else {
            return Err(usage_error(COMMANDS[8].usage));
        };
        let id = resolve_prefix(id, self.state.misc.iter().map(|entry| entry.id))?;
        self.run_action(Action::DeleteOneOff(id))?;
        output::success(&format!("Deleted misc spending {id}"));
        Ok(())
    }

    fn cmd_edit(&mut self, args: &[&str]) -> Result<(), CliError> {
        let [id, date, scope, assignments @ ..] = args else {
            return Err(usage_error(COMMANDS[9].usage));
        };
        let definition_id = self.resolve_definition(id)?;
        let target_date = parse_iso_date(date)?;
        let scope = match scope.to_ascii_lowercase().as_str() {
            "this" => EditScope::ThisOccurrence,
            "future" => EditScope::ThisAndFuture,
            other => {
                return Err(CliError::Input(format!(
                    "scope must be `this` or `future`, got `{other}`"
                )))
            }
        };
        let changes = parse_changes(assignments)?;
        if changes.is_empty() {
            return Err(CliError::Input("nothing to change".into()));
        }
        self.run_action(Action::Edit(EditRequest {
            definition_id,
            target_date,
            changes,
            scope,
        }))?;
        output::success(&format!(
            "Updated {definition_id} from {}",
            format_iso_date(target_date)
        ));
        Ok(())
    }

    fn cmd_opening(&mut self, args: &[&str]) -> Result<(), CliError> {
        let [amount, date] = args else {
            return Err(usage_error(COMMANDS[10].usage));
        };
        let opening = OpeningBalance::new(parse_signed_amount(amount)?, parse_iso_date(date)?);
        self.run_action(Action::SetOpeningBalance(opening))?;
        self.settings.opening_balance_cents = opening.amount;
        self.settings.opening_balance_date = opening.date;
        if let Some(config) = &self.config {
            config.save(&self.settings)?;
        }
        output::success(&format!(
            "Opening balance {} on {}",
            format_minor_units(opening.amount),
            format_iso_date(opening.date)
        ));
        Ok(())
    }

    fn resolve_definition(&self, raw: &str) -> Result<Uuid, CliError> {
        let ids = self
            .state
            .incomes
            .iter()
            .chain(self.state.bills.iter())
            .map(|def| def.id);
        resolve_prefix(raw, ids)
    }
}

fn usage_error(usage: &str) -> CliError {
    CliError::Input(format!("usage: {usage}"))
}

fn print_help() {
    for info in COMMANDS {
        println!("  {}", info.usage);
    }
}

/// Accepts a full id or a unique prefix of at least four characters.
fn resolve_prefix(raw: &str, candidates: impl Iterator<Item = Uuid>) -> Result<Uuid, CliError> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(id);
    }
    let needle = raw.to_ascii_lowercase();
    if needle.len() < MIN_ID_PREFIX {
        return Err(CliError::Input(format!("id prefix `{raw}` is too short")));
    }
    let matches: Vec<Uuid> = candidates
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CliError::Input(format!("no record matches `{raw}`"))),
        _ => Err(CliError::Input(format!("`{raw}` matches several records"))),
    }
}

fn parse_changes(assignments: &[&str]) -> Result<DefinitionChanges, CliError> {
    let mut changes = DefinitionChanges::default();
    for assignment in assignments {
        let Some((key, value)) = assignment.split_once('=') else {
            return Err(CliError::Input(format!(
                "expected key=value, got `{assignment}`"
            )));
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "label" => changes.label = Some(value.to_string()),
            "amount" => changes.amount = Some(parse_amount(value)?),
            "schedule" => changes.schedule = Some(value.parse()?),
            "autopay" => {
                changes.autopay = Some(matches!(
                    value.to_ascii_lowercase().as_str(),
                    "yes" | "true" | "1"
                ))
            }
            other => return Err(CliError::Input(format!("unknown field `{other}`"))),
        }
    }
    Ok(changes)
}
