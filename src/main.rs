mod calendar;
mod cascade;
mod config;
mod domain;
mod logging;
mod stopwatch;
mod store;
mod ui;
mod workspaces;

use std::error::Error;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::calendar::{CalendarView, Granularity, bucket, group_by_due_date, period_title};
use crate::cascade::{dispatch, set_task_status, toggle_subtask};
use crate::config::{Settings, resolve_owner};
use crate::domain::{
	GroupKind, GroupPatch, NewSubtask, NewTask, Priority, SubtaskPatch, Task, TaskPatch,
	TimeOwner, Workspace, parse_timestamp,
};
use crate::stopwatch::format_elapsed;
use crate::store::{FileStore, TaskStore};
use crate::ui::run_dashboard;
use crate::workspaces::{recent_stores, remember_store, resolve_store_path};

#[derive(Debug, Parser)]
#[command(name = "taskcation", about = "Terminal-first task and homework tracker")]
struct Cli {
	#[arg(long, global = true)]
	store: Option<PathBuf>,
	#[arg(long, global = true)]
	user: Option<String>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Dashboard,
	AddGroup {
		#[arg(long)]
		name: String,
		#[arg(long, default_value = "subjects")]
		kind: GroupKind,
		#[arg(long)]
		grade: Option<String>,
	},
	EditGroup {
		#[arg(long)]
		id: String,
		#[arg(long)]
		name: Option<String>,
		#[arg(long)]
		grade: Option<String>,
	},
	DeleteGroup {
		#[arg(long)]
		id: String,
	},
	ListGroups,
	AddTask {
		#[arg(long)]
		name: String,
		#[arg(long)]
		group: String,
		#[arg(long)]
		start: Option<String>,
		#[arg(long)]
		end: String,
		#[arg(long)]
		notes: Option<String>,
		#[arg(long)]
		priority: Option<Priority>,
	},
	EditTask {
		#[arg(long)]
		id: String,
		#[arg(long)]
		name: Option<String>,
		#[arg(long)]
		group: Option<String>,
		#[arg(long)]
		start: Option<String>,
		#[arg(long)]
		end: Option<String>,
		#[arg(long)]
		notes: Option<String>,
		#[arg(long)]
		priority: Option<Priority>,
	},
	DeleteTask {
		#[arg(long)]
		id: String,
	},
	ListTasks {
		#[arg(long)]
		group: Option<String>,
		#[arg(long)]
		pending: bool,
	},
	AddSubtask {
		#[arg(long)]
		task: String,
		#[arg(long)]
		name: String,
		#[arg(long)]
		start: Option<String>,
		#[arg(long)]
		end: String,
		#[arg(long)]
		notes: Option<String>,
		#[arg(long)]
		priority: Option<Priority>,
	},
	EditSubtask {
		#[arg(long)]
		id: String,
		#[arg(long)]
		name: Option<String>,
		#[arg(long)]
		start: Option<String>,
		#[arg(long)]
		end: Option<String>,
		#[arg(long)]
		notes: Option<String>,
		#[arg(long)]
		priority: Option<Priority>,
	},
	DeleteSubtask {
		#[arg(long)]
		id: String,
	},
	ListSubtasks {
		#[arg(long)]
		task: Option<String>,
	},
	Complete {
		#[arg(long)]
		task: String,
	},
	Uncomplete {
		#[arg(long)]
		task: String,
	},
	ToggleSubtask {
		#[arg(long)]
		id: String,
	},
	Calendar {
		#[arg(long)]
		view: Option<Granularity>,
		#[arg(long)]
		date: Option<String>,
	},
	LogTime {
		#[arg(long)]
		task: Option<String>,
		#[arg(long)]
		subtask: Option<String>,
		#[arg(long)]
		ms: u64,
	},
	Times {
		#[arg(long)]
		task: Option<String>,
		#[arg(long)]
		subtask: Option<String>,
	},
	DeleteTime {
		#[arg(long)]
		id: String,
	},
	Stores {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

fn main() {
	logging::init();
	if let Err(err) = run() {
		tracing::error!(error = %err, "command failed");
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	if let Some(Command::Stores { limit }) = &cli.command {
		print_recent_stores(*limit)?;
		return Ok(());
	}

	let mut settings = Settings::load()?;
	let owner = resolve_owner(cli.user, &mut settings)?;
	let store_path = resolve_store_path(cli.store)?;
	let mut store = FileStore::open(&store_path)?;
	if let Err(err) = remember_store(store.path()) {
		eprintln!("warning: failed to store recent store: {err}");
	}
	info!(store = %store.path().display(), owner = %owner, "store opened");

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init => {
			store.save()?;
			println!("initialized store at {}", store.path().display());
		}
		Command::Dashboard => {
			run_dashboard(&mut store, &owner, settings.default_view)?;
		}
		Command::AddGroup { name, kind, grade } => {
			let group_id =
				store.mutate(|workspace| workspace.add_group(&owner, &name, kind, grade, Utc::now()))?;
			println!("created {} {group_id}", kind.label().to_lowercase());
		}
		Command::EditGroup { id, name, grade } => {
			let patch = GroupPatch {
				name,
				grade_id: grade,
			};
			store.mutate(|workspace| workspace.update_group(&id, &patch, Utc::now()))?;
			println!("updated group {id}");
		}
		Command::DeleteGroup { id } => {
			store.mutate(|workspace| workspace.delete_group(&id))?;
			println!("deleted group {id}");
		}
		Command::ListGroups => {
			print_groups(store.workspace(), &owner);
		}
		Command::AddTask {
			name,
			group,
			start,
			end,
			notes,
			priority,
		} => {
			let end_date = parse_when(&end)?;
			let start_date = start_or_now(parse_optional_when(start.as_deref())?, end_date, Local::now());
			let priority = priority
				.unwrap_or_else(|| store.workspace().suggested_priority(&group, end_date, Utc::now()));
			let new_task = NewTask {
				name,
				start_date,
				end_date,
				notes,
				group_id: group,
				priority,
			};
			let task_id = store.mutate(|workspace| workspace.add_task(&owner, new_task, Utc::now()))?;
			println!("created task {task_id} ({})", priority.label());
		}
		Command::EditTask {
			id,
			name,
			group,
			start,
			end,
			notes,
			priority,
		} => {
			let patch = TaskPatch {
				name,
				start_date: parse_optional_when(start.as_deref())?,
				end_date: parse_optional_when(end.as_deref())?,
				notes,
				group_id: group,
				priority,
				status: None,
			};
			store.mutate(|workspace| workspace.update_task(&id, &patch, Utc::now()))?;
			println!("updated task {id}");
		}
		Command::DeleteTask { id } => {
			let removed = store.mutate(|workspace| workspace.delete_task(&id))?;
			println!("deleted task {id} and {removed} subtasks");
		}
		Command::ListTasks { group, pending } => {
			let mut tasks = store.tasks_by_owner(&owner)?;
			tasks.retain(|task| {
				group.as_ref().is_none_or(|group| &task.group_id == group) && !(pending && task.status)
			});
			print_tasks(store.workspace(), &tasks);
		}
		Command::AddSubtask {
			task,
			name,
			start,
			end,
			notes,
			priority,
		} => {
			let end_date = parse_when(&end)?;
			let start_date = start_or_now(parse_optional_when(start.as_deref())?, end_date, Local::now());
			let group_id = store
				.workspace()
				.task(&task)
				.map(|task| task.group_id.clone())
				.ok_or_else(|| format!("task not found: {task}"))?;
			let priority = priority
				.unwrap_or_else(|| store.workspace().suggested_priority(&group_id, end_date, Utc::now()));
			let new_subtask = NewSubtask {
				task_id: task,
				name,
				start_date,
				end_date,
				notes,
				priority,
			};
			let subtask_id =
				store.mutate(|workspace| workspace.add_subtask(&owner, new_subtask, Utc::now()))?;
			println!("created subtask {subtask_id} ({})", priority.label());
		}
		Command::EditSubtask {
			id,
			name,
			start,
			end,
			notes,
			priority,
		} => {
			let patch = SubtaskPatch {
				name,
				start_date: parse_optional_when(start.as_deref())?,
				end_date: parse_optional_when(end.as_deref())?,
				notes,
				priority,
				status: None,
			};
			store.mutate(|workspace| workspace.update_subtask(&id, &patch, Utc::now()))?;
			println!("updated subtask {id}");
		}
		Command::DeleteSubtask { id } => {
			store.mutate(|workspace| workspace.delete_subtask(&id))?;
			println!("deleted subtask {id}");
		}
		Command::ListSubtasks { task } => {
			let subtasks = match &task {
				Some(task_id) => store.subtasks_by_task(task_id)?,
				None => store.subtasks_by_owner(&owner)?,
			};
			if subtasks.is_empty() {
				println!("no subtasks yet");
			}
			for subtask in &subtasks {
				println!(
					"{} {} | {} | {} | {} | due {}",
					checkbox(subtask.status),
					subtask.id,
					subtask.name,
					subtask.task_name,
					subtask.priority.label(),
					format_due(subtask.end_date)
				);
			}
		}
		Command::Complete { task } => {
			let task = find_task(store.workspace(), &task)?;
			let updates = set_task_status(&mut store, &task, true)?;
			println!("completed {} and {} subtasks", task.id, updates.len() - 1);
		}
		Command::Uncomplete { task } => {
			let task = find_task(store.workspace(), &task)?;
			set_task_status(&mut store, &task, false)?;
			println!("reopened {}", task.id);
		}
		Command::ToggleSubtask { id } => {
			let subtask = store
				.workspace()
				.subtask(&id)
				.cloned()
				.ok_or_else(|| format!("subtask not found: {id}"))?;
			let update = toggle_subtask(&subtask);
			dispatch(&mut store, std::slice::from_ref(&update))?;
			println!("{} {id}", if update.status() { "completed" } else { "reopened" });
		}
		Command::Calendar { view, date } => {
			let view = view.unwrap_or(settings.default_view);
			let reference = parse_day(date.as_deref())?;
			let tasks = store.tasks_by_owner(&owner)?;
			print_calendar(reference, view, &tasks);
		}
		Command::LogTime { task, subtask, ms } => {
			let time_owner = TimeOwner::from_refs(task.as_deref(), subtask.as_deref())?;
			let label = format!("{} {}", time_owner.kind(), time_owner.id());
			let record_id = store.create_time_record(time_owner, ms)?;
			println!("logged {} to {label} ({record_id})", format_elapsed(ms));
		}
		Command::Times { task, subtask } => {
			let filter = if task.is_some() || subtask.is_some() {
				Some(TimeOwner::from_refs(task.as_deref(), subtask.as_deref())?)
			} else {
				None
			};
			print_times(store.workspace(), &owner, filter.as_ref());
		}
		Command::DeleteTime { id } => {
			store.mutate(|workspace| workspace.delete_time_record(&id))?;
			println!("deleted time record {id}");
		}
		Command::Stores { .. } => {}
	}

	Ok(())
}

fn print_recent_stores(limit: usize) -> Result<(), Box<dyn Error>> {
	let rows = recent_stores(limit)?;
	if rows.is_empty() {
		println!("no recent stores");
		return Ok(());
	}

	for (index, path) in rows.iter().enumerate() {
		println!("{:>2}. {}", index + 1, path.display());
	}

	Ok(())
}

fn parse_when(input: &str) -> Result<DateTime<Local>, Box<dyn Error>> {
	parse_timestamp(input).ok_or_else(|| format!("invalid date: {input} (use YYYY-MM-DD HH:MM)").into())
}

fn parse_optional_when(input: Option<&str>) -> Result<Option<DateTime<Local>>, Box<dyn Error>> {
	input.map(parse_when).transpose()
}

/// An omitted start is "now", pulled back to the due date when that is already past.
fn start_or_now(
	start: Option<DateTime<Local>>,
	end: DateTime<Local>,
	now: DateTime<Local>,
) -> DateTime<Local> {
	start.unwrap_or_else(|| now.min(end))
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	if let Some(raw) = input {
		Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?)
	} else {
		Ok(Local::now().date_naive())
	}
}

fn find_task(workspace: &Workspace, id: &str) -> Result<Task, Box<dyn Error>> {
	workspace
		.task(id)
		.cloned()
		.ok_or_else(|| format!("task not found: {id}").into())
}

fn checkbox(done: bool) -> &'static str {
	if done { "[x]" } else { "[ ]" }
}

fn format_due(due: Option<DateTime<Local>>) -> String {
	due.map(|due| due.format("%Y-%m-%d %H:%M").to_string())
		.unwrap_or_else(|| "-".to_string())
}

fn group_name(workspace: &Workspace, group_id: &str) -> String {
	workspace
		.group(group_id)
		.map(|group| group.name.clone())
		.unwrap_or_else(|| "Unknown group".to_string())
}

fn print_groups(workspace: &Workspace, owner: &str) {
	let groups = workspace.groups_for_owner(owner);
	if groups.is_empty() {
		println!("no groups yet");
		return;
	}

	for group in groups {
		let tasks = workspace.tasks_in_group(&group.id);
		let done = tasks.iter().filter(|task| task.status).count();
		println!(
			"{} | {} | {} | grade {} | {done}/{} done",
			group.id,
			group.name,
			group.kind.label(),
			group.grade_id,
			tasks.len()
		);
	}
}

fn print_tasks(workspace: &Workspace, tasks: &[Task]) {
	if tasks.is_empty() {
		println!("no tasks yet");
		return;
	}

	for (day, day_tasks) in group_by_due_date(tasks) {
		match day {
			Some(day) => println!("\n{}", day.format("%a %d %b %Y")),
			None => println!("\nNo due date"),
		}
		for task in day_tasks {
			let subtasks = workspace.subtasks_of(&task.id);
			let spent = workspace.time_spent(&TimeOwner::Task(task.id.clone()));
			println!(
				"  {} {} | {} | {} | {} | due {} | {} subtasks | {}",
				checkbox(task.status),
				task.id,
				task.name,
				group_name(workspace, &task.group_id),
				task.priority.label(),
				format_due(task.end_date),
				subtasks.len(),
				format_elapsed(spent)
			);
		}
	}
}

fn print_calendar(reference: NaiveDate, view: Granularity, tasks: &[Task]) {
	println!("{}", period_title(reference, view));

	match bucket(reference, view, tasks) {
		CalendarView::Month(grid) => {
			println!(" Sun  Mon  Tue  Wed  Thu  Fri  Sat");
			for week in grid.weeks() {
				let row = week
					.iter()
					.map(|cell| {
						let marker = if cell.date == reference { '>' } else { ' ' };
						let count = match cell.items.len() {
							0 => ' ',
							1..=9 => char::from_digit(cell.items.len() as u32, 10).unwrap_or('+'),
							_ => '+',
						};
						if cell.in_month {
							format!("{marker}{:>2}{count}", cell.date.format("%d"))
						} else {
							format!("{marker} ..{count}")
						}
					})
					.collect::<Vec<_>>()
					.join(" ");
				println!("{row}");
			}

			println!("\nDue {}:", reference.format("%Y-%m-%d"));
			if grid.agenda.is_empty() {
				println!("  nothing due");
			}
			for task in grid.agenda {
				println!("  {} {} | {}", checkbox(task.status), task.name, format_due(task.end_date));
			}
		}
		CalendarView::Week(grid) => {
			for row in &grid.rows {
				let names = row
					.cells
					.iter()
					.flat_map(|cell| {
						cell.items
							.iter()
							.map(move |task| format!("{} {}", cell.date.format("%a"), task.name))
					})
					.collect::<Vec<_>>();
				if !names.is_empty() {
					println!("{:>5} | {}", row.label, names.join(", "));
				}
			}
		}
		CalendarView::Day(grid) => {
			for row in &grid.rows {
				let names = row
					.cells
					.iter()
					.flat_map(|cell| cell.items.iter().map(|task| task.name.as_str()))
					.collect::<Vec<_>>();
				println!("{:>5} | {}", row.label, names.join(", "));
			}
		}
	}
}

fn print_times(workspace: &Workspace, owner: &str, filter: Option<&TimeOwner>) {
	let records = workspace
		.time_records
		.iter()
		.filter(|record| match filter {
			Some(filter) => &record.owner == filter,
			None => match &record.owner {
				TimeOwner::Task(id) => workspace.task(id).is_some_and(|task| task.created_by == owner),
				TimeOwner::Subtask(id) => workspace
					.subtask(id)
					.is_some_and(|subtask| subtask.created_by == owner),
			},
		})
		.collect::<Vec<_>>();

	if records.is_empty() {
		println!("no time records");
		return;
	}

	let mut total = 0;
	for record in records {
		let name = match &record.owner {
			TimeOwner::Task(id) => workspace.task(id).map(|task| task.name.clone()),
			TimeOwner::Subtask(id) => workspace.subtask(id).map(|subtask| subtask.name.clone()),
		}
		.unwrap_or_else(|| "Unknown".to_string());
		total += record.duration_ms;
		println!(
			"{} | {} | {} {} | {} | {}",
			format_elapsed(record.duration_ms),
			record.id,
			record.owner.kind(),
			record.owner.id(),
			name,
			record.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
		);
	}
	println!("total {}", format_elapsed(total));
}
