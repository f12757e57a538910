use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Local, NaiveDate, Timelike, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use crossterm::{ExecutableCommand, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::{Frame, Terminal};
use tracing::{info, warn};

use crate::calendar::{
	self, CalendarView, Granularity, HourRow, advance, bucket, group_by_due_date, items_on,
	period_title, row_index_for_hour,
};
use crate::cascade::{dispatch, set_task_status, toggle_subtask};
use crate::domain::{GroupKind, NewSubtask, NewTask, Priority, Task, TimeOwner, Workspace, parse_timestamp};
use crate::stopwatch::{Control, StopwatchMode, StopwatchSession, format_elapsed};
use crate::store::{FileStore, TaskStore};

const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const IDLE_POLL: StdDuration = StdDuration::from_millis(250);
const HOUR_LABEL_WIDTH: usize = 6;
const RECENT_TIME_ROWS: usize = 8;

pub fn run_dashboard(
	store: &mut FileStore,
	owner: &str,
	default_view: Granularity,
) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, store, owner, default_view);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	store: &mut FileStore,
	owner: &str,
	default_view: Granularity,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(default_view);
	info!(owner = %owner, "dashboard opened");

	loop {
		let now = Utc::now();
		app.session.tick(now);
		let view = build_view(&app, store.workspace(), owner);
		app.clamp_selection(&view);
		terminal.draw(|frame| draw_dashboard(frame, &app, &view, now))?;

		// 10 ms while the stopwatch runs so the display keeps resampling.
		if event::poll(app.session.poll_timeout(Utc::now(), IDLE_POLL))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, store, owner),
					InputMode::Select(_) => handle_select_key(&mut app, key.code, store, owner),
					InputMode::Normal => handle_normal_key(&mut app, key.code, store, owner, &view),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	app.session.reset();
	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel, now: DateTime<Utc>) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(3), Constraint::Min(12), Constraint::Length(5)])
		.split(frame.area());

	let titles = TabKind::ALL.iter().map(|tab| tab.title()).collect::<Vec<_>>();
	let tabs = Tabs::new(titles)
		.select(app.tab.index())
		.block(Block::default().borders(Borders::ALL).title("taskcation"))
		.highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD));
	frame.render_widget(tabs, layout[0]);

	match app.tab {
		TabKind::Home => render_home_tab(frame, layout[1], app, view),
		TabKind::Calendar => render_calendar_tab(frame, layout[1], app, view),
		TabKind::Groups => render_groups_tab(frame, layout[1], app, view),
		TabKind::Timer => render_timer_tab(frame, layout[1], app, view, now),
	}
	render_footer(frame, layout[2], app);

	if let InputMode::Select(select) = &app.mode {
		render_select_popup(frame, select);
	}
}

fn render_home_tab(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let pending = view.tasks.iter().filter(|task| !task.status).count();
	let title = format!("Tasks | {pending} open of {}", view.tasks.len());
	render_row_list(frame, area, title, &view.home_rows, app.home_index, true, "(no tasks yet, press a to add one)");
}

fn render_row_list(
	frame: &mut Frame,
	area: Rect,
	title: String,
	rows: &[ListRow],
	selected: usize,
	focused: bool,
	empty: &'static str,
) {
	let items = if rows.is_empty() {
		vec![ListItem::new(empty)]
	} else {
		rows.iter().map(|row| ListItem::new(row.line.clone())).collect::<Vec<_>>()
	};

	let mut state = ListState::default();
	if !rows.is_empty() && focused {
		state.select(Some(selected.min(rows.len() - 1)));
	}

	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(title)
				.border_style(border_style(focused)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));
	frame.render_stateful_widget(list, area, &mut state);
}

fn render_calendar_tab(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let now = Local::now();
	let today = now.date_naive();
	let title = format!(
		"{} | {}",
		app.calendar_view.label(),
		period_title(app.reference, app.calendar_view)
	);

	match bucket(app.reference, app.calendar_view, &view.tasks) {
		CalendarView::Month(grid) => {
			let weeks = grid.weeks().count() as u16;
			let chunks = Layout::default()
				.direction(Direction::Vertical)
				.constraints([Constraint::Length(weeks + 3), Constraint::Min(4)])
				.split(area);

			let mut lines = vec![Line::from(" Sun  Mon  Tue  Wed  Thu  Fri  Sat")];
			for week in grid.weeks() {
				let spans = week
					.iter()
					.map(|cell| {
						let count = match cell.items.len() {
							0 => " ".to_string(),
							1..=9 => cell.items.len().to_string(),
							_ => "+".to_string(),
						};
						let mut style = Style::default();
						if !cell.in_month {
							style = style.fg(Color::DarkGray);
						} else if !cell.items.is_empty() {
							style = style.fg(Color::LightYellow).add_modifier(Modifier::BOLD);
						}
						if cell.date == today {
							style = style.add_modifier(Modifier::UNDERLINED);
						}
						if cell.date == app.reference {
							style = style.fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD);
						}
						Span::styled(format!(" {}{count}  ", cell.date.format("%d")), style)
					})
					.collect::<Vec<_>>();
				lines.push(Line::from(spans));
			}

			let block = Block::default()
				.borders(Borders::ALL)
				.title(title)
				.border_style(border_style(false));
			frame.render_widget(Paragraph::new(lines).block(block), chunks[0]);

			let agenda_title = format!("Due {}", app.reference.format("%A, %d %B"));
			render_row_list(frame, chunks[1], agenda_title, &view.agenda, app.agenda_index, true, "(nothing due)");
		}
		CalendarView::Week(grid) => {
			let highlight = if grid.days.contains(&today) {
				row_index_for_hour(now.hour())
			} else {
				None
			};
			let column_width = ((area.width as usize).saturating_sub(HOUR_LABEL_WIDTH + 2) / 7)
				.max(4);

			let mut header = vec![Span::raw(" ".repeat(HOUR_LABEL_WIDTH))];
			for day in &grid.days {
				let style = if *day == app.reference {
					Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
				} else {
					Style::default()
				};
				header.push(Span::styled(fit(&day.format("%a %d").to_string(), column_width), style));
			}

			let mut lines = vec![Line::from(header)];
			lines.extend(hour_lines(&grid.rows, highlight, column_width));
			render_hour_grid(frame, area, title, lines, app.calendar_scroll);
		}
		CalendarView::Day(grid) => {
			let highlight = if grid.date == today {
				row_index_for_hour(now.hour())
			} else {
				None
			};
			let column_width = (area.width as usize).saturating_sub(HOUR_LABEL_WIDTH + 2).max(4);
			let lines = hour_lines(&grid.rows, highlight, column_width);
			render_hour_grid(frame, area, title, lines, app.calendar_scroll);
		}
	}
}

fn hour_lines(rows: &[HourRow<'_, Task>], highlight: Option<usize>, column_width: usize) -> Vec<Line<'static>> {
	rows.iter()
		.enumerate()
		.map(|(index, row)| {
			let row_style = if Some(index) == highlight {
				Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD)
			} else {
				Style::default()
			};
			let mut spans = vec![Span::styled(
				format!("{:>width$} ", row.label, width = HOUR_LABEL_WIDTH - 1),
				row_style.fg(Color::DarkGray),
			)];
			for cell in &row.cells {
				let names = cell
					.items
					.iter()
					.map(|task| format!("{}{}", if task.status { "x " } else { "" }, task.name))
					.collect::<Vec<_>>()
					.join(", ");
				let style = cell
					.items
					.first()
					.map(|task| priority_style(task.priority))
					.unwrap_or_default();
				spans.push(Span::styled(fit(&names, column_width), row_style.patch(style)));
			}
			Line::from(spans)
		})
		.collect()
}

fn render_hour_grid(frame: &mut Frame, area: Rect, title: String, lines: Vec<Line<'static>>, scroll: u16) {
	let block = Block::default()
		.borders(Borders::ALL)
		.title(title)
		.border_style(border_style(true));
	frame.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);
}

fn render_groups_tab(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
		.split(area);

	render_row_list(
		frame,
		body[0],
		"Subjects & Categories".to_string(),
		&view.groups,
		app.group_index,
		app.group_pane == GroupPane::Groups,
		"(no groups yet, press g to add one)",
	);

	let title = view
		.selected_group_name
		.as_deref()
		.map(|name| format!("Tasks in {name}"))
		.unwrap_or_else(|| "Tasks".to_string());
	render_row_list(
		frame,
		body[1],
		title,
		&view.group_tasks,
		app.group_task_index,
		app.group_pane == GroupPane::Tasks,
		"(no tasks in this group)",
	);
}

fn render_timer_tab(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel, now: DateTime<Utc>) {
	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
		.split(area);

	let watch = app.session.watch();
	let state = match watch.mode() {
		StopwatchMode::Idle => "Idle",
		StopwatchMode::Running { .. } => "Running",
		StopwatchMode::Paused => "Paused",
	};
	let enabled = app.session.controls();
	let buttons = [Control::Start, Control::Resume, Control::Pause, Control::Reset, Control::Save]
		.into_iter()
		.flat_map(|control| {
			let style = if enabled.contains(&control) {
				Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
			} else {
				Style::default().fg(Color::DarkGray)
			};
			[
				Span::styled(format!("[{}] {}", control_key(control), control.label()), style),
				Span::raw("  "),
			]
		})
		.collect::<Vec<_>>();

	let lines = vec![
		Line::from(""),
		Line::from(Span::styled(
			format!("   {}", app.session.display(now)),
			Style::default().fg(Color::LightCyan).add_modifier(Modifier::BOLD),
		)),
		Line::from(""),
		Line::from(format!("   {state}")),
		Line::from(""),
		Line::from(buttons),
	];
	let block = Block::default()
		.borders(Borders::ALL)
		.title("Stopwatch")
		.border_style(border_style(watch.is_running()));
	frame.render_widget(Paragraph::new(lines).block(block), body[0]);

	let mut lines = vec![Line::from(format!("Logged today: {}", format_elapsed(view.logged_today_ms))), Line::from("")];
	if view.recent_times.is_empty() {
		lines.push(Line::from("(no time records yet)"));
	}
	lines.extend(view.recent_times.iter().cloned());
	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Recent time"));
	frame.render_widget(panel, body[1]);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("Tab/Shift-Tab switch view | j/k move | q quit"),
			Line::from(app.tab.shortcuts()),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from(format!("Enter submit | Esc cancel | {}", app.status)),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from(format!("j/k or arrows move | Enter choose | Esc cancel | {}", app.status)),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 55, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let current = if select.options.is_empty() {
		0
	} else {
		select.selected.saturating_add(1)
	};
	let total = select.options.len();
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(format!("{} ({current}/{total})", select.title)),
		)
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	store: &mut FileStore,
	owner: &str,
	view: &ViewModel,
) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => return true,
		KeyCode::Tab => {
			app.tab = app.tab.next();
			return false;
		}
		KeyCode::BackTab => {
			app.tab = app.tab.prev();
			return false;
		}
		_ => {}
	}

	match app.tab {
		TabKind::Home => handle_home_key(app, code, store, view),
		TabKind::Calendar => handle_calendar_key(app, code, store, view),
		TabKind::Groups => handle_groups_key(app, code, store, view),
		TabKind::Timer => handle_timer_key(app, code, store.workspace(), owner),
	}

	false
}

fn handle_home_key(app: &mut App, code: KeyCode, store: &mut FileStore, view: &ViewModel) {
	match code {
		KeyCode::Up | KeyCode::Char('k') => app.home_index = app.home_index.saturating_sub(1),
		KeyCode::Down | KeyCode::Char('j') => app.home_index = (app.home_index + 1).min(view.home_rows.len().saturating_sub(1)),
		KeyCode::Char(' ') | KeyCode::Enter => {
			if let Some(row) = view.home_rows.get(app.home_index) {
				app.report(toggle_row(store, &row.target));
			}
		}
		KeyCode::Char('a') => app.open(build_task_group_select(store.workspace(), &view.owner)),
		KeyCode::Char('n') => match view.home_rows.get(app.home_index).and_then(|row| row.task_id(store.workspace())) {
			Some(task_id) => {
				app.mode = InputMode::Prompt(PromptState::new("Subtask name", PromptKind::SubtaskName { task_id }));
			}
			None => app.status = "select a task first".to_string(),
		},
		KeyCode::Char('d') => {
			if let Some(select) = view.home_rows.get(app.home_index).and_then(|row| build_delete_select(store.workspace(), &row.target)) {
				app.mode = InputMode::Select(select);
			}
		}
		KeyCode::Char('g') => {
			app.mode = InputMode::Prompt(PromptState::new("Group name", PromptKind::GroupName));
		}
		_ => {}
	}
}

fn handle_calendar_key(app: &mut App, code: KeyCode, store: &mut FileStore, view: &ViewModel) {
	match code {
		KeyCode::Char('m') => app.set_calendar_view(Granularity::Month),
		KeyCode::Char('w') => app.set_calendar_view(Granularity::Week),
		KeyCode::Char('d') => app.set_calendar_view(Granularity::Day),
		KeyCode::Char('h') | KeyCode::Left => app.step_calendar(calendar::Direction::Back),
		KeyCode::Char('l') | KeyCode::Right => app.step_calendar(calendar::Direction::Forward),
		KeyCode::Char('[') => app.step_day(calendar::Direction::Back),
		KeyCode::Char(']') => app.step_day(calendar::Direction::Forward),
		KeyCode::Char('t') => {
			app.reference = Local::now().date_naive();
			app.agenda_index = 0;
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if app.calendar_view == Granularity::Month {
				app.agenda_index = app.agenda_index.saturating_sub(1);
			} else {
				app.calendar_scroll = app.calendar_scroll.saturating_sub(1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if app.calendar_view == Granularity::Month {
				app.agenda_index = (app.agenda_index + 1).min(view.agenda.len().saturating_sub(1));
			} else {
				app.calendar_scroll = (app.calendar_scroll + 1).min(23);
			}
		}
		KeyCode::Char(' ') | KeyCode::Enter => {
			if let Some(row) = view.agenda.get(app.agenda_index) {
				app.report(toggle_row(store, &row.target));
			}
		}
		_ => {}
	}
}

fn handle_groups_key(app: &mut App, code: KeyCode, store: &mut FileStore, view: &ViewModel) {
	match code {
		KeyCode::Left | KeyCode::Char('h') => app.group_pane = GroupPane::Groups,
		KeyCode::Right | KeyCode::Char('l') => app.group_pane = GroupPane::Tasks,
		KeyCode::Up | KeyCode::Char('k') => match app.group_pane {
			GroupPane::Groups => {
				app.group_index = app.group_index.saturating_sub(1);
				app.group_task_index = 0;
			}
			GroupPane::Tasks => app.group_task_index = app.group_task_index.saturating_sub(1),
		},
		KeyCode::Down | KeyCode::Char('j') => match app.group_pane {
			GroupPane::Groups => {
				app.group_index = (app.group_index + 1).min(view.groups.len().saturating_sub(1));
				app.group_task_index = 0;
			}
			GroupPane::Tasks => {
				app.group_task_index = (app.group_task_index + 1).min(view.group_tasks.len().saturating_sub(1));
			}
		},
		KeyCode::Char(' ') | KeyCode::Enter if app.group_pane == GroupPane::Tasks => {
			if let Some(row) = view.group_tasks.get(app.group_task_index) {
				app.report(toggle_row(store, &row.target));
			}
		}
		KeyCode::Enter => app.group_pane = GroupPane::Tasks,
		KeyCode::Char('g') => {
			app.mode = InputMode::Prompt(PromptState::new("Group name", PromptKind::GroupName));
		}
		KeyCode::Char('a') => match view.groups.get(app.group_index) {
			Some(ListRow {
				target: RowTarget::Group(group_id),
				..
			}) => {
				app.mode = InputMode::Prompt(PromptState::new(
					"Task name",
					PromptKind::TaskName {
						group_id: group_id.clone(),
					},
				));
			}
			_ => app.status = "add a group first".to_string(),
		},
		KeyCode::Char('d') => {
			let rows = match app.group_pane {
				GroupPane::Groups => view.groups.get(app.group_index),
				GroupPane::Tasks => view.group_tasks.get(app.group_task_index),
			};
			if let Some(select) = rows.and_then(|row| build_delete_select(store.workspace(), &row.target)) {
				app.mode = InputMode::Select(select);
			}
		}
		_ => {}
	}
}

fn handle_timer_key(app: &mut App, code: KeyCode, workspace: &Workspace, owner: &str) {
	let wanted = match code {
		KeyCode::Char('s') => {
			if app.session.controls().contains(&Control::Resume) {
				Control::Resume
			} else {
				Control::Start
			}
		}
		KeyCode::Char('p') => Control::Pause,
		KeyCode::Char('r') => Control::Reset,
		KeyCode::Char('v') | KeyCode::Enter => Control::Save,
		_ => return,
	};

	if !app.session.controls().contains(&wanted) {
		app.status = format!("{} is not available right now", wanted.label());
		return;
	}

	let now = Utc::now();
	match wanted {
		Control::Start | Control::Resume => {
			app.session.start(now);
			app.status = "Timer running".to_string();
		}
		Control::Pause => {
			app.session.pause(now);
			app.status = format!("Paused at {}", app.session.display(now));
		}
		Control::Reset => {
			app.session.reset();
			app.status = "Timer reset".to_string();
		}
		Control::Save => match app.session.save(now) {
			Ok(elapsed_ms) => app.open(build_time_owner_select(workspace, owner, elapsed_ms)),
			Err(err) => app.status = format!("error: {err}"),
		},
	}
}

fn handle_prompt_key(app: &mut App, code: KeyCode, store: &mut FileStore, owner: &str) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Select(_) => return false,
			};

			match submit_prompt(prompt.clone(), store, owner) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => app.mode = InputMode::Prompt(next_prompt),
				Ok(PromptOutcome::Select(select)) => app.mode = InputMode::Select(select),
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(app: &mut App, code: KeyCode, store: &mut FileStore, owner: &str) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			match submit_select(select.clone(), store, owner) {
				Ok(SelectOutcome::NextPrompt(prompt)) => app.mode = InputMode::Prompt(prompt),
				Ok(SelectOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Ok(SelectOutcome::TimeSaved(message)) => {
					app.session.reset();
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					warn!(error = %err, "dashboard action failed");
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt(prompt: PromptState, store: &mut FileStore, owner: &str) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::GroupName => {
			let name = required_text(&prompt.input, "group name")?;
			Ok(PromptOutcome::Select(build_group_kind_select(name)))
		}
		PromptKind::GroupGrade { name } => {
			let grade = optional_text(&prompt.input);
			store
				.mutate(|workspace| workspace.add_group(owner, &name, GroupKind::Subjects, grade, Utc::now()))
				.map_err(|err| err.to_string())?;
			Ok(PromptOutcome::Done(format!("created subject: {name}")))
		}
		PromptKind::TaskName { group_id } => {
			let name = required_text(&prompt.input, "task name")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Due (YYYY-MM-DD HH:MM)",
				PromptKind::TaskDue { group_id, name },
			)))
		}
		PromptKind::TaskDue { group_id, name } => {
			let end_date = parse_due(&prompt.input)?;
			let now = Utc::now();
			let priority = store.workspace().suggested_priority(&group_id, end_date, now);
			let new_task = NewTask {
				name: name.clone(),
				start_date: crate::start_or_now(None, end_date, Local::now()),
				end_date,
				notes: None,
				group_id,
				priority,
			};
			store
				.mutate(|workspace| workspace.add_task(owner, new_task, now))
				.map_err(|err| err.to_string())?;
			Ok(PromptOutcome::Done(format!("created task: {name} ({})", priority.label())))
		}
		PromptKind::SubtaskName { task_id } => {
			let name = required_text(&prompt.input, "subtask name")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Due (YYYY-MM-DD HH:MM)",
				PromptKind::SubtaskDue { task_id, name },
			)))
		}
		PromptKind::SubtaskDue { task_id, name } => {
			let end_date = parse_due(&prompt.input)?;
			let now = Utc::now();
			let priority = match store.workspace().task(&task_id) {
				Some(task) => store.workspace().suggested_priority(&task.group_id, end_date, now),
				None => Priority::NotApplicable,
			};
			let new_subtask = NewSubtask {
				task_id,
				name: name.clone(),
				start_date: crate::start_or_now(None, end_date, Local::now()),
				end_date,
				notes: None,
				priority,
			};
			store
				.mutate(|workspace| workspace.add_subtask(owner, new_subtask, now))
				.map_err(|err| err.to_string())?;
			Ok(PromptOutcome::Done(format!("created subtask: {name}")))
		}
	}
}

fn submit_select(select: SelectState, store: &mut FileStore, owner: &str) -> Result<SelectOutcome, String> {
	let selected_value = select
		.selected_option()
		.and_then(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;

	match select.kind {
		SelectKind::TaskGroup => Ok(SelectOutcome::NextPrompt(PromptState::new(
			"Task name",
			PromptKind::TaskName {
				group_id: selected_value,
			},
		))),
		SelectKind::GroupKind { name } => {
			let kind = selected_value.parse::<GroupKind>().map_err(|err| err.to_string())?;
			match kind {
				GroupKind::Subjects => Ok(SelectOutcome::NextPrompt(PromptState::new(
					"Grade (optional, e.g. B)",
					PromptKind::GroupGrade { name },
				))),
				GroupKind::Categories => {
					store
						.mutate(|workspace| workspace.add_group(owner, &name, kind, None, Utc::now()))
						.map_err(|err| err.to_string())?;
					Ok(SelectOutcome::Done(format!("created category: {name}")))
				}
			}
		}
		SelectKind::DeleteConfirm { target, label } => {
			if selected_value != "delete" {
				return Ok(SelectOutcome::Done("Delete cancelled".to_string()));
			}
			store
				.mutate(|workspace| match &target {
					RowTarget::Task(id) => workspace.delete_task(id).map(|_| ()),
					RowTarget::Subtask(id) => workspace.delete_subtask(id),
					RowTarget::Group(id) => workspace.delete_group(id),
					RowTarget::Heading => Ok(()),
				})
				.map_err(|err| err.to_string())?;
			Ok(SelectOutcome::Done(format!("deleted {label}")))
		}
		SelectKind::TimeOwner { elapsed_ms } => {
			let time_owner = parse_owner_value(&selected_value)?;
			let label = select
				.selected_option()
				.map(|option| option.label.clone())
				.unwrap_or_default();
			store
				.create_time_record(time_owner, elapsed_ms)
				.map_err(|err| err.to_string())?;
			Ok(SelectOutcome::TimeSaved(format!(
				"saved {} to {label}",
				format_elapsed(elapsed_ms)
			)))
		}
	}
}

fn toggle_row(store: &mut FileStore, target: &RowTarget) -> Result<String, String> {
	match target {
		RowTarget::Task(id) => {
			let task = store
				.workspace()
				.task(id)
				.cloned()
				.ok_or_else(|| format!("task not found: {id}"))?;
			let updates = set_task_status(store, &task, !task.status).map_err(|err| err.to_string())?;
			if task.status {
				Ok(format!("reopened: {}", task.name))
			} else {
				Ok(format!("completed: {} (+{} subtasks)", task.name, updates.len().saturating_sub(1)))
			}
		}
		RowTarget::Subtask(id) => {
			let subtask = store
				.workspace()
				.subtask(id)
				.cloned()
				.ok_or_else(|| format!("subtask not found: {id}"))?;
			let update = toggle_subtask(&subtask);
			dispatch(store, std::slice::from_ref(&update)).map_err(|err| err.to_string())?;
			let verb = if update.status() { "completed" } else { "reopened" };
			Ok(format!("{verb}: {}", subtask.name))
		}
		RowTarget::Group(_) | RowTarget::Heading => Err("nothing to toggle here".to_string()),
	}
}

fn build_task_group_select(workspace: &Workspace, owner: &str) -> Result<SelectState, String> {
	let options = workspace
		.groups_for_owner(owner)
		.into_iter()
		.map(|group| {
			SelectOption::new(
				format!("{} ({})", group.name, group.kind.label()),
				Some(group.id.clone()),
				Style::default(),
			)
		})
		.collect::<Vec<_>>();

	if options.is_empty() {
		return Err("add a group first (g)".to_string());
	}
	Ok(SelectState::new("Group for the new task", SelectKind::TaskGroup, options))
}

fn build_group_kind_select(name: String) -> SelectState {
	let options = [GroupKind::Subjects, GroupKind::Categories]
		.into_iter()
		.map(|kind| SelectOption::new(kind.label(), Some(kind.label().to_string()), Style::default()))
		.collect();
	SelectState::new(format!("Kind of {name}"), SelectKind::GroupKind { name }, options)
}

fn build_delete_select(workspace: &Workspace, target: &RowTarget) -> Option<SelectState> {
	let (label, detail) = match target {
		RowTarget::Task(id) => {
			let task = workspace.task(id)?;
			let subtasks = workspace.subtasks_of(id).len();
			(format!("task {}", task.name), format!("also removes {subtasks} subtasks and their time"))
		}
		RowTarget::Subtask(id) => {
			let subtask = workspace.subtask(id)?;
			(format!("subtask {}", subtask.name), "also removes its time records".to_string())
		}
		RowTarget::Group(id) => {
			let group = workspace.group(id)?;
			(format!("group {}", group.name), "tasks keep their other data".to_string())
		}
		RowTarget::Heading => return None,
	};

	let options = vec![
		SelectOption::new("Keep", Some("keep".to_string()), Style::default()),
		SelectOption::new(format!("Delete ({detail})"), Some("delete".to_string()), Style::default().fg(Color::Red)),
	];
	Some(SelectState::new(
		format!("Delete {label}?"),
		SelectKind::DeleteConfirm {
			target: target.clone(),
			label,
		},
		options,
	))
}

fn build_time_owner_select(workspace: &Workspace, owner: &str, elapsed_ms: u64) -> Result<SelectState, String> {
	let mut options = Vec::new();
	for task in workspace.tasks_for_owner(owner).into_iter().filter(|task| !task.status) {
		options.push(SelectOption::new(
			format!("{} | {}", task.name, priority_label(task.priority)),
			Some(owner_value(&TimeOwner::Task(task.id.clone()))),
			priority_style(task.priority),
		));
		for subtask in workspace.subtasks_of(&task.id).into_iter().filter(|subtask| !subtask.status) {
			options.push(SelectOption::new(
				format!("  - {}", subtask.name),
				Some(owner_value(&TimeOwner::Subtask(subtask.id.clone()))),
				Style::default(),
			));
		}
	}

	if options.is_empty() {
		return Err("no open task to log time to".to_string());
	}
	Ok(SelectState::new(
		format!("Save {} to", format_elapsed(elapsed_ms)),
		SelectKind::TimeOwner { elapsed_ms },
		options,
	))
}

fn owner_value(owner: &TimeOwner) -> String {
	format!("{}:{}", owner.kind(), owner.id())
}

fn parse_owner_value(value: &str) -> Result<TimeOwner, String> {
	let (kind, id) = value
		.split_once(':')
		.ok_or_else(|| format!("malformed time owner: {value}"))?;
	let owner = match kind {
		"task" => TimeOwner::from_refs(Some(id), None),
		"subtask" => TimeOwner::from_refs(None, Some(id)),
		_ => return Err(format!("malformed time owner: {value}")),
	};
	owner.map_err(|err| err.to_string())
}

fn build_view(app: &App, workspace: &Workspace, owner: &str) -> ViewModel {
	let tasks = workspace
		.tasks_for_owner(owner)
		.into_iter()
		.cloned()
		.collect::<Vec<_>>();
	let home_rows = build_home_rows(workspace, &tasks);
	let agenda = items_on(app.reference, &tasks)
		.into_iter()
		.map(|task| task_row(workspace, task, false))
		.collect();

	let group_list = workspace.groups_for_owner(owner);
	let groups = group_list
		.iter()
		.map(|group| {
			let in_group = workspace.tasks_in_group(&group.id);
			let done = in_group.iter().filter(|task| task.status).count();
			let grade = group.grade().map(|grade| format!(" | grade {grade}")).unwrap_or_default();
			ListRow {
				target: RowTarget::Group(group.id.clone()),
				line: Line::from(format!(
					"{} | {}{grade} | {done}/{}",
					group.name,
					group.kind.label(),
					in_group.len()
				)),
			}
		})
		.collect::<Vec<_>>();
	let selected_group = group_list.get(app.group_index.min(group_list.len().saturating_sub(1)));
	let group_tasks = selected_group
		.map(|group| {
			tasks
				.iter()
				.filter(|task| task.group_id == group.id)
				.map(|task| task_row(workspace, task, true))
				.collect()
		})
		.unwrap_or_default();

	let today = Local::now().date_naive();
	let mut records = workspace
		.time_records
		.iter()
		.filter(|record| owned_by(workspace, &record.owner, owner))
		.collect::<Vec<_>>();
	records.sort_by(|left, right| right.created_at.cmp(&left.created_at));
	let logged_today_ms = records
		.iter()
		.filter(|record| record.created_at.with_timezone(&Local).date_naive() == today)
		.map(|record| record.duration_ms)
		.sum();
	let recent_times = records
		.iter()
		.take(RECENT_TIME_ROWS)
		.map(|record| {
			let name = match &record.owner {
				TimeOwner::Task(id) => workspace.task(id).map(|task| task.name.clone()),
				TimeOwner::Subtask(id) => workspace.subtask(id).map(|subtask| subtask.name.clone()),
			}
			.unwrap_or_else(|| "Unknown".to_string());
			Line::from(format!(
				"{} | {} | {}",
				record.created_at.with_timezone(&Local).format("%d %b %H:%M"),
				format_elapsed(record.duration_ms),
				name
			))
		})
		.collect();

	ViewModel {
		owner: owner.to_string(),
		tasks,
		home_rows,
		agenda,
		groups,
		selected_group_name: selected_group.map(|group| group.name.clone()),
		group_tasks,
		recent_times,
		logged_today_ms,
	}
}

fn build_home_rows(workspace: &Workspace, tasks: &[Task]) -> Vec<ListRow> {
	let mut rows = Vec::new();
	for (day, day_tasks) in group_by_due_date(tasks) {
		let heading = match day {
			Some(day) => day.format("%A, %d %B %Y").to_string(),
			None => "No due date".to_string(),
		};
		rows.push(ListRow {
			target: RowTarget::Heading,
			line: Line::from(Span::styled(heading, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
		});

		for task in day_tasks {
			rows.push(task_row(workspace, task, false));
			for subtask in workspace.subtasks_of(&task.id) {
				rows.push(ListRow {
					target: RowTarget::Subtask(subtask.id.clone()),
					line: Line::from(vec![
						Span::raw(format!("    {} ", checkbox(subtask.status))),
						Span::raw(subtask.name.clone()),
						Span::styled(
							format!(" | {}", due_time(subtask.end_date)),
							Style::default().fg(Color::DarkGray),
						),
					]),
				});
			}
		}
	}
	rows
}

fn task_row(workspace: &Workspace, task: &Task, show_date: bool) -> ListRow {
	let group = workspace
		.group(&task.group_id)
		.map(|group| group.name.clone())
		.unwrap_or_else(|| "Unknown group".to_string());
	let due = if show_date {
		task.end_date
			.map(|due| due.format("%d %b %H:%M").to_string())
			.unwrap_or_else(|| "-".to_string())
	} else {
		due_time(task.end_date)
	};
	let name_style = if task.status {
		Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
	} else {
		Style::default()
	};

	ListRow {
		target: RowTarget::Task(task.id.clone()),
		line: Line::from(vec![
			Span::raw(format!("{} ", checkbox(task.status))),
			Span::styled(task.name.clone(), name_style),
			Span::raw(format!(" | {group} | ")),
			Span::styled(priority_label(task.priority), priority_style(task.priority)),
			Span::styled(format!(" | {due}"), Style::default().fg(Color::DarkGray)),
		]),
	}
}

fn owned_by(workspace: &Workspace, time_owner: &TimeOwner, owner: &str) -> bool {
	match time_owner {
		TimeOwner::Task(id) => workspace.task(id).is_some_and(|task| task.created_by == owner),
		TimeOwner::Subtask(id) => workspace.subtask(id).is_some_and(|subtask| subtask.created_by == owner),
	}
}

fn parse_due(input: &str) -> Result<DateTime<Local>, String> {
	parse_timestamp(input).ok_or_else(|| format!("invalid date: {} (use YYYY-MM-DD HH:MM)", input.trim()))
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn optional_text(input: &str) -> Option<String> {
	let value = input.trim();
	if value.is_empty() {
		None
	} else {
		Some(value.to_string())
	}
}

fn checkbox(done: bool) -> &'static str {
	if done { "[x]" } else { "[ ]" }
}

fn due_time(due: Option<DateTime<Local>>) -> String {
	due.map(|due| format!("due {}", due.format("%H:%M")))
		.unwrap_or_else(|| "no due date".to_string())
}

fn priority_label(priority: Priority) -> String {
	format!("{} priority", priority.label())
}

fn priority_style(priority: Priority) -> Style {
	match priority {
		Priority::Urgent => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
		Priority::High => Style::default().fg(Color::LightRed),
		Priority::Medium => Style::default().fg(Color::Yellow),
		Priority::Low => Style::default().fg(Color::Green),
		Priority::NotApplicable => Style::default().fg(Color::DarkGray),
	}
}

fn control_key(control: Control) -> char {
	match control {
		Control::Start | Control::Resume => 's',
		Control::Pause => 'p',
		Control::Reset => 'r',
		Control::Save => 'v',
	}
}

/// Truncates or pads `text` to exactly `width` columns.
fn fit(text: &str, width: usize) -> String {
	let mut out = text.chars().take(width.saturating_sub(1)).collect::<String>();
	if text.chars().count() >= width && width > 1 {
		out.pop();
		out.push('~');
	}
	format!("{out:<width$}")
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Select(SelectState),
	Done(String),
}

#[derive(Debug, Clone)]
enum SelectOutcome {
	NextPrompt(PromptState),
	Done(String),
	TimeSaved(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	GroupName,
	GroupGrade { name: String },
	TaskName { group_id: String },
	TaskDue { group_id: String, name: String },
	SubtaskName { task_id: String },
	SubtaskDue { task_id: String, name: String },
}

#[derive(Debug, Clone)]
enum SelectKind {
	TaskGroup,
	GroupKind { name: String },
	DeleteConfirm { target: RowTarget, label: String },
	TimeOwner { elapsed_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TabKind {
	Home,
	Calendar,
	Groups,
	Timer,
}

impl TabKind {
	const ALL: [TabKind; 4] = [TabKind::Home, TabKind::Calendar, TabKind::Groups, TabKind::Timer];

	fn index(self) -> usize {
		Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
	}

	fn next(self) -> Self {
		Self::ALL[(self.index() + 1) % Self::ALL.len()]
	}

	fn prev(self) -> Self {
		Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
	}

	fn title(self) -> &'static str {
		match self {
			TabKind::Home => "Home",
			TabKind::Calendar => "Calendar",
			TabKind::Groups => "Groups",
			TabKind::Timer => "Timer",
		}
	}

	fn shortcuts(self) -> &'static str {
		match self {
			TabKind::Home => "space complete/reopen | a new task | n new subtask | g new group | d delete",
			TabKind::Calendar => "m/w/d month/week/day | h/l back/forward | [/] day | t today | space complete",
			TabKind::Groups => "h/l pane | space complete | g new group | a new task | d delete",
			TabKind::Timer => "s start/resume | p pause | r reset | v save",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupPane {
	Groups,
	Tasks,
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct App {
	tab: TabKind,
	home_index: usize,
	calendar_view: Granularity,
	reference: NaiveDate,
	agenda_index: usize,
	calendar_scroll: u16,
	group_pane: GroupPane,
	group_index: usize,
	group_task_index: usize,
	session: StopwatchSession,
	mode: InputMode,
	status: String,
}

impl App {
	fn new(calendar_view: Granularity) -> Self {
		Self {
			tab: TabKind::Home,
			home_index: 0,
			calendar_view,
			reference: Local::now().date_naive(),
			agenda_index: 0,
			calendar_scroll: 0,
			group_pane: GroupPane::Groups,
			group_index: 0,
			group_task_index: 0,
			session: StopwatchSession::new(),
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}

	fn clamp_selection(&mut self, view: &ViewModel) {
		self.home_index = clamp_index(self.home_index, view.home_rows.len());
		self.agenda_index = clamp_index(self.agenda_index, view.agenda.len());
		self.group_index = clamp_index(self.group_index, view.groups.len());
		self.group_task_index = clamp_index(self.group_task_index, view.group_tasks.len());
	}

	fn set_calendar_view(&mut self, view: Granularity) {
		self.calendar_view = view;
		self.calendar_scroll = match view {
			Granularity::Month => 0,
			Granularity::Week | Granularity::Day => {
				row_index_for_hour(Local::now().hour()).unwrap_or(0).saturating_sub(2) as u16
			}
		};
	}

	fn step_calendar(&mut self, direction: calendar::Direction) {
		self.reference = advance(self.reference, self.calendar_view, direction);
		self.agenda_index = 0;
	}

	fn step_day(&mut self, direction: calendar::Direction) {
		self.reference = advance(self.reference, Granularity::Day, direction);
		self.agenda_index = 0;
	}

	fn open(&mut self, select: Result<SelectState, String>) {
		match select {
			Ok(select) => self.mode = InputMode::Select(select),
			Err(message) => self.status = message,
		}
	}

	fn report(&mut self, outcome: Result<String, String>) {
		self.status = match outcome {
			Ok(message) => message,
			Err(err) => {
				warn!(error = %err, "dashboard action failed");
				format!("error: {err}")
			}
		};
	}
}

fn clamp_index(index: usize, len: usize) -> usize {
	if len == 0 { 0 } else { index.min(len - 1) }
}

struct ViewModel {
	owner: String,
	tasks: Vec<Task>,
	home_rows: Vec<ListRow>,
	agenda: Vec<ListRow>,
	groups: Vec<ListRow>,
	selected_group_name: Option<String>,
	group_tasks: Vec<ListRow>,
	recent_times: Vec<Line<'static>>,
	logged_today_ms: u64,
}

struct ListRow {
	target: RowTarget,
	line: Line<'static>,
}

impl ListRow {
	/// The task a new subtask would hang under.
	fn task_id(&self, workspace: &Workspace) -> Option<String> {
		match &self.target {
			RowTarget::Task(id) => Some(id.clone()),
			RowTarget::Subtask(id) => workspace.subtask(id).map(|subtask| subtask.task_id.clone()),
			RowTarget::Group(_) | RowTarget::Heading => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RowTarget {
	Heading,
	Task(String),
	Subtask(String),
	Group(String),
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;

	fn seeded() -> (Workspace, String) {
		let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
		let mut workspace = Workspace::new();
		let group = workspace
			.add_group("owner", "Chemistry", GroupKind::Subjects, Some("D".to_string()), now)
			.expect("group should be created");
		let mut first = None;
		for (name, day) in [("Lab report", 3), ("Reading", 1)] {
			let id = workspace
				.add_task(
					"owner",
					NewTask {
						name: name.to_string(),
						start_date: Local.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
						end_date: Local.with_ymd_and_hms(2025, 1, day, 15, 0, 0).unwrap(),
						notes: None,
						group_id: group.clone(),
						priority: Priority::High,
					},
					now,
				)
				.expect("task should be created");
			first.get_or_insert(id);
		}
		let lab = first.expect("first task id");
		workspace
			.add_subtask(
				"owner",
				NewSubtask {
					task_id: lab.clone(),
					name: "Graphs".to_string(),
					start_date: Local.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
					end_date: Local.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap(),
					notes: None,
					priority: Priority::Low,
				},
				now,
			)
			.expect("subtask should be created");
		(workspace, lab)
	}

	#[test]
	fn home_rows_are_grouped_by_due_day_with_subtasks_inline() {
		let (workspace, lab) = seeded();
		let tasks = workspace
			.tasks_for_owner("owner")
			.into_iter()
			.cloned()
			.collect::<Vec<_>>();
		let rows = build_home_rows(&workspace, &tasks);
		let targets = rows.iter().map(|row| row.target.clone()).collect::<Vec<_>>();

		assert_eq!(targets.len(), 5);
		assert_eq!(targets[0], RowTarget::Heading);
		assert!(matches!(&targets[1], RowTarget::Task(id) if id != &lab));
		assert_eq!(targets[2], RowTarget::Heading);
		assert_eq!(targets[3], RowTarget::Task(lab.clone()));
		assert!(matches!(targets[4], RowTarget::Subtask(_)));
		assert_eq!(rows[4].task_id(&workspace), Some(lab));
	}

	#[test]
	fn time_owner_options_round_trip() {
		let (workspace, lab) = seeded();
		let select = build_time_owner_select(&workspace, "owner", 1_000).expect("options expected");
		assert_eq!(select.options.len(), 3);

		let values = select
			.options
			.iter()
			.filter_map(|option| option.value.as_deref())
			.map(parse_owner_value)
			.collect::<Result<Vec<_>, _>>()
			.expect("values should parse");
		assert_eq!(values[0], TimeOwner::Task(lab));
		assert!(matches!(values[1], TimeOwner::Subtask(_)));
		assert!(parse_owner_value("nobody:x").is_err());
		assert!(parse_owner_value("task:").is_err());
	}

	#[test]
	fn toggling_a_task_row_cascades_through_the_file_store() {
		let (workspace, lab) = seeded();
		let mut path = std::env::temp_dir();
		path.push(format!("taskcation_ui_toggle.store_{}", std::process::id()));
		crate::store::save_workspace(&path, &workspace).expect("seed should save");
		let mut store = FileStore::open(&path).expect("open should work");

		let message = toggle_row(&mut store, &RowTarget::Task(lab.clone())).expect("toggle should work");
		assert!(message.contains("+1 subtasks"));
		assert!(store.workspace().subtasks_of(&lab).iter().all(|subtask| subtask.status));
		assert!(toggle_row(&mut store, &RowTarget::Heading).is_err());
		let _ = std::fs::remove_file(path);
	}

	#[test]
	fn timer_save_resets_only_after_the_record_is_written() {
		let (workspace, lab) = seeded();
		let mut path = std::env::temp_dir();
		path.push(format!("taskcation_ui_timer_save.store_{}", std::process::id()));
		let _ = std::fs::remove_dir_all(&path);
		crate::store::save_workspace(&path, &workspace).expect("seed should save");
		let mut store = FileStore::open(&path).expect("open should work");
		std::fs::remove_file(&path).expect("seed file should be removed");
		std::fs::create_dir_all(&path).expect("dir should take its place");

		let started = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
		let mut app = App::new(Granularity::Month);
		app.session.start(started);
		let elapsed_ms = app
			.session
			.save(started + chrono::Duration::milliseconds(1_500))
			.expect("elapsed time should be saveable");
		app.open(build_time_owner_select(store.workspace(), "owner", elapsed_ms));

		handle_select_key(&mut app, KeyCode::Enter, &mut store, "owner");
		assert!(matches!(
			&app.mode,
			InputMode::Select(SelectState {
				kind: SelectKind::TimeOwner { elapsed_ms: 1_500 },
				..
			})
		));
		assert!(app.status.starts_with("error:"));
		assert_eq!(app.session.watch().mode(), StopwatchMode::Paused);
		assert_eq!(app.session.watch().elapsed_ms(Utc::now()), 1_500);
		assert!(store.workspace().time_records.is_empty());

		std::fs::remove_dir_all(&path).expect("dir should be removed");
		handle_select_key(&mut app, KeyCode::Enter, &mut store, "owner");
		assert!(matches!(app.mode, InputMode::Normal));
		assert_eq!(app.session.watch().mode(), StopwatchMode::Idle);
		assert_eq!(app.session.watch().elapsed_ms(Utc::now()), 0);
		assert_eq!(store.workspace().time_spent(&TimeOwner::Task(lab)), 1_500);
		let _ = std::fs::remove_file(path);
	}

	#[test]
	fn fit_pads_and_truncates_to_the_column() {
		assert_eq!(fit("abc", 6), "abc   ");
		assert_eq!(fit("abcdefgh", 6), "abcd~ ");
		assert_eq!(fit("", 3), "   ");
	}
}
