//! TUI rendering for the live dashboard.

pub mod log;
pub mod overview;
pub mod timeline;

use chrono::{Local, Utc};
use mctl_core::{
  log::{GoNoGo, MilestoneStatus, Priority},
  session::MissionStatus,
};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Tab};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let banner = app.banner().map(|o| o.headline().to_owned());

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1),                                 // header
      Constraint::Length(1),                                 // tabs
      Constraint::Length(if banner.is_some() { 1 } else { 0 }), // overlay banner
      Constraint::Min(0),                                    // body
      Constraint::Length(1),                                 // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_tabs(f, rows[1], app);
  if let Some(text) = banner {
    draw_banner(f, rows[2], &text);
  }
  match app.tab {
    Tab::Overview => overview::draw(f, rows[3], app),
    Tab::Timeline => timeline::draw(f, rows[3], app),
    Tab::Log => log::draw(f, rows[3], app),
  }
  draw_status(f, rows[4], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let mission = app
    .snapshot
    .session
    .as_ref()
    .map(|s| s.mission_name.as_str())
    .unwrap_or("no active session");

  let mut spans = vec![Span::styled(
    format!(" mctl  {mission}"),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  )];

  if let Some(countdown) = app.countdown(Utc::now()) {
    let text = if countdown.display_status.counts_down() {
      countdown.label()
    } else {
      countdown.display_status.to_string().to_uppercase()
    };
    spans.push(Span::styled(
      format!("  {text}"),
      status_style(countdown.display_status).add_modifier(Modifier::BOLD),
    ));
  }

  let clock = Span::styled(
    format!("{} ", Local::now().format("%Y-%m-%d %H:%M:%S")),
    Style::default().fg(Color::Gray),
  );

  let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
  let pad = (area.width as usize)
    .saturating_sub(used)
    .saturating_sub(clock.content.len());
  spans.push(Span::raw(" ".repeat(pad)));
  spans.push(clock);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &App) {
  let spans: Vec<Span> = Tab::ALL
    .iter()
    .enumerate()
    .map(|(i, tab)| {
      let style = if *tab == app.tab {
        Style::default()
          .fg(Color::Black)
          .bg(Color::Cyan)
          .add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(Color::DarkGray)
      };
      Span::styled(format!(" {} {} ", i + 1, tab.title()), style)
    })
    .collect();
  f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_banner(f: &mut Frame, area: Rect, text: &str) {
  f.render_widget(
    Paragraph::new(Line::from(Span::styled(
      format!(" ▲ {text} "),
      Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(Color::Yellow)),
    area,
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let hints = match app.tab {
    Tab::Overview => "Tab/1-3 switch view  q quit",
    Tab::Timeline | Tab::Log => "↑↓/jk scroll  g top  Tab/1-3 switch view  q quit",
  };

  let status = if app.status_msg.is_empty() {
    match app.snapshot.fetched_at {
      Some(at) => format!(
        "synced {}  {hints}",
        at.with_timezone(&Local).format("%H:%M:%S")
      ),
      None => format!("connecting…  {hints}"),
    }
  } else {
    app.status_msg.clone()
  };

  let mode_style = if app.snapshot.is_degraded() {
    Style::default().fg(Color::Black).bg(Color::Red)
  } else {
    Style::default().fg(Color::Black).bg(Color::Cyan)
  };

  let line = Line::from(vec![
    Span::styled(
      format!(" {} ", app.tab.title().to_uppercase()),
      mode_style.add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {status}"), Style::default().fg(Color::DarkGray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

// ── Shared styles ─────────────────────────────────────────────────────────────

pub(crate) fn status_style(status: MissionStatus) -> Style {
  let color = match status {
    MissionStatus::Live => Color::Green,
    MissionStatus::Scheduled | MissionStatus::Upcoming => Color::Cyan,
    MissionStatus::Completed => Color::Blue,
    MissionStatus::Delayed => Color::Yellow,
    MissionStatus::Failed | MissionStatus::Cancelled => Color::Red,
  };
  Style::default().fg(color)
}

pub(crate) fn go_style(go: GoNoGo) -> Style {
  let color = match go {
    GoNoGo::Go => Color::Green,
    GoNoGo::NoGo => Color::Red,
    GoNoGo::Conditional => Color::Yellow,
  };
  Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub(crate) fn milestone_style(status: MilestoneStatus) -> (&'static str, Style) {
  match status {
    MilestoneStatus::Upcoming => ("○", Style::default().fg(Color::DarkGray)),
    MilestoneStatus::Current => ("◉", Style::default().fg(Color::Yellow)),
    MilestoneStatus::Completed => ("●", Style::default().fg(Color::Green)),
    MilestoneStatus::Failed => ("✕", Style::default().fg(Color::Red)),
  }
}

pub(crate) fn priority_style(priority: Priority) -> Style {
  match priority {
    Priority::Low => Style::default().fg(Color::DarkGray),
    Priority::Normal => Style::default(),
    Priority::High => Style::default().fg(Color::Yellow),
    Priority::Critical => Style::default()
      .fg(Color::Red)
      .add_modifier(Modifier::BOLD),
  }
}

/// Labelled value line used by the detail panes.
pub(crate) fn field<'a>(label: &'a str, value: impl Into<String>) -> Line<'a> {
  Line::from(vec![
    Span::styled(format!("{label:<12}"), Style::default().fg(Color::DarkGray)),
    Span::raw(value.into()),
  ])
}
