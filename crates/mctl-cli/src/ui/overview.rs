//! Overview pane: session, countdown, weather, video and objectives.

use chrono::{Local, Utc};
use mctl_core::resolve::VideoSource;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use super::{field, go_style, status_style};
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
    .split(area);

  let right = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(9),
      Constraint::Length(6),
      Constraint::Min(0),
    ])
    .split(cols[1]);

  draw_session(f, cols[0], app);
  draw_weather(f, right[0], app);
  draw_video(f, right[1], app);
  draw_objectives(f, right[2], app);
}

fn pane(title: &str) -> Block<'_> {
  Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

fn placeholder(text: &str) -> Paragraph<'_> {
  Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

fn or_dash(s: &str) -> String {
  if s.trim().is_empty() { "—".to_owned() } else { s.to_owned() }
}

fn draw_session(f: &mut Frame, area: Rect, app: &App) {
  let block = pane("Mission");
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(session) = &app.snapshot.session else {
    f.render_widget(placeholder("Waiting for an operator to select a mission."), inner);
    return;
  };

  let mut lines = vec![
    Line::from(Span::styled(
      session.mission_name.clone(),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::default(),
    field("Agency", or_dash(&session.agency)),
    field("Vehicle", or_dash(&session.vehicle)),
    field("Payload", or_dash(&session.payload)),
    field("Destination", or_dash(&session.destination)),
    field("Launch site", or_dash(&session.launch_site)),
    field(
      "Launch",
      session
        .launch_date
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string(),
    ),
    Line::from(vec![
      Span::styled(format!("{:<12}", "Status"), Style::default().fg(Color::DarkGray)),
      Span::styled(session.status.to_string(), status_style(session.status)),
    ]),
  ];

  if let Some(countdown) = app.countdown(Utc::now()) {
    lines.push(Line::default());
    let text = if countdown.display_status.counts_down() {
      countdown.label()
    } else {
      countdown.display_status.to_string().to_uppercase()
    };
    lines.push(Line::from(Span::styled(
      text,
      status_style(countdown.display_status).add_modifier(Modifier::BOLD),
    )));
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_weather(f: &mut Frame, area: Rect, app: &App) {
  let block = pane("Weather");
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(w) = &app.snapshot.weather else {
    f.render_widget(placeholder("No weather reported."), inner);
    return;
  };

  let lines = vec![
    Line::from(Span::styled(w.go_no_go.to_string(), go_style(w.go_no_go))),
    field("Conditions", or_dash(&w.conditions)),
    field("Temp", format!("{:.1} °C", w.temperature)),
    field("Wind", format!("{:.1} km/h {}", w.wind_speed, w.wind_direction)),
    field("Visibility", format!("{:.1} km", w.visibility)),
    field("Humidity", format!("{:.0}%", w.humidity)),
    field(
      "Recorded",
      format!(
        "{} ({})",
        w.recorded_at.with_timezone(&Local).format("%H:%M"),
        or_dash(&w.source)
      ),
    ),
  ];
  f.render_widget(Paragraph::new(lines), inner);
}

fn draw_video(f: &mut Frame, area: Rect, app: &App) {
  let block = pane("Video");
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(video) = &app.snapshot.video else {
    f.render_widget(placeholder("Resolving…"), inner);
    return;
  };

  let source = match video.source {
    VideoSource::Override => "operator override",
    VideoSource::IssBroadcast => "ISS broadcast",
    VideoSource::Scheduled => "launch feed",
    VideoSource::DefaultFeed => "ISS default feed",
    VideoSource::None => "none",
  };

  let mut lines = vec![
    field("Source", source),
    field("URL", video.url.clone().unwrap_or_else(|| "—".into())),
  ];
  if let Some(launch) = &video.launch {
    lines.push(field(
      "Launch",
      format!(
        "{} @ {}",
        launch.launch_name,
        launch.launch_date.with_timezone(&Local).format("%H:%M")
      ),
    ));
  }
  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn draw_objectives(f: &mut Frame, area: Rect, app: &App) {
  let block = pane("Objectives");
  let inner = block.inner(area);
  f.render_widget(block, area);

  if app.snapshot.objectives.is_empty() {
    f.render_widget(placeholder("No objectives."), inner);
    return;
  }

  let lines: Vec<Line> = app
    .snapshot
    .objectives
    .iter()
    .map(|o| {
      Line::from(vec![
        Span::styled(format!("{:>2}. ", o.sort_order), Style::default().fg(Color::DarkGray)),
        Span::raw(o.objective.clone()),
      ])
    })
    .collect();
  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}
