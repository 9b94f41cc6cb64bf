//! Milestone timeline pane.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState},
};

use super::milestone_style;
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let milestones = &app.snapshot.milestones;
  let done = milestones
    .iter()
    .filter(|m| m.status == mctl_core::log::MilestoneStatus::Completed)
    .count();

  let block = Block::default()
    .title(format!(" Timeline ({done}/{}) ", milestones.len()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let items: Vec<ListItem> = milestones
    .iter()
    .map(|m| {
      let (glyph, style) = milestone_style(m.status);
      let mut lines = vec![Line::from(vec![
        Span::styled(format!("{glyph} "), style),
        Span::styled(
          format!("{:<10}", m.time_offset),
          Style::default().fg(Color::DarkGray),
        ),
        Span::styled(m.name.clone(), style.add_modifier(Modifier::BOLD)),
      ])];
      if !m.description.is_empty() {
        lines.push(Line::from(Span::styled(
          format!("             {}", m.description),
          Style::default().fg(Color::DarkGray),
        )));
      }
      ListItem::new(lines)
    })
    .collect();

  let mut state = ListState::default();
  if !milestones.is_empty() {
    state.select(Some(app.timeline_scroll));
  }

  let list = List::new(items)
    .block(block)
    .highlight_style(Style::default().bg(Color::Black));
  f.render_stateful_widget(list, area, &mut state);
}
