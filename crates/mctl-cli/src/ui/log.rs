//! Mission update log pane, newest first.

use chrono::Local;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState},
};

use super::priority_style;
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let updates = &app.snapshot.updates;

  let block = Block::default()
    .title(format!(" Updates ({}) ", updates.len()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  if updates.is_empty() {
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      ratatui::widgets::Paragraph::new(Span::styled(
        "No updates yet.",
        Style::default().fg(Color::DarkGray),
      )),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = updates
    .iter()
    .map(|u| {
      let style = priority_style(u.priority);
      let mut lines = vec![Line::from(vec![
        Span::styled(
          u.created_at.with_timezone(&Local).format("%H:%M:%S ").to_string(),
          Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
          format!("[{}] ", u.update_type),
          Style::default().fg(Color::Cyan),
        ),
        Span::styled(u.title.clone(), style.add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", u.author), Style::default().fg(Color::DarkGray)),
      ])];
      if !u.content.is_empty() {
        lines.push(Line::from(Span::styled(format!("         {}", u.content), style)));
      }
      ListItem::new(lines)
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.log_scroll));

  let list = List::new(items)
    .block(block)
    .highlight_style(Style::default().bg(Color::Black));
  f.render_stateful_widget(list, area, &mut state);
}
