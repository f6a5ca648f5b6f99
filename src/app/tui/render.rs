use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

use super::super::catalog::ItemKind;
use super::super::continuity::ContinuityStore;
use super::super::{Plan, RunOptions};

pub(super) fn draw_preview(
    frame: &mut Frame,
    playlist_name: &str,
    plan: &Plan,
    options: &RunOptions,
    roll: usize,
    table_state: &mut TableState,
    status: &str,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let muted = Style::default().fg(Color::Rgb(185, 195, 210));
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            truncate(playlist_name, 40),
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(format!("{} episodes", plan.items.len()), muted),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!(
                "{:.1} / {} min",
                plan.total_minutes, options.budget.max_total_duration
            ),
            muted,
        ),
        Span::styled("   ", Style::default()),
        Span::styled(format!("roll {roll}"), Style::default().fg(Color::Yellow)),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Preview"));
    frame.render_widget(header, chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(66), Constraint::Percentage(34)])
        .split(chunks[1]);

    let rows: Vec<Row> = plan
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            Row::new(vec![
                Cell::from((idx + 1).to_string()),
                Cell::from(item.kind.label()).style(kind_style(item.kind)),
                Cell::from(item.episode.show.clone()),
                Cell::from(item.episode.title.clone()),
                Cell::from(format!("{:.1}", item.minutes)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(12),
            Constraint::Percentage(30),
            Constraint::Percentage(50),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec!["#", "Kind", "Show", "Episode", "Min"]).style(
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(panel_block("Playlist"))
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(110, 170, 255))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, body_chunks[0], table_state);

    let arcs = continuity_lines(&plan.store);
    let arcs_text = if arcs.is_empty() {
        "No arcs in progress.".to_string()
    } else {
        arcs.join("\n")
    };
    let continuity = Paragraph::new(arcs_text)
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .wrap(Wrap { trim: true })
        .block(panel_block("Continuity after commit"));
    frame.render_widget(continuity, body_chunks[1]);

    let controls = Paragraph::new(Line::from(vec![Span::styled(
        "↑/↓ move  r reroll  c/Enter commit  q quit",
        muted,
    )]))
    .alignment(Alignment::Center)
    .block(panel_block("Controls"));
    frame.render_widget(controls, chunks[2]);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);
}

/// One line per arc in progress: `Show / Arc: part n of m`.
pub(crate) fn continuity_lines(store: &ContinuityStore) -> Vec<String> {
    store
        .arcs()
        .map(|(show, base, state)| {
            format!(
                "{show} / {base}: part {} of {}",
                state.next_part, state.total_parts
            )
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max.saturating_sub(3)).collect::<String>() + "..."
    } else {
        s.to_string()
    }
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn kind_style(kind: ItemKind) -> Style {
    match kind {
        ItemKind::Continuity => Style::default().fg(Color::Rgb(205, 165, 255)),
        ItemKind::LiveAction => Style::default().fg(Color::Yellow),
        ItemKind::Cartoon => Style::default().fg(Color::Rgb(130, 190, 255)),
    }
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}
