use crate::app::{App, AppMode, Button};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

/// Where the clickable parts ended up on the last frame.
#[derive(Default, Clone, Debug)]
pub struct UiLayout {
    pub close: Rect,
    pub buttons: Vec<(Button, Rect)>,
}

pub fn draw(f: &mut Frame, app: &App) -> UiLayout {
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(app.config.theme.background)),
        area,
    );
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let close = draw_title_bar(f, chunks[0], app);
    draw_heading(f, chunks[1], app);
    draw_time(f, chunks[2], app);
    draw_cycle(f, chunks[3], app);
    let buttons = draw_buttons(f, chunks[4], app);
    draw_status_bar(f, chunks[6], app);

    if app.mode == AppMode::ShowHelp {
        draw_help_overlay(f, app);
    }
    UiLayout { close, buttons }
}

fn draw_title_bar(f: &mut Frame, area: Rect, app: &App) -> Rect {
    let theme = &app.config.theme;
    f.render_widget(
        Paragraph::new(Span::styled(
            " Pomodoro Timer",
            Style::default().fg(theme.foreground),
        ))
        .style(Style::default().bg(theme.title_bar)),
        area,
    );

    let width = (app.config.icons.close.chars().count() as u16 + 2).min(area.width);
    let close = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y,
        width,
        height: 1,
    };
    f.render_widget(
        Paragraph::new(format!(" {} ", app.config.icons.close))
            .style(Style::default().bg(theme.close).fg(theme.foreground)),
        close,
    );
    close
}

fn draw_heading(f: &mut Frame, area: Rect, app: &App) {
    f.render_widget(
        Paragraph::new("Pomodoro Timer")
            .style(
                Style::default()
                    .fg(app.config.theme.foreground)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center),
        second_row(area),
    );
}

fn draw_time(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    let status = app.status();
    let state_icon = if status.paused {
        &icons.paused
    } else if status.running {
        &icons.running
    } else {
        &icons.stopped
    };
    let color = if app.display.time_text.ends_with("Break") {
        theme.rest
    } else {
        theme.work
    };

    let block = Block::default()
        .title(Span::styled(
            format!(" {} {} ", state_icon, status.phase.label()),
            Style::default().fg(theme.foreground),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.title_bar));
    let boxed = centered_rect(40, 100, area);
    let inner = block.inner(boxed);
    f.render_widget(block, boxed);
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    f.render_widget(
        Paragraph::new(app.display.time_text.as_str())
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        v_chunks[1],
    );
}

fn draw_cycle(f: &mut Frame, area: Rect, app: &App) {
    f.render_widget(
        Paragraph::new(app.display.cycle_text.as_str())
            .style(Style::default().fg(app.config.theme.foreground))
            .alignment(Alignment::Center),
        second_row(area),
    );
}

fn draw_buttons(f: &mut Frame, area: Rect, app: &App) -> Vec<(Button, Rect)> {
    let theme = &app.config.theme;
    let mut constraints = vec![Constraint::Min(0)];
    for _ in Button::ALL {
        constraints.push(Constraint::Length(12));
        constraints.push(Constraint::Length(2));
    }
    constraints.pop();
    constraints.push(Constraint::Min(0));
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    let mut placed = Vec::with_capacity(Button::ALL.len());
    for (i, button) in Button::ALL.into_iter().enumerate() {
        let rect = slots[1 + i * 2];
        let enabled = app.is_enabled(button);
        let focused = app.focused == button;

        let text_style = if enabled {
            Style::default().fg(theme.foreground)
        } else {
            Style::default().fg(theme.disabled)
        };
        let border_style = if focused {
            Style::default().fg(theme.focus).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.black)
        };
        let label = if focused {
            format!("{} {}", app.config.icons.focus, button.label())
        } else {
            button.label().to_string()
        };

        f.render_widget(
            Paragraph::new(label)
                .style(text_style)
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Plain)
                        .border_style(border_style)
                        .style(Style::default().bg(theme.button)),
                ),
            rect,
        );
        placed.push((button, rect));
    }
    placed
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let sep = &app.config.icons.separator;
    let (mode_text, mode_color) = match app.mode {
        AppMode::Normal => ("NORMAL", theme.rest),
        AppMode::ShowHelp => ("HELP", theme.focus),
    };
    let help = if app.mode == AppMode::Normal {
        format!(
            "s:start {sep} p:pause {sep} c:resume {sep} r:reset {sep} ←/→:focus {sep} enter:press {sep} ?:help {sep} q:quit"
        )
    } else {
        "?/esc:close help".to_string()
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} ", mode_text),
                Style::default()
                    .bg(mode_color)
                    .fg(theme.black)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::raw(help),
        ]))
        .block(Block::default().style(Style::default().bg(theme.black).fg(theme.disabled))),
        area,
    );
}

fn draw_help_overlay(f: &mut Frame, app: &App) {
    let theme = &app.config.theme;
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);

    let shortcuts = [
        ("Timer", vec![
            ("s", "Start a work interval"),
            ("p", "Pause"),
            ("c", "Resume"),
            ("r", "Reset"),
        ]),
        ("Window", vec![
            ("←/→ Tab", "Move button focus"),
            ("Enter/Space", "Press focused button"),
            ("Mouse", "Click buttons or the close box"),
            ("q/Esc", "Quit"),
        ]),
    ];

    let mut items = Vec::new();
    for (section, keys) in shortcuts {
        items.push(ListItem::new(Line::from(Span::styled(
            section,
            Style::default().fg(theme.focus).add_modifier(Modifier::BOLD),
        ))));
        for (key, action) in keys {
            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!("  {:<12}", key), Style::default().fg(theme.rest)),
                Span::raw(action),
            ])));
        }
    }

    f.render_widget(
        List::new(items).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(theme.focus))
                .style(Style::default().bg(theme.black).fg(theme.foreground)),
        ),
        area,
    );
}

fn second_row(area: Rect) -> Rect {
    Rect {
        y: area.y.saturating_add(1),
        height: 1,
        ..area
    }
    .intersection(area)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
