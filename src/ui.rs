use brewtick::{
    metrics::format_mmss,
    timer::{Phase, SessionSnapshot, StepStatus, StepView},
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const ACCENT: Color = Color::Rgb(212, 163, 115);

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.snapshot();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Min(1),    // body
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            "BREW TIMER",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);

        render_recipe(self, body[0], buf);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7), // timer
                Constraint::Length(4), // up next
                Constraint::Min(3),    // schedule
            ])
            .split(body[1]);

        render_timer(self, &snapshot, right[0], buf);
        render_up_next(&snapshot, right[1], buf);
        render_schedule(&snapshot, right[2], buf);

        let toggle = if snapshot.phase.is_active() {
            "(space) reset"
        } else {
            "(space) start / (←→) recipe"
        };
        let link = if self.recipe().url().is_some() && Browser::is_available() {
            " / (o)pen link"
        } else {
            ""
        };
        Paragraph::new(Span::styled(
            format!("{toggle}{link} / (esc)ape"),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[2], buf);
    }
}

fn render_recipe(app: &App, area: Rect, buf: &mut Buffer) {
    let recipe = app.recipe();
    let label = Style::default().add_modifier(Modifier::BOLD);
    let value = Style::default().fg(ACCENT);

    let metric = |name: &'static str, v: String| {
        Line::from(vec![
            Span::styled(format!("{name:<12}"), label),
            Span::styled(v, value),
        ])
    };

    let mut lines = vec![
        Line::from(vec![
            Span::raw("◀ "),
            Span::styled(recipe.name.clone(), label.fg(ACCENT)),
            Span::raw(" ▶"),
            Span::styled(
                format!("  ({}/{})", app.selected + 1, app.book.len()),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]),
        Line::raw(""),
        metric("TOTAL WATER", app.metrics.total_water_label()),
        metric("TOTAL TIME", app.metrics.total_time_label()),
        metric("TEMP", or_dash(&recipe.temp).to_string()),
        metric("BEANS", or_dash(&recipe.beans.to_string()).to_string()),
        metric("BREW RATIO", app.metrics.ratio_label()),
        metric("GRIND", or_dash(&recipe.grind).to_string()),
    ];

    if let Some(note) = recipe.note() {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!("💡 {note}"),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        ));
    }
    if let Some(url) = recipe.url() {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("REFERENCE LINK ", value),
            Span::styled(url.to_string(), Style::default().add_modifier(Modifier::UNDERLINED)),
        ]));
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Recipe"))
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_timer(app: &App, snapshot: &SessionSnapshot, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title("Timer");
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1), // action
            Constraint::Length(1), // seconds
            Constraint::Length(1), // gauge
            Constraint::Length(1), // water
        ])
        .split(inner);

    let dim = Style::default().fg(Color::DarkGray);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let centered = |text: String, style: Style, area: Rect, buf: &mut Buffer| {
        Paragraph::new(Span::styled(text, style))
            .alignment(Alignment::Center)
            .render(area, buf);
    };

    match snapshot.phase {
        Phase::Idle => {
            centered("00".into(), dim.add_modifier(Modifier::BOLD), rows[2], buf);
            centered("Ready to brew".into(), Style::default().fg(Color::Cyan), rows[4], buf);
        }
        Phase::Preparing => {
            centered("READY...".into(), dim, rows[0], buf);
            centered("GET SET".into(), bold.fg(ACCENT), rows[1], buf);
            centered(format!("{:02}", snapshot.seconds_left), bold.fg(ACCENT), rows[2], buf);
            progress(1.0, rows[3], buf);
        }
        Phase::Running { .. } => {
            let (action, water) = snapshot
                .current_step()
                .map(|v| (v.step.action.clone(), v.step.water))
                .unwrap_or_default();
            centered(
                format!("TOTAL {}", format_mmss(snapshot.elapsed_secs)),
                dim,
                rows[0],
                buf,
            );
            centered(action, bold.fg(ACCENT), rows[1], buf);
            centered(format!("{:02}", snapshot.seconds_left), bold, rows[2], buf);
            progress(snapshot.step_progress, rows[3], buf);
            Paragraph::new(Line::from(vec![
                Span::styled(format!("{}g", snapshot.previous_water), dim),
                Span::styled(" → ", Style::default().fg(ACCENT)),
                Span::styled(format!("{}g", snapshot.cumulative_water), bold.fg(ACCENT)),
                Span::styled(format!(" (+{water}g)"), Style::default().fg(Color::Gray)),
            ]))
            .alignment(Alignment::Center)
            .render(rows[4], buf);
        }
        Phase::Finished => {
            let msg = app
                .finish_message
                .clone()
                .unwrap_or_else(|| "BREW FINISHED!".to_string());
            centered(msg, bold.fg(Color::Green), rows[2], buf);
            centered(
                format!(
                    "{}g in {}",
                    snapshot.cumulative_water,
                    format_mmss(snapshot.elapsed_secs)
                ),
                dim,
                rows[4],
                buf,
            );
        }
    }
}

fn progress(ratio: f64, area: Rect, buf: &mut Buffer) {
    Gauge::default()
        .gauge_style(Style::default().fg(ACCENT).bg(Color::Black))
        .ratio(ratio.clamp(0.0, 1.0))
        .label("")
        .render(area, buf);
}

fn render_up_next(snapshot: &SessionSnapshot, area: Rect, buf: &mut Buffer) {
    let label = Style::default().fg(Color::Gray);
    let action = Style::default().fg(ACCENT).add_modifier(Modifier::BOLD);

    let lines = match snapshot.phase {
        Phase::Preparing => {
            let first = snapshot
                .upcoming_step()
                .map(|v| format!("First: {}", v.step.action))
                .unwrap_or_else(|| "No steps".to_string());
            vec![
                Line::styled("PREPARING...", label),
                Line::styled("READY?", action),
                Line::styled(first, Style::default().add_modifier(Modifier::BOLD)),
            ]
        }
        Phase::Running { .. } => match snapshot.upcoming_step() {
            Some(next) => vec![
                Line::styled("UP NEXT", label),
                Line::styled(next.step.action.clone(), action),
                Line::styled(
                    format!("{}g / {}s", next.step.water, next.step.duration),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ],
            None => vec![Line::styled("UP NEXT", label), Line::styled("FINISH", action)],
        },
        Phase::Idle | Phase::Finished => return,
    };

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(ACCENT)))
        .alignment(Alignment::Center)
        .render(area, buf);
}

/// One schedule row: icon, number and action on the left, duration and scale target on the right
fn schedule_line(view: &StepView, width: u16) -> Line<'static> {
    let (icon, style) = match view.status {
        StepStatus::Done => ("✅", Style::default().fg(Color::DarkGray)),
        StepStatus::Active => (
            "🟧",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        StepStatus::Pending => ("○", Style::default().fg(Color::Gray)),
    };
    let left = format!("{icon} {}. {}", view.index + 1, view.step.action);
    let right = format!("{}s | {}g", view.step.duration, view.cumulative_water);
    let pad = (width as usize).saturating_sub(left.width() + right.width()).max(1);
    Line::styled(format!("{left}{}{right}", " ".repeat(pad)), style)
}

fn render_schedule(snapshot: &SessionSnapshot, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title("Schedule Detail");
    let width = block.inner(area).width;
    let lines: Vec<Line> = if snapshot.steps.is_empty() {
        vec![Line::styled(
            "No steps",
            Style::default().add_modifier(Modifier::DIM),
        )]
    } else {
        snapshot
            .steps
            .iter()
            .map(|v| schedule_line(v, width))
            .collect()
    };
    Paragraph::new(lines).block(block).render(area, buf);
}
