use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use cipherscan_core::format;

use crate::app::App;
use crate::model::file::FilePhase;
use crate::theme::Theme;
use crate::view::{size_kb, spinner_char, truncate};

/// Render the Queue screen.
pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Min(5),   // table
        Constraint::Length(1), // footer / stats
    ])
    .split(area);

    render_header(f, chunks[0], app);
    render_table(f, chunks[1], app);
    render_footer(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let mut spans = vec![
        Span::styled(" CIPHERSCAN ", theme.header_style()),
        Span::styled(
            " Upload Queue",
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(loading) = &app.loading {
        spans.push(Span::styled(
            format!("  {} analyzing {}", spinner_char(app.tick), loading),
            Style::default().fg(theme.spinner),
        ));
    } else if app.batch_complete {
        spans.push(Span::styled(
            "  batch complete",
            Style::default().fg(theme.dim),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let wide = area.width >= 90;

    // Build header row
    let header_cells = if wide {
        vec!["#", "File", "Size", "Algorithm", "Conf", "Status"]
    } else {
        vec!["#", "File", "Algorithm", "Status"]
    };
    let header = Row::new(header_cells.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))
    }))
    .height(1);

    // Use the pre-computed sorted indices
    let indices = &app.queue_sorted;

    // Build data rows
    let rows: Vec<Row> = indices
        .iter()
        .enumerate()
        .map(|(display_idx, &file_idx)| {
            let file = &app.files[file_idx];
            let num = format!("{}", display_idx + 1);
            let name = truncate(&file.filename, (area.width as usize).saturating_sub(42));

            let phase_style = Style::default().fg(theme.file_phase_color(&file.phase));

            let status_text = match &file.phase {
                FilePhase::Analyzing => {
                    format!("{} {}", spinner_char(app.tick), file.phase.label())
                }
                _ => file.phase.label().to_string(),
            };

            let conf = if file.result.is_some() {
                format::percent(file.confidence())
            } else {
                "—".to_string()
            };

            if wide {
                Row::new(vec![
                    Cell::from(num),
                    Cell::from(name),
                    Cell::from(size_kb(file.size)),
                    Cell::from(file.algorithm_label().to_string())
                        .style(Style::default().fg(theme.text)),
                    Cell::from(conf).style(Style::default().fg(theme.done)),
                    Cell::from(status_text).style(phase_style),
                ])
            } else {
                Row::new(vec![
                    Cell::from(num),
                    Cell::from(name),
                    Cell::from(file.algorithm_label().to_string()),
                    Cell::from(status_text).style(phase_style),
                ])
            }
        })
        .collect();

    let widths = if wide {
        vec![
            Constraint::Length(4),
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(7),
            Constraint::Length(14),
        ]
    } else {
        vec![
            Constraint::Length(4),
            Constraint::Min(15),
            Constraint::Length(14),
            Constraint::Length(14),
        ]
    };

    let table = Table::new(rows, &widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .title(format!(" Sort: {} (s) ", app.sort_order.label())),
        )
        .row_highlight_style(theme.highlight_style());

    let mut state = TableState::default();
    state.select(Some(app.queue_cursor));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    // A failure notice displaces the stats line until the next action
    if let Some(notice) = &app.notice {
        let line = Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(theme.failed).add_modifier(Modifier::BOLD),
        ));
        f.render_widget(Paragraph::new(line), area);
        return;
    }

    let total = app.files.len();
    let done = app.files.iter().filter(|f| f.phase.is_terminal()).count();

    let footer = Line::from(vec![
        Span::styled(
            format!(" {done}/{total} files "),
            Style::default().fg(theme.text),
        ),
        Span::styled(
            format!("OK:{} ", app.analyzed_count()),
            Style::default().fg(theme.done),
        ),
        Span::styled(
            format!("ERR:{} ", app.failed_count()),
            Style::default().fg(theme.failed),
        ),
        Span::styled(
            " | j/k:nav  Enter:details  r:re-run  a:analyze all  s:sort  ?:help  q:quit",
            theme.footer_style(),
        ),
    ]);

    f.render_widget(Paragraph::new(footer), area);
}
