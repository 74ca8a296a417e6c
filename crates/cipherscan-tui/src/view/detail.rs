use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use cipherscan_core::format;

use crate::app::App;
use crate::model::file::FilePhase;
use crate::theme::Theme;
use crate::view::{size_kb, spinner_char};

/// Render the File Detail screen.
pub fn render(f: &mut Frame, app: &App, file_index: usize) {
    let theme = &app.theme;
    let area = f.area();
    let file = &app.files[file_index];

    let chunks = Layout::vertical([
        Constraint::Length(1), // breadcrumb
        Constraint::Min(5),   // scrollable content
        Constraint::Length(1), // footer
    ])
    .split(area);

    // --- Breadcrumb ---
    let breadcrumb = Line::from(vec![
        Span::styled(" CIPHERSCAN ", theme.header_style()),
        Span::styled(" > ", Style::default().fg(theme.dim)),
        Span::styled(
            &file.filename,
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(breadcrumb), chunks[0]);

    // --- Content ---
    let mut lines: Vec<Line> = Vec::new();

    section_header(&mut lines, "FILE", theme);
    labeled_line(&mut lines, "Name", &file.filename, theme);
    labeled_line(&mut lines, "Size", &size_kb(file.size), theme);
    lines.push(Line::from(vec![
        Span::styled("  Status:        ", Style::default().fg(theme.dim)),
        Span::styled(
            match file.phase {
                FilePhase::Analyzing => format!("{} Analyzing...", spinner_char(app.tick)),
                _ => file.phase.label().to_string(),
            },
            Style::default()
                .fg(theme.file_phase_color(&file.phase))
                .add_modifier(Modifier::BOLD),
        ),
    ]));

    if let Some(error) = &file.error {
        lines.push(Line::from(""));
        section_header(&mut lines, "ERROR", theme);
        lines.push(Line::from(Span::styled(
            format!("  {error}"),
            Style::default().fg(theme.failed),
        )));
    }

    if let Some(result) = &file.result {
        lines.push(Line::from(""));
        section_header(&mut lines, "PREDICTION", theme);
        labeled_line(&mut lines, "Algorithm", &result.algorithm, theme);
        labeled_line(
            &mut lines,
            "Confidence",
            &format!(
                "{} ({})",
                format::confidence(result.confidence),
                format::percent(result.confidence)
            ),
            theme,
        );

        if !result.ciphertext_preview.is_empty() {
            lines.push(Line::from(""));
            section_header(&mut lines, "CIPHERTEXT PREVIEW", theme);
            for preview_line in result.ciphertext_preview.lines() {
                lines.push(Line::from(Span::styled(
                    format!("  {preview_line}"),
                    Style::default().fg(theme.dim),
                )));
            }
        }
    } else if file.error.is_none() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Result pending...",
            Style::default().fg(theme.dim),
        )));
    }

    let content = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style()),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));

    f.render_widget(content, chunks[1]);

    // --- Footer ---
    render_footer(f, chunks[2], theme);
}

fn section_header<'a>(lines: &mut Vec<Line<'a>>, title: &'a str, theme: &Theme) {
    lines.push(Line::from(Span::styled(
        format!("  {title}"),
        Style::default()
            .fg(theme.active)
            .add_modifier(Modifier::BOLD),
    )));
}

fn labeled_line<'a>(lines: &mut Vec<Line<'a>>, label: &'a str, value: &str, theme: &Theme) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {label:<16}"), Style::default().fg(theme.dim)),
        Span::styled(value.to_string(), Style::default().fg(theme.text)),
    ]));
}

fn render_footer(f: &mut Frame, area: Rect, theme: &Theme) {
    let footer = Line::from(Span::styled(
        " j/k:scroll  r:re-run  Esc:back  ?:help  q:quit",
        theme.footer_style(),
    ));
    f.render_widget(Paragraph::new(footer), area);
}
