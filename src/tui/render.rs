use crate::overlay::surface::{DetailModal, FormField, Page, PageBody, SubmitForm, Surface};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, surface: &Surface, title: &str) {
    if !surface.container_visible {
        draw_idle(f, title);
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(f.area());

        draw_header(f, surface, title, chunks[0]);
        draw_page(f, surface.active_page(), chunks[1]);
        draw_navigation(f, surface, chunks[2]);
        draw_footer(f, chunks[3]);

        if let Some(modal) = &surface.modal {
            draw_modal(f, modal);
        }
        if surface.form.visible {
            draw_form(f, &surface.form);
        }
    }

    // A pending warning stays up until acknowledged, even over the idle screen.
    if let Some(warning) = &surface.warning {
        draw_warning(f, warning);
    }
}

fn draw_idle(f: &mut Frame, title: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Newspaper closed. Waiting for the host...",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[q]", Style::default().fg(Color::Yellow)),
            Span::raw("uit"),
        ]),
    ];
    let para = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(para, f.area());
}

fn draw_header(f: &mut Frame, surface: &Surface, title: &str, area: Rect) {
    let title_style = if surface.background_active {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(Span::styled(format!(" {} ", title), title_style))
        .borders(Borders::ALL);
    let para = Paragraph::new(Line::from(format!(" {}", surface.page_readout))).block(block);
    f.render_widget(para, area);
}

fn draw_page(f: &mut Frame, page: Option<&Page>, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let lines = match page.map(|p| &p.body) {
        None => vec![Line::from(Span::styled(
            "(no article on this page)",
            Style::default().fg(Color::DarkGray),
        ))],
        Some(PageBody::Placeholder(text)) => vec![
            Line::from(""),
            Line::from(Span::styled(
                text.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            )),
        ],
        Some(PageBody::Preview(card)) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    card.headline.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ];
            if let Some(image) = card.image.as_ref().filter(|i| !i.hidden) {
                lines.push(Line::from(Span::styled(
                    format!("[image] {}", image.url),
                    Style::default().fg(Color::Cyan),
                )));
            }
            lines.push(Line::from(card.excerpt.clone()));
            if let Some(author) = &card.author {
                lines.push(Line::from(Span::styled(
                    author.clone(),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
            if let Some(date) = &card.date {
                lines.push(Line::from(Span::styled(
                    date.clone(),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
                Span::raw(" read  "),
                Span::styled("[d]", Style::default().fg(Color::Red)),
                Span::raw("elete"),
            ]));
            lines
        }
    };
    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(para, area);
}

fn draw_navigation(f: &mut Frame, surface: &Surface, area: Rect) {
    let enabled = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let disabled = Style::default().fg(Color::DarkGray);
    let line = Line::from(vec![
        Span::styled(
            "  \u{25c0} Prev",
            if surface.prev_disabled { disabled } else { enabled },
        ),
        Span::raw(format!("   {}   ", surface.page_readout)),
        Span::styled(
            "Next \u{25b6}",
            if surface.next_disabled { disabled } else { enabled },
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled("  [\u{2190}/\u{2192}]", Style::default().fg(Color::Yellow)),
        Span::raw(" page  "),
        Span::styled("[n]", Style::default().fg(Color::Yellow)),
        Span::raw("ew article  "),
        Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
        Span::raw(" close  "),
        Span::styled("[q]", Style::default().fg(Color::Yellow)),
        Span::raw("uit  "),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_modal(f: &mut Frame, modal: &DetailModal) {
    let area = popup_area(f.area(), 80, 80);
    let mut lines = Vec::new();
    if let Some(image) = modal.image.as_ref().filter(|i| !i.hidden) {
        lines.push(Line::from(Span::styled(
            format!("[image] {}", image.url),
            Style::default().fg(Color::Cyan),
        )));
        lines.push(Line::from(""));
    }
    // Raw text: nothing in the article is interpreted as markup.
    lines.extend(modal.content.lines().map(|l| Line::from(l.to_string())));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
        Span::raw(" close"),
    ]));

    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", modal.headline),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn draw_form(f: &mut Frame, form: &SubmitForm) {
    let area = popup_area(f.area(), 70, 60);
    let field = |label: &str, value: &str, which: FormField| {
        let focused = form.focus == which;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let cursor = if focused { "_" } else { "" };
        vec![
            Line::from(Span::styled(label.to_string(), label_style)),
            Line::from(format!("  {}{}", value, cursor)),
            Line::from(""),
        ]
    };

    let lines = [
        field("Headline", &form.headline, FormField::Headline),
        field("Content", &form.content, FormField::Content),
        field("Image URL (optional)", &form.image_url, FormField::ImageUrl),
        vec![Line::from(vec![
            Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
            Span::raw(" submit  "),
            Span::styled("[Tab]", Style::default().fg(Color::Yellow)),
            Span::raw(" next field  "),
            Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
            Span::raw(" cancel"),
        ])],
    ]
    .concat();

    let block = Block::default()
        .title(" Submit News ")
        .borders(Borders::ALL);
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn draw_warning(f: &mut Frame, warning: &str) {
    let area = popup_area(f.area(), 60, 20);
    let block = Block::default()
        .title(Span::styled(
            " Warning ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let lines = vec![
        Line::from(warning.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "press any key",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}

/// Centered rect taking the given percentages of `area`.
fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::surface::{ImageSlot, PreviewCard, Visibility};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(surface: &Surface) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| draw(f, surface, "The Valentine Times")).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn open_surface(image_hidden: bool) -> Surface {
        Surface {
            container_visible: true,
            background_active: true,
            pages: vec![Page {
                body: PageBody::Preview(PreviewCard {
                    article_id: 1,
                    headline: "Train Robbed".into(),
                    excerpt: "Five riders...".into(),
                    image: Some(ImageSlot {
                        url: "https://example.com/a.png".into(),
                        hidden: image_hidden,
                    }),
                    author: Some("By: Eliza".into()),
                    date: None,
                }),
                visibility: Visibility::Active,
            }],
            page_readout: "Page 1 of 1".into(),
            ..Surface::default()
        }
    }

    #[test]
    fn test_idle_screen_when_hidden() {
        let text = render(&Surface::default());
        assert!(text.contains("Waiting for the host"));
        assert!(!text.contains("Page"));
    }

    #[test]
    fn test_active_card_rendered() {
        let text = render(&open_surface(false));
        assert!(text.contains("Train Robbed"));
        assert!(text.contains("Five riders..."));
        assert!(text.contains("By: Eliza"));
        assert!(text.contains("[image] https://example.com/a.png"));
        assert!(text.contains("Page 1 of 1"));
    }

    #[test]
    fn test_failed_image_not_rendered() {
        let text = render(&open_surface(true));
        assert!(!text.contains("[image]"));
    }

    #[test]
    fn test_warning_popup() {
        let mut surface = open_surface(false);
        surface.warning = Some("Bad link".into());
        let text = render(&surface);
        assert!(text.contains("Warning"));
        assert!(text.contains("Bad link"));
    }

    #[test]
    fn test_modal_shows_full_text() {
        let mut surface = open_surface(false);
        surface.modal = Some(DetailModal {
            article_id: 1,
            headline: "Train Robbed".into(),
            content: "<b>not bold</b>".into(),
            image: None,
        });
        let text = render(&surface);
        assert!(text.contains("<b>not bold</b>"));
    }
}
