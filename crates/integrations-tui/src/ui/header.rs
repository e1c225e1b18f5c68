use integrations_core::{
    store::IntegrationStore,
    theme::{Element, Theme},
};
use ratatui::{
    prelude::{Alignment, Frame, Rect},
    text::{Line, Span},
    widgets::{block::Title, Block, Borders, Paragraph},
};

pub fn render_header(frame: &mut Frame, area: Rect, theme: &Theme, store: &IntegrationStore, base_url: &str) {
    let title = Title::from(" Integrations v0.1.0 ").alignment(Alignment::Left);

    let (status_text, status_element) = match (store.current_type(), store.has_credentials()) {
        (None, _) => ("No integration selected".to_string(), Element::Inactive),
        (Some(name), false) => (format!("{} · not connected", name), Element::Warning),
        (Some(name), true) => (format!("{} · connected", name), Element::Accent),
    };

    let line = Line::from(vec![
        Span::styled(status_text, theme.ratatui_style(status_element)),
        Span::styled(format!("  ({})", base_url), theme.ratatui_style(Element::Inactive)),
    ]);

    let header_paragraph = Paragraph::new(line).alignment(Alignment::Right).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .style(theme.ratatui_style(Element::Title)),
    );

    frame.render_widget(header_paragraph, area);
}
