use crate::ui::app::AppMode;
use integrations_core::theme::{Element, Theme};
use ratatui::{
    prelude::{Alignment, Frame, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub fn render_footer(frame: &mut Frame, area: Rect, theme: &Theme, mode: AppMode, notice: Option<&str>) {
    let footer_block = Block::default()
        .borders(Borders::ALL)
        .style(theme.ratatui_style(Element::Active));

    let inner_area = footer_block.inner(area);

    let content = match (notice, mode) {
        (Some(message), _) => Line::from(vec![
            Span::styled("⚠️  ", theme.ratatui_style(Element::Error)),
            Span::styled(message.to_string(), theme.ratatui_style(Element::Error)),
            Span::styled("  [D]ismiss", theme.ratatui_style(Element::Inactive)),
        ])
        .alignment(Alignment::Center),
        (None, AppMode::Editing) => Line::from("[ENTER] Save | [ESC] Cancel").alignment(Alignment::Center),
        (None, AppMode::Normal) => Line::from(vec![
            Span::raw("[TAB]"),
            Span::styled(" Next", theme.ratatui_style(Element::Inactive)),
            Span::raw(" | "),
            Span::raw("[←→]"),
            Span::styled(" Integration", theme.ratatui_style(Element::Inactive)),
            Span::raw(" | "),
            Span::raw("[L]"),
            Span::styled("oad", theme.ratatui_style(Element::Inactive)),
            Span::raw(" | "),
            Span::raw("[C]"),
            Span::styled("lear", theme.ratatui_style(Element::Inactive)),
            Span::raw(" | "),
            Span::raw("[T]"),
            Span::styled("heme", theme.ratatui_style(Element::Inactive)),
            Span::raw(" | "),
            Span::raw("[Q]"),
            Span::styled("uit", theme.ratatui_style(Element::Inactive)),
        ])
        .alignment(Alignment::Center),
    };

    let footer_paragraph = Paragraph::new(content).style(theme.ratatui_style(Element::Text));

    frame.render_widget(footer_block, area);
    frame.render_widget(footer_paragraph, inner_area);
}
