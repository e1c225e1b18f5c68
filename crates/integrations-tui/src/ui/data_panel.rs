use crate::ui::app::Focus;
use chrono::{DateTime, Local};
use integrations_core::{
    theme::{Element, Theme},
    view::{DataView, TableView},
};
use ratatui::{
    prelude::{Alignment, Constraint, Direction, Frame, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use serde_json::Value;

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct DataPanelProps<'a> {
    pub theme: &'a Theme,
    pub loading: bool,
    pub data: Option<&'a Value>,
    pub loaded_at: Option<DateTime<Local>>,
    pub focus: Focus,
    pub scroll: u16,
    pub tick: u64,
}

pub fn render_data_panel(frame: &mut Frame, area: Rect, props: DataPanelProps) {
    let theme = props.theme;
    let title = match props.loaded_at {
        Some(at) if props.data.is_some() => format!(" Loaded Data · {} ", at.format("%H:%M:%S")),
        _ => " Loaded Data ".to_string(),
    };
    let block = Block::new()
        .title(title)
        .borders(Borders::ALL)
        .style(theme.ratatui_style(Element::Text));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Data
            Constraint::Length(1), // Buttons
        ])
        .split(inner_area);

    match DataView::from_state(props.loading, props.data) {
        DataView::Loading => {
            let spinner = SPINNER[(props.tick as usize) % SPINNER.len()];
            let loading = Paragraph::new(format!("{} Loading data...", spinner))
                .alignment(Alignment::Center)
                .style(theme.ratatui_style(Element::Info));
            frame.render_widget(loading, chunks[0]);
        }
        DataView::Table(table) => render_table(frame, chunks[0], theme, &table, props.scroll),
        DataView::Text(text) => {
            // Read-only field, styled like a disabled input.
            let field = Paragraph::new(text)
                .block(
                    Block::new()
                        .borders(Borders::ALL)
                        .style(theme.ratatui_style(Element::Inactive)),
                )
                .scroll((props.scroll, 0));
            frame.render_widget(field, chunks[0]);
        }
    }

    frame.render_widget(
        Paragraph::new(button_line(theme, props.focus, props.loading)).alignment(Alignment::Center),
        chunks[1],
    );
}

fn render_table(frame: &mut Frame, area: Rect, theme: &Theme, table: &TableView, scroll: u16) {
    let header = Row::new(table.columns.iter().map(|c| Cell::from(c.clone())))
        .style(theme.ratatui_style(Element::Title).add_modifier(Modifier::UNDERLINED));

    let rows = table
        .rows
        .iter()
        .skip(scroll as usize)
        .map(|row| Row::new(row.iter().map(|cell| Cell::from(cell.clone()))));

    let column_count = table.columns.len().max(1) as u32;
    let widths = vec![Constraint::Ratio(1, column_count); table.columns.len()];

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .style(theme.text_style());
    frame.render_widget(widget, area);
}

fn button_line<'a>(theme: &Theme, focus: Focus, loading: bool) -> Line<'a> {
    let button = |label: &'a str, target: Focus| {
        let style = if loading {
            theme.ratatui_style(Element::Inactive)
        } else if focus == target {
            theme.ratatui_style(Element::Active)
        } else {
            theme.ratatui_style(Element::Accent)
        };
        Span::styled(format!("[ {} ]", label), style)
    };

    Line::from(vec![
        button("Load Data", Focus::LoadData),
        Span::raw("   "),
        button("Clear Data", Focus::ClearData),
    ])
}
