use crate::ui::app::{AppMode, Focus, SetupState};
use integrations_core::{
    integration::SetupKind,
    store::IntegrationStore,
    theme::{Element, Theme},
};
use ratatui::{
    prelude::{Constraint, Direction, Frame, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub struct SelectorProps<'a> {
    pub theme: &'a Theme,
    pub store: &'a IntegrationStore,
    pub setup_kind: Option<SetupKind>,
    pub setup: &'a SetupState,
    pub setup_input: &'a str,
    pub focus: Focus,
    pub mode: AppMode,
    pub edit_buffer: &'a str,
}

pub fn render_selector(frame: &mut Frame, area: Rect, props: SelectorProps) {
    let theme = props.theme;
    let block = Block::new()
        .title(" Integration ")
        .borders(Borders::ALL)
        .style(theme.ratatui_style(Element::Text));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // User
            Constraint::Length(1), // Organization
            Constraint::Length(1), // Integration Type
            Constraint::Min(0),    // Parameters
        ])
        .split(inner_area);

    let editing = |focus: Focus| props.mode == AppMode::Editing && props.focus == focus;

    let create_field_line = |label: &str, value: &str, focus: Focus| {
        let value_style = if props.focus == focus {
            theme.highlight_style()
        } else {
            theme.text_style()
        };

        let display_value = if editing(focus) {
            format!("{}_", props.edit_buffer)
        } else {
            value.to_owned()
        };

        Line::from(vec![
            Span::styled(
                format!("{:<19}", label),
                theme.warning_style().add_modifier(Modifier::BOLD),
            ),
            Span::styled(display_value, value_style),
        ])
    };

    frame.render_widget(
        Paragraph::new(create_field_line("User:", props.store.user(), Focus::User)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(create_field_line("Organization:", props.store.org(), Focus::Org)),
        chunks[1],
    );

    let type_value = match props.store.current_type() {
        Some(name) => format!("◄ {} ►", name),
        None => "◄ [SELECT] ►".to_string(),
    };
    frame.render_widget(
        Paragraph::new(create_field_line(
            "Integration Type:",
            &type_value,
            Focus::IntegrationType,
        )),
        chunks[2],
    );

    if let Some(name) = props.store.current_type() {
        render_parameters(frame, chunks[3], &props, name);
    }
}

fn render_parameters(frame: &mut Frame, area: Rect, props: &SelectorProps, name: &str) {
    let theme = props.theme;
    let block = Block::new()
        .title(format!(" {} Parameters ", name))
        .borders(Borders::ALL)
        .style(theme.ratatui_style(Element::Info));

    let focused = props.focus == Focus::Setup;
    let action_style = if focused {
        theme.highlight_style()
    } else {
        theme.ratatui_style(Element::Accent)
    };

    let mut lines = Vec::new();
    if props.setup_kind == Some(SetupKind::Token) {
        let token = if props.mode == AppMode::Editing && focused {
            format!("{}_", props.edit_buffer)
        } else if props.setup_input.is_empty() {
            "[PASTE YOUR TOKEN HERE]".to_string()
        } else {
            mask_token(props.setup_input)
        };
        lines.push(Line::from(vec![
            Span::styled("Access Token:  ", theme.warning_style()),
            Span::styled(token, theme.text_style()),
        ]));
    }

    let status = match (props.setup, props.setup_kind) {
        (SetupState::InProgress, _) => Line::styled("Connecting...", theme.ratatui_style(Element::Inactive)),
        (SetupState::AwaitingAuthorization(url), _) => {
            lines.push(Line::styled(
                "Open this URL to authorize, then press [ENTER]:",
                theme.text_style(),
            ));
            Line::styled(url.clone(), theme.ratatui_style(Element::Accent))
        }
        (SetupState::Connected, _) if props.store.has_credentials() => {
            Line::styled(format!("✔ Connected to {}", name), theme.ratatui_style(Element::Accent))
        }
        (_, Some(SetupKind::Token)) => Line::styled("[ENTER] Save token and connect", action_style),
        _ => Line::styled(format!("[ENTER] Connect to {}", name), action_style),
    };
    lines.push(status);

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
