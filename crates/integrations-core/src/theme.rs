//! Everforest palette for the console.

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeVariant {
    #[default]
    EverforestDark,
    EverforestLight,
}

#[derive(Debug, Clone)]
struct Palette {
    background: Color,
    foreground: Color,
    accent: Color,
    error: Color,
    info: Color,
    muted: Color,
    selection: Color,
    warning: Color,
}

/// UI element types for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Text,
    Title,
    Border,
    Highlight,
    /// Enabled buttons
    Accent,
    Info,
    Background,
    /// Focused input field
    Active,
    /// Disabled buttons and hints
    Inactive,
    Warning,
    /// Notifications raised by failed requests
    Error,
}

#[derive(Debug, Clone)]
pub struct Theme {
    variant: ThemeVariant,
    palette: Palette,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeVariant::default())
    }
}

impl Theme {
    pub fn new(variant: ThemeVariant) -> Self {
        let palette = match variant {
            ThemeVariant::EverforestDark => Palette {
                background: Color::Rgb(45, 53, 59),
                foreground: Color::Rgb(211, 198, 170),
                accent: Color::Rgb(167, 192, 128),
                error: Color::Rgb(230, 126, 128),
                info: Color::Rgb(127, 187, 179),
                muted: Color::Rgb(116, 125, 135),
                selection: Color::Rgb(64, 72, 78),
                warning: Color::Rgb(219, 188, 127),
            },
            ThemeVariant::EverforestLight => Palette {
                background: Color::Rgb(253, 246, 227),
                foreground: Color::Rgb(92, 106, 114),
                accent: Color::Rgb(141, 161, 1),
                error: Color::Rgb(248, 85, 82),
                info: Color::Rgb(53, 167, 124),
                muted: Color::Rgb(150, 160, 170),
                selection: Color::Rgb(243, 236, 217),
                warning: Color::Rgb(207, 131, 44),
            },
        };

        Self { variant, palette }
    }

    pub fn variant(&self) -> ThemeVariant {
        self.variant
    }

    pub fn toggle(&mut self) {
        *self = Self::new(match self.variant {
            ThemeVariant::EverforestDark => ThemeVariant::EverforestLight,
            ThemeVariant::EverforestLight => ThemeVariant::EverforestDark,
        });
    }

    pub fn ratatui_style(&self, element: Element) -> Style {
        let p = &self.palette;
        let base = Style::default().bg(p.background);
        match element {
            Element::Text | Element::Background => base.fg(p.foreground),
            Element::Title => base.fg(p.accent).add_modifier(Modifier::BOLD),
            Element::Border | Element::Inactive => base.fg(p.muted),
            Element::Highlight => Style::default()
                .fg(p.foreground)
                .bg(p.selection)
                .add_modifier(Modifier::BOLD),
            Element::Accent => base.fg(p.accent).add_modifier(Modifier::BOLD),
            Element::Info => base.fg(p.info),
            Element::Active => Style::default()
                .fg(p.accent)
                .bg(p.selection)
                .add_modifier(Modifier::BOLD),
            Element::Warning => base.fg(p.warning),
            Element::Error => base.fg(p.error).add_modifier(Modifier::BOLD),
        }
    }

    pub fn text_style(&self) -> Style {
        self.ratatui_style(Element::Text)
    }

    pub fn highlight_style(&self) -> Style {
        self.ratatui_style(Element::Highlight)
    }

    pub fn warning_style(&self) -> Style {
        self.ratatui_style(Element::Warning)
    }
}
