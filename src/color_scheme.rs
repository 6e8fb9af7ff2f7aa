use crossterm::style::{Attribute, Color, ContentStyle, StyledContent};

/// Color scheme variants for `--color` output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSchemeId {
    Default = 0,
    Monochrome = 1,
    LightTerminal = 2,
}

impl ColorSchemeId {
    pub fn all() -> &'static [ColorSchemeId] {
        &[
            ColorSchemeId::Default,
            ColorSchemeId::Monochrome,
            ColorSchemeId::LightTerminal,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorSchemeId::Default => "Default",
            ColorSchemeId::Monochrome => "Monochrome",
            ColorSchemeId::LightTerminal => "Light Terminal",
        }
    }

    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => ColorSchemeId::Default,
            1 => ColorSchemeId::Monochrome,
            2 => ColorSchemeId::LightTerminal,
            _ => ColorSchemeId::Default,
        }
    }
}

/// Colors used by the report and error lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub enabled: bool,

    pub title: Color,     // Banner line
    pub label: Color,     // "CPU Min:", "Governor:" ...
    pub value: Color,     // Numbers and names
    pub core_id: Color,   // Per-core table index
    pub turbo_on: Color,
    pub turbo_off: Color,
    pub missing: Color,   // Unreadable values
    pub error: Color,
    pub warning: Color,
}

impl ColorScheme {
    pub fn from_id(id: ColorSchemeId) -> Self {
        match id {
            ColorSchemeId::Default => Self::default_scheme(),
            ColorSchemeId::Monochrome => Self::monochrome(),
            ColorSchemeId::LightTerminal => Self::light_terminal(),
        }
    }

    /// `enabled == false` prints plain text regardless of scheme
    pub fn new(enabled: bool, id: ColorSchemeId) -> Self {
        Self {
            enabled,
            ..Self::from_id(id)
        }
    }

    fn default_scheme() -> Self {
        Self {
            enabled: true,
            title: Color::Blue,
            label: Color::White,
            value: Color::Cyan,
            core_id: Color::Green,
            turbo_on: Color::Green,
            turbo_off: Color::Yellow,
            missing: Color::DarkGrey,
            error: Color::Red,
            warning: Color::Yellow,
        }
    }

    fn monochrome() -> Self {
        Self {
            enabled: true,
            title: Color::Reset,
            label: Color::Reset,
            value: Color::Reset,
            core_id: Color::Reset,
            turbo_on: Color::Reset,
            turbo_off: Color::Reset,
            missing: Color::Reset,
            error: Color::Reset,
            warning: Color::Reset,
        }
    }

    fn light_terminal() -> Self {
        Self {
            enabled: true,
            title: Color::DarkBlue,
            label: Color::Black,
            value: Color::DarkCyan,
            core_id: Color::DarkGreen,
            turbo_on: Color::DarkGreen,
            turbo_off: Color::DarkYellow,
            missing: Color::Grey,
            error: Color::DarkRed,
            warning: Color::DarkYellow,
        }
    }

    /// Style `text` with `color`, bold if asked; plain when colors are off
    pub fn paint<D: std::fmt::Display>(&self, text: D, color: Color, bold: bool) -> StyledContent<D> {
        let mut style = ContentStyle::new();
        if self.enabled {
            style.foreground_color = Some(color);
            if bold {
                style.attributes.set(Attribute::Bold);
            }
        }
        StyledContent::new(style, text)
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::new(false, ColorSchemeId::Default)
    }
}
