//! Style roles mapping logical names to `colored::Color`
//!
//! Each role is a variant of [`StyleRole`]. Colouring only happens when the
//! `enabled` flag passed to [`StyleRole::paint`] is true, so there is no
//! global colour state. The same roles feed the clap help palette and the
//! prettytable cell specs used by the scan summary.

use clap::builder::styling::AnsiColor;
use colored::Color;

use crate::scanner::api::Severity;

macro_rules! style {
    ( $( $variant:ident => $color:expr ),+ $(,)? ) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub enum StyleRole { $( $variant ),+ }

        impl StyleRole {
            pub fn color(self) -> Option<Color> {
                match self { $( StyleRole::$variant => $color ),+ }
            }

            pub fn ansi_code(self) -> Option<String> {
                map_color_code(self.color()?)
            }

            pub fn paint(self, text: &str, enabled: bool) -> String {
                if !enabled { return text.to_string(); }
                if let Some(code) = self.ansi_code() { return format!("\x1b[{}m{}\x1b[0m", code, text); }
                text.to_string()
            }

            /// prettytable style spec (`F<c>`), None for uncoloured roles
            pub fn to_prettytable_spec(self) -> Option<String> {
                let spec_char = match self.color()? {
                    Color::Black => "k",
                    Color::Red => "r",
                    Color::Green => "g",
                    Color::Yellow => "y",
                    Color::Blue => "b",
                    Color::Magenta => "m",
                    Color::Cyan => "c",
                    Color::White => "w",
                    Color::BrightBlack => "K",
                    Color::BrightRed => "R",
                    Color::BrightGreen => "G",
                    Color::BrightYellow => "Y",
                    Color::BrightBlue => "B",
                    Color::BrightMagenta => "M",
                    Color::BrightCyan => "C",
                    Color::BrightWhite => "W",
                    _ => return None,
                };
                Some(format!("F{}", spec_char))
            }
        }
    }
}

style! {
    Header   => Some(Color::Yellow),
    Literal  => Some(Color::Cyan),
    Key      => Some(Color::BrightGreen),
    Value    => None,
    Good     => Some(Color::Green),
    Warning  => Some(Color::Yellow),
    Bad      => Some(Color::Red),
    Critical => Some(Color::BrightRed),
    Dim      => Some(Color::BrightBlack)
}

impl StyleRole {
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical => StyleRole::Critical,
            Severity::High => StyleRole::Bad,
            Severity::Medium => StyleRole::Warning,
            Severity::Low => StyleRole::Literal,
            Severity::Info => StyleRole::Dim,
        }
    }

    /// 80 and above is good, below 50 is bad
    pub fn for_score(score: u8) -> Self {
        match score {
            80..=100 => StyleRole::Good,
            50..=79 => StyleRole::Warning,
            _ => StyleRole::Bad,
        }
    }

    pub fn for_check(passed: bool) -> Self {
        if passed {
            StyleRole::Good
        } else {
            StyleRole::Bad
        }
    }
}

fn map_color_code(c: Color) -> Option<String> {
    use Color::*;
    match c {
        Black => Some("30".to_string()),
        Red => Some("31".to_string()),
        Green => Some("32".to_string()),
        Yellow => Some("33".to_string()),
        Blue => Some("34".to_string()),
        Magenta => Some("35".to_string()),
        Cyan => Some("36".to_string()),
        White => Some("37".to_string()),
        BrightBlack => Some("90".to_string()),
        BrightRed => Some("91".to_string()),
        BrightGreen => Some("92".to_string()),
        BrightYellow => Some("93".to_string()),
        BrightBlue => Some("94".to_string()),
        BrightMagenta => Some("95".to_string()),
        BrightCyan => Some("96".to_string()),
        BrightWhite => Some("97".to_string()),
        TrueColor { r, g, b } => Some(format!("38;2;{};{};{}", r, g, b)),
    }
}

fn color_to_ansi(c: Color) -> Option<AnsiColor> {
    use AnsiColor as A;
    use Color::*;
    Some(match c {
        Black => A::Black,
        Red => A::Red,
        Green => A::Green,
        Yellow => A::Yellow,
        Blue => A::Blue,
        Magenta => A::Magenta,
        Cyan => A::Cyan,
        White => A::White,
        BrightBlack => A::BrightBlack,
        BrightRed => A::BrightRed,
        BrightGreen => A::BrightGreen,
        BrightYellow => A::BrightYellow,
        BrightBlue => A::BrightBlue,
        BrightMagenta => A::BrightMagenta,
        BrightCyan => A::BrightCyan,
        BrightWhite => A::BrightWhite,
        _ => return None,
    })
}

/// clap help styles built from the same roles
pub fn palette_to_clap(enabled: bool) -> clap::builder::Styles {
    use clap::builder::styling::{Color as ClapColor, Style};
    if !enabled {
        return clap::builder::Styles::plain();
    }

    let style = |role: StyleRole, bold: bool| {
        let mut s = Style::new();
        if let Some(col) = role.color().and_then(color_to_ansi) {
            s = s.fg_color(Some(ClapColor::Ansi(col)));
        }
        if bold {
            s = s.bold();
        }
        s
    };

    clap::builder::Styles::styled()
        .header(style(StyleRole::Header, true))
        .usage(style(StyleRole::Header, true))
        .literal(style(StyleRole::Literal, false))
        .placeholder(style(StyleRole::Key, false))
        .valid(style(StyleRole::Good, false))
        .invalid(style(StyleRole::Bad, false))
        .error(style(StyleRole::Critical, false))
}

/// Colour decision: explicit choice wins, then `NO_COLOR`, then TTY detection
pub fn colors_enabled(explicit: Option<bool>) -> bool {
    if let Some(choice) = explicit {
        return choice;
    }
    if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        return false;
    }
    std::io::IsTerminal::is_terminal(&std::io::stdout())
}
