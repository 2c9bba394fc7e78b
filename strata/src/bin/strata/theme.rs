use colored::Color;
use comfy_table::Color as TableColor;
use strata::MigrationState;

/// Terminal palette shared by messages, help text and tables.
pub struct ColorTheme {
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub highlight: Color,
    pub muted: Color,
    pub primary: Color,
    pub secondary: Color,
    pub key: Color,
    pub value: Color,
}

pub static THEME: ColorTheme = ColorTheme {
    success: Color::Green,
    error: Color::Red,
    warning: Color::Yellow,
    info: Color::Blue,
    highlight: Color::Cyan,
    muted: Color::BrightBlack,
    primary: Color::BrightBlue,
    secondary: Color::Magenta,
    key: Color::BrightCyan,
    value: Color::White,
};

pub struct Icons {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub arrow: &'static str,
    pub bullet: &'static str,
}

pub const ICONS: Icons = Icons {
    success: "✓",
    error: "✗",
    warning: "⚠",
    info: "ℹ",
    arrow: "→",
    bullet: "•",
};

/// Icon, label and color of one row in the status table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Badge {
    pub icon: &'static str,
    pub label: &'static str,
    pub color: TableColor,
}

impl Badge {
    /// A ledger record whose migration file is gone.
    pub const ORPHANED: Badge = Badge {
        icon: "⚠",
        label: "missing",
        color: TableColor::Red,
    };

    pub fn for_state(state: MigrationState, checksum_mismatch: bool) -> Self {
        match (state, checksum_mismatch) {
            (MigrationState::Applied, true) => Badge {
                icon: "~",
                label: "modified",
                color: TableColor::Yellow,
            },
            (MigrationState::Applied, false) => Badge {
                icon: "✓",
                label: "applied",
                color: TableColor::Green,
            },
            (MigrationState::Pending, _) => Badge {
                icon: "○",
                label: "pending",
                color: TableColor::DarkGrey,
            },
        }
    }
}
