use crossterm::event::KeyCode;

// =============================================================================
// PATHS
// =============================================================================

/// Per-user configuration file, overlaid on the built-in defaults
pub const USER_CONFIG: &str = "~/.mpy/config.yaml";

/// Environment variable holding the log filter (EnvFilter syntax)
pub const LOG_FILTER_ENV: &str = "MPY_LOG";

// =============================================================================
// KEYS
// =============================================================================

/// Cursor movement shared by every list panel
pub const LIST_NAV_KEYS: &[KeyCode] = &[
    KeyCode::Char('j'),
    KeyCode::Char('k'),
    KeyCode::Char('f'),
    KeyCode::Char('b'),
    KeyCode::Char('H'),
    KeyCode::Char('M'),
    KeyCode::Char('L'),
    KeyCode::Char('g'),
    KeyCode::Char('G'),
];

/// Quit is checked before anything else in a cycle
pub const QUIT_KEY: KeyCode = KeyCode::Char('q');

// =============================================================================
// MESSAGES
// =============================================================================

pub const NO_SONG_SELECTED: &str = "No song selected";
pub const NOT_IN_QUEUE: &str = "Not found in playlist";
pub const NOT_IN_DATABASE: &str = "Not found in database";
