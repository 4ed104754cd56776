pub mod bars;
pub mod help;
pub mod message;

use std::io;

use mpy_base::config::Config;
use mpy_base::module::Module;
use mpy_mod_database::DatabasePanel;
use mpy_mod_info::InfoPanel;
use mpy_mod_library::LibraryPanel;
use mpy_mod_lyrics::LyricsPanel;
use mpy_mod_queue::QueuePanel;
use mpy_mod_search::SearchPanel;

use self::bars::{MenuBar, ProgressBar, StatusBar, TitleBar};
use self::help::HelpPanel;
use self::message::MessageLine;

/// Every module, in cycle order. The message line comes last so its phase 2
/// sees the status messages posted by the others.
pub fn all_modules(config: &Config) -> io::Result<Vec<Box<dyn Module>>> {
    Ok(vec![
        Box::new(MenuBar),
        Box::new(TitleBar),
        Box::new(ProgressBar),
        Box::new(StatusBar),
        Box::new(HelpPanel::new()),
        Box::new(QueuePanel::new()),
        Box::new(DatabasePanel::new()),
        Box::new(LyricsPanel::new(config)?),
        Box::new(LibraryPanel::new()),
        Box::new(SearchPanel::new()),
        Box::new(InfoPanel::new()),
        Box::new(MessageLine::new()),
    ])
}
