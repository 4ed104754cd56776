use std::sync::LazyLock;

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use serde::Deserialize;

use mpy_base::module::{Cycle, Module, ModuleId, PaintContext};
use mpy_base::scroll::ScrollState;
use mpy_base::ui::{paint_list, style, viewport_nav};

#[derive(Debug, Deserialize)]
struct HelpGroup {
    group: String,
    keys: Vec<(String, String)>,
}

fn parse_yaml<T: for<'de> Deserialize<'de>>(name: &str, content: &str) -> T {
    serde_yaml::from_str(content).unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
}

static HELP: LazyLock<Vec<HelpGroup>> = LazyLock::new(|| parse_yaml("help.yaml", include_str!("../../yamls/help.yaml")));

enum Row {
    Group(&'static str),
    Rule,
    Item(&'static str, &'static str),
    Blank,
}

fn rows() -> Vec<Row> {
    let mut rows = Vec::new();
    for group in HELP.iter() {
        rows.push(Row::Group(&group.group));
        rows.push(Row::Rule);
        rows.extend(group.keys.iter().map(|(key, what)| Row::Item(key, what)));
        rows.push(Row::Blank);
    }
    rows
}

/// Static key reference.
pub struct HelpPanel {
    rows: Vec<Row>,
    scroll: ScrollState,
}

impl Default for HelpPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpPanel {
    pub fn new() -> Self {
        let rows = rows();
        let mut scroll = ScrollState::viewport_only();
        scroll.reset(rows.len());
        Self { rows, scroll }
    }
}

impl Module for HelpPanel {
    fn id(&self) -> ModuleId {
        ModuleId::Help
    }

    fn handle_input(&mut self, key: Option<KeyCode>, _cycle: &mut Cycle<'_>) {
        if let Some(key) = key {
            viewport_nav(&mut self.scroll, key);
        }
    }

    fn paint(&self, frame: &mut Frame, area: Rect, _ctx: &PaintContext<'_>) {
        let width = area.width as usize;
        paint_list(frame, area, &self.scroll, None, |i| match &self.rows[i] {
            Row::Group(name) => (name.to_string(), style::header().patch(style::accent())),
            Row::Rule => ("-".repeat(width), style::muted()),
            Row::Item(key, what) => (format!("    {:<12}{}", key, what), Style::default()),
            Row::Blank => (String::new(), Style::default()),
        });
    }

    fn on_resize(&mut self, area: Rect) {
        self.scroll.set_height(area.height as usize);
    }
}
