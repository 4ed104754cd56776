use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Span;

use mpy_base::board::Entry;
use mpy_base::config::Config;
use mpy_base::module::{Cycle, Module, ModuleId, PaintContext};
use mpy_base::remote::Command;
use mpy_base::testing::FakeRemote;
use mpy_mod_queue::QueuePanel;

use super::Controller;
use super::sync::Event;
use crate::modules::message::MessageLine;
use crate::ui::surface::Input;
use crate::ui::surface::testing::FakeSurface;

#[derive(Default)]
struct Trace {
    keys: Vec<(ModuleId, Option<KeyCode>)>,
    board_empty: Vec<bool>,
}

/// Records what it is given and answers one key with a board entry.
struct Probe {
    id: ModuleId,
    trace: Rc<RefCell<Trace>>,
    answer: Option<(KeyCode, Entry)>,
    got: Option<KeyCode>,
}

impl Probe {
    fn new(id: ModuleId, trace: &Rc<RefCell<Trace>>) -> Self {
        Self { id, trace: Rc::clone(trace), answer: None, got: None }
    }

    fn answering(mut self, key: char, entry: Entry) -> Self {
        self.answer = Some((KeyCode::Char(key), entry));
        self
    }
}

impl Module for Probe {
    fn id(&self) -> ModuleId {
        self.id
    }

    fn handle_input(&mut self, key: Option<KeyCode>, cycle: &mut Cycle<'_>) {
        let mut trace = self.trace.borrow_mut();
        trace.keys.push((self.id, key));
        trace.board_empty.push(cycle.board.is_empty());
        self.got = key;
    }

    fn settle(&mut self, cycle: &mut Cycle<'_>) {
        cycle.board.post_status(format!("{} settled", self.id.name()));
        if let Some((key, entry)) = &self.answer
            && self.got == Some(*key)
        {
            cycle.board.post(entry.clone());
        }
    }

    fn paint(&self, frame: &mut Frame, area: Rect, _ctx: &PaintContext<'_>) {
        frame.render_widget(Span::raw(format!("<{}>", self.id.name())), area);
    }
}

fn controller(remote: FakeRemote, modules: Vec<Box<dyn Module>>) -> Controller<FakeRemote, FakeSurface> {
    let mut controller = Controller::new(remote, FakeSurface::new(40, 8), Config::default(), modules);
    controller.handle_resize().unwrap();
    controller
}

fn queue_and_message(remote: FakeRemote) -> Controller<FakeRemote, FakeSurface> {
    controller(remote, vec![Box::new(QueuePanel::new()), Box::new(MessageLine::new())])
}

fn key(c: char) -> Event {
    Event::Input(KeyCode::Char(c))
}

#[test]
fn startup_syncs_paints_and_idles() {
    let mut c = queue_and_message(FakeRemote::with_queue(&["a", "b"]));
    assert!(c.run_cycle(Event::Startup).unwrap());

    assert_eq!(c.remote.queue_listings, 1);
    assert!(c.remote.subscribed);
    assert!(c.link.is_idle());
    assert_eq!(c.surface.frames, 1);
    assert!(c.surface.screen().contains("   2 b"));
}

#[test]
fn quit_touches_nothing() {
    let trace = Rc::default();
    let mut c = controller(FakeRemote::default(), vec![Box::new(Probe::new(ModuleId::Queue, &trace))]);

    assert!(!c.run_cycle(key('q')).unwrap());
    assert!(trace.borrow().keys.is_empty());
    assert_eq!(c.surface.frames, 0);
    assert_eq!(c.remote.subscriptions, 0);
}

#[test]
fn board_is_empty_when_phase_one_starts() {
    let trace = Rc::default();
    let mut c = controller(
        FakeRemote::default(),
        vec![Box::new(Probe::new(ModuleId::Queue, &trace)), Box::new(MessageLine::new())],
    );
    for event in [Event::Startup, key('j'), Event::Timeout, key('x')] {
        c.run_cycle(event).unwrap();
    }
    assert_eq!(trace.borrow().board_empty, vec![true; 4]);
    assert!(c.surface.screen().contains("Queue settled"));
}

#[test]
fn only_the_focused_panel_gets_the_key() {
    let trace = Rc::default();
    let mut c = controller(
        FakeRemote::default(),
        vec![Box::new(Probe::new(ModuleId::Queue, &trace)), Box::new(Probe::new(ModuleId::Info, &trace))],
    );
    c.run_cycle(key('k')).unwrap();
    assert_eq!(
        trace.borrow().keys,
        vec![(ModuleId::Queue, Some(KeyCode::Char('k'))), (ModuleId::Info, None)]
    );
}

#[test]
fn line_down_skips_the_server_unless_playing() {
    let mut c = queue_and_message(FakeRemote::with_queue(&["a", "b"]));
    c.run_cycle(Event::Startup).unwrap();
    c.run_cycle(key('j')).unwrap();
    assert!(c.remote.subscribed);
    assert!(c.link.is_idle());

    let mut remote = FakeRemote::with_queue(&["a", "b"]);
    remote.play(0, 100);
    let mut c = queue_and_message(remote);
    c.run_cycle(Event::Startup).unwrap();
    c.run_cycle(key('j')).unwrap();
    assert!(!c.remote.subscribed);
    assert!(!c.link.is_idle());
}

#[test]
fn focus_request_then_back_restores() {
    let trace = Rc::default();
    let mut c = controller(
        FakeRemote::default(),
        vec![
            Box::new(Probe::new(ModuleId::Queue, &trace).answering('x', Entry::Focus(ModuleId::Info))),
            Box::new(Probe::new(ModuleId::Info, &trace).answering('h', Entry::Back)),
        ],
    );
    c.run_cycle(Event::Startup).unwrap();
    assert!(c.surface.screen().contains("<Queue>"));

    c.run_cycle(key('x')).unwrap();
    assert_eq!(c.focus.current(), ModuleId::Info);
    assert!(c.surface.screen().contains("<Info>"));
    assert!(!c.surface.screen().contains("<Queue>"));

    c.run_cycle(key('h')).unwrap();
    assert_eq!(c.focus.current(), ModuleId::Queue);
    assert!(c.surface.screen().contains("<Queue>"));
}

#[test]
fn function_keys_switch_after_phase_one() {
    let trace: Rc<RefCell<Trace>> = Rc::default();
    let mut c = controller(
        FakeRemote::default(),
        vec![Box::new(Probe::new(ModuleId::Queue, &trace)), Box::new(Probe::new(ModuleId::Help, &trace))],
    );
    c.run_cycle(Event::Input(KeyCode::F(1))).unwrap();
    // The key went to the panel that had focus when it was pressed.
    assert_eq!(trace.borrow().keys[0], (ModuleId::Queue, Some(KeyCode::F(1))));
    assert_eq!(c.focus.current(), ModuleId::Help);
    assert!(c.surface.screen().contains("<Help>"));
}

#[test]
fn rejected_batch_is_dropped_and_reported() {
    let mut c = queue_and_message(FakeRemote::with_queue(&["a", "b", "c"]));
    c.run_cycle(Event::Startup).unwrap();

    c.remote.reject("deleteid", "No such song");
    c.run_cycle(key('d')).unwrap();
    assert_eq!(c.pending.commands(), &[Command::DeleteId(1)]);
    assert!(!c.surface.screen().contains("   1 a"));

    c.run_cycle(Event::Timeout).unwrap();
    assert!(c.pending.is_empty());
    assert_eq!(c.remote.queue.len(), 3);
    assert_eq!(c.remote.queue_listings, 2);
    assert_eq!(c.board.status(), Some("No such song"));
    let screen = c.surface.screen();
    assert!(screen.contains("No such song"));
    assert!(screen.contains("   1 a"));
}

#[test]
fn half_applied_batch_leaves_the_queue_as_the_server_has_it() {
    let mut remote = FakeRemote::with_queue(&["a", "b", "c"]);
    remote.play(0, 100);
    let mut c = queue_and_message(remote);
    c.run_cycle(Event::Startup).unwrap();

    c.remote.reject("swap 1 2", "Bad song index");
    c.run_cycle(key('J')).unwrap();
    c.run_cycle(key('J')).unwrap();
    assert_eq!(c.pending.commands(), &[Command::Swap(0, 1), Command::Swap(1, 2)]);
    assert!(c.surface.screen().contains("   3 a"));

    c.run_cycle(Event::Timeout).unwrap();
    assert!(c.pending.is_empty());
    // The server kept the first swap only.
    assert_eq!(c.remote.queue_uris(), vec!["b", "a", "c"]);
    assert_eq!(c.board.status(), Some("Bad song index"));
    let screen = c.surface.screen();
    assert!(screen.contains("   1 b"));
    assert!(screen.contains("   2 a"));
    assert!(screen.contains("   3 c"));

    // Nothing is resent on the next sync.
    c.run_cycle(Event::Timeout).unwrap();
    assert_eq!(c.remote.batches.len(), 1);
    assert_eq!(c.remote.queue_uris(), vec!["b", "a", "c"]);
}

#[test]
fn resize_keeps_the_selection_in_view() {
    let uris: Vec<String> = (1..=10).map(|i| format!("s{:02}", i)).collect();
    let uris: Vec<&str> = uris.iter().map(String::as_str).collect();
    let mut c = Controller::new(
        FakeRemote::with_queue(&uris),
        FakeSurface::new(40, 12),
        Config::default(),
        vec![Box::new(QueuePanel::new()), Box::new(MessageLine::new())],
    );
    c.handle_resize().unwrap();
    c.run_cycle(Event::Startup).unwrap();
    c.run_cycle(key('G')).unwrap();
    let screen = c.surface.screen();
    assert!(screen.contains("   3 s03"));
    assert!(screen.contains("  10 s10"));
    assert!(!screen.contains("   2 s02"));

    c.surface.terminal.backend_mut().resize(40, 6);
    c.run_cycle(Event::Resize(40, 6)).unwrap();
    assert_eq!(c.board.queue_selection().map(|s| s.uri.as_str()), Some("s10"));
    let screen = c.surface.screen();
    assert!(screen.contains("   9 s09"));
    assert!(screen.contains("  10 s10"));
    assert!(!screen.contains("   8 s08"));

    c.surface.terminal.backend_mut().resize(40, 12);
    c.run_cycle(Event::Resize(40, 12)).unwrap();
    assert_eq!(c.board.queue_selection().map(|s| s.uri.as_str()), Some("s10"));
    let screen = c.surface.screen();
    assert!(screen.contains("   3 s03"));
    assert!(screen.contains("  10 s10"));
}

#[test]
fn partial_sync_holds_writes_until_the_gesture_ends() {
    let mut remote = FakeRemote::with_queue(&["a", "b", "c"]);
    remote.play(0, 100);
    let mut c = queue_and_message(remote);
    c.run_cycle(Event::Startup).unwrap();

    c.run_cycle(key('J')).unwrap();
    assert_eq!(c.pending.commands(), &[Command::Swap(0, 1)]);
    assert!(c.remote.batches.is_empty());

    c.run_cycle(Event::Timeout).unwrap();
    assert!(c.pending.is_empty());
    assert_eq!(c.remote.batches.len(), 1);
    assert_eq!(c.remote.queue_uris(), vec!["b", "a", "c"]);
}

#[test]
fn search_prompt_moves_the_queue_selection() {
    let mut c = queue_and_message(FakeRemote::with_queue(&["a", "b", "c"]));
    c.run_cycle(Event::Startup).unwrap();

    c.surface.answers.push_back("c".to_string());
    c.run_cycle(key('/')).unwrap();
    assert_eq!(c.surface.asked, vec!["Find"]);
    assert_eq!(c.search.text(), "c");
    assert_eq!(c.board.queue_selection().map(|s| s.uri.as_str()), Some("c"));
}

#[test]
fn fatal_sync_error_ends_the_run() {
    let mut c = queue_and_message(FakeRemote::default());
    c.run_cycle(Event::Startup).unwrap();
    c.remote.broken = true;
    assert!(c.run_cycle(Event::Notification).is_err());
}

#[test]
fn run_wakes_on_notifications_and_input() {
    let mut remote = FakeRemote::with_queue(&["a"]);
    remote.notify = true;
    let mut c = queue_and_message(remote);
    c.config.poll_interval_ms = 50;
    c.surface.inputs.push_back(Input::Key(KeyCode::Char('q')));

    c.run().unwrap();
    // Startup, then the notification; quit paints nothing.
    assert_eq!(c.surface.frames, 2);
    assert_eq!(c.remote.subscriptions, 2);
    assert!(!c.remote.notify);
}
