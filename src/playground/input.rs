use std::time::Instant;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::App;

pub fn handle_event(app: &mut App, event: Event, now: Instant) {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            // Clear any message on keypress
            app.message = None;
            handle_key(app, key, now);
        }
        Event::Resize(_, _) => {
            // Resize is handled by the view
        }
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char('c') if ctrl => app.quit(),
        KeyCode::Char('r') if ctrl => app.reload_config(),
        KeyCode::Char('l') if ctrl => app.cycle_language(),
        KeyCode::Char('n') if ctrl => app.scroll_down(),
        KeyCode::Char('p') if ctrl => app.scroll_up(),
        KeyCode::Tab => app.toggle_view(),

        // Editing restarts the debounce timer
        KeyCode::Char(c) if !ctrl => {
            app.buffer.insert_char(c);
            app.edited(now);
        }
        KeyCode::Enter => {
            app.buffer.insert_newline();
            app.edited(now);
        }
        KeyCode::Backspace => {
            if app.buffer.backspace() {
                app.edited(now);
            }
        }
        KeyCode::Delete => {
            if app.buffer.delete() {
                app.edited(now);
            }
        }

        KeyCode::Left => app.buffer.move_left(),
        KeyCode::Right => app.buffer.move_right(),
        KeyCode::Up => app.buffer.move_up(),
        KeyCode::Down => app.buffer.move_down(),
        KeyCode::Home => app.buffer.move_home(),
        KeyCode::End => app.buffer.move_end(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::Settings;
    use crate::pipeline::Pipeline;
    use crate::playground::ViewMode;
    use crate::playground::buffer::Buffer;
    use crate::scripting::ScriptEngine;
    use crate::syntax::{Language, testing};

    fn app() -> App {
        let pipeline = Pipeline::with_registry(Arc::new(testing::registry()), Settings::default());
        App::new(Buffer::new(), Language::Json, pipeline, ScriptEngine::new())
    }

    fn press(app: &mut App, code: KeyCode, now: Instant) {
        handle_event(app, Event::Key(KeyEvent::new(code, KeyModifiers::NONE)), now);
    }

    fn ctrl(app: &mut App, c: char, now: Instant) {
        handle_event(
            app,
            Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)),
            now,
        );
    }

    #[test]
    fn typing_edits_buffer_and_schedules_parse() {
        let mut app = app();
        let now = Instant::now();
        for c in "[1]".chars() {
            press(&mut app, KeyCode::Char(c), now);
        }
        assert_eq!(app.buffer.text(), "[1]");
        assert_eq!(app.deadline(), Some(now + Duration::from_millis(100)));

        press(&mut app, KeyCode::Backspace, now);
        assert_eq!(app.buffer.text(), "[1");
    }

    #[test]
    fn movement_does_not_schedule_parse() {
        let mut app = app();
        let now = Instant::now();
        press(&mut app, KeyCode::Left, now);
        press(&mut app, KeyCode::Backspace, now);
        press(&mut app, KeyCode::Delete, now);
        assert_eq!(app.deadline(), None);
    }

    #[test]
    fn control_keys() {
        let mut app = app();
        let now = Instant::now();

        ctrl(&mut app, 'x', now);
        assert_eq!(app.buffer.text(), "");

        press(&mut app, KeyCode::Tab, now);
        assert_eq!(app.view, ViewMode::Markdown);

        ctrl(&mut app, 'l', now);
        assert_eq!(app.language, Language::Markdown);
        assert!(app.message.is_some());

        ctrl(&mut app, 'c', now);
        assert!(!app.running);
    }

    #[test]
    fn escape_quits() {
        let mut app = app();
        press(&mut app, KeyCode::Esc, Instant::now());
        assert!(!app.running);
    }
}
