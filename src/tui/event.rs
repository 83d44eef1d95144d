use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use std::time::Duration;

use super::{App, FilterField, Modal, ScheduleViewMode, Tab};
use crate::schedule::print::PrintLayout;

pub fn poll_event(timeout: Duration) -> anyhow::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.running = false;
        return;
    }

    // ── Error popup sits above everything else ────────────────────────
    if app.error.is_some() {
        if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
            app.error = None;
        }
        return;
    }

    // ── Open modals intercept all keys ────────────────────────────────
    match app.modal {
        Modal::None => {}
        Modal::View { .. } => {
            if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                app.close_modal();
            }
            return;
        }
        Modal::Form(_) => {
            handle_form_key(app, code);
            return;
        }
        Modal::ConfirmDelete { deleting, .. } => {
            match code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc if !deleting => {
                    app.close_modal()
                }
                _ => {}
            }
            return;
        }
        Modal::Filter(focus) => {
            handle_filter_key(app, focus, code);
            return;
        }
    }

    match code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Tab => {
            app.active_tab = app.active_tab.next();
            return;
        }
        KeyCode::BackTab => {
            app.active_tab = app.active_tab.prev();
            return;
        }
        KeyCode::Char(c @ '1'..='8') => {
            let idx = c as usize - '1' as usize;
            app.active_tab = Tab::ALL[idx];
            return;
        }
        KeyCode::Char('r') if !app.loading => {
            app.needs_refresh = true;
            return;
        }
        KeyCode::Char('a') => {
            app.open_add_form();
            return;
        }
        KeyCode::Char('e') => {
            app.open_update_form();
            return;
        }
        KeyCode::Char('d') => {
            app.open_delete_confirm();
            return;
        }
        _ => {}
    }

    if app.active_tab == Tab::Schedule && handle_schedule_key(app, code) {
        return;
    }

    match code {
        KeyCode::Down | KeyCode::Char('j') => {
            app.active_list_state_mut().select_next();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.active_list_state_mut().select_prev();
        }
        KeyCode::Home | KeyCode::Char('g') => {
            app.active_list_state_mut().selected = 0;
        }
        KeyCode::End | KeyCode::Char('G') => {
            let ls = app.active_list_state_mut();
            if ls.len > 0 {
                ls.selected = ls.len - 1;
            }
        }
        KeyCode::Enter => {
            let kind = app.active_tab.kind();
            if let Some(id) = app.selected_id() {
                app.open_view(kind, id);
            }
        }
        _ => {}
    }
}

/// Keys only the schedule tab understands. Returns `true` when consumed.
fn handle_schedule_key(app: &mut App, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('v') => {
            app.schedule_view = app.schedule_view.toggle();
            app.sync_lengths();
        }
        KeyCode::Char('f') => app.modal = Modal::Filter(FilterField::Teacher),
        KeyCode::Char('/') => app.modal = Modal::Filter(FilterField::Search),
        KeyCode::Char('c') => app.clear_filter(),
        KeyCode::Char('p') => app.request_print(PrintLayout::Grid),
        KeyCode::Char('P') => app.request_print(PrintLayout::Table),
        _ if app.schedule_view == ScheduleViewMode::List => return false,
        KeyCode::Left | KeyCode::Char('h') => app.select_day(app.selected_day.prev()),
        KeyCode::Right | KeyCode::Char('l') => app.select_day(app.selected_day.next()),
        KeyCode::Down | KeyCode::Char('j') => app.select_block_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_block_prev(),
        KeyCode::Home | KeyCode::Char('g') => app.selected_block = 0,
        KeyCode::End | KeyCode::Char('G') => {
            app.selected_block = app.day_schedules().len().saturating_sub(1);
        }
        KeyCode::Enter => app.on_schedule_selected(),
        _ => return false,
    }
    true
}

fn handle_form_key(app: &mut App, code: KeyCode) {
    if code == KeyCode::Enter {
        app.submit_form();
        return;
    }
    let Modal::Form(form) = &mut app.modal else {
        return;
    };
    match code {
        KeyCode::Esc => {
            if !form.submitting {
                app.close_modal();
            }
        }
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Right => form.cycle_choice(true),
        KeyCode::Left => form.cycle_choice(false),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.input_char(c),
        _ => {}
    }
}

fn handle_filter_key(app: &mut App, focus: FilterField, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Enter => app.modal = Modal::None,
        KeyCode::Down | KeyCode::Tab => app.modal = Modal::Filter(focus.next()),
        KeyCode::Up | KeyCode::BackTab => app.modal = Modal::Filter(focus.prev()),
        KeyCode::Right => app.cycle_filter(focus, true),
        KeyCode::Left => app.cycle_filter(focus, false),
        KeyCode::Delete => {
            match focus {
                FilterField::Search => app.filter.search.clear(),
                FilterField::Teacher => app.filter.teacher_id = None,
                FilterField::Room => app.filter.room_id = None,
                FilterField::Subject => app.filter.subject_id = None,
                FilterField::Day => app.filter.day = None,
            }
            app.on_filter_changed();
        }
        KeyCode::Backspace if focus == FilterField::Search => {
            app.filter.search.pop();
            app.on_filter_changed();
        }
        KeyCode::Char(c) if focus == FilterField::Search => {
            app.filter.search.push(c);
            app.on_filter_changed();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SchoolClient;
    use crate::config::{Role, Session};
    use crate::models::DayOfWeek;
    use crate::schedule::tests::schedule;
    use crate::tui::ErrorPopup;

    fn app(role: Role) -> App {
        let client = SchoolClient::new("http://127.0.0.1:9/api/", None).unwrap();
        App::new(
            client,
            Session {
                user_name: "Registrar".into(),
                role,
            },
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, code, KeyModifiers::NONE);
    }

    #[test]
    fn number_keys_jump_between_tabs() {
        let mut app = app(Role::Admin);
        press(&mut app, KeyCode::Char('6'));
        assert_eq!(app.active_tab, Tab::Rooms);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.active_tab, Tab::Teachers);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.active_tab, Tab::Schedule);
    }

    #[test]
    fn search_typing_filters_the_week() {
        let mut app = app(Role::Admin);
        let mut math = schedule("1", DayOfWeek::Monday, "08:00", "09:00");
        math.subject_name = Some("Mathematics".into());
        app.store.upsert(math);
        app.store.upsert(schedule("2", DayOfWeek::Monday, "09:00", "10:00"));

        press(&mut app, KeyCode::Char('/'));
        for c in "MATH".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.filter.search, "MATH");
        assert_eq!(app.filtered_schedules().len(), 1);

        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.modal, Modal::None));
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.filtered_schedules().len(), 2);
    }

    #[test]
    fn day_keys_move_the_calendar_and_enter_opens_the_record() {
        let mut app = app(Role::Teacher);
        app.store.upsert(schedule("w", DayOfWeek::Wednesday, "13:00", "14:00"));

        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.selected_day, DayOfWeek::Wednesday);
        press(&mut app, KeyCode::Enter);
        assert!(matches!(&app.modal, Modal::View { id, .. } if id == "w"));

        press(&mut app, KeyCode::Char('d'));
        assert!(matches!(app.modal, Modal::View { .. }));
        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.modal, Modal::None));
    }

    #[test]
    fn print_keys_only_raise_the_flag() {
        let mut app = app(Role::Admin);
        press(&mut app, KeyCode::Char('P'));
        assert_eq!(app.print_requested, Some(PrintLayout::Table));
        assert!(matches!(app.modal, Modal::None));
    }

    #[test]
    fn error_popup_swallows_keys_until_dismissed() {
        let mut app = app(Role::Admin);
        app.error = Some(ErrorPopup {
            title: "Oops".into(),
            message: "Nope".into(),
        });
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        assert!(app.error.is_none());
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }
}
