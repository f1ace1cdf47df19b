use ratatui::crossterm::event::{KeyCode, KeyEvent};

use crate::controller::FetchKind;
use crate::domain::email::SortField;
use crate::terminal::state::{AppState, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    SwitchView(View),
    Fetch(FetchKind),
    RefreshLogs,
    ExportLogs,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState) -> Action {
    match key.code {
        KeyCode::Char('q') => return Action::Quit,

        KeyCode::Esc => {
            if state.show_filters {
                state.show_filters = false;
                return Action::None;
            }
            if state.opened_id.is_some() {
                state.opened_id = None;
                return Action::None;
            }
            return Action::Quit;
        }

        KeyCode::Tab => return Action::SwitchView(state.view.next()),
        KeyCode::BackTab => return Action::SwitchView(state.view.prev()),

        KeyCode::Char(c @ '1'..='4') => {
            let idx = c as usize - '1' as usize;
            return Action::SwitchView(View::ALL[idx]);
        }

        _ => {}
    }

    match state.view {
        View::Dashboard => handle_dashboard_keys(key, state),
        View::Emails => handle_email_keys(key, state),
        View::Logs => handle_log_keys(key, state),
        View::Settings => Action::None,
    }
}

fn handle_dashboard_keys(key: KeyEvent, state: &mut AppState) -> Action {
    match key.code {
        KeyCode::Char('r') if !state.controller.is_loading() => Action::Fetch(FetchKind::Refresh),
        _ => Action::None,
    }
}

fn handle_email_keys(key: KeyEvent, state: &mut AppState) -> Action {
    if state.show_filters {
        match key.code {
            KeyCode::Char('c') => state.cycle_category(),
            KeyCode::Char('d') => state.cycle_department(),
            KeyCode::Char('s') => state.toggle_spam_only(),
            KeyCode::Char('u') => state.toggle_duplicate_only(),
            KeyCode::Char('f') => state.show_filters = false,
            KeyCode::Char('x') => state.clear_filters(),
            _ => {}
        }
        return Action::None;
    }

    match key.code {
        KeyCode::Down | KeyCode::Char('j') => state.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => state.move_selection(-1),
        KeyCode::PageDown => state.move_selection(10),
        KeyCode::PageUp => state.move_selection(-10),
        KeyCode::Home => state.select_first(),
        KeyCode::End => state.select_last(),
        KeyCode::Enter => state.toggle_detail(),

        KeyCode::Char('f') => state.show_filters = true,
        KeyCode::Char('x') => state.clear_filters(),

        KeyCode::Char('F') => state.sort_by(SortField::From),
        KeyCode::Char('S') => state.sort_by(SortField::Subject),
        KeyCode::Char('R') => state.sort_by(SortField::RoutedTo),
        KeyCode::Char('D') => state.sort_by(SortField::Date),

        KeyCode::Char('r') if !state.controller.is_rechecking() => {
            return Action::Fetch(FetchKind::Recheck);
        }
        _ => {}
    }
    Action::None
}

fn handle_log_keys(key: KeyEvent, state: &mut AppState) -> Action {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => state.scroll_logs(1),
        KeyCode::Up | KeyCode::Char('k') => state.scroll_logs(-1),
        KeyCode::Char('r') if !state.logs_loading => return Action::RefreshLogs,
        KeyCode::Char('w') => return Action::ExportLogs,
        _ => {}
    }
    Action::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::email::fixtures::with_category;
    use crate::pipeline::table::SortDirection;
    use ratatui::crossterm::event::KeyModifiers;

    fn press(c: KeyCode) -> KeyEvent {
        KeyEvent::new(c, KeyModifiers::NONE)
    }

    fn emails_view() -> AppState {
        let mut s = AppState::new(Config::default());
        s.controller.apply_fetch(Ok(vec![
            with_category("1", "A"),
            with_category("2", "B"),
        ]));
        s.set_view(View::Emails);
        s.clamp_selection();
        s
    }

    #[test]
    fn digits_and_tab_switch_views() {
        let mut s = AppState::new(Config::default());
        assert_eq!(
            handle_key(press(KeyCode::Char('3')), &mut s),
            Action::SwitchView(View::Logs)
        );
        assert_eq!(
            handle_key(press(KeyCode::Tab), &mut s),
            Action::SwitchView(View::Emails)
        );
    }

    #[test]
    fn filter_panel_captures_letters() {
        let mut s = emails_view();
        handle_key(press(KeyCode::Char('f')), &mut s);
        assert!(s.show_filters);
        handle_key(press(KeyCode::Char('c')), &mut s);
        assert_eq!(s.filters.category, "A");
        handle_key(press(KeyCode::Char('s')), &mut s);
        assert!(s.filters.spam_only);
        assert_eq!(s.filters.active_count(), 2);
        handle_key(press(KeyCode::Char('x')), &mut s);
        assert!(!s.filters.is_active());
        assert_eq!(handle_key(press(KeyCode::Esc), &mut s), Action::None);
        assert!(!s.show_filters);
    }

    #[test]
    fn sort_keys_toggle_columns() {
        let mut s = emails_view();
        handle_key(press(KeyCode::Char('S')), &mut s);
        assert_eq!(s.sort.field, SortField::Subject);
        assert_eq!(s.sort.direction, SortDirection::Ascending);
        handle_key(press(KeyCode::Char('S')), &mut s);
        assert_eq!(s.sort.direction, SortDirection::Descending);
    }

    #[test]
    fn recheck_only_when_idle() {
        let mut s = emails_view();
        assert_eq!(
            handle_key(press(KeyCode::Char('r')), &mut s),
            Action::Fetch(FetchKind::Recheck)
        );
        s.controller.begin(FetchKind::Recheck);
        assert_eq!(handle_key(press(KeyCode::Char('r')), &mut s), Action::None);
    }

    #[test]
    fn enter_then_esc_closes_detail_before_quitting() {
        let mut s = emails_view();
        handle_key(press(KeyCode::Enter), &mut s);
        assert!(s.opened_id.is_some());
        assert_eq!(handle_key(press(KeyCode::Esc), &mut s), Action::None);
        assert_eq!(handle_key(press(KeyCode::Esc), &mut s), Action::Quit);
    }

    #[test]
    fn recheck_available_again_after_leaving_mid_recheck() {
        let mut s = emails_view();
        assert_eq!(
            handle_key(press(KeyCode::Char('r')), &mut s),
            Action::Fetch(FetchKind::Recheck)
        );
        s.controller.begin(FetchKind::Recheck);

        // recheck result is lost with the old view's tasks
        s.set_view(View::Dashboard);
        s.controller.begin(FetchKind::Refresh);
        s.controller.apply_fetch(Ok(vec![with_category("1", "A")]));
        s.set_view(View::Emails);
        s.controller.begin(FetchKind::Refresh);
        s.controller.apply_fetch(Ok(vec![with_category("1", "A")]));

        assert!(!s.controller.is_rechecking());
        assert_eq!(
            handle_key(press(KeyCode::Char('r')), &mut s),
            Action::Fetch(FetchKind::Recheck)
        );
    }
}
