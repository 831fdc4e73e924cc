use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    Mouse(MouseEvent),
    FocusLost,
}

/// Pointer position in terminal cells, fractional at the cell center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CellPos {
    pub(crate) col: f32,
    pub(crate) row: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Quit,
    SwitchScene,
    ToggleHud,
    TogglePause,
    Rebuild,
    PointerDown(CellPos),
    PointerMove(CellPos),
    PointerUp(CellPos),
    PointerLeave,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
                out.push(InputEvent::Key {
                    key: k.code,
                    mods: k.modifiers,
                });
            }
            Event::Mouse(m) => out.push(InputEvent::Mouse(m)),
            Event::FocusLost => out.push(InputEvent::FocusLost),
            _ => {}
        }
        if out.len() >= 64 {
            break;
        }
    }
    Ok(out)
}

fn cell(m: &MouseEvent) -> CellPos {
    CellPos {
        col: m.column as f32 + 0.5,
        row: m.row as f32 + 0.5,
    }
}

pub(crate) fn map_event_to_action(ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Key { key, mods } => {
            if key == KeyCode::Char('c') && mods.contains(KeyModifiers::CONTROL) {
                return Some(Action::Quit);
            }
            match key {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
                KeyCode::Tab => Some(Action::SwitchScene),
                KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHud),
                KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => {
                    Some(Action::TogglePause)
                }
                KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Rebuild),
                _ => None,
            }
        }
        InputEvent::Mouse(m) => match m.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Action::PointerDown(cell(&m))),
            MouseEventKind::Up(MouseButton::Left) => Some(Action::PointerUp(cell(&m))),
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                Some(Action::PointerMove(cell(&m)))
            }
            _ => None,
        },
        InputEvent::FocusLost => Some(Action::PointerLeave),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> InputEvent {
        InputEvent::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn keys_map_to_actions() {
        let key = |c| InputEvent::Key {
            key: KeyCode::Char(c),
            mods: KeyModifiers::NONE,
        };
        assert_eq!(map_event_to_action(key('q')), Some(Action::Quit));
        assert_eq!(map_event_to_action(key('r')), Some(Action::Rebuild));
        assert_eq!(map_event_to_action(key('x')), None);
    }

    #[test]
    fn mouse_uses_cell_centers() {
        let a = map_event_to_action(mouse(MouseEventKind::Down(MouseButton::Left), 3, 4));
        assert_eq!(
            a,
            Some(Action::PointerDown(CellPos { col: 3.5, row: 4.5 }))
        );
        assert_eq!(
            map_event_to_action(mouse(MouseEventKind::Down(MouseButton::Right), 0, 0)),
            None
        );
    }
}
