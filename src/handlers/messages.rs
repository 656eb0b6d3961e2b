use crate::rendering::Layout;

/// What the user asked for, independent of how it was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Dismiss the topmost displayed notification
    CloseTop,
    /// Dismiss everything displayed and waiting
    CloseAll,
    /// Bring back the most recently closed notification
    HistoryPop,
    /// Offer the actions of displayed notifications in the chooser
    ContextMenu,
    /// Dismiss one notification that was clicked
    Dismiss(u32),
}

pub const BUTTON_LEFT: u8 = 1;
pub const BUTTON_RIGHT: u8 = 3;

/// Map a click on the window to an action.
///
/// The right button closes everything, the left button dismisses the
/// notification under the pointer. Other buttons are ignored.
pub fn action_for_button(button: u8, y: i32, layout: &Layout) -> Option<Action> {
    match button {
        BUTTON_RIGHT => Some(Action::CloseAll),
        BUTTON_LEFT => layout.hit_test(y).map(Action::Dismiss),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::LayoutConfig;
    use crate::rendering::layout::tests::{FixedMeasure, notification};

    fn layout() -> Layout {
        let mut ns = vec![notification(4, "20"), notification(9, "30")];
        let config = LayoutConfig {
            format: "%s".to_string(),
            allow_markup: false,
            padding: 5,
            horizontal_padding: 0,
            frame_width: 1,
            separator_height: 2,
            width: Some(100),
        };
        Layout::compute(&mut ns, &config, &mut FixedMeasure)
    }

    #[test]
    fn test_right_click_closes_all() {
        assert_eq!(action_for_button(3, 5, &layout()), Some(Action::CloseAll));
        assert_eq!(action_for_button(3, 500, &layout()), Some(Action::CloseAll));
    }

    #[test]
    fn test_left_click_dismisses_block_under_pointer() {
        let layout = layout();
        assert_eq!(action_for_button(1, 0, &layout), Some(Action::Dismiss(4)));
        assert_eq!(action_for_button(1, 31, &layout), Some(Action::Dismiss(4)));
        assert_eq!(action_for_button(1, 32, &layout), Some(Action::Dismiss(9)));
        assert_eq!(action_for_button(1, 71, &layout), Some(Action::Dismiss(9)));
    }

    #[test]
    fn test_click_outside_blocks_does_nothing() {
        assert_eq!(action_for_button(1, 72, &layout()), None);
        assert_eq!(action_for_button(2, 10, &layout()), None);
    }
}
