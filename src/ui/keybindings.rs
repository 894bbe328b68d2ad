// Keybindings for the gallery lightbox
// Maps raw input delivered by the presenter to navigator commands
//
// Keybindings (while the lightbox is open):
// - Right arrow / wheel down: next image
// - Left arrow / wheel up: previous image
// - Down arrow: last image
// - Up arrow: first image
// - Escape: close
//
// Pointer controls: left/right side panels step, the double-chevron buttons
// jump to the ends, the close button and the background close.

/// Keys the lightbox cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Escape,
    Other,
}

/// Clickable regions of the lightbox overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxControl {
    LeftPanel,
    RightPanel,
    FirstButton,
    PrevButton,
    NextButton,
    LastButton,
    CloseButton,
    Background,
    /// The image itself swallows clicks.
    Image,
}

/// Input delivered to the gallery while the lightbox listeners are registered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Wheel { delta_y: f64 },
    Key(Key),
    Click(LightboxControl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    First,
    Prev,
    Next,
    Last,
    Close,
}

impl Key {
    /// Maps a DOM-style key name (`KeyboardEvent.key`).
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// Resolves an input event to a navigator command.
pub fn command_for(event: InputEvent) -> Option<NavCommand> {
    match event {
        InputEvent::Wheel { delta_y } if delta_y < 0.0 => Some(NavCommand::Prev),
        InputEvent::Wheel { .. } => Some(NavCommand::Next),
        InputEvent::Key(key) => match key {
            Key::Escape => Some(NavCommand::Close),
            Key::ArrowRight => Some(NavCommand::Next),
            Key::ArrowLeft => Some(NavCommand::Prev),
            Key::ArrowDown => Some(NavCommand::Last),
            Key::ArrowUp => Some(NavCommand::First),
            Key::Other => None,
        },
        InputEvent::Click(control) => match control {
            LightboxControl::LeftPanel | LightboxControl::PrevButton => Some(NavCommand::Prev),
            LightboxControl::RightPanel | LightboxControl::NextButton => Some(NavCommand::Next),
            LightboxControl::FirstButton => Some(NavCommand::First),
            LightboxControl::LastButton => Some(NavCommand::Last),
            LightboxControl::CloseButton | LightboxControl::Background => Some(NavCommand::Close),
            LightboxControl::Image => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_direction() {
        assert_eq!(
            command_for(InputEvent::Wheel { delta_y: -3.0 }),
            Some(NavCommand::Prev)
        );
        assert_eq!(
            command_for(InputEvent::Wheel { delta_y: 3.0 }),
            Some(NavCommand::Next)
        );
        // zero delta counts as "down"
        assert_eq!(
            command_for(InputEvent::Wheel { delta_y: 0.0 }),
            Some(NavCommand::Next)
        );
    }

    #[test]
    fn test_arrow_keys() {
        let cases = [
            ("ArrowRight", Some(NavCommand::Next)),
            ("ArrowLeft", Some(NavCommand::Prev)),
            ("ArrowDown", Some(NavCommand::Last)),
            ("ArrowUp", Some(NavCommand::First)),
            ("Escape", Some(NavCommand::Close)),
            ("a", None),
        ];
        for (name, expected) in cases {
            assert_eq!(command_for(InputEvent::Key(Key::from_name(name))), expected, "{name}");
        }
    }

    #[test]
    fn test_panel_clicks() {
        assert_eq!(
            command_for(InputEvent::Click(LightboxControl::LeftPanel)),
            Some(NavCommand::Prev)
        );
        assert_eq!(
            command_for(InputEvent::Click(LightboxControl::Background)),
            Some(NavCommand::Close)
        );
        assert_eq!(command_for(InputEvent::Click(LightboxControl::Image)), None);
    }
}
