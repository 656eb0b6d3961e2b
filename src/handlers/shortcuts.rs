use stackd_config::ShortcutsConfig;
use x11rb::protocol::xproto::ModMask;
use xkbcommon::xkb;

use super::Action;
use crate::window::{GrabError, WindowSystem};

/// A parsed `mod+mod+key` binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardShortcut {
    pub spec: String,
    pub mask: u16,
    pub keysym: u32,
    pub keycode: u8,
    pub valid: bool,
}

fn modifier_mask(name: &str) -> Option<u16> {
    let mask = match name {
        "ctrl" => ModMask::CONTROL,
        "shift" => ModMask::SHIFT,
        "mod1" => ModMask::M1,
        "mod2" => ModMask::M2,
        "mod3" => ModMask::M3,
        "mod4" => ModMask::M4,
        _ => return None,
    };
    Some(u16::from(mask))
}

fn keysym_from_name(name: &str) -> Option<u32> {
    let keysym = xkb::keysym_from_name(name, xkb::KEYSYM_NO_FLAGS).raw();
    (keysym != 0).then_some(keysym)
}

impl KeyboardShortcut {
    /// Parse a binding. The keycode is resolved later against the server.
    ///
    /// An empty or `none` spec yields a binding that is silently disabled.
    pub fn parse(spec: &str) -> Self {
        let mut shortcut = Self {
            spec: spec.to_string(),
            mask: 0,
            keysym: 0,
            keycode: 0,
            valid: false,
        };
        let spec = spec.trim();
        if spec.is_empty() || spec.eq_ignore_ascii_case("none") {
            return shortcut;
        }

        let mut tokens: Vec<&str> = spec.split('+').map(str::trim).collect();
        let key = tokens.pop().unwrap_or_default();
        for modifier in tokens {
            match modifier_mask(modifier) {
                Some(mask) => shortcut.mask |= mask,
                None => tracing::warn!(
                    "Unknown modifier {:?} in shortcut {:?}",
                    modifier,
                    shortcut.spec
                ),
            }
        }

        match keysym_from_name(key) {
            Some(keysym) => {
                shortcut.keysym = keysym;
                shortcut.valid = true;
            }
            None => tracing::warn!("Unknown key {:?} in shortcut {:?}", key, shortcut.spec),
        }
        shortcut
    }

    fn is_disabled(&self) -> bool {
        let spec = self.spec.trim();
        spec.is_empty() || spec.eq_ignore_ascii_case("none")
    }

    /// Find the keycode for the parsed keysym on this keyboard.
    pub fn resolve(&mut self, ws: &mut impl WindowSystem) {
        if !self.valid {
            return;
        }
        match ws.keycode_for(self.keysym) {
            Some(keycode) => self.keycode = keycode,
            None => {
                tracing::warn!("No keycode for shortcut {:?}", self.spec);
                self.valid = false;
            }
        }
    }

    /// Grab the binding, disabling it when another client owns it.
    ///
    /// Only a protocol failure other than an access conflict is an error.
    pub fn grab(&mut self, ws: &mut impl WindowSystem) -> Result<(), GrabError> {
        if !self.valid {
            return Ok(());
        }
        match ws.grab_key(self.keycode, self.mask) {
            Ok(()) => Ok(()),
            Err(GrabError::Access) => {
                tracing::warn!(
                    "Unable to grab {:?}, it is already bound elsewhere",
                    self.spec
                );
                self.valid = false;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn ungrab(&self, ws: &mut impl WindowSystem) -> anyhow::Result<()> {
        if self.valid {
            ws.ungrab_key(self.keycode, self.mask)?;
        }
        Ok(())
    }

    pub fn matches(&self, keysym: u32, state: u16) -> bool {
        self.valid && self.keysym == keysym && self.mask == state
    }
}

/// The four global bindings and their grab lifecycle.
#[derive(Debug, Clone)]
pub struct ShortcutManager {
    pub close: KeyboardShortcut,
    pub close_all: KeyboardShortcut,
    pub history: KeyboardShortcut,
    pub context: KeyboardShortcut,
}

impl ShortcutManager {
    pub fn new(config: &ShortcutsConfig) -> Self {
        Self {
            close: KeyboardShortcut::parse(&config.close),
            close_all: KeyboardShortcut::parse(&config.close_all),
            history: KeyboardShortcut::parse(&config.history),
            context: KeyboardShortcut::parse(&config.context),
        }
    }

    fn all_mut(&mut self) -> [&mut KeyboardShortcut; 4] {
        [
            &mut self.close,
            &mut self.close_all,
            &mut self.history,
            &mut self.context,
        ]
    }

    /// Resolve keycodes, trial-grab every binding once, then keep the history
    /// binding grabbed for the life of the process.
    pub fn setup(&mut self, ws: &mut impl WindowSystem) -> anyhow::Result<()> {
        for shortcut in self.all_mut() {
            if shortcut.is_disabled() {
                continue;
            }
            shortcut.resolve(ws);
            shortcut.grab(ws)?;
            shortcut.ungrab(ws)?;
        }
        self.history.grab(ws)?;
        Ok(())
    }

    /// Grab what is only needed while notifications are on screen.
    pub fn grab_visible(&mut self, ws: &mut impl WindowSystem) -> anyhow::Result<()> {
        self.close.grab(ws)?;
        self.close_all.grab(ws)?;
        self.context.grab(ws)?;
        if let Err(err) = ws.grab_buttons() {
            tracing::warn!("Unable to grab mouse buttons: {}", err);
        }
        Ok(())
    }

    pub fn ungrab_visible(&mut self, ws: &mut impl WindowSystem) -> anyhow::Result<()> {
        self.close.ungrab(ws)?;
        self.close_all.ungrab(ws)?;
        self.context.ungrab(ws)?;
        ws.ungrab_buttons()
    }

    /// The action bound to a key press. Only the first match counts.
    pub fn action_for_key(&self, keysym: u32, state: u16) -> Option<Action> {
        [
            (&self.close, Action::CloseTop),
            (&self.history, Action::HistoryPop),
            (&self.close_all, Action::CloseAll),
            (&self.context, Action::ContextMenu),
        ]
        .into_iter()
        .find(|(shortcut, _)| shortcut.matches(keysym, state))
        .map(|(_, action)| action)
    }
}
