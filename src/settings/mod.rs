// Settings tab - textbox sliders bound to config, plus the dance checkbox
// bound to the user session

use anyhow::Result;
use tracing::debug;

use crate::config::Config;
use crate::host::Session;

pub const SLIDER_MAX: u8 = 100;
pub const SLIDER_STEP: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsItem {
    Transparency,
    Speed,
    Dance,
}

impl SettingsItem {
    pub const ALL: [SettingsItem; 3] = [Self::Transparency, Self::Speed, Self::Dance];

    pub fn label(self) -> &'static str {
        match self {
            Self::Transparency => "Textbox transparency",
            Self::Speed => "Textbox speed",
            Self::Dance => "Dance",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsPanel {
    transparency: u8,
    speed: u8,
    dance: bool,
    focused: SettingsItem,
}

impl SettingsPanel {
    pub fn from_config(config: &Config) -> Self {
        Self {
            transparency: config.other.textbox_transparency.min(SLIDER_MAX),
            speed: config.other.textbox_speed.min(SLIDER_MAX),
            dance: false,
            focused: SettingsItem::Transparency,
        }
    }

    pub fn transparency(&self) -> u8 {
        self.transparency
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn dance(&self) -> bool {
        self.dance
    }

    pub fn focused(&self) -> SettingsItem {
        self.focused
    }

    pub fn focus_next(&mut self) {
        self.move_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.move_focus(SettingsItem::ALL.len() - 1);
    }

    // Cycles through SettingsItem::ALL, wrapping at both ends
    fn move_focus(&mut self, offset: usize) {
        let all = SettingsItem::ALL;
        let current = all.iter().position(|item| *item == self.focused).unwrap_or(0);
        self.focused = all[(current + offset) % all.len()];
    }

    /// Nudge the focused slider by `steps` increments. Returns whether a
    /// value changed; changed values are written to `config` and saved.
    pub fn adjust(&mut self, steps: i16, config: &mut Config) -> Result<bool> {
        let current = match self.focused {
            SettingsItem::Transparency => self.transparency,
            SettingsItem::Speed => self.speed,
            SettingsItem::Dance => return Ok(false),
        };
        let value = (i32::from(current) + i32::from(steps) * SLIDER_STEP)
            .clamp(0, i32::from(SLIDER_MAX)) as u8;
        if value == current {
            return Ok(false);
        }

        match self.focused {
            SettingsItem::Transparency => self.set_transparency(value, config)?,
            SettingsItem::Speed => self.set_speed(value, config)?,
            SettingsItem::Dance => {}
        }
        Ok(true)
    }

    pub fn set_transparency(&mut self, value: u8, config: &mut Config) -> Result<()> {
        self.transparency = value.min(SLIDER_MAX);
        config.other.textbox_transparency = self.transparency;
        debug!("textbox_transparency = {}", self.transparency);
        config.save()
    }

    pub fn set_speed(&mut self, value: u8, config: &mut Config) -> Result<()> {
        self.speed = value.min(SLIDER_MAX);
        config.other.textbox_speed = self.speed;
        debug!("textbox_speed = {}", self.speed);
        config.save()
    }

    /// Flip the dance checkbox and tell the session about it
    pub fn toggle_dance(&mut self, session: &mut dyn Session) -> Result<bool> {
        self.dance = !self.dance;
        session.set_dance(self.dance);
        session.send_current_update()?;
        Ok(self.dance)
    }
}
