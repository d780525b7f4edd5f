//! Declarative cartridge menu for external UI builders.
//!
//! The core never draws anything. A front end walks [`cartridge_menu`] and
//! calls [`MenuEffect::activate`] when the user picks an entry; every effect
//! is a [`ControlHandle`] request, so it is applied at the next instruction
//! boundary.

use crate::core::cartridge::resources::{ResourceKind, CARTRIDGE_RESET};
use crate::core::cartridge::{ControlHandle, ModelId};
use std::path::PathBuf;

/// What picking an entry does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEffect {
    /// Ask for a file, then attach it to the model
    AttachImage(ModelId),
    /// Flip a boolean resource
    ToggleResource(&'static str),
    Detach,
    Freeze,
    SetDefault,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub effect: MenuEffect,
}

impl MenuEntry {
    fn new(label: impl Into<String>, effect: MenuEffect) -> Self {
        Self { label: label.into(), effect }
    }

    fn separator() -> Self {
        Self::new("", MenuEffect::Separator)
    }
}

impl MenuEffect {
    /// Post the request for this effect.
    ///
    /// `current` is the resource value shown by the UI (toggles only),
    /// `image` the file the user picked (attach only). Returns `false` if
    /// nothing was sent.
    pub fn activate(&self, handle: &ControlHandle, current: Option<i32>, image: Option<PathBuf>) -> bool {
        match self {
            MenuEffect::AttachImage(model) => match image {
                Some(path) => handle.attach(*model, Some(path)),
                None => false,
            },
            MenuEffect::ToggleResource(name) => {
                let value = if current.unwrap_or(0) != 0 { 0 } else { 1 };
                handle.set_resource(name, value)
            }
            MenuEffect::Detach => handle.detach(),
            MenuEffect::Freeze => handle.freeze(),
            MenuEffect::SetDefault => handle.set_default(),
            MenuEffect::Separator => false,
        }
    }

    /// Resource a toggle reflects, for drawing its check mark
    pub fn resource(&self) -> Option<&'static str> {
        match self {
            MenuEffect::ToggleResource(name) => Some(*name),
            _ => None,
        }
    }
}

/// Menu built from the model registry
pub fn cartridge_menu() -> Vec<MenuEntry> {
    let mut menu = Vec::new();

    for &model in ModelId::ALL {
        menu.push(MenuEntry::new(
            format!("Attach {} image", model),
            MenuEffect::AttachImage(model),
        ));
        for spec in model.resources() {
            let label = match spec.kind {
                ResourceKind::Enabled => format!("Enable {}", model),
                ResourceKind::Switch => format!("{} switch", model),
                ResourceKind::Mode => continue,
            };
            menu.push(MenuEntry::new(label, MenuEffect::ToggleResource(spec.name)));
        }
    }

    menu.push(MenuEntry::separator());
    menu.push(MenuEntry::new("Detach cartridge image", MenuEffect::Detach));
    menu.push(MenuEntry::new("Cartridge freeze", MenuEffect::Freeze));
    menu.push(MenuEntry::new("Set current cartridge as default", MenuEffect::SetDefault));
    menu.push(MenuEntry::new(
        "Reset on cartridge change",
        MenuEffect::ToggleResource(CARTRIDGE_RESET.name),
    ));
    menu
}
