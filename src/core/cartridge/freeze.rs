//! Hidden/mapped freeze switch shared by freeze cartridges.

use crate::core::cartridge::{CartridgeHost, ModelId};
use crate::core::memory::MemConfig;
use log::debug;

/// Result of moving the switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchEdge {
    /// Same position, or the cart is disabled: nothing was signalled
    Unchanged,
    /// Hidden -> mapped: the mapped config was applied and the freeze raised
    Raised,
    /// Mapped -> hidden: the hidden config was applied and the freeze released
    Lowered,
}

/// Physical switch state plus the two bus configurations it selects
#[derive(Debug, Clone, Copy)]
pub struct FreezeSwitch {
    on: bool,
    mapped: MemConfig,
    hidden: MemConfig,
}

impl FreezeSwitch {
    pub fn new(mapped: MemConfig, hidden: MemConfig) -> Self {
        Self {
            on: false,
            mapped,
            hidden,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Config the switch currently selects
    pub fn config(&self) -> MemConfig {
        if self.on {
            self.mapped
        } else {
            self.hidden
        }
    }

    /// Move the switch. The position is always stored; bus effects only
    /// happen on an actual edge while the cart is enabled.
    pub fn set(
        &mut self,
        on: bool,
        enabled: bool,
        owner: ModelId,
        host: &mut dyn CartridgeHost,
    ) -> SwitchEdge {
        let was_on = self.on;
        self.on = on;

        if !enabled || was_on == on {
            return SwitchEdge::Unchanged;
        }

        if on {
            debug!("{} switch mapped: freeze", owner);
            host.config_changed(owner, self.mapped);
            host.trigger_freeze();
            SwitchEdge::Raised
        } else {
            debug!("{} switch hidden: release", owner);
            host.config_changed(owner, self.hidden);
            host.release_freeze();
            SwitchEdge::Lowered
        }
    }

    /// Store a position without any bus effect (snapshot restore)
    pub fn restore(&mut self, on: bool) {
        self.on = on;
    }

    /// Cart just became enabled: map in if the switch is already on, no freeze
    pub fn apply_enable(&self, owner: ModelId, host: &mut dyn CartridgeHost) {
        if self.on {
            host.config_changed(owner, self.mapped);
        }
    }

    /// Cart is about to be disabled: undo the mapping and release the freeze
    pub fn apply_disable(&self, owner: ModelId, host: &mut dyn CartridgeHost) {
        if self.on {
            host.config_changed(owner, self.hidden);
            host.release_freeze();
        }
    }
}
