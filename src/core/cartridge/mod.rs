// c64cart-rs/src/core/cartridge/mod.rs

//! Expansion-port cartridge module
//!
//! Every concrete cartridge model plugs in through the [`Cartridge`] trait and
//! is created by [`create_model`]. The rest of the system (bus, manager,
//! snapshot code, front ends) only ever talks to that generic surface.

pub mod bank;
pub mod freeze;
pub mod image;
pub mod isepic;
pub mod manager;
pub mod resources;
pub mod snapshot;

// Re-export main types for easier access
pub use bank::BankWindow;
pub use freeze::{FreezeSwitch, SwitchEdge};
pub use image::{CartImage, CrtChip, ImageKind};
pub use isepic::Isepic;
pub use manager::{CartridgeManager, ControlHandle, ControlRequest, DefaultCartridge};
pub use resources::{CmdlineOption, ResourceKind, ResourceSpec};
pub use snapshot::SnapshotRecord;

use crate::core::memory::{IoSource, IoSourceId, IoTarget, MemConfig, MemRegion, MemoryError};
use log::info;
use std::path::Path;

/// Cartridge model enumeration (one variant per supported model)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelId {
    /// ISEPIC: 2 KB RAM freeze cartridge with a hidden/mapped switch
    Isepic,
}

impl ModelId {
    /// Every model known to the registry
    pub const ALL: &'static [ModelId] = &[ModelId::Isepic];

    /// Short name, also used as the enable resource name
    pub fn name(self) -> &'static str {
        match self {
            ModelId::Isepic => "ISEPIC",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<ModelId> {
        ModelId::ALL
            .iter()
            .copied()
            .find(|model| model.name().eq_ignore_ascii_case(name))
    }

    /// Resources the model exposes to the configuration layer
    pub fn resources(self) -> &'static [ResourceSpec] {
        match self {
            ModelId::Isepic => isepic::ISEPIC_RESOURCES,
        }
    }

    /// Command-line toggles the model contributes
    pub fn cmdline_options(self) -> &'static [CmdlineOption] {
        match self {
            ModelId::Isepic => isepic::ISEPIC_CMDLINE,
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors reported by the cartridge subsystem. None of them is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeError {
    /// Onboard memory could not be allocated; the cart stays disabled
    OutOfMemory,
    /// The image given to attach is malformed or does not fit the model
    InvalidImage,
    /// Snapshot written by an incompatible format version
    UnsupportedSnapshotVersion,
    /// Snapshot truncated, for another module, or with the wrong memory size
    InvalidSnapshot,
    /// Snapshots are only written for enabled cartridges
    NotEnabled,
    UnknownResource,
    InvalidResourceValue,
    UnknownModel,
}

impl std::fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartridgeError::OutOfMemory => write!(f, "out of memory while enabling cartridge"),
            CartridgeError::InvalidImage => write!(f, "invalid cartridge image"),
            CartridgeError::UnsupportedSnapshotVersion => write!(f, "unsupported snapshot version"),
            CartridgeError::InvalidSnapshot => write!(f, "invalid snapshot record"),
            CartridgeError::NotEnabled => write!(f, "cartridge is not enabled"),
            CartridgeError::UnknownResource => write!(f, "unknown resource"),
            CartridgeError::InvalidResourceValue => write!(f, "invalid resource value"),
            CartridgeError::UnknownModel => write!(f, "unknown cartridge model"),
        }
    }
}

impl std::error::Error for CartridgeError {}

impl From<MemoryError> for CartridgeError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::OutOfMemory => CartridgeError::OutOfMemory,
            MemoryError::SaveError => CartridgeError::InvalidImage,
        }
    }
}

/// Result type for cartridge operations
pub type CartridgeResult<T> = Result<T, CartridgeError>;

/// What a cartridge needs from the machine it is plugged into.
///
/// The memory bus implements this; cartridges receive it by reference on
/// every call that can have a machine-visible effect.
pub trait CartridgeHost {
    /// Claim an I/O range; the returned id is the only handle the cart keeps
    fn io_register(&mut self, source: IoSource) -> IoSourceId;

    fn io_unregister(&mut self, id: IoSourceId) -> bool;

    /// The cart changed its GAME/EXROM configuration
    fn config_changed(&mut self, owner: ModelId, config: MemConfig);

    /// Assert the freeze NMI (single fire)
    fn trigger_freeze(&mut self);

    /// Release a pending freeze
    fn release_freeze(&mut self);

    /// Plain system memory, as seen without the Ultimax overlay
    fn read_without_ultimax(&self, addr: u16) -> u8;

    fn store_without_ultimax(&mut self, addr: u16, value: u8);

    /// Ask for a machine reset at the next opportunity
    fn request_reset(&mut self) {}
}

/// Common interface of every cartridge model.
///
/// Bus handlers take the full CPU address. The fallthrough handlers default to
/// the host's non-Ultimax memory; models only override what they intercept.
pub trait Cartridge {
    fn model(&self) -> ModelId;

    fn is_enabled(&self) -> bool;

    /// Enable or disable the cart. Redundant calls are no-ops.
    fn set_enabled(&mut self, enabled: bool, host: &mut dyn CartridgeHost) -> CartridgeResult<()>;

    /// Current value of a resource, `None` if the model has no such resource
    fn resource(&self, kind: ResourceKind) -> Option<i32>;

    fn set_resource(
        &mut self,
        kind: ResourceKind,
        value: i32,
        host: &mut dyn CartridgeHost,
    ) -> CartridgeResult<()>;

    /// Validate `image`, enable the cart and load the image contents.
    /// On error nothing has changed.
    fn load_image(&mut self, image: &CartImage, host: &mut dyn CartridgeHost) -> CartridgeResult<()>;

    /// Write the onboard memory back out as a raw image
    fn save_image(&self, path: &Path) -> CartridgeResult<()>;

    /// Front-end freeze button. Returns `true` if a freeze was raised.
    fn freeze(&mut self, _host: &mut dyn CartridgeHost) -> bool {
        false
    }

    /// Power-on/reset of the cart's own registers
    fn reset(&mut self) {}

    // --- I/O handlers ---

    fn reg_read(&mut self, addr: u16) -> u8;
    fn reg_store(&mut self, addr: u16, value: u8);
    fn window_read(&mut self, addr: u16) -> u8;
    fn window_store(&mut self, addr: u16, value: u8);

    /// Whether the last read on `target` drove the data bus
    fn io_read_valid(&self, target: IoTarget) -> bool;

    fn io_read(&mut self, target: IoTarget, addr: u16) -> u8 {
        match target {
            IoTarget::Register => self.reg_read(addr),
            IoTarget::Window => self.window_read(addr),
        }
    }

    fn io_store(&mut self, target: IoTarget, addr: u16, value: u8) {
        match target {
            IoTarget::Register => self.reg_store(addr, value),
            IoTarget::Window => self.window_store(addr, value),
        }
    }

    // --- Ultimax fallthrough handlers ---

    fn roml_read(&mut self, addr: u16, host: &dyn CartridgeHost) -> u8 {
        host.read_without_ultimax(addr)
    }

    fn roml_store(&mut self, addr: u16, value: u8, host: &mut dyn CartridgeHost) {
        host.store_without_ultimax(addr, value);
    }

    fn romh_read(&mut self, addr: u16, host: &dyn CartridgeHost) -> u8 {
        host.read_without_ultimax(addr)
    }

    fn romh_store(&mut self, addr: u16, value: u8, host: &mut dyn CartridgeHost) {
        host.store_without_ultimax(addr, value);
    }

    fn ram_1000_7fff_read(&mut self, addr: u16, host: &dyn CartridgeHost) -> u8 {
        host.read_without_ultimax(addr)
    }

    fn ram_1000_7fff_store(&mut self, addr: u16, value: u8, host: &mut dyn CartridgeHost) {
        host.store_without_ultimax(addr, value);
    }

    fn ram_a000_bfff_read(&mut self, addr: u16, host: &dyn CartridgeHost) -> u8 {
        host.read_without_ultimax(addr)
    }

    fn ram_a000_bfff_store(&mut self, addr: u16, value: u8, host: &mut dyn CartridgeHost) {
        host.store_without_ultimax(addr, value);
    }

    fn ram_c000_cfff_read(&mut self, addr: u16, host: &dyn CartridgeHost) -> u8 {
        host.read_without_ultimax(addr)
    }

    fn ram_c000_cfff_store(&mut self, addr: u16, value: u8, host: &mut dyn CartridgeHost) {
        host.store_without_ultimax(addr, value);
    }

    /// Route an Ultimax-mode read to the matching fallthrough handler
    fn ultimax_read(&mut self, region: MemRegion, addr: u16, host: &dyn CartridgeHost) -> u8 {
        match region {
            MemRegion::RomL => self.roml_read(addr, host),
            MemRegion::RomH => self.romh_read(addr, host),
            MemRegion::Unmapped1000 => self.ram_1000_7fff_read(addr, host),
            MemRegion::UnmappedA000 => self.ram_a000_bfff_read(addr, host),
            MemRegion::UnmappedC000 => self.ram_c000_cfff_read(addr, host),
            _ => host.read_without_ultimax(addr),
        }
    }

    fn ultimax_store(&mut self, region: MemRegion, addr: u16, value: u8, host: &mut dyn CartridgeHost) {
        match region {
            MemRegion::RomL => self.roml_store(addr, value, host),
            MemRegion::RomH => self.romh_store(addr, value, host),
            MemRegion::Unmapped1000 => self.ram_1000_7fff_store(addr, value, host),
            MemRegion::UnmappedA000 => self.ram_a000_bfff_store(addr, value, host),
            MemRegion::UnmappedC000 => self.ram_c000_cfff_store(addr, value, host),
            _ => host.store_without_ultimax(addr, value),
        }
    }

    // --- Snapshots ---

    /// Serialize the full cart state. Only valid while enabled.
    fn snapshot_write(&self) -> CartridgeResult<Vec<u8>>;

    /// Check a saved record without touching the cart
    fn snapshot_check(&self, data: &[u8]) -> CartridgeResult<()>;

    /// Replace the cart state with a saved record. On error nothing has changed.
    fn snapshot_read(&mut self, data: &[u8], host: &mut dyn CartridgeHost) -> CartridgeResult<()>;
}

/// Model factory function
pub fn create_model(model: ModelId) -> Box<dyn Cartridge> {
    match model {
        ModelId::Isepic => {
            info!("Creating ISEPIC cartridge");
            Box::new(Isepic::new())
        }
    }
}

/// Recording host shared by the cartridge tests
#[cfg(test)]
pub(crate) mod test_host {
    use super::*;
    use crate::core::memory::IoRegistry;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HostEvent {
        Config(ModelId, MemConfig),
        Trigger,
        Release,
        Reset,
    }

    pub struct RecordingHost {
        pub io: IoRegistry,
        pub ram: Vec<u8>,
        pub events: Vec<HostEvent>,
    }

    impl RecordingHost {
        pub fn new() -> Self {
            Self {
                io: IoRegistry::new(),
                ram: vec![0; 0x10000],
                events: Vec::new(),
            }
        }

        pub fn count(&self, event: &HostEvent) -> usize {
            self.events.iter().filter(|e| *e == event).count()
        }

        pub fn triggers(&self) -> usize {
            self.count(&HostEvent::Trigger)
        }

        pub fn releases(&self) -> usize {
            self.count(&HostEvent::Release)
        }

        pub fn last_config(&self) -> Option<MemConfig> {
            self.events.iter().rev().find_map(|e| match e {
                HostEvent::Config(_, config) => Some(*config),
                _ => None,
            })
        }
    }

    impl CartridgeHost for RecordingHost {
        fn io_register(&mut self, source: IoSource) -> IoSourceId {
            self.io.register(source)
        }

        fn io_unregister(&mut self, id: IoSourceId) -> bool {
            self.io.unregister(id)
        }

        fn config_changed(&mut self, owner: ModelId, config: MemConfig) {
            self.events.push(HostEvent::Config(owner, config));
        }

        fn trigger_freeze(&mut self) {
            self.events.push(HostEvent::Trigger);
        }

        fn release_freeze(&mut self) {
            self.events.push(HostEvent::Release);
        }

        fn read_without_ultimax(&self, addr: u16) -> u8 {
            self.ram[addr as usize]
        }

        fn store_without_ultimax(&mut self, addr: u16, value: u8) {
            self.ram[addr as usize] = value;
        }

        fn request_reset(&mut self) {
            self.events.push(HostEvent::Reset);
        }
    }
}
