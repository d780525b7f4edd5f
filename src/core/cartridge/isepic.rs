//! ISEPIC freeze cartridge
//!
//! 2 KB of RAM seen through the I/O-2 window one 256-byte page at a time.
//! The page is latched from the address lines of any access to I/O-1, and a
//! switch on the cart maps it into the Ultimax overlay and raises a freeze NMI.
//!
//! While mapped, the NMI vector at `$FFFA/$FFFB` is served from the current
//! page, so the frozen CPU jumps into code kept in cart RAM.

use crate::core::cartridge::bank::{isepic_page, BankWindow};
use crate::core::cartridge::freeze::FreezeSwitch;
use crate::core::cartridge::image::CartImage;
use crate::core::cartridge::resources::{self, CmdlineOption, ResourceKind, ResourceSpec};
use crate::core::cartridge::snapshot::SnapshotRecord;
use crate::core::cartridge::{Cartridge, CartridgeError, CartridgeHost, CartridgeResult, ModelId};
use crate::core::memory::{
    IoFlags, IoSource, IoSourceId, IoTarget, MemConfig, MemoryResult, OnboardRam, BUS_FLOATING,
    IO1_END, IO1_START, IO2_END, IO2_START, NMI_VECTOR_HI, NMI_VECTOR_LO,
};
use log::{info, warn};
use std::path::Path;

pub const ISEPIC_RAM_SIZE: usize = 2048;
pub const ISEPIC_PAGE_SIZE: usize = 256;
pub const ISEPIC_PAGE_COUNT: usize = ISEPIC_RAM_SIZE / ISEPIC_PAGE_SIZE;

/// Hardware type accepted in a `.crt` header. The format has no dedicated
/// ISEPIC id, RAM dumps are wrapped as generic carts.
pub const ISEPIC_CRT_ID: u16 = 0;

/// Snapshot module name
pub const SNAP_MODULE_NAME: &str = "CARTISEPIC";

pub const ISEPIC_RESOURCES: &[ResourceSpec] = &[
    ResourceSpec { name: "ISEPIC", kind: ResourceKind::Enabled, default: 0 },
    ResourceSpec { name: "ISEPICSwitch", kind: ResourceKind::Switch, default: 0 },
];

pub const ISEPIC_CMDLINE: &[CmdlineOption] = &[
    CmdlineOption {
        name: "-isepic",
        resource: "ISEPIC",
        value: 1,
        description: "Enable the ISEPIC cartridge",
    },
    CmdlineOption {
        name: "+isepic",
        resource: "ISEPIC",
        value: 0,
        description: "Disable the ISEPIC cartridge",
    },
];

/// Register range: 8 registers mirrored over I/O-1, never drives the bus
fn io1_device() -> IoSource {
    IoSource {
        name: "ISEPIC",
        start: IO1_START,
        end: IO1_END,
        mask: 0x07,
        flags: IoFlags::empty(),
        owner: ModelId::Isepic,
        target: IoTarget::Register,
    }
}

/// RAM window over I/O-2, valid per access
fn io2_device() -> IoSource {
    IoSource {
        name: "ISEPIC",
        start: IO2_START,
        end: IO2_END,
        mask: 0xFF,
        flags: IoFlags::empty(),
        owner: ModelId::Isepic,
        target: IoTarget::Window,
    }
}

/// State that exists only while the cart is enabled
struct Attached {
    ram: OnboardRam,
    io1: IoSourceId,
    io2: IoSourceId,
}

type RamAllocator = fn(usize) -> MemoryResult<OnboardRam>;

pub struct Isepic {
    attached: Option<Attached>,
    switch: FreezeSwitch,
    bank: BankWindow,
    window_valid: bool,
    ram_size: usize,
    allocator: RamAllocator,
}

impl Isepic {
    pub fn new() -> Self {
        Self {
            attached: None,
            switch: FreezeSwitch::new(MemConfig::ULTIMAX_PHI2, MemConfig::RAM),
            bank: BankWindow::new(ISEPIC_PAGE_COUNT, ISEPIC_PAGE_SIZE, isepic_page),
            window_valid: false,
            ram_size: ISEPIC_RAM_SIZE,
            allocator: OnboardRam::allocate,
        }
    }

    #[cfg(test)]
    fn with_ram_size(ram_size: usize) -> Self {
        Self { ram_size, ..Self::new() }
    }

    pub fn switch_on(&self) -> bool {
        self.switch.is_on()
    }

    pub fn page(&self) -> usize {
        self.bank.page()
    }

    /// Onboard RAM, `None` while disabled
    pub fn ram(&self) -> Option<&[u8]> {
        self.attached.as_ref().map(|a| a.ram.as_slice())
    }

    /// Move the physical switch
    pub fn set_switch(&mut self, on: bool, host: &mut dyn CartridgeHost) {
        let enabled = self.attached.is_some();
        self.switch.set(on, enabled, ModelId::Isepic, host);
    }

    fn enable(&mut self, host: &mut dyn CartridgeHost) -> CartridgeResult<()> {
        if self.attached.is_some() {
            return Ok(());
        }

        // Allocate before touching the bus so a failure leaves nothing behind
        let ram = (self.allocator)(self.ram_size).map_err(|e| {
            warn!("ISEPIC: cannot allocate {} bytes of RAM", self.ram_size);
            CartridgeError::from(e)
        })?;

        let io1 = host.io_register(io1_device());
        let io2 = host.io_register(io2_device());
        self.attached = Some(Attached { ram, io1, io2 });
        self.bank.reset();
        self.window_valid = false;

        self.switch.apply_enable(ModelId::Isepic, host);
        info!("ISEPIC enabled (switch {})", if self.switch.is_on() { "on" } else { "off" });
        Ok(())
    }

    fn disable(&mut self, host: &mut dyn CartridgeHost) {
        let Some(attached) = self.attached.take() else {
            return;
        };

        self.switch.apply_disable(ModelId::Isepic, host);
        host.io_unregister(attached.io1);
        host.io_unregister(attached.io2);
        self.window_valid = false;
        info!("ISEPIC disabled");
    }

    fn select_page(&mut self, addr: u16) {
        if self.switch.is_on() && self.attached.is_some() {
            let page = self.bank.select_page(addr);
            io_trace!("ISEPIC: page {} selected by ${:04X}", page, addr);
        }
    }

    /// RAM offset for a vector fetch, when the cart is mapped
    fn vector_offset(&self, addr: u16) -> Option<usize> {
        let is_vector = addr == NMI_VECTOR_LO || addr == NMI_VECTOR_HI;
        if is_vector && self.switch.is_on() && self.attached.is_some() {
            Some(self.bank.window_offset(addr))
        } else {
            None
        }
    }
}

impl Default for Isepic {
    fn default() -> Self {
        Self::new()
    }
}

impl Cartridge for Isepic {
    fn model(&self) -> ModelId {
        ModelId::Isepic
    }

    fn is_enabled(&self) -> bool {
        self.attached.is_some()
    }

    fn set_enabled(&mut self, enabled: bool, host: &mut dyn CartridgeHost) -> CartridgeResult<()> {
        if enabled {
            self.enable(host)
        } else {
            self.disable(host);
            Ok(())
        }
    }

    fn resource(&self, kind: ResourceKind) -> Option<i32> {
        match kind {
            ResourceKind::Enabled => Some(self.is_enabled() as i32),
            ResourceKind::Switch => Some(self.switch.is_on() as i32),
            ResourceKind::Mode => None,
        }
    }

    fn set_resource(
        &mut self,
        kind: ResourceKind,
        value: i32,
        host: &mut dyn CartridgeHost,
    ) -> CartridgeResult<()> {
        match kind {
            ResourceKind::Enabled => self.set_enabled(resources::bool_value(value)?, host),
            ResourceKind::Switch => {
                self.set_switch(resources::bool_value(value)?, host);
                Ok(())
            }
            ResourceKind::Mode => Err(CartridgeError::UnknownResource),
        }
    }

    fn load_image(&mut self, image: &CartImage, host: &mut dyn CartridgeHost) -> CartridgeResult<()> {
        if let Some(hw_type) = image.hw_type.filter(|&t| t != ISEPIC_CRT_ID) {
            warn!("ISEPIC: .crt hardware type {} not supported", hw_type);
            return Err(CartridgeError::InvalidImage);
        }

        let contents = image.contents();
        if contents.len() != self.ram_size {
            warn!(
                "ISEPIC image is {} bytes, expected {}",
                contents.len(),
                self.ram_size
            );
            return Err(CartridgeError::InvalidImage);
        }

        self.enable(host)?;
        if let Some(attached) = self.attached.as_mut() {
            attached.ram.fill_from(&contents);
        }
        info!("ISEPIC RAM loaded from {:?} image", image.kind);
        Ok(())
    }

    fn save_image(&self, path: &Path) -> CartridgeResult<()> {
        let attached = self.attached.as_ref().ok_or(CartridgeError::NotEnabled)?;
        attached.ram.save_to_file(path)?;
        Ok(())
    }

    fn freeze(&mut self, host: &mut dyn CartridgeHost) -> bool {
        if self.attached.is_none() || self.switch.is_on() {
            return false;
        }
        self.set_switch(true, host);
        true
    }

    fn reg_read(&mut self, addr: u16) -> u8 {
        self.select_page(addr);
        BUS_FLOATING
    }

    fn reg_store(&mut self, addr: u16, _value: u8) {
        self.select_page(addr);
    }

    fn window_read(&mut self, addr: u16) -> u8 {
        self.window_valid = false;
        if !self.switch.is_on() {
            return BUS_FLOATING;
        }

        let offset = self.bank.window_offset(addr);
        match self.attached.as_ref() {
            Some(attached) => {
                self.window_valid = true;
                let value = attached.ram.read_byte(offset);
                io_trace!("ISEPIC: read ${:04X} -> RAM ${:03X} = ${:02X}", addr, offset, value);
                value
            }
            None => BUS_FLOATING,
        }
    }

    fn window_store(&mut self, addr: u16, value: u8) {
        if !self.switch.is_on() {
            return;
        }

        let offset = self.bank.window_offset(addr);
        if let Some(attached) = self.attached.as_mut() {
            io_trace!("ISEPIC: write ${:04X} -> RAM ${:03X} = ${:02X}", addr, offset, value);
            attached.ram.write_byte(offset, value);
        }
    }

    fn io_read_valid(&self, target: IoTarget) -> bool {
        match target {
            IoTarget::Register => false,
            IoTarget::Window => self.window_valid,
        }
    }

    fn romh_read(&mut self, addr: u16, host: &dyn CartridgeHost) -> u8 {
        match (self.vector_offset(addr), self.attached.as_ref()) {
            (Some(offset), Some(attached)) => attached.ram.read_byte(offset),
            _ => host.read_without_ultimax(addr),
        }
    }

    fn romh_store(&mut self, addr: u16, value: u8, host: &mut dyn CartridgeHost) {
        match (self.vector_offset(addr), self.attached.as_mut()) {
            (Some(offset), Some(attached)) => attached.ram.write_byte(offset, value),
            _ => host.store_without_ultimax(addr, value),
        }
    }

    fn snapshot_write(&self) -> CartridgeResult<Vec<u8>> {
        let attached = self.attached.as_ref().ok_or(CartridgeError::NotEnabled)?;
        let record = SnapshotRecord {
            enabled: true,
            switch_on: self.switch.is_on(),
            page: self.bank.page() as u32,
            memory: attached.ram.as_slice().to_vec(),
        };
        Ok(record.encode(SNAP_MODULE_NAME))
    }

    fn snapshot_check(&self, data: &[u8]) -> CartridgeResult<()> {
        SnapshotRecord::decode(data, SNAP_MODULE_NAME, self.ram_size).map(|_| ())
    }

    fn snapshot_read(&mut self, data: &[u8], host: &mut dyn CartridgeHost) -> CartridgeResult<()> {
        let record = SnapshotRecord::decode(data, SNAP_MODULE_NAME, self.ram_size)?;

        if !record.enabled {
            self.disable(host);
            self.switch.restore(record.switch_on);
            self.bank.set_page(record.page as usize);
            return Ok(());
        }

        if self.attached.is_some() {
            // Already on the bus: follow the saved switch without freeze signals
            if self.switch.is_on() != record.switch_on {
                self.switch.restore(record.switch_on);
                host.config_changed(ModelId::Isepic, self.switch.config());
            }
        } else {
            let previous = self.switch.is_on();
            self.switch.restore(record.switch_on);
            if let Err(e) = self.enable(host) {
                self.switch.restore(previous);
                return Err(e);
            }
        }

        if let Some(attached) = self.attached.as_mut() {
            attached.ram.fill_from(&record.memory);
        }
        self.bank.set_page(record.page as usize);
        self.window_valid = false;

        info!("ISEPIC state restored (page {}, switch {})", self.bank.page(), record.switch_on);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cartridge::test_host::{HostEvent, RecordingHost};
    use crate::core::cartridge::image::tests::build_crt;
    use crate::core::cartridge::snapshot::SNAP_MINOR;
    use crate::core::memory::MemoryError;

    fn enabled(host: &mut RecordingHost) -> Isepic {
        let mut cart = Isepic::new();
        cart.set_enabled(true, host).unwrap();
        cart
    }

    #[test]
    fn test_enable_registers_and_allocates() {
        let mut host = RecordingHost::new();
        let cart = enabled(&mut host);

        assert!(cart.is_enabled());
        assert_eq!(cart.ram().map(|r| r.len()), Some(ISEPIC_RAM_SIZE));
        assert_eq!(host.io.count_owned_by(ModelId::Isepic), 2);
        assert!(host.events.is_empty());
    }

    #[test]
    fn test_enable_disable_idempotent() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);

        cart.set_enabled(true, &mut host).unwrap();
        assert_eq!(host.io.len(), 2);

        cart.set_enabled(false, &mut host).unwrap();
        cart.set_enabled(false, &mut host).unwrap();
        assert!(host.io.is_empty());
        assert!(cart.ram().is_none());
        assert_eq!(host.releases(), 0);
    }

    #[test]
    fn test_allocation_failure_leaves_nothing() {
        let mut host = RecordingHost::new();
        let mut cart = Isepic::with_ram_size(usize::MAX);

        assert_eq!(cart.set_enabled(true, &mut host), Err(CartridgeError::OutOfMemory));
        assert!(!cart.is_enabled());
        assert!(host.io.is_empty());
        assert!(host.events.is_empty());
    }

    #[test]
    fn test_freeze_edge_fires_once() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);

        cart.set_switch(true, &mut host);
        cart.set_switch(true, &mut host);
        assert_eq!(host.triggers(), 1);
        assert_eq!(host.last_config(), Some(MemConfig::ULTIMAX_PHI2));

        cart.set_switch(false, &mut host);
        assert_eq!(host.releases(), 1);
        assert_eq!(host.last_config(), Some(MemConfig::RAM));
    }

    #[test]
    fn test_switch_while_disabled_has_no_effect() {
        let mut host = RecordingHost::new();
        let mut cart = Isepic::new();

        cart.set_switch(true, &mut host);
        assert!(cart.switch_on());
        assert!(host.events.is_empty());

        // Enabling with the switch on maps in without a trigger
        cart.set_enabled(true, &mut host).unwrap();
        assert_eq!(host.events, vec![HostEvent::Config(ModelId::Isepic, MemConfig::ULTIMAX_PHI2)]);

        // Disabling while mapped reverts and releases
        cart.set_enabled(false, &mut host).unwrap();
        assert_eq!(host.last_config(), Some(MemConfig::RAM));
        assert_eq!(host.releases(), 1);
        assert_eq!(host.triggers(), 0);
    }

    #[test]
    fn test_page_select_on_read_and_write() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        cart.set_switch(true, &mut host);

        assert_eq!(cart.reg_read(0xDE05), BUS_FLOATING);
        assert_eq!(cart.page(), 5);
        cart.reg_store(0xDE04, 0xFF);
        assert_eq!(cart.page(), 1);
        cart.reg_store(0xDE02, 0x00);
        assert_eq!(cart.page(), 2);
        assert!(!cart.io_read_valid(IoTarget::Register));
    }

    #[test]
    fn test_register_mirroring() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        cart.set_switch(true, &mut host);

        cart.reg_read(0xDE03);
        let first = cart.page();
        cart.reg_read(0xDE00);
        cart.reg_read(0xDE0B);
        assert_eq!(cart.page(), first);
    }

    #[test]
    fn test_registers_hidden_when_switch_off() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);

        cart.reg_store(0xDE05, 0);
        assert_eq!(cart.page(), 0);
    }

    #[test]
    fn test_window_access() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        cart.set_switch(true, &mut host);

        cart.reg_store(0xDE05, 0);
        cart.window_store(0xDF10, 0x42);
        assert_eq!(cart.window_read(0xDF10), 0x42);
        assert!(cart.io_read_valid(IoTarget::Window));
        assert_eq!(cart.ram().unwrap()[5 * 256 + 0x10], 0x42);

        // Other pages are untouched
        cart.reg_store(0xDE00, 0);
        assert_eq!(cart.window_read(0xDF10), 0x00);
    }

    #[test]
    fn test_hidden_window_isolation() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        cart.set_switch(true, &mut host);
        cart.window_store(0xDF00, 0x99);
        cart.window_read(0xDF00);
        assert!(cart.io_read_valid(IoTarget::Window));

        cart.set_switch(false, &mut host);
        assert_eq!(cart.window_read(0xDF00), BUS_FLOATING);
        assert!(!cart.io_read_valid(IoTarget::Window));

        // Writes while hidden are dropped
        cart.window_store(0xDF00, 0x11);
        cart.set_switch(true, &mut host);
        assert_eq!(cart.window_read(0xDF00), 0x99);
    }

    #[test]
    fn test_nmi_vector_interception() {
        let mut host = RecordingHost::new();
        host.ram[0xFFFA] = 0x43;
        host.ram[0xE000] = 0xEA;
        let mut cart = enabled(&mut host);

        // Hidden: vectors come from system memory
        assert_eq!(cart.romh_read(0xFFFA, &host), 0x43);

        cart.set_switch(true, &mut host);
        cart.reg_store(0xDE07, 0);
        cart.window_store(0xDFFA, 0x00);
        cart.window_store(0xDFFB, 0xDF);
        assert_eq!(cart.romh_read(0xFFFA, &host), 0x00);
        assert_eq!(cart.romh_read(0xFFFB, &host), 0xDF);
        assert_eq!(cart.romh_read(0xE000, &host), 0xEA);

        cart.romh_store(0xFFFA, 0x12, &mut host);
        assert_eq!(cart.window_read(0xDFFA), 0x12);
        assert_eq!(host.ram[0xFFFA], 0x43);
    }

    #[test]
    fn test_fallthrough_regions() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        cart.set_switch(true, &mut host);

        cart.roml_store(0x8000, 0x11, &mut host);
        cart.ram_1000_7fff_store(0x1234, 0x22, &mut host);
        cart.ram_a000_bfff_store(0xA000, 0x33, &mut host);
        cart.ram_c000_cfff_store(0xC000, 0x44, &mut host);

        assert_eq!(cart.roml_read(0x8000, &host), 0x11);
        assert_eq!(cart.ram_1000_7fff_read(0x1234, &host), 0x22);
        assert_eq!(cart.ram_a000_bfff_read(0xA000, &host), 0x33);
        assert_eq!(cart.ram_c000_cfff_read(0xC000, &host), 0x44);
    }

    #[test]
    fn test_disable_reenable_zeroes_ram() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        cart.set_switch(true, &mut host);
        cart.window_store(0xDF10, 0x42);

        cart.set_enabled(false, &mut host).unwrap();
        cart.set_enabled(true, &mut host).unwrap();
        assert!(cart.ram().unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_snapshot_restores_fresh_instance() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        cart.set_switch(true, &mut host);
        cart.reg_store(0xDE06, 0);
        cart.window_store(0xDF20, 0xA5);
        let data = cart.snapshot_write().unwrap();

        let mut other_host = RecordingHost::new();
        let mut fresh = Isepic::new();
        fresh.snapshot_read(&data, &mut other_host).unwrap();

        assert!(fresh.is_enabled());
        assert!(fresh.switch_on());
        assert_eq!(fresh.page(), cart.page());
        assert_eq!(fresh.ram(), cart.ram());
        assert_eq!(other_host.io.len(), 2);
        assert_eq!(other_host.triggers(), 0);
        assert_eq!(other_host.last_config(), Some(MemConfig::ULTIMAX_PHI2));
    }

    #[test]
    fn test_snapshot_requires_enabled() {
        let cart = Isepic::new();
        assert_eq!(cart.snapshot_write(), Err(CartridgeError::NotEnabled));
    }

    #[test]
    fn test_snapshot_bad_version_keeps_state() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        cart.set_switch(true, &mut host);
        cart.window_store(0xDF00, 0x77);
        let mut data = cart.snapshot_write().unwrap();
        data[17] = SNAP_MINOR + 1;

        let mut target = Isepic::new();
        assert_eq!(
            target.snapshot_read(&data, &mut host),
            Err(CartridgeError::UnsupportedSnapshotVersion)
        );
        assert!(!target.is_enabled());
        assert!(!target.switch_on());
    }

    #[test]
    fn test_snapshot_out_of_memory_keeps_switch() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        cart.set_switch(true, &mut host);
        let data = cart.snapshot_write().unwrap();

        let mut other_host = RecordingHost::new();
        let mut target = Isepic { allocator: |_| Err(MemoryError::OutOfMemory), ..Isepic::new() };
        assert_eq!(
            target.snapshot_read(&data, &mut other_host),
            Err(CartridgeError::OutOfMemory)
        );
        assert!(!target.switch_on());
        assert!(!target.is_enabled());
        assert!(other_host.io.is_empty());
        assert!(other_host.events.is_empty());
    }

    #[test]
    fn test_snapshot_switch_change_on_enabled() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        let hidden = cart.snapshot_write().unwrap();

        cart.set_switch(true, &mut host);
        host.events.clear();
        cart.snapshot_read(&hidden, &mut host).unwrap();

        assert!(!cart.switch_on());
        assert_eq!(host.events, vec![HostEvent::Config(ModelId::Isepic, MemConfig::RAM)]);
    }

    #[test]
    fn test_load_image() {
        let mut host = RecordingHost::new();
        let mut cart = Isepic::new();

        let bad = CartImage::load_from_buffer(&[1u8; 100]).unwrap();
        assert_eq!(cart.load_image(&bad, &mut host), Err(CartridgeError::InvalidImage));
        assert!(!cart.is_enabled());
        assert!(host.io.is_empty());

        let data: Vec<u8> = (0..ISEPIC_RAM_SIZE).map(|i| (i >> 8) as u8).collect();
        let crt = CartImage::load_from_buffer(&build_crt(0, &[data.as_slice()])).unwrap();
        cart.load_image(&crt, &mut host).unwrap();
        assert!(cart.is_enabled());
        assert_eq!(cart.ram().unwrap()[3 * 256], 3);
    }

    #[test]
    fn test_load_image_rejects_other_crt_type() {
        let mut host = RecordingHost::new();
        let mut cart = Isepic::new();

        let data = [0x11u8; ISEPIC_RAM_SIZE];
        let crt = CartImage::load_from_buffer(&build_crt(42, &[&data[..]])).unwrap();
        assert_eq!(cart.load_image(&crt, &mut host), Err(CartridgeError::InvalidImage));
        assert!(!cart.is_enabled());
        assert!(host.io.is_empty());
        assert!(host.events.is_empty());
    }

    #[test]
    fn test_save_image() {
        let mut host = RecordingHost::new();
        let mut cart = enabled(&mut host);
        cart.set_switch(true, &mut host);
        cart.window_store(0xDF01, 0xC3);

        let path = std::env::temp_dir().join(format!("c64cart_isepic_{}.bin", std::process::id()));
        cart.save_image(&path).unwrap();
        let saved = std::fs::read(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(saved.len(), ISEPIC_RAM_SIZE);
        assert_eq!(saved[1], 0xC3);
    }

    #[test]
    fn test_manual_freeze() {
        let mut host = RecordingHost::new();
        let mut cart = Isepic::new();
        assert!(!cart.freeze(&mut host));

        cart.set_enabled(true, &mut host).unwrap();
        assert!(cart.freeze(&mut host));
        assert!(!cart.freeze(&mut host));
        assert_eq!(host.triggers(), 1);
    }

    #[test]
    fn test_resources() {
        let mut host = RecordingHost::new();
        let mut cart = Isepic::new();
        assert_eq!(cart.resource(ResourceKind::Enabled), Some(0));
        assert_eq!(cart.resource(ResourceKind::Mode), None);

        cart.set_resource(ResourceKind::Enabled, 1, &mut host).unwrap();
        cart.set_resource(ResourceKind::Switch, 1, &mut host).unwrap();
        assert_eq!(cart.resource(ResourceKind::Switch), Some(1));
        assert_eq!(
            cart.set_resource(ResourceKind::Switch, 3, &mut host),
            Err(CartridgeError::InvalidResourceValue)
        );
        assert_eq!(
            cart.set_resource(ResourceKind::Mode, 0, &mut host),
            Err(CartridgeError::UnknownResource)
        );
    }
}
