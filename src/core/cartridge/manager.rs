// c64cart-rs/src/core/cartridge/manager.rs

//! Attach/detach surface and resource routing for every cartridge model.
//!
//! Requests from other threads (a UI, a remote monitor) go through a
//! [`ControlHandle`] and are applied by [`CartridgeManager::apply_pending`]
//! at an instruction boundary, never in the middle of a bus access.

use crate::core::cartridge::image::CartImage;
use crate::core::cartridge::resources::{self, CmdlineOption, CARTRIDGE_RESET};
use crate::core::cartridge::{
    create_model, Cartridge, CartridgeError, CartridgeHost, CartridgeResult, ModelId,
};
use crate::core::memory::{IoTarget, MemRegion, BUS_FLOATING};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Cartridge to attach on start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultCartridge {
    pub model: ModelId,
    pub image: Option<PathBuf>,
}

/// Request posted from outside the emulation loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    SetResource { name: String, value: i32 },
    Attach { model: ModelId, image: Option<PathBuf> },
    Detach,
    Freeze,
    SetDefault,
}

/// Cloneable sender for [`ControlRequest`]s
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: Sender<ControlRequest>,
}

impl ControlHandle {
    /// Queue a request. Returns `false` if the manager is gone.
    pub fn send(&self, request: ControlRequest) -> bool {
        self.tx.send(request).is_ok()
    }

    pub fn set_resource(&self, name: &str, value: i32) -> bool {
        self.send(ControlRequest::SetResource { name: name.to_string(), value })
    }

    pub fn attach(&self, model: ModelId, image: Option<PathBuf>) -> bool {
        self.send(ControlRequest::Attach { model, image })
    }

    pub fn detach(&self) -> bool {
        self.send(ControlRequest::Detach)
    }

    pub fn freeze(&self) -> bool {
        self.send(ControlRequest::Freeze)
    }

    pub fn set_default(&self) -> bool {
        self.send(ControlRequest::SetDefault)
    }
}

struct Slot {
    cart: Box<dyn Cartridge>,
    image: Option<PathBuf>,
}

/// Owns one instance of every model
pub struct CartridgeManager {
    slots: Vec<Slot>,
    active: Option<ModelId>,
    default: Option<DefaultCartridge>,
    reset_on_change: bool,
    tx: Sender<ControlRequest>,
    rx: Receiver<ControlRequest>,
}

impl CartridgeManager {
    pub fn new() -> Self {
        let slots = ModelId::ALL
            .iter()
            .map(|&model| Slot { cart: create_model(model), image: None })
            .collect();
        let (tx, rx) = mpsc::channel();

        Self {
            slots,
            active: None,
            default: None,
            reset_on_change: CARTRIDGE_RESET.default != 0,
            tx,
            rx,
        }
    }

    pub fn control_handle(&self) -> ControlHandle {
        ControlHandle { tx: self.tx.clone() }
    }

    fn slot_mut(&mut self, model: ModelId) -> CartridgeResult<&mut Slot> {
        self.slots
            .iter_mut()
            .find(|slot| slot.cart.model() == model)
            .ok_or(CartridgeError::UnknownModel)
    }

    pub fn get_cart(&self, model: ModelId) -> Option<&dyn Cartridge> {
        self.slots
            .iter()
            .find(|slot| slot.cart.model() == model)
            .map(|slot| slot.cart.as_ref())
    }

    pub fn get_cart_mut(&mut self, model: ModelId) -> Option<&mut dyn Cartridge> {
        let slot = self.slots.iter_mut().find(|slot| slot.cart.model() == model)?;
        Some(slot.cart.as_mut())
    }

    /// Most recently attached model still enabled
    pub fn active_model(&self) -> Option<ModelId> {
        self.active
    }

    pub fn enabled_models(&self) -> Vec<ModelId> {
        self.slots
            .iter()
            .filter(|slot| slot.cart.is_enabled())
            .map(|slot| slot.cart.model())
            .collect()
    }

    /// Image path the model was attached with
    pub fn image_path(&self, model: ModelId) -> Option<&Path> {
        self.slots
            .iter()
            .find(|slot| slot.cart.model() == model)
            .and_then(|slot| slot.image.as_deref())
    }

    /// Attach a model, optionally loading an image into it.
    /// On error the cart is left as it was.
    pub fn attach(
        &mut self,
        model: ModelId,
        image: Option<&Path>,
        host: &mut dyn CartridgeHost,
    ) -> CartridgeResult<()> {
        let parsed = match image {
            Some(path) => Some(CartImage::load_from_file(path)?),
            None => None,
        };

        let reset = self.reset_on_change;
        let slot = self.slot_mut(model)?;
        match parsed.as_ref() {
            Some(img) => slot.cart.load_image(img, host)?,
            None => slot.cart.set_enabled(true, host)?,
        }
        slot.image = image.map(Path::to_path_buf);
        self.active = Some(model);

        info!("Cartridge {} attached", model);
        if reset {
            host.request_reset();
        }
        Ok(())
    }

    /// Detach every enabled cartridge
    pub fn detach(&mut self, host: &mut dyn CartridgeHost) {
        let mut detached = false;
        for slot in self.slots.iter_mut().filter(|slot| slot.cart.is_enabled()) {
            if let Err(e) = slot.cart.set_enabled(false, host) {
                warn!("Cartridge {} failed to detach: {}", slot.cart.model(), e);
                continue;
            }
            slot.image = None;
            detached = true;
            info!("Cartridge {} detached", slot.cart.model());
        }
        self.active = None;

        if detached && self.reset_on_change {
            host.request_reset();
        }
    }

    /// Detach a single model
    pub fn detach_model(&mut self, model: ModelId, host: &mut dyn CartridgeHost) -> CartridgeResult<()> {
        let reset = self.reset_on_change;
        let slot = self.slot_mut(model)?;
        if !slot.cart.is_enabled() {
            return Ok(());
        }

        slot.cart.set_enabled(false, host)?;
        slot.image = None;
        if self.active == Some(model) {
            self.active = None;
        }

        info!("Cartridge {} detached", model);
        if reset {
            host.request_reset();
        }
        Ok(())
    }

    /// Remember the active cartridge as the one to attach on start.
    /// With nothing attached the default is cleared.
    pub fn set_default(&mut self) -> Option<&DefaultCartridge> {
        self.default = self.active.map(|model| DefaultCartridge {
            model,
            image: self.image_path(model).map(Path::to_path_buf),
        });

        match &self.default {
            Some(default) => info!("Default cartridge set to {}", default.model),
            None => info!("Default cartridge cleared"),
        }
        self.default.as_ref()
    }

    pub fn default_cartridge(&self) -> Option<&DefaultCartridge> {
        self.default.as_ref()
    }

    /// Restore a default loaded from persistent settings
    pub fn restore_default(&mut self, default: Option<DefaultCartridge>) {
        self.default = default;
    }

    /// Attach the default cartridge, if any. Returns whether one was attached.
    pub fn attach_default(&mut self, host: &mut dyn CartridgeHost) -> CartridgeResult<bool> {
        let Some(default) = self.default.clone() else {
            return Ok(false);
        };
        self.attach(default.model, default.image.as_deref(), host)?;
        Ok(true)
    }

    /// Read a resource by name
    pub fn resource(&self, name: &str) -> CartridgeResult<i32> {
        if name.eq_ignore_ascii_case(CARTRIDGE_RESET.name) {
            return Ok(self.reset_on_change as i32);
        }

        for slot in &self.slots {
            if let Some(spec) = resources::find(slot.cart.model().resources(), name) {
                return slot.cart.resource(spec.kind).ok_or(CartridgeError::UnknownResource);
            }
        }
        Err(CartridgeError::UnknownResource)
    }

    /// Write a resource by name
    pub fn set_resource(
        &mut self,
        name: &str,
        value: i32,
        host: &mut dyn CartridgeHost,
    ) -> CartridgeResult<()> {
        if name.eq_ignore_ascii_case(CARTRIDGE_RESET.name) {
            self.reset_on_change = resources::bool_value(value)?;
            return Ok(());
        }

        let mut result = Err(CartridgeError::UnknownResource);
        let mut enabled_model = None;
        for slot in self.slots.iter_mut() {
            let model = slot.cart.model();
            if let Some(spec) = resources::find(model.resources(), name) {
                result = slot.cart.set_resource(spec.kind, value, host);
                if result.is_ok() && slot.cart.is_enabled() {
                    enabled_model = Some(model);
                } else if !slot.cart.is_enabled() {
                    slot.image = None;
                }
                break;
            }
        }

        if result.is_err() {
            warn!("Resource {}={} rejected: {:?}", name, value, result);
        }
        match enabled_model {
            Some(model) if self.active.is_none() => self.active = Some(model),
            None if self.active.map_or(false, |m| !self.is_enabled(m)) => self.active = None,
            _ => {}
        }
        result
    }

    fn is_enabled(&self, model: ModelId) -> bool {
        self.get_cart(model).map_or(false, |cart| cart.is_enabled())
    }

    /// Command-line options of every model
    pub fn cmdline_options(&self) -> Vec<CmdlineOption> {
        ModelId::ALL
            .iter()
            .flat_map(|model| model.cmdline_options().iter().copied())
            .collect()
    }

    /// Apply command-line toggles. Returns the arguments no option matched.
    pub fn apply_cmdline<S: AsRef<str>>(
        &mut self,
        args: &[S],
        host: &mut dyn CartridgeHost,
    ) -> CartridgeResult<Vec<String>> {
        let options = self.cmdline_options();
        let (writes, rest) = resources::parse_cmdline(args, &options);
        for (name, value) in writes {
            self.set_resource(name, value, host)?;
        }
        Ok(rest)
    }

    /// Front-end freeze button, routed to the first enabled cart that freezes
    pub fn trigger_freeze(&mut self, host: &mut dyn CartridgeHost) -> bool {
        for slot in self.slots.iter_mut().filter(|slot| slot.cart.is_enabled()) {
            if slot.cart.freeze(host) {
                info!("Freeze triggered on {}", slot.cart.model());
                return true;
            }
        }
        debug!("Freeze ignored: no cartridge can freeze now");
        false
    }

    // --- Bus routing ---

    /// Read through a registered I/O device. Returns the value and whether it is valid.
    pub fn io_read(&mut self, owner: ModelId, target: IoTarget, addr: u16) -> (u8, bool) {
        match self.get_cart_mut(owner) {
            Some(cart) => {
                let value = cart.io_read(target, addr);
                (value, cart.io_read_valid(target))
            }
            None => (BUS_FLOATING, false),
        }
    }

    pub fn io_store(&mut self, owner: ModelId, target: IoTarget, addr: u16, value: u8) {
        if let Some(cart) = self.get_cart_mut(owner) {
            cart.io_store(target, addr, value);
        }
    }

    pub fn ultimax_read(
        &mut self,
        owner: ModelId,
        region: MemRegion,
        addr: u16,
        host: &dyn CartridgeHost,
    ) -> u8 {
        match self.get_cart_mut(owner) {
            Some(cart) => cart.ultimax_read(region, addr, host),
            None => host.read_without_ultimax(addr),
        }
    }

    pub fn ultimax_store(
        &mut self,
        owner: ModelId,
        region: MemRegion,
        addr: u16,
        value: u8,
        host: &mut dyn CartridgeHost,
    ) {
        match self.get_cart_mut(owner) {
            Some(cart) => cart.ultimax_store(region, addr, value, host),
            None => host.store_without_ultimax(addr, value),
        }
    }

    // --- Snapshots ---

    /// Snapshot modules of every enabled cart
    pub fn write_snapshot(&self) -> CartridgeResult<Vec<(ModelId, Vec<u8>)>> {
        let mut modules = Vec::new();
        for slot in self.slots.iter().filter(|slot| slot.cart.is_enabled()) {
            modules.push((slot.cart.model(), slot.cart.snapshot_write()?));
        }
        Ok(modules)
    }

    pub fn read_snapshot(
        &mut self,
        model: ModelId,
        data: &[u8],
        host: &mut dyn CartridgeHost,
    ) -> CartridgeResult<()> {
        let slot = self.slot_mut(model)?;
        slot.cart.snapshot_read(data, host)?;
        if slot.cart.is_enabled() {
            self.active = Some(model);
        } else if self.active == Some(model) {
            self.active = None;
        }
        Ok(())
    }

    /// Replace the state of every cart with the saved modules.
    /// All modules are checked first; enabled carts missing from the
    /// snapshot are disabled.
    pub fn load_snapshot(
        &mut self,
        modules: &[(ModelId, Vec<u8>)],
        host: &mut dyn CartridgeHost,
    ) -> CartridgeResult<()> {
        for (model, data) in modules {
            let cart = self.get_cart(*model).ok_or(CartridgeError::UnknownModel)?;
            if let Err(e) = cart.snapshot_check(data) {
                warn!("Snapshot of {} rejected: {}", model, e);
                return Err(e);
            }
        }

        for slot in self.slots.iter_mut().filter(|slot| slot.cart.is_enabled()) {
            let model = slot.cart.model();
            if !modules.iter().any(|(saved, _)| *saved == model) {
                slot.cart.set_enabled(false, host)?;
                slot.image = None;
                debug!("Cartridge {} not in snapshot, disabled", model);
            }
        }

        for (model, data) in modules {
            self.read_snapshot(*model, data, host)?;
        }
        if self.active.map_or(false, |m| !self.is_enabled(m)) {
            self.active = None;
        }
        Ok(())
    }

    pub fn reset_all(&mut self) {
        for slot in &mut self.slots {
            slot.cart.reset();
        }
        debug!("All cartridges reset");
    }

    // --- Control requests ---

    /// Apply one request
    pub fn apply(&mut self, request: ControlRequest, host: &mut dyn CartridgeHost) -> CartridgeResult<()> {
        debug!("Control request: {:?}", request);
        match request {
            ControlRequest::SetResource { name, value } => self.set_resource(&name, value, host),
            ControlRequest::Attach { model, image } => self.attach(model, image.as_deref(), host),
            ControlRequest::Detach => {
                self.detach(host);
                Ok(())
            }
            ControlRequest::Freeze => {
                self.trigger_freeze(host);
                Ok(())
            }
            ControlRequest::SetDefault => {
                self.set_default();
                Ok(())
            }
        }
    }

    /// Apply the oldest queued request, `None` when the queue is empty
    pub fn apply_next(&mut self, host: &mut dyn CartridgeHost) -> Option<CartridgeResult<()>> {
        match self.rx.try_recv() {
            Ok(request) => {
                let result = self.apply(request, host);
                if let Err(e) = &result {
                    warn!("Control request failed: {}", e);
                }
                Some(result)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain queued requests. Errors are collected, never fatal.
    pub fn apply_pending(&mut self, host: &mut dyn CartridgeHost) -> Vec<CartridgeError> {
        let mut errors = Vec::new();
        while let Some(result) = self.apply_next(host) {
            if let Err(e) = result {
                errors.push(e);
            }
        }
        errors
    }
}

impl Default for CartridgeManager {
    fn default() -> Self {
        Self::new()
    }
}
