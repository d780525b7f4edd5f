//! C64 visto pela porta de expansão: barramento + cartuchos.
//! A CPU chama `read`/`write` em cada ciclo e `instruction_boundary`
//! entre instruções.

use crate::core::cartridge::{
    CartridgeHost, CartridgeManager, CartridgeResult, ControlHandle, ModelId,
};
use crate::core::memory::{IoFlags, IoTarget, MemRegion, MemoryBus, BUS_FLOATING};
use log::debug;

/// Sistema completo
pub struct C64System {
    pub bus: MemoryBus,
    pub carts: CartridgeManager,
}

impl C64System {
    pub fn new() -> Self {
        Self {
            bus: MemoryBus::new(),
            carts: CartridgeManager::new(),
        }
    }

    /// Handle para pedidos vindos de outras threads
    pub fn control_handle(&self) -> ControlHandle {
        self.carts.control_handle()
    }

    /// Dono do overlay Ultimax, se a região for atendida pelo cartucho
    fn ultimax_owner(&self, region: MemRegion) -> Option<ModelId> {
        if self.bus.config.is_ultimax() && region.is_cartridge_ultimax() {
            self.bus.config_owner
        } else {
            None
        }
    }

    /// Leitura de um byte pela CPU
    pub fn read(&mut self, addr: u16) -> u8 {
        let region = MemRegion::of(addr);
        match region {
            MemRegion::Io1 | MemRegion::Io2 => self.io_read(addr),
            _ => match self.ultimax_owner(region) {
                Some(owner) => self.carts.ultimax_read(owner, region, addr, &self.bus),
                None => self.bus.read_without_ultimax(addr),
            },
        }
    }

    /// Escrita de um byte pela CPU
    pub fn write(&mut self, addr: u16, value: u8) {
        let region = MemRegion::of(addr);
        match region {
            MemRegion::Io1 | MemRegion::Io2 => self.io_write(addr, value),
            _ => match self.ultimax_owner(region) {
                Some(owner) => self.carts.ultimax_store(owner, region, addr, value, &mut self.bus),
                None => self.bus.store_without_ultimax(addr, value),
            },
        }
    }

    /// Todos os dispositivos que decodificam o endereço, em ordem de prioridade
    fn io_claimers(&self, addr: u16) -> Vec<(ModelId, IoTarget, IoFlags)> {
        self.bus
            .io
            .matching(addr)
            .into_iter()
            .map(|(_, source)| (source.owner, source.target, source.flags))
            .collect()
    }

    /// Leitura em I/O-1/I/O-2. Todos os dispositivos veem o acesso
    /// (efeitos colaterais por endereço); o primeiro com dado válido vence.
    fn io_read(&mut self, addr: u16) -> u8 {
        let claimers = self.io_claimers(addr);
        let mut result = None;

        for (owner, target, flags) in claimers {
            let (value, valid) = self.carts.io_read(owner, target, addr);
            if result.is_none() && (valid || flags.contains(IoFlags::READ_VALID)) {
                result = Some(value);
            }
        }

        let value = result.unwrap_or(BUS_FLOATING);
        io_trace!("I/O read ${:04X} = ${:02X}", addr, value);
        value
    }

    fn io_write(&mut self, addr: u16, value: u8) {
        io_trace!("I/O write ${:04X} = ${:02X}", addr, value);
        for (owner, target, _) in self.io_claimers(addr) {
            self.carts.io_store(owner, target, addr, value);
        }
    }

    /// Fronteira de instrução: aplica pedidos pendentes e retorna
    /// `true` se a CPU deve atender uma NMI.
    /// Um reset pedido por um pedido roda antes do próximo pedido da fila.
    pub fn instruction_boundary(&mut self) -> bool {
        while let Some(result) = self.carts.apply_next(&mut self.bus) {
            if let Err(err) = result {
                debug!("Pedido descartado: {}", err);
            }
            if self.bus.take_reset_request() {
                self.reset();
            }
        }
        if self.bus.take_reset_request() {
            self.reset();
        }
        self.bus.nmi.take_edge()
    }

    /// Reset da máquina. Os cartuchos continuam conectados.
    pub fn reset(&mut self) {
        let config = self.bus.config;
        let owner = self.bus.config_owner;
        self.bus.reset();
        // O overlay segue a posição da chave, não o reset
        if let Some(owner) = owner {
            self.bus.config_changed(owner, config);
        }
        self.carts.reset_all();
    }

    /// Salva o estado dos cartuchos (máquina pausada)
    pub fn save_snapshot(&self) -> CartridgeResult<Vec<(ModelId, Vec<u8>)>> {
        self.carts.write_snapshot()
    }

    /// Substitui o estado de todos os cartuchos (máquina pausada).
    /// Cartuchos ausentes do snapshot são desligados.
    pub fn load_snapshot(&mut self, modules: &[(ModelId, Vec<u8>)]) -> CartridgeResult<()> {
        self.carts.load_snapshot(modules, &mut self.bus)
    }
}

impl Default for C64System {
    fn default() -> Self {
        Self::new()
    }
}
