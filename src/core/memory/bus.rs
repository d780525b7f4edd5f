//! Barramento de memória principal - funções READ/WRITE sem cartucho.
//! Guarda a RAM do sistema, o registro de I/O, a configuração atual
//! da porta de expansão e a linha de NMI usada pelo botão de freeze.

use crate::core::cartridge::{CartridgeHost, ModelId};
use crate::core::memory::{IoRegistry, IoSource, IoSourceId, MemConfig, ADDRESS_SPACE};
use log::{debug, info, warn};

/// Linha de NMI vista pela CPU.
/// A CPU consulta `take_edge()` na fronteira de instrução.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NmiLine {
    asserted: bool,
    edge: bool,
    triggers: u32,
    releases: u32,
}

impl NmiLine {
    /// Puxa a linha para baixo; só a borda gera uma interrupção
    pub fn assert(&mut self) {
        if !self.asserted {
            self.edge = true;
        }
        self.asserted = true;
        self.triggers = self.triggers.wrapping_add(1);
    }

    /// Solta a linha
    pub fn release(&mut self) {
        self.asserted = false;
        self.releases = self.releases.wrapping_add(1);
    }

    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// Consome a borda pendente (a CPU deve atender uma NMI)
    pub fn take_edge(&mut self) -> bool {
        std::mem::take(&mut self.edge)
    }

    /// Quantas vezes a linha foi disparada
    pub fn triggers(&self) -> u32 {
        self.triggers
    }

    pub fn releases(&self) -> u32 {
        self.releases
    }
}

/// Barramento de memória principal
pub struct MemoryBus {
    pub ram: Box<[u8]>,       // 64KB RAM do sistema
    pub io: IoRegistry,       // Dispositivos em I/O-1 / I/O-2
    pub config: MemConfig,    // Configuração GAME/EXROM atual
    pub config_owner: Option<ModelId>,
    pub nmi: NmiLine,
    pub reset_pending: bool,
}

impl MemoryBus {
    /// Cria um novo barramento de memória
    pub fn new() -> Self {
        Self {
            ram: vec![0u8; ADDRESS_SPACE].into_boxed_slice(),
            io: IoRegistry::new(),
            config: MemConfig::RAM,
            config_owner: None,
            nmi: NmiLine::default(),
            reset_pending: false,
        }
    }

    /// Reset do barramento: volta ao modo RAM e solta a NMI.
    /// Os dispositivos de I/O continuam registrados (pertencem aos cartuchos).
    pub fn reset(&mut self) {
        self.config = MemConfig::RAM;
        self.config_owner = None;
        self.nmi = NmiLine::default();
        self.reset_pending = false;
        info!("Barramento reiniciado");
    }

    /// Consome um pedido de reset feito por um cartucho
    pub fn take_reset_request(&mut self) -> bool {
        std::mem::take(&mut self.reset_pending)
    }

    /// Lê um byte direto da RAM do sistema
    #[inline]
    pub fn read_ram(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    /// Escreve um byte direto na RAM do sistema
    #[inline]
    pub fn write_ram(&mut self, addr: u16, value: u8) {
        self.ram[addr as usize] = value;
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CartridgeHost for MemoryBus {
    fn io_register(&mut self, source: IoSource) -> IoSourceId {
        self.io.register(source)
    }

    fn io_unregister(&mut self, id: IoSourceId) -> bool {
        self.io.unregister(id)
    }

    fn config_changed(&mut self, owner: ModelId, config: MemConfig) {
        if config == self.config && self.config_owner == Some(owner) {
            return;
        }
        if let Some(current) = self.config_owner {
            if current != owner && config.is_ultimax() {
                warn!("{} assumiu o Ultimax de {}", owner, current);
            }
        }

        debug!("Configuração da porta: {:?} -> {:?} ({})", self.config, config, owner);
        self.config = config;
        self.config_owner = if config == MemConfig::RAM { None } else { Some(owner) };
    }

    fn trigger_freeze(&mut self) {
        debug!("NMI de freeze disparada");
        self.nmi.assert();
    }

    fn release_freeze(&mut self) {
        debug!("NMI de freeze liberada");
        self.nmi.release();
    }

    fn read_without_ultimax(&self, addr: u16) -> u8 {
        self.read_ram(addr)
    }

    fn store_without_ultimax(&mut self, addr: u16, value: u8) {
        self.write_ram(addr, value);
    }

    fn request_reset(&mut self) {
        self.reset_pending = true;
    }
}
