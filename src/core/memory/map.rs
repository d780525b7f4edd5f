//! Configuração de memória da porta de expansão e mapa de regiões.
//! Baseado no modelo de duas fases (phi1/phi2) de `cartridge_config_changed`.

use bitflags::bitflags;

bitflags! {
    /// Linhas /GAME e /EXROM puxadas para baixo pelo cartucho
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExpansionLines: u8 {
        const GAME  = 0b01;
        const EXROM = 0b10;
    }
}

/// Modo do cartucho em uma fase do relógio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartMode {
    Game8k,     // ROML em $8000
    Game16k,    // ROML + ROMH em $A000
    Ram,        // Cartucho invisível, C64 normal
    Ultimax,    // ROMH em $E000, resto não mapeado
}

impl CartMode {
    /// Linhas puxadas pelo cartucho neste modo
    pub fn lines(self) -> ExpansionLines {
        match self {
            CartMode::Game8k => ExpansionLines::EXROM,
            CartMode::Game16k => ExpansionLines::GAME | ExpansionLines::EXROM,
            CartMode::Ram => ExpansionLines::empty(),
            CartMode::Ultimax => ExpansionLines::GAME,
        }
    }

    /// Reconstrói o modo a partir das linhas
    pub fn from_lines(lines: ExpansionLines) -> Self {
        match (lines.contains(ExpansionLines::GAME), lines.contains(ExpansionLines::EXROM)) {
            (false, false) => CartMode::Ram,
            (false, true) => CartMode::Game8k,
            (true, true) => CartMode::Game16k,
            (true, false) => CartMode::Ultimax,
        }
    }
}

/// Configuração do barramento: modo em phi1 (VIC) e phi2 (CPU)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemConfig {
    pub phi1: CartMode,
    pub phi2: CartMode,
}

impl MemConfig {
    /// Nenhum cartucho visível
    pub const RAM: MemConfig = MemConfig { phi1: CartMode::Ram, phi2: CartMode::Ram };

    /// Ultimax apenas para a CPU (usado por cartuchos de freeze)
    pub const ULTIMAX_PHI2: MemConfig = MemConfig { phi1: CartMode::Ram, phi2: CartMode::Ultimax };

    pub fn is_ultimax(&self) -> bool {
        self.phi2 == CartMode::Ultimax
    }
}

impl Default for MemConfig {
    fn default() -> Self {
        MemConfig::RAM
    }
}

/// Região de memória vista pela CPU em modo Ultimax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemRegion {
    LowRam,         // $0000-$0FFF, sempre RAM
    Unmapped1000,   // $1000-$7FFF
    RomL,           // $8000-$9FFF
    UnmappedA000,   // $A000-$BFFF
    UnmappedC000,   // $C000-$CFFF
    Io,             // $D000-$DDFF (VIC, SID, CIAs)
    Io1,            // $DE00-$DEFF
    Io2,            // $DF00-$DFFF
    RomH,           // $E000-$FFFF
}

impl MemRegion {
    /// Obtém a região de um endereço
    pub fn of(addr: u16) -> Self {
        match addr {
            0x0000..=0x0FFF => MemRegion::LowRam,
            0x1000..=0x7FFF => MemRegion::Unmapped1000,
            0x8000..=0x9FFF => MemRegion::RomL,
            0xA000..=0xBFFF => MemRegion::UnmappedA000,
            0xC000..=0xCFFF => MemRegion::UnmappedC000,
            0xD000..=0xDDFF => MemRegion::Io,
            0xDE00..=0xDEFF => MemRegion::Io1,
            0xDF00..=0xDFFF => MemRegion::Io2,
            0xE000..=0xFFFF => MemRegion::RomH,
        }
    }

    /// Regiões que o cartucho atende quando o barramento está em Ultimax
    pub fn is_cartridge_ultimax(self) -> bool {
        matches!(
            self,
            MemRegion::Unmapped1000
                | MemRegion::RomL
                | MemRegion::UnmappedA000
                | MemRegion::UnmappedC000
                | MemRegion::RomH
        )
    }
}
