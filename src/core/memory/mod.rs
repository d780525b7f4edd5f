//! Sistema de Memória do C64 visto pela porta de expansão.
//! Gerencia o barramento de 16-bit, o registro de dispositivos de I/O
//! (I/O-1 / I/O-2), a configuração GAME/EXROM e a linha de NMI.

pub mod bus;
pub mod io;
pub mod map;
pub mod ram;

// Re-exportações para facilitar o uso
pub use bus::{MemoryBus, NmiLine};
pub use io::{IoFlags, IoRegistry, IoSource, IoSourceId, IoTarget};
pub use map::{CartMode, ExpansionLines, MemConfig, MemRegion};
pub use ram::OnboardRam;

/// Tamanho do espaço de endereçamento do 6510 (64 KB)
pub const ADDRESS_SPACE: usize = 0x1_0000;

/// Valor lido quando nenhum dispositivo dirige o barramento
pub const BUS_FLOATING: u8 = 0x00;

/// Janela I/O-1 ($DE00-$DEFF)
pub const IO1_START: u16 = 0xDE00;
pub const IO1_END: u16 = 0xDEFF;

/// Janela I/O-2 ($DF00-$DFFF)
pub const IO2_START: u16 = 0xDF00;
pub const IO2_END: u16 = 0xDFFF;

/// Vetor de NMI do 6510, interceptável pelo cartucho em modo Ultimax
pub const NMI_VECTOR_LO: u16 = 0xFFFA;
pub const NMI_VECTOR_HI: u16 = 0xFFFB;

/// Erros do sistema de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    OutOfMemory,
    SaveError,
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::OutOfMemory => write!(f, "out of memory"),
            MemoryError::SaveError => write!(f, "could not write memory image"),
        }
    }
}

impl std::error::Error for MemoryError {}

/// Tipo de resultado para operações de memória
pub type MemoryResult<T> = Result<T, MemoryError>;
