// Este é o ponto de entrada principal da biblioteca.
// Núcleo da porta de expansão do C64: decodificação de I/O, RAM de cartucho
// em bancos, chave de freeze e snapshots.

// Traço por acesso de I/O, compilado só com o recurso `trace-io`.
// Precisa vir antes dos módulos que o usam.
cfg_if::cfg_if! {
    if #[cfg(feature = "trace-io")] {
        macro_rules! io_trace {
            ($($arg:tt)*) => { log::trace!($($arg)*) };
        }
    } else {
        macro_rules! io_trace {
            ($($arg:tt)*) => {
                if false {
                    log::trace!($($arg)*)
                }
            };
        }
    }
}

// Módulos principais do projeto.
pub mod core;
pub mod frontend;

// Re-exportações para facilitar o uso.
pub use core::cartridge::{
    Cartridge, CartridgeError, CartridgeHost, CartridgeManager, CartridgeResult, ControlHandle,
    ControlRequest, Isepic, ModelId,
};
pub use core::memory::{MemConfig, MemoryBus};
pub use core::system::C64System;

/// Versão da biblioteca.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Função conveniente para criar uma nova instância do sistema.
pub fn create_system() -> C64System {
    C64System::new()
}
