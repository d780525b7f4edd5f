//! Núcleo: sistema de memória, cartuchos e a composição dos dois.

pub mod cartridge;
pub mod memory;
pub mod system;
