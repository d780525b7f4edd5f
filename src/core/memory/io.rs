//! Registro de dispositivos de I/O da porta de expansão.
//! Cada dispositivo declara início, fim (inclusivo) e uma máscara de endereço.
//! A decodificação é incompleta: as linhas fora da máscara são ignoradas,
//! então um bloco de 8 bytes com máscara 0x07 se repete 32 vezes em $DE00-$DEFF.

use crate::core::cartridge::ModelId;
use bitflags::bitflags;
use log::{debug, warn};

bitflags! {
    /// Propriedades de um dispositivo de I/O
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IoFlags: u8 {
        /// Leituras sempre fornecem dados válidos (sem flag por acesso)
        const READ_VALID = 0b0000_0001;
        /// Vence qualquer dispositivo não exclusivo no mesmo endereço
        const EXCLUSIVE  = 0b0000_0010;
    }
}

/// Qual handler do cartucho atende o dispositivo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoTarget {
    /// Faixa de registradores (normalmente I/O-1)
    Register,
    /// Janela de dados (normalmente I/O-2)
    Window,
}

/// Identificador opaco devolvido pelo registro; o cartucho só guarda isto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IoSourceId(u32);

/// Descritor de um dispositivo de I/O
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoSource {
    pub name: &'static str,
    pub start: u16,
    pub end: u16,
    pub mask: u16,
    pub flags: IoFlags,
    pub owner: ModelId,
    pub target: IoTarget,
}

impl IoSource {
    /// Retorna o offset decodificado (`addr & mask`) se o endereço pertence ao dispositivo
    pub fn decode(&self, addr: u16) -> Option<u16> {
        if addr < self.start || addr > self.end {
            return None;
        }
        // Linhas fora da máscara são "don't care": só o offset reduzido chega ao handler
        Some((addr - self.start) & self.mask)
    }

    pub fn contains(&self, addr: u16) -> bool {
        self.decode(addr).is_some()
    }
}

/// Tabela de dispositivos registrados, em ordem de registro
pub struct IoRegistry {
    entries: Vec<(IoSourceId, IoSource)>,
    next_id: u32,
}

impl IoRegistry {
    /// Cria um registro vazio
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Registra um dispositivo e devolve seu identificador
    pub fn register(&mut self, source: IoSource) -> IoSourceId {
        let id = IoSourceId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        debug!(
            "I/O registrado: {} ${:04X}-${:04X} máscara ${:02X} ({:?})",
            source.name, source.start, source.end, source.mask, id
        );
        self.entries.push((id, source));
        id
    }

    /// Remove um dispositivo. Retorna `false` se o id não estava registrado.
    pub fn unregister(&mut self, id: IoSourceId) -> bool {
        match self.entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(pos) => {
                let (_, source) = self.entries.remove(pos);
                debug!("I/O removido: {} ({:?})", source.name, id);
                true
            }
            None => {
                warn!("Tentativa de remover I/O não registrado ({:?})", id);
                false
            }
        }
    }

    /// Dispositivos que respondem ao endereço, do mais prioritário ao menos.
    /// Exclusivos primeiro; entre iguais, o registrado por último vence.
    pub fn matching(&self, addr: u16) -> Vec<(IoSourceId, &IoSource)> {
        let mut hits: Vec<(IoSourceId, &IoSource)> = self
            .entries
            .iter()
            .rev()
            .filter(|(_, source)| source.contains(addr))
            .map(|(id, source)| (*id, source))
            .collect();

        // sort_by_key é estável: a ordem de recência se mantém dentro de cada grupo
        hits.sort_by_key(|(_, source)| !source.flags.contains(IoFlags::EXCLUSIVE));
        hits
    }

    /// Seleciona o dispositivo que atende o endereço, se houver.
    /// `None` significa que o acesso cai para a memória do sistema.
    pub fn dispatch(&self, addr: u16) -> Option<(IoSourceId, &IoSource)> {
        self.matching(addr).into_iter().next()
    }

    pub fn get(&self, id: IoSourceId) -> Option<&IoSource> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, source)| source)
    }

    /// Número de dispositivos registrados
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Número de dispositivos registrados por um modelo
    pub fn count_owned_by(&self, owner: ModelId) -> usize {
        self.entries
            .iter()
            .filter(|(_, source)| source.owner == owner)
            .count()
    }
}

impl Default for IoRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io1_device(flags: IoFlags) -> IoSource {
        IoSource {
            name: "TEST",
            start: 0xDE00,
            end: 0xDEFF,
            mask: 0x07,
            flags,
            owner: ModelId::Isepic,
            target: IoTarget::Register,
        }
    }

    #[test]
    fn test_decode_mirrors_across_window() {
        let source = io1_device(IoFlags::empty());

        assert_eq!(source.decode(0xDE00), Some(0));
        assert_eq!(source.decode(0xDE08), Some(0));
        assert_eq!(source.decode(0xDEF8), Some(0));
        assert_eq!(source.decode(0xDE05), Some(5));
        assert_eq!(source.decode(0xDE7D), Some(5));

        // 32 espelhos de cada registrador
        let mirrors = (0xDE00u16..=0xDEFF)
            .filter(|addr| source.decode(*addr) == Some(3))
            .count();
        assert_eq!(mirrors, 32);
    }

    #[test]
    fn test_decode_outside_range() {
        let source = io1_device(IoFlags::empty());
        assert_eq!(source.decode(0xDDFF), None);
        assert_eq!(source.decode(0xDF00), None);
        assert_eq!(source.decode(0x0000), None);
    }

    #[test]
    fn test_dispatch_no_handler() {
        let registry = IoRegistry::new();
        assert!(registry.dispatch(0xDE00).is_none());
    }

    #[test]
    fn test_register_unregister() {
        let mut registry = IoRegistry::new();
        let id = registry.register(io1_device(IoFlags::empty()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.dispatch(0xDE42).map(|(hit, _)| hit), Some(id));

        assert!(registry.unregister(id));
        assert!(registry.is_empty());
        assert!(registry.dispatch(0xDE42).is_none());

        // Remover de novo não é erro fatal
        assert!(!registry.unregister(id));
    }

    #[test]
    fn test_last_registered_wins() {
        let mut registry = IoRegistry::new();
        let first = registry.register(io1_device(IoFlags::empty()));
        let second = registry.register(io1_device(IoFlags::empty()));

        assert_eq!(registry.dispatch(0xDE00).map(|(id, _)| id), Some(second));

        let order: Vec<IoSourceId> = registry.matching(0xDE00).iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![second, first]);
    }

    #[test]
    fn test_exclusive_beats_recency() {
        let mut registry = IoRegistry::new();
        let exclusive = registry.register(io1_device(IoFlags::EXCLUSIVE));
        let _newer = registry.register(io1_device(IoFlags::empty()));

        assert_eq!(registry.dispatch(0xDE01).map(|(id, _)| id), Some(exclusive));
    }
}
