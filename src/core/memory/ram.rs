//! RAM interna do cartucho.
//! Alocada quando o cartucho é habilitado e liberada quando é desabilitado.

use crate::core::memory::{MemoryError, MemoryResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use log::{error, info};

/// Bloco de RAM de tamanho fixo, zerado na alocação
pub struct OnboardRam {
    data: Vec<u8>,
}

impl OnboardRam {
    /// Aloca `size` bytes zerados. Falha com `OutOfMemory` em vez de abortar.
    pub fn allocate(size: usize) -> MemoryResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(size).map_err(|_| MemoryError::OutOfMemory)?;
        data.resize(size, 0);
        Ok(Self { data })
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Lê um byte; offsets fora do bloco dão a volta
    pub fn read_byte(&self, offset: usize) -> u8 {
        self.data[offset % self.data.len()]
    }

    /// Escreve um byte
    pub fn write_byte(&mut self, offset: usize, value: u8) {
        let len = self.data.len();
        self.data[offset % len] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Copia um conteúdo completo para a RAM (o tamanho deve coincidir)
    pub fn fill_from(&mut self, contents: &[u8]) -> bool {
        if contents.len() != self.data.len() {
            return false;
        }
        self.data.copy_from_slice(contents);
        true
    }

    /// Salva a RAM em um arquivo binário cru
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> MemoryResult<()> {
        let path = path.as_ref();
        let mut file = File::create(path).map_err(|e| {
            error!("Falha ao criar {}: {}", path.display(), e);
            MemoryError::SaveError
        })?;
        file.write_all(&self.data).map_err(|e| {
            error!("Falha ao gravar {}: {}", path.display(), e);
            MemoryError::SaveError
        })?;
        info!("RAM do cartucho salva: {} bytes em {}", self.data.len(), path.display());
        Ok(())
    }
}
