//! Banked access to onboard cartridge RAM through a fixed I/O window.
//!
//! The window shows one page of the buffer at a time. Which page is shown is
//! latched from address bits of a register access, through a model-specific
//! decoder.

/// Maps the low address lines of a register access to a page number
pub type PageDecoder = fn(u16) -> usize;

/// Page selection state for a windowed RAM buffer
#[derive(Debug, Clone, Copy)]
pub struct BankWindow {
    page: usize,
    page_count: usize,
    page_size: usize,
    decoder: PageDecoder,
}

impl BankWindow {
    /// `page_count` and `page_size` must be powers of two
    pub fn new(page_count: usize, page_size: usize, decoder: PageDecoder) -> Self {
        debug_assert!(page_count.is_power_of_two());
        debug_assert!(page_size.is_power_of_two());
        Self {
            page: 0,
            page_count,
            page_size,
            decoder,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Total bytes reachable through the window
    pub fn buffer_size(&self) -> usize {
        self.page_count * self.page_size
    }

    /// Set the page directly, masked into range. Returns the new page.
    pub fn set_page(&mut self, page: usize) -> usize {
        self.page = page & (self.page_count - 1);
        self.page
    }

    /// Latch a new page from the address of a register access
    pub fn select_page(&mut self, addr: u16) -> usize {
        let page = (self.decoder)(addr);
        self.set_page(page)
    }

    /// Buffer offset for a window access at `addr`
    #[inline]
    pub fn window_offset(&self, addr: u16) -> usize {
        self.page * self.page_size + (addr as usize & (self.page_size - 1))
    }

    /// Back to page 0
    pub fn reset(&mut self) {
        self.page = 0;
    }
}

/// ISEPIC page decoder: A2 -> bit 0, A1 -> bit 1, A0 -> bit 2
pub fn isepic_page(addr: u16) -> usize {
    let addr = addr as usize;
    ((addr >> 2) & 1) | (addr & 2) | ((addr & 1) << 2)
}
