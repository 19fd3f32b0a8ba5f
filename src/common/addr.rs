//! Logical Address Translation.
//!
//! A process addresses its memory with linear word addresses. Every access
//! is split into a page number and an offset inside that page; the page
//! number indexes both the process cache and the page table.

/// A word address split into (page number, page offset).
///
/// The transformation is stateless: for a page size `p` and an address `a`,
/// `page_number * p + page_offset == a` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LogicalAddress {
    page_number: usize,
    page_offset: usize,
}

impl LogicalAddress {
    /// Creates a logical address from its two components.
    pub fn new(page_number: usize, page_offset: usize) -> Self {
        Self {
            page_number,
            page_offset,
        }
    }

    /// Translates a linear word address.
    ///
    /// # Arguments
    ///
    /// * `address` - Linear word address inside the process
    /// * `page_size` - Words per page (must be non-zero)
    ///
    /// # Returns
    ///
    /// The `(address / page_size, address % page_size)` pair.
    pub fn translate(address: usize, page_size: usize) -> Self {
        Self {
            page_number: address / page_size,
            page_offset: address % page_size,
        }
    }

    /// Reassembles the linear word address.
    pub fn to_linear(self, page_size: usize) -> usize {
        self.page_number * page_size + self.page_offset
    }

    /// Returns the page number.
    pub fn page_number(self) -> usize {
        self.page_number
    }

    /// Returns the offset inside the page.
    pub fn page_offset(self) -> usize {
        self.page_offset
    }
}

impl std::fmt::Display for LogicalAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {} offset {}", self.page_number, self.page_offset)
    }
}
