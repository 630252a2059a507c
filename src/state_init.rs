use crate::cell::{Cell, CellBuilder};
use crate::error::Result;

/// Contract initialization bundle: the code and data cells a contract is
/// instantiated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInit {
    code: Cell,
    data: Cell,
}

impl StateInit {
    #[must_use]
    pub const fn new(code: Cell, data: Cell) -> Self {
        Self { code, data }
    }

    #[must_use]
    pub const fn code(&self) -> &Cell {
        &self.code
    }

    #[must_use]
    pub const fn data(&self) -> &Cell {
        &self.data
    }

    /// Builds the TL-B `StateInit` cell: no split depth, no tick-tock,
    /// code and data present, empty library.
    ///
    /// # Errors
    /// Propagates builder failures.
    pub fn to_cell(&self) -> Result<Cell> {
        let mut builder = CellBuilder::new();
        builder
            .store_bit(false)?
            .store_bit(false)?
            .store_maybe_ref(Some(self.code.clone()))?
            .store_maybe_ref(Some(self.data.clone()))?
            .store_bit(false)?;
        builder.build()
    }

    /// # Errors
    /// Propagates cell or BoC serialization failures.
    pub fn to_boc_base64(&self) -> Result<String> {
        self.to_cell()?.to_boc_base64()
    }
}
