//! Port traits (interfaces) for transport adapters to implement.

mod source;

pub use source::{
    ArchiveBoundary, RangeSlice, RawApprove, RawBurn, RawMint, RawParty, RawRecord, RawTransfer,
    TransactionSource,
};
