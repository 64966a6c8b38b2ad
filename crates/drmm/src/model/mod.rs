//! DRMM model components: frozen embedding table, histogram scorer, and
//! the bridge from padded token matrices to burn tensors.

pub mod bridge;
pub mod drmm;
pub mod embedding;
