//! # Size-Targeting Search Module
//!
//! Il cuore del sistema: il loop che invoca ripetutamente l'encoder,
//! misura il file prodotto e decide il tentativo successivo.
//! - `size_search`: il loop limitato e il fallback finale
//! - `policy`: regole di aggiustamento dei parametri
//! - `reporter`: eventi per logging, spinner e output JSON

pub mod policy;
pub mod reporter;
pub mod size_search;

#[cfg(test)]
pub(crate) mod testing;

pub use reporter::{NoopReporter, SearchReporter};
pub use size_search::{search, ConversionFailure, ConversionRequest, ConversionResult};
