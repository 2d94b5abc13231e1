//! # Error Types Module
//!
//! Questo modulo definisce gli errori che escono dalla conversione.
//!
//! ## Responsabilità:
//! - Definisce `ConvertError` per gli errori che impediscono di iniziare
//!   (o di configurare) una conversione
//! - Integra con `thiserror` per messaggi strutturati
//!
//! ## Categorie di errori:
//! - `Precondition`: target non positivo, input mancante o senza audio
//! - `MissingDependency`: tool esterno mancante (ffmpeg)
//!
//! Gli errori del motore di encoding (`EngineError`) e del probe
//! (`ProbeError`) vivono nei rispettivi moduli: i primi diventano un
//! `ConversionResult` fallito, i secondi vengono assorbiti.
//!
//! ## Esempio:
//! ```rust,ignore
//! if request.target_size == 0 {
//!     return Err(ConvertError::Precondition("target size must be positive".into()));
//! }
//! ```

/// Errors that stop a conversion before the encoder runs
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),
}

impl ConvertError {
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition(reason.into())
    }

    /// Whether this error comes from a nonsensical request
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}
