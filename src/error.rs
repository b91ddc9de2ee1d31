use thiserror::Error;

/// Failures surfaced by the nesting core.
///
/// Parse failures abort only the drawing that produced them; configuration
/// and capacity failures abort the whole optimization request.
#[derive(Debug, Error)]
pub enum NestError {
    #[error("failed to parse drawing: {0}")]
    ParseFailure(String),

    #[error("invalid sheet configuration: {0}")]
    InvalidSheetConfig(String),

    #[error("part '{part}' ({width}x{height} mm) exceeds usable sheet capacity")]
    UnplaceablePart {
        part: String,
        width: f64,
        height: f64,
    },

    #[error("internal packing fault: {0}")]
    Internal(String),
}
