use kaitori_estat::EstatError;
use kaitori_gemini::GeminiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error(transparent)]
    Estat(#[from] EstatError),

    #[error(transparent)]
    Gemini(#[from] GeminiError),
}
