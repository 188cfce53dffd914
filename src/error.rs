//! Error types for the client book and the billing collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Reading or writing the clients file failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("clients file {path} is not a valid JSON array: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize clients: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A requested change was rejected before touching any record.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("Nome do cliente é obrigatório.")]
    NameRequired,

    #[error("Nenhum cliente ativo selecionado.")]
    EmptySelection,

    #[error("Dados incompletos: campo {0} ausente.")]
    MissingField(&'static str),

    #[error("Mês desconhecido: {0}")]
    UnknownMonth(String),

    #[error("Status desconhecido: {0}")]
    UnknownStatus(String),

    #[error("Cliente {0} não encontrado.")]
    ClientNotFound(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The receipt PDF could not be produced.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error while building receipt: {0}")]
    Io(#[from] std::io::Error),

    #[error("typst binary `{0}` not found; install it or set TYPST_BIN")]
    RendererMissing(String),

    #[error("typst failed: {0}")]
    Render(String),

    #[error("could not draw PIX QR code: {0}")]
    QrCode(String),
}

/// The message could not be delivered.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("messaging token is not configured")]
    MissingToken,

    #[error("attachment staging failed: {0}")]
    Staging(String),

    #[error("messaging request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("messaging API answered {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl EditError {
    /// Rejections the user can fix from the form, as opposed to storage failures.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, EditError::Store(_))
    }
}
