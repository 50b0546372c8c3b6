//! Error taxonomy for the processing pipeline.
//!
//! Every failure is terminal for the request. Problems caused by the uploaded
//! data are [`ErrorKind::UserInput`]; problems in the packaging layer itself
//! are [`ErrorKind::Internal`].

use thiserror::Error;

/// Which side of the request a failure is attributable to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unusable input. Mapped to 422 by the HTTP boundary.
    UserInput,
    /// Packaging or encoding misbehaved. Mapped to 500.
    Internal,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("spreadsheet could not be decoded: {0}")]
    Decode(String),

    #[error("spreadsheet has no data rows")]
    EmptySheet,

    #[error("phone and name columns not identified (phone: {number:?}, name: {name:?})")]
    ColumnsNotIdentified {
        number: Option<usize>,
        name: Option<usize>,
    },

    #[error("no valid phone numbers after sanitization")]
    NoValidPhones,

    #[error("archive creation failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O failure while packaging: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::Archive(_) | ProcessError::Io(_) => ErrorKind::Internal,
            _ => ErrorKind::UserInput,
        }
    }

    /// User-facing message reported in the `error` field of a JSON response.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProcessError::InvalidUpload(_) => "Arquivo enviado inválido.",
            ProcessError::InvalidOption(_) => "Parâmetros de processamento inválidos.",
            ProcessError::Decode(_) => "Não foi possível abrir a planilha fornecida.",
            ProcessError::EmptySheet => "Planilha sem dados.",
            ProcessError::ColumnsNotIdentified { .. } => {
                "Não foi possível identificar colunas de telefone e nome automaticamente."
            }
            ProcessError::NoValidPhones => "Nenhum telefone válido encontrado após a limpeza.",
            ProcessError::Archive(_) | ProcessError::Io(_) => "Erro interno do servidor",
        }
    }

    /// Extra detail for the `details` field, when the variant carries any.
    pub fn details(&self) -> Option<String> {
        match self {
            ProcessError::InvalidUpload(d)
            | ProcessError::InvalidOption(d)
            | ProcessError::Decode(d) => Some(d.clone()),
            ProcessError::Archive(e) => Some(e.to_string()),
            ProcessError::Io(e) => Some(e.to_string()),
            _ => None,
        }
    }
}
