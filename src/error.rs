pub type PortraitResult<T> = Result<T, PortraitError>;

#[derive(thiserror::Error, Debug)]
pub enum PortraitError {
    #[error("load error: {0}")]
    Load(String),

    #[error("detection error: {0}")]
    Detection(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PortraitError {
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(PortraitError::load("x").to_string().contains("load error:"));
        assert!(
            PortraitError::detection("x")
                .to_string()
                .contains("detection error:")
        );
        assert!(
            PortraitError::export("x")
                .to_string()
                .contains("export error:")
        );
        assert!(
            PortraitError::validation("x")
                .to_string()
                .contains("validation error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = PortraitError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
