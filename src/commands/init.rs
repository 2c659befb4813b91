use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the home directory with a default `config.json` and an empty database.
///
/// # Errors
/// - Returns an error if the config file or the database already exists, or if any file
///   operation fails.
pub async fn init(home: &Path) -> Result<Out<()>> {
    let config = Config::create(home).await?;
    Ok(format!(
        "Successfully created the ledger home directory at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let out = init(&home).await.unwrap();
        assert!(out.message().starts_with("Successfully created"));
        assert!(home.join("config.json").is_file());
        assert!(home.join("ledger.sqlite").is_file());

        let err = init(&home).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
