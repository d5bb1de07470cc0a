use std::path::Path;

use satchel_core::config::{DatabaseConfig, DatabaseDriver, SatchelConfig};
use satchel_core::db::DatabasePool;
use tracing::info;

/// Run the `init` command: create the data directory, write a default
/// config, and set up the database.
pub async fn run(data_dir: &str) -> anyhow::Result<()> {
    let data_path = Path::new(data_dir);

    if !data_path.exists() {
        std::fs::create_dir_all(data_path)?;
        info!("Created data directory: {}", data_dir);
    }

    let db_path = data_path.join("satchel.db");
    let db_path_str = db_path.to_string_lossy().to_string();

    let mut config = SatchelConfig::generate_default();
    config.satchel.data_dir = data_dir.to_string();
    config.satchel.database = DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        path: Some(db_path_str.clone()),
    };

    let config_path = data_path.join("satchel.toml");
    let toml_str = toml::to_string_pretty(&config)?;
    std::fs::write(&config_path, &toml_str)?;
    info!("Wrote configuration to {}", config_path.display());

    let connect_str = format!("sqlite:{}?mode=rwc", db_path_str);
    DatabasePool::new_sqlite(&connect_str).await?;
    info!("Database initialized at {}", db_path_str);

    println!("Satchel initialized successfully!");
    println!("  Data directory: {}", data_dir);
    println!("  Configuration: {}", config_path.display());
    println!("  Database:      {}", db_path_str);
    println!();
    println!("Next steps:");
    println!(
        "  1. Add [[accounts]] entries to {} with your journal credentials",
        config_path.display()
    );
    println!("  2. Run `satchel sync --dry-run` to test the logins");
    println!("  3. Run `satchel sync` to perform the first import");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_files_in_temp_dir() {
        let temp_dir = std::env::temp_dir().join("satchel_test_init");
        // Clean up from any previous run
        let _ = std::fs::remove_dir_all(&temp_dir);

        let data_dir = temp_dir.to_string_lossy().to_string();
        run(&data_dir).await.unwrap();

        assert!(temp_dir.exists());

        let config_path = temp_dir.join("satchel.toml");
        assert!(config_path.exists());
        let content = std::fs::read_to_string(&config_path).unwrap();
        let config: SatchelConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.satchel.data_dir, data_dir);
        assert!(config.accounts.is_empty());

        let db_path = temp_dir.join("satchel.db");
        assert!(db_path.exists());
        assert_eq!(
            config.satchel.database.path.as_deref(),
            Some(db_path.to_string_lossy().as_ref())
        );

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[tokio::test]
    async fn init_is_rerunnable() {
        let temp_dir = std::env::temp_dir().join("satchel_test_init_rerun");
        let _ = std::fs::remove_dir_all(&temp_dir);

        let data_dir = temp_dir.to_string_lossy().to_string();
        run(&data_dir).await.unwrap();
        run(&data_dir).await.unwrap();

        let _ = std::fs::remove_dir_all(&temp_dir);
    }
}
