use std::path::Path;

use satchel_core::config::SatchelConfig;
use satchel_core::db::repository::{MetadataRepository, ProfileRepository, SyncRunRepository};
use satchel_core::db::sqlite::SqliteRepository;
use satchel_core::db::DatabasePool;
use satchel_core::models::common::MetadataType;
use tracing::info;

/// Run the `status` command: show profiles, last sync runs, and unread counts.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = SatchelConfig::load(Path::new(config_path))?;
    config.validate()?;

    info!("Loaded configuration from {}", config_path);

    let path = config
        .satchel
        .database
        .path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("SQLite path not configured"))?;
    let connect_str = format!("sqlite:{}?mode=rwc", path);
    let DatabasePool::Sqlite(pool) = DatabasePool::new_sqlite(&connect_str).await?;
    let repo = SqliteRepository::new(pool);

    let db_size = std::fs::metadata(path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());

    println!("Satchel Status");
    println!("==============");
    println!("Instance: {}", config.satchel.instance_name);
    println!("Database: SQLite ({})", db_size);
    println!();

    let profiles = repo.list_profiles().await?;
    if profiles.is_empty() {
        println!("No profiles yet. Run `satchel sync` to import data.");
        return Ok(());
    }

    for profile in profiles {
        println!("Profile: {} ({})", profile.name, profile.student_name_long);
        if profile.empty {
            println!("  State:    awaiting first import");
        }

        match repo.get_latest_sync_run(profile.id).await? {
            Some(run) => {
                println!("  Provider: {}", run.provider);
                println!("  Status:   {:?}", run.status);
                println!(
                    "  Started:  {}",
                    run.started_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
                if let Some(completed) = run.completed_at {
                    println!("  Completed: {}", completed.format("%Y-%m-%d %H:%M:%S UTC"));
                }
                if let Some(ref err) = run.error_message {
                    println!("  Error:    {}", err);
                }
                println!(
                    "  Endpoints: {} ok, {} failed",
                    run.succeeded_count(),
                    run.failed_count()
                );
            }
            None => {
                println!("  No sync runs recorded.");
            }
        }

        let unseen_grades = repo.count_unseen(profile.id, MetadataType::Grade).await?;
        let unseen_messages = repo.count_unseen(profile.id, MetadataType::Message).await?;
        let unseen_events = repo.count_unseen(profile.id, MetadataType::Event).await?
            + repo.count_unseen(profile.id, MetadataType::Homework).await?;
        println!(
            "  Unread:   {} grades, {} messages, {} events",
            unseen_grades, unseen_messages, unseen_events
        );
        println!();
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_displays_correctly() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(1073741824), "1.0 GB");
    }
}
