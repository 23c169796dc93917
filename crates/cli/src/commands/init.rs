//! `roleplay init` — Write a sample configuration.

use std::path::PathBuf;

use roleplay_config::AppConfig;

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path.unwrap_or_else(AppConfig::config_path);

    println!("🎭 Roleplay — Setup");
    println!("===================\n");

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        } else {
            println!("  Config directory exists: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run init.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Edit the scene and [[characters]] in {}", config_path.display());
    println!("   2. Run: roleplay describe");
    println!("   3. Run: roleplay run\n");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_sample_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        run(Some(path.clone())).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[[characters]]"));

        std::fs::write(&path, "# edited").unwrap();
        run(Some(path.clone())).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited");

        let loaded = AppConfig::load_from(&dir.path().join("nested").join("missing.toml")).unwrap();
        assert!(loaded.characters.is_empty());
    }
}
