//! Configuration display command.

use console::style;

use pagefuse::config::Config;

pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match &config.source_path {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# No config file found, using defaults"),
    }
    if config.vision.api_key.is_none() {
        eprintln!(
            "{} vision API key not set (VISION_API_KEY or DASHSCOPE_API_KEY)",
            style("!").yellow()
        );
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
