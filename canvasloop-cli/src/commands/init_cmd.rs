use crate::config;

pub fn run(force: bool) -> anyhow::Result<()> {
    let path = config::write_default(&std::env::current_dir()?, force)?;
    log::info!("wrote default config");
    println!("Created {}", path.display());
    Ok(())
}
