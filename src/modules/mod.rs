pub mod accounts;
pub mod catalog;

use catalog_kernel::ModuleRegistry;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry) -> anyhow::Result<()> {
    registry.register_custom(accounts::create_module())?;
    registry.register_custom(catalog::create_module())?;
    Ok(())
}
