pub mod vehicles;

use motorpool_kernel::ModuleRegistry;

use vehicles::Catalog;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, catalog: Catalog) -> anyhow::Result<()> {
    registry.register(vehicles::create_module(catalog))
}
