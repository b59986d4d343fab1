//! The `guuk models` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use guuk_core::provider::{ModelCatalog, Provider};

pub fn execute(provider_filter: Option<Provider>) -> Result<()> {
    let catalog = ModelCatalog::builtin();

    let mut table = Table::new();
    table.set_header(vec!["Provider", "Content", "Model", "Name", "Default"]);
    for model in catalog.all() {
        if provider_filter.is_some_and(|p| p != model.provider) {
            continue;
        }
        table.add_row(vec![
            Cell::new(model.provider),
            Cell::new(model.content_type),
            Cell::new(&model.id),
            Cell::new(&model.name),
            Cell::new(if model.is_default { "yes" } else { "" }),
        ]);
    }
    println!("{table}");
    Ok(())
}
