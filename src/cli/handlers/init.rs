use crate::cli::commands::InitArgs;
use crate::store::json_store::{discover_board, JsonStore};
use crate::store::Store;

/// Infer a board name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.collect::<String>()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;

    // Check for an enclosing board and warn
    if let Some(parent) = cwd.parent()
        && let Ok(parent_root) = discover_board(parent)
    {
        eprintln!(
            "Note: enclosing board found at {}/",
            parent_root.join("drift").display()
        );
        eprintln!("Creating new board in ./drift/");
    }

    // Infer board name
    let name = args.name.unwrap_or_else(|| {
        cwd.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let mut store = JsonStore::init(&cwd, &name)?;

    // Extra layers beyond the starter one, cycling the palette
    for (n, layer_name) in args.layer.iter().enumerate() {
        let color = store.config().ui.layer_color(n + 1);
        store.create_layer(layer_name, &color)?;
    }

    // Print summary
    println!("Initialized drift board: {}", name);
    for layer in &store.board().layers {
        println!("  layer: {} ({})", layer.name, layer.id);
    }

    Ok(())
}
