use stencil_gen::GeneratorError;
use stencil_gen::build::Builder;

fn main() -> Result<(), GeneratorError> {
    Builder::new()
        .config_file("stencil.toml")?
        .compile(&["decls/catalog.rs"])?;
    Ok(())
}
