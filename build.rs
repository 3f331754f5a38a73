use shadow_rs::{ShadowBuilder, ShadowError};

// Build metadata behind `--version` and the health endpoint.
fn main() -> Result<(), ShadowError> {
    ShadowBuilder::builder().build()?;
    Ok(())
}
