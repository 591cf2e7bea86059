use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use descgen::Generator;

#[derive(Args)]
pub struct GenerateArgs {
    /// Path to the IDL JSON document
    input: PathBuf,

    /// Output directory (both files to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prefix of native declarations
    #[arg(long, default_value = "WGPU")]
    native_prefix: String,

    /// Prefix of host-visible class names
    #[arg(long, default_value = "GPU")]
    external_prefix: String,
}

impl GenerateArgs {
    pub fn run(self) -> Result<()> {
        let generator = Generator::builder()
            .with_native_prefix(self.native_prefix)
            .with_external_prefix(self.external_prefix)
            .build();
        let bindings = generator.generate_path(&self.input)?;
        let sources = bindings.render_cpp()?;

        match self.output {
            Some(dir) => {
                fs::create_dir_all(&dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                for (name, contents) in sources.files() {
                    let path = dir.join(name);
                    fs::write(&path, contents)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    log::info!("wrote {}", path.display());
                }
            }
            None => {
                for (name, contents) in sources.files() {
                    println!("// {name}");
                    print!("{contents}");
                }
            }
        }
        Ok(())
    }
}
