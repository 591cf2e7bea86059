use std::{fs, path::PathBuf};

use anyhow::Result;
use clap::Args;
use descgen::Generator;

#[derive(Args)]
pub struct SchemaArgs {
    /// Path to the IDL JSON document
    input: PathBuf,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SchemaArgs {
    pub fn run(self) -> Result<()> {
        let generator = Generator::new();
        let bindings = generator.generate_path(&self.input)?;
        let text = bindings.format_schema()?;

        match self.output {
            Some(path) => fs::write(path, text)?,
            None => print!("{text}"),
        }
        Ok(())
    }
}
