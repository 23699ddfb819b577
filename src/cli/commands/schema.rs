//! `inv schema` command - field schema introspection
//!
//! Lists every field key with its type tag so scripts can build `--set` and
//! `--filter` arguments without reading the source.

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::schema::EntityKind;

#[derive(clap::Args, Debug)]
pub struct SchemaArgs {
    /// Entity kind (item, product, part); all kinds when omitted
    pub kind: Option<EntityKind>,
}

pub fn run(args: SchemaArgs, global: &GlobalOpts) -> Result<()> {
    let kinds: Vec<EntityKind> = match args.kind {
        Some(kind) => vec![kind],
        None => EntityKind::all().to_vec(),
    };

    match global.format {
        OutputFormat::Json => {
            let mut out = serde_json::Map::new();
            for kind in &kinds {
                let fields: Vec<serde_json::Value> = kind
                    .schema()
                    .fields()
                    .iter()
                    .map(|spec| {
                        serde_json::json!({
                            "key": spec.key(),
                            "name": spec.display_name,
                            "type": spec.tag.as_str(),
                            "mutable": spec.tag.is_mutable(),
                            "choices": spec.tag.choices(),
                        })
                    })
                    .collect();
                out.insert(kind.to_string(), serde_json::Value::Array(fields));
            }
            let json = serde_json::to_string_pretty(&out).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => {
            for kind in &kinds {
                for key in kind.schema().keys() {
                    println!("{}", key);
                }
            }
        }
        OutputFormat::Csv => {
            println!("kind,key,name,type,mutable");
            for kind in &kinds {
                for spec in kind.schema().fields() {
                    println!(
                        "{},{},{},{},{}",
                        kind,
                        spec.key(),
                        spec.display_name,
                        spec.tag,
                        spec.tag.is_mutable()
                    );
                }
            }
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            for (n, kind) in kinds.iter().enumerate() {
                if n > 0 {
                    println!();
                }
                println!("{}", style(kind.as_str().to_uppercase()).bold().underlined());
                println!("{:<22} {:<14} {:<6} {}", "KEY", "NAME", "TYPE", "NOTES");
                for spec in kind.schema().fields() {
                    let mut notes = Vec::new();
                    if !spec.tag.is_mutable() {
                        notes.push("read-only".to_string());
                    }
                    if !spec.tag.choices().is_empty() {
                        notes.push(spec.tag.choices().join("|"));
                    }
                    println!(
                        "{:<22} {:<14} {:<6} {}",
                        style(spec.key()).cyan(),
                        spec.display_name,
                        spec.tag.as_str(),
                        style(notes.join(", ")).dim()
                    );
                }
            }
        }
    }
    Ok(())
}
