//! `schema` handler: describes record types without contacting a server.

use serde::Serialize;
use tabled::Tabled;

use mwdns_core::{FieldSpec, SchemaRegistry};

use crate::cli::{GlobalOpts, SchemaArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Example")]
    example: String,
}

impl From<&FieldSpec> for FieldRow {
    fn from(f: &FieldSpec) -> Self {
        let kind = if f.chunked {
            format!("{} (chunked)", f.kind)
        } else {
            f.kind.to_string()
        };
        Self {
            name: f.name.clone(),
            label: f.label.clone(),
            kind,
            example: f.example.clone(),
        }
    }
}

#[derive(Clone, Serialize, Tabled)]
struct TypeRow {
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    type_name: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

pub fn handle(args: &SchemaArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = SchemaRegistry::builtin();

    let out = if let Some(ref type_name) = args.r#type {
        let fields = registry.fields(type_name)?;
        output::render_list(&global.output, fields, |f| FieldRow::from(f), |f| f.name.clone())
    } else {
        let types: Vec<TypeRow> = registry
            .types()
            .map(|t| TypeRow {
                type_name: t.to_owned(),
                fields: registry
                    .fields(t)
                    .map(|fs| fs.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(" "))
                    .unwrap_or_default(),
            })
            .collect();
        output::render_list(&global.output, &types, Clone::clone, |t| t.type_name.clone())
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
