//! Attribute parsing for `#[script(...)]`.

use syn::meta::ParseNestedMeta;
use syn::{Attribute, LitStr, Path};

/// Parsed `#[script(...)]` attributes on a type.
#[derive(Default)]
pub struct ScriptAttrs {
    /// Engine base class
    pub base: Option<Path>,
    /// Override name (default: Rust struct name)
    pub name: Option<String>,
    pub overrides: Vec<String>,
    pub signals: Vec<String>,
    pub methods: Vec<String>,
}

impl ScriptAttrs {
    /// Parse attributes from a list of `#[script(...)]` attributes.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("script") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("base") {
                    result.base = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else if meta.path.is_ident("overrides") {
                    parse_name_list(&meta, &mut result.overrides)?;
                } else if meta.path.is_ident("signals") {
                    parse_name_list(&meta, &mut result.signals)?;
                } else if meta.path.is_ident("methods") {
                    parse_name_list(&meta, &mut result.methods)?;
                } else {
                    return Err(meta.error(format!(
                        "unknown script attribute: {}",
                        meta.path.get_ident().map(|i| i.to_string()).unwrap_or_default()
                    )));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

/// Parse `list(a, b, c)` into names, rejecting duplicates.
fn parse_name_list(meta: &ParseNestedMeta<'_>, out: &mut Vec<String>) -> syn::Result<()> {
    meta.parse_nested_meta(|item| {
        let ident = item
            .path
            .get_ident()
            .ok_or_else(|| item.error("expected a plain name"))?;
        let name = ident.to_string();
        if out.contains(&name) {
            return Err(item.error(format!("`{name}` is listed twice")));
        }
        out.push(name);
        Ok(())
    })
}
