use proc_macro2::Span;
use syn::{Attribute, LitBool, LitInt, LitStr, Token};

#[derive(Default)]
pub struct EntityAttrs {
    pub table: Option<LitStr>,
}

pub fn parse_entity_attrs(attrs: &[Attribute]) -> syn::Result<EntityAttrs> {
    let mut out = EntityAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("rowmap")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                out.table = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported struct attribute, expected `table = \"...\"`"))
            }
        })?;
    }
    Ok(out)
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    OneToOne,
    OneToMany,
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum Fetch {
    #[default]
    Lazy,
    Eager,
}

#[derive(Default)]
pub struct FieldAttrs {
    pub primary_key: bool,
    pub generated: bool,
    pub column: Option<LitStr>,
    pub nullable: Option<bool>,
    pub unique: bool,
    pub max_length: Option<usize>,
    pub relation: Option<(Relation, Span)>,
    pub foreign_key: Option<LitStr>,
    pub fetch: Fetch,
}

pub fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("rowmap")) {
        attr.parse_nested_meta(|meta| {
            let path = &meta.path;
            if path.is_ident("primary_key") {
                out.primary_key = true;
            } else if path.is_ident("generated") {
                out.generated = true;
            } else if path.is_ident("unique") {
                out.unique = true;
            } else if path.is_ident("nullable") {
                let nullable = if meta.input.peek(Token![=]) {
                    meta.value()?.parse::<LitBool>()?.value
                } else {
                    true
                };
                out.nullable = Some(nullable);
            } else if path.is_ident("column") {
                out.column = Some(meta.value()?.parse()?);
            } else if path.is_ident("foreign_key") {
                out.foreign_key = Some(meta.value()?.parse()?);
            } else if path.is_ident("max_length") {
                let lit: LitInt = meta.value()?.parse()?;
                out.max_length = Some(lit.base10_parse()?);
            } else if path.is_ident("fetch") {
                let lit: LitStr = meta.value()?.parse()?;
                out.fetch = match lit.value().as_str() {
                    "lazy" => Fetch::Lazy,
                    "eager" => Fetch::Eager,
                    _ => {
                        return Err(syn::Error::new_spanned(
                            lit,
                            "expected fetch = \"lazy\" or fetch = \"eager\"",
                        ))
                    }
                };
            } else if path.is_ident("relation") {
                let span = path
                    .get_ident()
                    .map_or_else(Span::call_site, |ident| ident.span());
                meta.parse_nested_meta(|inner| {
                    let relation = if inner.path.is_ident("one_to_one") {
                        Relation::OneToOne
                    } else if inner.path.is_ident("one_to_many") {
                        Relation::OneToMany
                    } else {
                        return Err(inner.error("expected `one_to_one` or `one_to_many`"));
                    };
                    out.relation = Some((relation, span));
                    Ok(())
                })?;
            } else {
                return Err(meta.error("unsupported rowmap field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}
