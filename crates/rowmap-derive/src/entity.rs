use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Field, Fields, Ident, Type};

use crate::attrs::{parse_entity_attrs, parse_field_attrs, Fetch, FieldAttrs, Relation};
use crate::util::{first_type_arg, is_path_ident};

///
/// FieldKind
///

enum FieldKind<'a> {
    Scalar,
    Reference(&'a Type),
    Collection(&'a Type),
}

struct EntityField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    kind: FieldKind<'a>,
    attrs: FieldAttrs,
}

fn classify(field: &Field) -> syn::Result<FieldKind<'_>> {
    let wrapper = if is_path_ident(&field.ty, "Ref") {
        "Ref"
    } else if is_path_ident(&field.ty, "Many") {
        "Many"
    } else {
        return Ok(FieldKind::Scalar);
    };

    let target = first_type_arg(&field.ty).ok_or_else(|| {
        Error::new_spanned(&field.ty, format!("{} needs a target entity type", wrapper))
    })?;
    Ok(if wrapper == "Ref" {
        FieldKind::Reference(target)
    } else {
        FieldKind::Collection(target)
    })
}

fn validate(field: &EntityField<'_>) -> syn::Result<()> {
    let attrs = &field.attrs;
    match (&field.kind, attrs.relation) {
        (FieldKind::Scalar, Some((_, span))) => {
            return Err(Error::new(
                span,
                "relation marker on a primitive field; use Ref<T> or Many<T>",
            ));
        }
        (FieldKind::Reference(_), Some((Relation::OneToMany, span))) => {
            return Err(Error::new(
                span,
                "Ref<T> is single-valued; use relation(one_to_one) or Many<T>",
            ));
        }
        (FieldKind::Collection(_), Some((Relation::OneToOne, span))) => {
            return Err(Error::new(
                span,
                "Many<T> is a collection; use relation(one_to_many) or Ref<T>",
            ));
        }
        _ => {}
    }

    match field.kind {
        FieldKind::Scalar => {
            if let Some(fk) = &attrs.foreign_key {
                return Err(Error::new_spanned(
                    fk,
                    "foreign_key only applies to Ref<T> and Many<T> fields",
                ));
            }
            if attrs.fetch == Fetch::Eager {
                return Err(Error::new_spanned(
                    field.ident,
                    "fetch only applies to Ref<T> and Many<T> fields",
                ));
            }
        }
        FieldKind::Reference(_) | FieldKind::Collection(_) if attrs.primary_key => {
            return Err(Error::new_spanned(
                field.ident,
                "primary key must be an integer or text field",
            ));
        }
        FieldKind::Collection(_) if attrs.foreign_key.is_none() => {
            return Err(Error::new_spanned(
                field.ident,
                "Many<T> needs foreign_key = \"...\" naming the back-reference column",
            ));
        }
        _ => {}
    }
    Ok(())
}

fn field_declaration(field: &EntityField<'_>) -> TokenStream {
    let name = field.ident.to_string();
    let ty = field.ty;
    let attrs = &field.attrs;

    let constructor = match field.kind {
        FieldKind::Scalar => quote! {
            ::rowmap::__private::FieldDeclaration::scalar::<#ty>(#name)
        },
        FieldKind::Reference(target) => quote! {
            ::rowmap::__private::FieldDeclaration::reference::<#target>(#name)
        },
        FieldKind::Collection(target) => quote! {
            ::rowmap::__private::FieldDeclaration::collection::<#target>(#name)
        },
    };

    let mut modifiers = Vec::new();
    if let Some(column) = &attrs.column {
        modifiers.push(quote!(.column(#column)));
    }
    if attrs.primary_key {
        modifiers.push(quote!(.primary_key()));
    }
    if attrs.generated {
        modifiers.push(quote!(.generated()));
    }
    if let Some(nullable) = attrs.nullable {
        modifiers.push(quote!(.nullable(#nullable)));
    }
    if attrs.unique {
        modifiers.push(quote!(.unique()));
    }
    if let Some(max) = attrs.max_length {
        modifiers.push(quote!(.max_length(#max)));
    }
    if let Some(fk) = &attrs.foreign_key {
        modifiers.push(quote!(.foreign_key(#fk)));
    }
    if attrs.fetch == Fetch::Eager {
        modifiers.push(quote!(.fetch(::rowmap::__private::FetchMode::Eager)));
    }

    quote! { #constructor #(#modifiers)* }
}

// derive_entity
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            ident,
            "Entity can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(Error::new_spanned(
            &data.fields,
            "Entity can only be derived for structs with named fields",
        ));
    };

    let entity_attrs = parse_entity_attrs(&input.attrs)?;

    let mut fields = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let Some(field_ident) = field.ident.as_ref() else {
            return Err(Error::new_spanned(field, "expected a named field"));
        };
        let entity_field = EntityField {
            ident: field_ident,
            ty: &field.ty,
            kind: classify(field)?,
            attrs: parse_field_attrs(&field.attrs)?,
        };
        validate(&entity_field)?;
        fields.push(entity_field);
    }

    let mut keys = fields.iter().filter(|f| f.attrs.primary_key);
    let Some(key) = keys.next() else {
        return Err(Error::new_spanned(
            ident,
            "Entity requires exactly one #[rowmap(primary_key)] field, found none",
        ));
    };
    if let Some(extra) = keys.next() {
        return Err(Error::new_spanned(
            extra.ident,
            "Entity requires exactly one #[rowmap(primary_key)] field, found more than one",
        ));
    }
    let key_ident = key.ident;
    let key_ty = key.ty;

    let entity_name = ident.to_string();
    let table = entity_attrs.table.map(|table| quote!(.table(#table)));
    let declarations = fields.iter().map(field_declaration);

    let persisted: Vec<&Ident> = fields
        .iter()
        .filter(|f| !matches!(f.kind, FieldKind::Collection(_)))
        .map(|f| f.ident)
        .collect();

    let inits = fields.iter().map(|f| {
        let field_ident = f.ident;
        match f.kind {
            FieldKind::Collection(_) => quote! {
                #field_ident: ::core::default::Default::default()
            },
            _ => quote! {
                #field_ident: row.read()?
            },
        }
    });

    let collections: Vec<TokenStream> = fields
        .iter()
        .filter_map(|f| match (&f.kind, &f.attrs.foreign_key) {
            (FieldKind::Collection(_), Some(fk)) => {
                let field_ident = f.ident;
                Some(quote! {
                    self.#field_ident.bind(::core::clone::Clone::clone(&owner), #fk);
                })
            }
            _ => None,
        })
        .collect();

    let bind_collections = if collections.is_empty() {
        quote!()
    } else {
        quote! {
            fn bind_collections(
                &mut self,
            ) -> ::core::result::Result<(), ::rowmap::__private::TypeMappingError> {
                let owner = ::rowmap::__private::ToColumn::to_column(&self.#key_ident)?;
                #(#collections)*
                ::core::result::Result::Ok(())
            }
        }
    };

    let eager: Vec<TokenStream> = fields
        .iter()
        .filter(|f| f.attrs.fetch == Fetch::Eager)
        .filter_map(|f| {
            let field_ident = f.ident;
            match f.kind {
                FieldKind::Reference(_) => Some(quote! { self.#field_ident.get(session)?; }),
                FieldKind::Collection(_) => Some(quote! { self.#field_ident.load(session)?; }),
                FieldKind::Scalar => None,
            }
        })
        .collect();

    let resolve_eager = if eager.is_empty() {
        quote!()
    } else {
        quote! {
            fn resolve_eager(
                &self,
                session: &::rowmap::Session,
            ) -> ::core::result::Result<(), ::rowmap::__private::PersistenceError> {
                #(#eager)*
                ::core::result::Result::Ok(())
            }
        }
    };

    let references: Vec<TokenStream> = fields
        .iter()
        .filter(|f| matches!(f.kind, FieldKind::Reference(_)))
        .map(|f| {
            let field_ident = f.ident;
            let name = field_ident.to_string();
            quote! {
                if self.#field_ident.is_unsaved() {
                    return ::core::option::Option::Some(#name);
                }
            }
        })
        .collect();

    let unsaved_reference = if references.is_empty() {
        quote!()
    } else {
        quote! {
            fn unsaved_reference(&self) -> ::core::option::Option<&'static str> {
                #(#references)*
                ::core::option::Option::None
            }
        }
    };

    Ok(quote! {
        impl ::rowmap::Entity for #ident {
            type Key = #key_ty;

            fn declaration() -> ::rowmap::__private::EntityDeclaration {
                ::rowmap::__private::EntityDeclaration::new::<Self>(#entity_name)
                    #table
                    #(.field(#declarations))*
            }

            fn key(&self) -> &Self::Key {
                &self.#key_ident
            }

            fn set_key(&mut self, key: Self::Key) {
                self.#key_ident = key;
            }

            fn to_row(
                &self,
            ) -> ::core::result::Result<
                ::std::vec::Vec<::rowmap::__private::Value>,
                ::rowmap::__private::TypeMappingError,
            > {
                ::core::result::Result::Ok(::std::vec![
                    #(::rowmap::__private::ToColumn::to_column(&self.#persisted)?),*
                ])
            }

            fn from_row(
                row: &mut ::rowmap::__private::RowReader,
            ) -> ::core::result::Result<Self, ::rowmap::__private::TypeMappingError> {
                ::core::result::Result::Ok(Self {
                    #(#inits),*
                })
            }

            #unsaved_reference

            #bind_collections

            #resolve_eager
        }
    })
}
