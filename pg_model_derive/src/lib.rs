//! Contains a derive macro for [`Model`] which maps a struct with named fields onto a table row
//!
//! Container attributes, all optional:
//! * `#[model(table = "users")]` table name, defaults to the struct name in snake_case
//! * `#[model(crate = "path")]` path the generated code uses to reach the runtime, defaults to `::pg_model`
//!
//! Field attributes:
//! * `#[model(primary_key)]` part of the primary key (at least one field needs it)
//! * `#[model(generated)]` left out of inserts while it holds `NULL`, so the server default applies
//! * `#[model(column = "name")]` column name, defaults to the field name
//! * `#[model(skip)]` not persisted; rebuilt with `Default::default()`
//!
//! [`Model`]: https://docs.rs/pg_model/0.1/pg_model/trait.Model.html

extern crate proc_macro;

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Error, Fields, Ident, LitStr, Path, Result};

#[proc_macro_derive(Model, attributes(model))]
/// A derive macro for [`Model`]
///
/// [`Model`]: https://docs.rs/pg_model/0.1/pg_model/trait.Model.html
pub fn derive_model(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	expand(input).unwrap_or_else(Error::into_compile_error).into()
}

struct Container {
	table: String,
	krate: Path,
}

struct Field {
	ident: Ident,
	column: String,
	primary_key: bool,
	generated: bool,
	skip: bool,
}

fn expand(input: DeriveInput) -> Result<TokenStream> {
	let name = &input.ident;
	let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
	let container = parse_container(&input)?;

	let fields = match &input.data {
		Data::Struct(data) => match &data.fields {
			Fields::Named(named) => named.named.iter().map(parse_field).collect::<Result<Vec<_>>>()?,
			_ => return Err(Error::new(input.span(), "Model can only be derived for structs with named fields")),
		},
		_ => return Err(Error::new(input.span(), "Model can only be derived for structs")),
	};

	if !fields.iter().any(|f| f.primary_key) {
		return Err(Error::new(
			input.ident.span(),
			"Model needs at least one field marked #[model(primary_key)]",
		));
	}

	let krate = &container.krate;
	let table = &container.table;
	let persisted: Vec<&Field> = fields.iter().filter(|f| !f.skip).collect();

	let columns = persisted.iter().map(|f| &f.column);
	let primary_key = persisted.iter().filter(|f| f.primary_key).map(|f| &f.column);
	let generated = persisted.iter().filter(|f| f.generated).map(|f| &f.column);
	let capacity = persisted.len();

	let to_record: TokenStream = persisted
		.iter()
		.map(|f| {
			let ident = &f.ident;
			let column = &f.column;
			quote! {
				record.insert(#column, #krate::Value::from(::core::clone::Clone::clone(&self.#ident)));
			}
		})
		.collect();

	let from_record: TokenStream = fields
		.iter()
		.map(|f| {
			let ident = &f.ident;
			let column = &f.column;
			if f.skip {
				quote! { #ident: ::core::default::Default::default(), }
			} else {
				quote! { #ident: record.take(#column)?, }
			}
		})
		.collect();

	Ok(quote! {
		impl #impl_generics #krate::Model for #name #ty_generics #where_clause {
			const TABLE: &'static str = #table;
			const COLUMNS: &'static [&'static str] = &[#(#columns),*];
			const PRIMARY_KEY: &'static [&'static str] = &[#(#primary_key),*];
			const GENERATED: &'static [&'static str] = &[#(#generated),*];

			fn to_record(&self) -> #krate::Record {
				let mut record = #krate::Record::with_capacity(#capacity);
				#to_record
				record
			}

			fn from_record(mut record: #krate::Record) -> ::core::result::Result<Self, #krate::MapError> {
				::core::result::Result::Ok(Self { #from_record })
			}
		}
	})
}

fn parse_container(input: &DeriveInput) -> Result<Container> {
	let mut table = None;
	let mut krate = None;
	for attr in input.attrs.iter().filter(|a| a.path().is_ident("model")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("table") {
				table = Some(meta.value()?.parse::<LitStr>()?.value());
				Ok(())
			} else if meta.path.is_ident("crate") {
				krate = Some(meta.value()?.parse::<LitStr>()?.parse::<Path>()?);
				Ok(())
			} else {
				Err(meta.error("unsupported container attribute, expected `table` or `crate`"))
			}
		})?;
	}
	Ok(Container {
		table: table.unwrap_or_else(|| input.ident.to_string().to_snake_case()),
		krate: match krate {
			Some(k) => k,
			None => syn::parse_quote!(::pg_model),
		},
	})
}

fn parse_field(field: &syn::Field) -> Result<Field> {
	let ident = field
		.ident
		.clone()
		.ok_or_else(|| Error::new(field.span(), "expected a named field"))?;
	let mut parsed = Field {
		column: ident.to_string(),
		ident,
		primary_key: false,
		generated: false,
		skip: false,
	};
	for attr in field.attrs.iter().filter(|a| a.path().is_ident("model")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("primary_key") {
				parsed.primary_key = true;
			} else if meta.path.is_ident("generated") {
				parsed.generated = true;
			} else if meta.path.is_ident("skip") {
				parsed.skip = true;
			} else if meta.path.is_ident("column") {
				parsed.column = meta.value()?.parse::<LitStr>()?.value();
			} else {
				return Err(meta.error("unsupported field attribute, expected `primary_key`, `generated`, `column` or `skip`"));
			}
			Ok(())
		})?;
	}
	if parsed.skip && (parsed.primary_key || parsed.generated) {
		return Err(Error::new(field.span(), "a skipped field cannot be a primary key or generated column"));
	}
	Ok(parsed)
}
