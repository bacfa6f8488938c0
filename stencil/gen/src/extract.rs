//! The structural extractor.
//!
//! Reads one [`TypeDeclaration`] and produces its [`TypeInformation`], or
//! the first [`SynthesisError`] that makes the declaration unsynthesizable.
//! This is pure analysis over the `syn` tree: nothing is evaluated and no
//! file is touched.

use std::collections::HashSet;

use quote::ToTokens;
use stencil_define::{
    ArtifactKind, ArtifactSet, DeclarationKind, EntryPoint, EntryPointKind, FieldInfo, MethodInfo,
    Parameter, Receiver, SourceLocation, TagKind, TagUse, TypeInformation, TypeParameter,
};
use syn::spanned::Spanned;
use tracing::{debug, instrument, trace};

use crate::config::EngineConfig;
use crate::errors::{StructureError, SynthesisError, UsageError};
use crate::registry::{Element, TagRegistry};
use crate::source::{TypeDeclaration, location_of};
use crate::syntax::{categorize, free_idents, inner_type, outer_name, parse_expr, source_of};

/// Derives the engine synthesizes or withholds itself.
const SYNTHESIZED_DERIVES: &[&str] = &["PartialEq", "Eq", "Hash", "Default"];

/// Tags that may appear several times on one element.
const REPEATABLE: &[TagKind] = &[TagKind::Invariant, TagKind::Ensures];

/// Builds [`TypeInformation`] from declarations.
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    registry: &'a TagRegistry,
    config: &'a EngineConfig,
}

/// A function found in the declaration's impl blocks.
struct Candidate {
    attrs: Vec<syn::Attribute>,
    vis: syn::Visibility,
    sig: syn::Signature,
    body: Option<syn::Block>,
    location: SourceLocation,
}

impl<'a> Extractor<'a> {
    pub fn new(registry: &'a TagRegistry, config: &'a EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Extracts the Type Information of one declaration.
    #[instrument(skip_all, fields(type_name = %decl.item.ident))]
    pub fn extract(&self, decl: &TypeDeclaration) -> Result<TypeInformation, SynthesisError> {
        let file = decl.file.as_deref();
        let name = decl.name();
        let location = decl.location();

        let mut capabilities = Vec::new();
        let mut docs = Vec::new();
        let mut type_tags = Vec::new();
        let mut artifacts = ArtifactSet::all();
        let mut mutable = false;

        let element = Element::new(&name, DeclarationKind::Type, None);
        for attr in &decl.item.attrs {
            if attr.path().is_ident("derive") {
                capabilities.extend(self.capabilities(attr, &name, file)?);
                continue;
            }
            if let Some(doc) = doc_line(attr) {
                docs.push(doc);
                continue;
            }
            let Some(tag) = self.parse_tag(attr, &element, file)? else {
                continue;
            };
            if tag.kind == TagKind::Synth {
                (artifacts, mutable) = artifact_selection(&tag);
            } else {
                type_tags.push(tag);
            }
        }

        let (type_parameters, where_clause) = generics(&decl.item.generics, &name, &location)?;

        let syn::Fields::Named(named) = &decl.item.fields else {
            return Err(SynthesisError::structure(
                StructureError::UnnamedFields {
                    type_name: name.clone(),
                },
                location,
            ));
        };

        let mut declared = Vec::with_capacity(named.named.len());
        for field in &named.named {
            declared.push(self.field(field, &name, file)?);
        }
        let mut fields = assignment_order(declared);

        let (entry_point, methods) = self.members(decl, &name, file, &location)?;

        let mut parameter_fields = Vec::with_capacity(entry_point.parameters.len());
        for param in &entry_point.parameters {
            let Some(index) = fields.iter().position(|field| field.name == param.name) else {
                return Err(SynthesisError::structure(
                    StructureError::UnmatchedParameter {
                        type_name: name.clone(),
                        entry_point: entry_point.name.clone(),
                        parameter: param.name.clone(),
                    },
                    param.location.clone(),
                ));
            };
            if fields[index].is_derived() {
                return Err(SynthesisError::structure(
                    StructureError::DerivedParameter {
                        type_name: name.clone(),
                        field: param.name.clone(),
                    },
                    param.location.clone(),
                ));
            }
            fields[index].tags.extend(param.tags.iter().cloned());
            parameter_fields.push(index);
        }

        check_supply(&fields, &parameter_fields, &name)?;
        check_derivations(&fields, &name)?;

        debug!(
            fields = fields.len(),
            parameters = parameter_fields.len(),
            methods = methods.len(),
            "extracted"
        );

        Ok(TypeInformation {
            name,
            type_parameters,
            where_clause,
            capabilities,
            fields,
            entry_point,
            parameter_fields,
            methods,
            type_tags,
            artifacts,
            mutable,
            docs,
            location,
        })
    }

    fn parse_tag(
        &self,
        attr: &syn::Attribute,
        element: &Element<'_>,
        file: Option<&str>,
    ) -> Result<Option<TagUse>, SynthesisError> {
        let location = location_of(attr.span(), file);
        self.registry
            .parse(attr, element, location.clone())
            .map_err(|e| SynthesisError::usage(e, location))
    }

    /// Tags of one element, rejecting non-repeatable duplicates.
    fn tags(
        &self,
        attrs: &[syn::Attribute],
        element: &Element<'_>,
        file: Option<&str>,
    ) -> Result<Vec<TagUse>, SynthesisError> {
        let mut tags: Vec<TagUse> = Vec::new();
        for attr in attrs {
            let Some(tag) = self.parse_tag(attr, element, file)? else {
                continue;
            };
            if !REPEATABLE.contains(&tag.kind) && tags.iter().any(|t| t.kind == tag.kind) {
                return Err(SynthesisError::usage(
                    UsageError::DuplicateTag {
                        tag: tag.kind,
                        element: element.name.to_string(),
                    },
                    tag.location,
                ));
            }
            tags.push(tag);
        }
        Ok(tags)
    }

    fn capabilities(
        &self,
        attr: &syn::Attribute,
        type_name: &str,
        file: Option<&str>,
    ) -> Result<Vec<String>, SynthesisError> {
        let paths = attr
            .parse_args_with(
                syn::punctuated::Punctuated::<syn::Path, syn::Token![,]>::parse_terminated,
            )
            .map_err(|e| {
                SynthesisError::usage(
                    UsageError::MalformedArguments {
                        tag: TagKind::Synth,
                        element: type_name.to_string(),
                        reason: format!("unreadable derive list: {}", e),
                    },
                    location_of(attr.span(), file),
                )
            })?;
        Ok(paths
            .iter()
            .filter(|path| {
                let last = path.segments.last().map(|s| s.ident.to_string());
                !last.is_some_and(|ident| SYNTHESIZED_DERIVES.contains(&ident.as_str()))
            })
            .map(source_of)
            .collect())
    }

    fn field(
        &self,
        field: &syn::Field,
        type_name: &str,
        file: Option<&str>,
    ) -> Result<FieldInfo, SynthesisError> {
        let Some(ident) = &field.ident else {
            return Err(SynthesisError::structure(
                StructureError::UnnamedFields {
                    type_name: type_name.to_string(),
                },
                location_of(field.span(), file),
            ));
        };
        let name = ident.to_string();
        let category = categorize(&field.ty);
        let element = Element::new(&name, DeclarationKind::Field, Some(category));

        let mut info = FieldInfo::new(name.clone(), source_of(&field.ty), category);
        info.location = location_of(ident.span(), file);
        info.nullable = inner_type(&field.ty).is_some();
        info.docs = field.attrs.iter().filter_map(doc_line).collect();
        info.tags = self.tags(&field.attrs, &element, file)?;

        for tag in &info.tags {
            match tag.kind {
                TagKind::Default => info.default_expression = expression(tag),
                TagKind::Derived => info.derivation_expression = expression(tag),
                TagKind::Normalize => info.normalization_expression = expression(tag),
                TagKind::Order => info.order = tag.number().ok().and_then(|n| n.parse().ok()),
                TagKind::Helper => info.helper = true,
                TagKind::Property => info.property = true,
                _ => {}
            }
        }
        if outer_name(&field.ty).is_some_and(|outer| self.config.is_property_type(&outer)) {
            info.property = true;
        }

        if info.is_derived() {
            for other in [TagKind::Default, TagKind::Normalize, TagKind::Helper] {
                if info.has_tag(other) {
                    return Err(SynthesisError::structure(
                        StructureError::ConflictingTags {
                            type_name: type_name.to_string(),
                            field: name,
                            first: TagKind::Derived,
                            second: other,
                        },
                        info.location.clone(),
                    ));
                }
            }
        }

        info.is_mandatory = !info.is_derived() && !info.is_optional();
        trace!(field = %info.name, mandatory = info.is_mandatory, "field");
        Ok(info)
    }

    /// Splits the impl blocks into the single entry point and the carried
    /// methods.
    fn members(
        &self,
        decl: &TypeDeclaration,
        type_name: &str,
        file: Option<&str>,
        location: &SourceLocation,
    ) -> Result<(EntryPoint, Vec<MethodInfo>), SynthesisError> {
        let mut entry_points = Vec::new();
        let mut methods = Vec::new();

        let candidates = decl
            .impls
            .iter()
            .flat_map(|block| &block.items)
            .filter_map(|item| impl_fn(item, file));
        for candidate in candidates {
            let method_name = candidate.sig.ident.to_string();
            let element = Element::new(&method_name, DeclarationKind::Method, None);
            let tags = self.tags(&candidate.attrs, &element, file)?;

            let entry_kind = tags.iter().find_map(|tag| match tag.kind {
                TagKind::Reconstruct => Some(EntryPointKind::Constructor),
                TagKind::Factory => Some(EntryPointKind::Factory),
                _ => None,
            });
            match entry_kind {
                Some(kind) => entry_points.push(self.entry_point(kind, &candidate, type_name, file)?),
                None => methods.push(self.method(candidate, tags, type_name, file)?),
            }
        }

        match entry_points.len() {
            0 => Err(SynthesisError::structure(
                StructureError::MissingEntryPoint {
                    type_name: type_name.to_string(),
                },
                location.clone(),
            )),
            1 => Ok((entry_points.remove(0), methods)),
            _ => Err(SynthesisError::structure(
                StructureError::MultipleEntryPoints {
                    type_name: type_name.to_string(),
                    names: entry_points.iter().map(|ep| ep.name.clone()).collect(),
                },
                entry_points[1].location.clone(),
            )),
        }
    }

    fn entry_point(
        &self,
        kind: EntryPointKind,
        candidate: &Candidate,
        type_name: &str,
        file: Option<&str>,
    ) -> Result<EntryPoint, SynthesisError> {
        let name = candidate.sig.ident.to_string();
        let invalid = |reason: &str| {
            SynthesisError::structure(
                StructureError::InvalidEntryPoint {
                    type_name: type_name.to_string(),
                    entry_point: name.clone(),
                    reason: reason.to_string(),
                },
                candidate.location.clone(),
            )
        };
        if candidate.body.as_ref().is_some_and(|body| !body.stmts.is_empty()) {
            return Err(invalid("must not have a body; it is synthesized"));
        }
        if !candidate.sig.generics.params.is_empty() {
            return Err(invalid("must not declare generic parameters"));
        }

        let mut parameters = Vec::new();
        for input in &candidate.sig.inputs {
            let syn::FnArg::Typed(typed) = input else {
                return Err(invalid("must not take a receiver"));
            };
            let syn::Pat::Ident(pat) = typed.pat.as_ref() else {
                return Err(invalid("parameters must be plain identifiers"));
            };
            let param_name = pat.ident.to_string();
            let element = Element::new(
                &param_name,
                DeclarationKind::Parameter,
                Some(categorize(&typed.ty)),
            );
            let tags = self.tags(&typed.attrs, &element, file)?;
            parameters.push(Parameter {
                name: param_name.clone(),
                declared_type: source_of(&typed.ty),
                tags,
                location: location_of(pat.ident.span(), file),
            });
        }

        debug!(entry_point = %name, %kind, parameters = parameters.len(), "entry point");
        Ok(EntryPoint {
            kind,
            name,
            parameters,
            location: candidate.location.clone(),
        })
    }

    fn method(
        &self,
        candidate: Candidate,
        tags: Vec<TagUse>,
        type_name: &str,
        file: Option<&str>,
    ) -> Result<MethodInfo, SynthesisError> {
        let name = candidate.sig.ident.to_string();
        let Some(body) = candidate.body else {
            return Err(SynthesisError::structure(
                StructureError::BodilessMethod {
                    type_name: type_name.to_string(),
                    method: name,
                },
                candidate.location,
            ));
        };

        let mut receiver = Receiver::None;
        let mut parameters = Vec::new();
        for (index, input) in candidate.sig.inputs.iter().enumerate() {
            match input {
                syn::FnArg::Receiver(recv) => {
                    receiver = match (&recv.reference, &recv.mutability) {
                        (Some(_), Some(_)) => Receiver::Exclusive,
                        (Some(_), None) => Receiver::Shared,
                        (None, _) => Receiver::Owned,
                    };
                }
                syn::FnArg::Typed(typed) => {
                    let param_name = match typed.pat.as_ref() {
                        syn::Pat::Ident(pat) => pat.ident.to_string(),
                        _ => format!("__arg{}", index),
                    };
                    parameters.push(Parameter {
                        name: param_name,
                        declared_type: source_of(&typed.ty),
                        tags: Vec::new(),
                        location: location_of(typed.span(), file),
                    });
                }
            }
        }

        let output = match &candidate.sig.output {
            syn::ReturnType::Default => None,
            syn::ReturnType::Type(_, ty) => Some(source_of(ty)),
        };

        let registry = self.registry;
        let item = syn::ImplItemFn {
            attrs: candidate
                .attrs
                .into_iter()
                .filter(|attr| registry.recognize(attr).is_none())
                .collect(),
            vis: candidate.vis,
            defaultness: None,
            sig: candidate.sig,
            block: body,
        };

        Ok(MethodInfo {
            name,
            source: item.to_token_stream().to_string(),
            interceptors: tags
                .iter()
                .map(|tag| tag.kind)
                .filter(|kind| kind.is_interceptor())
                .collect(),
            receiver,
            parameters,
            output,
            generic: !item.sig.generics.params.is_empty(),
            location: candidate.location,
        })
    }
}

fn impl_fn(item: &syn::ImplItem, file: Option<&str>) -> Option<Candidate> {
    match item {
        syn::ImplItem::Fn(f) => Some(Candidate {
            attrs: f.attrs.clone(),
            vis: f.vis.clone(),
            sig: f.sig.clone(),
            body: Some(f.block.clone()),
            location: location_of(f.sig.ident.span(), file),
        }),
        // `fn name(..) -> Self;` has no body and is kept verbatim by syn.
        syn::ImplItem::Verbatim(tokens) => {
            let f: syn::ForeignItemFn = syn::parse2(tokens.clone()).ok()?;
            Some(Candidate {
                location: location_of(f.sig.ident.span(), file),
                attrs: f.attrs,
                vis: f.vis,
                sig: f.sig,
                body: None,
            })
        }
        _ => None,
    }
}

fn expression(tag: &TagUse) -> Option<String> {
    tag.expression().ok().map(str::to_string)
}

fn doc_line(attr: &syn::Attribute) -> Option<String> {
    if !attr.path().is_ident("doc") {
        return None;
    }
    match &attr.meta {
        syn::Meta::NameValue(syn::MetaNameValue {
            value:
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(text),
                    ..
                }),
            ..
        }) => Some(text.value().trim().to_string()),
        _ => None,
    }
}

/// Reads `#[synth(..)]` flags. Without artifact flags every artifact is
/// requested; `mutable` alone does not narrow the selection.
fn artifact_selection(tag: &TagUse) -> (ArtifactSet, bool) {
    let flags = tag.flags().unwrap_or_default();
    let mutable = flags.iter().any(|flag| flag == "mutable");
    let requested: Vec<ArtifactKind> = flags
        .iter()
        .filter_map(|flag| flag.parse::<ArtifactKind>().ok())
        .collect();
    if requested.is_empty() {
        return (ArtifactSet::all(), mutable);
    }
    let mut set = ArtifactSet::implementation_only();
    for kind in requested {
        set.insert(kind);
    }
    (set, mutable)
}

fn generics(
    generics: &syn::Generics,
    type_name: &str,
    location: &SourceLocation,
) -> Result<(Vec<TypeParameter>, Option<String>), SynthesisError> {
    let mut params = Vec::new();
    for param in &generics.params {
        let unsupported = |kind: &'static str, name: String| {
            SynthesisError::usage(
                UsageError::UnsupportedGeneric {
                    type_name: type_name.to_string(),
                    kind,
                    name,
                },
                location.clone(),
            )
        };
        match param {
            syn::GenericParam::Type(ty) => params.push(TypeParameter::new(
                ty.ident.to_string(),
                ty.bounds.iter().map(source_of),
            )),
            syn::GenericParam::Lifetime(lt) => {
                return Err(unsupported("lifetime", lt.lifetime.to_string()));
            }
            syn::GenericParam::Const(c) => return Err(unsupported("const", c.ident.to_string())),
        }
    }
    let where_clause = generics
        .where_clause
        .as_ref()
        .filter(|clause| !clause.predicates.is_empty())
        .map(|clause| source_of(&clause.predicates));
    Ok((params, where_clause))
}

/// `#[order]` fields by ascending order (ties by declaration order), then
/// untagged fields, then property fields, each group keeping declaration
/// order.
fn assignment_order(declared: Vec<FieldInfo>) -> Vec<FieldInfo> {
    let (properties, regular): (Vec<_>, Vec<_>) =
        declared.into_iter().partition(|field| field.property);
    let (mut ordered, unordered): (Vec<_>, Vec<_>) =
        regular.into_iter().partition(|field| field.order.is_some());
    ordered.sort_by_key(|field| field.order);
    ordered.into_iter().chain(unordered).chain(properties).collect()
}

/// Every non-derived field must be suppliable.
fn check_supply(
    fields: &[FieldInfo],
    parameter_fields: &[usize],
    type_name: &str,
) -> Result<(), SynthesisError> {
    for (index, field) in fields.iter().enumerate() {
        if field.helper && field.default_expression.is_none() && !field.nullable {
            return Err(SynthesisError::structure(
                StructureError::HelperWithoutDefault {
                    type_name: type_name.to_string(),
                    field: field.name.clone(),
                },
                field.location.clone(),
            ));
        }
        if !field.is_derived() && !field.is_optional() && !parameter_fields.contains(&index) {
            return Err(SynthesisError::structure(
                StructureError::UnsuppliedField {
                    type_name: type_name.to_string(),
                    field: field.name.clone(),
                },
                field.location.clone(),
            ));
        }
    }
    Ok(())
}

/// A derivation may only read fields assigned before it.
fn check_derivations(fields: &[FieldInfo], type_name: &str) -> Result<(), SynthesisError> {
    let names: HashSet<&str> = fields.iter().map(|field| field.name.as_str()).collect();
    for (index, field) in fields.iter().enumerate() {
        let Some(source) = &field.derivation_expression else {
            continue;
        };
        let expr = parse_expr(source).map_err(|e| {
            SynthesisError::usage(
                UsageError::MalformedArguments {
                    tag: TagKind::Derived,
                    element: field.name.clone(),
                    reason: e.to_string(),
                },
                field.location.clone(),
            )
        })?;
        for reference in free_idents(expr.to_token_stream()) {
            if !names.contains(reference.as_str()) {
                continue;
            }
            let assigned_before = fields[..index].iter().any(|f| f.name == reference);
            if !assigned_before {
                return Err(SynthesisError::structure(
                    StructureError::ForwardReference {
                        type_name: type_name.to_string(),
                        field: field.name.clone(),
                        reference,
                    },
                    field.location.clone(),
                ));
            }
        }
    }
    Ok(())
}
