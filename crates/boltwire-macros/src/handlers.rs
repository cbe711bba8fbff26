//! `#[slack_handlers]` implementation.
//!
//! # Expansion
//!
//! ```rust,ignore
//! #[slack_handlers]
//! impl Greeter {
//!     #[message("hello")]
//!     async fn hello(&self, args: ListenerArgs) { /* … */ }
//! }
//! ```
//!
//! becomes the unmarked `impl Greeter` followed by
//!
//! ```rust,ignore
//! const _: () = {
//!     static __BOLTWIRE_HANDLERS: [HandlerEntry; 1] = [HandlerEntry {
//!         method: "hello",
//!         metadata: || HandlerMetadata::Message(MessagePattern(Some(Pattern::exact("hello")))),
//!         invoke: |instance, args| Box::pin(async move { /* downcast, call, convert */ }),
//!     }];
//!
//!     #[distributed_slice(HANDLER_REGISTRY)]
//!     static __BOLTWIRE_HANDLER_SET: HandlerSet = HandlerSet {
//!         owner: TypeId::of::<Greeter>,
//!         owner_name: "Greeter",
//!         handlers: &__BOLTWIRE_HANDLERS,
//!     };
//! };
//! ```

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Attribute, Error, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Meta, Token, Type,
    parenthesized,
};

const MARKERS: [&str; 6] = ["message", "action", "command", "event", "shortcut", "view"];

// ============================================================================
// Marker arguments
// ============================================================================

/// `"literal"` or `regex("source")`.
enum PatternArg {
    Exact(LitStr),
    Regex(LitStr),
}

impl PatternArg {
    fn literal(&self) -> &LitStr {
        match self {
            Self::Exact(lit) | Self::Regex(lit) => lit,
        }
    }
}

impl Parse for PatternArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            return Ok(Self::Exact(input.parse()?));
        }

        let ident: Ident = input.parse()?;
        if ident != "regex" {
            return Err(Error::new(
                ident.span(),
                "expected a string literal or `regex(\"…\")`",
            ));
        }
        let content;
        parenthesized!(content in input);
        let source: LitStr = content.parse()?;
        if !content.is_empty() {
            return Err(content.error("`regex(…)` takes a single string literal"));
        }
        Ok(Self::Regex(source))
    }
}

impl ToTokens for PatternArg {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(match self {
            Self::Exact(lit) => quote!(::boltwire_core::Pattern::exact(#lit)),
            Self::Regex(lit) => quote!(::boltwire_core::Pattern::regex(#lit)),
        });
    }
}

enum MarkerArg {
    Positional(PatternArg),
    Named { key: Ident, value: PatternArg },
}

impl Parse for MarkerArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(Ident) && input.peek2(Token![=]) {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value = input.parse()?;
            Ok(Self::Named { key, value })
        } else {
            Ok(Self::Positional(input.parse()?))
        }
    }
}

/// A parsed category marker, e.g. `#[action(block_id = "b", "approve")]`.
struct Marker {
    name: Ident,
    positional: Option<PatternArg>,
    named: Vec<(Ident, PatternArg)>,
}

impl Marker {
    fn parse(attr: &Attribute) -> syn::Result<Option<Self>> {
        let Some(name) = attr.path().get_ident() else {
            return Ok(None);
        };
        if !MARKERS.iter().any(|marker| name == marker) {
            return Ok(None);
        }

        let args: Vec<MarkerArg> = match &attr.meta {
            Meta::Path(_) => Vec::new(),
            Meta::List(_) => attr
                .parse_args_with(Punctuated::<MarkerArg, Token![,]>::parse_terminated)?
                .into_iter()
                .collect(),
            Meta::NameValue(meta) => {
                return Err(Error::new(
                    meta.span(),
                    format!("use `#[{name}(…)]` instead of `#[{name} = …]`"),
                ));
            }
        };

        let mut marker = Self {
            name: name.clone(),
            positional: None,
            named: Vec::new(),
        };
        for arg in args {
            match arg {
                MarkerArg::Positional(value) => {
                    if marker.positional.is_some() {
                        return Err(Error::new(
                            value.literal().span(),
                            format!("#[{name}] takes at most one positional pattern"),
                        ));
                    }
                    marker.positional = Some(value);
                }
                MarkerArg::Named { key, value } => {
                    if marker.named.iter().any(|(existing, _)| *existing == key) {
                        return Err(Error::new(key.span(), format!("duplicate key `{key}`")));
                    }
                    marker.named.push((key, value));
                }
            }
        }
        Ok(Some(marker))
    }

    fn take(&mut self, key: &str) -> Option<PatternArg> {
        let index = self.named.iter().position(|(k, _)| k == key)?;
        Some(self.named.remove(index).1)
    }

    /// An id constraint given either positionally or as `key = …`.
    fn take_id(&mut self, key: &str) -> syn::Result<Option<PatternArg>> {
        match (self.positional.take(), self.take(key)) {
            (Some(_), Some(named)) => Err(Error::new(
                named.literal().span(),
                format!("`{key}` given both positionally and by name"),
            )),
            (positional, named) => Ok(positional.or(named)),
        }
    }

    fn take_required(&mut self, what: &str) -> syn::Result<PatternArg> {
        self.positional.take().ok_or_else(|| {
            Error::new(
                self.name.span(),
                format!("#[{}] requires a {what} pattern", self.name),
            )
        })
    }

    /// `kind = "…"`, which must be a literal.
    fn take_kind(&mut self) -> syn::Result<Option<LitStr>> {
        match self.take("kind") {
            None => Ok(None),
            Some(PatternArg::Exact(lit)) => Ok(Some(lit)),
            Some(PatternArg::Regex(lit)) => Err(Error::new(
                lit.span(),
                "`kind` must be a string literal",
            )),
        }
    }

    /// Rejects anything the category did not consume.
    fn finish(self) -> syn::Result<()> {
        if let Some(positional) = self.positional {
            return Err(Error::new(
                positional.literal().span(),
                format!("#[{}] does not take a positional pattern", self.name),
            ));
        }
        if let Some((key, _)) = self.named.first() {
            return Err(Error::new(
                key.span(),
                format!("unknown key `{key}` for #[{}]", self.name),
            ));
        }
        Ok(())
    }

    fn metadata(mut self) -> syn::Result<TokenStream> {
        let name = self.name.to_string();
        let tokens = match name.as_str() {
            "message" => {
                let pattern = match self.positional.take() {
                    Some(pattern) => quote! {
                        ::boltwire_core::MessagePattern(::std::option::Option::Some(#pattern))
                    },
                    None => quote!(::boltwire_core::MessagePattern::any()),
                };
                quote!(::boltwire_core::HandlerMetadata::Message(#pattern))
            }
            "action" => {
                let action_id = optional(self.take_id("action_id")?);
                let block_id = optional(self.take("block_id"));
                let callback_id = optional(self.take("callback_id"));
                let kind = match self.take_kind()? {
                    Some(lit) => quote! {
                        ::std::option::Option::Some(::std::borrow::Cow::Borrowed(#lit))
                    },
                    None => quote!(::std::option::Option::None),
                };
                quote! {
                    ::boltwire_core::HandlerMetadata::Action(::boltwire_core::ActionConstraints {
                        action_id: #action_id,
                        block_id: #block_id,
                        callback_id: #callback_id,
                        kind: #kind,
                    })
                }
            }
            "command" => {
                let pattern = self.take_required("command name")?;
                quote!(::boltwire_core::HandlerMetadata::Command(#pattern))
            }
            "event" => {
                let pattern = self.take_required("event type")?;
                quote!(::boltwire_core::HandlerMetadata::Event(#pattern))
            }
            "shortcut" => {
                let callback_id = optional(self.take_id("callback_id")?);
                let kind = match self.take_kind()? {
                    None => quote!(::std::option::Option::None),
                    Some(lit) => match lit.value().as_str() {
                        "shortcut" => quote! {
                            ::std::option::Option::Some(::boltwire_core::ShortcutKind::Global)
                        },
                        "message_action" => quote! {
                            ::std::option::Option::Some(::boltwire_core::ShortcutKind::Message)
                        },
                        _ => {
                            return Err(Error::new(
                                lit.span(),
                                "expected `kind = \"shortcut\"` or `kind = \"message_action\"`",
                            ));
                        }
                    },
                };
                quote! {
                    ::boltwire_core::HandlerMetadata::Shortcut(::boltwire_core::ShortcutConstraints {
                        callback_id: #callback_id,
                        kind: #kind,
                    })
                }
            }
            "view" => {
                let callback_id = optional(self.take_id("callback_id")?);
                let kind = match self.take_kind()? {
                    None => quote!(::boltwire_core::ViewKind::Submission),
                    Some(lit) => match lit.value().as_str() {
                        "view_submission" => quote!(::boltwire_core::ViewKind::Submission),
                        "view_closed" => quote!(::boltwire_core::ViewKind::Closed),
                        _ => {
                            return Err(Error::new(
                                lit.span(),
                                "expected `kind = \"view_submission\"` or `kind = \"view_closed\"`",
                            ));
                        }
                    },
                };
                quote! {
                    ::boltwire_core::HandlerMetadata::View(::boltwire_core::ViewConstraints {
                        callback_id: #callback_id,
                        kind: #kind,
                    })
                }
            }
            _ => unreachable!("marker names are checked in Marker::parse"),
        };
        self.finish()?;
        Ok(tokens)
    }
}

fn optional(pattern: Option<PatternArg>) -> TokenStream {
    match pattern {
        Some(pattern) => quote!(::std::option::Option::Some(#pattern)),
        None => quote!(::std::option::Option::None),
    }
}

// ============================================================================
// Entry point
// ============================================================================

pub fn expand(mut item: ItemImpl) -> syn::Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(Error::new(
            path.span(),
            "#[slack_handlers] must be placed on an inherent impl block",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "#[slack_handlers] does not support generic impl blocks",
        ));
    }

    let self_ty = (*item.self_ty).clone();
    let owner_name = self_ty.to_token_stream().to_string().replace(' ', "");

    let mut entries = Vec::new();
    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        let Some(marker) = take_marker(method)? else {
            continue;
        };
        check_signature(method)?;
        entries.push(handler_entry(&self_ty, &owner_name, &method.sig.ident, marker)?);
    }

    if entries.is_empty() {
        return Ok(quote!(#item));
    }

    let count = entries.len();
    Ok(quote! {
        #item

        const _: () = {
            static __BOLTWIRE_HANDLERS: [::boltwire_core::HandlerEntry; #count] = [#(#entries),*];

            #[::boltwire_core::linkme::distributed_slice(::boltwire_core::HANDLER_REGISTRY)]
            #[linkme(crate = ::boltwire_core::linkme)]
            static __BOLTWIRE_HANDLER_SET: ::boltwire_core::HandlerSet = ::boltwire_core::HandlerSet {
                owner: ::std::any::TypeId::of::<#self_ty>,
                owner_name: #owner_name,
                handlers: &__BOLTWIRE_HANDLERS,
            };
        };
    })
}

/// Strips category markers from `method`, returning the single one found.
fn take_marker(method: &mut ImplItemFn) -> syn::Result<Option<Marker>> {
    let mut found: Option<Marker> = None;
    let mut kept = Vec::with_capacity(method.attrs.len());

    for attr in std::mem::take(&mut method.attrs) {
        match Marker::parse(&attr)? {
            Some(marker) => {
                if let Some(first) = &found {
                    return Err(Error::new(
                        attr.span(),
                        format!(
                            "`{}` is already marked #[{}]; a handler has exactly one category",
                            method.sig.ident, first.name
                        ),
                    ));
                }
                found = Some(marker);
            }
            None => kept.push(attr),
        }
    }

    method.attrs = kept;
    Ok(found)
}

fn check_signature(method: &ImplItemFn) -> syn::Result<()> {
    let sig = &method.sig;

    if sig.asyncness.is_none() {
        return Err(Error::new(
            sig.fn_token.span(),
            "Slack handler methods must be `async fn`",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(Error::new(
            sig.generics.span(),
            "Slack handler methods cannot be generic",
        ));
    }

    let mut inputs = sig.inputs.iter();
    let receiver_ok = matches!(
        inputs.next(),
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none()
    );
    let args_ok = matches!(inputs.next(), Some(FnArg::Typed(_)));
    if !receiver_ok || !args_ok || inputs.next().is_some() {
        return Err(Error::new(
            sig.inputs.span(),
            "Slack handler methods take `&self` and a single `ListenerArgs` argument",
        ));
    }
    Ok(())
}

fn handler_entry(
    self_ty: &Type,
    owner_name: &str,
    method: &Ident,
    marker: Marker,
) -> syn::Result<TokenStream> {
    let metadata = marker.metadata()?;
    let method_name = method.to_string();

    Ok(quote! {
        ::boltwire_core::HandlerEntry {
            method: #method_name,
            metadata: || #metadata,
            invoke: |instance: ::boltwire_core::Instance,
                     args: ::boltwire_core::ListenerArgs|
             -> ::boltwire_core::BoxFuture<'static, ::boltwire_core::ListenerResult> {
                ::std::boxed::Box::pin(async move {
                    match instance.downcast::<#self_ty>() {
                        ::std::result::Result::Ok(this) => {
                            ::boltwire_core::IntoListenerResult::into_listener_result(
                                this.#method(args).await,
                            )
                        }
                        ::std::result::Result::Err(_) => ::std::result::Result::Err(
                            ::boltwire_core::listener::owner_mismatch(#owner_name),
                        ),
                    }
                })
            },
        }
    })
}
