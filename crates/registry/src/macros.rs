/// Declares a destination type at link time.
///
/// ```ignore
/// weave_registry::declare_type!("app::Widget");
/// weave_registry::declare_type!("app::Config", sealed);
/// ```
#[macro_export]
macro_rules! declare_type {
	($name:literal) => {
		$crate::__inventory::submit! { $crate::TypeDecl::extensible($name) }
	};
	($name:literal, sealed) => {
		$crate::__inventory::submit! { $crate::TypeDecl::sealed($name) }
	};
}

/// Defines a named behavior unit at link time.
///
/// `$make` is evaluated on every materialization. The kind defaults to `Composable`.
///
/// ```ignore
/// weave_registry::composition!("app::Greets" => Greeter);
/// weave_registry::composition!("app::Session" => Session::default(), Concrete);
/// ```
#[macro_export]
macro_rules! composition {
	($name:literal => $make:expr $(, $kind:ident)? $(,)?) => {
		$crate::__inventory::submit! {
			$crate::CompositionDef {
				name: $name,
				kind: $crate::__unit_kind!($($kind)?),
				factory: {
					fn make() -> ::std::sync::Arc<dyn $crate::Behavior> {
						::std::sync::Arc::new($make)
					}
					make
				},
			}
		}
	};
}

/// Registers a named unit onto a destination during [`crate::Extensions::bootstrap`].
///
/// ```ignore
/// weave_registry::mixin!("app::Widget", "app::Greets");
/// ```
#[macro_export]
macro_rules! mixin {
	($destination:literal, $unit:literal) => {
		$crate::__inventory::submit! {
			$crate::MixinDef {
				destination: $destination,
				unit: $unit,
			}
		}
	};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __unit_kind {
	() => {
		$crate::UnitKind::Composable
	};
	($kind:ident) => {
		$crate::UnitKind::$kind
	};
}
