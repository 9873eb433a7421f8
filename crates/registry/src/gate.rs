//! Compatibility gate for destinations and unit references.
//!
//! Pure predicates over the catalog and the composition registry. Callers run both checks before
//! touching the materializer, the dispatch table or the ledger.

use crate::unit::{Compositions, UnitKind, UnitRef};
use crate::{CompositionError, TypeCatalog, TypeName};

/// A destination is compatible only if it is declared and exposes the extension point.
pub fn is_destination_compatible(catalog: &TypeCatalog, destination: &str) -> bool {
	catalog.is_extensible(destination).unwrap_or(false)
}

/// Instances are always compatible; names must denote a composable unit.
pub fn is_unit_compatible(compositions: &Compositions, unit: &UnitRef) -> bool {
	match unit {
		UnitRef::Instance(_) => true,
		UnitRef::Named(name) => compositions.kind(name) == Some(UnitKind::Composable),
	}
}

pub fn ensure_destination(
	catalog: &TypeCatalog,
	destination: &TypeName,
) -> Result<(), CompositionError> {
	if is_destination_compatible(catalog, destination.as_str()) {
		Ok(())
	} else {
		Err(CompositionError::Destination {
			destination: destination.clone(),
		})
	}
}

pub fn ensure_unit(compositions: &Compositions, unit: &UnitRef) -> Result<(), CompositionError> {
	if is_unit_compatible(compositions, unit) {
		Ok(())
	} else {
		Err(CompositionError::Unit {
			reference: unit.describe(),
		})
	}
}
