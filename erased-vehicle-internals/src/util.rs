//! Internal utility types.

/// Marker type used when type-erasing payloads.
///
/// This zero-sized type serves as the pointee of payload pointers once the
/// actual concrete type has been erased. For example, `NonNull<Erased>`
/// points to a payload whose concrete type is unknown at the current scope.
///
/// Using a distinct marker type (rather than `()` or `u8`) makes the intent
/// clearer in type signatures and error messages.
#[derive(Clone, Copy)]
pub struct Erased;
