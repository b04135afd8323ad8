//! Public macros for constructing option structs without struct literal syntax.

/// Construct [`crate::LoadOptions`] from `Default` and a list of field assignments.
///
/// ```rust
/// let options = saphyr_marshal::options! {
///     max_depth: 32,
///     budget: None,
/// };
/// assert_eq!(options.max_depth, 32);
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::LoadOptions::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Construct a [`crate::Budget`] from `Default` and a list of field assignments.
///
/// ```rust
/// let options = saphyr_marshal::options! {
///     budget: Some(saphyr_marshal::budget! {
///         max_depth: 16,
///     }),
/// };
/// assert_eq!(options.budget.map(|b| b.max_depth), Some(16));
/// ```
#[macro_export]
macro_rules! budget {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut budget = $crate::Budget::default();
        $(
            budget.$field = $value;
        )*
        budget
    }};
}
