//! Standard property names shared by functions and the graph builder.

/// The identifier of the function that produced a value.
///
/// Required on every `ValueSpecification`; requirements may constrain it to
/// pin a producer, or omit it to accept any.
pub const FUNCTION: &str = "Function";

/// The currency a monetary value is expressed in.
pub const CURRENCY: &str = "Currency";

/// The name of the curve a value was derived from.
pub const CURVE: &str = "Curve";

/// The name of the volatility surface a value was derived from.
pub const SURFACE: &str = "Surface";

/// The name of the volatility cube a value was derived from.
pub const CUBE: &str = "Cube";

/// The method a function used, when it offers more than one.
pub const CALCULATION_METHOD: &str = "CalculationMethod";
