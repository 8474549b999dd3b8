//! Tensor type spec parser
//!
//! Parses type specs of the form `tensor<valuetype>(dim1,dim2,...)` where the
//! value type annotation is optional and each dimension is `name[]`,
//! `name[N]` or `name{}`.

use crate::error::{TensorError, TensorResult};
use crate::tensor_type::{Dimension, TensorType};
use crate::value_type::ValueType;

/// Parse a complete type spec; trailing input is an error
pub(crate) fn parse(spec: &str) -> TensorResult<TensorType> {
    let (tensor_type, rest) = parse_prefix(spec)?;
    if !rest.trim().is_empty() {
        return Err(TensorError::type_spec(
            spec,
            format!("unexpected trailing input '{}'", rest.trim()),
        ));
    }
    Ok(tensor_type)
}

/// Parse a type spec at the start of `input`, returning the unparsed rest.
///
/// Used by tensor literal parsing where the type is followed by `:` and a value body.
///
/// ```
/// use mixten_core::type_parser::parse_prefix;
///
/// let (t, rest) = parse_prefix("tensor(x[2]):[1,2]").unwrap();
/// assert_eq!(t.to_string(), "tensor(x[2])");
/// assert_eq!(rest, ":[1,2]");
/// ```
pub fn parse_prefix(input: &str) -> TensorResult<(TensorType, &str)> {
    let spec = input.trim_start();
    let rest = spec
        .strip_prefix("tensor")
        .ok_or_else(|| TensorError::type_spec(input, "must start with 'tensor'"))?
        .trim_start();

    let (value_type, rest) = match rest.strip_prefix('<') {
        Some(annotated) => {
            let end = annotated
                .find('>')
                .ok_or_else(|| TensorError::type_spec(input, "missing '>' after value type"))?;
            let id = annotated[..end].trim();
            let value_type = id.parse::<ValueType>().map_err(|_| {
                TensorError::type_spec(input, format!("unknown value type '{}'", id))
            })?;
            (value_type, annotated[end + 1..].trim_start())
        }
        None => (ValueType::Double, rest),
    };

    let rest = rest
        .strip_prefix('(')
        .ok_or_else(|| TensorError::type_spec(input, "missing '(' before dimensions"))?;
    let end = rest
        .find(')')
        .ok_or_else(|| TensorError::type_spec(input, "missing ')' after dimensions"))?;
    let body = &rest[..end];

    let mut dimensions = Vec::new();
    if !body.trim().is_empty() {
        for token in body.split(',') {
            dimensions.push(parse_dimension(token).map_err(|r| TensorError::type_spec(input, r))?);
        }
    }

    let tensor_type = TensorType::new(value_type, dimensions)
        .map_err(|e| TensorError::type_spec(input, e.to_string()))?;
    Ok((tensor_type, &rest[end + 1..]))
}

fn parse_dimension(token: &str) -> Result<Dimension, String> {
    let token = token.trim();
    if let Some(name) = token.strip_suffix("{}") {
        return Ok(Dimension::mapped(name.trim()));
    }
    if let Some(open) = token.find('[') {
        if let Some(inner) = token[open + 1..].strip_suffix(']') {
            let name = token[..open].trim();
            let inner = inner.trim();
            if inner.is_empty() {
                return Ok(Dimension::indexed_unbound(name));
            }
            let size = inner
                .parse::<u64>()
                .map_err(|_| format!("dimension '{}' has a non-numeric size '{}'", name, inner))?;
            return Ok(Dimension::indexed(name, size));
        }
    }
    Err(format!(
        "dimension '{}' is neither indexed 'name[N]'/'name[]' nor mapped 'name{{}}'",
        token
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor_type::DimensionKind;

    #[test]
    fn test_parse_all_kinds() {
        let t = parse("tensor(a[], b[4], c{})").unwrap();
        let kinds: Vec<_> = t.dimensions().iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                DimensionKind::IndexedUnbound,
                DimensionKind::IndexedBound(4),
                DimensionKind::Mapped
            ]
        );
    }

    #[test]
    fn test_parse_value_type() {
        assert_eq!(parse("tensor<float>(x[2])").unwrap().value_type(), ValueType::Float);
        assert_eq!(parse("tensor<double>(x[2])").unwrap().value_type(), ValueType::Double);
        assert_eq!(parse("tensor(x[2])").unwrap().value_type(), ValueType::Double);
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse("tensor()").unwrap(), TensorType::empty());
        assert_eq!(parse(" tensor ( ) ").unwrap(), TensorType::empty());
    }

    #[test]
    fn test_malformed_specs_fail() {
        for spec in [
            "tensor(x[3]",
            "tensor<int7>(x[3])",
            "tensor<float(x[3])",
            "tensor(x)",
            "tensor(x[a])",
            "tensor(x{)",
            "tensor(x[2],x{})",
            "tensor(x[2]) junk",
            "tensor(x[-1])",
            "vector(x[2])",
            "tensor(x[2],)",
        ] {
            let result = parse(spec);
            assert!(
                matches!(result, Err(TensorError::TypeSpec { .. })),
                "expected failure for {}",
                spec
            );
        }
    }

    #[test]
    fn test_round_trip() {
        for spec in ["tensor()", "tensor(x[3])", "tensor<float>(a{},b[],c[7])"] {
            assert_eq!(parse(spec).unwrap().to_string(), spec);
        }
    }
}
