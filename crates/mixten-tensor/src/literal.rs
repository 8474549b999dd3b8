//! Tensor literal parsing and formatting
//!
//! A literal is an optional type spec followed by `:` and a body:
//!
//! ```text
//! tensor(x[2],y[2]):[[1.0,2.0],[3.0,4.0]]     dense nested arrays
//! tensor(key{}):{a:1.0,b:2.0}                 single mapped dimension
//! tensor(key{},x[2]):{a:[1.0,2.0]}            one mapped dimension, dense subspaces
//! tensor(a{},b{}):{{a:x,b:y}:1.0}             any type, one address per cell
//! tensor():5.0                                rank 0
//! ```
//!
//! Labels may be quoted with `'` or `"`, with `\` escaping the quote
//! character and itself. Without a type, a bare number is a
//! scalar and a verbose body is typed with mapped dimensions named by its
//! first address.
//!
//! Formatting always writes the type and picks the shortest body form. Cells
//! of mapped and mixed tensors are written in address order.

use std::fmt::{self, Write};

use mixten_core::{
    type_parser, Dimension, Label, TensorAddress, TensorError, TensorResult, TensorType, ValueType,
};

use crate::cell::Cell;
use crate::tensor::{Tensor, TensorBuilder};

type ParsedAddress = Vec<(String, String)>;

/// Parse `input`, checking a declared type against `expected` if both exist
pub(crate) fn parse(input: &str, expected: Option<&TensorType>) -> TensorResult<Tensor> {
    let mut reader = Reader::new(input);
    reader.skip_whitespace();
    let declared = if reader.rest().starts_with("tensor") {
        let (tensor_type, rest) = type_parser::parse_prefix(reader.rest())?;
        reader.pos = input.len() - rest.len();
        reader.expect(':')?;
        Some(tensor_type)
    } else {
        None
    };
    let tensor = match (declared, expected) {
        (Some(declared), Some(expected)) if &declared != expected => {
            return Err(TensorError::literal(
                0,
                format!("declared type {} is not {}", declared, expected),
            ))
        }
        (Some(tensor_type), _) => parse_typed(&mut reader, tensor_type)?,
        (None, Some(expected)) => parse_typed(&mut reader, expected.clone())?,
        (None, None) => parse_untyped(&mut reader)?,
    };
    reader.finish()?;
    Ok(tensor)
}

fn parse_typed(reader: &mut Reader<'_>, tensor_type: TensorType) -> TensorResult<Tensor> {
    let rank = tensor_type.rank();
    let mut builder = TensorBuilder::new(tensor_type);
    reader.skip_whitespace();
    match reader.peek() {
        Some('[') => parse_dense(reader, &mut builder)?,
        Some('{') => parse_braced(reader, &mut builder)?,
        Some(_) if rank == 0 => {
            let value = reader.number()?;
            builder.cell(TensorAddress::empty(), value)?;
        }
        _ => return Err(reader.error("expected '[' or '{'")),
    }
    builder.build()
}

fn parse_untyped(reader: &mut Reader<'_>) -> TensorResult<Tensor> {
    reader.skip_whitespace();
    match reader.peek() {
        Some('{') => {
            reader.expect('{')?;
            if reader.peek_after_whitespace() == Some('{') {
                let cells = parse_verbose_cells(reader)?;
                let first = cells
                    .first()
                    .ok_or_else(|| reader.error("cannot infer a type from no cells"))?;
                let tensor_type = TensorType::new(
                    ValueType::Double,
                    first.0.iter().map(|(name, _)| Dimension::mapped(name.as_str())),
                )
                .map_err(|e| reader.error(e.to_string()))?;
                let mut builder = TensorBuilder::new(tensor_type);
                for (address, value) in cells {
                    add_named_cell(&mut builder, address, value)?;
                }
                builder.build()
            } else {
                let value = reader.number()?;
                reader.expect('}')?;
                Ok(Tensor::scalar(value))
            }
        }
        Some('[') => Err(reader.error("a dense literal needs a type")),
        _ => Ok(Tensor::scalar(reader.number()?)),
    }
}

fn parse_dense(reader: &mut Reader<'_>, builder: &mut TensorBuilder) -> TensorResult<()> {
    let tensor_type = builder.tensor_type();
    if tensor_type.has_mapped_dimensions() || tensor_type.rank() == 0 {
        return Err(reader.error(format!(
            "a dense body needs only indexed dimensions, not {}",
            tensor_type
        )));
    }
    let depth = tensor_type.rank();
    let mut coordinates = Vec::with_capacity(depth);
    parse_nested(reader, depth, &mut coordinates, &mut |indexes, value| {
        builder.cell_at(indexes, value)
    })
}

/// Nested arrays `depth` deep; calls `leaf` with the coordinates of each number
fn parse_nested<F>(
    reader: &mut Reader<'_>,
    depth: usize,
    coordinates: &mut Vec<usize>,
    leaf: &mut F,
) -> TensorResult<()>
where
    F: FnMut(&[usize], f64) -> TensorResult<()>,
{
    if depth == 0 {
        let value = reader.number()?;
        return leaf(coordinates, value);
    }
    reader.expect('[')?;
    if reader.eat(']') {
        return Ok(());
    }
    let mut i = 0;
    loop {
        coordinates.push(i);
        parse_nested(reader, depth - 1, coordinates, leaf)?;
        coordinates.pop();
        i += 1;
        if !reader.eat(',') {
            return reader.expect(']');
        }
    }
}

fn parse_braced(reader: &mut Reader<'_>, builder: &mut TensorBuilder) -> TensorResult<()> {
    reader.expect('{')?;
    if reader.eat('}') {
        return Ok(());
    }
    if reader.peek_after_whitespace() == Some('{') {
        for (address, value) in parse_verbose_cells(reader)? {
            add_named_cell(builder, address, value)?;
        }
        return Ok(());
    }
    if builder.tensor_type().rank() == 0 {
        let value = reader.number()?;
        builder.cell(TensorAddress::empty(), value)?;
        return reader.expect('}');
    }
    parse_short_cells(reader, builder)
}

/// `{d:l,...}:v,...}` after the opening brace
fn parse_verbose_cells(reader: &mut Reader<'_>) -> TensorResult<Vec<(ParsedAddress, f64)>> {
    let mut cells = Vec::new();
    loop {
        reader.expect('{')?;
        let mut address = ParsedAddress::new();
        if !reader.eat('}') {
            loop {
                let dimension = reader.label()?;
                reader.expect(':')?;
                let label = reader.label()?;
                address.push((dimension, label));
                if !reader.eat(',') {
                    reader.expect('}')?;
                    break;
                }
            }
        }
        reader.expect(':')?;
        cells.push((address, reader.number()?));
        if !reader.eat(',') {
            reader.expect('}')?;
            return Ok(cells);
        }
    }
}

fn add_named_cell(
    builder: &mut TensorBuilder,
    address: ParsedAddress,
    value: f64,
) -> TensorResult<()> {
    let mut cell = builder.cell_builder();
    for (dimension, label) in address {
        cell = cell.label(dimension, label);
    }
    cell.value(value)
}

/// `l:v,...}` or `l:[...],...}` after the opening brace, for types with
/// exactly one mapped dimension
fn parse_short_cells(reader: &mut Reader<'_>, builder: &mut TensorBuilder) -> TensorResult<()> {
    let tensor_type = builder.tensor_type().clone();
    let mapped: Vec<usize> = positions(&tensor_type, Dimension::is_mapped);
    let indexed: Vec<usize> = positions(&tensor_type, Dimension::is_indexed);
    let &[mapped_position] = mapped.as_slice() else {
        return Err(reader.error(format!(
            "the short form needs exactly one mapped dimension, not {}",
            tensor_type
        )));
    };
    let mut coordinates = Vec::with_capacity(indexed.len());
    loop {
        let label = reader.label()?;
        reader.expect(':')?;
        if indexed.is_empty() {
            let value = reader.number()?;
            builder.cell(TensorAddress::of_labels([label]), value)?;
        } else {
            let mut leaf = |dense: &[usize], value: f64| {
                let mut labels = vec![Label::Numeric(0); tensor_type.rank()];
                labels[mapped_position] = Label::from(label.as_str());
                for (&position, &index) in indexed.iter().zip(dense) {
                    labels[position] = Label::from(index);
                }
                builder.cell(TensorAddress::of_labels(labels), value)
            };
            parse_nested(reader, indexed.len(), &mut coordinates, &mut leaf)?;
        }
        if !reader.eat(',') {
            return reader.expect('}');
        }
    }
}

fn positions(tensor_type: &TensorType, keep: impl Fn(&Dimension) -> bool) -> Vec<usize> {
    tensor_type
        .dimensions()
        .iter()
        .enumerate()
        .filter_map(|(i, d)| keep(d).then_some(i))
        .collect()
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_after_whitespace(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.peek()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, reason: impl Into<String>) -> TensorError {
        TensorError::literal(self.pos, reason)
    }

    /// Consume `c` if it is next
    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> TensorResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(match self.peek() {
                Some(found) => format!("expected '{}' but found '{}'", c, found),
                None => format!("expected '{}' but found the end", c),
            }))
        }
    }

    fn finish(&mut self) -> TensorResult<()> {
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error(format!("unexpected trailing input '{}'", self.rest())));
        }
        Ok(())
    }

    /// An unquoted token, ending at whitespace or structure
    fn token(&mut self) -> &'a str {
        self.skip_whitespace();
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || ":,{}[]".contains(c))
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn number(&mut self) -> TensorResult<f64> {
        let start = self.pos;
        let token = self.token();
        token.parse().map_err(|_| {
            TensorError::literal(start, format!("'{}' is not a number", token))
        })
    }

    fn label(&mut self) -> TensorResult<String> {
        self.skip_whitespace();
        if let Some(quote) = self.peek().filter(|&c| c == '\'' || c == '"') {
            let start = self.pos;
            let mut label = String::new();
            let mut chars = self.rest().char_indices().skip(1);
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some((_, escaped)) => label.push(escaped),
                        None => break,
                    },
                    c if c == quote => {
                        self.pos += i + c.len_utf8();
                        return Ok(label);
                    }
                    c => label.push(c),
                }
            }
            return Err(TensorError::literal(start, "unterminated quoted label"));
        }
        let token = self.token();
        if token.is_empty() {
            return Err(self.error("expected a label"));
        }
        Ok(token.to_string())
    }
}

/// Write `tensor` as a literal that [`parse`] reads back
pub(crate) fn write(f: &mut fmt::Formatter<'_>, tensor: &Tensor) -> fmt::Result {
    let tensor_type = tensor.tensor_type();
    write!(f, "{}:", tensor_type)?;
    match tensor {
        Tensor::Indexed(dense) => write_nested(
            f,
            dense.dimension_sizes().as_slice(),
            &mut dense.values(),
            tensor_type,
        ),
        Tensor::Mapped(_) if tensor_type.rank() == 1 => {
            let cells = sorted_cells(tensor);
            f.write_char('{')?;
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    f.write_char(',')?;
                }
                write_label(f, &cell.address().label(0))?;
                f.write_char(':')?;
                write_value(f, cell.value(), tensor_type)?;
            }
            f.write_char('}')
        }
        Tensor::Mixed(mixed) if tensor_type.mapped_subtype().rank() == 1 => {
            let mut sparse: Vec<&TensorAddress> = mixed.sparse_addresses().collect();
            sparse.sort();
            let dense_sizes = mixed.index().dense_sizes().as_slice();
            f.write_char('{')?;
            for (i, address) in sparse.into_iter().enumerate() {
                if i > 0 {
                    f.write_char(',')?;
                }
                write_label(f, &address.label(0))?;
                f.write_char(':')?;
                let subspace = mixed.dense_subspace(address).unwrap_or_default();
                write_nested(f, dense_sizes, &mut subspace.iter().map(Cell::value), tensor_type)?;
            }
            f.write_char('}')
        }
        _ => {
            let cells = sorted_cells(tensor);
            f.write_char('{')?;
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    f.write_char(',')?;
                }
                f.write_char('{')?;
                for (j, name) in tensor_type.dimension_names().enumerate() {
                    if j > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "{}:", name)?;
                    write_label(f, &cell.address().label(j))?;
                }
                f.write_str("}:")?;
                write_value(f, cell.value(), tensor_type)?;
            }
            f.write_char('}')
        }
    }
}

fn sorted_cells(tensor: &Tensor) -> Vec<Cell> {
    let mut cells: Vec<Cell> = tensor.cells().collect();
    cells.sort_by(|a, b| a.address().cmp(b.address()));
    cells
}

fn write_nested<I>(
    f: &mut fmt::Formatter<'_>,
    sizes: &[usize],
    values: &mut I,
    tensor_type: &TensorType,
) -> fmt::Result
where
    I: Iterator<Item = f64>,
{
    match sizes.split_first() {
        None => write_value(f, values.next().unwrap_or(f64::NAN), tensor_type),
        Some((&size, inner)) => {
            f.write_char('[')?;
            for i in 0..size {
                if i > 0 {
                    f.write_char(',')?;
                }
                write_nested(f, inner, values, tensor_type)?;
            }
            f.write_char(']')
        }
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: f64, tensor_type: &TensorType) -> fmt::Result {
    match tensor_type.value_type() {
        ValueType::Float => write!(f, "{:?}", value as f32),
        ValueType::Double => write!(f, "{:?}", value),
    }
}

fn write_label(f: &mut fmt::Formatter<'_>, label: &str) -> fmt::Result {
    let bare = !label.is_empty()
        && !label
            .chars()
            .any(|c| c.is_whitespace() || ":,{}[]'\"".contains(c));
    if bare {
        return f.write_str(label);
    }
    let quote = if label.contains('\'') && !label.contains('"') {
        '"'
    } else {
        '\''
    };
    f.write_char(quote)?;
    for c in label.chars() {
        if c == quote || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char(quote)
}
