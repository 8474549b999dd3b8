//! Build, print and combine tensors of all three representations
//!
//! Run with: cargo run --example basic_tensors -p mixten-tensor

use anyhow::Result;
use mixten_core::{Label, TensorAddress, TensorType};
use mixten_tensor::{Aggregator, Tensor};

fn main() -> Result<()> {
    println!("=== Dense ===");
    let matrix: Tensor = "tensor(x[2],y[3]):[[1,2,3],[4,5,6]]".parse()?;
    println!("{}", matrix);
    println!("row sums: {}", matrix.reduce(Aggregator::Sum, &["y"])?);
    println!(
        "outside reads NaN: {}",
        matrix.get(&TensorAddress::of_numeric(&[5, 5]))
    );

    println!("\n=== Sparse ===");
    let weights: Tensor = "tensor(tag{}):{news:0.5,sports:2.0}".parse()?;
    println!("{}", weights);
    println!(
        "absent reads zero: {}",
        weights.get(&TensorAddress::of_labels(["music"]))
    );

    println!("\n=== Mixed ===");
    let t: TensorType = "tensor(tag{},x[3])".parse()?;
    let mut builder = Tensor::builder(t);
    for (tag, values) in [("news", [1.0, 0.0, 1.0]), ("sports", [0.0, 1.0, 0.0])] {
        for (x, value) in values.into_iter().enumerate() {
            builder
                .cell_builder()
                .label("tag", tag)
                .label("x", x)
                .value(value)?;
        }
    }
    let embeddings = builder.build()?;
    println!("{}", embeddings);

    let weighted = embeddings.multiply(&weights)?;
    println!("weighted: {}", weighted);
    println!("per tag: {}", weighted.sum(&["x"])?);
    println!(
        "sports: {}",
        embeddings.peek(&[("tag", Label::from("sports"))])?
    );

    let extended = matrix.concat(&"tensor(y[3]):[7,8,9]".parse::<Tensor>()?, "x")?;
    println!("\nconcat: {}", extended);

    Ok(())
}
