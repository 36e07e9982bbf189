//! Thermal block in one dimension.
//!
//! The rod `[0, 1]` is split into blocks of different conductivity. The
//! stiffness operator and the load vector are both affine in the parameter:
//!
//! ```text
//! A(μ) = R + Σ_b κ_b · K_b        f(μ) = s · F + exp(-t) · e_N
//! ```
//!
//! with `R` a small reaction term, `K_b` the stiffness restricted to block `b`,
//! `F` a uniform source and `e_N` a heat flux at the right end. One `Parametric`
//! owner merges the parameter types of both decompositions so that a single
//! parameter drives the whole model.

use affine_decomp::{
    AffineDecomposition, CoefficientFunctional, CsrMatrix, Parameter, Parametric, Parametrized,
};
use ndarray::Array1;

const NUM_ELEMENTS: usize = 60;
const NUM_BLOCKS: usize = 3;

/// Stiffness contributions of the elements in `block`, pinned at the left end.
fn block_stiffness(block: usize) -> Result<CsrMatrix, Box<dyn std::error::Error>> {
    let h = 1.0 / NUM_ELEMENTS as f64;
    let per_block = NUM_ELEMENTS / NUM_BLOCKS;
    let mut triplets = Vec::new();
    for element in block * per_block..(block + 1) * per_block {
        let (left, right) = (element, element + 1);
        for (row, col, value) in [
            (left, left, 1.0),
            (left, right, -1.0),
            (right, left, -1.0),
            (right, right, 1.0),
        ] {
            // Node 0 carries a homogeneous Dirichlet condition
            if row != 0 && col != 0 {
                triplets.push((row, col, value / h));
            }
        }
    }
    Ok(CsrMatrix::from_triplets(
        NUM_ELEMENTS + 1,
        NUM_ELEMENTS + 1,
        &triplets,
    )?)
}

fn matvec(a: &CsrMatrix, x: &Array1<f64>) -> Array1<f64> {
    Array1::from_iter((0..a.nrows()).map(|row| {
        let (cols, vals) = a.row(row);
        cols.iter().zip(vals).map(|(&col, value)| value * x[col]).sum::<f64>()
    }))
}

/// Unpreconditioned conjugate gradients for the symmetric positive definite system.
fn solve(a: &CsrMatrix, b: &Array1<f64>) -> Array1<f64> {
    let mut x = Array1::zeros(b.len());
    let mut r = b.clone();
    let mut p = r.clone();
    let mut rr = r.dot(&r);
    for _ in 0..10 * b.len() {
        if rr.sqrt() < 1e-12 {
            break;
        }
        let ap = matvec(a, &p);
        let alpha = rr / p.dot(&ap);
        x.scaled_add(alpha, &p);
        r.scaled_add(-alpha, &ap);
        let rr_next = r.dot(&r);
        p = &r + &(&p * (rr_next / rr));
        rr = rr_next;
    }
    x
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Thermal block example");
    println!("=====================\n");

    let n = NUM_ELEMENTS + 1;

    // Operator: reaction term plus one conductivity per block
    let mut reaction = Vec::with_capacity(n);
    reaction.push((0, 0, 1.0));
    for node in 1..n {
        reaction.push((node, node, 1e-3));
    }
    let mut operator = AffineDecomposition::with_affine_part(CsrMatrix::from_triplets(n, n, &reaction)?);
    for block in 0..NUM_BLOCKS {
        let theta = CoefficientFunctional::with_key("kappa", NUM_BLOCKS, &format!("kappa[{}]", block))?;
        operator.register_component(block_stiffness(block)?, theta)?;
    }

    // Load: a scaled uniform source plus a decaying boundary flux
    let h = 1.0 / NUM_ELEMENTS as f64;
    let mut source = Array1::from_elem(n, h);
    source[0] = 0.0;
    let mut flux = Array1::<f64>::zeros(n);
    flux[n - 1] = 1.0;
    let mut load = AffineDecomposition::new();
    load.register_component(source, CoefficientFunctional::with_key("s", 1, "s")?)?;
    load.register_component(flux, CoefficientFunctional::with_key("t", 1, "exp(-t)")?)?;

    println!("Operator parameter type: {}", operator.parameter_type());
    println!("Load parameter type:     {}", load.parameter_type());

    let mut model = Parametric::new();
    model.inherit_parameter_type(operator.parameter_type(), "operator")?;
    model.inherit_parameter_type(load.parameter_type(), "load")?;
    println!("Model parameter type:    {}\n", model.parameter_type());

    let samples = [
        ([1.0, 1.0, 1.0], 1.0, 0.0),
        ([0.1, 1.0, 10.0], 1.0, 0.0),
        ([10.0, 0.1, 1.0], 0.0, 1.0),
    ];
    for (kappa, s, t) in samples {
        let mu = Parameter::from_pairs([
            ("kappa", kappa.to_vec()),
            ("s", vec![s]),
            ("t", vec![t]),
        ])?;
        let mu = mu.restrict_to(model.parameter_type())?;

        let a = operator.freeze_parameter(&model.map_parameter(&mu, "operator")?)?;
        let f = load.freeze_parameter(&model.map_parameter(&mu, "load")?)?;
        let u = solve(&a, &f);

        println!("{}", mu);
        println!(
            "  nnz(A) = {}, |f| = {:.4}, u(1/3) = {:.5}, u(2/3) = {:.5}, u(1) = {:.5}",
            a.nnz(),
            f.dot(&f).sqrt(),
            u[n / 3],
            u[2 * n / 3],
            u[n - 1]
        );
    }

    Ok(())
}
