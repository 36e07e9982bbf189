//! Dense containers backed by `ndarray`.

use super::{check_shape, Assemble, LinearContainer, Prune, Shape};
use crate::error::Result;
use ndarray::{Array1, Array2};

impl LinearContainer for Array1<f64> {
    fn copy(&self) -> Self {
        self.clone()
    }

    fn shape(&self) -> Shape {
        Shape::Vector(self.len())
    }

    fn scal(&mut self, alpha: f64) {
        self.mapv_inplace(|v| v * alpha);
    }

    fn axpy(&mut self, alpha: f64, x: &Self) -> Result<()> {
        check_shape(&*self, x)?;
        self.scaled_add(alpha, x);
        Ok(())
    }

    fn dot(&self, other: &Self) -> Result<f64> {
        check_shape(self, other)?;
        Ok(self.iter().zip(other.iter()).map(|(a, b)| a * b).sum())
    }
}

impl LinearContainer for Array2<f64> {
    fn copy(&self) -> Self {
        self.clone()
    }

    fn shape(&self) -> Shape {
        Shape::Matrix {
            rows: self.nrows(),
            cols: self.ncols(),
        }
    }

    fn scal(&mut self, alpha: f64) {
        self.mapv_inplace(|v| v * alpha);
    }

    fn axpy(&mut self, alpha: f64, x: &Self) -> Result<()> {
        check_shape(&*self, x)?;
        self.scaled_add(alpha, x);
        Ok(())
    }

    fn dot(&self, other: &Self) -> Result<f64> {
        check_shape(self, other)?;
        Ok(self.iter().zip(other.iter()).map(|(a, b)| a * b).sum())
    }
}

impl Assemble for Array1<f64> {}

impl Assemble for Array2<f64> {}

impl Prune for Array1<f64> {
    fn pruned(&self, tolerance: f64) -> Self {
        self.mapv(|v| if v.abs() <= tolerance { 0.0 } else { v })
    }
}

impl Prune for Array2<f64> {
    fn pruned(&self, tolerance: f64) -> Self {
        self.mapv(|v| if v.abs() <= tolerance { 0.0 } else { v })
    }
}
