//! Containers from the `faer` and `nalgebra` ecosystems.
//!
//! Only compiled with the `matrix` feature. Both libraries store matrices
//! column-major; the loops below follow that order.

use super::{check_shape, Assemble, LinearContainer, Prune, Shape};
use crate::error::Result;
use faer::Mat;
use nalgebra::{DMatrix, DVector};

// === faer ===

impl LinearContainer for Mat<f64> {
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
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                *self.get_mut(i, j) *= alpha;
            }
        }
    }

    fn axpy(&mut self, alpha: f64, x: &Self) -> Result<()> {
        check_shape(&*self, x)?;
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                *self.get_mut(i, j) += alpha * *x.get(i, j);
            }
        }
        Ok(())
    }

    fn dot(&self, other: &Self) -> Result<f64> {
        check_shape(self, other)?;
        let mut sum = 0.0;
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                sum += *self.get(i, j) * *other.get(i, j);
            }
        }
        Ok(sum)
    }
}

impl Assemble for Mat<f64> {}

impl Prune for Mat<f64> {
    fn pruned(&self, tolerance: f64) -> Self {
        Mat::from_fn(self.nrows(), self.ncols(), |i, j| {
            let v = *self.get(i, j);
            if v.abs() <= tolerance {
                0.0
            } else {
                v
            }
        })
    }
}

// === nalgebra ===

impl LinearContainer for DVector<f64> {
    fn copy(&self) -> Self {
        self.clone()
    }

    fn shape(&self) -> Shape {
        Shape::Vector(self.len())
    }

    fn scal(&mut self, alpha: f64) {
        self.scale_mut(alpha);
    }

    fn axpy(&mut self, alpha: f64, x: &Self) -> Result<()> {
        check_shape(&*self, x)?;
        for (a, b) in self.iter_mut().zip(x.iter()) {
            *a += alpha * b;
        }
        Ok(())
    }

    fn dot(&self, other: &Self) -> Result<f64> {
        check_shape(self, other)?;
        Ok(self.iter().zip(other.iter()).map(|(a, b)| a * b).sum())
    }
}

impl LinearContainer for DMatrix<f64> {
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
        self.scale_mut(alpha);
    }

    fn axpy(&mut self, alpha: f64, x: &Self) -> Result<()> {
        check_shape(&*self, x)?;
        for (a, b) in self.iter_mut().zip(x.iter()) {
            *a += alpha * b;
        }
        Ok(())
    }

    fn dot(&self, other: &Self) -> Result<f64> {
        check_shape(self, other)?;
        Ok(self.iter().zip(other.iter()).map(|(a, b)| a * b).sum())
    }
}

impl Assemble for DVector<f64> {}

impl Assemble for DMatrix<f64> {}

impl Prune for DVector<f64> {
    fn pruned(&self, tolerance: f64) -> Self {
        self.map(|v| if v.abs() <= tolerance { 0.0 } else { v })
    }
}

impl Prune for DMatrix<f64> {
    fn pruned(&self, tolerance: f64) -> Self {
        self.map(|v| if v.abs() <= tolerance { 0.0 } else { v })
    }
}
