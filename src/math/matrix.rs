use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

/// Dense row-major matrix of `f64`.
///
/// Shape mismatches inside arithmetic are programming errors and panic; the
/// network validates user-supplied shapes before any arithmetic happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix { rows, cols, data: vec![vec![0.0; cols]; rows] }
    }

    /// Wraps a single vector as a `1 × n` row matrix.
    pub fn row(values: Vec<f64>) -> Matrix {
        Matrix { rows: 1, cols: values.len(), data: vec![values] }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let cols = data.first().map(|r| r.len()).unwrap_or(0);
        Matrix { rows: data.len(), cols, data }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // 1 - U maps [0, 1) onto (0, 1] so ln never sees zero.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn normal<R: Rng + ?Sized>(rows: usize, cols: usize, std_dev: f64, rng: &mut R) -> Matrix {
        let data = (0..rows)
            .map(|_| (0..cols).map(|_| Matrix::sample_standard_normal(rng) * std_dev).collect())
            .collect();
        Matrix { rows, cols, data }
    }

    /// He initialization, N(0, sqrt(2 / fan_in)). `rows` is the fan-in.
    ///
    /// Use before ReLU layers.
    pub fn he<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        Matrix::normal(rows, cols, (2.0 / rows.max(1) as f64).sqrt(), rng)
    }

    /// Xavier (Glorot) initialization, N(0, sqrt(1 / fan_in)). `rows` is the fan-in.
    ///
    /// Use before Softmax/Tanh/Identity layers.
    pub fn xavier<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        Matrix::normal(rows, cols, (1.0 / rows.max(1) as f64).sqrt(), rng)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major iterator over every element.
    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.data.iter().flat_map(|row| row.iter())
    }

    pub fn values(&self) -> Vec<f64> {
        self.iter().copied().collect()
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for (i, row) in self.data.iter().enumerate() {
            for (j, &x) in row.iter().enumerate() {
                res.data[j][i] = x;
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        let data = self.data.iter()
            .map(|row| row.iter().map(|&x| functor(x)).collect())
            .collect();
        Matrix { rows: self.rows, cols: self.cols, data }
    }

    /// Element-wise combination of two same-shape matrices.
    pub fn zip_with<F>(&self, other: &Matrix, functor: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        assert_eq!(self.shape(), other.shape(), "Matrices are of incorrect sizes");
        let data = self.data.iter().zip(other.data.iter())
            .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| functor(x, y)).collect())
            .collect();
        Matrix { rows: self.rows, cols: self.cols, data }
    }

    /// `self += other * scale`, in place.
    pub fn add_scaled(&mut self, other: &Matrix, scale: f64) {
        assert_eq!(self.shape(), other.shape(), "Matrices are of incorrect sizes");
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            for (x, &y) in a.iter_mut().zip(b.iter()) {
                *x += y * scale;
            }
        }
    }

    pub fn fill(&mut self, value: f64) {
        for row in &mut self.data {
            row.iter_mut().for_each(|x| *x = value);
        }
    }

    pub fn all_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Matrix {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Matrix {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Matrix {
        assert_eq!(self.cols, rhs.rows, "Matrices are of incorrect sizes");

        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..rhs.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }
        res
    }
}
