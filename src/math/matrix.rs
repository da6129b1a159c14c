use rand::Rng;
use rand::RngCore;
use serde::{Serialize, Deserialize};
use std::f64::consts::TAU;
use std::ops::{Add, Sub, Mul};

/// Dense row-major matrix of `f64`.
///
/// Throughout the engine, columns are samples and rows are features or
/// units. Every operation returns a fresh value; nothing mutates its
/// receiver or its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![value; cols]; rows]
        }
    }

    /// A `rows x 1` column vector.
    pub fn column(values: &[f64]) -> Matrix {
        Matrix {
            rows: values.len(),
            cols: 1,
            data: values.iter().map(|&v| vec![v]).collect(),
        }
    }

    /// A `1 x cols` row vector.
    pub fn row(values: &[f64]) -> Matrix {
        Matrix { rows: 1, cols: values.len(), data: vec![values.to_vec()] }
    }

    /// Builds a matrix whose columns are the given samples.
    ///
    /// Panics if the samples do not all share one length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Matrix {
        let rows = columns.first().map(|c| c.len()).unwrap_or(0);
        assert!(
            columns.iter().all(|c| c.len() == rows),
            "Matrix::from_columns: columns have differing lengths"
        );
        Matrix::from_fn(rows, columns.len(), |r, c| columns[c][r])
    }

    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Matrix
    where
        F: FnMut(usize, usize) -> f64,
    {
        Matrix {
            rows,
            cols,
            data: (0..rows).map(|r| (0..cols).map(|c| f(r, c)).collect()).collect(),
        }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let rows = data.len();
        let cols = data.first().map(|r| r.len()).unwrap_or(0);
        assert!(
            data.iter().all(|r| r.len() == cols),
            "Matrix::from_data: ragged rows"
        );
        Matrix { rows, cols, data }
    }

    /// Entries drawn uniformly from [-1, 1).
    pub fn random(rows: usize, cols: usize, rng: &mut dyn RngCore) -> Matrix {
        Matrix::from_fn(rows, cols, |_, _| rng.gen_range(-1.0..1.0))
    }

    /// One N(0, 1) draw via Box-Muller. The first uniform is taken from
    /// (0, 1] so its logarithm stays finite.
    fn standard_normal(rng: &mut dyn RngCore) -> f64 {
        let radius = (-2.0 * (1.0 - rng.gen::<f64>()).ln()).sqrt();
        let angle = TAU * rng.gen::<f64>();
        radius * angle.cos()
    }

    fn gaussian(rows: usize, cols: usize, std_dev: f64, rng: &mut dyn RngCore) -> Matrix {
        Matrix::from_fn(rows, cols, |_, _| std_dev * Matrix::standard_normal(&mut *rng))
    }

    /// N(0, 2/fan_in) with `cols` as the fan-in. Suits ReLU-family units.
    pub fn he(rows: usize, cols: usize, rng: &mut dyn RngCore) -> Matrix {
        Matrix::gaussian(rows, cols, (2.0 / cols as f64).sqrt(), rng)
    }

    /// N(0, 1/fan_in). Suits saturating and linear units.
    pub fn xavier(rows: usize, cols: usize, rng: &mut dyn RngCore) -> Matrix {
        Matrix::gaussian(rows, cols, (1.0 / cols as f64).sqrt(), rng)
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

    pub fn value_at(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    pub fn transpose(&self) -> Matrix {
        Matrix::from_fn(self.cols, self.rows, |r, c| self.data[c][r])
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Maps with access to `(row, col, value)`.
    pub fn map_indexed<F>(&self, functor: F) -> Matrix
    where
        F: Fn(usize, usize, f64) -> f64,
    {
        Matrix::from_fn(self.rows, self.cols, |r, c| functor(r, c, self.data[r][c]))
    }

    /// Combines two same-shape matrices element by element.
    pub fn zip_map<F>(&self, other: &Matrix, functor: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        self.assert_same_shape(other, "zip_map");
        Matrix::from_fn(self.rows, self.cols, |r, c| functor(self.data[r][c], other.data[r][c]))
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        self.zip_map(other, |a, b| a * b)
    }

    pub fn divide(&self, other: &Matrix) -> Matrix {
        self.zip_map(other, |a, b| a / b)
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    pub fn add_scalar(&self, value: f64) -> Matrix {
        self.map(|x| x + value)
    }

    /// Adds a `rows x 1` column vector to every column.
    pub fn add_column_vector(&self, vector: &Matrix) -> Matrix {
        self.assert_column_vector(vector);
        self.map_indexed(|r, _, v| v + vector.data[r][0])
    }

    pub fn sub_column_vector(&self, vector: &Matrix) -> Matrix {
        self.assert_column_vector(vector);
        self.map_indexed(|r, _, v| v - vector.data[r][0])
    }

    /// Adds a `1 x cols` row vector to every row.
    pub fn add_row_vector(&self, vector: &Matrix) -> Matrix {
        self.assert_row_vector(vector);
        self.map_indexed(|_, c, v| v + vector.data[0][c])
    }

    pub fn sub_row_vector(&self, vector: &Matrix) -> Matrix {
        self.assert_row_vector(vector);
        self.map_indexed(|_, c, v| v - vector.data[0][c])
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().flatten().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            return f64::NAN;
        }
        self.sum() / self.len() as f64
    }

    /// Reduces each row to one value; result is `rows x 1`.
    fn reduce_rows<F>(&self, reducer: F) -> Matrix
    where
        F: Fn(&[f64]) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: 1,
            data: self.data.iter().map(|row| vec![reducer(row)]).collect(),
        }
    }

    /// Reduces each column to one value; result is `1 x cols`.
    fn reduce_columns<F>(&self, reducer: F) -> Matrix
    where
        F: Fn(&[f64]) -> f64,
    {
        let values: Vec<f64> = (0..self.cols)
            .map(|c| reducer(&self.column_values(c)))
            .collect();
        Matrix::row(&values)
    }

    pub fn column_values(&self, col: usize) -> Vec<f64> {
        self.data.iter().map(|row| row[col]).collect()
    }

    pub fn row_sum(&self) -> Matrix { self.reduce_rows(sum) }
    pub fn row_mean(&self) -> Matrix { self.reduce_rows(mean) }
    pub fn row_min(&self) -> Matrix { self.reduce_rows(min) }
    pub fn row_max(&self) -> Matrix { self.reduce_rows(max) }
    pub fn row_variance(&self) -> Matrix { self.reduce_rows(variance) }

    pub fn column_sum(&self) -> Matrix { self.reduce_columns(sum) }
    pub fn column_mean(&self) -> Matrix { self.reduce_columns(mean) }
    pub fn column_min(&self) -> Matrix { self.reduce_columns(min) }
    pub fn column_max(&self) -> Matrix { self.reduce_columns(max) }
    pub fn column_variance(&self) -> Matrix { self.reduce_columns(variance) }

    /// Index of the largest entry in every row.
    pub fn row_argmax(&self) -> Vec<usize> {
        self.data.iter().map(|row| argmax(row)).collect()
    }

    /// Index of the largest entry in every column.
    pub fn column_argmax(&self) -> Vec<usize> {
        (0..self.cols).map(|c| argmax(&self.column_values(c))).collect()
    }

    /// Column-wise softmax. Each column's max is subtracted before
    /// exponentiating so large logits cannot overflow.
    pub fn softmax_columns(&self) -> Matrix {
        let maxes = self.column_max();
        let exps = self.sub_row_vector(&maxes).map(f64::exp);
        let sums = exps.column_sum();
        exps.map_indexed(|_, c, v| v / sums.data[0][c])
    }

    /// Keeps only the listed columns, in the given order.
    pub fn select_columns(&self, indices: &[usize]) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: indices.len(),
            data: self.data.iter()
                .map(|row| indices.iter().map(|&i| row[i]).collect())
                .collect(),
        }
    }

    /// Re-reads the entries in row-major order into a new shape.
    pub fn reshape(&self, rows: usize, cols: usize) -> Matrix {
        assert_eq!(
            rows * cols,
            self.len(),
            "Matrix::reshape: cannot reshape {}x{} into {}x{}",
            self.rows, self.cols, rows, cols
        );
        let flat: Vec<f64> = self.data.iter().flatten().copied().collect();
        Matrix::from_fn(rows, cols, |r, c| flat[r * cols + c])
    }

    /// Same shape and every entry within `tolerance`.
    pub fn approx_eq(&self, other: &Matrix, tolerance: f64) -> bool {
        self.shape() == other.shape()
            && self.data.iter().flatten()
                .zip(other.data.iter().flatten())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    fn assert_same_shape(&self, other: &Matrix, op: &str) {
        if self.rows != other.rows || self.cols != other.cols {
            panic!(
                "shape mismatch in {op}: {}x{} vs {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )
        }
    }

    fn assert_column_vector(&self, vector: &Matrix) {
        if vector.cols != 1 || vector.rows != self.rows {
            panic!(
                "expected a {}x1 column vector, got {}x{}",
                self.rows, vector.rows, vector.cols
            )
        }
    }

    fn assert_row_vector(&self, vector: &Matrix) {
        if vector.rows != 1 || vector.cols != self.cols {
            panic!(
                "expected a 1x{} row vector, got {}x{}",
                self.cols, vector.rows, vector.cols
            )
        }
    }
}

fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

fn mean(values: &[f64]) -> f64 {
    sum(values) / values.len() as f64
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Population variance.
fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Index of the maximum element in a slice.
fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        self.assert_same_shape(rhs, "add");
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl Sub for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        self.assert_same_shape(rhs, "sub");
        self.zip_map(rhs, |a, b| a - b)
    }
}

/// Standard matrix product.
impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        assert!(
            self.cols == rhs.rows,
            "cannot multiply a {}x{} matrix by a {}x{} one",
            self.rows, self.cols, rhs.rows, rhs.cols
        );

        // i-k-j order walks both operands row by row.
        let data = self
            .data
            .iter()
            .map(|lhs_row| {
                let mut out = vec![0.0; rhs.cols];
                for (&a, rhs_row) in lhs_row.iter().zip(&rhs.data) {
                    if a != 0.0 {
                        out.iter_mut().zip(rhs_row).for_each(|(o, &b)| *o += a * b);
                    }
                }
                out
            })
            .collect();

        Matrix { rows: self.rows, cols: rhs.cols, data }
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        &self * &rhs
    }
}
