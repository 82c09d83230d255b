//! Finite-difference verification of backward passes
//!
//! A backward pass `df(x, g)` is correct when, for every input element `x_i`,
//! it agrees with the numerical derivative of the scalar `⟨g, f(x)⟩` taken
//! with respect to `x_i`. Both [`DifferenceScheme`]s evaluate `f` once or
//! twice per input element, so checks are meant for small fixtures.
//!
//! ```
//! use imgrad_ad::gradcheck::{check_gradient, GradCheckConfig};
//! use imgrad_core::DenseND;
//! use imgrad_kernels::{spatial_gradient, spatial_gradient_backward, GradientConfig};
//!
//! let x = DenseND::<f64>::from_fn(&[1, 1, 3, 3], |i| (i[2] * 3 + i[3]) as f64);
//! let grad_y = DenseND::<f64>::ones(&[1, 1, 2, 3, 3]);
//!
//! let f = |x: &DenseND<f64>| -> anyhow::Result<DenseND<f64>> { Ok(spatial_gradient(x)?) };
//! let df = |_x: &DenseND<f64>, g: &DenseND<f64>| -> anyhow::Result<DenseND<f64>> {
//!     Ok(spatial_gradient_backward(g, &GradientConfig::default())?)
//! };
//!
//! let report = check_gradient(f, df, &x, &grad_y, &GradCheckConfig::default()).unwrap();
//! assert!(report.passed);
//! ```

use crate::vjp::VjpOp;
use anyhow::{anyhow, Context, Result};
use imgrad_core::DenseND;
use scirs2_core::numeric::Float;

/// How the numerical derivative is formed from evaluations of `f`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifferenceScheme {
    /// `(f(x + h) - f(x - h)) / 2h`, second-order accurate
    #[default]
    Central,
    /// `(f(x + h) - f(x)) / h`, one evaluation per element
    Forward,
}

/// Step size, tolerances and reporting for [`check_gradient`]
#[derive(Debug, Clone)]
pub struct GradCheckConfig {
    /// Perturbation `h` applied to one element at a time
    pub epsilon: f64,
    pub rtol: f64,
    pub atol: f64,
    pub scheme: DifferenceScheme,
    /// Emit a `warn` event for each element outside tolerance
    pub log_mismatches: bool,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-5,
            rtol: 1e-3,
            atol: 1e-5,
            scheme: DifferenceScheme::Central,
            log_mismatches: false,
        }
    }
}

/// Outcome of a gradient check
#[derive(Debug, Clone, PartialEq)]
pub struct GradCheckResult {
    /// Largest `|analytic - numeric|` over all elements, NaN if any
    /// difference is NaN
    pub max_abs_diff: f64,
    /// Largest difference relative to `|numeric|`
    pub max_rel_diff: f64,
    pub passed: bool,
    pub num_elements: usize,
    pub num_failures: usize,
}

/// Compare the backward pass `df` against finite differences of `f` at `x`.
///
/// `grad_y` is the upstream gradient and must have the shape of `f(x)`.
/// An element is a failure only when it misses both `atol` and `rtol`; NaN
/// differences always fail.
///
/// # Errors
///
/// Propagates errors from `f` and `df`, and rejects a `df` whose output shape
/// differs from `x`.
#[tracing::instrument(level = "debug", skip_all, fields(shape = ?x.shape()))]
pub fn check_gradient<T, F, G>(
    f: F,
    df: G,
    x: &DenseND<T>,
    grad_y: &DenseND<T>,
    config: &GradCheckConfig,
) -> Result<GradCheckResult>
where
    T: Float + std::fmt::Display,
    F: Fn(&DenseND<T>) -> Result<DenseND<T>>,
    G: Fn(&DenseND<T>, &DenseND<T>) -> Result<DenseND<T>>,
{
    let analytic = df(x, grad_y).context("backward pass failed")?;
    anyhow::ensure!(
        analytic.shape() == x.shape(),
        "backward produced shape {:?} for input of shape {:?}",
        analytic.shape(),
        x.shape()
    );

    let numeric = numerical_vjp(&f, x, grad_y, config)?;
    Ok(summarize(&analytic, &numeric, config))
}

/// [`check_gradient`] for the first input of a [`VjpOp`].
///
/// `make_vjp` builds the context a forward pass at the given point would
/// have saved.
///
/// ```
/// use imgrad_ad::gradcheck::{check_vjp_op, GradCheckConfig};
/// use imgrad_ad::vjp::SobelVjp;
/// use imgrad_core::DenseND;
/// use imgrad_kernels::{sobel_with, SobelConfig};
///
/// // Keep eps well above the finite-difference step so flat pixels stay smooth.
/// let config = SobelConfig::default().with_eps(1e-2);
/// let x = DenseND::<f64>::from_fn(&[1, 1, 4, 4], |i| ((i[2] * 5 + i[3] * 3) % 7) as f64);
/// let grad_y = DenseND::<f64>::ones(&[1, 1, 4, 4]);
///
/// let report = check_vjp_op(
///     |x: &DenseND<f64>| Ok(sobel_with(x, &config)?),
///     |x: &DenseND<f64>| Ok(SobelVjp::new(x.clone(), config)),
///     &x,
///     &grad_y,
///     &GradCheckConfig::default(),
/// )
/// .unwrap();
/// assert!(report.passed);
/// ```
pub fn check_vjp_op<T, F, M, V>(
    f: F,
    make_vjp: M,
    x: &DenseND<T>,
    grad_y: &DenseND<T>,
    config: &GradCheckConfig,
) -> Result<GradCheckResult>
where
    T: Float + std::fmt::Display,
    F: Fn(&DenseND<T>) -> Result<DenseND<T>>,
    M: Fn(&DenseND<T>) -> Result<V>,
    V: VjpOp<T>,
{
    let first_input_grad = |x: &DenseND<T>, grad_y: &DenseND<T>| {
        let mut grads = make_vjp(x)?.vjp(grad_y)?;
        anyhow::ensure!(!grads.is_empty(), "vjp returned no input gradients");
        Ok(grads.swap_remove(0))
    };
    check_gradient(f, first_input_grad, x, grad_y, config)
}

/// `∂⟨grad_y, f(x)⟩ / ∂x_i` for every `i`, one perturbation at a time
fn numerical_vjp<T, F>(
    f: &F,
    x: &DenseND<T>,
    grad_y: &DenseND<T>,
    config: &GradCheckConfig,
) -> Result<DenseND<T>>
where
    T: Float,
    F: Fn(&DenseND<T>) -> Result<DenseND<T>>,
{
    let h = T::from(config.epsilon)
        .ok_or_else(|| anyhow!("step {} is not representable", config.epsilon))?;
    let objective = |input: &DenseND<T>| -> Result<T> { grad_y.dot(&f(input)?) };

    let baseline = match config.scheme {
        DifferenceScheme::Forward => Some(objective(x)?),
        DifferenceScheme::Central => None,
    };

    let mut probe = x.clone();
    let mut estimate = Vec::with_capacity(x.len());
    for offset in 0..x.len() {
        let index = x.linear_to_multi_index(offset);
        let original = *x
            .get(&index)
            .ok_or_else(|| anyhow!("offset {} outside input", offset))?;

        let mut eval_at = |value: T| -> Result<T> {
            if let Some(slot) = probe.get_mut(&index) {
                *slot = value;
            }
            objective(&probe)
        };
        let upper = eval_at(original + h)?;
        let slope = match baseline {
            Some(base) => (upper - base) / h,
            None => (upper - eval_at(original - h)?) / (h + h),
        };
        if let Some(slot) = probe.get_mut(&index) {
            *slot = original;
        }
        estimate.push(slope);
    }

    DenseND::from_vec(estimate, x.shape())
}

fn summarize<T>(
    analytic: &DenseND<T>,
    numeric: &DenseND<T>,
    config: &GradCheckConfig,
) -> GradCheckResult
where
    T: Float + std::fmt::Display,
{
    let mut report = GradCheckResult {
        max_abs_diff: 0.0,
        max_rel_diff: 0.0,
        passed: true,
        num_elements: analytic.len(),
        num_failures: 0,
    };

    for (offset, (&a, &n)) in analytic.iter().zip(numeric.iter()).enumerate() {
        let abs_diff = (a - n).abs().to_f64().unwrap_or(f64::NAN);
        let scale = n.abs().to_f64().unwrap_or(f64::NAN);
        let rel_diff = if scale > f64::EPSILON {
            abs_diff / scale
        } else {
            abs_diff
        };

        report.max_abs_diff = nan_sticky_max(report.max_abs_diff, abs_diff);
        report.max_rel_diff = nan_sticky_max(report.max_rel_diff, rel_diff);

        if abs_diff <= config.atol || rel_diff <= config.rtol {
            continue;
        }
        report.num_failures += 1;
        if config.log_mismatches {
            tracing::warn!(
                index = ?analytic.linear_to_multi_index(offset),
                analytic = %a,
                numeric = %n,
                abs_diff,
                rel_diff,
                "gradient mismatch"
            );
        }
    }

    report.passed = report.num_failures == 0;
    tracing::debug!(
        passed = report.passed,
        failures = report.num_failures,
        elements = report.num_elements,
        max_abs_diff = report.max_abs_diff,
        "gradient check finished"
    );
    report
}

/// `f64::max` that lets a NaN win, so a NaN element shows in the summary
fn nan_sticky_max(current: f64, candidate: f64) -> f64 {
    if current.is_nan() || candidate.is_nan() {
        f64::NAN
    } else {
        current.max(candidate)
    }
}
