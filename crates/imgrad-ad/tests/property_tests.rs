//! Property-based tests for VJP and gradient correctness
//!
//! Uses proptest to verify mathematical properties across random inputs

use imgrad_ad::gradcheck::{check_vjp_op, GradCheckConfig};
use imgrad_ad::graph::trace_sobel;
use imgrad_ad::vjp::{SobelVjp, SpatialGradientVjp, VjpOp};
use imgrad_core::DenseND;
use imgrad_kernels::{spatial_gradient_with, GradientConfig, SobelConfig};
use proptest::prelude::*;

fn tensor(shape: Vec<usize>) -> impl Strategy<Value = DenseND<f64>> {
    let len: usize = shape.iter().product();
    prop::collection::vec(-5.0f64..5.0, len)
        .prop_map(move |values| DenseND::from_vec(values, &shape).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// vjp(a*v1 + b*v2) = a*vjp(v1) + b*vjp(v2)
    #[test]
    fn test_sobel_vjp_linear_in_cotangent(
        x in tensor(vec![1, 2, 4, 4]),
        v1 in tensor(vec![1, 2, 4, 4]),
        v2 in tensor(vec![1, 2, 4, 4]),
        a in -2.0f64..2.0,
        b in -2.0f64..2.0,
    ) {
        let ctx = SobelVjp::new(x, SobelConfig::default());
        let combo = v1.scalar_mul(a).add(&v2.scalar_mul(b)).unwrap();

        let lhs = ctx.vjp(&combo).unwrap().remove(0);
        let rhs = ctx.vjp(&v1).unwrap().remove(0).scalar_mul(a)
            .add(&ctx.vjp(&v2).unwrap().remove(0).scalar_mul(b))
            .unwrap();
        let scale = 1.0 + lhs.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        prop_assert!(lhs.max_abs_diff(&rhs).unwrap() < 1e-9 * scale);
    }

    /// The linear operator passes gradient checking everywhere
    #[test]
    fn test_spatial_gradient_gradcheck_random(
        x in tensor(vec![1, 1, 3, 4]),
        g in tensor(vec![1, 1, 2, 3, 4]),
    ) {
        let config = GradientConfig::default();
        let result = check_vjp_op(
            |x: &DenseND<f64>| Ok(spatial_gradient_with(x, &config)?),
            |_x: &DenseND<f64>| Ok(SpatialGradientVjp::new(config)),
            &x,
            &g,
            &GradCheckConfig::default(),
        ).unwrap();
        prop_assert!(result.passed);
    }

    /// Replaying the traced graph equals eager evaluation
    #[test]
    fn test_traced_sobel_matches_eager(x in tensor(vec![2, 1, 4, 3])) {
        let config = SobelConfig::default();
        let graph = trace_sobel::<f64>(&config).unwrap();
        let traced = graph.run(&x).unwrap();
        let eager = imgrad_kernels::sobel_with(&x, &config).unwrap();
        prop_assert!(traced.max_abs_diff(&eager).unwrap() < 1e-5);
    }
}
