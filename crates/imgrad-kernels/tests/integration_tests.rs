//! Integration tests for imgrad-kernels
//!
//! Shape laws, literal fixtures and padding behaviour of the public
//! operators.

use imgrad_core::{DenseND, PaddingMode};
use imgrad_kernels::{
    sobel, sobel_backward, sobel_with, spatial_gradient, spatial_gradient_backward,
    spatial_gradient_with, FilterError, GradientConfig, SobelConfig,
};

const ATOL: f64 = 1e-4;

fn plus_sign() -> DenseND<f64> {
    DenseND::from_vec(
        vec![0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0],
        &[1, 1, 3, 3],
    )
    .unwrap()
}

/// 4x4 image with asymmetric borders: zero and replicate padding disagree
/// on every edge pixel.
fn asymmetric() -> DenseND<f64> {
    DenseND::from_vec(
        vec![
            0.0, 1.0, 2.0, 3.0, //
            1.0, 2.0, 4.0, 7.0, //
            2.0, 4.0, 8.0, 9.0, //
            0.0, 0.0, 5.0, 1.0,
        ],
        &[1, 1, 4, 4],
    )
    .unwrap()
}

fn assert_close(actual: &DenseND<f64>, expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!((a - e).abs() < ATOL, "element {}: {} vs {}", i, a, e);
    }
}

#[test]
fn test_spatial_gradient_shapes() {
    let x = DenseND::<f64>::ones(&[1, 3, 4, 4]);
    assert_eq!(spatial_gradient(&x).unwrap().shape(), &[1, 3, 2, 4, 4]);

    let x = DenseND::<f32>::ones(&[2, 6, 4, 4]);
    assert_eq!(spatial_gradient(&x).unwrap().shape(), &[2, 6, 2, 4, 4]);
}

#[test]
fn test_sobel_shapes() {
    let x = DenseND::<f64>::ones(&[1, 3, 4, 4]);
    assert_eq!(sobel(&x).unwrap().shape(), &[1, 3, 4, 4]);

    let x = DenseND::<f32>::ones(&[3, 2, 4, 4]);
    assert_eq!(sobel(&x).unwrap().shape(), &[3, 2, 4, 4]);
}

#[test]
fn test_spatial_gradient_plus_fixture() {
    let grad = spatial_gradient(&plus_sign()).unwrap();
    assert_close(
        &grad.index_axis(2, 0).unwrap(),
        &[3.0, 0.0, -3.0, 4.0, 0.0, -4.0, 3.0, 0.0, -3.0],
    );
    assert_close(
        &grad.index_axis(2, 1).unwrap(),
        &[3.0, 4.0, 3.0, 0.0, 0.0, 0.0, -3.0, -4.0, -3.0],
    );
}

#[test]
fn test_sobel_plus_fixture() {
    let edges = sobel(&plus_sign()).unwrap();
    assert_close(
        &edges,
        &[4.2426, 4.0, 4.2426, 4.0, 0.0, 4.0, 4.2426, 4.0, 4.2426],
    );
}

#[test]
fn test_asymmetric_fixture_zero_padding() {
    let grad = spatial_gradient(&asymmetric()).unwrap();
    assert_close(
        &grad.index_axis(2, 0).unwrap(),
        &[
            4.0, 7.0, 9.0, -8.0, //
            9.0, 14.0, 17.0, -18.0, //
            10.0, 20.0, 16.0, -25.0, //
            4.0, 16.0, 7.0, -18.0,
        ],
    );
    assert_close(
        &grad.index_axis(2, 1).unwrap(),
        &[
            4.0, 9.0, 17.0, 18.0, //
            7.0, 14.0, 21.0, 18.0, //
            -4.0, -4.0, -6.0, -11.0, //
            -8.0, -18.0, -29.0, -26.0,
        ],
    );
}

#[test]
fn test_asymmetric_fixture_replicate_padding() {
    let config = GradientConfig::new().with_padding(PaddingMode::Replicate);
    let grad = spatial_gradient_with(&asymmetric(), &config).unwrap();
    assert_close(
        &grad.index_axis(2, 0).unwrap(),
        &[
            4.0, 9.0, 11.0, 6.0, //
            5.0, 14.0, 17.0, 8.0, //
            5.0, 20.0, 16.0, 1.0, //
            2.0, 21.0, 8.0, -11.0,
        ],
    );
    assert_close(
        &grad.index_axis(2, 1).unwrap(),
        &[
            4.0, 5.0, 9.0, 14.0, //
            9.0, 14.0, 21.0, 24.0, //
            -5.0, -4.0, -6.0, -17.0, //
            -10.0, -13.0, -18.0, -27.0,
        ],
    );

    // Interior pixels agree across padding modes.
    let zeros = spatial_gradient(&asymmetric()).unwrap();
    assert_eq!(zeros.get(&[0, 0, 0, 1, 1]), grad.get(&[0, 0, 0, 1, 1]));
    assert_ne!(zeros.get(&[0, 0, 0, 0, 3]), grad.get(&[0, 0, 0, 0, 3]));
}

#[test]
fn test_vertical_line_has_no_vertical_derivative() {
    let line = DenseND::<f64>::from_fn(&[1, 1, 5, 5], |i| if i[3] == 2 { 1.0 } else { 0.0 });
    let grad = spatial_gradient(&line).unwrap();
    for r in 1..4 {
        for c in 0..5 {
            assert_eq!(grad.get(&[0, 0, 1, r, c]), Some(&0.0));
        }
    }
    assert_eq!(grad.get(&[0, 0, 0, 2, 1]), Some(&4.0));
    assert_eq!(grad.get(&[0, 0, 0, 2, 3]), Some(&-4.0));
}

#[test]
fn test_channels_broadcast_identically() {
    let plane = plus_sign().into_vec();
    let mut values = Vec::new();
    for _ in 0..6 {
        values.extend_from_slice(&plane);
    }
    let x = DenseND::from_vec(values, &[2, 3, 3, 3]).unwrap();

    let edges = sobel(&x).unwrap();
    let reference = sobel(&plus_sign()).unwrap().into_vec();
    for b in 0..2 {
        for c in 0..3 {
            let slice = edges.index_axis(0, b).unwrap().index_axis(0, c).unwrap();
            assert_eq!(slice.into_vec(), reference);
        }
    }
}

#[test]
fn test_rank_errors() {
    let rank3 = DenseND::<f64>::zeros(&[3, 4, 4]);
    let rank5 = DenseND::<f64>::zeros(&[1, 1, 1, 4, 4]);
    for x in [&rank3, &rank5] {
        assert!(matches!(
            spatial_gradient(x),
            Err(FilterError::Shape { expected_rank: 4, .. })
        ));
        assert!(matches!(
            sobel(x),
            Err(FilterError::Shape { expected_rank: 4, .. })
        ));
    }
}

#[test]
fn test_negative_eps_is_invalid() {
    let config = SobelConfig::new().with_eps(-1e-3);
    let err = sobel_with(&plus_sign(), &config).unwrap_err();
    assert!(matches!(err, FilterError::InvalidConfig { parameter: "eps", .. }));
    assert!(err.to_string().contains("eps"));

    let g = DenseND::<f64>::ones(&[1, 1, 3, 3]);
    assert!(sobel_backward(&plus_sign(), &g, &config).is_err());
}

#[test]
fn test_backwards_accept_zero_channels() {
    let x = DenseND::<f64>::zeros(&[2, 0, 4, 4]);
    let g = DenseND::<f64>::zeros(&[2, 0, 4, 4]);
    let back = sobel_backward(&x, &g, &SobelConfig::default()).unwrap();
    assert_eq!(back.shape(), &[2, 0, 4, 4]);

    let g = DenseND::<f64>::zeros(&[2, 0, 2, 4, 4]);
    let back = spatial_gradient_backward(&g, &GradientConfig::default()).unwrap();
    assert_eq!(back.shape(), &[2, 0, 4, 4]);
}

/// (1, 2, 5, 5) ramp with `value` written into pixel (2, 2) of channel 0
fn with_bad_pixel(value: f64) -> DenseND<f64> {
    let mut image = DenseND::from_fn(&[1, 2, 5, 5], |i| (i[1] * 25 + i[2] * 5 + i[3]) as f64 * 0.1);
    let pixel: &[usize] = &[0, 0, 2, 2];
    image[pixel] = value;
    image
}

fn near_bad_pixel(row: usize, col: usize) -> bool {
    (1..=3).contains(&row) && (1..=3).contains(&col)
}

#[test]
fn test_non_finite_pixel_stays_local() {
    for bad in [f64::NAN, f64::INFINITY] {
        let image = with_bad_pixel(bad);

        let grad = spatial_gradient(&image).unwrap();
        for offset in 0..grad.len() {
            let idx = grad.linear_to_multi_index(offset);
            let value = grad[idx.as_slice()];
            let expect_bad = idx[1] == 0 && near_bad_pixel(idx[3], idx[4]);
            assert_eq!(!value.is_finite(), expect_bad, "{} at {:?}: {}", bad, idx, value);
            if bad.is_nan() {
                assert_eq!(value.is_nan(), expect_bad, "NaN at {:?}", idx);
            }
        }

        let edges = sobel(&image).unwrap();
        for offset in 0..edges.len() {
            let idx = edges.linear_to_multi_index(offset);
            let value = edges[idx.as_slice()];
            let expect_bad = idx[1] == 0 && near_bad_pixel(idx[2], idx[3]);
            assert_eq!(!value.is_finite(), expect_bad, "{} at {:?}: {}", bad, idx, value);
        }

        let clean = edges.index_axis(1, 1).unwrap();
        assert!(clean.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_nan_pixel_counts() {
    let image = with_bad_pixel(f64::NAN);
    let grad = spatial_gradient(&image).unwrap();
    assert_eq!(grad.iter().filter(|v| v.is_nan()).count(), 18);
    let edges = sobel(&image).unwrap();
    assert_eq!(edges.iter().filter(|v| v.is_nan()).count(), 9);
}
