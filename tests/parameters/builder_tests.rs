//! Integration tests for parameter specifications and start values

use approx::assert_relative_eq;
use ndarray::{arr2, Array2};

use secrfit_rs::data::{CaptureData, Channel};
use secrfit_rs::fit::{prepare_fit, DiagnosticChannel, FitConfig};
use secrfit_rs::parameters::{Phase, DENSITY};
use secrfit_rs::SecrError;

use crate::test_helpers::{line_mask, line_traps, three_by_four};

/// Signal strengths of 80 where the binary channel records a detection.
fn with_signal_strength(capt: CaptureData) -> CaptureData {
    let ss = capt.bincapt().mapv(|b| b * 80.0);
    capt.with_channel(Channel::Ss, ss).unwrap()
}

fn channel_like(capt: &CaptureData, value: f64) -> Array2<f64> {
    capt.bincapt().mapv(|b| b * value)
}

#[test]
fn test_every_family_resolves_density_last() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let plain = three_by_four();

    let cases = vec![
        (FitConfig::new("hn"), plain.clone()),
        (FitConfig::new("hr"), plain.clone()),
        (FitConfig::new("th"), plain.clone()),
        (FitConfig::new("lth"), plain.clone()),
        (FitConfig::new("ss").with_cutoff(50.0), with_signal_strength(plain.clone())),
        (
            FitConfig::new("ss").with_ss_link("log").with_cutoff(50.0),
            with_signal_strength(plain.clone()),
        ),
    ];

    for (config, capt) in cases {
        let prepared = prepare_fit(&capt, &traps, &mask, &config).unwrap();
        assert_eq!(prepared.start_order.last().map(String::as_str), Some(DENSITY), "{}", config.detfn);
        assert_eq!(prepared.start_order.len(), prepared.specs.len());

        for spec in &prepared.specs {
            assert!(spec.start.is_finite(), "{}: {}", config.detfn, spec.name);
            assert!(spec.bounds.is_within_bounds(spec.start), "{}: {}", config.detfn, spec.name);
            assert!(spec.scale_factor > 0.0 && spec.scale_factor.is_finite());
            assert_eq!(spec.phase, Phase::Estimated);
        }
    }
}

#[test]
fn test_auxiliary_channels_add_parameters() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let plain = three_by_four();
    let capt = plain
        .clone()
        .with_channel(Channel::Bearing, channel_like(&plain, 1.2))
        .unwrap()
        .with_channel(Channel::Dist, channel_like(&plain, 15.0))
        .unwrap();

    let prepared = prepare_fit(&capt, &traps, &mask, &FitConfig::new("hn")).unwrap();
    assert_eq!(prepared.model.names(), vec!["D", "g0", "sigma", "kappa", "alpha"]);
    assert_eq!(prepared.start_order, vec!["alpha", "kappa", "sigma", "g0", "D"]);
    assert!(prepared.geometry.bearings.is_some());
    assert!(prepared.deck.channels.contains_key("bearing"));
    assert!(prepared.deck.channels.contains_key("dist"));
}

#[test]
fn test_user_start_values_are_not_recomputed() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let config = FitConfig::new("hn").with_sv("sigma", 7.5).with_sv("D", 0.02);

    let prepared = prepare_fit(&three_by_four(), &traps, &mask, &config).unwrap();
    assert_eq!(prepared.start_order, vec!["g0"]);

    let sigma = prepared.specs.iter().find(|s| s.name == "sigma").unwrap();
    assert_eq!(sigma.start, 7.5);
    let density = prepared.specs.iter().find(|s| s.name == DENSITY).unwrap();
    assert_eq!(density.start, 0.02);
}

#[test]
fn test_fixed_and_scaled_parameters_in_deck() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let config = FitConfig::new("hr").with_fix("z", 3.0).with_sf("sigma", 4.0);

    let prepared = prepare_fit(&three_by_four(), &traps, &mask, &config).unwrap();
    let z = prepared.deck.parameters.iter().find(|p| p.name == "z_link").unwrap();
    assert_eq!(z.phase, -1);
    assert_eq!(z.scale_factor, 1.0);
    assert_relative_eq!(z.start, 3f64.ln(), epsilon = 1e-12);

    let sigma = prepared.deck.parameters.iter().find(|p| p.name == "sigma_link").unwrap();
    assert_eq!(sigma.scale_factor, 4.0);
    assert_eq!(prepared.deck.free_indices(), vec![0, 1, 2]);
}

#[test]
fn test_bounds_override_clamps_start() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let config = FitConfig::new("hn").with_bounds("sigma", vec![1.0, 2.0]);

    let prepared = prepare_fit(&three_by_four(), &traps, &mask, &config).unwrap();
    let sigma = prepared.specs.iter().find(|s| s.name == "sigma").unwrap();
    assert_eq!(sigma.bounds.max, 2.0);
    // The mean recapture distance on this array is 10.
    assert_eq!(sigma.start, 2.0);
    assert_eq!(prepared.diagnostics.count(DiagnosticChannel::ConfigurationDrop), 1);
}

#[test]
fn test_invalid_bounds_rejected() {
    let traps = line_traps();
    let mask = line_mask(&traps);

    let malformed = FitConfig::new("hn").with_bounds("sigma", vec![1.0]);
    assert!(matches!(
        prepare_fit(&three_by_four(), &traps, &mask, &malformed),
        Err(SecrError::MalformedBounds { .. })
    ));

    let inverted = FitConfig::new("hn").with_bounds("sigma", vec![5.0, 1.0]);
    assert!(matches!(
        prepare_fit(&three_by_four(), &traps, &mask, &inverted),
        Err(SecrError::InvalidBounds { .. })
    ));

    let nan = FitConfig::new("hn").with_bounds("sigma", vec![f64::NAN, 5.0]);
    assert!(matches!(
        prepare_fit(&three_by_four(), &traps, &mask, &nan),
        Err(SecrError::InvalidBounds { .. })
    ));
}

#[test]
fn test_bounds_must_lie_in_natural_range() {
    let traps = line_traps();
    let mask = line_mask(&traps);

    for (name, values) in [("g0", vec![0.5, 2.0]), ("sigma", vec![-1.0, 5.0])] {
        let config = FitConfig::new("hn").with_bounds(name, values);
        assert!(
            matches!(
                prepare_fit(&three_by_four(), &traps, &mask, &config),
                Err(SecrError::InvalidBounds { .. })
            ),
            "{}",
            name
        );
    }

    let config = FitConfig::new("hn").with_bounds("g0", vec![0.5, 1.0]);
    let prepared = prepare_fit(&three_by_four(), &traps, &mask, &config).unwrap();
    for parameter in &prepared.deck.parameters {
        assert!(parameter.lower.is_finite() && parameter.upper.is_finite(), "{}", parameter.name);
    }
}

#[test]
fn test_signal_strength_requires_cutoff_below_maximum() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let capt = with_signal_strength(three_by_four());

    let config = FitConfig::new("ss").with_cutoff(90.0);
    assert!(matches!(
        prepare_fit(&capt, &traps, &mask, &config),
        Err(SecrError::Computation(_))
    ));
}

#[test]
fn test_signal_strength_start_uses_loudest_detection() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let capt = CaptureData::new(arr2(&[
        [1.0, 1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0, 0.0],
        [0.0, 1.0, 1.0, 0.0],
    ]))
    .with_channel(
        Channel::Ss,
        arr2(&[
            [60.0, 55.0, 0.0, 0.0],
            [95.0, 90.0, 0.0, 0.0],
            [0.0, 70.0, 65.0, 0.0],
        ]),
    )
    .unwrap();

    let prepared = prepare_fit(&capt, &traps, &mask, &FitConfig::new("ss").with_cutoff(50.0)).unwrap();
    assert_eq!(prepared.deck.n_unique, 2);
    let b0 = prepared.specs.iter().find(|s| s.name == "b0.ss").unwrap();
    assert_eq!(b0.start, 95.0);
}
